use std::{path::PathBuf, time::Duration};

pub const DEFAULT_OPENTOPO_URL: &str = "https://portal.opentopography.org/API/globaldem";
pub const DEFAULT_DEM_TYPE: &str = "SRTMGL3";
pub const DEFAULT_OUTPUT_DIR: &str = "data/extracts";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Settings for the OpenTopography `globaldem` request.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub api_key: String,
    pub dem_type: String,
    /// `None` waits for the full body however long it takes.
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENTOPO_URL.to_string(),
            api_key: String::new(),
            dem_type: DEFAULT_DEM_TYPE.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub output_dir: PathBuf,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `OPENTOPO_API_KEY`, `OPENTOPO_URL`, `DEM_TYPE`, `OUTPUT_DIR`,
    /// `BIND_ADDR` and `FETCH_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("OPENTOPO_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("OPENTOPO_API_KEY is not set; DEM requests will be rejected upstream");
        }

        let timeout = lookup("FETCH_TIMEOUT_SECS").and_then(|v| match v.parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(err) => {
                tracing::warn!("ignoring FETCH_TIMEOUT_SECS={v}: {err}");
                None
            }
        });

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            fetch: FetchConfig {
                base_url: lookup("OPENTOPO_URL").unwrap_or(defaults.fetch.base_url),
                api_key,
                dem_type: lookup("DEM_TYPE").unwrap_or(defaults.fetch.dem_type),
                timeout,
            },
        }
    }
}
