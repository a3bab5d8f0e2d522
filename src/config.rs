use std::{env, path::PathBuf};

const DEFAULT_DATA_PATH: &str = "data/winterarc.json";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    /// Byte capacity of the store file, like a browser storage quota.
    pub storage_quota: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let storage_quota = lookup("APP_STORAGE_QUOTA_BYTES")
            .and_then(|value| value.parse::<usize>().ok());

        Self {
            data_path,
            port,
            storage_quota,
        }
    }
}
