use std::path::{Path, PathBuf};

use twelf::{config, Layer};

use crate::error::ImportError;

pub const ENV_PREFIX: &str = "CSV_BULK_";

const DEFAULT_HOST: &str = "127.0.0.1:9200";
const DEFAULT_INDEX_PREFIX: &str = "index_";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_index_prefix() -> String {
    DEFAULT_INDEX_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

#[config]
#[derive(Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    default_host: String,
    #[serde(default = "default_index_prefix")]
    index_prefix: String,
    #[serde(default = "default_true")]
    ascii_only: bool,
    #[serde(default = "default_true")]
    skip_empty: bool,
    #[serde(default)]
    timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            index_prefix: default_index_prefix(),
            ascii_only: true,
            skip_empty: true,
            timeout_seconds: 0,
        }
    }
}

impl Config {
    /// Environment variables (`CSV_BULK_*`) override values from the optional file.
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let mut layers = Vec::new();
        if let Some(path) = path {
            layers.push(file_layer(path)?);
        }
        layers.push(Layer::Env(Some(ENV_PREFIX.to_string())));

        Config::with_layers(&layers)
            .map_err(|e| ImportError::Config(format!("{:?}: {}", path, e)))
    }

    pub fn get_default_host(&self) -> &String {
        &self.default_host
    }
    pub fn get_index_prefix(&self) -> &String {
        &self.index_prefix
    }
    pub fn is_ascii_only(&self) -> bool {
        self.ascii_only
    }
    pub fn is_skip_empty(&self) -> bool {
        self.skip_empty
    }
    pub fn get_timeout_seconds(&self) -> Option<u64> {
        if self.timeout_seconds == 0 {
            None
        } else {
            Some(self.timeout_seconds)
        }
    }
}

fn file_layer(path: &Path) -> crate::error::Result<Layer> {
    let path_buf = PathBuf::from(path);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(Layer::Toml(path_buf)),
        Some("json") => Ok(Layer::Json(path_buf)),
        _ => Err(ImportError::Config(format!(
            "unsupported config file {:?}, expected .toml or .json",
            path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Config::load reads the process environment; tests touching it run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 5] = [
        "CSV_BULK_DEFAULT_HOST",
        "CSV_BULK_INDEX_PREFIX",
        "CSV_BULK_ASCII_ONLY",
        "CSV_BULK_SKIP_EMPTY",
        "CSV_BULK_TIMEOUT_SECONDS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn config_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_local_cluster() {
        let config = Config::default();
        assert_eq!(config.get_default_host(), "127.0.0.1:9200");
        assert_eq!(config.get_index_prefix(), "index_");
        assert!(config.is_ascii_only());
        assert!(config.is_skip_empty());
        assert_eq!(config.get_timeout_seconds(), None);
    }

    #[test]
    fn load_without_file_gives_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = Config::load(None).unwrap();
        assert_eq!(config.get_default_host(), "127.0.0.1:9200");
        assert_eq!(config.get_index_prefix(), "index_");
        assert!(config.is_ascii_only());
        assert_eq!(config.get_timeout_seconds(), None);
    }

    #[test]
    fn env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        std::env::set_var("CSV_BULK_TIMEOUT_SECONDS", "30");
        std::env::set_var("CSV_BULK_ASCII_ONLY", "false");

        let config = Config::load(None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.get_timeout_seconds(), Some(30));
        assert!(!config.is_ascii_only());
        assert_eq!(config.get_default_host(), "127.0.0.1:9200");
    }

    #[test]
    fn toml_file_overrides_selected_keys() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let file = config_file(
            ".toml",
            "default_host = \"es.internal:9201\"\ntimeout_seconds = 30\n",
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.get_default_host(), "es.internal:9201");
        assert_eq!(config.get_timeout_seconds(), Some(30));
        assert_eq!(config.get_index_prefix(), "index_");
    }

    #[test]
    fn json_file_is_read() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let file = config_file(".json", r#"{"index_prefix": "csv_", "skip_empty": false}"#);

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.get_index_prefix(), "csv_");
        assert!(!config.is_skip_empty());
        assert_eq!(config.get_default_host(), "127.0.0.1:9200");
    }

    #[test]
    fn env_beats_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let file = config_file(".toml", "default_host = \"from-file:9200\"\ntimeout_seconds = 30\n");
        std::env::set_var("CSV_BULK_DEFAULT_HOST", "from-env:9200");

        let config = Config::load(Some(file.path()));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.get_default_host(), "from-env:9200");
        assert_eq!(config.get_timeout_seconds(), Some(30));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
