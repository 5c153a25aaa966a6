use figment::{Figment, providers::Env};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

/// OAuth scope the Firestore channel is authorized for.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Fallback token endpoint when the credential file does not carry one.
pub static GOOGLE_TOKEN_URI: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://oauth2.googleapis.com/token").expect("FATAL: invalid GOOGLE_TOKEN_URI")
});

/// Firestore REST base; overridable via config for emulators and tests.
pub static FIRESTORE_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://firestore.googleapis.com/v1").expect("FATAL: invalid FIRESTORE_BASE_URL")
});

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Figment::new()
        .merge(Env::prefixed("FIRELINK_"))
        .extract()
        .expect("FATAL: invalid FIRELINK_* environment configuration")
});

const CREDENTIALS_DIR: &str = "Config";
const CREDENTIALS_FILE: &str = "firebase-credentials.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// Overrides the `Config/firebase-credentials.json` lookup next to the
    /// executable.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Collection read by the connectivity probe.
    #[serde(default = "default_probe_collection")]
    pub probe_collection: String,
    #[serde(default = "default_firestore_url")]
    pub firestore_url: Url,
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl Config {
    /// Absolute path of the service-account file: the explicit override when
    /// set, otherwise `Config/firebase-credentials.json` resolved against the
    /// executable's base directory.
    pub fn credential_file(&self) -> PathBuf {
        match &self.credentials_path {
            Some(path) => path.clone(),
            None => base_dir().join(CREDENTIALS_DIR).join(CREDENTIALS_FILE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            loglevel: default_loglevel(),
            credentials_path: None,
            database_id: default_database_id(),
            probe_collection: default_probe_collection(),
            firestore_url: default_firestore_url(),
            proxy: None,
        }
    }
}

fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_port() -> u16 {
    8000
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_probe_collection() -> String {
    "test".to_string()
}

fn default_firestore_url() -> Url {
    FIRESTORE_BASE_URL.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_production_endpoints() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.loglevel, "info");
        assert_eq!(cfg.database_id, "(default)");
        assert_eq!(cfg.probe_collection, "test");
        assert_eq!(cfg.firestore_url.as_str(), "https://firestore.googleapis.com/v1");
        assert!(cfg.proxy.is_none());
    }

    #[test]
    fn credential_file_defaults_to_config_subdir() {
        let cfg = Config::default();
        let path = cfg.credential_file();
        assert!(path.ends_with("Config/firebase-credentials.json"));
    }

    #[test]
    fn credential_file_honors_the_override() {
        let cfg = Config {
            credentials_path: Some(PathBuf::from("/etc/firelink/sa.json")),
            ..Config::default()
        };
        assert_eq!(cfg.credential_file(), PathBuf::from("/etc/firelink/sa.json"));
    }
}
