use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ebay::auth::Credentials;
use crate::ebay::env::EbayEnv;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// The on-disk config file: one profile per environment so switching to the
/// sandbox never means editing credentials in place.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub sandbox: EnvProfile,
    pub production: EnvProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvProfile {
    pub client_id: String,
    pub client_secret: String,
    pub dev_id: String,
    /// The RuName registered for the app, echoed into consent and exchange.
    pub redirect_uri: String,
    /// Pictures live under `{photo_dir}/{sku}/`.
    pub photo_dir: PathBuf,
    pub spreadsheet: PathBuf,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl EnvProfile {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            dev_id: self.dev_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }
}

/// Configuration resolved for one run: the chosen environment and its
/// profile, threaded explicitly to whoever needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: EbayEnv,
    pub profile: EnvProfile,
}

impl AppConfig {
    pub fn load(path: &Path, sandbox: bool) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        let env = if sandbox {
            EbayEnv::Sandbox
        } else {
            EbayEnv::Production
        };
        let profile = match env {
            EbayEnv::Sandbox => file.sandbox,
            EbayEnv::Production => file.production,
        };
        Ok(Self { env, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
sandbox:
  client_id: App-SBX-123
  client_secret: SBX-secret
  dev_id: dev-123
  redirect_uri: Seller-App-SBX-runame
  photo_dir: /data/photos
  spreadsheet: /data/listings.csv
production:
  client_id: App-PRD-123
  client_secret: PRD-secret
  dev_id: dev-123
  redirect_uri: Seller-App-runame
  photo_dir: /data/photos
  spreadsheet: /data/listings.csv
  token_file: /data/tokens/prod.json
"#;

    #[test]
    fn sandbox_flag_selects_the_sandbox_profile() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let config = AppConfig::load(file.path(), true).expect("load");
        assert_eq!(config.env, EbayEnv::Sandbox);
        assert_eq!(config.profile.client_id, "App-SBX-123");
        assert!(config.profile.token_file.is_none());

        let config = AppConfig::load(file.path(), false).expect("load");
        assert_eq!(config.env, EbayEnv::Production);
        assert_eq!(config.profile.client_id, "App-PRD-123");
        assert_eq!(
            config.profile.token_file.as_deref(),
            Some(Path::new("/data/tokens/prod.json"))
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load(Path::new("/no/such/config.yaml"), true).expect_err("err");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"sandbox: [not a profile").expect("write");
        let err = AppConfig::load(file.path(), true).expect_err("err");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
