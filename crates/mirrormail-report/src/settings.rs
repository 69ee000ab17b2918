//! Persisted mail settings.
//!
//! JSON on disk, one file per installation. The password is not part
//! of the model and is never written to disk.

use mirrormail_smtp::{AuthMechanism, ConnectionConfig, Security};
use std::io;
use std::path::{Path, PathBuf};

/// Errors from loading or storing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Could not read the settings file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Could not write the settings file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not parse.
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Relay and addressing settings for report delivery.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MailSettings {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Transport security (serialized as its configuration name).
    #[serde(with = "security_serde")]
    pub security: Security,
    /// Authentication mechanism (serialized as its wire name).
    #[serde(with = "mechanism_serde")]
    pub auth: AuthMechanism,
    /// Sender address for the report.
    pub sender: String,
    /// Recipient address for the report.
    pub recipient: String,
    /// Relay account name.
    pub username: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            security: Security::StartTls,
            auth: AuthMechanism::Plain,
            sender: String::new(),
            recipient: String::new(),
            username: String::new(),
        }
    }
}

impl MailSettings {
    /// Loads settings from `path`, falling back to defaults when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Stores settings to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the per-send connection configuration.
    #[must_use]
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.host.clone(), self.port)
            .security(self.security)
            .auth(self.auth)
    }
}

mod security_serde {
    use mirrormail_smtp::Security;
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S>(security: &Security, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(security.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Security, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Security::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown security mode: {raw}")))
    }
}

mod mechanism_serde {
    use mirrormail_smtp::AuthMechanism;
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S>(mechanism: &AuthMechanism, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(mechanism.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<AuthMechanism, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        AuthMechanism::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown mechanism: {raw}")))
    }
}
