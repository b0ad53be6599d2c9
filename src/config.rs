//! # Platform Configuration
//!
//! Environment-driven settings. Every value has a development default,
//! so a bare `PlatformConfig::from_env()` starts a working platform
//! with the recording mailer; real SMTP delivery switches on in
//! production.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mailer::MailerConfig;

/// Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Deployment environment (default: "development")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// SMTP server host (default: "localhost")
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP server port (default: 1025)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username (default: empty, no authentication)
    #[serde(default)]
    pub smtp_user: String,

    /// SMTP password (default: empty)
    #[serde(default)]
    pub smtp_password: String,

    /// From address for outgoing mail
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// Base URL used in email links
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_email_from() -> String {
    "noreply@tourbase.local".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            email_from: default_email_from(),
            base_url: default_base_url(),
        }
    }
}

impl PlatformConfig {
    /// Loads the configuration from environment variables, falling back
    /// to the development defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            environment: load("TOURBASE_ENV", default_environment()),
            smtp_host: load("EMAIL_HOST", default_smtp_host()),
            smtp_port: load("EMAIL_PORT", default_smtp_port()),
            smtp_user: load("EMAIL_USERNAME", String::new()),
            smtp_password: load("EMAIL_PASSWORD", String::new()),
            email_from: load("EMAIL_FROM", default_email_from()),
            base_url: load("BASE_URL", default_base_url()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// SMTP settings when real delivery is configured. `None` outside
    /// production, which keeps the recording mailer.
    pub fn mailer(&self) -> Option<MailerConfig> {
        if !self.is_production() {
            return None;
        }
        Some(MailerConfig {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_user: self.smtp_user.clone(),
            smtp_password: self.smtp_password.clone(),
            from_email: self.email_from.clone(),
            from_name: "Tourbase".to_string(),
            base_url: self.base_url.clone(),
        })
    }
}

/// Reads one environment variable, keeping the default on absence or a
/// value that does not parse.
fn load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {} value: {}", key, e);
            default
        }),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_development() {
        let config = PlatformConfig::default();
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert!(config.mailer().is_none());
    }

    #[test]
    fn test_production_config_yields_smtp_settings() {
        let config = PlatformConfig {
            environment: "production".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_user: "mailer".to_string(),
            ..Default::default()
        };
        let mailer = config.mailer().unwrap();
        assert_eq!(mailer.smtp_host, "smtp.example.com");
        assert_eq!(mailer.smtp_user, "mailer");
        assert_eq!(mailer.from_name, "Tourbase");
    }

    #[test]
    fn test_deserializing_partial_config_fills_defaults() {
        let config: PlatformConfig =
            serde_json::from_str(r#"{ "environment": "production" }"#).unwrap();
        assert!(config.is_production());
        assert_eq!(config.smtp_port, 1025);
        assert_eq!(config.base_url, "http://localhost:3000");
    }
}
