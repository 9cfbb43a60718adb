//! Run configuration, loaded once from a TOML file before any file is processed.

use std::path::Path;
use std::str::FromStr;

use lettre::message::Mailbox;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable that overrides `relay.password`.
pub const PASSWORD_ENV_VAR: &str = "ONBOARD_SMTP_PASSWORD";

const DEFAULT_RELAY_PORT: u16 = 587;

/// Which backend delivers the messages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMethod {
    /// Locally installed desktop mail client (Outlook on Windows).
    Desktop,
    /// SMTP relay.
    Relay,
}

impl SendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendMethod::Desktop => "desktop",
            SendMethod::Relay => "relay",
        }
    }
}

impl FromStr for SendMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" | "outlook" => Ok(SendMethod::Desktop),
            "relay" | "smtp" => Ok(SendMethod::Relay),
            other => Err(ConfigError::InvalidValue {
                key: "send_method".into(),
                message: format!("unknown method '{other}' (expected \"relay\" or \"desktop\")"),
            }),
        }
    }
}

/// SMTP relay connection parameters.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: String,
    pub password: SecretString,
    pub from: Mailbox,
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub send_method: SendMethod,
    pub email_domain: String,
    pub cc_email: Option<String>,
    /// Present whenever `send_method` is `Relay`.
    pub relay: Option<RelayConfig>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    send_method: Option<String>,
    email_domain: Option<String>,
    #[serde(default)]
    cc_email: Option<String>,
    relay: Option<RawRelay>,
}

#[derive(Debug, Deserialize)]
struct RawRelay {
    host: Option<String>,
    port: Option<u16>,
    #[serde(default = "default_use_tls")]
    use_tls: bool,
    #[serde(default)]
    username: String,
    password: Option<String>,
    from: Option<String>,
}

fn default_use_tls() -> bool {
    true
}

impl RunConfig {
    /// Load and validate the configuration file at `path`.
    ///
    /// `ONBOARD_SMTP_PASSWORD`, when set, replaces the relay password.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let password_override = std::env::var(PASSWORD_ENV_VAR)
            .ok()
            .filter(|p| !p.is_empty());
        Self::from_toml_str(&contents, password_override)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(
        contents: &str,
        password_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let send_method: SendMethod = raw
            .send_method
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "send_method".into(),
                hint: "Set it to \"relay\" or \"desktop\".".into(),
            })?
            .parse()?;

        let email_domain = raw
            .email_domain
            .map(|d| d.trim().trim_start_matches('@').to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "email_domain".into(),
                hint: "Domain appended to bare usernames, e.g. \"example.com\".".into(),
            })?;
        if email_domain.contains('@') || email_domain.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                key: "email_domain".into(),
                message: format!("'{email_domain}' is not a bare domain"),
            });
        }

        let cc_email = raw
            .cc_email
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(cc) = &cc_email {
            cc.parse::<Mailbox>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "cc_email".into(),
                    message: format!("'{cc}': {e}"),
                })?;
        }

        let relay = match (send_method, raw.relay) {
            (SendMethod::Relay, None) => {
                return Err(ConfigError::MissingRequired {
                    key: "relay".into(),
                    hint: "send_method = \"relay\" needs a [relay] table.".into(),
                });
            }
            (SendMethod::Relay, Some(raw_relay)) => {
                Some(validate_relay(raw_relay, password_override)?)
            }
            (SendMethod::Desktop, Some(raw_relay)) => {
                // Kept when valid so switching methods only needs one edit.
                validate_relay(raw_relay, password_override).ok()
            }
            (SendMethod::Desktop, None) => None,
        };

        Ok(Self {
            send_method,
            email_domain,
            cc_email,
            relay,
        })
    }
}

fn validate_relay(
    raw: RawRelay,
    password_override: Option<String>,
) -> Result<RelayConfig, ConfigError> {
    let host = raw
        .host
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "relay.host".into(),
            hint: "SMTP relay host name, e.g. \"smtp.office365.com\".".into(),
        })?;

    let port = raw.port.unwrap_or(DEFAULT_RELAY_PORT);
    if port == 0 {
        return Err(ConfigError::InvalidValue {
            key: "relay.port".into(),
            message: "port must be non-zero".into(),
        });
    }

    let from_raw = raw
        .from
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "relay.from".into(),
            hint: "Sender address shown on outgoing mail.".into(),
        })?;
    let from = from_raw
        .parse::<Mailbox>()
        .map_err(|e| ConfigError::InvalidValue {
            key: "relay.from".into(),
            message: format!("'{from_raw}': {e}"),
        })?;

    let password = SecretString::from(
        password_override
            .or(raw.password)
            .unwrap_or_default(),
    );

    Ok(RelayConfig {
        host,
        port,
        use_tls: raw.use_tls,
        username: raw.username.trim().to_string(),
        password,
        from,
    })
}
