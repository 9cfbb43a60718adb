//! Send backends.
//!
//! Supports:
//! - **Relay**: SMTP relay via lettre
//! - **Desktop**: locally running Outlook, driven through PowerShell COM automation (Windows only)
//!
//! One backend is chosen per run from the configured send method.

pub mod desktop;
pub mod relay;

pub use desktop::DesktopBackend;
pub use relay::RelayBackend;

use async_trait::async_trait;

use crate::compose::ComposedMessage;
use crate::config::{RunConfig, SendMethod};
use crate::error::{ConfigError, SendError};

/// Delivers one composed message.
#[async_trait]
pub trait SendBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Send `message`, copying `cc` when given.
    async fn send(&self, message: &ComposedMessage, cc: Option<&str>) -> Result<(), SendError>;
}

/// Create the backend selected by `config.send_method`.
pub fn create_backend(config: &RunConfig) -> Result<Box<dyn SendBackend>, ConfigError> {
    match config.send_method {
        SendMethod::Relay => {
            let relay = config
                .relay
                .clone()
                .ok_or_else(|| ConfigError::MissingRequired {
                    key: "relay".into(),
                    hint: "send_method = \"relay\" needs a [relay] table.".into(),
                })?;
            tracing::info!(
                "Using SMTP relay {}:{} (tls: {})",
                relay.host,
                relay.port,
                relay.use_tls
            );
            Ok(Box::new(RelayBackend::new(relay)))
        }
        SendMethod::Desktop => {
            if !cfg!(windows) {
                tracing::warn!("Desktop send method only works on Windows; every send will fail");
            }
            tracing::info!("Using desktop mail client (Outlook)");
            Ok(Box::new(DesktopBackend::new()))
        }
    }
}
