//! Desktop mail client backend.
//!
//! Hands each message to a locally running, signed-in Outlook through a
//! PowerShell COM script. Message fields travel as environment variables so
//! nothing needs quoting inside the script.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::SendBackend;
use crate::compose::ComposedMessage;
use crate::error::SendError;

const BACKEND_NAME: &str = "desktop";

/// Upper bound for one Outlook hand-off.
const SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Exit status the script uses when `Outlook.Application` cannot be created.
const OUTLOOK_UNAVAILABLE_EXIT: i32 = 3;

/// MAPI property `PR_ATTACH_CONTENT_ID`, which makes an attachment renderable as `cid:`.
const CONTENT_ID_PROPERTY: &str = "http://schemas.microsoft.com/mapi/proptag/0x3712001F";

const SEND_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
try {
    $outlook = New-Object -ComObject Outlook.Application
} catch {
    [Console]::Error.WriteLine($_.Exception.Message)
    exit 3
}
try {
    $mail = $outlook.CreateItem(0)
    $mail.To = $env:ONBOARD_MAIL_TO
    if ($env:ONBOARD_MAIL_CC) { $mail.CC = $env:ONBOARD_MAIL_CC }
    $mail.Subject = $env:ONBOARD_MAIL_SUBJECT
    if ($env:ONBOARD_BANNER_PATH) {
        $attachment = $mail.Attachments.Add($env:ONBOARD_BANNER_PATH)
        $attachment.PropertyAccessor.SetProperty($env:ONBOARD_CID_PROPERTY, $env:ONBOARD_BANNER_CID)
    }
    $mail.HTMLBody = $env:ONBOARD_MAIL_HTML
    $mail.Send()
} catch {
    [Console]::Error.WriteLine($_.Exception.Message)
    exit 1
}
exit 0
"#;

pub struct DesktopBackend {
    program: String,
}

impl DesktopBackend {
    pub fn new() -> Self {
        Self {
            program: "powershell".to_string(),
        }
    }

    /// Environment handed to the send script.
    pub fn script_env(message: &ComposedMessage, cc: Option<&str>) -> Vec<(&'static str, String)> {
        let mut env = vec![
            ("ONBOARD_MAIL_TO", message.recipient_email.clone()),
            ("ONBOARD_MAIL_CC", cc.unwrap_or_default().to_string()),
            ("ONBOARD_MAIL_SUBJECT", message.subject.clone()),
            ("ONBOARD_MAIL_HTML", message.html_body.to_string()),
            ("ONBOARD_CID_PROPERTY", CONTENT_ID_PROPERTY.to_string()),
        ];
        if let Some(banner) = &message.banner {
            env.push(("ONBOARD_BANNER_PATH", banner.path.display().to_string()));
            env.push(("ONBOARD_BANNER_CID", banner.content_id.clone()));
        }
        env
    }

    /// PowerShell arguments; the script itself is the `-Command` value.
    pub fn script_args() -> [&'static str; 4] {
        ["-NoProfile", "-NonInteractive", "-Command", SEND_SCRIPT]
    }

    fn unavailable(reason: impl Into<String>) -> SendError {
        SendError::BackendUnavailable {
            backend: BACKEND_NAME.into(),
            reason: reason.into(),
        }
    }
}

impl Default for DesktopBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SendBackend for DesktopBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn send(&self, message: &ComposedMessage, cc: Option<&str>) -> Result<(), SendError> {
        if !cfg!(windows) {
            return Err(Self::unavailable(
                "desktop mail client automation requires Windows with Outlook installed",
            ));
        }

        let child = Command::new(&self.program)
            .args(Self::script_args())
            .envs(Self::script_env(message, cc))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::unavailable(format!("cannot start {}: {e}", self.program)))?;

        let output = tokio::time::timeout(SEND_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| SendError::Transport(format!("Outlook did not respond within {SEND_TIMEOUT:?}")))?
            .map_err(|e| SendError::Transport(format!("Outlook automation failed: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(0) => Ok(()),
            Some(OUTLOOK_UNAVAILABLE_EXIT) => Err(Self::unavailable(format!(
                "Outlook is not installed or not reachable: {stderr}"
            ))),
            code => Err(SendError::Transport(format!(
                "Outlook send failed (exit {}): {stderr}",
                code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            ))),
        }
    }
}
