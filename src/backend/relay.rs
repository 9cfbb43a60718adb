//! SMTP relay backend — lettre, one session per message.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use super::SendBackend;
use crate::compose::ComposedMessage;
use crate::config::RelayConfig;
use crate::error::SendError;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Port where the relay expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP reply codes that mean the credentials were refused or required.
const AUTH_FAILURE_CODES: &[&str] = &["454", "530", "534", "535"];

pub struct RelayBackend {
    config: RelayConfig,
}

impl RelayBackend {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message: HTML body plus the banner as an inline
    /// `multipart/related` part when one is loaded.
    pub fn build_message(
        &self,
        message: &ComposedMessage,
        cc: Option<&str>,
    ) -> Result<Message, SendError> {
        let mut builder = Message::builder()
            .from(self.config.from.clone())
            .to(parse_mailbox(&message.recipient_email)?)
            .subject(message.subject.as_str());
        if let Some(cc) = cc.filter(|c| !c.is_empty()) {
            builder = builder.cc(parse_mailbox(cc)?);
        }

        let html = SinglePart::html(message.html_body.to_string());
        let built = match &message.banner {
            Some(banner) => {
                let content_type = ContentType::parse(&banner.content_type)
                    .map_err(|e| SendError::Build(format!("banner content type: {e}")))?;
                let image = Attachment::new_inline_with_name(
                    banner.content_id.clone(),
                    banner.file_name.clone(),
                )
                .body(banner.bytes.clone(), content_type);
                builder.multipart(MultiPart::related().singlepart(html).singlepart(image))
            }
            None => builder.singlepart(html),
        };
        built.map_err(|e| SendError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, SendError> {
        let cfg = &self.config;
        let builder = if !cfg.use_tls {
            SmtpTransport::builder_dangerous(&cfg.host)
        } else if cfg.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&cfg.host).map_err(|e| self.connection_error(&e))?
        } else {
            SmtpTransport::starttls_relay(&cfg.host).map_err(|e| self.connection_error(&e))?
        };

        let mut builder = builder.port(cfg.port).timeout(Some(SMTP_TIMEOUT));
        let password = cfg.password.expose_secret();
        if !cfg.username.is_empty() && !password.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                password.to_string(),
            ));
        }
        Ok(builder.build())
    }

    /// Auth reply codes → `Auth`; any other reply or client-side refusal →
    /// `Transport`; no reply at all (socket, TLS, timeout) → `Connection`.
    fn classify(&self, e: &lettre::transport::smtp::Error) -> SendError {
        if is_auth_failure(e) {
            SendError::Auth {
                host: self.config.host.clone(),
                reason: e.to_string(),
            }
        } else if e.status().is_some() || e.is_client() {
            SendError::Transport(format!("SMTP send failed: {e}"))
        } else {
            self.connection_error(e)
        }
    }

    fn connection_error(&self, e: &lettre::transport::smtp::Error) -> SendError {
        SendError::Connection {
            host: self.config.host.clone(),
            port: self.config.port,
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl SendBackend for RelayBackend {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, message: &ComposedMessage, cc: Option<&str>) -> Result<(), SendError> {
        let email = self.build_message(message, cc)?;
        let transport = self.transport()?;

        // One session per message: connect, log in, submit, quit.
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| SendError::Transport(format!("SMTP task panicked: {e}")))?
            .map_err(|e| self.classify(&e))?;

        tracing::debug!(to = %message.recipient_email, "Relay accepted message");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| SendError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn is_auth_failure(e: &lettre::transport::smtp::Error) -> bool {
    e.status()
        .is_some_and(|code| AUTH_FAILURE_CODES.contains(&code.to_string().as_str()))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread::JoinHandle;

    use secrecy::SecretString;

    use super::*;
    use crate::compose::{InlineImage, MessageComposer};
    use crate::sheet::OnboardingRecord;

    fn relay_config(host: &str, port: u16) -> RelayConfig {
        RelayConfig {
            host: host.into(),
            port,
            use_tls: false,
            username: String::new(),
            password: SecretString::from(String::new()),
            from: "mailer@example.com".parse().unwrap(),
        }
    }

    fn message(banner: Option<InlineImage>) -> ComposedMessage {
        let record = OnboardingRecord {
            ritm: "RITM0001".into(),
            aide_id: "AIDE_0001".into(),
            aide_name: "Portal".into(),
            owner: "jdoe".into(),
        };
        MessageComposer::new("example.com", banner).compose(&record)
    }

    fn banner() -> InlineImage {
        InlineImage {
            content_id: "orbit_banner".into(),
            content_type: "image/jpeg".into(),
            file_name: "orbit_banner.jpeg".into(),
            path: "orbit_banner.jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[test]
    fn builds_headers_and_envelope() {
        let backend = RelayBackend::new(relay_config("localhost", 25));
        let email = backend
            .build_message(&message(None), Some("onboarding@example.com"))
            .unwrap();

        assert_eq!(email.headers().get_raw("To"), Some("jdoe@example.com"));
        assert_eq!(email.headers().get_raw("Cc"), Some("onboarding@example.com"));
        assert_eq!(email.headers().get_raw("From"), Some("mailer@example.com"));
        assert_eq!(
            email.headers().get_raw("Subject"),
            Some("Welcome to ORBIT Power BI - Your Guide to Getting Started - [RITM0001][AIDE_0001][Portal]")
        );
        assert_eq!(email.envelope().to().len(), 2);
    }

    #[test]
    fn no_cc_means_single_recipient() {
        let backend = RelayBackend::new(relay_config("localhost", 25));
        let email = backend.build_message(&message(None), None).unwrap();
        assert!(email.headers().get_raw("Cc").is_none());
        assert_eq!(email.envelope().to().len(), 1);
    }

    #[test]
    fn banner_is_inline_related_part() {
        let backend = RelayBackend::new(relay_config("localhost", 25));
        let email = backend.build_message(&message(Some(banner())), None).unwrap();
        let raw = String::from_utf8_lossy(&email.formatted()).to_string();

        assert!(raw.contains("multipart/related"));
        assert!(raw.contains("Content-ID: <orbit_banner>"));
        assert!(raw.contains("Content-Disposition: inline"));
        assert!(raw.contains("filename=\"orbit_banner.jpeg\""));
        assert!(raw.contains("image/jpeg"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn without_banner_body_is_single_html_part() {
        let backend = RelayBackend::new(relay_config("localhost", 25));
        let email = backend.build_message(&message(None), None).unwrap();
        let raw = String::from_utf8_lossy(&email.formatted()).to_string();
        assert!(!raw.contains("multipart/related"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let backend = RelayBackend::new(relay_config("localhost", 25));
        let mut msg = message(None);
        msg.recipient_email = "not an address".into();
        let err = backend.build_message(&msg, None).unwrap_err();
        assert!(matches!(err, SendError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn unreachable_relay_is_connection_error() {
        // Port 1 on loopback refuses connections.
        let backend = RelayBackend::new(relay_config("127.0.0.1", 1));
        let msg = message(Some(banner()));
        let err = backend.send(&msg, None).await.unwrap_err();
        assert!(matches!(err, SendError::Connection { port: 1, .. }));
        assert!(!err.to_string().is_empty());
    }

    /// What the scripted relay saw during one session.
    struct Session {
        commands: Vec<String>,
        data: String,
    }

    /// Accept one plaintext SMTP session on loopback and answer from a script.
    ///
    /// `auth_reply` answers `AUTH`, `rcpt_reply` answers every `RCPT`; all
    /// other commands succeed.
    fn scripted_relay(auth_reply: &'static str, rcpt_reply: &'static str) -> (u16, JoinHandle<Session>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut session = Session {
                commands: Vec::new(),
                data: String::new(),
            };

            writer.write_all(b"220 relay.test ESMTP\r\n").unwrap();
            loop {
                let mut line = Vec::new();
                if reader.read_until(b'\n', &mut line).unwrap_or(0) == 0 {
                    break;
                }
                let command = String::from_utf8_lossy(&line).trim_end().to_string();
                let verb = command
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                session.commands.push(command);

                let reply: &str = match verb.as_str() {
                    "EHLO" => "250-relay.test\r\n250 AUTH PLAIN LOGIN\r\n",
                    "AUTH" => auth_reply,
                    "RCPT" => rcpt_reply,
                    "DATA" => {
                        writer.write_all(b"354 end with <CRLF>.<CRLF>\r\n").unwrap();
                        loop {
                            let mut body = Vec::new();
                            if reader.read_until(b'\n', &mut body).unwrap_or(0) == 0 {
                                break;
                            }
                            if body == b".\r\n" {
                                break;
                            }
                            session.data.push_str(&String::from_utf8_lossy(&body));
                        }
                        "250 2.0.0 queued\r\n"
                    }
                    "QUIT" => {
                        let _ = writer.write_all(b"221 2.0.0 bye\r\n");
                        break;
                    }
                    _ => "250 2.0.0 ok\r\n",
                };
                if writer.write_all(reply.as_bytes()).is_err() {
                    break;
                }
            }
            session
        });

        (port, handle)
    }

    fn relay_with_login(port: u16) -> RelayBackend {
        let mut config = relay_config("127.0.0.1", port);
        config.username = "mailer".into();
        config.password = SecretString::from("hunter2".to_string());
        RelayBackend::new(config)
    }

    #[tokio::test]
    async fn rejected_login_is_auth_error() {
        let (port, relay) = scripted_relay("535 5.7.8 bad creds\r\n", "250 2.1.5 ok\r\n");
        let err = relay_with_login(port)
            .send(&message(None), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Auth { .. }), "got {err:?}");
        assert!(err.to_string().contains("535"));

        let session = relay.join().unwrap();
        assert!(session.commands.iter().any(|c| c.starts_with("AUTH")));
        assert!(!session.commands.iter().any(|c| c.starts_with("MAIL")));
    }

    #[tokio::test]
    async fn rejected_recipient_is_transport_error() {
        let (port, relay) = scripted_relay("235 2.7.0 ok\r\n", "550 5.1.1 no such user\r\n");
        let err = relay_with_login(port)
            .send(&message(None), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Transport(_)), "got {err:?}");
        assert!(err.to_string().contains("550"));

        let session = relay.join().unwrap();
        assert!(session.data.is_empty());
    }

    #[tokio::test]
    async fn accepted_message_reaches_to_and_cc() {
        let (port, relay) = scripted_relay("235 2.7.0 ok\r\n", "250 2.1.5 ok\r\n");
        relay_with_login(port)
            .send(&message(Some(banner())), Some("onboarding@example.com"))
            .await
            .unwrap();

        let session = relay.join().unwrap();
        let rcpts: Vec<&String> = session
            .commands
            .iter()
            .filter(|c| c.starts_with("RCPT"))
            .collect();
        assert_eq!(rcpts.len(), 2);
        assert!(rcpts.iter().any(|c| c.contains("<jdoe@example.com>")));
        assert!(rcpts.iter().any(|c| c.contains("<onboarding@example.com>")));
        // Logged in once, in a single session.
        assert_eq!(
            session.commands.iter().filter(|c| c.starts_with("AUTH")).count(),
            1
        );
        assert!(session.data.contains("Cc: onboarding@example.com"));
        assert!(session.data.contains("Content-ID: <orbit_banner>"));
    }

    #[test]
    fn composed_banner_is_shared() {
        let composer = MessageComposer::new("example.com", Some(banner()));
        let record = OnboardingRecord {
            ritm: "R".into(),
            aide_id: "A".into(),
            aide_name: "N".into(),
            owner: "o".into(),
        };
        let a = composer.compose(&record);
        let b = composer.compose(&record);
        assert!(Arc::ptr_eq(a.banner.as_ref().unwrap(), b.banner.as_ref().unwrap()));
    }
}
