//! Templated notification mail through an SMTP relay, optionally repeated.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use clap::Args;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use time::OffsetDateTime;

use crate::core::errors::{Error, Result};
use crate::models::run_metadata::format_utc;

pub const DEFAULT_SUBJECT: &str = "Test Email from GitHub Actions";
pub const DEFAULT_BODY: &str = "Hello from your GitHub Action!";

#[derive(Debug, Clone, Default, Args)]
pub struct MailArgs {
    /// Sender address, also used to log in to the relay.
    #[arg(long, env = "GMAIL_USER")]
    pub user: Option<String>,

    #[arg(long, env = "GMAIL_APP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Recipient. Defaults to the sender.
    #[arg(long, env = "TO_EMAIL")]
    pub to: Option<String>,

    /// Subject template; {attempt}, {total} and {timestamp} are substituted.
    #[arg(long, env = "EMAIL_SUBJECT")]
    pub subject: Option<String>,

    /// Body template; same placeholders as the subject.
    #[arg(long, env = "EMAIL_BODY")]
    pub body: Option<String>,

    #[arg(long = "smtp-host", env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    #[arg(long = "smtp-port", env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// How many messages to send.
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Seconds between messages when repeating.
    #[arg(long = "interval", default_value_t = 60)]
    pub interval_secs: u64,
}

#[derive(Clone)]
pub struct MailConfig {
    pub user: String,
    pub password: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub repeat: u32,
    pub interval: Duration,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("repeat", &self.repeat)
            .field("interval", &self.interval)
            .finish()
    }
}

impl MailConfig {
    pub fn from_args(args: MailArgs) -> Result<Self> {
        let user = non_empty(args.user)
            .ok_or_else(|| Error::Config("missing required setting GMAIL_USER".into()))?;
        let password = non_empty(args.password)
            .ok_or_else(|| Error::Config("missing required setting GMAIL_APP_PASSWORD".into()))?;
        if args.repeat == 0 {
            return Err(Error::Config("--repeat must be at least 1".into()));
        }

        Ok(Self {
            to: non_empty(args.to).unwrap_or_else(|| user.clone()),
            subject: args.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: args.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            user,
            password,
            smtp_host: args.smtp_host,
            smtp_port: args.smtp_port,
            repeat: args.repeat,
            interval: Duration::from_secs(args.interval_secs),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Replaces `{attempt}`, `{total}` and `{timestamp}` in `template`.
pub fn render(template: &str, attempt: u32, total: u32, timestamp: &str) -> String {
    template
        .replace("{attempt}", &attempt.to_string())
        .replace("{total}", &total.to_string())
        .replace("{timestamp}", timestamp)
}

pub fn build_message(config: &MailConfig, subject: String, body: String) -> Result<Message> {
    let from: Mailbox = config
        .user
        .parse()
        .map_err(|e| Error::Mail(format!("invalid sender '{}': {e}", config.user)))?;
    let to: Mailbox = config
        .to
        .parse()
        .map_err(|e| Error::Mail(format!("invalid recipient '{}': {e}", config.to)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| Error::Mail(e.to_string()))
}

pub trait MailTransport: Send + Sync {
    fn send(&self, message: Message) -> impl Future<Output = Result<()>> + Send;
}

/// SMTP over implicit TLS with login credentials.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| Error::Mail(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpRelay {
    async fn send(&self, message: Message) -> Result<()> {
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| Error::Mail(e.to_string()))
    }
}

/// Sends `config.repeat` messages, `config.interval` apart. Each attempt
/// stands alone: a failure is logged and the loop moves on. Ctrl-C stops
/// the loop between attempts. Returns how many messages went out.
pub async fn run_notifier<T: MailTransport>(config: &MailConfig, transport: &T) -> Result<u32> {
    let mut sent = 0;
    for attempt in 1..=config.repeat {
        if attempt > 1 {
            tokio::select! {
                _ = tokio::time::sleep(config.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted after {} of {} messages", attempt - 1, config.repeat);
                    break;
                }
            }
        }

        let timestamp = format_utc(OffsetDateTime::now_utc());
        let subject = render(&config.subject, attempt, config.repeat, &timestamp);
        let body = render(&config.body, attempt, config.repeat, &timestamp);

        let result = match build_message(config, subject, body) {
            Ok(message) => transport.send(message).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                sent += 1;
                tracing::info!("Email sent successfully to {} ({}/{})", config.to, attempt, config.repeat);
            }
            Err(e) => tracing::error!("Failed to send email ({}/{}): {}", attempt, config.repeat, e),
        }
    }

    if sent == 0 {
        return Err(Error::Mail("no message could be sent".into()));
    }
    Ok(sent)
}
