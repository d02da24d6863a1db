use anyhow::{anyhow, Context};
use async_trait::async_trait;
use itertools::Itertools;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;

/// A lead form submission flattened into subject + labeled lines, ready for
/// any outbound channel.
#[derive(Debug, Clone)]
pub struct LeadMessage {
    pub subject: String,
    pub lines: Vec<(String, String)>,
}

impl LeadMessage {
    pub fn new(subject: &str) -> Self {
        LeadMessage {
            subject: subject.to_string(),
            lines: vec![],
        }
    }

    pub fn line(mut self, label: &str, value: &str) -> Self {
        self.lines.push((label.to_string(), value.to_string()));
        self
    }

    pub fn to_text(&self) -> String {
        let body = self
            .lines
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .join("\n");
        format!("{}\n\n{body}", self.subject)
    }
}

#[async_trait]
pub trait NotifyChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, message: &LeadMessage) -> anyhow::Result<()>;
}

/// Posts the lead to a chat via the bot messaging API.
pub struct TelegramChannel {
    http: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(http: reqwest::Client, api_base: &str, token: &str, chat_id: &str) -> Self {
        TelegramChannel {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &LeadMessage) -> anyhow::Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let response = self
            .http
            .post(url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": message.to_text(),
            }))
            .send()
            .await
            .context("Telegram request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Telegram returned {status}: {body}"));
        }
        Ok(())
    }
}

/// Relays the lead over SMTP.
pub struct MailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

pub struct MailConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl MailChannel {
    pub fn new(config: MailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .with_context(|| format!("Invalid SMTP relay {}", config.host))?
            .credentials(Credentials::new(config.user, config.password));
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        Ok(MailChannel {
            transport: builder.build(),
            from: config
                .from
                .parse()
                .with_context(|| format!("Invalid MAIL_FROM address {}", config.from))?,
            to: config
                .to
                .parse()
                .with_context(|| format!("Invalid MAIL_TO address {}", config.to))?,
        })
    }
}

#[async_trait]
impl NotifyChannel for MailChannel {
    fn name(&self) -> &'static str {
        "mail"
    }

    async fn send(&self, message: &LeadMessage) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&message.subject)
            .body(message.to_text())
            .context("Unable to build email")?;
        self.transport
            .send(email)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub attempted: usize,
}

impl DeliveryReport {
    pub fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// Fans a lead out to every configured channel. One healthy channel is enough
/// for the submission to count as delivered; individual failures are only
/// logged.
pub struct Notifier {
    channels: Vec<Box<dyn NotifyChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        Notifier { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub async fn dispatch(&self, message: &LeadMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for channel in &self.channels {
            report.attempted += 1;
            match channel.send(message).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    log::warn!("{} delivery failed: {err:#}", channel.name());
                }
            }
        }
        report
    }
}
