use async_trait::async_trait;
use cvmstorage::{config::PipelineSchema, Table};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpSettings;

/// Rows listed in an alert body; the rest are only counted.
pub const MAX_LISTED_ENTRIES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("no recipients configured")]
    NoRecipients,
}

/// Outbound channel for run alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<(), NotifyError>;
}

/// STARTTLS submission with username/password authentication.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let sender = parse_mailbox(&settings.sender)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        let message = builder.body(body.to_string())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|source| NotifyError::Address {
            address: address.to_string(),
            source,
        })
}

/// Subject and plain-text body of a new-offerings alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

/// Builds the alert for `delta`. When the request number column exists the
/// body lists offering links for the first entries; otherwise it falls back
/// to a plain dump of the first rows.
pub fn compose_alert(delta: &Table, schema: &PipelineSchema, link_base: &str) -> Alert {
    let count = delta.len();
    let details = match delta.column_index(&schema.request_number_column) {
        Some(idx) => delta
            .rows()
            .iter()
            .map(|row| row.cell(idx))
            .filter(|value| !value.is_empty())
            .take(MAX_LISTED_ENTRIES)
            .map(|value| format!("{link_base}{value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        None => render_table(&delta.head(MAX_LISTED_ENTRIES)),
    };

    Alert {
        subject: format!("📢 Novas Debêntures Incentivadas na CVM ({count} novas)"),
        body: format!(
            "\nPrezados,\n\n\
             Foram detectadas {count} novas ofertas de debêntures com incentivo fiscal na CVM.\n\n\
             Detalhes:\n{details}\n\n\
             Atenciosamente,\nAutomação CVM\n"
        ),
    }
}

/// Column-aligned text rendering with a leading row number.
pub fn render_table(table: &Table) -> String {
    let index_width = table.len().saturating_sub(1).to_string().len();
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in table.rows() {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![render_line("", table.columns(), &widths, index_width)];
    for (idx, row) in table.rows().iter().enumerate() {
        lines.push(render_line(&idx.to_string(), row.cells(), &widths, index_width));
    }
    lines.join("\n")
}

fn render_line(index: &str, cells: &[String], widths: &[usize], index_width: usize) -> String {
    let mut out = format!("{index:>index_width$}");
    for (cell, &width) in cells.iter().zip(widths) {
        out.push_str("  ");
        out.push_str(&format!("{cell:>width$}"));
    }
    out.trim_end().to_string()
}
