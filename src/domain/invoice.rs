use {
    super::id::InvoiceId,
    super::money::{Amount, Asset},
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

/// Provider-side invoice lifecycle. Anything we don't recognise is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Active,
    Paid,
    Expired,
    #[serde(other)]
    Other,
}

/// Invoice as reported by the provider. Numeric and timestamp fields arrive
/// as strings and are parsed during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    #[serde(default)]
    pub hash: String,
    pub status: InvoiceStatus,
    pub asset: Asset,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub bot_invoice_url: Option<String>,
    #[serde(default)]
    pub pay_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Link the user follows to pay. Newer API versions only send `bot_invoice_url`.
    pub fn payment_url(&self) -> Option<&str> {
        self.bot_invoice_url
            .as_deref()
            .or(self.pay_url.as_deref())
    }
}

/// Everything needed to open an invoice with the provider.
#[derive(Debug, Clone)]
pub struct OpenInvoice {
    pub asset: Asset,
    pub amount: Amount,
    pub description: String,
    pub payload: String,
    pub expires_in_secs: u32,
}
