use {
    super::error::PipelineError,
    super::id::{InvoiceId, UserId},
    super::invoice::InvoiceStatus,
    super::money::{Amount, Asset},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

pub const TOP_UP_PURPOSE: &str = "top_up";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Active,
    Paid,
    Closed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paid => "paid",
            Self::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// `active → paid` and `active → closed` are the only valid moves.
    pub fn can_transition_to(&self, next: &PaymentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Paid) | (Self::Active, Self::Closed)
        )
    }

    /// Local status the provider's view of an invoice maps onto.
    pub fn from_invoice(status: &InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Active => Self::Active,
            InvoiceStatus::Paid => Self::Paid,
            InvoiceStatus::Expired | InvoiceStatus::Other => Self::Closed,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "active" => Ok(Self::Active),
            "paid" => Ok(Self::Paid),
            "closed" => Ok(Self::Closed),
            other => Err(PipelineError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Local record of one top-up attempt, read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub invoice_id: InvoiceId,
    pub amount: Amount,
    pub asset: Asset,
    pub status: PaymentStatus,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

/// For INSERT. The id is generated in Rust via Uuid::now_v7().
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    id: Uuid,
    user_id: UserId,
    invoice_id: InvoiceId,
    amount: Amount,
    asset: Asset,
    purpose: String,
    created_at: DateTime<Utc>,
}

impl NewPaymentRecord {
    /// A freshly opened top-up. Records always start out `active`.
    pub fn top_up(
        user_id: UserId,
        invoice_id: InvoiceId,
        amount: Amount,
        asset: Asset,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            invoice_id,
            amount,
            asset,
            purpose: TOP_UP_PURPOSE.to_string(),
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_record(self) -> PaymentRecord {
        PaymentRecord {
            id: self.id,
            user_id: self.user_id,
            invoice_id: self.invoice_id,
            amount: self.amount,
            asset: self.asset,
            status: PaymentStatus::Active,
            purpose: self.purpose,
            created_at: self.created_at,
        }
    }
}

/// What a terminal transition should do besides flipping the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// `active → paid`, crediting `amount` to `user_id`.
    Credit { user_id: UserId, amount: Amount },
    /// `active → closed`, no balance change.
    Close,
}

impl Settlement {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            Self::Credit { .. } => PaymentStatus::Paid,
            Self::Close => PaymentStatus::Closed,
        }
    }
}
