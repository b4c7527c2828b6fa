use {
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, UserId},
        money::{Amount, Asset},
        payment::{NewPaymentRecord, PaymentRecord, PaymentStatus},
    },
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    sqlx::PgConnection,
    uuid::Uuid,
};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: i64,
    invoice_id: i64,
    amount: Decimal,
    asset: String,
    status: String,
    purpose: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = PipelineError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: row.id,
            user_id: UserId::new(row.user_id),
            invoice_id: InvoiceId::new(row.invoice_id)?,
            amount: Amount::new(row.amount)?,
            asset: Asset::try_from(row.asset.as_str())?,
            status: PaymentStatus::try_from(row.status.as_str())?,
            purpose: row.purpose,
            created_at: row.created_at,
        })
    }
}

const SELECT_PAYMENT: &str =
    "SELECT id, user_id, invoice_id, amount, asset, status, purpose, created_at FROM payments";

/// Insert a new `active` record. Returns `None` if the invoice id is already taken.
pub async fn insert_payment(
    conn: &mut PgConnection,
    payment: &NewPaymentRecord,
) -> Result<Option<PaymentRecord>, PipelineError> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO payments (id, user_id, invoice_id, amount, asset, status, purpose, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (invoice_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(payment.id())
    .bind(payment.user_id().get())
    .bind(payment.invoice_id().get())
    .bind(payment.amount().value())
    .bind(payment.asset().as_str())
    .bind(PaymentStatus::Active.as_str())
    .bind(payment.purpose())
    .bind(payment.created_at())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(inserted.map(|_| payment.clone().into_record()))
}

pub async fn get_by_invoice_id(
    conn: &mut PgConnection,
    id: InvoiceId,
) -> Result<Option<PaymentRecord>, PipelineError> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENT} WHERE invoice_id = $1"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(PaymentRecord::try_from).transpose()
}

/// Conditional transition. Zero rows affected means someone else got there first.
/// Moves other than `active → paid|closed` are refused without touching the row.
pub async fn update_status_if(
    conn: &mut PgConnection,
    id: InvoiceId,
    expected: PaymentStatus,
    next: PaymentStatus,
) -> Result<bool, PipelineError> {
    if !expected.can_transition_to(&next) {
        return Ok(false);
    }

    let result = sqlx::query(
        "UPDATE payments SET status = $1, updated_at = now() WHERE invoice_id = $2 AND status = $3",
    )
    .bind(next.as_str())
    .bind(id.get())
    .bind(expected.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Serialize settlement work for one invoice until the transaction ends.
pub async fn lock_invoice(conn: &mut PgConnection, id: InvoiceId) -> Result<(), PipelineError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
    status: Option<PaymentStatus>,
) -> Result<Vec<PaymentRecord>, PipelineError> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, PaymentRow>(&format!(
                "{SELECT_PAYMENT} WHERE user_id = $1 AND status = $2 ORDER BY created_at"
            ))
            .bind(user_id.get())
            .bind(status.as_str())
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, PaymentRow>(&format!(
                "{SELECT_PAYMENT} WHERE user_id = $1 ORDER BY created_at DESC"
            ))
            .bind(user_id.get())
            .fetch_all(&mut *conn)
            .await?
        }
    };

    rows.into_iter().map(PaymentRecord::try_from).collect()
}
