//! Pulls live invoice status from the provider and applies at most one
//! terminal transition to the local payment record.
//!
//! Both the interactive "check payment" path and the periodic sweep land
//! here, possibly at the same time for the same invoice. The store's
//! conditional `active → terminal` update picks exactly one winner; only the
//! winner credits the balance.

use {
    super::PaymentContext,
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, UserId},
        payment::{PaymentRecord, PaymentStatus, Settlement},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Provider still reports the invoice as open.
    Pending,
    /// This call moved the record to `paid` and credited the balance.
    Credited(PaymentRecord),
    /// This call moved the record to `closed`.
    Closed(PaymentRecord),
    /// The record was already terminal, or a concurrent call won the race.
    AlreadySettled(PaymentStatus),
}

impl ReconcileOutcome {
    pub fn status(&self) -> PaymentStatus {
        match self {
            Self::Pending => PaymentStatus::Active,
            Self::Credited(_) => PaymentStatus::Paid,
            Self::Closed(_) => PaymentStatus::Closed,
            Self::AlreadySettled(status) => *status,
        }
    }
}

#[tracing::instrument(name = "reconcile", skip_all, fields(%invoice_id, %user_id))]
pub async fn reconcile(
    ctx: &PaymentContext,
    invoice_id: InvoiceId,
    user_id: UserId,
) -> Result<ReconcileOutcome, PipelineError> {
    let record = ctx
        .store
        .get_payment_by_invoice_id(invoice_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| PipelineError::NotFound(format!("payment for invoice {invoice_id}")))?;

    // Terminal records are immutable: no provider call, no writes.
    if record.status.is_terminal() {
        ctx.sessions.untrack_invoice(user_id, invoice_id).await;
        return Ok(ReconcileOutcome::AlreadySettled(record.status));
    }

    // Failures here leave local state untouched; callers retry later.
    let invoice = ctx.provider.fetch_invoice(invoice_id).await?;
    let live = PaymentStatus::from_invoice(&invoice.status);

    if live == PaymentStatus::Active {
        return Ok(ReconcileOutcome::Pending);
    }

    let settlement = match live {
        PaymentStatus::Paid => {
            if invoice.amount != record.amount.value() {
                tracing::warn!(
                    requested = %record.amount,
                    invoiced = %invoice.amount,
                    "provider amount differs from requested amount, crediting requested"
                );
            }
            Settlement::Credit {
                user_id: record.user_id,
                amount: record.amount,
            }
        }
        _ => Settlement::Close,
    };

    let applied = ctx.store.settle(invoice_id, settlement).await?;
    ctx.sessions.untrack_invoice(user_id, invoice_id).await;

    if !applied {
        let current = ctx
            .store
            .get_payment_by_invoice_id(invoice_id)
            .await?
            .map(|r| r.status)
            .unwrap_or(live);
        tracing::debug!(status = %current, "transition already applied by another caller");
        return Ok(ReconcileOutcome::AlreadySettled(current));
    }

    let settled = PaymentRecord {
        status: settlement.target_status(),
        ..record
    };

    match settlement {
        Settlement::Credit { amount, .. } => {
            tracing::info!(%amount, asset = %settled.asset, "payment settled, balance credited");
            Ok(ReconcileOutcome::Credited(settled))
        }
        Settlement::Close => {
            tracing::info!(provider_status = ?invoice.status, "invoice closed without payment");
            Ok(ReconcileOutcome::Closed(settled))
        }
    }
}
