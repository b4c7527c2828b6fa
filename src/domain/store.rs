use {
    super::error::PipelineError,
    super::id::{InvoiceId, UserId},
    super::money::{Amount, Balance},
    super::payment::{NewPaymentRecord, PaymentRecord, PaymentStatus, Settlement},
    super::user::User,
    std::{future::Future, pin::Pin},
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PipelineError>> + Send + 'a>>;

/// Persistence operations the payment core relies on. The store is the single
/// source of truth for payment status and balances.
pub trait PaymentStore: Send + Sync {
    /// Insert the user if unknown; returns the stored row either way.
    fn ensure_user(&self, id: UserId, name_tag: &str) -> StoreFuture<'_, User>;

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Reads the balance, creating a zero-balance user on first contact.
    fn get_user_balance(&self, id: UserId) -> StoreFuture<'_, Balance>;

    /// Administrative override. Creates the user if missing.
    fn set_user_balance(&self, id: UserId, balance: Balance) -> StoreFuture<'_, ()>;

    /// Atomic increment; returns the new balance.
    fn credit_balance(&self, id: UserId, amount: Amount) -> StoreFuture<'_, Balance>;

    /// Fails with `Validation` if a record for the invoice id already exists.
    fn create_payment(&self, payment: &NewPaymentRecord) -> StoreFuture<'_, PaymentRecord>;

    fn get_payment_by_invoice_id(&self, id: InvoiceId) -> StoreFuture<'_, Option<PaymentRecord>>;

    /// Sets `next` only if the persisted status is still `expected` and the
    /// move is `active → paid|closed`. Returns whether the write was applied.
    fn conditionally_update_status(
        &self,
        id: InvoiceId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> StoreFuture<'_, bool>;

    fn list_pending_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>>;

    /// All payments of a user, newest first.
    fn list_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>>;

    /// Terminal transition out of `active`, plus the credit when the target is
    /// `paid`. Returns `false` when another caller already moved the record,
    /// in which case nothing is credited.
    ///
    /// The default runs the credit right after the conditional update; a crash
    /// in between under-credits but never double-credits. Stores that can do
    /// both in one transaction should override it.
    fn settle(&self, id: InvoiceId, settlement: Settlement) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let applied = self
                .conditionally_update_status(id, PaymentStatus::Active, settlement.target_status())
                .await?;
            if !applied {
                return Ok(false);
            }
            if let Settlement::Credit { user_id, amount } = settlement {
                self.credit_balance(user_id, amount).await?;
            }
            Ok(true)
        })
    }
}
