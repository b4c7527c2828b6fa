use {
    super::{payment_repo, user_repo},
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, UserId},
        money::{Amount, Balance},
        payment::{NewPaymentRecord, PaymentRecord, PaymentStatus, Settlement},
        store::{PaymentStore, StoreFuture},
        user::User,
    },
    sqlx::PgPool,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PaymentStore for PgStore {
    fn ensure_user(&self, id: UserId, name_tag: &str) -> StoreFuture<'_, User> {
        let name_tag = name_tag.to_string();
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            user_repo::insert_if_missing(&mut conn, id, &name_tag).await?;
            user_repo::get_user(&mut conn, id)
                .await?
                .ok_or_else(|| PipelineError::NotFound(format!("user {id}")))
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            user_repo::get_user(&mut conn, id).await
        })
    }

    fn get_user_balance(&self, id: UserId) -> StoreFuture<'_, Balance> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            user_repo::insert_if_missing(&mut conn, id, &User::default_tag(id)).await?;
            let user = user_repo::get_user(&mut conn, id)
                .await?
                .ok_or_else(|| PipelineError::NotFound(format!("user {id}")))?;
            Ok(user.balance)
        })
    }

    fn set_user_balance(&self, id: UserId, balance: Balance) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            user_repo::set_balance(&mut conn, id, balance).await
        })
    }

    fn credit_balance(&self, id: UserId, amount: Amount) -> StoreFuture<'_, Balance> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            user_repo::credit_balance(&mut conn, id, amount).await
        })
    }

    fn create_payment(&self, payment: &NewPaymentRecord) -> StoreFuture<'_, PaymentRecord> {
        let payment = payment.clone();
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            user_repo::insert_if_missing(&mut tx, payment.user_id(), &User::default_tag(payment.user_id()))
                .await?;
            let record = payment_repo::insert_payment(&mut tx, &payment)
                .await?
                .ok_or_else(|| {
                    PipelineError::Validation(format!(
                        "payment for invoice {} already exists",
                        payment.invoice_id()
                    ))
                })?;
            tx.commit().await?;
            Ok(record)
        })
    }

    fn get_payment_by_invoice_id(&self, id: InvoiceId) -> StoreFuture<'_, Option<PaymentRecord>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            payment_repo::get_by_invoice_id(&mut conn, id).await
        })
    }

    fn conditionally_update_status(
        &self,
        id: InvoiceId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            payment_repo::update_status_if(&mut conn, id, expected, next).await
        })
    }

    fn list_pending_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            payment_repo::list_for_user(&mut conn, id, Some(PaymentStatus::Active)).await
        })
    }

    fn list_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            payment_repo::list_for_user(&mut conn, id, None).await
        })
    }

    /// Status flip and credit commit together, so a crash can't leave a paid
    /// record without its credit.
    fn settle(&self, id: InvoiceId, settlement: Settlement) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            sqlx::query("SET LOCAL lock_timeout = '5s'")
                .execute(&mut *tx)
                .await?;

            // Concurrent settlers of the same invoice queue up here; the
            // conditional update below is what actually decides the winner.
            payment_repo::lock_invoice(&mut tx, id).await?;

            let applied = payment_repo::update_status_if(
                &mut tx,
                id,
                PaymentStatus::Active,
                settlement.target_status(),
            )
            .await?;

            if !applied {
                tx.commit().await?;
                return Ok(false);
            }

            if let Settlement::Credit { user_id, amount } = settlement {
                let balance = user_repo::credit_balance(&mut tx, user_id, amount).await?;
                tracing::debug!(%user_id, invoice_id = %id, %balance, "balance credited");
            }

            tx.commit().await?;
            Ok(true)
        })
    }
}
