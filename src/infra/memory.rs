use {
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, UserId},
        money::{Amount, Balance},
        payment::{NewPaymentRecord, PaymentRecord, PaymentStatus},
        store::{PaymentStore, StoreFuture},
        user::User,
    },
    std::{collections::HashMap, sync::Arc},
    tokio::sync::RwLock,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    payments: HashMap<InvoiceId, PaymentRecord>,
}

impl State {
    fn user_mut(&mut self, id: UserId) -> &mut User {
        self.users
            .entry(id)
            .or_insert_with(|| User::new(id, User::default_tag(id)))
    }
}

/// A thread-safe in-memory payment store.
///
/// Every operation takes the lock once, so the conditional status update is
/// atomic with respect to concurrent callers. Used by tests and by local runs
/// without a database.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryStore {
    fn ensure_user(&self, id: UserId, name_tag: &str) -> StoreFuture<'_, User> {
        let name_tag = name_tag.to_string();
        Box::pin(async move {
            let mut state = self.state.write().await;
            let user = state
                .users
                .entry(id)
                .or_insert_with(|| User::new(id, name_tag));
            Ok(user.clone())
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.state.read().await.users.get(&id).cloned()) })
    }

    fn get_user_balance(&self, id: UserId) -> StoreFuture<'_, Balance> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            Ok(state.user_mut(id).balance)
        })
    }

    fn set_user_balance(&self, id: UserId, balance: Balance) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            state.user_mut(id).balance = balance;
            Ok(())
        })
    }

    fn credit_balance(&self, id: UserId, amount: Amount) -> StoreFuture<'_, Balance> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let user = state.user_mut(id);
            let next = user
                .balance
                .checked_add(amount)
                .ok_or_else(|| PipelineError::Validation("balance overflow".into()))?;
            user.balance = next;
            Ok(next)
        })
    }

    fn create_payment(&self, payment: &NewPaymentRecord) -> StoreFuture<'_, PaymentRecord> {
        let record = payment.clone().into_record();
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.payments.contains_key(&record.invoice_id) {
                return Err(PipelineError::Validation(format!(
                    "payment for invoice {} already exists",
                    record.invoice_id
                )));
            }
            state.user_mut(record.user_id);
            state.payments.insert(record.invoice_id, record.clone());
            Ok(record)
        })
    }

    fn get_payment_by_invoice_id(&self, id: InvoiceId) -> StoreFuture<'_, Option<PaymentRecord>> {
        Box::pin(async move { Ok(self.state.read().await.payments.get(&id).cloned()) })
    }

    fn conditionally_update_status(
        &self,
        id: InvoiceId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            // Terminal records never move again.
            if !expected.can_transition_to(&next) {
                return Ok(false);
            }

            let mut state = self.state.write().await;
            match state.payments.get_mut(&id) {
                Some(record) if record.status == expected => {
                    record.status = next;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn list_pending_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut pending: Vec<_> = state
                .payments
                .values()
                .filter(|p| p.user_id == id && p.status == PaymentStatus::Active)
                .cloned()
                .collect();
            pending.sort_by_key(|p| (p.created_at, p.id));
            Ok(pending)
        })
    }

    fn list_payments_for_user(&self, id: UserId) -> StoreFuture<'_, Vec<PaymentRecord>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut all: Vec<_> = state
                .payments
                .values()
                .filter(|p| p.user_id == id)
                .cloned()
                .collect();
            all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            Ok(all)
        })
    }
}
