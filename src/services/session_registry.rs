use {
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, SessionId, UserId},
        money::Asset,
        session::{SessionEvent, TopUpSession, Transition},
    },
    std::collections::{BTreeSet, HashMap},
    tokio::sync::Mutex,
};

/// In-memory map from user to their in-progress top-up.
///
/// All mutations go through one lock and never hold it across an await on
/// anything else, so updates to a user's pending set can't be lost between
/// the sweeper and interactive handlers. Nothing here is persisted.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, TopUpSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select (or re-select) the asset, creating the session if needed.
    pub async fn begin_session(&self, user: UserId, asset: Asset) -> SessionId {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user).or_default();
        session.select_asset(asset);
        session.id()
    }

    /// Leave the amount-entry phase. Repeating it is a no-op.
    pub async fn record_amount_entered(&self, user: UserId) -> Result<(), PipelineError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&user)
            .ok_or_else(|| PipelineError::Validation("no top-up in progress".into()))?;
        session.apply(SessionEvent::AmountEntered)?;
        Ok(())
    }

    /// Returns `false` when the user has no session, e.g. it was cancelled
    /// while the invoice was being opened.
    pub async fn track_invoice(&self, user: UserId, invoice: InvoiceId) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&user) {
            Some(session) => session.apply(SessionEvent::InvoiceOpened(invoice)).is_ok(),
            None => false,
        }
    }

    /// Idempotent. Drops the session once its last awaited invoice resolves.
    pub async fn untrack_invoice(&self, user: UserId, invoice: InvoiceId) {
        let mut sessions = self.sessions.lock().await;
        let finished = match sessions.get_mut(&user) {
            Some(session) => matches!(
                session.apply(SessionEvent::InvoiceResolved(invoice)),
                Ok(Transition::Finished)
            ),
            None => false,
        };
        if finished {
            sessions.remove(&user);
            tracing::debug!(%user, "top-up session finished");
        }
    }

    /// Cancel or return-to-menu. Returns whether a session existed.
    pub async fn end_session(&self, user: UserId) -> bool {
        self.sessions.lock().await.remove(&user).is_some()
    }

    pub async fn awaiting_amount(&self, user: UserId) -> Option<Asset> {
        self.sessions
            .lock()
            .await
            .get(&user)
            .and_then(TopUpSession::awaiting_amount)
    }

    pub async fn snapshot(&self, user: UserId) -> Option<TopUpSession> {
        self.sessions.lock().await.get(&user).cloned()
    }

    /// Users with at least one invoice awaiting confirmation, with a copy of
    /// their pending set.
    pub async fn users_with_pending(&self) -> Vec<(UserId, BTreeSet<InvoiceId>)> {
        self.sessions
            .lock()
            .await
            .iter()
            .filter(|(_, s)| !s.pending().is_empty())
            .map(|(user, s)| (*user, s.pending().clone()))
            .collect()
    }
}
