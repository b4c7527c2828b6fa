pub mod reconciler;
pub mod session_registry;
pub mod sweeper;
pub mod topup;

use {
    crate::domain::{provider::InvoiceProvider, store::PaymentStore},
    session_registry::SessionRegistry,
    std::sync::Arc,
};

/// Collaborators shared by the interactive flow and the sweeper.
#[derive(Clone)]
pub struct PaymentContext {
    pub store: Arc<dyn PaymentStore>,
    pub provider: Arc<dyn InvoiceProvider>,
    pub sessions: Arc<SessionRegistry>,
}

impl PaymentContext {
    pub fn new(store: Arc<dyn PaymentStore>, provider: Arc<dyn InvoiceProvider>) -> Self {
        Self {
            store,
            provider,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
