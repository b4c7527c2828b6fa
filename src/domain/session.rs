//! Per-user top-up conversation state.
//!
//! The phase enum replaces loose flags: a session is either waiting for the
//! user to pick an asset, waiting for a numeric amount, or waiting for one or
//! more opened invoices to settle. Pending invoices are tracked separately so
//! a user can re-select an asset without losing invoices already opened.

use {
    super::error::PipelineError,
    super::id::{InvoiceId, SessionId},
    super::money::Asset,
    serde::Serialize,
    std::collections::BTreeSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingAsset,
    AwaitingAmount { asset: Asset },
    AwaitingSettlement { asset: Asset },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SelectAsset(Asset),
    AmountEntered,
    InvoiceOpened(InvoiceId),
    InvoiceResolved(InvoiceId),
}

/// Result of applying an event, telling the registry whether to keep the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Keep,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUpSession {
    id: SessionId,
    phase: SessionPhase,
    pending: BTreeSet<InvoiceId>,
}

impl TopUpSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            phase: SessionPhase::AwaitingAsset,
            pending: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn pending(&self) -> &BTreeSet<InvoiceId> {
        &self.pending
    }

    /// Asset for which the next typed number should open an invoice.
    pub fn awaiting_amount(&self) -> Option<Asset> {
        match self.phase {
            SessionPhase::AwaitingAmount { asset } => Some(asset),
            _ => None,
        }
    }

    /// Select (or re-select) the asset. Valid from every phase; pending
    /// invoices are kept.
    pub fn select_asset(&mut self, asset: Asset) {
        self.phase = SessionPhase::AwaitingAmount { asset };
    }

    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition, PipelineError> {
        use SessionEvent::*;
        use SessionPhase::*;

        match (self.phase, event) {
            (_, SelectAsset(asset)) => self.select_asset(asset),
            (AwaitingAmount { asset }, AmountEntered) => self.phase = AwaitingSettlement { asset },
            (AwaitingSettlement { .. }, AmountEntered) => {}
            (AwaitingAsset, AmountEntered) => {
                return Err(PipelineError::Validation(
                    "no asset selected for this top-up".into(),
                ));
            }
            (phase, InvoiceOpened(id)) => {
                self.pending.insert(id);
                if let AwaitingAmount { asset } = phase {
                    self.phase = AwaitingSettlement { asset };
                }
            }
            (phase, InvoiceResolved(id)) => {
                self.pending.remove(&id);
                if matches!(phase, AwaitingSettlement { .. }) && self.pending.is_empty() {
                    return Ok(Transition::Finished);
                }
            }
        }

        Ok(Transition::Keep)
    }
}

impl Default for TopUpSession {
    fn default() -> Self {
        Self::new()
    }
}
