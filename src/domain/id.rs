use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PipelineError;

/// End-user identity as handed to us by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Provider-side invoice identifier (`invoice_id` in Crypto Pay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct InvoiceId(i64);

impl InvoiceId {
    pub fn new(id: i64) -> Result<Self, PipelineError> {
        if id <= 0 {
            return Err(PipelineError::Validation(format!(
                "InvoiceId must be positive, got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for InvoiceId {
    type Error = PipelineError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<InvoiceId> for i64 {
    fn from(id: InvoiceId) -> i64 {
        id.0
    }
}

impl TryFrom<&str> for InvoiceId {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|_| PipelineError::Validation(format!("invalid invoice id: {s}")))?;
        Self::new(id)
    }
}

/// Handle for one top-up flow, regenerated whenever a session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}
