pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub topups: Arc<services::topup::TopUpService>,
}
