pub mod payment_repo;
pub mod store;
pub mod user_repo;

pub use store::PgStore;
