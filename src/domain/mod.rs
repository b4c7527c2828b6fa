pub mod error;
pub mod id;
pub mod invoice;
pub mod money;
pub mod notify;
pub mod payment;
pub mod provider;
pub mod session;
pub mod store;
pub mod user;
