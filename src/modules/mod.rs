pub mod auth;
pub mod metrics;
pub mod orders;
pub mod users;
