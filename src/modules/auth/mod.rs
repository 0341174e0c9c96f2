pub mod extractors;
pub mod handlers;
pub mod password;
pub mod router;
pub mod service;
