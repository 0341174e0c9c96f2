pub mod config;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod repository;
pub mod state;
