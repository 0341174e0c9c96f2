pub mod file;
pub mod order;
pub mod status;
