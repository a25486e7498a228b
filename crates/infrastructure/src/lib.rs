pub mod errors;
pub mod farm_service;
pub mod json_store;
pub mod retry;
pub mod seed;
pub mod store;

pub use errors::*;
pub use farm_service::*;
pub use json_store::*;
pub use retry::*;
pub use seed::*;
pub use store::*;
