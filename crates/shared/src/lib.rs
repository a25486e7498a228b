pub mod config;
pub mod errors;
pub mod notifier;
pub mod tracing;

pub use config::*;
pub use errors::*;
pub use notifier::*;
pub use tracing::*;
