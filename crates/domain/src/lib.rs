pub mod animal;
pub mod birth;
pub mod clock;
pub mod errors;
pub mod farm;
pub mod identifiers;
pub mod integrity;
pub mod lactation;
pub mod milk;
pub mod notification;
pub mod reports;
pub mod stats;

pub use animal::*;
pub use birth::*;
pub use clock::*;
pub use errors::*;
pub use farm::*;
pub use identifiers::*;
pub use lactation::*;
pub use milk::*;
pub use notification::*;
pub use reports::*;
pub use stats::*;
