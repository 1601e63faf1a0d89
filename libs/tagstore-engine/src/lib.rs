pub mod config;
pub mod error;
pub mod shared;
pub mod store;

pub use error::EngineError;
pub use shared::SharedStore;
pub use store::{ReadOutcome, ResourceStore, Versioned};
