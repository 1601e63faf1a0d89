pub mod error;
pub mod fingerprint;
pub mod record;

pub use error::StoreError;
pub use fingerprint::{Fingerprint, FingerprintStrategy};
pub use record::{Record, RecordPatch};
