//! Response cache keyed by a fingerprint of the full request.

mod entry;
mod error;
mod key;
mod manager;
mod policy;
mod stats;
mod store;

pub use entry::{CachedEntry, CapturedResponse};
pub use error::{BoxError, CacheError};
pub use key::CacheKey;
pub use manager::{Lookup, ResponseCache};
pub use policy::CachePolicy;
pub use stats::CacheStats;
