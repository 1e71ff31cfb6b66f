use std::error::Error;

use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The request body could not be read while computing the key.
    #[error("failed to read request body: {0}")]
    Body(#[source] BoxError),
}
