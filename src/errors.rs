//! Error types for the object pool

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// Every permitted instance is checked out. Backpressure, not failure:
    /// callers decide whether to retry, wait, or shed load.
    #[error("pool exhausted - all {0} permitted instances are in use")]
    Exhausted(usize),

    #[error("invalid pool configuration: {0}")]
    Config(String),

    /// The factory failed to produce an instance. During initial population
    /// this aborts construction; during `acquire` it propagates to the caller.
    #[error("factory failed to produce an instance")]
    Factory(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

pub type PoolResult<T> = Result<T, PoolError>;
