//! # repool
//!
//! Thread-safe recycling object pool with lifecycle hooks and delayed
//! reclamation.
//!
//! ## Features
//!
//! - Capacity-bounded fabrication through a factory captured at construction
//! - LIFO free list, so the cache-warmest instance is reused first
//! - Self-returning handles: dropping a [`Handle`] returns its instance
//! - Three lifecycle hooks: pre-acquire, pre-return, final-destroy
//! - Delayed release: park an instance and let the background sweeper
//!   return it once the delay expires
//! - Metrics snapshots with Prometheus-format export
//!
//! ## Quick Start
//!
//! ```rust
//! use repool::{Pool, PoolConfig};
//!
//! let pool = Pool::new(
//!     || Vec::<u8>::with_capacity(4096),
//!     PoolConfig::default().with_max_size(8),
//! )
//! .unwrap();
//!
//! {
//!     let mut buf = pool.acquire().unwrap();
//!     buf.extend_from_slice(b"hello");
//!     // Buffer automatically returned when `buf` goes out of scope
//! }
//! assert_eq!(pool.available_count(), 1);
//! ```

mod pool;
mod config;
mod hooks;
mod reclaim;
mod metrics;
mod errors;

pub use pool::{Handle, Pool};
pub use config::PoolConfig;
pub use hooks::{Hook, LifecycleHooks};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use errors::{PoolError, PoolResult};
