//! Lifecycle hook registry
//!
//! A pool carries up to three optional callbacks: one run before an instance
//! is handed to a caller, one run before it re-enters the free list, and one
//! run just before it is destroyed for good. Hooks must not panic; a
//! panicking hook is a bug in the caller, not a pool condition the pool
//! recovers from.

use std::fmt;
use std::sync::Arc;

/// A lifecycle callback. Receives the instance by mutable reference so it
/// can reset or inspect it in place.
pub type Hook<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// The three optional lifecycle callbacks of a pool.
///
/// Configure the hooks up front and pass the registry to
/// [`Pool::with_hooks`](crate::Pool::with_hooks); the pool also exposes
/// setters for reconfiguration, but those are intended for use before the
/// pool is shared across threads.
///
/// # Examples
///
/// ```
/// use repool::LifecycleHooks;
///
/// let hooks = LifecycleHooks::<Vec<u8>>::new()
///     .on_return(|buf| buf.clear())
///     .on_destroy(|buf| buf.shrink_to_fit());
/// ```
pub struct LifecycleHooks<T> {
    pub(crate) pre_acquire: Option<Hook<T>>,
    pub(crate) pre_return: Option<Hook<T>>,
    pub(crate) final_destroy: Option<Hook<T>>,
}

impl<T> LifecycleHooks<T> {
    /// Create an empty registry with no hooks set.
    pub fn new() -> Self {
        Self {
            pre_acquire: None,
            pre_return: None,
            final_destroy: None,
        }
    }

    /// Run before an instance is handed out by `acquire`.
    pub fn on_acquire<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.pre_acquire = Some(Arc::new(hook));
        self
    }

    /// Run before an instance re-enters the free list. Delayed releases run
    /// this when the delay expires, not when the release is requested.
    pub fn on_return<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.pre_return = Some(Arc::new(hook));
        self
    }

    /// Run exactly once per instance, just before it is dropped for good.
    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.final_destroy = Some(Arc::new(hook));
        self
    }
}

impl<T> Default for LifecycleHooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LifecycleHooks<T> {
    fn clone(&self) -> Self {
        Self {
            pre_acquire: self.pre_acquire.clone(),
            pre_return: self.pre_return.clone(),
            final_destroy: self.final_destroy.clone(),
        }
    }
}

impl<T> fmt::Debug for LifecycleHooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("pre_acquire", &self.pre_acquire.is_some())
            .field("pre_return", &self.pre_return.is_some())
            .field("final_destroy", &self.final_destroy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let hooks = LifecycleHooks::<u32>::default();
        assert!(hooks.pre_acquire.is_none());
        assert!(hooks.pre_return.is_none());
        assert!(hooks.final_destroy.is_none());
    }

    #[test]
    fn builder_sets_slots() {
        let hooks = LifecycleHooks::<u32>::new()
            .on_acquire(|v| *v += 1)
            .on_return(|v| *v = 0);

        assert!(hooks.pre_acquire.is_some());
        assert!(hooks.pre_return.is_some());
        assert!(hooks.final_destroy.is_none());

        let mut value = 41;
        if let Some(hook) = &hooks.pre_acquire {
            hook(&mut value);
        }
        assert_eq!(value, 42);
    }

    #[test]
    fn clone_shares_callbacks() {
        let hooks = LifecycleHooks::<u32>::new().on_destroy(|_| {});
        let copy = hooks.clone();
        assert!(copy.final_destroy.is_some());
    }
}
