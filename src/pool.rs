//! Core pool implementation: the free-list store, capacity accounting, and
//! the self-returning handle.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::config::PoolConfig;
use crate::errors::{PoolError, PoolResult};
use crate::hooks::{Hook, LifecycleHooks};
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::reclaim::{DelayedQueue, Sweeper};

type Factory<T> = Arc<dyn Fn() -> PoolResult<T> + Send + Sync>;

/// Idle instances plus the allocation counter, guarded by one mutex so the
/// capacity check and fabrication decision are a single atomic step.
/// Invariants: `allocated <= max_size`, `idle.len() <= allocated`.
struct Shelf<T> {
    idle: Vec<T>,
    allocated: usize,
}

/// Shared pool state. The owning [`Pool`] holds the only strong reference;
/// handles and the sweeper thread hold weak ones, so outstanding handles
/// never extend the pool's lifetime.
pub(crate) struct PoolCore<T: Send> {
    shelf: Mutex<Shelf<T>>,
    delayed: DelayedQueue<T>,
    hooks: RwLock<LifecycleHooks<T>>,
    factory: Factory<T>,
    leases: DashMap<u64, ()>,
    next_lease: AtomicU64,
    metrics: MetricsTracker,
    max_size: usize,
}

impl<T: Send> PoolCore<T> {
    /// Pop the most recently returned instance, or fabricate a new one if
    /// the cap allows. The slot is reserved before the factory runs so the
    /// lock is not held across user code.
    fn checkout(&self) -> PoolResult<T> {
        let mut value = {
            let mut shelf = self.shelf.lock();
            if let Some(value) = shelf.idle.pop() {
                self.metrics.reused.fetch_add(1, Ordering::Relaxed);
                value
            } else if shelf.allocated < self.max_size {
                shelf.allocated += 1;
                drop(shelf);
                match (self.factory)() {
                    Ok(value) => {
                        self.metrics.fabricated.fetch_add(1, Ordering::Relaxed);
                        value
                    }
                    Err(err) => {
                        self.shelf.lock().allocated -= 1;
                        return Err(err);
                    }
                }
            } else {
                self.metrics.exhausted_events.fetch_add(1, Ordering::Relaxed);
                return Err(PoolError::Exhausted(self.max_size));
            }
        };

        if let Some(hook) = self.hooks.read().pre_acquire.clone() {
            hook(&mut value);
        }
        Ok(value)
    }

    /// Return an instance to the shelf, or finalize it if the shelf is
    /// already at capacity. Hooks run with no lock held.
    fn release_immediate(&self, mut value: T, lease: Option<u64>) {
        if let Some(id) = lease {
            self.leases.remove(&id);
        }

        if let Some(hook) = self.hooks.read().pre_return.clone() {
            hook(&mut value);
        }

        let overflow = {
            let mut shelf = self.shelf.lock();
            if shelf.idle.len() < self.max_size {
                shelf.idle.push(value);
                None
            } else {
                shelf.allocated -= 1;
                Some(value)
            }
        };

        self.metrics.returned.fetch_add(1, Ordering::Relaxed);
        if let Some(value) = overflow {
            self.finalize(value);
        }
    }

    /// Park an instance in the delayed queue. The pre-return hook runs when
    /// the delay expires, not here.
    fn park(&self, value: T, lease: u64, delay: Duration) {
        self.leases.remove(&lease);
        self.delayed.schedule(value, delay);
        self.metrics.delayed_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// One sweeper pass: move every expired parked instance through the
    /// immediate-release path. The delayed-queue lock is released before the
    /// shelf lock is touched.
    fn sweep(&self) {
        let expired = self.delayed.pop_expired(Instant::now());
        if expired.is_empty() {
            return;
        }
        self.metrics
            .sweep_reclaimed
            .fetch_add(expired.len(), Ordering::Relaxed);
        for value in expired {
            self.release_immediate(value, None);
        }
    }

    /// Run the final-destroy hook and drop the instance. The caller has
    /// already removed it from all pool structures and adjusted `allocated`.
    fn finalize(&self, mut value: T) {
        if let Some(hook) = self.hooks.read().final_destroy.clone() {
            hook(&mut value);
        }
        self.metrics.destroyed.fetch_add(1, Ordering::Relaxed);
    }

    /// Destroy every idle and parked instance. Parked instances get the
    /// pre-return hook first (they never saw it; shelf instances already had
    /// it when they were released). Outstanding handles are unaffected.
    fn clear(&self) {
        let parked = self.delayed.drain_all();
        if !parked.is_empty() {
            self.shelf.lock().allocated -= parked.len();
            let hook = self.hooks.read().pre_return.clone();
            for mut value in parked {
                if let Some(hook) = &hook {
                    hook(&mut value);
                }
                self.finalize(value);
            }
        }

        let idle = {
            let mut shelf = self.shelf.lock();
            shelf.allocated -= shelf.idle.len();
            std::mem::take(&mut shelf.idle)
        };
        for value in idle {
            self.finalize(value);
        }
    }

    /// Teardown path: convert every parked instance into an immediate
    /// release (so the pre-return hook still runs), then finalize whatever
    /// is left on the shelf. Idempotent.
    fn teardown(&self) {
        for value in self.delayed.drain_all() {
            self.release_immediate(value, None);
        }

        let idle = {
            let mut shelf = self.shelf.lock();
            shelf.allocated -= shelf.idle.len();
            std::mem::take(&mut shelf.idle)
        };
        for value in idle {
            self.finalize(value);
        }
    }

    /// Remove a leased instance from the pool's accounting without running
    /// any hook. Used when the caller takes permanent ownership.
    fn forget(&self, lease: u64) {
        self.leases.remove(&lease);
        self.shelf.lock().allocated -= 1;
    }

    fn populate(&self, count: usize) -> PoolResult<()> {
        for _ in 0..count {
            let value = (self.factory)()?;
            let mut shelf = self.shelf.lock();
            shelf.allocated += 1;
            shelf.idle.push(value);
            self.metrics.fabricated.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl<T: Send> Drop for PoolCore<T> {
    fn drop(&mut self) {
        // Catches instances a racing release re-shelved after the owning
        // pool drained, so every instance still sees final-destroy.
        self.teardown();
    }
}

/// A leased instance that returns itself to the pool when dropped
///
/// The handle owns its instance outright; dropping it (or calling
/// [`release`](Handle::release)) hands the instance back through the pool's
/// release path. The handle holds only a weak reference to the pool, so if
/// the pool has been torn down in the meantime the instance is finalized
/// directly with the destroy hook captured at acquire time.
pub struct Handle<T: Send> {
    value: Option<T>,
    lease: u64,
    core: Weak<PoolCore<T>>,
    final_destroy: Option<Hook<T>>,
}

impl<T: Send> Handle<T> {
    /// Return the instance to the pool immediately. Equivalent to dropping
    /// the handle; provided for call sites that want the transfer explicit.
    pub fn release(self) {}

    /// Return the instance to the pool after `delay` has elapsed. The
    /// instance is invisible to `acquire` until the delay expires and a
    /// sweeper pass has run. A zero delay is an immediate release. If the
    /// pool no longer exists the instance is finalized right away.
    pub fn release_after(mut self, delay: Duration) {
        let Some(value) = self.value.take() else {
            return;
        };
        match self.core.upgrade() {
            Some(core) => {
                if delay.is_zero() {
                    core.release_immediate(value, Some(self.lease));
                } else {
                    core.park(value, self.lease, delay);
                }
            }
            None => Self::finalize_detached(&self.final_destroy, value),
        }
    }

    /// Take the instance out of the pool for good. No hook runs; the pool
    /// frees the capacity slot so a future `acquire` can fabricate a
    /// replacement.
    pub fn into_inner(mut self) -> T {
        let value = self.value.take().expect("value already taken");
        if let Some(core) = self.core.upgrade() {
            core.forget(self.lease);
        }
        value
    }

    fn finalize_detached(hook: &Option<Hook<T>>, mut value: T) {
        if let Some(hook) = hook {
            hook(&mut value);
        }
    }
}

impl<T: Send> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("value already taken")
    }
}

impl<T: Send> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("value already taken")
    }
}

impl<T: Send> Drop for Handle<T> {
    fn drop(&mut self) {
        // take() fires at most once, so a handle consumed by release_after
        // or into_inner is a no-op here.
        if let Some(value) = self.value.take() {
            match self.core.upgrade() {
                Some(core) => core.release_immediate(value, Some(self.lease)),
                None => Self::finalize_detached(&self.final_destroy, value),
            }
        }
    }
}

/// Thread-safe recycling pool with capacity-bounded fabrication
///
/// Instances are produced by a factory captured at construction, handed out
/// as self-returning [`Handle`]s, and recycled LIFO through a free list.
/// Releases may be deferred by a delay; a background sweeper returns them
/// once the delay expires. Dropping the pool stops the sweeper, drains the
/// delayed queue, and finalizes every idle instance.
///
/// # Examples
///
/// ```
/// use repool::{Pool, PoolConfig};
///
/// let pool = Pool::new(|| String::with_capacity(64), PoolConfig::default()).unwrap();
/// {
///     let mut s = pool.acquire().unwrap();
///     s.push_str("hello");
/// } // returned to the pool here
/// assert_eq!(pool.available_count(), 1);
/// ```
pub struct Pool<T: Send> {
    core: Arc<PoolCore<T>>,
    sweeper: Option<Sweeper>,
}

impl<T: Send + 'static> Pool<T> {
    /// Create a pool around an infallible factory with no hooks.
    ///
    /// Fabricates `config.initial_size` instances up front and starts the
    /// background sweeper.
    pub fn new<F>(factory: F, config: PoolConfig) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_hooks(factory, LifecycleHooks::new(), config)
    }

    /// Create a pool around an infallible factory with lifecycle hooks.
    pub fn with_hooks<F>(factory: F, hooks: LifecycleHooks<T>, config: PoolConfig) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(Arc::new(move || Ok(factory())), hooks, config)
    }

    /// Create a pool around a fallible factory.
    ///
    /// A factory error during initial population aborts construction: the
    /// error propagates, and instances already fabricated are finalized
    /// before this returns, so no half-built pool is ever observable.
    pub fn try_new<F, E>(factory: F, hooks: LifecycleHooks<T>, config: PoolConfig) -> PoolResult<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::build(
            Arc::new(move || factory().map_err(|err| PoolError::Factory(Arc::new(err)))),
            hooks,
            config,
        )
    }

    fn build(factory: Factory<T>, hooks: LifecycleHooks<T>, config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let core = Arc::new(PoolCore {
            shelf: Mutex::new(Shelf {
                idle: Vec::with_capacity(config.initial_size),
                allocated: 0,
            }),
            delayed: DelayedQueue::new(),
            hooks: RwLock::new(hooks),
            factory,
            leases: DashMap::new(),
            next_lease: AtomicU64::new(0),
            metrics: MetricsTracker::new(),
            max_size: config.max_size,
        });

        // On failure the core is dropped here and its Drop finalizes the
        // partial population.
        core.populate(config.initial_size)?;

        let weak = Arc::downgrade(&core);
        let sweeper = Sweeper::spawn(config.sweep_interval, move || match weak.upgrade() {
            Some(core) => {
                core.sweep();
                true
            }
            None => false,
        });

        Ok(Self {
            core,
            sweeper: Some(sweeper),
        })
    }

    /// Lease an instance from the pool.
    ///
    /// Returns the most recently released idle instance if any exist;
    /// otherwise fabricates a new one, unless the pool is at capacity, in
    /// which case [`PoolError::Exhausted`] is returned.
    pub fn acquire(&self) -> PoolResult<Handle<T>> {
        let value = self.core.checkout()?;
        let lease = self.core.next_lease.fetch_add(1, Ordering::Relaxed);
        self.core.leases.insert(lease, ());
        let final_destroy = self.core.hooks.read().final_destroy.clone();
        Ok(Handle {
            value: Some(value),
            lease,
            core: Arc::downgrade(&self.core),
            final_destroy,
        })
    }

    /// Lease an instance, mapping exhaustion to `None`.
    pub fn try_acquire(&self) -> Option<Handle<T>> {
        self.acquire().ok()
    }

    /// Return a handle to the pool immediately. Equivalent to dropping it.
    pub fn release(&self, handle: Handle<T>) {
        drop(handle);
    }

    /// Return a handle to the pool once `delay` has elapsed.
    pub fn release_after(&self, handle: Handle<T>, delay: Duration) {
        handle.release_after(delay);
    }

    /// Number of idle instances ready for reuse. A snapshot: under
    /// concurrent use the next `acquire` may see a different state.
    pub fn available_count(&self) -> usize {
        self.core.shelf.lock().idle.len()
    }

    /// Number of handles currently checked out.
    pub fn active_count(&self) -> usize {
        self.core.leases.len()
    }

    /// The capacity cap this pool was built with.
    pub fn max_size(&self) -> usize {
        self.core.max_size
    }

    /// Destroy every idle and delayed instance, leaving
    /// [`available_count`](Pool::available_count) at zero. Each removed
    /// instance is finalized exactly once; outstanding handles keep working.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// Replace the pre-acquire hook.
    ///
    /// Hooks are meant to be configured before the pool is shared across
    /// threads; swapping them mid-flight is safe but takes effect only for
    /// operations that start afterwards.
    pub fn set_pre_acquire<F>(&self, hook: F)
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.core.hooks.write().pre_acquire = Some(Arc::new(hook));
    }

    /// Replace the pre-return hook. See [`set_pre_acquire`](Pool::set_pre_acquire).
    pub fn set_pre_return<F>(&self, hook: F)
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.core.hooks.write().pre_return = Some(Arc::new(hook));
    }

    /// Replace the final-destroy hook. Handles already checked out keep the
    /// hook that was in place when they were acquired.
    pub fn set_final_destroy<F>(&self, hook: F)
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.core.hooks.write().final_destroy = Some(Arc::new(hook));
    }

    /// Get a metrics snapshot
    pub fn metrics(&self) -> PoolMetrics {
        let available = self.core.shelf.lock().idle.len();
        self.core.metrics.snapshot(
            self.core.leases.len(),
            available,
            self.core.delayed.len(),
            self.core.max_size,
        )
    }

    /// Export metrics as a HashMap
    pub fn export_metrics(&self) -> std::collections::HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&std::collections::HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }
}

impl<T: Send> Drop for Pool<T> {
    fn drop(&mut self) {
        // Stop and join the sweeper first so no sweep runs mid-teardown,
        // then drain: parked entries go through the release path, idle ones
        // are finalized.
        self.sweeper.take();
        self.core.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering::SeqCst;

    /// Test instance with a fabrication id so reuse can be told apart from
    /// refabrication.
    #[derive(Debug)]
    struct Widget {
        id: usize,
        payload: u32,
    }

    fn widget_pool(max: usize) -> (Pool<Widget>, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let ids = Arc::clone(&counter);
        let pool = Pool::new(
            move || Widget {
                id: ids.fetch_add(1, SeqCst),
                payload: 42,
            },
            PoolConfig::default().with_max_size(max),
        )
        .unwrap();
        (pool, counter)
    }

    #[test]
    fn acquire_fabricates_when_empty() {
        let (pool, fabricated) = widget_pool(4);
        let handle = pool.acquire().unwrap();
        assert_eq!(handle.payload, 42);
        assert_eq!(fabricated.load(SeqCst), 1);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.available_count(), 0);
    }

    #[test]
    fn release_then_acquire_reuses_most_recent() {
        let (pool, fabricated) = widget_pool(4);
        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();
        let (first_id, second_id) = (first.id, second.id);

        first.release();
        second.release();
        assert_eq!(pool.available_count(), 2);

        let again = pool.acquire().unwrap();
        assert_eq!(again.id, second_id, "LIFO should yield the last release");
        assert_eq!(fabricated.load(SeqCst), 2);

        let once_more = pool.acquire().unwrap();
        assert_eq!(once_more.id, first_id);
        assert_eq!(fabricated.load(SeqCst), 2);
    }

    #[test]
    fn exhausted_at_capacity() {
        let (pool, _) = widget_pool(2);
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();

        match pool.acquire() {
            Err(PoolError::Exhausted(cap)) => assert_eq!(cap, 2),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected exhaustion"),
        }
        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.metrics().exhausted_events, 2);
    }

    #[test]
    fn into_inner_frees_the_capacity_slot() {
        let (pool, fabricated) = widget_pool(1);
        let handle = pool.acquire().unwrap();
        let widget = handle.into_inner();
        assert_eq!(widget.payload, 42);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.available_count(), 0);

        // The slot is free again, so a new instance can be fabricated.
        let replacement = pool.acquire().unwrap();
        assert_eq!(replacement.id, 1);
        assert_eq!(fabricated.load(SeqCst), 2);
    }

    #[test]
    fn release_after_zero_is_immediate() {
        let (pool, _) = widget_pool(2);
        let handle = pool.acquire().unwrap();
        pool.release_after(handle, Duration::ZERO);
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.metrics().delayed_scheduled, 0);
    }

    #[test]
    fn delayed_release_parks_the_instance() {
        let (pool, _) = widget_pool(2);
        let handle = pool.acquire().unwrap();
        pool.release_after(handle, Duration::from_secs(60));

        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.active_count(), 0);
        let metrics = pool.metrics();
        assert_eq!(metrics.parked, 1);
        assert_eq!(metrics.delayed_scheduled, 1);
    }

    #[test]
    fn clear_finalizes_idle_and_parked_exactly_once() {
        let returned = Arc::new(AtomicUsize::new(0));
        let destroyed = Arc::new(AtomicUsize::new(0));
        let hooks = LifecycleHooks::new()
            .on_return({
                let returned = Arc::clone(&returned);
                move |_: &mut u32| {
                    returned.fetch_add(1, SeqCst);
                }
            })
            .on_destroy({
                let destroyed = Arc::clone(&destroyed);
                move |_: &mut u32| {
                    destroyed.fetch_add(1, SeqCst);
                }
            });
        let pool = Pool::with_hooks(|| 0u32, hooks, PoolConfig::default().with_max_size(5)).unwrap();

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let c = pool.acquire().unwrap();

        a.release(); // pre-return runs now
        pool.release_after(b, Duration::from_secs(60)); // pre-return deferred
        assert_eq!(returned.load(SeqCst), 1);

        pool.clear();
        assert_eq!(pool.available_count(), 0);
        // The parked instance got its pre-return during clear; the idle one
        // already had it at release time.
        assert_eq!(returned.load(SeqCst), 2);
        assert_eq!(destroyed.load(SeqCst), 2);

        // The outstanding handle is untouched and returns normally.
        c.release();
        assert_eq!(pool.available_count(), 1);
        assert_eq!(returned.load(SeqCst), 3);

        drop(pool);
        assert_eq!(destroyed.load(SeqCst), 3);
    }

    #[test]
    fn orphaned_handle_finalizes_with_snapshot_hook() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let hooks = LifecycleHooks::new().on_destroy({
            let destroyed = Arc::clone(&destroyed);
            move |_: &mut u32| {
                destroyed.fetch_add(1, SeqCst);
            }
        });
        let pool = Pool::with_hooks(|| 0u32, hooks, PoolConfig::default().with_max_size(2)).unwrap();

        let handle = pool.acquire().unwrap();
        drop(pool);
        assert_eq!(destroyed.load(SeqCst), 0, "checked-out instance survives teardown");

        drop(handle);
        assert_eq!(destroyed.load(SeqCst), 1);
    }

    #[test]
    fn teardown_finalizes_everything_left_behind() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let hooks = LifecycleHooks::new().on_destroy({
            let destroyed = Arc::clone(&destroyed);
            move |_: &mut u32| {
                destroyed.fetch_add(1, SeqCst);
            }
        });
        let pool = Pool::with_hooks(
            || 0u32,
            hooks,
            PoolConfig::default().with_initial_size(2).with_max_size(5),
        )
        .unwrap();

        let handle = pool.acquire().unwrap();
        pool.release_after(handle, Duration::from_secs(60));

        // One instance parked, one idle: both must be finalized at drop.
        drop(pool);
        assert_eq!(destroyed.load(SeqCst), 2);
    }

    #[test]
    fn initial_population_failure_propagates_and_cleans_up() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let hooks = LifecycleHooks::new().on_destroy({
            let destroyed = Arc::clone(&destroyed);
            move |_: &mut u32| {
                destroyed.fetch_add(1, SeqCst);
            }
        });

        let built = AtomicUsize::new(0);
        let result = Pool::try_new(
            move || {
                if built.fetch_add(1, SeqCst) < 2 {
                    Ok(0u32)
                } else {
                    Err(std::io::Error::other("fabrication failed"))
                }
            },
            hooks,
            PoolConfig::default().with_initial_size(5).with_max_size(5),
        );

        assert!(matches!(result, Err(PoolError::Factory(_))));
        // The two instances fabricated before the failure were finalized.
        assert_eq!(destroyed.load(SeqCst), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Pool::new(
            || 0u32,
            PoolConfig::default().with_initial_size(3).with_max_size(2),
        );
        assert!(matches!(result, Err(PoolError::Config(_))));
    }

    #[test]
    fn capacity_never_exceeded_under_contention() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let hooks = LifecycleHooks::new().on_destroy({
            let live = Arc::clone(&live);
            move |_: &mut u64| {
                live.fetch_sub(1, SeqCst);
            }
        });
        let pool = Pool::with_hooks(
            {
                let live = Arc::clone(&live);
                let peak = Arc::clone(&peak);
                move || {
                    let now = live.fetch_add(1, SeqCst) + 1;
                    peak.fetch_max(now, SeqCst);
                    0u64
                }
            },
            hooks,
            PoolConfig::default().with_max_size(3),
        )
        .unwrap();

        let pool = Arc::new(pool);
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        if let Some(mut handle) = pool.try_acquire() {
                            *handle += 1;
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(peak.load(SeqCst) <= 3, "peak {} exceeded cap", peak.load(SeqCst));

        drop(pool); // last Arc: teardown finalizes every idle instance
        assert_eq!(live.load(SeqCst), 0);
    }

    #[test]
    fn hook_setters_apply_to_later_operations() {
        let (pool, _) = widget_pool(2);
        pool.set_pre_acquire(|w: &mut Widget| w.payload += 1);

        let handle = pool.acquire().unwrap();
        assert_eq!(handle.payload, 43);
    }

    #[test]
    fn pool_and_handle_are_send() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Pool<Vec<u8>>>();
        assert_sync::<Pool<Vec<u8>>>();
        assert_send::<Handle<Vec<u8>>>();
    }

    #[test]
    fn metrics_track_churn() {
        let (pool, _) = widget_pool(3);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        a.release();
        b.release();
        let _c = pool.acquire().unwrap();

        let metrics = pool.metrics();
        assert_eq!(metrics.fabricated, 2);
        assert_eq!(metrics.reused, 1);
        assert_eq!(metrics.returned, 2);
        assert_eq!(metrics.active, 1);
        assert_eq!(metrics.available, 1);
    }
}
