//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics snapshot for a pool
///
/// # Examples
///
/// ```
/// use repool::{Pool, PoolConfig};
///
/// let pool = Pool::new(|| 7u32, PoolConfig::default()).unwrap();
///
/// {
///     let _obj = pool.acquire().unwrap();
///     let metrics = pool.metrics();
///     assert_eq!(metrics.fabricated, 1);
///     assert_eq!(metrics.active, 1);
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Instances built by the factory over the pool's lifetime
    pub fabricated: usize,

    /// Acquisitions satisfied from the free list
    pub reused: usize,

    /// Instances returned through the immediate-release path
    pub returned: usize,

    /// Instances finalized (final-destroy hook run, instance dropped)
    pub destroyed: usize,

    /// Acquisitions refused because the pool was at capacity
    pub exhausted_events: usize,

    /// Releases parked in the delayed-reclaim queue
    pub delayed_scheduled: usize,

    /// Instances the background sweeper moved back to the free list
    pub sweep_reclaimed: usize,

    /// Handles currently checked out
    pub active: usize,

    /// Instances currently idle on the free list
    pub available: usize,

    /// Instances currently parked in the delayed-reclaim queue
    pub parked: usize,

    /// Capacity cap
    pub max_size: usize,

    /// Checked-out share of capacity (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("fabricated".to_string(), self.fabricated.to_string());
        metrics.insert("reused".to_string(), self.reused.to_string());
        metrics.insert("returned".to_string(), self.returned.to_string());
        metrics.insert("destroyed".to_string(), self.destroyed.to_string());
        metrics.insert("exhausted_events".to_string(), self.exhausted_events.to_string());
        metrics.insert("delayed_scheduled".to_string(), self.delayed_scheduled.to_string());
        metrics.insert("sweep_reclaimed".to_string(), self.sweep_reclaimed.to_string());
        metrics.insert("active".to_string(), self.active.to_string());
        metrics.insert("available".to_string(), self.available.to_string());
        metrics.insert("parked".to_string(), self.parked.to_string());
        metrics.insert("max_size".to_string(), self.max_size.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use repool::{Pool, PoolConfig};
    /// use std::collections::HashMap;
    ///
    /// let pool = Pool::new(|| 7u32, PoolConfig::default()).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags));
    /// assert!(output.contains("repool_instances_active"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP repool_instances_active Handles currently checked out\n");
        output.push_str("# TYPE repool_instances_active gauge\n");
        output.push_str(&format!("repool_instances_active{{{}}} {}\n", labels, metrics.active));

        output.push_str("# HELP repool_instances_available Instances idle on the free list\n");
        output.push_str("# TYPE repool_instances_available gauge\n");
        output.push_str(&format!("repool_instances_available{{{}}} {}\n", labels, metrics.available));

        output.push_str("# HELP repool_instances_parked Instances awaiting delayed reclaim\n");
        output.push_str("# TYPE repool_instances_parked gauge\n");
        output.push_str(&format!("repool_instances_parked{{{}}} {}\n", labels, metrics.parked));

        output.push_str("# HELP repool_utilization Checked-out share of capacity\n");
        output.push_str("# TYPE repool_utilization gauge\n");
        output.push_str(&format!("repool_utilization{{{}}} {:.2}\n", labels, metrics.utilization));

        // Counter metrics
        output.push_str("# HELP repool_instances_fabricated_total Instances built by the factory\n");
        output.push_str("# TYPE repool_instances_fabricated_total counter\n");
        output.push_str(&format!("repool_instances_fabricated_total{{{}}} {}\n", labels, metrics.fabricated));

        output.push_str("# HELP repool_instances_reused_total Acquisitions served from the free list\n");
        output.push_str("# TYPE repool_instances_reused_total counter\n");
        output.push_str(&format!("repool_instances_reused_total{{{}}} {}\n", labels, metrics.reused));

        output.push_str("# HELP repool_instances_returned_total Instances returned to the pool\n");
        output.push_str("# TYPE repool_instances_returned_total counter\n");
        output.push_str(&format!("repool_instances_returned_total{{{}}} {}\n", labels, metrics.returned));

        output.push_str("# HELP repool_instances_destroyed_total Instances finalized\n");
        output.push_str("# TYPE repool_instances_destroyed_total counter\n");
        output.push_str(&format!("repool_instances_destroyed_total{{{}}} {}\n", labels, metrics.destroyed));

        output.push_str("# HELP repool_events_exhausted_total Acquisitions refused at capacity\n");
        output.push_str("# TYPE repool_events_exhausted_total counter\n");
        output.push_str(&format!("repool_events_exhausted_total{{{}}} {}\n", labels, metrics.exhausted_events));

        output.push_str("# HELP repool_delayed_scheduled_total Releases parked for delayed reclaim\n");
        output.push_str("# TYPE repool_delayed_scheduled_total counter\n");
        output.push_str(&format!("repool_delayed_scheduled_total{{{}}} {}\n", labels, metrics.delayed_scheduled));

        output.push_str("# HELP repool_sweep_reclaimed_total Instances reclaimed by the sweeper\n");
        output.push_str("# TYPE repool_sweep_reclaimed_total counter\n");
        output.push_str(&format!("repool_sweep_reclaimed_total{{{}}} {}\n", labels, metrics.sweep_reclaimed));

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
pub(crate) struct MetricsTracker {
    pub fabricated: AtomicUsize,
    pub reused: AtomicUsize,
    pub returned: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub exhausted_events: AtomicUsize,
    pub delayed_scheduled: AtomicUsize,
    pub sweep_reclaimed: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            fabricated: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            exhausted_events: AtomicUsize::new(0),
            delayed_scheduled: AtomicUsize::new(0),
            sweep_reclaimed: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(
        &self,
        active: usize,
        available: usize,
        parked: usize,
        max_size: usize,
    ) -> PoolMetrics {
        let utilization = if max_size > 0 {
            active as f64 / max_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            fabricated: self.fabricated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            exhausted_events: self.exhausted_events.load(Ordering::Relaxed),
            delayed_scheduled: self.delayed_scheduled.load(Ordering::Relaxed),
            sweep_reclaimed: self.sweep_reclaimed.load(Ordering::Relaxed),
            active,
            available,
            parked,
            max_size,
            utilization,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_computes_utilization() {
        let tracker = MetricsTracker::new();
        tracker.fabricated.store(5, Ordering::Relaxed);

        let metrics = tracker.snapshot(2, 3, 0, 8);
        assert_eq!(metrics.fabricated, 5);
        assert_eq!(metrics.active, 2);
        assert_eq!(metrics.available, 3);
        assert!((metrics.utilization - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn export_covers_every_counter() {
        let metrics = MetricsTracker::new().snapshot(0, 0, 0, 4);
        let map = metrics.export();
        assert_eq!(map.get("max_size"), Some(&"4".to_string()));
        assert!(map.contains_key("sweep_reclaimed"));
        assert!(map.contains_key("utilization"));
    }

    #[test]
    fn prometheus_format_carries_labels() {
        let metrics = MetricsTracker::new().snapshot(1, 2, 1, 4);
        let output = MetricsExporter::export_prometheus(&metrics, "widgets", None);
        assert!(output.contains("repool_instances_active{pool=\"widgets\"} 1"));
        assert!(output.contains("# TYPE repool_instances_fabricated_total counter"));
    }
}
