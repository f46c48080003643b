//! Basic usage examples for repool

use repool::{Pool, PoolConfig};

fn main() {
    println!("=== repool - Basic Examples ===\n");

    // Example 1: Simple pool with buffers
    simple_pool();

    // Example 2: Pool with configuration
    configured_pool();

    // Example 3: Try methods and exhaustion
    try_methods();

    // Example 4: Metrics
    metrics();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = Pool::new(|| Vec::<u8>::with_capacity(1024), PoolConfig::default()).unwrap();

    {
        let mut buf = pool.acquire().unwrap();
        buf.extend_from_slice(b"hello");
        println!("   Got buffer with {} bytes", buf.len());
        // Buffer automatically returned when dropped
    }

    println!("   Available after return: {}\n", pool.available_count());
}

fn configured_pool() {
    println!("2. Configured Pool:");

    let config = PoolConfig::new().with_initial_size(3).with_max_size(10);
    let pool = Pool::new(|| String::with_capacity(64), config).unwrap();

    {
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        println!("   Active instances: {}", pool.active_count());
        println!("   Available instances: {}", pool.available_count());
    }

    println!("   After return - Available: {}\n", pool.available_count());
}

fn try_methods() {
    println!("3. Try Methods:");
    let pool = Pool::new(|| 42u32, PoolConfig::default().with_max_size(1)).unwrap();

    // Claim the only slot
    let first = pool.try_acquire();
    assert!(first.is_some());
    println!("   First try: Success");

    // Pool is at capacity while the instance is checked out
    let second = pool.try_acquire();
    assert!(second.is_none());
    println!("   Second try: None (pool exhausted)");

    drop(first); // Return instance

    let third = pool.try_acquire();
    assert!(third.is_some());
    println!("   Third try: Success\n");
}

fn metrics() {
    println!("4. Metrics:");
    let pool = Pool::new(|| vec![0u8; 256], PoolConfig::default().with_max_size(5)).unwrap();

    {
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
    }
    let _c = pool.acquire().unwrap();

    println!("\n   Snapshot:");
    for (key, value) in pool.export_metrics() {
        println!("     {}: {}", key, value);
    }
}
