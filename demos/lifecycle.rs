//! Lifecycle hooks and delayed release

use std::thread;
use std::time::Duration;

use repool::{LifecycleHooks, Pool, PoolConfig};

fn main() {
    println!("=== repool - Lifecycle Examples ===\n");

    hooks();
    delayed_release();
    clearing();
}

fn hooks() {
    println!("1. Lifecycle Hooks:");

    let hooks = LifecycleHooks::new()
        .on_acquire(|buf: &mut Vec<u8>| println!("   pre-acquire: {} bytes ready", buf.capacity()))
        .on_return(|buf: &mut Vec<u8>| {
            println!("   pre-return: clearing {} bytes", buf.len());
            buf.clear();
        })
        .on_destroy(|buf: &mut Vec<u8>| println!("   final-destroy: dropping {} bytes", buf.capacity()));

    let pool = Pool::with_hooks(
        || Vec::with_capacity(1024),
        hooks,
        PoolConfig::default().with_max_size(4),
    )
    .unwrap();

    {
        let mut buf = pool.acquire().unwrap();
        buf.extend_from_slice(b"scratch data");
    }

    pool.clear();
    println!();
}

fn delayed_release() {
    println!("2. Delayed Release:");

    let config = PoolConfig::new()
        .with_max_size(4)
        .with_sweep_interval(Duration::from_millis(20));
    let pool = Pool::new(|| String::from("conn"), config).unwrap();

    let handle = pool.acquire().unwrap();
    pool.release_after(handle, Duration::from_millis(200));
    println!("   Just after release: available = {}", pool.available_count());

    thread::sleep(Duration::from_millis(400));
    println!("   After the delay:   available = {}\n", pool.available_count());
}

fn clearing() {
    println!("3. Clearing:");

    let pool = Pool::new(
        || vec![0u8; 512],
        PoolConfig::default().with_initial_size(4).with_max_size(8),
    )
    .unwrap();

    println!("   Before clear: available = {}", pool.available_count());
    pool.clear();
    println!("   After clear:  available = {}", pool.available_count());
}
