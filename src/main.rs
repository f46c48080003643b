// This is just a binary wrapper - the actual library is in lib.rs
// Run the demos with: cargo run --example basic

use repool::{Pool, PoolConfig};

fn main() {
    println!("=== repool ===");
    println!("See demos/ for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let pool = Pool::new(
        || String::with_capacity(64),
        PoolConfig::default().with_initial_size(2).with_max_size(4),
    )
    .unwrap();

    {
        let mut s = pool.acquire().unwrap();
        s.push_str("recycled");
        println!("  Got instance: {:?}", *s);
    }

    println!("  Available after return: {}", pool.available_count());
}
