//! Basic usage examples for radixkv.
//!
//! Run with `RUST_LOG=radix_rs=trace` to see node splits and merges.

use radix_rs::RadixTree;
use radixkv::{Config, RadixKV};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_radixkv();
    example_radix_tree();
}

fn example_radixkv() {
    println!("=== RadixKV (Thread-Safe Wrapper) ===\n");

    let kv = RadixKV::with_config(Config {
        auto_compact: true,
        compaction_threshold: 4,
        ..Config::default()
    });

    // Insert data
    kv.insert(b"user:1001", 1001);
    kv.insert(b"user:1002", 1002);
    kv.insert(b"user:1003", 1003);
    kv.insert(b"post:1001", 1);

    // Lookups
    println!("user:1001 = {:?}", kv.get(b"user:1001"));
    println!("user:9999 = {:?}", kv.get(b"user:9999"));
    println!("Contains user:1002: {}", kv.contains(b"user:1002"));
    println!("Count: {}\n", kv.len());

    // Prefix scan
    println!("Prefix scan for 'user:':");
    for (key, value) in kv.prefix(b"user:") {
        println!("  {} = {}", String::from_utf8_lossy(&key), value);
    }

    let removed = kv.remove_prefix(b"user:");
    let stats = kv.memory_usage();
    println!("\nRemoved {removed} users");
    println!("Keys: {}", stats.num_keys);
    println!("Nodes: {}", stats.node_count);
    println!("Free slots: {}", stats.free_slots);
    println!("Bytes per key: {:.1}\n", stats.bytes_per_key);
}

fn example_radix_tree() {
    println!("=== RadixTree (Routing Table) ===\n");

    let mut routes: RadixTree<&str> = RadixTree::new();
    routes.insert(b"/", "index");
    routes.insert(b"/api", "api");
    routes.insert(b"/api/v1", "api-v1");
    routes.insert(b"/api/v1/users", "users");
    routes.insert(b"/static", "assets");

    for path in ["/api/v1/users/42", "/api/v2", "/static/app.js", "/about"] {
        match routes.longest_prefix(path.as_bytes()) {
            Some((route, handler)) => println!(
                "{path} -> {handler} (via {})",
                String::from_utf8_lossy(route)
            ),
            None => println!("{path} -> no route"),
        }
    }

    println!("\nMatching routes along /api/v1/users/42:");
    routes.walk_path(b"/api/v1/users/42", |route, handler| {
        println!("  {} = {}", String::from_utf8_lossy(route), handler);
        false
    });

    // Drop every versioned route while walking.
    routes.walk_prefix_mut(b"/api/v", |entry| {
        println!("  removing {}", String::from_utf8_lossy(entry.key()));
        entry.delete();
        false
    });

    println!("\nTree after pruning:\n{}", routes.dump());
}
