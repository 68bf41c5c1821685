//! Integration tests for the attribute interning registry
//!
//! Covers case-insensitive interning, range-qualifier normalization and its
//! diagnostic, dense handle allocation, non-mutating lookups and the
//! concurrent first-intern race.

use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use trustgraph::attribute::{Attribute, AttributeRegistry};

/// Shared buffer collecting formatted tracing output
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Run `f` with debug-level tracing captured into a string
fn with_captured_logs<F: FnOnce()>(f: F) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.contents()
}

#[test]
fn test_intern_idempotent_across_case() {
    let registry = AttributeRegistry::new();
    let spellings = ["userAccountControl", "USERACCOUNTCONTROL", "useraccountcontrol"];

    let handles: Vec<Attribute> = spellings.iter().map(|s| registry.intern(s)).collect();

    assert!(handles.iter().all(|h| *h == handles[0]));
    assert_eq!(registry.popularity(handles[0]), 3);
    assert_eq!(registry.display(handles[0]), "userAccountControl");
}

#[test]
fn test_member_range_is_silent() {
    let registry = AttributeRegistry::new();
    let logs = with_captured_logs(|| {
        assert_eq!(
            registry.intern("member;range=0-4999"),
            registry.intern("member")
        );
    });

    assert!(!logs.contains("Incomplete data"), "unexpected log: {}", logs);
}

#[test]
fn test_other_qualifier_emits_diagnostic() {
    let registry = AttributeRegistry::new();
    let logs = with_captured_logs(|| {
        assert_eq!(
            registry.intern("proxyAddresses;range=0-9"),
            registry.intern("proxyAddresses")
        );
    });

    assert!(logs.contains("Incomplete data detected in attribute proxyAddresses;range=0-9"));
    assert!(logs.contains("DEBUG"));
}

#[test]
fn test_density_after_many_names() {
    let registry = AttributeRegistry::new();
    let names: Vec<String> = (0..500).map(|i| format!("attr{}", i)).collect();

    // Intern each twice with different casing
    for name in &names {
        registry.intern(name);
        registry.intern(&name.to_uppercase());
    }

    let indices: HashSet<usize> = names.iter().map(|n| registry.lookup(n).index()).collect();
    assert_eq!(indices.len(), names.len());
    assert_eq!(indices, (0..names.len()).collect::<HashSet<_>>());
    assert_eq!(registry.len(), names.len());
}

#[test]
fn test_lookup_unknown_leaves_counters() {
    let registry = AttributeRegistry::new();
    let description = registry.intern("description");
    registry.add_size(description, 64);

    let popularity_before = registry.rank_by_popularity();
    let sizes_before = registry.rank_by_size();

    assert_eq!(registry.lookup("neverSeen"), Attribute::NON_EXISTING);
    assert_eq!(registry.lookup("neverSeen;range=0-1"), Attribute::NON_EXISTING);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.rank_by_popularity(), popularity_before);
    assert_eq!(registry.rank_by_size(), sizes_before);
}

#[test]
fn test_concurrent_race_single_handle() {
    const THREADS: usize = 32;

    let registry = Arc::new(AttributeRegistry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.intern("nTSecurityDescriptor")
            })
        })
        .collect();

    let results: Vec<Attribute> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().all(|a| *a == results[0]));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.popularity(results[0]), THREADS as u64);
}

#[test]
fn test_concurrent_mixed_names_stay_dense() {
    const THREADS: usize = 8;
    const NAMES: usize = 200;

    let registry = Arc::new(AttributeRegistry::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                // Each thread walks the names in a different order
                (0..NAMES)
                    .map(|i| {
                        let n = (i * (t + 1)) % NAMES;
                        (n, registry.intern(&format!("Name{}", n)))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut by_name = vec![None; NAMES];
    for handle in handles {
        for (n, attribute) in handle.join().unwrap() {
            match by_name[n] {
                None => by_name[n] = Some(attribute),
                Some(existing) => assert_eq!(existing, attribute),
            }
        }
    }

    let seen: HashSet<usize> = by_name.iter().flatten().map(|a| a.index()).collect();
    assert_eq!(registry.len(), seen.len());
    assert_eq!(seen, (0..registry.len()).collect::<HashSet<_>>());

    // Every intern call counted exactly once
    let total: u64 = registry.rank_by_popularity().iter().map(|r| r.count).sum();
    assert_eq!(total, (THREADS * NAMES) as u64);
}

#[test]
fn test_concurrent_size_accounting() {
    let registry = Arc::new(AttributeRegistry::new());
    let sd = registry.intern("nTSecurityDescriptor");

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    registry.add_size(sd, 3);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.size(sd), 3000);
}

#[test]
fn test_meta_detection() {
    let registry = AttributeRegistry::new();
    let cases = [
        ("_accountdisabled", true),
        ("_hasspn", true),
        ("description", false),
        ("objectClass", false),
    ];
    for (name, meta) in cases {
        assert_eq!(registry.is_meta(registry.intern(name)), meta, "{}", name);
    }
}

#[test]
fn test_log_statistics_dumps_both_rankings() {
    let registry = AttributeRegistry::new();
    let member = registry.intern("member");
    registry.intern("member");
    let sd = registry.intern("nTSecurityDescriptor");
    registry.add_size(sd, 4096);
    registry.add_size(member, 12);

    let logs = with_captured_logs(|| registry.log_statistics());

    let popularity = logs
        .find("attribute popularity ranking")
        .expect("popularity header");
    let size = logs.find("attribute size ranking").expect("size header");
    assert!(popularity < size);

    let (hits, bytes) = logs.split_at(size);
    assert!(hits.contains("member has 2 hits"), "{}", logs);
    assert!(hits.contains("nTSecurityDescriptor has 1 hits"), "{}", logs);
    assert!(bytes.contains("nTSecurityDescriptor has used 4096 bytes"), "{}", logs);
    assert!(bytes.contains("member has used 12 bytes"), "{}", logs);
    assert!(
        hits.find("member has 2 hits") < hits.find("nTSecurityDescriptor has 1 hits"),
        "popularity not ranked: {}",
        logs
    );
}
