//! Zone store under concurrent writers

mod common;

use common::identity;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use zonemesh::common::{NodeSettings, QualifiedName};
use zonemesh::node::ZoneStore;

fn open_store(dir: &std::path::Path) -> Arc<ZoneStore> {
    let settings = NodeSettings {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    };
    Arc::new(ZoneStore::open(identity("DNS2", 9002), 1, 3, &settings).unwrap())
}

#[test]
fn test_concurrent_creates_on_one_domain() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let name = QualifiedName::new(format!("h{}x{}", t, i), "example.com");
                    store.create(&name, &format!("10.{}.0.{}", t, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snap = store.snapshot("example.com").unwrap();
    assert_eq!(snap.clock.as_slice(), &[0, 200, 0]);
    assert_eq!(snap.line_count, 200);
    assert_eq!(snap.name_to_line.len(), 200);

    let lines: HashSet<usize> = snap.name_to_line.values().copied().collect();
    assert_eq!(lines, (1..=200).collect::<HashSet<usize>>());

    let zone = fs::read_to_string(&snap.zone_path).unwrap();
    assert_eq!(zone.lines().count(), 200);
    assert!(!zone.ends_with('\n'));
    for (name, line) in &snap.name_to_line {
        let text = zone.lines().nth(line - 1).unwrap();
        assert!(text.starts_with(&format!("{}.example.com IN A ", name)));
    }

    let log = fs::read_to_string(&snap.log_path).unwrap();
    assert_eq!(log.lines().filter(|l| l.starts_with("create ")).count(), 200);
}

#[test]
fn test_domains_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let handles: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|domain| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let name = QualifiedName::new(format!("n{}", i), domain);
                    store.create(&name, "10.0.0.1").unwrap();
                }
                store.delete(&QualifiedName::new("n0", domain)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.domains(), vec!["alpha", "beta", "gamma"]);
    for domain in ["alpha", "beta", "gamma"] {
        let snap = store.snapshot(domain).unwrap();
        assert_eq!(snap.clock.as_slice(), &[0, 11, 0]);
        assert_eq!(snap.free_lines, vec![1]);
        assert_eq!(
            snap.zone_path,
            dir.path().join("zones").join(format!("DNS2_{}.zf", domain))
        );
        assert_eq!(
            snap.log_path,
            dir.path().join("logs").join(format!("DNS2_{}.log", domain))
        );
    }
}
