//! Result Cache Integration Tests
//!
//! Ordering and bound properties over longer sequences of writes.

use std::path::{Path, PathBuf};

use lintview::ResultCache;
use lintview_diagnostics::DiagnosticRecord;
use tempfile::TempDir;

fn record(line: u32) -> DiagnosticRecord {
    DiagnosticRecord::new("/proj/foo.py", line, "bad style", "C1")
}

fn target(i: usize) -> PathBuf {
    PathBuf::from(format!("/proj/mod_{}.py", i % 7))
}

#[test]
fn test_bounds_hold_for_every_write() {
    let dir = TempDir::new().unwrap();
    let mut cache = ResultCache::new(dir.path().join("results.json"), 4);

    for i in 0..50 {
        cache.set(&target(i * 3), vec![record(i as u32)]).unwrap();

        let targets = cache.targets();
        assert!(targets.len() <= 4);
        let mut unique = targets.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), targets.len());
        assert_eq!(targets[0], target(i * 3));
    }
}

#[test]
fn test_recency_order_matches_write_order() {
    let dir = TempDir::new().unwrap();
    let mut cache = ResultCache::new(dir.path().join("results.json"), 3);

    let writes = ["/a.py", "/b.py", "/a.py", "/c.py", "/d.py", "/b.py"];
    for path in writes {
        cache.set(Path::new(path), vec![]).unwrap();
    }

    assert_eq!(
        cache.targets(),
        vec![
            PathBuf::from("/b.py"),
            PathBuf::from("/d.py"),
            PathBuf::from("/c.py"),
        ]
    );
}

#[test]
fn test_second_write_replaces_first() {
    let dir = TempDir::new().unwrap();
    let mut cache = ResultCache::new(dir.path().join("results.json"), 10);

    cache.set(Path::new("/proj/foo.py"), vec![record(1)]).unwrap();
    cache.set(Path::new("/proj/bar.py"), vec![]).unwrap();
    cache.set(Path::new("/proj/foo.py"), vec![record(2), record(3)]).unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.targets()[0], PathBuf::from("/proj/foo.py"));
    assert_eq!(
        cache.get(Path::new("/proj/foo.py")).unwrap(),
        Some(vec![record(2), record(3)])
    );
}

#[test]
fn test_smaller_limit_on_reload_truncates_oldest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.json");
    {
        let mut cache = ResultCache::new(&path, 5);
        for i in 0..5 {
            cache.set(&target(i), vec![]).unwrap();
        }
    }

    let mut cache = ResultCache::new(&path, 2);
    assert_eq!(cache.targets(), vec![target(4), target(3)]);
}

#[test]
fn test_prune_keeps_survivor_order() {
    let dir = TempDir::new().unwrap();
    let mut cache = ResultCache::new(dir.path().join("results.json"), 10);
    for i in 0..6 {
        cache.set(&target(i), vec![]).unwrap();
    }

    let removed = cache
        .prune_obsolete(|path| {
            let name = path.file_name().unwrap().to_string_lossy();
            !name.ends_with("1.py") && !name.ends_with("4.py")
        })
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(cache.targets(), vec![target(5), target(3), target(2), target(0)]);
}
