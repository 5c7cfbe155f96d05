use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use tempfile::{tempdir, TempDir};
use flowscope::ingest::Ingest;
use flowscope::query::{FlowCache, QueryContext};
use flowscope::store::{Config, Store};

fn payload(reporter: &str, packets: u64, bytes: u64) -> String {
    format!(r#"{{
        "start_time": "2024-05-01T10:00:00Z",
        "end_time": "2024-05-01T10:00:15Z",
        "action": "Allow",
        "source_name": "web-7d9f",
        "source_namespace": "shop",
        "source_labels": "app=web",
        "dest_name": "db-0",
        "dest_namespace": "data",
        "dest_labels": {{"app": "db"}},
        "protocol": "TCP",
        "dest_port": 5432,
        "reporter": "{}",
        "packets_in": {},
        "packets_out": 0,
        "bytes_in": {},
        "bytes_out": 0
    }}"#, reporter, packets, bytes)
}

fn open() -> Result<(TempDir, Arc<Store>)> {
    let dir   = tempdir()?;
    let store = Store::open(Config {
        path:     dir.path().join("flows.db"),
        window:   Duration::from_secs(60),
        interval: Duration::from_secs(5),
    })?;
    Ok((dir, Arc::new(store)))
}

#[test]
fn ingest_to_projection() -> Result<()> {
    let (_dir, store) = open()?;
    let ingest = Ingest::new(store.clone());
    let cache  = FlowCache::new(store.clone(), Arc::new(QueryContext::default()));

    assert!(cache.get_flow_sum_totals().is_empty());

    ingest.handle(payload("Src", 10, 1000))?;
    ingest.handle(payload("Dst", 20, 2000))?;
    ingest.handle("not json".to_owned())?;

    cache.refresh()?;

    let totals = cache.get_flow_sum_totals();
    assert_eq!(1, totals.len());

    let sum = &totals[0];
    assert_eq!("shop|web-7d9f|data|db-0|TCP|5432", sum.key);
    assert_eq!(10,   sum.src_stats.packets_in);
    assert_eq!(1000, sum.src_stats.bytes_in);
    assert_eq!(20,   sum.dst_stats.packets_in);
    assert_eq!(2000, sum.dst_stats.bytes_in);
    assert_eq!("app=db", sum.dst.labels);

    assert_eq!(2, cache.get_flows_by_sum_id(sum.id)?.len());
    assert_eq!((1, 2), store.len()?);

    Ok(())
}

#[test]
#[should_panic(expected = "unknown reporter")]
fn unknown_reporter_panics() {
    let (_dir, store) = open().unwrap();
    let ingest = Ingest::new(store);
    let _ = ingest.handle(payload("Both", 1, 1));
}
