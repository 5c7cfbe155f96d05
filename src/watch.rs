use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, value_t};
use log::{debug, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use tokio::runtime::Runtime;
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;
use catcher::{connect, Error, HttpSource};
use crate::args::opt;
use crate::ingest::Ingest;
use crate::query::{FilterAttributes, FlowCache, QueryContext, SortAttributes, SortBy};
use crate::store::{data_dir, Config, Event, Store, FILE};

pub fn watch(args: &ArgMatches) -> Result<()> {
    let url      = value_t!(args, "url",      String)?;
    let window   = value_t!(args, "window",   u64)?;
    let interval = value_t!(args, "interval", u64)?;

    let config = Config {
        path:     data(args).join(FILE),
        window:   Duration::from_secs(window),
        interval: Duration::from_secs(interval),
    };

    let filter = FilterAttributes {
        action:    opt(args.value_of("filter-action"))?,
        port:      opt(args.value_of("filter-port"))?.unwrap_or(0),
        namespace: args.value_of("filter-namespace").unwrap_or_default().to_owned(),
        name:      args.value_of("filter-name").unwrap_or_default().to_owned(),
        label:     args.value_of("filter-label").unwrap_or_default().to_owned(),
        start:     opt(args.value_of("filter-start"))?,
        end:       opt(args.value_of("filter-end"))?,
    };

    let sort = SortAttributes {
        totals: sort_by(args, "sort-totals", "order-totals")?,
        rates:  sort_by(args, "sort-rates",  "order-rates")?,
    };

    let store   = Arc::new(Store::open(config)?);
    let context = Arc::new(QueryContext::new(filter, sort));
    let cache   = Arc::new(FlowCache::new(store.clone(), context));
    let source  = HttpSource::new(&url)?;
    let ingest  = Ingest::new(store.clone());
    let cancel  = CancellationToken::new();

    let mut signals = Signals::new(&[SIGINT, SIGTERM, SIGUSR1])?;
    let handle = signals.handle();
    let dump   = cache.dump();
    let token  = cancel.clone();

    let thread = thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGINT | SIGTERM => break,
                SIGUSR1          => dump.store(true, Ordering::SeqCst),
                _                => unreachable!(),
            }
        }
        token.cancel();
    });

    info!("watching {}", url);

    let rt     = Runtime::new()?;
    let result = rt.block_on(async {
        tokio::try_join!(
            store.clone().run(cancel.clone()),
            cache.clone().run(cancel.clone()),
            status(store.clone(), cancel.clone()),
            stream(&source, ingest, cancel.clone()),
        )
    });

    cancel.cancel();
    handle.close();
    drop(rt);

    let joined = thread.join().map_err(|_| anyhow!("signal thread panicked"));

    finish(&store, result.map(drop).and(joined))?;

    info!("stopped watching {}", url);

    Ok(())
}

pub fn clear(args: &ArgMatches) -> Result<()> {
    let path = data(args).join(FILE);
    Store::clear(&path)?;
    info!("cleared {}", path.display());
    Ok(())
}

async fn stream(source: &HttpSource, ingest: Ingest, cancel: CancellationToken) -> Result<()> {
    while !cancel.is_cancelled() {
        let handler = |payload| ingest.handle(payload);

        match connect(source, handler, None, cancel.clone()).await {
            Ok(())                 => debug!("stream {} closed", source.url()),
            Err(Error::Handler(e)) => return Err(e),
            Err(e)                 => warn!("stream {} error: {}", source.url(), e),
        }

        tokio::select! {
            _ = cancel.cancelled()            => break,
            _ = sleep(Duration::from_secs(1)) => (),
        }
    }

    Ok(())
}

async fn status(store: Arc<Store>, cancel: CancellationToken) -> Result<()> {
    let rates = store.notify().subscribe(Event::RatesUpdated);
    let mut timer = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick()       => {
                if rates.try_recv().is_ok() {
                    let (sums, flows) = store.len()?;
                    info!("{} summaries, {} flows", sums, flows);
                }
            }
        }
    }

    Ok(())
}

/// Checkpoints the store even when a task failed, then reports the
/// first error.
fn finish(store: &Store, result: Result<()>) -> Result<()> {
    let closed = store.close();
    result?;
    closed
}

fn sort_by(args: &ArgMatches, field: &str, order: &str) -> Result<SortBy> {
    let field = value_t!(args, field, String)?;
    let asc   = args.value_of(order) == Some("asc");
    SortBy::parse(&field, asc)
}

fn data(args: &ArgMatches) -> PathBuf {
    args.value_of("data").map(PathBuf::from).unwrap_or_else(data_dir)
}

#[cfg(test)]
mod test {
    use std::fs;
    use anyhow::{anyhow, Result};
    use tempfile::tempdir;
    use crate::flow::Reporter;
    use crate::flow::test::record;
    use crate::store::{Config, Store};
    use super::finish;

    #[test]
    fn failed_task_still_checkpoints() -> Result<()> {
        let dir   = tempdir()?;
        let path  = dir.path().join("flows.db");
        let wal   = dir.path().join("flows.db-wal");
        let store = Store::open(Config { path, ..Default::default() })?;

        store.add_flow(record(Reporter::Src, 1, 1))?;
        assert!(fs::metadata(&wal)?.len() > 0);

        let err = finish(&store, Err(anyhow!("task failed")));
        assert_eq!("task failed", err.unwrap_err().to_string());
        assert_eq!(0, fs::metadata(&wal)?.len());

        Ok(())
    }
}
