use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use anyhow::Result;
use log::debug;
use tokio::task::spawn_blocking;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use crate::cache::Cache;
use crate::flow::{FlowRecord, FlowSummary};
use crate::store::Store;
use super::QueryContext;

pub const TOTALS:  &str     = "flowSumTotals";
pub const RATES:   &str     = "flowSumRates";
pub const REFRESH: Duration = Duration::from_secs(2);

type Projection = Arc<Vec<FlowSummary>>;

/// Periodically materialized, filtered and sorted views of the flow
/// summaries.
pub struct FlowCache {
    store:   Arc<Store>,
    context: Arc<QueryContext>,
    cache:   Arc<Cache<&'static str, Projection>>,
    dump:    Arc<AtomicBool>,
}

impl FlowCache {
    pub fn new(store: Arc<Store>, context: Arc<QueryContext>) -> Self {
        Self {
            store:   store,
            context: context,
            cache:   Arc::new(Cache::new()),
            dump:    Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rebuilds both projections from the store.
    pub fn refresh(&self) -> Result<()> {
        let filter = self.context.filter();
        let sort   = self.context.sort();

        let mut totals = self.store.get_flow_sums(&filter)?;
        let mut rates  = totals.clone();

        sort.totals.sort(&mut totals);
        sort.rates.sort(&mut rates);

        if self.dump.swap(false, Ordering::SeqCst) {
            debug!("flow totals sorted by {}:", sort.totals.field);
            for sum in &totals {
                debug!("  {:?}", sum);
            }
        }

        self.cache.set(TOTALS, Arc::new(totals));
        self.cache.set(RATES, Arc::new(rates));

        Ok(())
    }

    pub fn get_flow_sum_totals(&self) -> Projection {
        self.cache.get(&TOTALS).unwrap_or_default()
    }

    pub fn get_flow_sum_rates(&self) -> Projection {
        self.cache.get(&RATES).unwrap_or_default()
    }

    /// Records behind summary `id`, read straight from the store.
    pub fn get_flows_by_sum_id(&self, id: i64) -> Result<Vec<FlowRecord>> {
        self.store.get_flows_by_sum_id(id, &self.context.filter())
    }

    pub fn context(&self) -> &Arc<QueryContext> {
        &self.context
    }

    /// Flag that requests the next refresh log its totals.
    pub fn dump(&self) -> Arc<AtomicBool> {
        self.dump.clone()
    }

    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        let sweep = tokio::spawn(self.cache.clone().sweep(cancel.clone()));

        let mut timer = interval(REFRESH);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick()       => {
                    let cache = self.clone();
                    spawn_blocking(move || cache.refresh()).await??;
                }
            }
        }

        sweep.await?;

        debug!("flow cache finished");

        Ok(())
    }
}
