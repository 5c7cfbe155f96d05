use std::sync::Arc;
use anyhow::Result;
use log::{trace, warn};
use crate::store::Store;
use crate::wire::Flow;

/// Turns decoded stream payloads into aggregated flows.
#[derive(Clone)]
pub struct Ingest {
    store: Arc<Store>,
}

impl Ingest {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Handles one event payload. A payload that is not a flow is logged
    /// and skipped; a store failure is returned to the caller.
    pub fn handle(&self, payload: String) -> Result<()> {
        let flow = match serde_json::from_str::<Flow>(&payload) {
            Ok(flow) => flow,
            Err(e)   => {
                warn!("invalid flow: {}", e);
                trace!("payload: {}", payload);
                return Ok(());
            }
        };

        self.store.add_flow(flow.into_record())?;

        Ok(())
    }
}
