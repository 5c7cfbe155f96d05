pub use record::{Action, Endpoint, FlowRecord, PolicyHit, PolicyTrace, Reporter};
pub use summary::{Counters, FlowSummary, Rate};

mod record;
mod summary;
