pub mod args;
pub mod cache;
pub mod flow;
pub mod ingest;
pub mod query;
pub mod store;
pub mod watch;
pub mod wire;
