pub use config::{data_dir, Config, FILE};
pub use notify::{Event, Notify};
pub use rates::RateCalc;
pub use store::Store;

mod config;
mod notify;
mod rates;
mod schema;
mod store;
