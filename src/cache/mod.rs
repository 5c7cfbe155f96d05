pub use ttl::{Cache, Expiry, SWEEP};

mod ttl;

#[cfg(test)]
mod test;
