mod client;
mod codec;
mod error;
mod source;

pub use client::connect;
pub use codec::EventCodec;
pub use error::Error;
pub use source::{HttpSource, Source, Stream};

#[cfg(test)]
mod test;
