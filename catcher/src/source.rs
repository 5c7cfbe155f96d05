use std::io;
use std::pin::Pin;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::ACCEPT;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use crate::Error;

pub type Stream = Pin<Box<dyn AsyncRead + Send>>;

/// A reliable byte pipe carrying a push stream. Opening it is a single
/// connection attempt; a non-success status is an error.
#[async_trait]
pub trait Source: Send + Sync {
    async fn open(&self) -> Result<Stream, Error>;
}

pub struct HttpSource {
    client: reqwest::Client,
    url:    String,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url:    url.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn open(&self) -> Result<Stream, Error> {
        let request  = self.client.get(&self.url).header(ACCEPT, "text/event-stream");
        let response = request.send().await?;
        let status   = response.status();

        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.bytes_stream().map_err(|e| {
            io::Error::new(io::ErrorKind::Other, e)
        });

        Ok(Box::pin(StreamReader::new(body)))
    }
}
