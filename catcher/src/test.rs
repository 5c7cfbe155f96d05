use std::io::Cursor;
use std::sync::Mutex;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
use tokio::sync::oneshot;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use crate::{connect, Error, EventCodec, Source, Stream};

struct Static(&'static str);

#[async_trait]
impl Source for Static {
    async fn open(&self) -> Result<Stream, Error> {
        Ok(Box::pin(Cursor::new(self.0.as_bytes().to_vec())))
    }
}

struct Status(u16);

#[async_trait]
impl Source for Status {
    async fn open(&self) -> Result<Stream, Error> {
        Err(Error::Status(self.0))
    }
}

struct Pipe(Mutex<Option<DuplexStream>>);

#[async_trait]
impl Source for Pipe {
    async fn open(&self) -> Result<Stream, Error> {
        match self.0.lock().unwrap().take() {
            Some(rx) => Ok(Box::pin(rx)),
            None     => Err(Error::Connect("pipe already open".to_owned())),
        }
    }
}

fn decode_all(input: &str) -> Result<Vec<String>> {
    let mut codec  = EventCodec::new();
    let mut buf    = BytesMut::from(input);
    let mut events = Vec::new();
    while let Some(event) = codec.decode(&mut buf)? {
        events.push(event);
    }
    while let Some(event) = codec.decode_eof(&mut buf)? {
        events.push(event);
    }
    Ok(events)
}

#[test]
fn frames_data_lines() -> Result<()> {
    let input  = "data: {\"a\":1}\n\ndata: {\"b\":2}\r\n\r\n";
    let events = decode_all(input)?;
    assert_eq!(vec![r#"{"a":1}"#, r#"{"b":2}"#], events);
    Ok(())
}

#[test]
fn joins_multiline_events() -> Result<()> {
    let events = decode_all("data: one\ndata: two\n\n")?;
    assert_eq!(vec!["one\ntwo"], events);
    Ok(())
}

#[test]
fn skips_other_lines() -> Result<()> {
    let input  = ": keepalive\nevent: flow\ndata: x\n\n\n\nid: 7\n";
    let events = decode_all(input)?;
    assert_eq!(vec!["x"], events);
    Ok(())
}

#[test]
fn flushes_pending_event_at_eof() -> Result<()> {
    let events = decode_all("data: tail")?;
    assert_eq!(vec!["tail"], events);
    Ok(())
}

#[test]
fn skips_oversized_event() -> Result<()> {
    let mut codec  = EventCodec::with_max_length(12);
    let mut buf    = BytesMut::from("data: way too long a line\ndata: rest\n\ndata: ok\n\n");
    let mut events = Vec::new();
    while let Some(event) = codec.decode(&mut buf)? {
        events.push(event);
    }
    while let Some(event) = codec.decode_eof(&mut buf)? {
        events.push(event);
    }
    assert_eq!(vec!["ok"], events);
    Ok(())
}

#[tokio::test]
async fn delivers_events_to_handler() -> Result<()> {
    let source = Static("data: 1\n\nbogus\ndata: 2\n\n");
    let cancel = CancellationToken::new();

    let (tx, rx) = oneshot::channel();
    let mut seen = Vec::new();

    connect(&source, |event| {
        seen.push(event);
        Ok(())
    }, Some(tx), cancel).await?;

    assert!(rx.await.is_ok());
    assert_eq!(vec!["1", "2"], seen);

    Ok(())
}

#[tokio::test]
async fn status_is_terminal() {
    let source = Status(503);
    let result = connect(&source, |_| Ok(()), None, CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::Status(503))));
}

#[tokio::test]
async fn handler_error_stops_loop() {
    let source = Static("data: 1\n\ndata: 2\n\n");
    let mut n  = 0;

    let result = connect(&source, |_| {
        n += 1;
        Err(anyhow!("store failed"))
    }, None, CancellationToken::new()).await;

    assert!(matches!(result, Err(Error::Handler(_))));
    assert_eq!(1, n);
}

#[tokio::test]
async fn cancellation_is_clean() -> Result<()> {
    let (mut tx, rx) = duplex(1024);
    let source = Pipe(Mutex::new(Some(rx)));
    let cancel = CancellationToken::new();

    let (ready, opened) = oneshot::channel();
    let token = cancel.clone();
    let task  = tokio::spawn(async move {
        let mut n = 0;
        let result = connect(&source, |_| {
            n += 1;
            Ok(())
        }, Some(ready), token).await;
        (result, n)
    });

    opened.await?;
    tx.write_all(b"data: 1\n\n").await?;
    tx.flush().await?;
    tokio::task::yield_now().await;

    cancel.cancel();

    let (result, _) = task.await?;
    assert!(result.is_ok());

    Ok(())
}
