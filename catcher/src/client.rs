use futures::StreamExt;
use log::debug;
use tokio::sync::oneshot;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use crate::{Error, EventCodec, Source};

/// Runs one connection attempt against `source`, handing every decoded
/// event payload to `handler`.
///
/// `ready` fires once the stream is open. Cancellation through `cancel`
/// and the end of the stream both return `Ok(())`; a handler error stops
/// the loop and is returned as `Error::Handler`.
pub async fn connect<S, H>(
    source:      &S,
    mut handler: H,
    ready:       Option<oneshot::Sender<()>>,
    cancel:      CancellationToken,
) -> Result<(), Error>
where
    S: Source + ?Sized,
    H: FnMut(String) -> anyhow::Result<()>,
{
    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(()),
        stream = source.open() => stream?,
    };

    if let Some(ready) = ready {
        let _ = ready.send(());
    }

    let mut events = FramedRead::new(stream, EventCodec::new());

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("stream cancelled");
                return Ok(());
            }
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => handler(event).map_err(Error::Handler)?,
            Some(Err(e))    => return Err(e),
            None            => break,
        }
    }

    debug!("stream finished");

    Ok(())
}
