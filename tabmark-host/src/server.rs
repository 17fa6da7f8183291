//! The native messaging session: read frames, dispatch each on its own task,
//! write replies and pushed commands through a single writer.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::dispatch::Dispatcher;
use crate::error::HostError;
use crate::framing::{decode_message, encode_message, native_codec};
use crate::protocol::{Envelope, HostMessage};

/// Outbound queue depth between request tasks and the writer.
pub const OUTBOUND_CAPACITY: usize = 256;

pub fn outbound_channel() -> (mpsc::Sender<HostMessage>, mpsc::Receiver<HostMessage>) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Run until the extension closes the pipe.
///
/// Requests still in flight at end of input are awaited and their replies
/// flushed before returning.
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    dispatcher: Arc<Dispatcher>,
    outbound: mpsc::Receiver<HostMessage>,
) -> Result<(), HostError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let writer_task = tokio::spawn(write_frames(writer, outbound, shutdown_rx));

    let mut frames = FramedRead::new(reader, native_codec());
    let mut requests = JoinSet::new();

    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Unreadable frame, closing session");
                break;
            }
        };

        let envelope: Envelope = match decode_message(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected malformed request");
                dispatcher
                    .push(HostMessage::error(request_id(&frame), e.to_string()))
                    .await;
                continue;
            }
        };

        let dispatcher = dispatcher.clone();
        requests.spawn(async move {
            let wants_reply = envelope.id.is_some();
            let reply = dispatcher.dispatch(envelope).await;
            if wants_reply {
                dispatcher.push(reply).await;
            }
        });
        while requests.try_join_next().is_some() {}
    }

    while requests.join_next().await.is_some() {}
    let _ = shutdown_tx.send(());
    match writer_task.await {
        Ok(result) => result,
        Err(e) => Err(HostError::Io(std::io::Error::other(e))),
    }
}

async fn write_frames<W>(
    writer: W,
    mut outbound: mpsc::Receiver<HostMessage>,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<(), HostError>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, native_codec());
    let mut closing = false;
    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(message) => sink.send(encode_message(&message)?).await?,
                None => break,
            },
            _ = &mut shutdown, if !closing => {
                outbound.close();
                closing = true;
            }
        }
    }
    Ok(())
}

/// Best-effort id of a request that failed to parse.
fn request_id(frame: &[u8]) -> Option<u64> {
    serde_json::from_slice::<serde_json::Value>(frame)
        .ok()?
        .get("id")?
        .as_u64()
}
