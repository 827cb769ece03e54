//! SSE plumbing between the broadcast hubs and HTTP responses.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::ServerEvent,
    services::sse_events::team_arrival_channel,
    state::SharedState,
};

/// Subscribe to the field room stream.
pub fn subscribe_field(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.field().subscribe()
}

/// Subscribe to the judging room stream.
pub fn subscribe_judging(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.judging().subscribe()
}

/// Subscribe to one division's fine-grained team-arrival channel.
pub fn subscribe_team_arrivals(
    state: &SharedState,
    division_id: Uuid,
) -> broadcast::Receiver<ServerEvent> {
    state.channels().subscribe(&team_arrival_channel(division_id))
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    stream_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(stream = stream_name, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
