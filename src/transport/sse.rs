//! Server-sent event framing for answer streams

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use crate::core::types::StreamEvent;
use crate::query::AnswerStream;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn to_event(event: &StreamEvent) -> Event {
    match Event::default().event("message").json_data(event) {
        Ok(frame) => frame,
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}

/// Frame every event as a JSON `message`.
///
/// When the client disconnects, axum drops the body and with it the
/// answer stream, which cancels the producer.
pub fn into_sse(
    answer: AnswerStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let frames = answer.map(|event| Ok(to_event(&event)));
    Sse::new(frames).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
