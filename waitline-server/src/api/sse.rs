//! SSE adapter over the fan-out bus
//!
//! Consumers receive contentless `refresh` events and reload via the regular
//! read endpoints. The listener debounces bursts, so a clear that archives
//! thirty entries arrives as one event.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;

use crate::bus::RefreshListener;

pub fn refresh_stream(
    listener: RefreshListener,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = futures::stream::unfold(listener, |mut listener| async move {
        listener
            .next()
            .await
            .map(|_| (Ok(Event::default().event("refresh")), listener))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
