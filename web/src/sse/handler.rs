use crate::{AppState, Error};
use ::sse::Registration;
use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use domain::Id;
use futures::Stream;
use log::*;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// GET open the live notification stream of a subscriber
#[utoipa::path(
    get,
    path = "/sse/{subscriber_id}",
    params(
        ("subscriber_id" = String, Path, description = "Subscriber id to open the stream for")
    ),
    responses(
        (status = 200, description = "Event stream opened", body = String, content_type = "text/event-stream"),
        (status = 404, description = "Subscriber not found")
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    Path(subscriber_id): Path<Id>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    debug!("Establishing SSE connection for subscriber {subscriber_id}");

    let (tx, mut rx) = mpsc::unbounded_channel();

    // On AlreadyConnected the sender is dropped here, so this stream ends at
    // once and the existing connection keeps receiving.
    if app_state.sse_manager.establish(subscriber_id, tx).await? == Registration::AlreadyConnected
    {
        info!("Subscriber {subscriber_id} is already connected, closing the duplicate stream");
    }

    // Dropping the stream drops `rx`, which the registry's close observer
    // turns into removal of the connection.
    let stream = stream! {
        while let Some(event) = rx.recv().await {
            yield event;
        }
        debug!("SSE stream for subscriber {subscriber_id} finished");
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(app_state.config.sse_keep_alive())))
}
