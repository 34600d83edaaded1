//! Inbound webhook adapter.
//!
//! Accepts Telegram updates over `POST /` and bridges them into the
//! dispatcher through an update-listener stream. Every request is
//! acknowledged with `{"ok":true}` regardless of outcome; malformed
//! payloads are logged and dropped so Telegram does not redeliver them.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Serialize;
use std::convert::Infallible;
use teloxide::stop::mk_stop_token;
use teloxide::types::Update;
use teloxide::update_listeners::{StatefulListener, UpdateListener};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

/// Fixed acknowledgement body returned for every webhook request.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always `true`.
    pub ok: bool,
}

#[derive(Clone)]
struct WebhookState {
    tx: mpsc::UnboundedSender<Update>,
}

/// Build the update listener / router pair for webhook mode.
///
/// The router handles `POST /`; the listener feeds the dispatcher with
/// whatever the route accepts. Dropping the router (and with it the
/// sender) ends the listener stream, which stops the dispatcher.
#[must_use]
pub fn update_listener_and_router() -> (impl UpdateListener<Err = Infallible>, Router) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx)
        .map(Ok::<Update, Infallible> as fn(Update) -> Result<Update, Infallible>);
    let listener = StatefulListener::new(
        stream,
        (|state| state) as for<'a> fn(&'a mut _) -> &'a mut _,
        |_state: &mut _| mk_stop_token().0,
    );

    let router = Router::new()
        .route("/", post(receive_update))
        .with_state(WebhookState { tx });

    (listener, router)
}

/// Decode a webhook body into a Telegram update.
///
/// # Errors
///
/// Returns the underlying JSON error when the body is not an update.
pub fn decode_update(body: &[u8]) -> Result<Update, serde_json::Error> {
    serde_json::from_slice(body)
}

async fn receive_update(State(state): State<WebhookState>, body: Bytes) -> Json<Ack> {
    match decode_update(&body) {
        Ok(update) => {
            if state.tx.send(update).is_err() {
                warn!("Dispatcher is gone; dropping update");
            }
        }
        Err(e) => warn!("Ignoring malformed webhook payload: {e}"),
    }
    Json(Ack { ok: true })
}
