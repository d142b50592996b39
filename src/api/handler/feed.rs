use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use crate::api::server::AppState;
use crate::db::prelude::UserId;
use crate::workflow::feed::{FeedMessage, TrackerView};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub user_id: UserId,
}

#[instrument(skip(ws, state))]
pub async fn tracker_feed(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Response {
    ws.on_upgrade(move |socket| stream_feed(socket, state, query.user_id))
}

async fn send(socket: &mut WebSocket, msg: &FeedMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = ?e, "failed to serialize feed message");
            false
        }
    }
}

/// Sends a fresh snapshot and returns the view it seeds. Callers subscribe before calling so no
/// event between the two is lost.
async fn snapshot(socket: &mut WebSocket, state: &AppState, user_id: &UserId) -> Option<TrackerView> {
    let seq = state.feed.current_seq();
    let trackers = state
        .store
        .trackers_for_user(user_id)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "feed snapshot query failed"))
        .ok()?;

    let view = TrackerView::from_snapshot(seq, trackers.clone());
    send(socket, &FeedMessage::Snapshot { seq, trackers })
        .await
        .then_some(view)
}

#[instrument(skip(socket, state))]
async fn stream_feed(mut socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let mut rx = state.feed.subscribe();
    let Some(mut view) = snapshot(&mut socket, &state, &user_id).await else {
        return;
    };

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    // only events that move this user's view forward are sent
                    if !event.belongs_to(&user_id) || !view.apply(&event) {
                        continue;
                    }
                    if !send(&mut socket, &FeedMessage::Event(event)).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "feed subscriber lagged, resending snapshot");
                    match snapshot(&mut socket, &state, &user_id).await {
                        Some(fresh) => view = fresh,
                        None => break,
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("feed subscriber disconnected");
}
