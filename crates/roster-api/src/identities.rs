//! Handlers for the per-identity views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/identities/:id/pending` | Requests awaiting `:id`, oldest first |
//! | `GET`  | `/identities/:id/subscribers` | Who may see `:id`'s presence |
//! | `GET`  | `/identities/:id/subscriptions` | Whose presence `:id` may see |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use roster_core::{
  notify::PresenceNotifier, service::SubscriptionService, store::SubscriptionStore,
};
use serde::Serialize;

use crate::{error::ApiError, intents::parse_identity};

#[derive(Debug, Serialize)]
pub struct PendingEntry {
  pub from:         String,
  pub message:      Option<String>,
  pub requested_at: DateTime<Utc>,
}

/// `GET /identities/:id/pending`
pub async fn pending<S, N>(
  State(service): State<Arc<SubscriptionService<S, N>>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<PendingEntry>>, ApiError>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  let owner = parse_identity(&id)?;
  let entries = service
    .pending_requests(&owner)
    .await?
    .into_iter()
    .map(|p| PendingEntry {
      from:         p.from.to_string(),
      message:      p.message,
      requested_at: p.requested_at,
    })
    .collect();
  Ok(Json(entries))
}

/// `GET /identities/:id/subscribers`
pub async fn subscribers<S, N>(
  State(service): State<Arc<SubscriptionService<S, N>>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  let owner = parse_identity(&id)?;
  let subscribers = service.subscribers(&owner).await?;
  Ok(Json(subscribers.iter().map(ToString::to_string).collect()))
}

/// `GET /identities/:id/subscriptions`
pub async fn subscriptions<S, N>(
  State(service): State<Arc<SubscriptionService<S, N>>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  let subscriber = parse_identity(&id)?;
  let owners = service.subscriptions(&subscriber).await?;
  Ok(Json(owners.iter().map(ToString::to_string).collect()))
}
