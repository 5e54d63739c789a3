//! Handlers for the write endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/subscriptions` | Body: [`SubscribeBody`]; 202 on success |
//! | `POST` | `/approvals` | Body: [`ApproveBody`]; 204 on success |
//!
//! Both are idempotent; repeating a call is never an error.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use roster_core::{
  Identity,
  notify::PresenceNotifier,
  service::SubscriptionService,
  store::SubscriptionStore,
  subscription::{ApprovalDecision, SubscriptionRequest},
};
use serde::Deserialize;

use crate::error::ApiError;

pub(crate) fn parse_identity(s: &str) -> Result<Identity, ApiError> {
  Ok(s.parse::<Identity>()?)
}

// ─── Subscribe ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
  /// The subscriber.
  pub from:    String,
  /// The owner whose presence is requested.
  pub to:      String,
  pub message: Option<String>,
}

/// `POST /subscriptions` — body: `{"from":"a@1","to":"b@1","message":"..."}`
pub async fn subscribe<S, N>(
  State(service): State<Arc<SubscriptionService<S, N>>>,
  Json(body): Json<SubscribeBody>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  let request = SubscriptionRequest {
    from:         parse_identity(&body.from)?,
    to:           parse_identity(&body.to)?,
    message:      body.message,
    submitted_at: Utc::now(),
  };
  service.subscribe(request).await?;
  Ok(StatusCode::ACCEPTED)
}

// ─── Approve ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  /// The subscriber.
  pub from:    String,
  /// The owner making the decision.
  pub to:      String,
  pub accept:  bool,
  pub message: Option<String>,
}

/// `POST /approvals` — body: `{"from":"a@1","to":"b@1","accept":true}`
///
/// `accept: false` denies a pending request or revokes an active
/// subscription.
pub async fn approve<S, N>(
  State(service): State<Arc<SubscriptionService<S, N>>>,
  Json(body): Json<ApproveBody>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  let decision = ApprovalDecision {
    from:    parse_identity(&body.from)?,
    to:      parse_identity(&body.to)?,
    accept:  body.accept,
    message: body.message,
  };
  service.approve(decision).await?;
  Ok(StatusCode::NO_CONTENT)
}
