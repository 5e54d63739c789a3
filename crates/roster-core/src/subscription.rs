//! Subscription records and the transient inputs that drive them.
//!
//! A [`SubscriptionRecord`] exists for an ordered `(subscriber, owner)` pair
//! only while the relationship is pending or active. Revocation deletes the
//! record outright; there are no tombstones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Identity;

// ─── Persisted state ─────────────────────────────────────────────────────────

/// Where a subscription stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
  /// Requested by the subscriber, awaiting the owner's decision.
  Pending,
  /// Granted; the subscriber receives the owner's presence.
  Active,
}

impl SubscriptionState {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Active => "active",
    }
  }
}

/// The relationship between one subscriber and one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
  pub subscriber: Identity,
  pub owner:      Identity,
  pub state:      SubscriptionState,
  /// The request message; only kept while the record is pending.
  pub message:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A subscriber asking to see the owner's presence.
///
/// `submitted_at` is when the caller made the request; it is only logged.
/// Stored records take their timestamps from the store's clock at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
  pub from:         Identity,
  pub to:           Identity,
  pub message:      Option<String>,
  pub submitted_at: DateTime<Utc>,
}

impl SubscriptionRequest {
  pub fn new(from: Identity, to: Identity) -> Self {
    Self { from, to, message: None, submitted_at: Utc::now() }
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }
}

/// The owner's answer to a subscriber. `accept = false` both denies a pending
/// request and revokes an active subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
  /// The subscriber.
  pub from:    Identity,
  /// The owner.
  pub to:      Identity,
  pub accept:  bool,
  pub message: Option<String>,
}

impl ApprovalDecision {
  pub fn accept(from: Identity, to: Identity) -> Self {
    Self { from, to, accept: true, message: None }
  }

  pub fn reject(from: Identity, to: Identity) -> Self {
    Self { from, to, accept: false, message: None }
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// One entry of an owner's pending-request view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
  pub from:         Identity,
  pub message:      Option<String>,
  /// When the request first arrived; refreshes do not move it.
  pub requested_at: DateTime<Utc>,
}

/// What [`upsert_pending`](crate::store::SubscriptionStore::upsert_pending)
/// did to the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  /// No record existed; a new pending record was created.
  Created,
  /// A pending record existed; its message was replaced.
  Refreshed,
  /// The subscription is already active and was left untouched.
  AlreadyActive,
}

impl UpsertOutcome {
  /// The state of the pair after the call.
  pub fn state(self) -> SubscriptionState {
    match self {
      Self::Created | Self::Refreshed => SubscriptionState::Pending,
      Self::AlreadyActive => SubscriptionState::Active,
    }
  }
}
