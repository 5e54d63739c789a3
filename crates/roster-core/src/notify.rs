//! Outbound notifications about subscription changes.
//!
//! The service hands each committed state change to a [`PresenceNotifier`],
//! which forwards it to the live sessions of the affected party. Delivery is
//! best-effort: a failed notification never undoes the change it describes.

use std::{convert::Infallible, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::Identity;

// ─── Events ──────────────────────────────────────────────────────────────────

/// A committed change to a subscription, addressed to one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubscriptionEvent {
  /// A new request awaits the owner's decision. Sent to the owner.
  Requested {
    subscriber: Identity,
    owner:      Identity,
    message:    Option<String>,
  },
  /// The subscriber may now see the owner's presence. Sent to the subscriber.
  Granted {
    subscriber: Identity,
    owner:      Identity,
    message:    Option<String>,
  },
  /// A pending request was refused. Sent to the subscriber.
  Denied {
    subscriber: Identity,
    owner:      Identity,
    message:    Option<String>,
  },
  /// An active subscription was withdrawn. Sent to the subscriber.
  Revoked {
    subscriber: Identity,
    owner:      Identity,
    message:    Option<String>,
  },
}

impl SubscriptionEvent {
  /// The party whose sessions should receive this event.
  pub fn recipient(&self) -> &Identity {
    match self {
      Self::Requested { owner, .. } => owner,
      Self::Granted { subscriber, .. }
      | Self::Denied { subscriber, .. }
      | Self::Revoked { subscriber, .. } => subscriber,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Requested { .. } => "requested",
      Self::Granted { .. } => "granted",
      Self::Denied { .. } => "denied",
      Self::Revoked { .. } => "revoked",
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Delivers [`SubscriptionEvent`]s to the transport layer.
pub trait PresenceNotifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    event: SubscriptionEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Implementations ─────────────────────────────────────────────────────────

/// Writes every event to the `tracing` log and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl PresenceNotifier for LogNotifier {
  type Error = Infallible;

  async fn notify(&self, event: SubscriptionEvent) -> Result<(), Infallible> {
    tracing::info!(
      recipient = %event.recipient(),
      kind = event.kind(),
      "subscription notification"
    );
    Ok(())
  }
}

#[derive(Debug, Error)]
#[error("notification receiver dropped")]
pub struct ReceiverDropped(pub SubscriptionEvent);

/// Forwards events over an unbounded channel to whatever drives delivery.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<SubscriptionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl PresenceNotifier for ChannelNotifier {
  type Error = ReceiverDropped;

  async fn notify(&self, event: SubscriptionEvent) -> Result<(), ReceiverDropped> {
    self.tx.send(event).map_err(|e| ReceiverDropped(e.0))
  }
}
