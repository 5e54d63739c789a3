//! [`SubscriptionService`] — the public façade over a [`SubscriptionStore`].
//!
//! Interprets subscribe and approve intents, applies them to the store, and
//! once the store call has returned, tells the affected party through a
//! [`PresenceNotifier`]. Per ordered pair:
//!
//! ```text
//! ∅ ──subscribe──▶ Pending ──approve(accept)──▶ Active ──approve(reject)──▶ ∅
//! ∅ ──approve(accept)──▶ Active        Pending ──approve(reject)──▶ ∅
//! Active ──subscribe──▶ Active
//! ```
//!
//! Repeating a transition is a no-op and sends nothing.

use std::collections::BTreeSet;

use crate::{
  Error, Identity, Result,
  notify::{PresenceNotifier, SubscriptionEvent},
  store::SubscriptionStore,
  subscription::{
    ApprovalDecision, PendingRequest, SubscriptionRequest, SubscriptionState, UpsertOutcome,
  },
};

pub struct SubscriptionService<S, N> {
  store:    S,
  notifier: N,
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

impl<S, N> SubscriptionService<S, N>
where
  S: SubscriptionStore,
  N: PresenceNotifier,
{
  pub fn new(store: S, notifier: N) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &S { &self.store }

  /// Ask to see `request.to`'s presence on behalf of `request.from`.
  ///
  /// Only a brand-new request notifies the owner; re-requests and requests
  /// against an already active subscription are silent.
  pub async fn subscribe(&self, request: SubscriptionRequest) -> Result<()> {
    let SubscriptionRequest { from, to, message, submitted_at } = request;
    if from == to {
      return Err(Error::self_subscription(&from));
    }

    let outcome = self
      .store
      .upsert_pending(&from, &to, message.clone())
      .await
      .map_err(store_err)?;
    tracing::debug!(subscriber = %from, owner = %to, %submitted_at, ?outcome, "subscribe");

    if outcome == UpsertOutcome::Created {
      self
        .dispatch(SubscriptionEvent::Requested { subscriber: from, owner: to, message })
        .await;
    }
    Ok(())
  }

  /// Apply the owner's decision on `decision.from`'s access.
  ///
  /// Accepting grants access, with or without a prior request, and fails for
  /// `from == to`. Rejecting denies a pending request or revokes an active
  /// subscription; rejecting a relationship that does not exist (a self-pair
  /// included) does nothing.
  pub async fn approve(&self, decision: ApprovalDecision) -> Result<()> {
    let ApprovalDecision { from, to, accept, message } = decision;

    let event = if accept {
      if from == to {
        return Err(Error::self_subscription(&from));
      }
      let before = self.store.activate(&from, &to).await.map_err(store_err)?;
      tracing::debug!(subscriber = %from, owner = %to, ?before, "approve");
      match before {
        Some(SubscriptionState::Active) => None,
        Some(SubscriptionState::Pending) | None => Some(SubscriptionEvent::Granted {
          subscriber: from,
          owner: to,
          message,
        }),
      }
    } else {
      let before = self.store.revoke(&from, &to).await.map_err(store_err)?;
      tracing::debug!(subscriber = %from, owner = %to, ?before, "reject");
      match before {
        None => None,
        Some(SubscriptionState::Pending) => Some(SubscriptionEvent::Denied {
          subscriber: from,
          owner: to,
          message,
        }),
        Some(SubscriptionState::Active) => Some(SubscriptionEvent::Revoked {
          subscriber: from,
          owner: to,
          message,
        }),
      }
    };

    if let Some(event) = event {
      self.dispatch(event).await;
    }
    Ok(())
  }

  /// Requests awaiting `owner`'s decision, oldest first.
  pub async fn pending_requests(&self, owner: &Identity) -> Result<Vec<PendingRequest>> {
    self.store.pending_for(owner).await.map_err(store_err)
  }

  /// Who may currently see `owner`'s presence.
  pub async fn subscribers(&self, owner: &Identity) -> Result<BTreeSet<Identity>> {
    self.store.subscribers_of(owner).await.map_err(store_err)
  }

  /// Whose presence `subscriber` may currently see.
  pub async fn subscriptions(&self, subscriber: &Identity) -> Result<BTreeSet<Identity>> {
    self.store.subscriptions_of(subscriber).await.map_err(store_err)
  }

  /// Hand `event` to the notifier. The state change is already committed, so
  /// failures are logged and dropped.
  async fn dispatch(&self, event: SubscriptionEvent) {
    let recipient = event.recipient().clone();
    let kind = event.kind();
    if let Err(e) = self.notifier.notify(event).await {
      tracing::warn!(%recipient, kind, error = %e, "failed to deliver subscription notification");
    }
  }
}
