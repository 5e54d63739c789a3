//! The `SubscriptionStore` trait.
//!
//! The trait is implemented by storage backends ([`MemoryStore`] here,
//! `roster-store-sqlite` for durable storage). The store is the only mutator
//! of subscription records and owns every invariant on them:
//!
//! - at most one record exists per ordered `(subscriber, owner)` pair;
//! - nobody is their own subscriber;
//! - the pending, subscribers and subscriptions views are derived from the
//!   record set and cannot drift from it.
//!
//! Each method is atomic with respect to every other. Reads see a consistent
//! snapshot, never a half-applied write.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use std::{collections::BTreeSet, future::Future};

use crate::{
  Identity,
  subscription::{PendingRequest, SubscriptionRecord, SubscriptionState, UpsertOutcome},
};

/// Abstraction over a subscription store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Record a request from `subscriber` to see `owner`'s presence.
  ///
  /// Creates a pending record, refreshes the message of an existing pending
  /// record, or leaves an active record alone. Fails with
  /// [`Error::InvalidRequest`](crate::Error::InvalidRequest) (wrapped in the
  /// backend's error) when `subscriber == owner`.
  fn upsert_pending<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
    message: Option<String>,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;

  /// Grant `subscriber` access to `owner`'s presence.
  ///
  /// A pending record becomes active; with no record at all an active one is
  /// created directly (a grant without a prior request). Returns the state
  /// before the call, `None` when no record existed.
  fn activate<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<Option<SubscriptionState>, Self::Error>> + Send + 'a;

  /// Delete the record for the pair, whatever its state. Returns the state
  /// it had, `None` when there was nothing to delete.
  fn revoke<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<Option<SubscriptionState>, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The record for the pair, if any.
  fn get<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<Option<SubscriptionRecord>, Self::Error>> + Send + 'a;

  /// Pending requests addressed to `owner`, oldest first.
  fn pending_for<'a>(
    &'a self,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<Vec<PendingRequest>, Self::Error>> + Send + 'a;

  /// Identities holding an active subscription to `owner`.
  fn subscribers_of<'a>(
    &'a self,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<BTreeSet<Identity>, Self::Error>> + Send + 'a;

  /// Owners `subscriber` holds an active subscription to.
  fn subscriptions_of<'a>(
    &'a self,
    subscriber: &'a Identity,
  ) -> impl Future<Output = Result<BTreeSet<Identity>, Self::Error>> + Send + 'a;
}
