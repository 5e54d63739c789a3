//! [`MemoryStore`] — an in-process [`SubscriptionStore`].
//!
//! A single reader-writer lock guards the canonical record map together with
//! two secondary indexes (by owner and by subscriber). The indexes are only
//! ever touched under the same write guard as the records, so every view
//! computed under a read guard is consistent with the record set.

use std::{
  collections::{BTreeSet, HashMap, HashSet},
  sync::Arc,
};

use chrono::Utc;
use parking_lot::RwLock;

use crate::{
  Error, Identity, Result,
  identity::Party,
  store::SubscriptionStore,
  subscription::{PendingRequest, SubscriptionRecord, SubscriptionState, UpsertOutcome},
};

// ─── State ───────────────────────────────────────────────────────────────────

/// A record plus its arrival sequence number, which orders the pending view.
struct Entry {
  record: SubscriptionRecord,
  seq:    u64,
}

/// `(subscriber, owner)`.
type PairKey = (Party, Party);

#[derive(Default)]
struct Inner {
  records:       HashMap<PairKey, Entry>,
  /// owner → subscribers with a record (pending or active).
  by_owner:      HashMap<Party, HashSet<Party>>,
  /// subscriber → owners with a record (pending or active).
  by_subscriber: HashMap<Party, HashSet<Party>>,
  next_seq:      u64,
}

impl Inner {
  fn insert(&mut self, record: SubscriptionRecord) {
    let subscriber = record.subscriber.party();
    let owner = record.owner.party();
    let seq = self.next_seq;
    self.next_seq += 1;

    self
      .by_owner
      .entry(owner.clone())
      .or_default()
      .insert(subscriber.clone());
    self
      .by_subscriber
      .entry(subscriber.clone())
      .or_default()
      .insert(owner.clone());
    self.records.insert((subscriber, owner), Entry { record, seq });
  }

  fn remove(&mut self, key: &PairKey) -> Option<SubscriptionRecord> {
    let entry = self.records.remove(key)?;
    let (subscriber, owner) = key;

    if let Some(subs) = self.by_owner.get_mut(owner) {
      subs.remove(subscriber);
      if subs.is_empty() {
        self.by_owner.remove(owner);
      }
    }
    if let Some(owners) = self.by_subscriber.get_mut(subscriber) {
      owners.remove(owner);
      if owners.is_empty() {
        self.by_subscriber.remove(subscriber);
      }
    }
    Some(entry.record)
  }

  /// Records whose owner is `owner`.
  fn owned_by<'a>(&'a self, owner: &Party) -> impl Iterator<Item = &'a Entry> + 'a {
    let subscribers = self.by_owner.get(owner);
    let owner = owner.clone();
    subscribers
      .into_iter()
      .flatten()
      .filter_map(move |s| self.records.get(&(s.clone(), owner.clone())))
  }

  /// Records whose subscriber is `subscriber`.
  fn held_by<'a>(&'a self, subscriber: &Party) -> impl Iterator<Item = &'a Entry> + 'a {
    let owners = self.by_subscriber.get(subscriber);
    let subscriber = subscriber.clone();
    owners
      .into_iter()
      .flatten()
      .filter_map(move |o| self.records.get(&(subscriber.clone(), o.clone())))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An in-memory subscription store.
///
/// Cloning is cheap; clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of records, pending and active.
  pub fn len(&self) -> usize { self.inner.read().records.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

fn pair_key(subscriber: &Identity, owner: &Identity) -> PairKey {
  (subscriber.party(), owner.party())
}

impl SubscriptionStore for MemoryStore {
  type Error = Error;

  async fn upsert_pending<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
    message: Option<String>,
  ) -> Result<UpsertOutcome> {
    if subscriber == owner {
      return Err(Error::self_subscription(subscriber));
    }

    let key = pair_key(subscriber, owner);
    let now = Utc::now();
    let mut inner = self.inner.write();

    if let Some(entry) = inner.records.get_mut(&key) {
      return Ok(match entry.record.state {
        SubscriptionState::Active => UpsertOutcome::AlreadyActive,
        SubscriptionState::Pending => {
          entry.record.message = message;
          entry.record.updated_at = now;
          UpsertOutcome::Refreshed
        }
      });
    }

    inner.insert(SubscriptionRecord {
      subscriber: subscriber.clone(),
      owner: owner.clone(),
      state: SubscriptionState::Pending,
      message,
      created_at: now,
      updated_at: now,
    });
    Ok(UpsertOutcome::Created)
  }

  async fn activate<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionState>> {
    if subscriber == owner {
      return Err(Error::self_subscription(subscriber));
    }

    let key = pair_key(subscriber, owner);
    let now = Utc::now();
    let mut inner = self.inner.write();

    if let Some(entry) = inner.records.get_mut(&key) {
      let before = entry.record.state;
      if before == SubscriptionState::Pending {
        entry.record.state = SubscriptionState::Active;
        entry.record.message = None;
        entry.record.updated_at = now;
      }
      return Ok(Some(before));
    }

    inner.insert(SubscriptionRecord {
      subscriber: subscriber.clone(),
      owner: owner.clone(),
      state: SubscriptionState::Active,
      message: None,
      created_at: now,
      updated_at: now,
    });
    Ok(None)
  }

  async fn revoke<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionState>> {
    let key = pair_key(subscriber, owner);
    Ok(self.inner.write().remove(&key).map(|r| r.state))
  }

  async fn get<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionRecord>> {
    let key = pair_key(subscriber, owner);
    Ok(self.inner.read().records.get(&key).map(|e| e.record.clone()))
  }

  async fn pending_for<'a>(&'a self, owner: &'a Identity) -> Result<Vec<PendingRequest>> {
    let inner = self.inner.read();
    let mut pending: Vec<&Entry> = inner
      .owned_by(&owner.party())
      .filter(|e| e.record.state == SubscriptionState::Pending)
      .collect();
    pending.sort_by_key(|e| e.seq);

    Ok(
      pending
        .into_iter()
        .map(|e| PendingRequest {
          from:         e.record.subscriber.clone(),
          message:      e.record.message.clone(),
          requested_at: e.record.created_at,
        })
        .collect(),
    )
  }

  async fn subscribers_of<'a>(&'a self, owner: &'a Identity) -> Result<BTreeSet<Identity>> {
    let inner = self.inner.read();
    Ok(
      inner
        .owned_by(&owner.party())
        .filter(|e| e.record.state == SubscriptionState::Active)
        .map(|e| e.record.subscriber.clone())
        .collect(),
    )
  }

  async fn subscriptions_of<'a>(
    &'a self,
    subscriber: &'a Identity,
  ) -> Result<BTreeSet<Identity>> {
    let inner = self.inner.read();
    Ok(
      inner
        .held_by(&subscriber.party())
        .filter(|e| e.record.state == SubscriptionState::Active)
        .map(|e| e.record.owner.clone())
        .collect(),
    )
  }
}
