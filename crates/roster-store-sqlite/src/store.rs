//! [`SqliteStore`] — the SQLite implementation of [`SubscriptionStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use roster_core::{
  Identity,
  store::SubscriptionStore,
  subscription::{PendingRequest, SubscriptionRecord, SubscriptionState, UpsertOutcome},
};

use crate::{
  Error, Result,
  encode::{
    ACTIVE, PENDING, RawPending, RawRecord, decode_identity, decode_state, encode_dt,
    encode_identity, encode_state, party_key,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// All statements run on the connection's own thread, one closure at a time,
/// and every operation is wrapped in a transaction, so operations are
/// linearizable and all-or-nothing.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Column values for inserting a fresh row.
struct NewRow {
  subscriber:          String,
  owner:               String,
  subscriber_identity: String,
  owner_identity:      String,
  now:                 String,
}

impl NewRow {
  fn new(subscriber: &Identity, owner: &Identity) -> Result<Self> {
    Ok(Self {
      subscriber:          party_key(subscriber),
      owner:               party_key(owner),
      subscriber_identity: encode_identity(subscriber)?,
      owner_identity:      encode_identity(owner)?,
      now:                 encode_dt(Utc::now()),
    })
  }

  fn insert(
    &self,
    tx: &rusqlite::Transaction<'_>,
    state: SubscriptionState,
    message: Option<&str>,
  ) -> rusqlite::Result<()> {
    tx.execute(
      "INSERT INTO subscriptions (
         subscriber, owner, subscriber_identity, owner_identity,
         state, message, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
      rusqlite::params![
        self.subscriber,
        self.owner,
        self.subscriber_identity,
        self.owner_identity,
        encode_state(state),
        message,
        self.now,
      ],
    )?;
    Ok(())
  }
}

fn current_state(
  tx: &rusqlite::Transaction<'_>,
  subscriber: &str,
  owner: &str,
) -> rusqlite::Result<Option<String>> {
  tx.query_row(
    "SELECT state FROM subscriptions WHERE subscriber = ?1 AND owner = ?2",
    rusqlite::params![subscriber, owner],
    |r| r.get(0),
  )
  .optional()
}

fn reject_self(subscriber: &Identity, owner: &Identity) -> Result<()> {
  if subscriber == owner {
    return Err(roster_core::Error::self_subscription(subscriber).into());
  }
  Ok(())
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened subscription database");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Active counterparts of `party` in the given role.
  ///
  /// `column` is the role `party` plays; the identities returned come from
  /// `identity_column`.
  async fn active_parties(
    &self,
    column: &'static str,
    identity_column: &'static str,
    party: String,
  ) -> Result<BTreeSet<Identity>> {
    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {identity_column} FROM subscriptions
           WHERE {column} = ?1 AND state = ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![party, ACTIVE], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_identity(s)).collect()
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_pending<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
    message: Option<String>,
  ) -> Result<UpsertOutcome> {
    reject_self(subscriber, owner)?;
    let row = NewRow::new(subscriber, owner)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = match current_state(&tx, &row.subscriber, &row.owner)?.as_deref() {
          Some(ACTIVE) => UpsertOutcome::AlreadyActive,
          Some(_) => {
            tx.execute(
              "UPDATE subscriptions
               SET message = ?3, updated_at = ?4
               WHERE subscriber = ?1 AND owner = ?2",
              rusqlite::params![row.subscriber, row.owner, message, row.now],
            )?;
            UpsertOutcome::Refreshed
          }
          None => {
            row.insert(&tx, SubscriptionState::Pending, message.as_deref())?;
            UpsertOutcome::Created
          }
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn activate<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionState>> {
    reject_self(subscriber, owner)?;
    let row = NewRow::new(subscriber, owner)?;

    let before: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let before = current_state(&tx, &row.subscriber, &row.owner)?;
        match before.as_deref() {
          Some(PENDING) => {
            tx.execute(
              "UPDATE subscriptions
               SET state = ?3, message = NULL, updated_at = ?4
               WHERE subscriber = ?1 AND owner = ?2",
              rusqlite::params![row.subscriber, row.owner, ACTIVE, row.now],
            )?;
          }
          Some(_) => {}
          None => row.insert(&tx, SubscriptionState::Active, None)?,
        }
        tx.commit()?;
        Ok(before)
      })
      .await?;

    before.as_deref().map(decode_state).transpose()
  }

  async fn revoke<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionState>> {
    let subscriber = party_key(subscriber);
    let owner = party_key(owner);

    let before: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let before = current_state(&tx, &subscriber, &owner)?;
        if before.is_some() {
          tx.execute(
            "DELETE FROM subscriptions WHERE subscriber = ?1 AND owner = ?2",
            rusqlite::params![subscriber, owner],
          )?;
        }
        tx.commit()?;
        Ok(before)
      })
      .await?;

    before.as_deref().map(decode_state).transpose()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get<'a>(
    &'a self,
    subscriber: &'a Identity,
    owner: &'a Identity,
  ) -> Result<Option<SubscriptionRecord>> {
    let subscriber = party_key(subscriber);
    let owner = party_key(owner);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subscriber_identity, owner_identity, state, message,
                      created_at, updated_at
               FROM subscriptions WHERE subscriber = ?1 AND owner = ?2",
              rusqlite::params![subscriber, owner],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn pending_for<'a>(&'a self, owner: &'a Identity) -> Result<Vec<PendingRequest>> {
    let owner = party_key(owner);

    let raws: Vec<RawPending> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subscriber_identity, message, created_at
           FROM subscriptions
           WHERE owner = ?1 AND state = ?2
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner, PENDING], |row| {
            Ok(RawPending {
              subscriber_identity: row.get(0)?,
              message:             row.get(1)?,
              created_at:          row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPending::into_pending).collect()
  }

  async fn subscribers_of<'a>(&'a self, owner: &'a Identity) -> Result<BTreeSet<Identity>> {
    self
      .active_parties("owner", "subscriber_identity", party_key(owner))
      .await
  }

  async fn subscriptions_of<'a>(
    &'a self,
    subscriber: &'a Identity,
  ) -> Result<BTreeSet<Identity>> {
    self
      .active_parties("subscriber", "owner_identity", party_key(subscriber))
      .await
  }
}
