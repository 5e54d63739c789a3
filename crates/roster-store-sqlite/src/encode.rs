//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Identities are stored twice: the party key
//! (`user@realm`) that the primary key and indexes use, and the full identity
//! as compact JSON so resource, protocol and host survive a round trip.

use chrono::{DateTime, Utc};
use roster_core::{
  Identity,
  subscription::{PendingRequest, SubscriptionRecord, SubscriptionState},
};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

pub fn party_key(identity: &Identity) -> String { identity.party().to_string() }

pub fn encode_identity(identity: &Identity) -> Result<String> {
  Ok(serde_json::to_string(identity)?)
}

pub fn decode_identity(s: &str) -> Result<Identity> { Ok(serde_json::from_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SubscriptionState ───────────────────────────────────────────────────────

pub const PENDING: &str = "pending";
pub const ACTIVE: &str = "active";

pub fn encode_state(state: SubscriptionState) -> &'static str {
  match state {
    SubscriptionState::Pending => PENDING,
    SubscriptionState::Active => ACTIVE,
  }
}

pub fn decode_state(s: &str) -> Result<SubscriptionState> {
  match s {
    PENDING => Ok(SubscriptionState::Pending),
    ACTIVE => Ok(SubscriptionState::Active),
    other => Err(Error::UnknownState(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `subscriptions` row.
pub struct RawRecord {
  pub subscriber_identity: String,
  pub owner_identity:      String,
  pub state:               String,
  pub message:             Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscriber_identity: row.get(0)?,
      owner_identity:      row.get(1)?,
      state:               row.get(2)?,
      message:             row.get(3)?,
      created_at:          row.get(4)?,
      updated_at:          row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
      subscriber: decode_identity(&self.subscriber_identity)?,
      owner:      decode_identity(&self.owner_identity)?,
      state:      decode_state(&self.state)?,
      message:    self.message,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings for one entry of the pending view.
pub struct RawPending {
  pub subscriber_identity: String,
  pub message:             Option<String>,
  pub created_at:          String,
}

impl RawPending {
  pub fn into_pending(self) -> Result<PendingRequest> {
    Ok(PendingRequest {
      from:         decode_identity(&self.subscriber_identity)?,
      message:      self.message,
      requested_at: decode_dt(&self.created_at)?,
    })
  }
}
