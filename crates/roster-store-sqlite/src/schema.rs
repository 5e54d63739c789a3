//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (subscriber, owner) pair while pending or active.
-- Revocation deletes the row; there are no tombstones.
-- Arrival order of pending requests is the implicit rowid.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscriber          TEXT NOT NULL,   -- party key, 'user@realm'
    owner               TEXT NOT NULL,   -- party key, 'user@realm'
    subscriber_identity TEXT NOT NULL,   -- JSON-encoded Identity
    owner_identity      TEXT NOT NULL,   -- JSON-encoded Identity
    state               TEXT NOT NULL,   -- 'pending' | 'active'
    message             TEXT,
    created_at          TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at          TEXT NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (subscriber, owner),
    CHECK (subscriber != owner),
    CHECK (state IN ('pending', 'active'))
);

CREATE INDEX IF NOT EXISTS subscriptions_owner_idx      ON subscriptions(owner, state);
CREATE INDEX IF NOT EXISTS subscriptions_subscriber_idx ON subscriptions(subscriber, state);

PRAGMA user_version = 1;
";
