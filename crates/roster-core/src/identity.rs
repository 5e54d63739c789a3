//! Identity — the addressable principal on either end of a subscription.
//!
//! An identity names a user within a realm (a tenant or context). It may also
//! carry the protocol the identity arrived over, a routing host, and a
//! resource naming one device or session. Only `(user, realm)` identifies the
//! subscription party; the other fields ride along untouched.

use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
  str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Party key ───────────────────────────────────────────────────────────────

/// The `(user, realm)` pair that identifies a subscription party.
///
/// Displayed as `user@realm`; backends use that form as their storage key.
/// The realm never contains `@` or `/`, so the key splits back unambiguously
/// at its last `@`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Party {
  pub realm: String,
  pub user:  String,
}

impl fmt::Display for Party {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.user, self.realm)
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// An immutable principal identifier.
///
/// Equality, hashing and ordering consider only `user` and `realm`, so a set
/// of identities holds one entry per party regardless of resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct Identity {
  #[serde(skip_serializing_if = "Option::is_none")]
  protocol: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  host:     Option<String>,
  user:     String,
  realm:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  resource: Option<String>,
}

impl Identity {
  /// Build an identity for `user` in `realm`.
  ///
  /// Both must be non-empty. `user` may contain `@` but not `/`; `realm` may
  /// contain neither.
  pub fn new(user: impl Into<String>, realm: impl Into<String>) -> Result<Self> {
    let user = user.into();
    let realm = realm.into();
    let reason = if user.is_empty() {
      Some("user must not be empty")
    } else if user.contains('/') {
      Some("user must not contain '/'")
    } else if realm.is_empty() {
      Some("realm must not be empty")
    } else if realm.contains(['@', '/']) {
      Some("realm must not contain '@' or '/'")
    } else {
      None
    };
    if let Some(reason) = reason {
      return Err(Error::InvalidIdentity { input: format!("{user}@{realm}"), reason });
    }
    Ok(Self { protocol: None, host: None, user, realm, resource: None })
  }

  pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
    self.protocol = Some(protocol.into());
    self
  }

  pub fn with_host(mut self, host: impl Into<String>) -> Self {
    self.host = Some(host.into());
    self
  }

  pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
    self.resource = Some(resource.into());
    self
  }

  pub fn protocol(&self) -> Option<&str> { self.protocol.as_deref() }

  pub fn host(&self) -> Option<&str> { self.host.as_deref() }

  pub fn user(&self) -> &str { &self.user }

  pub fn realm(&self) -> &str { &self.realm }

  pub fn resource(&self) -> Option<&str> { self.resource.as_deref() }

  /// The subscription party this identity belongs to.
  pub fn party(&self) -> Party {
    Party { realm: self.realm.clone(), user: self.user.clone() }
  }

  /// Whether `self` and `other` are the same subscription party.
  pub fn same_party(&self, other: &Identity) -> bool { self == other }

  fn key(&self) -> (&str, &str) { (&self.realm, &self.user) }
}

impl PartialEq for Identity {
  fn eq(&self, other: &Self) -> bool { self.key() == other.key() }
}

impl Eq for Identity {}

impl Hash for Identity {
  fn hash<H: Hasher>(&self, state: &mut H) { self.key().hash(state) }
}

impl PartialOrd for Identity {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Identity {
  fn cmp(&self, other: &Self) -> Ordering { self.key().cmp(&other.key()) }
}

// ─── Text form ───────────────────────────────────────────────────────────────

/// `[protocol://]user@realm[/resource]`. The host is not part of the text
/// form.
impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(protocol) = &self.protocol {
      write!(f, "{protocol}://")?;
    }
    write!(f, "{}@{}", self.user, self.realm)?;
    if let Some(resource) = &self.resource {
      write!(f, "/{resource}")?;
    }
    Ok(())
  }
}

impl FromStr for Identity {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = |reason| Error::InvalidIdentity { input: s.to_owned(), reason };

    let (protocol, rest) = match s.split_once("://") {
      Some(("", _)) => return Err(invalid("protocol must not be empty")),
      Some((protocol, rest)) => (Some(protocol), rest),
      None => (None, s),
    };

    let (address, resource) = match rest.split_once('/') {
      Some((_, "")) => return Err(invalid("resource must not be empty")),
      Some((address, resource)) => (address, Some(resource)),
      None => (rest, None),
    };

    // The user part may itself contain '@' (e.g. an email-style local name).
    let (user, realm) = address
      .rsplit_once('@')
      .ok_or_else(|| invalid("expected user@realm"))?;

    let mut identity = Identity::new(user, realm).map_err(|e| match e {
      Error::InvalidIdentity { reason, .. } => invalid(reason),
      other => other,
    })?;
    identity.protocol = protocol.map(str::to_owned);
    identity.resource = resource.map(str::to_owned);
    Ok(identity)
  }
}

// ─── Serde validation ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawIdentity {
  protocol: Option<String>,
  host:     Option<String>,
  user:     String,
  realm:    String,
  resource: Option<String>,
}

impl TryFrom<RawIdentity> for Identity {
  type Error = Error;

  fn try_from(raw: RawIdentity) -> Result<Self> {
    let mut identity = Identity::new(raw.user, raw.realm)?;
    identity.protocol = raw.protocol;
    identity.host = raw.host;
    identity.resource = raw.resource;
    Ok(identity)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[test]
  fn parse_bare_address() {
    let id: Identity = "marcus@1337".parse().unwrap();
    assert_eq!(id.user(), "marcus");
    assert_eq!(id.realm(), "1337");
    assert_eq!(id.protocol(), None);
    assert_eq!(id.resource(), None);
    assert_eq!(id.to_string(), "marcus@1337");
  }

  #[test]
  fn parse_full_form() {
    let id: Identity = "xmpp://martin@1337/desktop".parse().unwrap();
    assert_eq!(id.protocol(), Some("xmpp"));
    assert_eq!(id.user(), "martin");
    assert_eq!(id.realm(), "1337");
    assert_eq!(id.resource(), Some("desktop"));
    assert_eq!(id.to_string(), "xmpp://martin@1337/desktop");
  }

  #[test]
  fn user_may_contain_at_sign() {
    let id: Identity = "marcus@example.com@1337".parse().unwrap();
    assert_eq!(id.user(), "marcus@example.com");
    assert_eq!(id.realm(), "1337");
  }

  #[test]
  fn new_rejects_separators_that_break_the_text_form() {
    assert!(Identity::new("a", "b@c").is_err());
    assert!(Identity::new("a", "b/c").is_err());
    assert!(Identity::new("a/b", "c").is_err());

    let email = Identity::new("a@b", "c").unwrap();
    let parsed: Identity = email.to_string().parse().unwrap();
    assert_eq!((parsed.user(), parsed.realm()), ("a@b", "c"));
    assert_eq!(email.party().to_string(), "a@b@c");
  }

  #[test]
  fn parse_rejects_malformed() {
    for input in ["marcus", "@1337", "marcus@", "://marcus@1337", "marcus@1337/"] {
      let err = input.parse::<Identity>().unwrap_err();
      assert!(
        matches!(err, Error::InvalidIdentity { input: ref got, .. } if got == input),
        "{input:?} gave {err:?}"
      );
    }
  }

  #[test]
  fn equality_ignores_resource_protocol_and_host() {
    let a: Identity = "marcus@1337/phone".parse().unwrap();
    let b = Identity::new("marcus", "1337")
      .unwrap()
      .with_protocol("ox")
      .with_host("node-1")
      .with_resource("desktop");
    assert_eq!(a, b);
    assert!(a.same_party(&b));

    let set: BTreeSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);

    let other_realm: Identity = "marcus@42".parse().unwrap();
    assert_ne!(other_realm, "marcus@1337".parse().unwrap());
  }

  #[test]
  fn deserialize_validates() {
    let ok: Identity =
      serde_json::from_str(r#"{"user":"martin","realm":"1337","host":"h"}"#).unwrap();
    assert_eq!(ok.host(), Some("h"));

    let bad = serde_json::from_str::<Identity>(r#"{"user":"","realm":"1337"}"#);
    assert!(bad.is_err());
  }

  #[test]
  fn party_displays_as_storage_key() {
    let id: Identity = "ox://martin@1337/desktop".parse().unwrap();
    assert_eq!(id.party().to_string(), "martin@1337");
  }
}
