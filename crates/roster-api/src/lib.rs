//! JSON REST API for Roster presence subscriptions.
//!
//! Exposes an axum [`Router`] backed by a [`SubscriptionService`] over any
//! [`SubscriptionStore`] and [`PresenceNotifier`]. Identities travel in their
//! text form (`[protocol://]user@realm[/resource]`). Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod identities;
pub mod intents;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use roster_core::{
  notify::PresenceNotifier, service::SubscriptionService, store::SubscriptionStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(service: Arc<SubscriptionService<S, N>>) -> Router<()>
where
  S: SubscriptionStore + 'static,
  N: PresenceNotifier + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Intents
    .route("/subscriptions", post(intents::subscribe::<S, N>))
    .route("/approvals", post(intents::approve::<S, N>))
    // Views
    .route("/identities/{id}/pending", get(identities::pending::<S, N>))
    .route("/identities/{id}/subscribers", get(identities::subscribers::<S, N>))
    .route("/identities/{id}/subscriptions", get(identities::subscriptions::<S, N>))
    .with_state(service)
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests;
