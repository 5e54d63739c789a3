//! Core types, traits and the service façade for Roster presence
//! subscriptions.
//!
//! A subscription is a directed "may I see your presence" relationship from a
//! subscriber to an owner. This crate holds the domain model, the
//! [`SubscriptionStore`](store::SubscriptionStore) abstraction with an
//! in-memory backend, and the [`SubscriptionService`](service::SubscriptionService)
//! that drives it. It is free of HTTP and database dependencies.

// Native `async fn` in traits; see the `Send` bounds spelled out on each trait.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod memory;
pub mod notify;
pub mod service;
pub mod store;
pub mod subscription;


pub use error::{Error, Result};
pub use identity::Identity;
