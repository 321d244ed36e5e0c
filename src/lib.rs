//! Authorization resolution engine.
//!
//! This crate turns a user's stored role names and explicit permission
//! grants into an effective permission set and derived capability flags,
//! behind a short-lived read-through cache and a sliding-window rate
//! limiter that protect the expensive external role/user lookups from
//! repeated-request storms. The default behavior is deny-by-default: any
//! check that cannot be made confidently resolves to "not permitted".
//!
//! # Examples
//!
//! Basic authorization flow using the in-memory store (enable
//! `memory-store`):
//! ```no_run
//! use authgate::{EngineBuilder, Permission, RoleDefinition, UserId, UserRecord};
//! # #[cfg(feature = "memory-store")]
//! # {
//! use authgate::MemoryStore;
//! # futures::executor::block_on(async {
//! let store = MemoryStore::new();
//! let id = UserId::try_from("user_1").unwrap();
//! let mut user = UserRecord::new(id.clone());
//! user.role_names.push("QA Tester".to_string());
//! store.insert_user(user);
//! store.insert_token("token_1", id);
//! store.insert_role(RoleDefinition::new("qa_tester", ["requests:approve"]));
//!
//! let engine = EngineBuilder::new(store.clone(), store.clone(), store).build();
//! let user = engine.authenticate("token_1").await.unwrap();
//! let permission = Permission::try_from("requests:approve").unwrap();
//! assert!(engine.has_permission(&user, &permission).await);
//! # });
//! # }
//! ```
//!
//! Gating a hot endpoint with the process-local rate limiter:
//! ```
//! use authgate::RateLimiter;
//! use std::time::Duration;
//! let limiter = RateLimiter::new();
//! assert!(limiter.allow("user_1", 5, Duration::from_secs(60)));
//! ```
#![forbid(unsafe_code)]

mod builtin;
mod cache;
mod capability;
mod engine;
mod error;
mod normalize;
mod permission;
mod rate_limit;
mod registry;
mod resolver;
mod store;
mod types;

#[cfg(feature = "memory-store")]
mod memory_store;

#[cfg(feature = "axum")]
pub mod axum;

#[cfg(feature = "jwt")]
mod jwt;

pub use crate::builtin::{
    ADMIN_ALIAS_SUBSTRINGS, ADMIN_INDICATOR_PERMISSIONS, PERMISSIONS_BY_ROLE,
    PROJECT_MANAGER_PERMISSIONS, PROJECT_MANAGER_ROLE_KEYS,
};
pub use crate::cache::TtlCache;
pub use crate::capability::CapabilityDeriver;
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::error::{Error, Result, StoreError};
pub use crate::normalize::{normalize, variations};
pub use crate::permission::Permission;
pub use crate::rate_limit::RateLimiter;
pub use crate::registry::RoleRegistry;
pub use crate::resolver::PermissionResolver;
pub use crate::store::{RoleStore, TokenVerifier, UserStore};
pub use crate::types::{RoleDefinition, UserId, UserRecord};

#[cfg(feature = "memory-store")]
pub use crate::memory_store::MemoryStore;

#[cfg(feature = "jwt")]
pub use crate::jwt::{JwtVerifier, StandardClaims};
