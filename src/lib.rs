//! Feature flag evaluation core.
//!
//! # Overview
//!
//! The crate decides whether a named feature flag is enabled for a user. A flag has a global
//! on/off state (the kill switch) and may have a targeting rule attached. The only rule type at
//! the moment is a percentage rollout: every (user, flag) pair is hashed into one of 100 stable
//! buckets and the feature is enabled for buckets below the configured threshold.
//!
//! [`Evaluator`] is the entry point. It is built from a
//! [`CombinedInfoResolver`](resolver::CombinedInfoResolver), which implements a cache-aside
//! lookup: flag information is read from a [`CacheStore`](cache::CacheStore) and, on a miss,
//! fetched concurrently from the flag service and the targeting service (see [`fetcher`]) and
//! written back to the cache. The decision itself is a pure function in [`decision`].
//!
//! The simplest way to get an evaluator is [`EvaluatorConfig::to_evaluator`].
//!
//! # Error Handling
//!
//! Only a failure to resolve the flag definition is returned as an [`Error`]. A missing or
//! unavailable targeting rule means "no targeting", cache failures are ignored, and a targeting
//! rule that cannot be evaluated fails closed.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with the `toggle` target.
//! Absorbed failures are logged at `warn` level.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod decision;
pub mod fetcher;
pub mod models;
pub mod resolver;
pub mod sharder;

mod config;
mod error;
mod evaluator;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, EvaluatorConfig};
pub use error::{Error, Result, Service};
pub use evaluator::Evaluator;
