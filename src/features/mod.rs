//! Feature retrieval from the batch feature store
//!
//! Organized in two layers: `store` is the thin collaborator boundary (the
//! feature-store service itself is external), `provider` holds the
//! dashboard-facing retrieval modes and numeric hygiene.

pub mod provider;
pub mod store;

pub use provider::FeatureProvider;
pub use store::{FeatureGroupTable, FeatureStore, RawRow, RestFeatureStore};
