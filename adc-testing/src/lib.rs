//! ABOUTME: Shared collaborator fixtures and end-to-end scenario builders
//! ABOUTME: Grounded on `llmspell-testing`'s shared-fixture-crate pattern — no two crates
//! ABOUTME: reimplement the same fake `ResourceStoreClient`/`DefinitionSource`

pub mod fixtures;
pub mod scenarios;

pub use fixtures::{
    healthy_worker_definition, pending_worker_definition, scaler_trait_definition,
    FixedDefinitionSource, InMemoryResourceStore,
};
