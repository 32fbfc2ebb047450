//! ABOUTME: Capability loading, Application parsing, and revision sealing
//! ABOUTME: Turns a raw Application document into an immutable, renderable revision

mod appfile;
mod canonical;
mod loader;
mod revision_engine;

pub use appfile::{parse, AppFile, ResolvedTrait, Workload};
pub use loader::{CapabilityLoader, DefinitionSource};
pub use revision_engine::ensure_revision;
