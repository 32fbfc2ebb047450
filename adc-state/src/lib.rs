//! ABOUTME: Persistence layer for application revisions, resource trackers, and workflow status
//! ABOUTME: Backed in-process by a lock-guarded store; production deployments swap the backend

mod manager;
mod memory;

pub use manager::StateStore;
pub use memory::InMemoryStateStore;
