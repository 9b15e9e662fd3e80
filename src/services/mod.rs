//! Stateless services built on the bridge client.

mod ids;
mod network;
mod storage;

pub use ids::{ID_LENGTH, random_id};
pub use network::{NetworkService, NodeHealth, RepositoryFactory};
pub use storage::CatchStorage;
