pub mod json;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::{models::ProfileEntity, storage::StorageResult};

pub use self::{json::JsonProfileStore, memory::MemoryProfileStore};

/// Abstraction over the persistence layer for user profiles and their stats.
pub trait ProfileStore: Send + Sync {
    fn find_profile(&self, user_id: &str) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>>;
    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
