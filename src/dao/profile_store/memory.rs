use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{models::ProfileEntity, profile_store::ProfileStore, storage::StorageResult};

/// Process-local profile store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<DashMap<String, ProfileEntity>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn find_profile(&self, user_id: &str) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        let profiles = self.profiles.clone();
        let user_id = user_id.to_owned();
        Box::pin(async move { Ok(profiles.get(&user_id).map(|entry| entry.value().clone())) })
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>> {
        let profiles = self.profiles.clone();
        Box::pin(async move {
            profiles.insert(profile.user_id.clone(), profile);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::StatsEntity;

    fn profile(user_id: &str) -> ProfileEntity {
        ProfileEntity {
            user_id: user_id.into(),
            display_name: "Ada".into(),
            stats: StatsEntity::default(),
            recent_games: Vec::new(),
            achievements: Vec::new(),
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn saved_profiles_can_be_found_again() {
        let store = MemoryProfileStore::new();
        assert!(store.find_profile("ada").await.unwrap().is_none());

        store.save_profile(profile("ada")).await.unwrap();
        let found = store.find_profile("ada").await.unwrap().unwrap();
        assert_eq!(found.display_name, "Ada");
    }

    #[tokio::test]
    async fn saving_twice_overwrites() {
        let store = MemoryProfileStore::new();
        store.save_profile(profile("ada")).await.unwrap();

        let mut updated = profile("ada");
        updated.display_name = "Ada L.".into();
        store.save_profile(updated).await.unwrap();

        let found = store.find_profile("ada").await.unwrap().unwrap();
        assert_eq!(found.display_name, "Ada L.");
    }
}
