//! Profile store keeping one pretty-printed JSON document per user on disk.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;

use crate::dao::{
    models::ProfileEntity,
    profile_store::ProfileStore,
    storage::{StorageError, StorageResult},
};

#[derive(Clone)]
pub struct JsonProfileStore {
    dir: Arc<PathBuf>,
}

impl JsonProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    fn file_path(dir: &Path, user_id: &str) -> PathBuf {
        dir.join(format!("{user_id}.json"))
    }
}

impl ProfileStore for JsonProfileStore {
    fn find_profile(&self, user_id: &str) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        let path = Self::file_path(&self.dir, user_id);
        Box::pin(async move {
            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(StorageError::io("read", &path, err)),
            };

            serde_json::from_str(&contents)
                .map(Some)
                .map_err(|err| StorageError::corrupt(&path, err))
        })
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            fs::create_dir_all(dir.as_path())
                .await
                .map_err(|err| StorageError::io("create", &dir, err))?;

            let path = Self::file_path(&dir, &profile.user_id);
            let tmp = path.with_extension("json.tmp");
            let json = serde_json::to_vec_pretty(&profile).map_err(|err| {
                StorageError::unavailable("failed to encode profile".into(), err)
            })?;

            // Write then rename so readers never observe a half-written document.
            fs::write(&tmp, json)
                .await
                .map_err(|err| StorageError::io("write", &tmp, err))?;
            fs::rename(&tmp, &path)
                .await
                .map_err(|err| StorageError::io("replace", &path, err))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            match fs::metadata(dir.as_path()).await {
                Ok(meta) if meta.is_dir() => Ok(()),
                Ok(_) => Err(StorageError::unavailable(
                    format!("`{}` is not a directory", dir.display()),
                    std::io::Error::from(ErrorKind::NotADirectory),
                )),
                // The directory is created lazily on first save.
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::io("access", &dir, err)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::StatsEntity;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("football-darts-profiles-{}", rand::random::<u64>()))
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = JsonProfileStore::new(scratch_dir());
        assert!(store.find_profile("nobody").await.unwrap().is_none());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn profile_survives_a_fresh_store_instance() {
        let dir = scratch_dir();
        let profile = ProfileEntity {
            user_id: "ada".into(),
            display_name: "Ada".into(),
            stats: StatsEntity {
                games_played: 3,
                games_won: 2,
                ..StatsEntity::default()
            },
            recent_games: Vec::new(),
            achievements: vec!["first_win".into()],
            updated_at: SystemTime::UNIX_EPOCH,
        };

        JsonProfileStore::new(dir.clone())
            .save_profile(profile.clone())
            .await
            .unwrap();

        let found = JsonProfileStore::new(dir.clone())
            .find_profile("ada")
            .await
            .unwrap();
        assert_eq!(found, Some(profile));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_document_is_a_storage_error() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ada.json"), "{ not json").unwrap();

        let err = JsonProfileStore::new(dir.clone())
            .find_profile("ada")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }), "{err}");

        let _ = std::fs::remove_dir_all(dir);
    }
}
