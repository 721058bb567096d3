use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{load_records, save_records};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group name is required")]
    NameRequired,

    #[error("group {0} already exists")]
    NameTaken(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGroup {
    pub id: String,
    pub name: String,
    /// Wire identities
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub struct GroupStore {
    path: PathBuf,
    groups: RwLock<Vec<StoredGroup>>,
}

impl GroupStore {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let groups: Vec<StoredGroup> = load_records(&path).await?;
        info!("Group store loaded {} groups", groups.len());
        Ok(Self {
            path,
            groups: RwLock::new(groups),
        })
    }

    /// Create a group. Names are unique; members are deduplicated in order.
    pub async fn create(
        &self,
        name: &str,
        members: Vec<String>,
    ) -> Result<StoredGroup, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::NameRequired);
        }

        let mut unique: Vec<String> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }

        let mut groups = self.groups.write().await;
        if groups.iter().any(|g| g.name == name) {
            return Err(GroupError::NameTaken(name.to_string()));
        }

        let group = StoredGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            members: unique,
            created_at: Utc::now(),
        };
        groups.push(group.clone());
        if let Err(e) = save_records(&self.path, groups.as_slice()).await {
            groups.pop();
            return Err(e.into());
        }

        info!("Created group {} with {} members", group.name, group.members.len());
        Ok(group)
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.groups.read().await.iter().any(|g| g.name == name)
    }

    /// Groups that list `member`.
    pub async fn for_member(&self, member: &str) -> Vec<StoredGroup> {
        self.groups
            .read()
            .await
            .iter()
            .filter(|g| g.members.iter().any(|m| m == member))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_and_list_by_member() {
        let dir = TempDir::new().unwrap();
        let store = GroupStore::open(dir.path().join("groups.json")).await.unwrap();

        let group = store
            .create("rust", vec!["a".into(), "b".into(), "a".into()])
            .await
            .unwrap();
        assert_eq!(group.members, vec!["a", "b"]);

        assert_eq!(store.for_member("b").await.len(), 1);
        assert!(store.for_member("c").await.is_empty());
        assert!(matches!(
            store.create(" rust ", vec![]).await,
            Err(GroupError::NameTaken(name)) if name == "rust"
        ));
        assert!(matches!(
            store.create("  ", vec![]).await,
            Err(GroupError::NameRequired)
        ));
    }

    #[tokio::test]
    async fn test_groups_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups.json");
        GroupStore::open(&path)
            .await
            .unwrap()
            .create("ops", vec!["a".into()])
            .await
            .unwrap();

        let store = GroupStore::open(&path).await.unwrap();
        assert!(store.exists("ops").await);
    }
}
