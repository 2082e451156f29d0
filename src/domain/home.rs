//! In-memory home core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeKind {
    Single,
    Condo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Home {
    pub id: Uuid,
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: HomeKind,
    pub address: Address,
}

#[derive(Debug, Clone)]
pub struct NewHome {
    pub owner: String,
    pub kind: HomeKind,
    pub address: Address,
}

#[derive(Debug, Default)]
pub struct HomeCore {
    homes: RwLock<HashMap<Uuid, Home>>,
}

impl HomeCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, nh: NewHome) -> Home {
        let home = Home {
            id: Uuid::new_v4(),
            owner: nh.owner,
            kind: nh.kind,
            address: nh.address,
        };
        self.homes.write().await.insert(home.id, home.clone());
        home
    }

    pub async fn query_by_id(&self, id: Uuid) -> Option<Home> {
        self.homes.read().await.get(&id).cloned()
    }

    /// Homes owned by `owner`, in a stable order.
    pub async fn query_by_owner(&self, owner: &str) -> Vec<Home> {
        let mut homes: Vec<Home> = self
            .homes
            .read()
            .await
            .values()
            .filter(|h| h.owner == owner)
            .cloned()
            .collect();
        homes.sort_by(|a, b| a.id.cmp(&b.id));
        homes
    }

    pub async fn delete(&self, id: Uuid) -> Option<Home> {
        self.homes.write().await.remove(&id)
    }
}
