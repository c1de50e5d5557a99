//! Saves and loads predictor and preference state through the opaque blob
//! store, and reads the externally-maintained recent-category lists. Every
//! failure here is logged and swallowed: the in-memory state stays
//! authoritative for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{keys, BlobStore};
use crate::predictor::PredictorState;
use crate::types::{PredictorKind, UserPreferenceProfile};

pub struct EnginePersistence {
    store: Arc<dyn BlobStore>,
}

impl EnginePersistence {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn save_predictor(&self, kind: PredictorKind, state: &PredictorState) {
        let payload = match serde_json::to_string(state) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    error = %err,
                    "predictor state serialization failed"
                );
                return;
            }
        };
        self.store
            .set(&keys::model_key(kind), payload, keys::MODEL_TTL)
            .await;
    }

    pub async fn load_predictor(&self, kind: PredictorKind) -> Option<PredictorState> {
        let payload = self.store.get(&keys::model_key(kind)).await?;
        match serde_json::from_str(&payload) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    error = %err,
                    "persisted predictor state unreadable; ignoring"
                );
                None
            }
        }
    }

    pub async fn save_preferences(&self, profiles: &HashMap<String, UserPreferenceProfile>) {
        let payload = match serde_json::to_string(profiles) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "preference map serialization failed");
                return;
            }
        };
        self.store
            .set(keys::preferences_key(), payload, keys::PREFERENCES_TTL)
            .await;
    }

    pub async fn load_preferences(&self) -> Option<HashMap<String, UserPreferenceProfile>> {
        let payload = self.store.get(keys::preferences_key()).await?;
        match serde_json::from_str(&payload) {
            Ok(profiles) => Some(profiles),
            Err(err) => {
                tracing::warn!(error = %err, "persisted preferences unreadable; ignoring");
                None
            }
        }
    }
}

/// Recently-recommended categories per user, tracked outside this core and
/// used only for the diversity term. An unavailable tracker means every
/// candidate counts as novel.
#[async_trait]
pub trait RecentCategoryTracker: Send + Sync {
    async fn recent_categories(&self, user_id: &str) -> Vec<String>;
}

/// Reads the JSON category list the recommendation surface maintains in the
/// blob store.
pub struct CachedRecentCategories {
    store: Arc<dyn BlobStore>,
}

impl CachedRecentCategories {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecentCategoryTracker for CachedRecentCategories {
    async fn recent_categories(&self, user_id: &str) -> Vec<String> {
        let Some(payload) = self.store.get(&keys::recent_categories_key(user_id)).await else {
            return Vec::new();
        };
        serde_json::from_str(&payload).unwrap_or_default()
    }
}
