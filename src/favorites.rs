//! Favorites: optimistic local set plus the external persistence boundary.
//!
//! The local set is mutated before the persistence call is issued. On a
//! persistence failure the caller surfaces an error but the local state is
//! left optimistic; there is no automatic rollback.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::catalog::Track;

/// Track ids known to be saved for the active user.
#[derive(Debug, Default)]
pub struct FavoritesSet {
    ids: HashSet<u64>,
}

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Idempotent: adding an already-saved id is a success, not an error.
    /// Returns whether the set actually changed.
    pub fn insert(&mut self, id: u64) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        self.ids.remove(&id)
    }

    /// Replace the whole set with the ids loaded from the external store.
    pub fn seed<I: IntoIterator<Item = u64>>(&mut self, ids: I) {
        self.ids = ids.into_iter().collect();
    }
}

/// Favorites persistence errors, surfaced to the UI as a non-fatal notice.
#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    favorites: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExistsResponse {
    is_favorite: bool,
}

/// Client for the external favorites service.
#[derive(Debug, Clone)]
pub struct FavoritesClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl FavoritesClient {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FavoritesError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Load the user's saved tracks. Entries that no longer parse as tracks
    /// are dropped rather than failing the whole list.
    pub async fn list(&self) -> Result<Vec<Track>, FavoritesError> {
        let response = self
            .http
            .get(self.endpoint("/api/favorites"))
            .query(&[("userId", self.user_id.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: ListResponse = response.json().await?;
        Ok(body
            .favorites
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }

    /// Persist a saved track. The service treats re-adding as success.
    pub async fn add(&self, track: &Track) -> Result<(), FavoritesError> {
        self.http
            .post(self.endpoint("/api/favorites"))
            .json(&json!({ "userId": self.user_id, "track": track }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn remove(&self, track_id: u64) -> Result<(), FavoritesError> {
        self.http
            .delete(self.endpoint("/api/favorites"))
            .query(&[
                ("userId", self.user_id.as_str()),
                ("trackId", &track_id.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn exists(&self, track_id: u64) -> Result<bool, FavoritesError> {
        let response = self
            .http
            .get(self.endpoint("/api/favorites/check"))
            .query(&[
                ("userId", self.user_id.as_str()),
                ("trackId", &track_id.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ExistsResponse = response.json().await?;
        Ok(body.is_favorite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut favorites = FavoritesSet::new();
        assert!(favorites.insert(42));
        assert!(!favorites.insert(42), "second add is a no-op success");
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut favorites = FavoritesSet::new();
        assert!(!favorites.remove(7));
        favorites.insert(7);
        assert!(favorites.remove(7));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_seed_replaces_contents() {
        let mut favorites = FavoritesSet::new();
        favorites.insert(1);
        favorites.seed([2, 3]);

        assert!(!favorites.contains(1));
        assert!(favorites.contains(2) && favorites.contains(3));
    }
}
