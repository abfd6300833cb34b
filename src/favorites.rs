//! Per-user favorite tickers

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use tracing::debug;

use crate::models::UserId;

/// Association from a user to the tickers they watch
pub trait FavoritesStore: Send + Sync {
    /// Tickers for `user`, sorted
    fn get(&self, user: UserId) -> Vec<String>;

    /// Returns true if the ticker was not already a favorite
    fn add(&self, user: UserId, ticker: &str) -> bool;

    /// Returns true if the ticker was a favorite
    fn remove(&self, user: UserId, ticker: &str) -> bool;

    /// Users with at least one favorite
    fn users(&self) -> Vec<UserId>;
}

#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    favorites: RwLock<HashMap<UserId, BTreeSet<String>>>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesStore for InMemoryFavorites {
    fn get(&self, user: UserId) -> Vec<String> {
        let favorites = self.favorites.read().unwrap_or_else(|e| e.into_inner());
        favorites
            .get(&user)
            .map(|tickers| tickers.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn add(&self, user: UserId, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return false;
        }
        let mut favorites = self.favorites.write().unwrap_or_else(|e| e.into_inner());
        let added = favorites.entry(user).or_default().insert(ticker.clone());
        debug!("User {} favorites +{} (new: {})", user, ticker, added);
        added
    }

    fn remove(&self, user: UserId, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        let mut favorites = self.favorites.write().unwrap_or_else(|e| e.into_inner());
        let Some(tickers) = favorites.get_mut(&user) else {
            return false;
        };
        let removed = tickers.remove(&ticker);
        if tickers.is_empty() {
            favorites.remove(&user);
        }
        removed
    }

    fn users(&self) -> Vec<UserId> {
        let favorites = self.favorites.read().unwrap_or_else(|e| e.into_inner());
        let mut users: Vec<_> = favorites.keys().copied().collect();
        users.sort_unstable();
        users
    }
}
