use std::collections::BTreeMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::coins::model::Coin;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Coin not found: {0}")]
    NotFound(u64),
}

/// Storage seam the coin routes are written against.
pub trait CoinRepository: Send + Sync {
    fn find_all(&self) -> Vec<Coin>;

    fn find_by_id(&self, id: u64) -> Result<Coin, StoreError>;

    /// Stores a new coin under a freshly assigned id, ignoring any id it carries.
    fn insert(&self, coin: Coin) -> Coin;

    /// Replaces the coin stored under `id`.
    fn update(&self, id: u64, coin: Coin) -> Result<Coin, StoreError>;

    fn delete(&self, id: u64) -> Result<(), StoreError>;
}

/// In-memory store.
///
/// Id assignment and every read or write happen under one lock, so the
/// store is safe to share across concurrently served connections.
#[derive(Debug, Default)]
pub struct InMemoryCoinStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    coins: BTreeMap<u64, Coin>,
}

impl InMemoryCoinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CoinRepository for InMemoryCoinStore {
    fn find_all(&self) -> Vec<Coin> {
        self.inner.lock().coins.values().cloned().collect()
    }

    fn find_by_id(&self, id: u64) -> Result<Coin, StoreError> {
        self.inner
            .lock()
            .coins
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn insert(&self, mut coin: Coin) -> Coin {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        coin.id = Some(id);
        inner.coins.insert(id, coin.clone());
        tracing::debug!(id, name = %coin.coin_name, "Coin inserted");
        coin
    }

    fn update(&self, id: u64, mut coin: Coin) -> Result<Coin, StoreError> {
        let mut inner = self.inner.lock();
        let slot = inner.coins.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        coin.id = Some(id);
        *slot = coin.clone();
        Ok(coin)
    }

    fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.inner
            .lock()
            .coins
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_assigned_sequentially() {
        let store = InMemoryCoinStore::new();
        let a = store.insert(Coin::named("Penny"));
        let b = store.insert(Coin::named("Dime"));

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let store = InMemoryCoinStore::new();
        let a = store.insert(Coin::named("Penny"));
        store.delete(a.id.unwrap()).unwrap();
        let b = store.insert(Coin::named("Dime"));

        assert_eq!(b.id, Some(2));
        assert_eq!(store.delete(1), Err(StoreError::NotFound(1)));
    }
}
