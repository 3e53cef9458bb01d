//! Coin collection service
//!
//! The data side of the HTTP surface: the coin model, a repository trait
//! with an in-memory implementation, and the routes exposing it.

pub mod model;
pub mod routes;
pub mod store;

pub use model::Coin;
pub use routes::routes;
pub use store::{CoinRepository, InMemoryCoinStore, StoreError};
