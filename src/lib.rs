//! Coinvault - coin collection back-office HTTP service
//!
//! Core library: a hand-rolled HTTP/1.1 transport, a declarative route
//! table, and the coin store the routes are wired to.

pub mod coins;
pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod server;
