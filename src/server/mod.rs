//! Connection accept loop and server lifetime.

pub mod listener;

pub use listener::{Listener, ShutdownHandle};
