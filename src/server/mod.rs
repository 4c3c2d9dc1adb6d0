//! TCP listener accepting connections and spawning a handler task for each.

pub mod listener;
