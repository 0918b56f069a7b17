//! Flutter-facing bindings for the weekly schedule core.

pub mod api;
