//! Use-case orchestration over the scheduling backend.
//!
//! # Responsibility
//! - Turn user edits into draft operations and commit calls.
//! - Keep FFI and CLI layers decoupled from storage details.

pub mod session;
