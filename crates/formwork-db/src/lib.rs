//! # formwork-db
//!
//! Storage for formwork models. Provides [`MemoryManager`], a
//! [`Manager`](formwork_forms::Manager) that keeps documents in process
//! memory. Documents are stored in their internal form, so dates and
//! times are kept as formatted strings, and every saved document is given
//! a UUID identifier under [`ID_FIELD`](formwork_forms::ID_FIELD).
//!
//! ## Module Overview
//!
//! - [`manager`] - The in-memory [`MemoryManager`]

pub mod manager;

pub use manager::MemoryManager;
