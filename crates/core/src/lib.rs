//! Pure domain building blocks shared by the storage and API crates.
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod hashing;
pub mod pagination;
pub mod types;
pub mod validation;
