//! Quill Types - Shared domain types
//!
//! This crate contains domain types used across quill services:
//! - User identity
//! - Plans and subscription state
//! - Submissions (the usage ledger records) and derived usage counts

pub mod plan;
pub mod submission;
pub mod subscription;
pub mod user;

pub use plan::*;
pub use submission::*;
pub use subscription::*;
pub use user::*;
