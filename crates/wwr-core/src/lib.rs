//! wwr-core: Core library for the wwr issue tracker
//!
//! Holds issues, users and comments in memory and persists them to three flat
//! text files. Transport lives elsewhere: callers drive a [`Tracker`] directly
//! and use [`wire`] when they need the sentinel string replies.

pub mod codec;
pub mod config;
pub mod error;
pub mod issue;
pub mod store;
pub mod tracker;
pub mod user;
pub mod validate;
pub mod wire;

pub use codec::{DecodeMode, DecodeWarning, USER_REMOVED};
pub use config::Config;
pub use error::Error;
pub use issue::{Comment, Issue, IssueView, NewIssue};
pub use store::FileStore;
pub use tracker::{Tracker, UserRemoval};
pub use user::User;

/// Result type for wwr operations
pub type Result<T> = std::result::Result<T, Error>;
