//! Onika channels — chat front-ends that feed the router.
//!
//! - **base**: the `Channel` lifecycle trait
//! - **access**: sender allow-lists
//! - **commands**: bot command parsing and canned replies
//! - **formatting**: Markdown → Telegram HTML, reply footers, message splitting
//!
//! The Telegram adapter itself is behind the `telegram` feature.

pub mod access;
pub mod base;
pub mod commands;
pub mod formatting;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use access::AllowList;
pub use base::Channel;
pub use commands::Command;
