//! Startup configuration errors.
//!
//! These are the only faults in the system: anything that goes wrong while a
//! request is being routed is captured as data instead.

use thiserror::Error;

/// A configuration problem detected while building the router.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no layers configured")]
    NoLayers,

    #[error("duplicate layer ordinal {0}")]
    DuplicateOrdinal(u32),

    #[error("layer ordinals must be dense starting at 1: expected {expected}, found {found}")]
    OrdinalGap { expected: u32, found: u32 },

    #[error("layer {ordinal}: unknown provider '{provider}'")]
    UnknownProvider { ordinal: u32, provider: String },

    #[error("layer {0}: model id is empty")]
    EmptyModel(u32),

    #[error("layer {0}: timeout must be greater than zero")]
    ZeroTimeout(u32),

    #[error("layer {0}: rate per million tokens must be a non-negative number")]
    InvalidRate(u32),

    #[error("router.maxRetries must be at least 1")]
    InvalidRetries,

    #[error("router.errorLogSize must be at least 1")]
    InvalidErrorLogSize,

    #[error("router.maxTokensPaid ({paid}) must not exceed router.maxTokensFree ({free})")]
    PaidTokensAboveFree { paid: u32, free: u32 },

    #[error("budget.dailyLimit must be a non-negative number")]
    InvalidDailyLimit,

    #[error("budget.resetHourUtc must be in 0..24, got {0}")]
    InvalidResetHour(u32),
}
