// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Signature does not authorize this guardian: {0}")]
    Authentication(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Registration rejected: {0}")]
    Policy(String),

    #[error("Chain read failed during {operation}: {reason}")]
    TransientChain { operation: String, reason: String },

    #[error("Swap quote failed (status {status:?}): {reason}")]
    Quote { status: Option<u16>, reason: String },

    #[error("Swap quote service unavailable: status {status}")]
    QuoteUnavailable { status: u16 },

    #[error("Malformed payload: {0}")]
    Parse(String),

    #[error("Execution failed at {stage}: {reason}")]
    Execution { stage: String, reason: String },

    #[error("Address {0} is invalid")]
    InvalidAddress(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn chain(operation: &str, reason: impl std::fmt::Display) -> Self {
        AppError::TransientChain {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn execution(stage: &str, reason: impl Into<String>) -> Self {
        AppError::Execution {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable category label used in API responses and logs.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Connection(_) => "connection",
            AppError::Authentication(_) => "authentication",
            AppError::Validation { .. } | AppError::InvalidAddress(_) => "validation",
            AppError::Policy(_) => "policy",
            AppError::TransientChain { .. } => "chain",
            AppError::Quote { .. } | AppError::QuoteUnavailable { .. } => "quote",
            AppError::Parse(_) => "parse",
            AppError::Execution { .. } => "execution",
            AppError::NotFound(_) => "not_found",
            AppError::Unknown(_) => "internal",
        }
    }

    /// True for failures a poll loop should log and retry on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::TransientChain { .. }
                | AppError::Connection(_)
                | AppError::QuoteUnavailable { .. }
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
