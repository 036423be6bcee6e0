//! Error types for PRU driver operations.

use thiserror::Error;

/// Result type alias for PRU operations.
pub type Result<T> = std::result::Result<T, PrussError>;

/// Errors that can occur during PRU operations.
///
/// `Deferred` is the only transient kind — callers may retry acquisition
/// later. Everything else is permanent for the given inputs.
#[derive(Debug, Error)]
pub enum PrussError {
    /// A core, memory range, or other resource is absent.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked for.
        what: String,
    },

    /// The core is already owned by another client.
    #[error("{core} is already in use by another client")]
    Busy {
        /// Core that was requested.
        core: String,
    },

    /// The core exists but its owning subsystem has not finished
    /// initializing. Retry later.
    #[error("core is not ready yet, retry later")]
    Deferred,

    /// Malformed or out-of-bound routing/table data.
    #[error("invalid format: {reason}")]
    InvalidFormat {
        /// Reason for rejection.
        reason: String,
    },

    /// A routing table from a different source is already installed.
    #[error("interrupt routing table already configured from another source")]
    AlreadyConfigured,

    /// Unknown vendor resource descriptor version.
    #[error("unsupported resource version {version} (only version 0 is accepted)")]
    UnsupportedVersion {
        /// Version tag found in the descriptor.
        version: u32,
    },

    /// No viable virtqueue notification path at start time.
    #[error("virtio vring interrupt mechanisms are not provided")]
    MisconfiguredTransport,

    /// Register bus unreachable. Not retried, surfaced immediately.
    #[error("register access failed: {reason}")]
    Fatal {
        /// Reason for failure.
        reason: String,
    },
}

impl PrussError {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a busy error for a core.
    pub fn busy(core: impl Into<String>) -> Self {
        Self::Busy { core: core.into() }
    }

    /// Create an invalid-format error.
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Create a fatal register-bus error.
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the operation later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Deferred)
    }
}
