//! Unified error type definition

use cloudsync_client::{ClientError, GatewayError, StoreKind};
use thiserror::Error;

/// Rejected onboarding transitions.
///
/// A rejected event leaves the workflow exactly where it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    /// A second flow was started while one is still in progress
    #[error("An onboarding flow is already in progress")]
    AlreadyActive,

    /// The current step is waiting for a remote response
    #[error("Still waiting for the remote service")]
    Busy,

    /// No flow has been started
    #[error("No onboarding flow is in progress")]
    NotActive,

    /// The event has no meaning in the current step
    #[error("Cannot {event} while {state}")]
    IllegalTransition {
        state: &'static str,
        event: &'static str,
    },

    /// Only `duracloud` and `fedora` stores can be onboarded
    #[error("Unsupported store type: {0}")]
    UnsupportedKind(StoreKind),

    /// A required value is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Confirming before both provider account and space are chosen
    #[error("No {0} selected")]
    MissingSelection(&'static str),

    #[error("Unknown provider account: {0}")]
    UnknownProvider(String),

    #[error("Unknown space: {0}")]
    UnknownSpace(String),

    /// The store payload could not be encoded
    #[error("Invalid store payload: {0}")]
    InvalidPayload(String),
}

/// Core layer error type
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A request to the service failed (already reported to a failure handler)
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// Payload encoding or client construction failed
    #[error("{0}")]
    Client(#[from] ClientError),

    /// The built-in object set (id 1) can never be deleted
    #[error("The default object set cannot be deleted")]
    DefaultSetProtected,

    /// A required value is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    Onboarding(#[from] OnboardingError),
}

impl CoreError {
    /// 是否为预期行为（用户输入错误、4xx 等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_expected(),
            Self::Client(ClientError::Gateway(e)) => e.is_expected(),
            Self::Client(_) => false,
            Self::DefaultSetProtected | Self::MissingField(_) | Self::Onboarding(_) => true,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
