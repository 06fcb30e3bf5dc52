//! Error types for `hwinput_core`.
//!
//! Every failure along the resolve -> encode -> submit path is funnelled
//! through [`InjectionError`].  None of them is retried: a request that hits
//! an error stops where it is and nothing further is submitted.

use thiserror::Error;

/// Top-level error type for the `hwinput_core` library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// A logical key token could not be resolved.  Raised before any record
    /// of the request reaches the input queue.
    #[error("ParseError: {0}")]
    ParseError(String),

    /// The OS input queue accepted zero records.  `code` is the platform
    /// last-error value captured immediately after the failed call.
    #[error("PlatformSubmissionError: input rejected by the OS (error code {code})")]
    PlatformSubmissionError { code: u32 },

    /// A key-state query returned the neutral response.
    #[error("StateQueryError: key state for virtual key 0x{vk:02X} could not be read")]
    StateQueryError { vk: u16 },

    /// Invalid pacing or pointer parameters.
    #[error("ArgumentError: {0}")]
    ArgumentError(String),

    /// Virtual desktop metrics were unusable (zero or negative extent).
    #[error("MetricsError: {0}")]
    MetricsError(String),

    /// The target element exposes no clickable point.
    #[error("NoClickablePoint: {0}")]
    NoClickablePoint(String),

    /// COM / UI Automation failure while locating an element.
    #[error("ComError: {0}")]
    ComError(String),
}

/// Convert a `windows::core::Error` (COM / Win32 HRESULT failure) into an
/// `InjectionError::ComError`.
#[cfg(windows)]
impl From<windows::core::Error> for InjectionError {
    fn from(err: windows::core::Error) -> Self {
        InjectionError::ComError(format!("Windows COM error: {err}"))
    }
}
