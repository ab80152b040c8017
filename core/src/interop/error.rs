//! Error types for native interop

use thiserror::Error;

/// Errors while locating native routines in the host image
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("malformed signature token '{token}' at position {position}")]
    MalformedSignature { token: String, position: usize },

    #[error("signature contains no bytes")]
    EmptySignature,

    #[error("invalid module image: {reason}")]
    InvalidImage { reason: &'static str },

    #[error("signature for {routine} not found in .text")]
    SignatureNotFound { routine: &'static str },

    #[error("read of {len} bytes at {address:#x} falls outside the module image")]
    OutOfBounds { address: usize, len: usize },

    #[error("{routine} resolved to a null address")]
    NullTarget { routine: &'static str },

    #[cfg(target_os = "windows")]
    #[error("failed to get the host module handle")]
    ModuleHandle(#[source] windows::core::Error),
}

/// Errors while bringing the hook layer up
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to resolve native routines")]
    Locate(#[from] LocateError),

    #[error("failed to install hook on {routine}: {reason}")]
    Install { routine: &'static str, reason: String },
}
