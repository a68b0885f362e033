//! # Driver Status Taxonomy
//!
//! Every entry point returns `Result<_, VaError>`. The error maps one-to-one
//! onto a VA status code so a vtable shim can hand it straight back to libva.

use crate::backend::BackendError;
use crate::heap::HeapFull;
use crate::va::*;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VaError {
    #[error("operation failed")]
    OperationFailed,
    #[error("allocation failed")]
    AllocationFailed,
    #[error("invalid config")]
    InvalidConfig,
    #[error("invalid context")]
    InvalidContext,
    #[error("invalid surface")]
    InvalidSurface,
    #[error("invalid buffer")]
    InvalidBuffer,
    #[error("invalid image")]
    InvalidImage,
    #[error("attribute not supported")]
    AttrNotSupported,
    #[error("list argument exceeds maximum number")]
    MaxNumExceeded,
    #[error("unsupported profile")]
    UnsupportedProfile,
    #[error("unsupported entrypoint")]
    UnsupportedEntrypoint,
    #[error("unsupported RT format")]
    UnsupportedRtFormat,
    #[error("unsupported buffer type")]
    UnsupportedBufferType,
    #[error("flag not supported")]
    FlagNotSupported,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("resolution not supported")]
    ResolutionNotSupported,
    #[error("the requested function is not implemented")]
    Unimplemented,
    #[error("surface is in displaying")]
    SurfaceInDisplaying,
    #[error("invalid image format")]
    InvalidImageFormat,
    #[error("internal decoding error")]
    DecodingError,
    #[error("invalid value")]
    InvalidValue,
    #[error("unknown error")]
    Unknown,
}

impl VaError {
    /// The `va.h` status code for this error.
    pub fn status(&self) -> VAStatus {
        match self {
            Self::OperationFailed => VA_STATUS_ERROR_OPERATION_FAILED,
            Self::AllocationFailed => VA_STATUS_ERROR_ALLOCATION_FAILED,
            Self::InvalidConfig => VA_STATUS_ERROR_INVALID_CONFIG,
            Self::InvalidContext => VA_STATUS_ERROR_INVALID_CONTEXT,
            Self::InvalidSurface => VA_STATUS_ERROR_INVALID_SURFACE,
            Self::InvalidBuffer => VA_STATUS_ERROR_INVALID_BUFFER,
            Self::InvalidImage => VA_STATUS_ERROR_INVALID_IMAGE,
            Self::AttrNotSupported => VA_STATUS_ERROR_ATTR_NOT_SUPPORTED,
            Self::MaxNumExceeded => VA_STATUS_ERROR_MAX_NUM_EXCEEDED,
            Self::UnsupportedProfile => VA_STATUS_ERROR_UNSUPPORTED_PROFILE,
            Self::UnsupportedEntrypoint => VA_STATUS_ERROR_UNSUPPORTED_ENTRYPOINT,
            Self::UnsupportedRtFormat => VA_STATUS_ERROR_UNSUPPORTED_RT_FORMAT,
            Self::UnsupportedBufferType => VA_STATUS_ERROR_UNSUPPORTED_BUFFERTYPE,
            Self::FlagNotSupported => VA_STATUS_ERROR_FLAG_NOT_SUPPORTED,
            Self::InvalidParameter => VA_STATUS_ERROR_INVALID_PARAMETER,
            Self::ResolutionNotSupported => VA_STATUS_ERROR_RESOLUTION_NOT_SUPPORTED,
            Self::Unimplemented => VA_STATUS_ERROR_UNIMPLEMENTED,
            Self::SurfaceInDisplaying => VA_STATUS_ERROR_SURFACE_IN_DISPLAYING,
            Self::InvalidImageFormat => VA_STATUS_ERROR_INVALID_IMAGE_FORMAT,
            Self::DecodingError => VA_STATUS_ERROR_DECODING_ERROR,
            Self::InvalidValue => VA_STATUS_ERROR_INVALID_VALUE,
            Self::Unknown => VA_STATUS_ERROR_UNKNOWN,
        }
    }
}

impl From<VaError> for VAStatus {
    fn from(err: VaError) -> Self {
        err.status()
    }
}

impl From<HeapFull> for VaError {
    fn from(_: HeapFull) -> Self {
        VaError::AllocationFailed
    }
}

/// Collapse an entry point result into the status code libva expects.
pub fn status_of<T>(result: &Result<T, VaError>) -> VAStatus {
    match result {
        Ok(_) => VA_STATUS_SUCCESS,
        Err(e) => e.status(),
    }
}

/// Log a back-end failure and replace it with the status the caller sees.
pub(crate) fn backend_failure(err: BackendError, status: VaError) -> VaError {
    tracing::warn!("{} -> {:?}", err, status);
    status
}

/// Keep the first error of a best-effort sequence.
pub(crate) fn keep_first(first: &mut Option<VaError>, result: Result<(), VaError>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(VaError::UnsupportedProfile.status(), 0x0c);
        assert_eq!(VaError::FlagNotSupported.status(), 0x11);
        assert_eq!(VaError::Unknown.status(), -1);
        assert_eq!(status_of(&Ok::<(), VaError>(())), VA_STATUS_SUCCESS);
        assert_eq!(status_of::<()>(&Err(VaError::DecodingError)), 0x17);
    }

    #[test]
    fn test_keep_first() {
        let mut first = None;
        keep_first(&mut first, Ok(()));
        keep_first(&mut first, Err(VaError::InvalidSurface));
        keep_first(&mut first, Err(VaError::OperationFailed));
        assert_eq!(first, Some(VaError::InvalidSurface));
    }
}
