// Licensed under the Apache-2.0 license

use num_enum::{FromPrimitive, IntoPrimitive};
use thiserror::Error;

/// Base of the global error codes.
pub const NRF_ERROR_BASE_NUM: u32 = 0x0;

/// Status code returned on success.
pub const NRF_SUCCESS: u32 = NRF_ERROR_BASE_NUM;

pub type MbrResult<T> = Result<T, MbrError>;

/// Non-zero status codes returned through the SVC interface.
///
/// The MBR only produces `Internal`, `InvalidState`, `InvalidLength`, `Null`, `Forbidden`
/// and, for malformed requests, `InvalidParam` and `InvalidAddr`. The remaining global
/// codes are kept so that any value from the call converts losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum MbrError {
    #[error("SVC handler is missing")]
    SvcHandlerMissing = 1,
    #[error("SoftDevice has not been enabled")]
    SoftdeviceNotEnabled = 2,
    #[error("internal error")]
    Internal = 3,
    #[error("no memory for operation")]
    NoMem = 4,
    #[error("not found")]
    NotFound = 5,
    #[error("not supported")]
    NotSupported = 6,
    #[error("invalid parameter")]
    InvalidParam = 7,
    #[error("invalid state, operation disallowed in this state")]
    InvalidState = 8,
    #[error("invalid length")]
    InvalidLength = 9,
    #[error("invalid flags")]
    InvalidFlags = 10,
    #[error("invalid data")]
    InvalidData = 11,
    #[error("invalid data size")]
    DataSize = 12,
    #[error("operation timed out")]
    Timeout = 13,
    #[error("null pointer or memory blocks not equal")]
    Null = 14,
    #[error("forbidden operation")]
    Forbidden = 15,
    #[error("bad memory address")]
    InvalidAddr = 16,
    #[error("busy")]
    Busy = 17,
    #[error("unrecognized status code {0:#x}")]
    #[num_enum(catch_all)]
    Unknown(u32),
}

impl MbrError {
    /// Maps a raw status code to a result. `NRF_SUCCESS` is `Ok(())`.
    pub fn check(status: u32) -> MbrResult<()> {
        if status == NRF_SUCCESS {
            Ok(())
        } else {
            Err(MbrError::from(status))
        }
    }

    /// The raw status code for this error.
    pub fn code(self) -> u32 {
        self.into()
    }

    /// The `nrf_error.h` name of this error.
    pub fn name(self) -> &'static str {
        match self {
            MbrError::SvcHandlerMissing => "NRF_ERROR_SVC_HANDLER_MISSING",
            MbrError::SoftdeviceNotEnabled => "NRF_ERROR_SOFTDEVICE_NOT_ENABLED",
            MbrError::Internal => "NRF_ERROR_INTERNAL",
            MbrError::NoMem => "NRF_ERROR_NO_MEM",
            MbrError::NotFound => "NRF_ERROR_NOT_FOUND",
            MbrError::NotSupported => "NRF_ERROR_NOT_SUPPORTED",
            MbrError::InvalidParam => "NRF_ERROR_INVALID_PARAM",
            MbrError::InvalidState => "NRF_ERROR_INVALID_STATE",
            MbrError::InvalidLength => "NRF_ERROR_INVALID_LENGTH",
            MbrError::InvalidFlags => "NRF_ERROR_INVALID_FLAGS",
            MbrError::InvalidData => "NRF_ERROR_INVALID_DATA",
            MbrError::DataSize => "NRF_ERROR_DATA_SIZE",
            MbrError::Timeout => "NRF_ERROR_TIMEOUT",
            MbrError::Null => "NRF_ERROR_NULL",
            MbrError::Forbidden => "NRF_ERROR_FORBIDDEN",
            MbrError::InvalidAddr => "NRF_ERROR_INVALID_ADDR",
            MbrError::Busy => "NRF_ERROR_BUSY",
            MbrError::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Returns the `nrf_error.h` name for any status code, including `NRF_SUCCESS`.
pub fn status_name(status: u32) -> &'static str {
    match MbrError::check(status) {
        Ok(()) => "NRF_SUCCESS",
        Err(e) => e.name(),
    }
}
