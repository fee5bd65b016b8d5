use std::os::raw::c_char;

use tt_codec::ErrorKind;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TTStatus {
    Ok = 0,
    InvalidArgument = 1,
    /// Output capacity too small, input too short, or a data span too short.
    /// Formatting calls still report the full required length.
    OutOfRange = 2,
    FailedPrecondition = 3,
    /// A panic was caught at the boundary.
    Internal = 4,
}

impl From<ErrorKind> for TTStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidArgument => TTStatus::InvalidArgument,
            ErrorKind::OutOfRange => TTStatus::OutOfRange,
            ErrorKind::FailedPrecondition => TTStatus::FailedPrecondition,
        }
    }
}

/// One shape dimension, as stored by the codec.
pub type TTDim = u32;

/// Borrowed UTF-8 text of `size` bytes; need not be NUL-terminated.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TTStringView {
    pub data: *const c_char,
    pub size: usize,
}

/// Mutable caller-owned bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TTByteSpan {
    pub data: *mut u8,
    pub data_length: usize,
}

/// Read-only caller-owned bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TTConstByteSpan {
    pub data: *const u8,
    pub data_length: usize,
}
