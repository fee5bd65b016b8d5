use thiserror::Error;

use crate::element_type::ElementType;

/// Coarse classification of a [`CodecError`].
///
/// Callers doing size queries match on `OutOfRange` and retry with a larger
/// buffer; `InvalidArgument` means the input text itself must be fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfRange,
    FailedPrecondition,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unhandled element type prefix in '{0}'")]
    UnknownTypePrefix(String),
    #[error("out of range bit count in '{0}'")]
    InvalidBitCount(String),
    #[error("shape[{index}] invalid value '{token}' of '{input}'")]
    InvalidDim {
        index: usize,
        token: String,
        input: String,
    },
    #[error("shape[{index}] unsupported value {value} of '{input}'")]
    NegativeDim {
        index: usize,
        value: i64,
        input: String,
    },
    #[error("invalid shape specification: '{0}'")]
    MalformedShape(String),
    #[error("shape rank {required_rank} exceeds capacity {capacity}")]
    ShapeCapacity {
        required_rank: usize,
        capacity: usize,
    },
    #[error("invalid {element_type} element '{text}'")]
    InvalidElement {
        text: String,
        element_type: ElementType,
    },
    #[error("binary hex element length mismatch: got {actual} characters, expected {expected}")]
    HexLengthMismatch { expected: usize, actual: usize },
    #[error("element type {0} has zero byte width")]
    ZeroWidthElement(ElementType),
    #[error("data span underflow: length={length} < required={required}")]
    SpanTooShort { length: usize, required: usize },
    #[error("output data buffer overflow: element_capacity={capacity} < {attempted}+")]
    ElementOverflow { capacity: usize, attempted: usize },
    #[error("input data string underflow: parsed={parsed} < element_capacity={capacity}")]
    ElementUnderflow { parsed: usize, capacity: usize },
    #[error("output truncated: required {required} bytes, wrote {written}")]
    OutputTruncated { required: usize, written: usize },
    #[error("buffer element {index}: {source}")]
    AtElement {
        index: usize,
        #[source]
        source: Box<CodecError>,
    },
    #[error("invalid buffer view '{0}': expected SHAPExTYPE=ELEMENTS")]
    MalformedBufferView(String),
    #[error("formatting primitive failed: {0}")]
    Format(#[from] std::fmt::Error),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnknownTypePrefix(_)
            | CodecError::InvalidBitCount(_)
            | CodecError::InvalidDim { .. }
            | CodecError::NegativeDim { .. }
            | CodecError::MalformedShape(_)
            | CodecError::InvalidElement { .. }
            | CodecError::HexLengthMismatch { .. }
            | CodecError::ZeroWidthElement(_)
            | CodecError::MalformedBufferView(_) => ErrorKind::InvalidArgument,
            CodecError::ShapeCapacity { .. }
            | CodecError::SpanTooShort { .. }
            | CodecError::ElementOverflow { .. }
            | CodecError::ElementUnderflow { .. }
            | CodecError::OutputTruncated { .. } => ErrorKind::OutOfRange,
            CodecError::AtElement { source, .. } => source.kind(),
            CodecError::Format(_) => ErrorKind::FailedPrecondition,
        }
    }

    /// The true output length carried by a truncated format, if any.
    pub fn required_length(&self) -> Option<usize> {
        match self {
            CodecError::OutputTruncated { required, .. } => Some(*required),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
