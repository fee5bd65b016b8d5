//! `tt-codec` - Text codec for typed tensor buffers.
//!
//! This crate provides:
//! - Element type tags (`i32`, `u8`, `f16`, `*8`) via [`ElementType`]
//! - Shape text (`2x3x4`) via [`parse_shape`] / [`format_shape`]
//! - Single elements to and from raw bytes, with a hex fallback for opaque types
//! - Whole buffers: broadcast-aware parsing and nested, budget-limited formatting
//! - The combined `2x3xi32=1 2 3 4 5 6` buffer view form
//!
//! Nothing here allocates on the parse/format paths: callers own every byte
//! buffer. Formatters write through a [`TextSink`], which can be a size query
//! (no buffer) or a fixed-capacity buffer, and always report the full length
//! of the output even when it did not fit.

pub mod buffer;
pub mod buffer_view;
pub mod config;
pub mod element;
pub mod element_type;
pub mod error;
pub mod shape;
pub mod sink;

// Re-export primary types at the crate root for convenience.
pub use buffer::{buffer_byte_length, format_buffer_elements, parse_buffer_elements, BufferElements};
pub use buffer_view::{format_buffer_view, parse_buffer_view, parse_buffer_view_header, BufferView, BufferViewHeader};
pub use config::{FormatOptions, DEFAULT_MAX_ELEMENT_COUNT};
pub use element::{format_element, parse_element, ElementText};
pub use element_type::{format_element_type, parse_element_type, ElementType, NumericalKind};
pub use error::{CodecError, ErrorKind, Result};
pub use shape::{format_shape, parse_shape, shape_rank, Dim, Shape, MAX_DIM};
pub use sink::{FormatText, TextSink};
