//! The combined `SHAPExTYPE=ELEMENTS` form, e.g. `2x3xi32=1 2 3 4 5 6`.
//!
//! The header before `=` is a shape followed by the element type tag as its
//! final `x`-delimited token; a header that is only a tag describes a scalar.

use crate::buffer::{buffer_byte_length, parse_buffer_elements, BufferElements};
use crate::config::FormatOptions;
use crate::element_type::ElementType;
use crate::error::{CodecError, Result};
use crate::shape::{parse_shape, Dim};
use crate::sink::{FormatText, TextSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferViewHeader<'a> {
    /// Dimensions written to the caller's shape buffer.
    pub rank: usize,
    pub element_type: ElementType,
    /// Unparsed element text after `=`.
    pub elements: &'a str,
}

/// Splits the header into shape text and type tag text.
fn split_header(header: &str) -> Option<(&str, &str)> {
    let Some(i) = header.rfind('x') else {
        return Some(("", header));
    };
    let (prefix, rest) = (&header[..i], &header[i + 1..]);
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        // An opaque tag spelled `xN`; the delimiter before it is separate.
        let tag = &header[i..];
        if prefix.is_empty() {
            Some(("", tag))
        } else {
            prefix.strip_suffix('x').map(|shape| (shape, tag))
        }
    } else if prefix.is_empty() {
        None
    } else {
        Some((prefix, rest))
    }
}

/// Parses the header of a buffer view, writing dimensions to `shape_out`.
/// As with [`parse_shape`], an undersized `shape_out` is `ShapeCapacity`.
pub fn parse_buffer_view_header<'a>(value: &'a str, shape_out: &mut [Dim]) -> Result<BufferViewHeader<'a>> {
    let malformed = || CodecError::MalformedBufferView(value.to_string());
    let (header, elements) = value.split_once('=').ok_or_else(malformed)?;
    let (shape_text, type_text) = split_header(header.trim()).ok_or_else(malformed)?;
    let rank = parse_shape(shape_text, shape_out)?;
    let element_type = ElementType::parse(type_text)?;
    Ok(BufferViewHeader {
        rank,
        element_type,
        elements,
    })
}

/// Parses a whole buffer view. The elements fill the leading
/// `shape x byte_width` bytes of `data`.
pub fn parse_buffer_view<'a>(
    value: &'a str,
    shape_out: &mut [Dim],
    data: &mut [u8],
) -> Result<BufferViewHeader<'a>> {
    let header = parse_buffer_view_header(value, shape_out)?;
    let required = buffer_byte_length(&shape_out[..header.rank], header.element_type).ok_or_else(|| {
        CodecError::SpanTooShort {
            length: data.len(),
            required: usize::MAX,
        }
    })?;
    if data.len() < required {
        return Err(CodecError::SpanTooShort {
            length: data.len(),
            required,
        });
    }
    parse_buffer_elements(header.elements, header.element_type, &mut data[..required])?;
    Ok(header)
}

/// A typed buffer formatted with its shape and type header.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    elements: BufferElements<'a>,
}

impl<'a> BufferView<'a> {
    pub fn new(data: &'a [u8], shape: &'a [Dim], element_type: ElementType) -> Self {
        BufferView {
            elements: BufferElements::new(data, shape, element_type),
        }
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.elements = self.elements.with_options(options);
        self
    }
}

impl FormatText for BufferView<'_> {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        let shape = self.elements.shape();
        if !shape.is_empty() {
            shape.write_text(sink)?;
            sink.push_str("x");
        }
        self.elements.element_type().write_text(sink)?;
        sink.push_str("=");
        self.elements.write_text(sink)
    }
}

/// Formats `data` as `SHAPExTYPE=ELEMENTS` into `sink`, returning the full
/// text length.
pub fn format_buffer_view(
    data: &[u8],
    shape: &[Dim],
    element_type: ElementType,
    options: FormatOptions,
    sink: &mut TextSink<'_>,
) -> Result<usize> {
    BufferView::new(data, shape, element_type)
        .with_options(options)
        .write_text(sink)?;
    sink.finish()
}
