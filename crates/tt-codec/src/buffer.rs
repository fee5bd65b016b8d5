//! Whole-buffer parsing and formatting.
//!
//! Buffers are row-major: the last dimension varies fastest.

use crate::config::FormatOptions;
use crate::element::{decode_element, element_width, write_element};
use crate::element_type::ElementType;
use crate::error::{CodecError, Result};
use crate::shape::Dim;
use crate::sink::{FormatText, TextSink};

/// Bytes needed to store a dense buffer of `shape`, or `None` on overflow.
pub fn buffer_byte_length(shape: &[Dim], element_type: ElementType) -> Option<usize> {
    shape
        .iter()
        .try_fold(element_type.byte_width(), |acc, &d| acc.checked_mul(d as usize))
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

fn is_separator(c: char) -> bool {
    is_space(c) || matches!(c, ',' | '[' | ']')
}

/// Parses element literals from `value` into `data`.
///
/// Literals are separated by any run of whitespace, commas and brackets, so
/// nesting in the text is ignored. Blank text zero-fills `data`. A single
/// literal is broadcast to every element. Otherwise the literal count must
/// match `data.len() / byte_width` exactly.
pub fn parse_buffer_elements(value: &str, element_type: ElementType, data: &mut [u8]) -> Result<()> {
    let width = element_width(element_type)?;
    let capacity = data.len() / width;

    if value.trim_matches(is_space).is_empty() {
        log::trace!("blank element text; zero-filling {} bytes", data.len());
        data.fill(0);
        return Ok(());
    }

    let mut parsed = 0;
    for (index, token) in value.split(is_separator).filter(|t| !t.is_empty()).enumerate() {
        if index >= capacity {
            return Err(CodecError::ElementOverflow {
                capacity,
                attempted: index,
            });
        }
        let slot = &mut data[index * width..(index + 1) * width];
        decode_element(token, element_type, slot).map_err(|e| CodecError::AtElement {
            index,
            source: Box::new(e),
        })?;
        parsed = index + 1;
    }

    if parsed == 1 && capacity > 1 {
        log::debug!("splatting one {} element across {} slots", element_type, capacity);
        let (first, rest) = data.split_at_mut(width);
        for slot in rest.chunks_exact_mut(width) {
            slot.copy_from_slice(first);
        }
    } else if parsed < capacity {
        return Err(CodecError::ElementUnderflow { parsed, capacity });
    }
    Ok(())
}

/// Formats `data` as nested bracket groups into `sink`, returning the full
/// text length.
///
/// Each index of an outer dimension becomes one `[...]` group; the leaf
/// dimension is space-separated elements. No bracket pair wraps the whole
/// structure, so a 2x3 buffer reads `[a b c][d e f]`. At most
/// `max_element_count` elements are emitted in total; a leaf cut short by the
/// budget ends in `...`.
pub fn format_buffer_elements(
    data: &[u8],
    shape: &[Dim],
    element_type: ElementType,
    max_element_count: usize,
    sink: &mut TextSink<'_>,
) -> Result<usize> {
    let mut remaining = max_element_count;
    write_buffer_elements(data, shape, element_type, &mut remaining, sink)?;
    sink.finish()
}

/// Recursive worker. `remaining` is the element budget shared by every
/// level of the walk.
pub(crate) fn write_buffer_elements(
    data: &[u8],
    shape: &[Dim],
    element_type: ElementType,
    remaining: &mut usize,
    sink: &mut TextSink<'_>,
) -> Result<()> {
    match shape {
        [] => write_buffer_elements(data, &[1], element_type, remaining, sink),
        [len] => write_leaf(data, *len as usize, element_type, remaining, sink),
        [outer, inner @ ..] => {
            element_width(element_type)?;
            let too_short = || CodecError::SpanTooShort {
                length: data.len(),
                required: usize::MAX,
            };
            let stride = buffer_byte_length(inner, element_type).ok_or_else(too_short)?;
            let required = stride.checked_mul(*outer as usize).ok_or_else(too_short)?;
            if data.len() < required {
                return Err(CodecError::SpanTooShort {
                    length: data.len(),
                    required,
                });
            }
            for i in 0..*outer as usize {
                sink.push_str("[");
                let slice = &data[i * stride..(i + 1) * stride];
                write_buffer_elements(slice, inner, element_type, remaining, sink)?;
                sink.push_str("]");
            }
            Ok(())
        }
    }
}

fn write_leaf(
    data: &[u8],
    len: usize,
    element_type: ElementType,
    remaining: &mut usize,
    sink: &mut TextSink<'_>,
) -> Result<()> {
    let width = element_width(element_type)?;
    let count = (*remaining).min(len);
    let required = count * width;
    if data.len() < required {
        return Err(CodecError::SpanTooShort {
            length: data.len(),
            required,
        });
    }
    *remaining -= count;
    for (i, element) in data[..required].chunks_exact(width).enumerate() {
        if i > 0 {
            sink.push_str(" ");
        }
        write_element(element, element_type, sink)?;
    }
    if count < len {
        sink.push_str("...");
    }
    Ok(())
}

/// A borrowed typed buffer, formatted through [`FormatText`].
#[derive(Debug, Clone, Copy)]
pub struct BufferElements<'a> {
    data: &'a [u8],
    shape: &'a [Dim],
    element_type: ElementType,
    options: FormatOptions,
}

impl<'a> BufferElements<'a> {
    pub fn new(data: &'a [u8], shape: &'a [Dim], element_type: ElementType) -> Self {
        BufferElements {
            data,
            shape,
            element_type,
            options: FormatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn shape(&self) -> &'a [Dim] {
        self.shape
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn options(&self) -> FormatOptions {
        self.options
    }
}

impl FormatText for BufferElements<'_> {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        let mut remaining = self.options.max_element_count;
        write_buffer_elements(self.data, self.shape, self.element_type, &mut remaining, sink)?;
        if remaining == 0 {
            log::debug!(
                "element budget exhausted formatting {} buffer (max_element_count={})",
                self.element_type,
                self.options.max_element_count
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn format_all(data: &[u8], shape: &[Dim], t: ElementType, max: usize) -> String {
        BufferElements::new(data, shape, t)
            .with_options(FormatOptions::default().with_max_element_count(max))
            .to_text()
            .unwrap()
    }

    fn i32s(data: &[u8]) -> Vec<i32> {
        data.chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_buffer_byte_length() {
        assert_eq!(buffer_byte_length(&[], ElementType::F32), Some(4));
        assert_eq!(buffer_byte_length(&[2, 3], ElementType::I16), Some(12));
        assert_eq!(buffer_byte_length(&[4, 0], ElementType::I64), Some(0));
        assert_eq!(
            buffer_byte_length(&[Dim::MAX, Dim::MAX, Dim::MAX], ElementType::I64),
            None
        );
    }

    #[test]
    fn test_parse_splat() {
        let mut data = [0u8; 16];
        parse_buffer_elements("5", ElementType::I32, &mut data).unwrap();
        assert_eq!(i32s(&data), vec![5, 5, 5, 5]);
    }

    #[test]
    fn test_parse_splat_hex() {
        let mut data = [0u8; 6];
        parse_buffer_elements("[0a1b]", ElementType::opaque(16), &mut data).unwrap();
        assert_eq!(data, [0x0A, 0x1B, 0x0A, 0x1B, 0x0A, 0x1B]);
    }

    #[test]
    fn test_parse_splat_ignores_partial_tail() {
        let mut data = [0xEEu8; 5];
        parse_buffer_elements("-1", ElementType::I16, &mut data).unwrap();
        assert_eq!(data, [0xFF, 0xFF, 0xFF, 0xFF, 0xEE]);
    }

    #[test]
    fn test_parse_separators() {
        let mut data = [0u8; 6];
        parse_buffer_elements("[[1, 2,3]\n [4\t5 , 6]]", ElementType::I8, &mut data).unwrap();
        assert_eq!(data, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_blank_zero_fills() {
        let mut data = [9u8; 8];
        parse_buffer_elements("", ElementType::I32, &mut data).unwrap();
        assert_eq!(data, [0; 8]);

        let mut data = [9u8; 8];
        parse_buffer_elements(" \t\n ", ElementType::I32, &mut data).unwrap();
        assert_eq!(data, [0; 8]);
    }

    #[test]
    fn test_parse_overflow() {
        let mut data = [0u8; 2];
        let err = parse_buffer_elements("1 2 3", ElementType::U8, &mut data).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ElementOverflow {
                capacity: 2,
                attempted: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = parse_buffer_elements("1", ElementType::U8, &mut []).unwrap_err();
        assert!(matches!(err, CodecError::ElementOverflow { capacity: 0, .. }));
    }

    #[test]
    fn test_parse_underflow() {
        let mut data = [0u8; 3];
        let err = parse_buffer_elements("1 2", ElementType::U8, &mut data).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ElementUnderflow {
                parsed: 2,
                capacity: 3
            }
        ));
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = parse_buffer_elements(",[ ]", ElementType::U8, &mut data).unwrap_err();
        assert!(matches!(err, CodecError::ElementUnderflow { parsed: 0, .. }));
    }

    #[test]
    fn test_parse_single_element_buffer() {
        let mut data = [0u8; 4];
        parse_buffer_elements("[7]", ElementType::I32, &mut data).unwrap();
        assert_eq!(i32s(&data), vec![7]);
    }

    #[test]
    fn test_parse_bad_token_reports_index() {
        let mut data = [0u8; 3];
        let err = parse_buffer_elements("1 x 3", ElementType::U8, &mut data).unwrap_err();
        assert!(matches!(err, CodecError::AtElement { index: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_parse_zero_width_type() {
        let err = parse_buffer_elements("1", ElementType::opaque(0), &mut [0u8; 4]).unwrap_err();
        assert!(matches!(err, CodecError::ZeroWidthElement(_)));
    }

    #[test]
    fn test_format_scalar_and_vector() {
        assert_eq!(format_all(&[5], &[], ElementType::I8, 1024), "5");
        assert_eq!(format_all(&[1, 2, 3], &[3], ElementType::U8, 1024), "1 2 3");
    }

    #[test]
    fn test_format_nested() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(
            format_all(&data, &[2, 2, 2], ElementType::I8, 1024),
            "[[1 2][3 4]][[5 6][7 8]]"
        );
        assert_eq!(
            format_all(&data[..6], &[2, 3], ElementType::I8, 1024),
            "[1 2 3][4 5 6]"
        );
    }

    #[test]
    fn test_format_truncated_budget() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(format_all(&data, &[2, 3], ElementType::I8, 4), "[1 2 3][4...]");
        assert_eq!(format_all(&data, &[3, 2], ElementType::I8, 3), "[1 2][3...][...]");
        assert_eq!(format_all(&data, &[6], ElementType::I8, 0), "...");
    }

    #[test]
    fn test_truncation_emits_exact_budget() {
        let data: Vec<u8> = (0..24).collect();
        for max in [0usize, 1, 5, 11, 23] {
            let text = format_all(&data, &[2, 3, 4], ElementType::U8, max);
            let emitted = text
                .split(|c: char| c == '[' || c == ']' || c == ' ')
                .map(|t| t.trim_end_matches("..."))
                .filter(|t| !t.is_empty())
                .count();
            assert_eq!(emitted, max, "{text}");
            // Six leaves of four; every leaf not fully emitted carries a marker.
            let full_leaves = max / 4;
            assert_eq!(text.matches("...").count(), 6 - full_leaves, "{text}");
        }
    }

    #[test]
    fn test_format_empty_dims() {
        assert_eq!(format_all(&[], &[0], ElementType::I32, 1024), "");
        assert_eq!(format_all(&[], &[2, 0], ElementType::I32, 1024), "[][]");
    }

    #[test]
    fn test_format_span_too_short() {
        let err = format_buffer_elements(&[1, 2, 3], &[2, 2], ElementType::I8, 1024, &mut TextSink::query())
            .unwrap_err();
        assert!(matches!(err, CodecError::SpanTooShort { length: 3, required: 4 }));

        let err = format_buffer_elements(&[1, 2, 3], &[4], ElementType::I8, 1024, &mut TextSink::query())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        // The leaf only needs the elements the budget lets through.
        let mut sink = TextSink::query();
        assert_eq!(
            format_buffer_elements(&[1, 2, 3], &[4], ElementType::I8, 3, &mut sink).unwrap(),
            8
        );
    }

    #[test]
    fn test_format_two_phase_through_recursion() {
        let data: Vec<u8> = (0..12).map(|v| v * 10).collect();
        let shape: &[Dim] = &[2, 2, 3];
        let full = format_all(&data, shape, ElementType::U8, 1024);
        assert_eq!(full, "[[0 10 20][30 40 50]][[60 70 80][90 100 110]]");

        let mut query = TextSink::query();
        let required = format_buffer_elements(&data, shape, ElementType::U8, 1024, &mut query).unwrap();
        assert_eq!(required, full.len());

        for capacity in [0, 1, 5, 13, full.len() - 1] {
            let mut buf = vec![0u8; capacity];
            let mut sink = TextSink::new(&mut buf);
            let err = format_buffer_elements(&data, shape, ElementType::U8, 1024, &mut sink).unwrap_err();
            assert_eq!(err.required_length(), Some(full.len()));
            assert_eq!(sink.written(), &full.as_bytes()[..capacity]);
        }

        let mut buf = vec![0u8; full.len()];
        let n = format_buffer_elements(&data, shape, ElementType::U8, 1024, &mut TextSink::new(&mut buf)).unwrap();
        assert_eq!(&buf[..n], full.as_bytes());
    }

    #[test]
    fn test_format_then_parse_roundtrip() {
        let values: Vec<i32> = vec![-3, 0, 7, 1 << 20, -1, 42];
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let text = format_all(&data, &[3, 2], ElementType::I32, 1024);

        let mut parsed = vec![0u8; data.len()];
        parse_buffer_elements(&text, ElementType::I32, &mut parsed).unwrap();
        assert_eq!(parsed, data);
    }
}
