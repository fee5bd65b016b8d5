//! Single-element codec.
//!
//! Integer and float elements use their decimal text form; every other
//! element type is treated as opaque bytes written as pairs of hex digits,
//! most significant nibble first. Multi-byte numbers are little-endian.

use std::fmt::{self, Write};

use half::f16;

use crate::element_type::{ElementType, NumericalKind};
use crate::error::{CodecError, Result};
use crate::sink::{FormatText, TextSink};

/// Significant digits used for float output, as with C's `%G`.
const FLOAT_PRECISION: i32 = 6;

const HEX_DIGITS: &str = "0123456789ABCDEF";

/// Byte width of `element_type`, rejecting zero-width types.
pub(crate) fn element_width(element_type: ElementType) -> Result<usize> {
    match element_type.byte_width() {
        0 => Err(CodecError::ZeroWidthElement(element_type)),
        width => Ok(width),
    }
}

/// Parses one element from `value` into the first `byte_width` bytes of `out`.
pub fn parse_element(value: &str, element_type: ElementType, out: &mut [u8]) -> Result<()> {
    let width = element_width(element_type)?;
    if out.len() < width {
        return Err(CodecError::SpanTooShort {
            length: out.len(),
            required: width,
        });
    }
    decode_element(value, element_type, &mut out[..width])
}

/// Decodes into `out`, which the caller has sized to exactly one element.
pub(crate) fn decode_element(value: &str, element_type: ElementType, out: &mut [u8]) -> Result<()> {
    let invalid = || CodecError::InvalidElement {
        text: value.to_string(),
        element_type,
    };
    match (element_type.kind(), element_type.bit_count()) {
        // Narrow signed values are bounded above only; anything lower wraps.
        (NumericalKind::SignedInt, 8) => {
            let v = value.parse::<i32>().map_err(|_| invalid())?;
            if v > i8::MAX as i32 {
                return Err(invalid());
            }
            out.copy_from_slice(&(v as i8).to_le_bytes())
        }
        (NumericalKind::SignedInt, 16) => {
            let v = value.parse::<i32>().map_err(|_| invalid())?;
            if v > i16::MAX as i32 {
                return Err(invalid());
            }
            out.copy_from_slice(&(v as i16).to_le_bytes())
        }
        (NumericalKind::SignedInt, 32) => {
            out.copy_from_slice(&value.parse::<i32>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::SignedInt, 64) => {
            out.copy_from_slice(&value.parse::<i64>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::UnsignedInt, 8) => {
            out.copy_from_slice(&value.parse::<u8>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::UnsignedInt, 16) => {
            out.copy_from_slice(&value.parse::<u16>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::UnsignedInt, 32) => {
            out.copy_from_slice(&value.parse::<u32>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::UnsignedInt, 64) => {
            out.copy_from_slice(&value.parse::<u64>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::Float, 16) => {
            // Parsed at single precision, then rounded to nearest.
            let v = value.parse::<f32>().map_err(|_| invalid())?;
            out.copy_from_slice(&f16::from_f32(v).to_le_bytes())
        }
        (NumericalKind::Float, 32) => {
            out.copy_from_slice(&value.parse::<f32>().map_err(|_| invalid())?.to_le_bytes())
        }
        (NumericalKind::Float, 64) => {
            out.copy_from_slice(&value.parse::<f64>().map_err(|_| invalid())?.to_le_bytes())
        }
        _ => decode_hex(value, out)?,
    }
    Ok(())
}

fn decode_hex(value: &str, out: &mut [u8]) -> Result<()> {
    let expected = out.len() * 2;
    if value.len() != expected {
        return Err(CodecError::HexLengthMismatch {
            expected,
            actual: value.len(),
        });
    }
    for (byte, pair) in out.iter_mut().zip(value.as_bytes().chunks_exact(2)) {
        *byte = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
    }
    Ok(())
}

/// Characters outside `0-9A-Fa-f` decode as zero.
fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Formats the first element of `data` into `sink`, returning the full
/// length of its text.
pub fn format_element(data: &[u8], element_type: ElementType, sink: &mut TextSink<'_>) -> Result<usize> {
    write_element(data, element_type, sink)?;
    sink.finish()
}

pub(crate) fn write_element(data: &[u8], element_type: ElementType, sink: &mut TextSink<'_>) -> Result<()> {
    let width = element_width(element_type)?;
    if data.len() < width {
        return Err(CodecError::SpanTooShort {
            length: data.len(),
            required: width,
        });
    }
    let bytes = &data[..width];
    match (element_type.kind(), element_type.bit_count()) {
        (NumericalKind::SignedInt, 8) => sink.push_display(&i8::from_le_bytes(le(bytes))),
        (NumericalKind::SignedInt, 16) => sink.push_display(&i16::from_le_bytes(le(bytes))),
        (NumericalKind::SignedInt, 32) => sink.push_display(&i32::from_le_bytes(le(bytes))),
        (NumericalKind::SignedInt, 64) => sink.push_display(&i64::from_le_bytes(le(bytes))),
        (NumericalKind::UnsignedInt, 8) => sink.push_display(&bytes[0]),
        (NumericalKind::UnsignedInt, 16) => sink.push_display(&u16::from_le_bytes(le(bytes))),
        (NumericalKind::UnsignedInt, 32) => sink.push_display(&u32::from_le_bytes(le(bytes))),
        (NumericalKind::UnsignedInt, 64) => sink.push_display(&u64::from_le_bytes(le(bytes))),
        (NumericalKind::Float, 16) => write_general(sink, f16::from_le_bytes(le(bytes)).to_f64()),
        (NumericalKind::Float, 32) => write_general(sink, f32::from_le_bytes(le(bytes)) as f64),
        (NumericalKind::Float, 64) => write_general(sink, f64::from_le_bytes(le(bytes))),
        _ => {
            for &b in bytes {
                for nibble in [(b >> 4) as usize, (b & 0x0F) as usize] {
                    sink.push_str(&HEX_DIGITS[nibble..nibble + 1]);
                }
            }
            Ok(())
        }
    }
}

fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Writes `v` the way C's `%G` does: six significant digits, fixed notation
/// when the decimal exponent is in [-4, 6), scientific otherwise, trailing
/// zeros removed.
fn write_general(sink: &mut TextSink<'_>, v: f64) -> Result<()> {
    let sign = if v.is_sign_negative() { "-" } else { "" };
    if v.is_nan() {
        sink.push_str(sign);
        sink.push_str("NAN");
        return Ok(());
    }
    if v.is_infinite() {
        sink.push_str(sign);
        sink.push_str("INF");
        return Ok(());
    }
    if v == 0.0 {
        sink.push_str(sign);
        sink.push_str("0");
        return Ok(());
    }

    // The exponent is taken after rounding to the output precision.
    let mut scientific = StackText::<32>::new();
    write!(scientific, "{:.*E}", (FLOAT_PRECISION - 1) as usize, v)?;
    let (mantissa, exponent) = scientific.as_str().split_once('E').ok_or(fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;

    if (-4..FLOAT_PRECISION).contains(&exponent) {
        let mut fixed = StackText::<64>::new();
        write!(fixed, "{:.*}", (FLOAT_PRECISION - 1 - exponent) as usize, v)?;
        sink.push_str(strip_trailing_zeros(fixed.as_str()));
    } else {
        sink.push_str(strip_trailing_zeros(mantissa));
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        sink.push_display(&format_args!("E{}{:02}", exp_sign, exponent.unsigned_abs()))?;
    }
    Ok(())
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Fixed-capacity scratch text for float formatting.
struct StackText<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> StackText<N> {
    fn new() -> Self {
        StackText { buf: [0; N], len: 0 }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl<const N: usize> fmt::Write for StackText<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > N {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// One element's bytes paired with its type.
#[derive(Debug, Clone, Copy)]
pub struct ElementText<'a> {
    pub data: &'a [u8],
    pub element_type: ElementType,
}

impl<'a> ElementText<'a> {
    pub fn new(data: &'a [u8], element_type: ElementType) -> Self {
        ElementText { data, element_type }
    }
}

impl FormatText for ElementText<'_> {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        write_element(self.data, self.element_type, sink)
    }
}
