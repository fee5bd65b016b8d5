use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};
use crate::sink::{FormatText, TextSink};

/// How the bits of an element are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericalKind {
    /// Opaque bytes; parsed and formatted as hex.
    Unknown,
    SignedInt,
    UnsignedInt,
    /// IEEE 754 binary floating point.
    Float,
}

impl NumericalKind {
    fn code(self) -> u32 {
        match self {
            NumericalKind::Unknown => 0x00,
            NumericalKind::SignedInt => 0x01,
            NumericalKind::UnsignedInt => 0x02,
            NumericalKind::Float => 0x03,
        }
    }

    fn from_code(code: u32) -> NumericalKind {
        match code {
            0x01 => NumericalKind::SignedInt,
            0x02 => NumericalKind::UnsignedInt,
            0x03 => NumericalKind::Float,
            _ => NumericalKind::Unknown,
        }
    }
}

/// Element type: a numerical kind plus a bit width of up to 255 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementType {
    kind: NumericalKind,
    bit_count: u8,
}

impl ElementType {
    pub const I8: ElementType = ElementType::new(NumericalKind::SignedInt, 8);
    pub const I16: ElementType = ElementType::new(NumericalKind::SignedInt, 16);
    pub const I32: ElementType = ElementType::new(NumericalKind::SignedInt, 32);
    pub const I64: ElementType = ElementType::new(NumericalKind::SignedInt, 64);
    pub const U8: ElementType = ElementType::new(NumericalKind::UnsignedInt, 8);
    pub const U16: ElementType = ElementType::new(NumericalKind::UnsignedInt, 16);
    pub const U32: ElementType = ElementType::new(NumericalKind::UnsignedInt, 32);
    pub const U64: ElementType = ElementType::new(NumericalKind::UnsignedInt, 64);
    pub const F16: ElementType = ElementType::new(NumericalKind::Float, 16);
    pub const F32: ElementType = ElementType::new(NumericalKind::Float, 32);
    pub const F64: ElementType = ElementType::new(NumericalKind::Float, 64);

    pub const fn new(kind: NumericalKind, bit_count: u8) -> Self {
        ElementType { kind, bit_count }
    }

    /// An opaque element type of the given width.
    pub const fn opaque(bit_count: u8) -> Self {
        ElementType::new(NumericalKind::Unknown, bit_count)
    }

    pub fn kind(&self) -> NumericalKind {
        self.kind
    }

    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// Bytes occupied by one element, rounding partial bytes up.
    ///
    /// - i32: 4 bytes
    /// - i1: 1 byte
    /// - *12: 2 bytes
    pub fn byte_width(&self) -> usize {
        (self.bit_count as usize).div_ceil(8)
    }

    /// Packs the type as `(kind << 24) | bit_count`, the layout used at the
    /// C boundary.
    pub fn to_bits(&self) -> u32 {
        (self.kind.code() << 24) | self.bit_count as u32
    }

    /// Inverse of [`to_bits`](Self::to_bits). Unrecognized kind codes map to
    /// [`NumericalKind::Unknown`].
    pub fn from_bits(bits: u32) -> Self {
        ElementType {
            kind: NumericalKind::from_code(bits >> 24),
            bit_count: (bits & 0xFF) as u8,
        }
    }

    /// Parses a tag such as `i32`, `u8`, `f16`, `x4` or `*8`.
    pub fn parse(value: &str) -> Result<ElementType> {
        let (kind, digits) = if let Some(rest) = value.strip_prefix('i') {
            (NumericalKind::SignedInt, rest)
        } else if let Some(rest) = value.strip_prefix('u') {
            (NumericalKind::UnsignedInt, rest)
        } else if let Some(rest) = value.strip_prefix('f') {
            (NumericalKind::Float, rest)
        } else if let Some(rest) = value.strip_prefix('x').or_else(|| value.strip_prefix('*')) {
            (NumericalKind::Unknown, rest)
        } else {
            return Err(CodecError::UnknownTypePrefix(value.to_string()));
        };

        // u8's parser accepts a leading '+', which is not part of the grammar.
        if digits.starts_with('+') {
            return Err(CodecError::InvalidBitCount(value.to_string()));
        }
        let bit_count = digits
            .parse::<u8>()
            .map_err(|_| CodecError::InvalidBitCount(value.to_string()))?;
        Ok(ElementType::new(kind, bit_count))
    }

    fn prefix(&self) -> &'static str {
        match self.kind {
            NumericalKind::SignedInt => "i",
            NumericalKind::UnsignedInt => "u",
            NumericalKind::Float => "f",
            NumericalKind::Unknown => "*",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.bit_count)
    }
}

impl FromStr for ElementType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        ElementType::parse(s)
    }
}

impl FormatText for ElementType {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        sink.push_display(self)
    }
}

/// Parses an element type tag; see [`ElementType::parse`].
pub fn parse_element_type(value: &str) -> Result<ElementType> {
    ElementType::parse(value)
}

/// Formats `element_type` into `sink`, returning the full tag length.
pub fn format_element_type(element_type: ElementType, sink: &mut TextSink<'_>) -> Result<usize> {
    element_type.write_text(sink)?;
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_byte_width() {
        assert_eq!(ElementType::I8.byte_width(), 1);
        assert_eq!(ElementType::F16.byte_width(), 2);
        assert_eq!(ElementType::U32.byte_width(), 4);
        assert_eq!(ElementType::F64.byte_width(), 8);
        assert_eq!(ElementType::opaque(1).byte_width(), 1);
        assert_eq!(ElementType::opaque(12).byte_width(), 2);
        assert_eq!(ElementType::opaque(0).byte_width(), 0);
        assert_eq!(ElementType::opaque(255).byte_width(), 32);
    }

    #[test]
    fn test_parse_f16() {
        let t = ElementType::parse("f16").unwrap();
        assert_eq!(t.kind(), NumericalKind::Float);
        assert_eq!(t.bit_count(), 16);
        assert_eq!(t.to_string(), "f16");
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!("i32".parse::<ElementType>().unwrap(), ElementType::I32);
        assert_eq!("u64".parse::<ElementType>().unwrap(), ElementType::U64);
        assert_eq!("x8".parse::<ElementType>().unwrap(), ElementType::opaque(8));
        assert_eq!("*8".parse::<ElementType>().unwrap(), ElementType::opaque(8));
        assert_eq!("i255".parse::<ElementType>().unwrap().bit_count(), 255);
    }

    #[test]
    fn test_opaque_formats_with_star() {
        assert_eq!(ElementType::parse("x16").unwrap().to_string(), "*16");
    }

    #[test]
    fn test_parse_errors() {
        let err = ElementType::parse("q8").unwrap_err();
        assert!(matches!(err, CodecError::UnknownTypePrefix(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        for bad in ["", "i", "i256", "f-1", "u+8", "i3 2", "fp16"] {
            let err = ElementType::parse(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{bad}");
        }
    }

    #[test]
    fn test_text_roundtrip() {
        for kind in [
            NumericalKind::SignedInt,
            NumericalKind::UnsignedInt,
            NumericalKind::Float,
            NumericalKind::Unknown,
        ] {
            for bits in [0u8, 1, 8, 16, 32, 64, 100, 255] {
                let t = ElementType::new(kind, bits);
                assert_eq!(ElementType::parse(&t.to_string()).unwrap(), t);
            }
        }
    }

    #[test]
    fn test_bits_roundtrip() {
        assert_eq!(ElementType::F32.to_bits(), 0x0300_0020);
        assert_eq!(ElementType::from_bits(0x0100_0008), ElementType::I8);
        assert_eq!(ElementType::from_bits(0x7700_0010), ElementType::opaque(16));
        for t in [ElementType::U16, ElementType::F64, ElementType::opaque(4)] {
            assert_eq!(ElementType::from_bits(t.to_bits()), t);
        }
    }

    #[test]
    fn test_format_element_type_two_phase() {
        let required = ElementType::F16.required_length().unwrap();
        assert_eq!(required, 3);

        let mut small = [0u8; 2];
        let err = format_element_type(ElementType::F16, &mut TextSink::new(&mut small)).unwrap_err();
        assert_eq!(err.required_length(), Some(3));
        assert_eq!(&small, b"f1");

        let mut buf = [0u8; 3];
        let n = format_element_type(ElementType::F16, &mut TextSink::new(&mut buf)).unwrap();
        assert_eq!(&buf[..n], b"f16");
    }
}
