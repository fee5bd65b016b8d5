use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};
use crate::sink::{FormatText, TextSink};

/// A single dimension size.
pub type Dim = u32;

const DELIMITER: char = 'x';

/// Largest dimension accepted by [`parse_shape`]; dims are signed 32-bit.
pub const MAX_DIM: Dim = i32::MAX as Dim;

/// Rank implied by the text of a shape: 0 when empty, otherwise one more than
/// the number of `x` delimiters. Token values are not inspected.
pub fn shape_rank(value: &str) -> usize {
    if value.is_empty() {
        return 0;
    }
    1 + value.matches(DELIMITER).count()
}

/// Parses `2x3x4` into `out`, returning the rank.
///
/// The rank is checked against `out.len()` before any token is parsed, so
/// passing an empty slice is a cheap rank query: the `ShapeCapacity` error
/// carries the rank the caller has to provide room for.
pub fn parse_shape(value: &str, out: &mut [Dim]) -> Result<usize> {
    let rank = shape_rank(value);
    if rank == 0 {
        return Ok(0);
    }
    if rank > out.len() {
        return Err(CodecError::ShapeCapacity {
            required_rank: rank,
            capacity: out.len(),
        });
    }

    let mut dim_index = 0;
    for token in value.split(DELIMITER) {
        if token.is_empty() {
            break;
        }
        out[dim_index] = parse_dim(token, dim_index, value)?;
        dim_index += 1;
    }
    if dim_index != rank {
        return Err(CodecError::MalformedShape(value.to_string()));
    }
    Ok(rank)
}

fn parse_dim(token: &str, index: usize, input: &str) -> Result<Dim> {
    let invalid = || CodecError::InvalidDim {
        index,
        token: token.to_string(),
        input: input.to_string(),
    };
    let value: i64 = token.parse().map_err(|_| invalid())?;
    if value < 0 {
        return Err(CodecError::NegativeDim {
            index,
            value,
            input: input.to_string(),
        });
    }
    if value > MAX_DIM as i64 {
        return Err(invalid());
    }
    Dim::try_from(value).map_err(|_| invalid())
}

fn write_dims(dims: &[Dim], sink: &mut TextSink<'_>) -> Result<()> {
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            sink.push_str("x");
        }
        sink.push_display(d)?;
    }
    Ok(())
}

/// Formats `dims` joined by `x` into `sink`, returning the full length.
/// An empty shape formats as the empty string.
pub fn format_shape(dims: &[Dim], sink: &mut TextSink<'_>) -> Result<usize> {
    write_dims(dims, sink)?;
    sink.finish()
}

impl FormatText for [Dim] {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        write_dims(self, sink)
    }
}

/// An owned shape, for callers that would rather not manage a dimension
/// buffer themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    pub fn new(dims: Vec<Dim>) -> Self {
        Shape { dims }
    }

    /// Scalar (rank 0) shape.
    pub fn scalar() -> Self {
        Shape { dims: Vec::new() }
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Parses shape text, sizing the dimension vector with a rank query first.
    pub fn parse(value: &str) -> Result<Shape> {
        let rank = match parse_shape(value, &mut []) {
            Ok(rank) => rank,
            Err(CodecError::ShapeCapacity { required_rank, .. }) => required_rank,
            Err(e) => return Err(e),
        };
        let mut dims = vec![0; rank];
        parse_shape(value, &mut dims)?;
        Ok(Shape { dims })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl FromStr for Shape {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Shape::parse(s)
    }
}

impl FormatText for Shape {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()> {
        write_dims(&self.dims, sink)
    }
}

impl From<Vec<Dim>> for Shape {
    fn from(dims: Vec<Dim>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[Dim]> for Shape {
    fn from(dims: &[Dim]) -> Self {
        Shape::new(dims.to_vec())
    }
}
