mod error;
mod types;

pub use error::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::c_char;

use tt_codec::{
    format_buffer_elements, format_element, format_element_type, format_shape, parse_buffer_elements,
    parse_element, parse_shape, CodecError, ElementType, TextSink,
};

/// Execute a closure that returns a `TTStatus`, catching any panics
/// and converting them into `TTStatus::Internal`.
fn catch_panic<F: FnOnce() -> TTStatus>(f: F) -> TTStatus {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            TTStatus::Internal
        }
    }
}

fn invalid(msg: &str) -> TTStatus {
    set_last_error(msg.to_string());
    TTStatus::InvalidArgument
}

/// Borrow the text behind a string view.
unsafe fn view_str<'a>(view: TTStringView) -> Result<&'a str, TTStatus> {
    if view.size == 0 {
        return Ok("");
    }
    if view.data.is_null() {
        return Err(invalid("string view data is null"));
    }
    let bytes = std::slice::from_raw_parts(view.data as *const u8, view.size);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(format!("invalid UTF-8 text: {}", e));
        TTStatus::InvalidArgument
    })
}

unsafe fn byte_span<'a>(span: TTByteSpan) -> Result<&'a mut [u8], TTStatus> {
    if span.data_length == 0 {
        return Ok(&mut []);
    }
    if span.data.is_null() {
        return Err(invalid("byte span data is null"));
    }
    Ok(std::slice::from_raw_parts_mut(span.data, span.data_length))
}

unsafe fn const_byte_span<'a>(span: TTConstByteSpan) -> Result<&'a [u8], TTStatus> {
    if span.data_length == 0 {
        return Ok(&[]);
    }
    if span.data.is_null() {
        return Err(invalid("byte span data is null"));
    }
    Ok(std::slice::from_raw_parts(span.data, span.data_length))
}

unsafe fn dims<'a>(shape: *const TTDim, shape_rank: usize) -> Result<&'a [TTDim], TTStatus> {
    if shape_rank == 0 {
        return Ok(&[]);
    }
    if shape.is_null() {
        return Err(invalid("shape is null"));
    }
    Ok(std::slice::from_raw_parts(shape, shape_rank))
}

/// Run a formatter against a caller buffer.
///
/// A null `buffer` is a size query. Otherwise the text is NUL-terminated, so
/// at most `buffer_capacity - 1` bytes of text are written and a capacity of
/// 0 is always `OutOfRange`. The full text
/// length is stored in `*out_buffer_length` whether or not it fit.
unsafe fn write_text_output(
    buffer: *mut c_char,
    buffer_capacity: usize,
    out_buffer_length: *mut usize,
    format: impl FnOnce(&mut TextSink<'_>) -> tt_codec::Result<usize>,
) -> TTStatus {
    if !out_buffer_length.is_null() {
        *out_buffer_length = 0;
    }
    let store_length = |len: usize| {
        if !out_buffer_length.is_null() {
            *out_buffer_length = len;
        }
    };

    if buffer.is_null() {
        let mut sink = TextSink::query();
        return match format(&mut sink) {
            Ok(len) => {
                store_length(len);
                TTStatus::Ok
            }
            Err(e) => error::report(&e),
        };
    }

    let bytes = std::slice::from_raw_parts_mut(buffer as *mut u8, buffer_capacity);
    let text_capacity = buffer_capacity.saturating_sub(1);
    let (result, written) = {
        let mut sink = TextSink::new(&mut bytes[..text_capacity]);
        let result = format(&mut sink);
        (result, sink.written_len())
    };
    if buffer_capacity > 0 {
        bytes[written] = 0;
    }
    // Without room for the terminator even empty text does not fit.
    let result = match result {
        Ok(len) if buffer_capacity == 0 => Err(CodecError::OutputTruncated {
            required: len,
            written: 0,
        }),
        other => other,
    };
    match result {
        Ok(len) => {
            store_length(len);
            TTStatus::Ok
        }
        Err(e) => {
            if let Some(required) = e.required_length() {
                store_length(required);
            }
            error::report(&e)
        }
    }
}

/// Parse shape text such as `2x3x4` into `out_shape`.
///
/// The rank is always written to `*out_shape_rank`, including when it
/// exceeds `shape_capacity`; pass a capacity of 0 to query the rank.
#[no_mangle]
pub unsafe extern "C" fn tt_parse_shape(
    value: TTStringView,
    shape_capacity: usize,
    out_shape: *mut TTDim,
    out_shape_rank: *mut usize,
) -> TTStatus {
    catch_panic(|| {
        if out_shape_rank.is_null() {
            return invalid("out_shape_rank is null");
        }
        unsafe { *out_shape_rank = 0 };
        let value = match unsafe { view_str(value) } {
            Ok(v) => v,
            Err(status) => return status,
        };
        let out: &mut [TTDim] = if shape_capacity == 0 {
            &mut []
        } else if out_shape.is_null() {
            return invalid("out_shape is null");
        } else {
            unsafe { std::slice::from_raw_parts_mut(out_shape, shape_capacity) }
        };
        match parse_shape(value, out) {
            Ok(rank) => {
                unsafe { *out_shape_rank = rank };
                TTStatus::Ok
            }
            Err(e) => {
                if let CodecError::ShapeCapacity { required_rank, .. } = e {
                    unsafe { *out_shape_rank = required_rank };
                }
                error::report(&e)
            }
        }
    })
}

/// Format `shape_rank` dimensions as `AxBxC`.
#[no_mangle]
pub unsafe extern "C" fn tt_format_shape(
    shape: *const TTDim,
    shape_rank: usize,
    buffer_capacity: usize,
    buffer: *mut c_char,
    out_buffer_length: *mut usize,
) -> TTStatus {
    catch_panic(|| {
        let shape = match unsafe { dims(shape, shape_rank) } {
            Ok(s) => s,
            Err(status) => return status,
        };
        unsafe {
            write_text_output(buffer, buffer_capacity, out_buffer_length, |sink| {
                format_shape(shape, sink)
            })
        }
    })
}

/// Parse an element type tag such as `f32` into its packed form.
#[no_mangle]
pub unsafe extern "C" fn tt_parse_element_type(value: TTStringView, out_element_type: *mut u32) -> TTStatus {
    catch_panic(|| {
        if out_element_type.is_null() {
            return invalid("out_element_type is null");
        }
        unsafe { *out_element_type = 0 };
        let value = match unsafe { view_str(value) } {
            Ok(v) => v,
            Err(status) => return status,
        };
        match ElementType::parse(value) {
            Ok(t) => {
                unsafe { *out_element_type = t.to_bits() };
                TTStatus::Ok
            }
            Err(e) => error::report(&e),
        }
    })
}

/// Format a packed element type as its tag.
#[no_mangle]
pub unsafe extern "C" fn tt_format_element_type(
    element_type: u32,
    buffer_capacity: usize,
    buffer: *mut c_char,
    out_buffer_length: *mut usize,
) -> TTStatus {
    catch_panic(|| unsafe {
        write_text_output(buffer, buffer_capacity, out_buffer_length, |sink| {
            format_element_type(ElementType::from_bits(element_type), sink)
        })
    })
}

/// Parse one element into the start of `data`.
#[no_mangle]
pub unsafe extern "C" fn tt_parse_element(value: TTStringView, element_type: u32, data: TTByteSpan) -> TTStatus {
    catch_panic(|| {
        let (value, data) = match unsafe { (view_str(value), byte_span(data)) } {
            (Ok(v), Ok(d)) => (v, d),
            (Err(status), _) | (_, Err(status)) => return status,
        };
        match parse_element(value, ElementType::from_bits(element_type), data) {
            Ok(()) => TTStatus::Ok,
            Err(e) => error::report(&e),
        }
    })
}

/// Format the element at the start of `data`.
#[no_mangle]
pub unsafe extern "C" fn tt_format_element(
    data: TTConstByteSpan,
    element_type: u32,
    buffer_capacity: usize,
    buffer: *mut c_char,
    out_buffer_length: *mut usize,
) -> TTStatus {
    catch_panic(|| {
        let data = match unsafe { const_byte_span(data) } {
            Ok(d) => d,
            Err(status) => return status,
        };
        unsafe {
            write_text_output(buffer, buffer_capacity, out_buffer_length, |sink| {
                format_element(data, ElementType::from_bits(element_type), sink)
            })
        }
    })
}

/// Parse whitespace/comma/bracket separated elements into all of `data`,
/// broadcasting a single element.
#[no_mangle]
pub unsafe extern "C" fn tt_parse_buffer_elements(
    value: TTStringView,
    element_type: u32,
    data: TTByteSpan,
) -> TTStatus {
    catch_panic(|| {
        let (value, data) = match unsafe { (view_str(value), byte_span(data)) } {
            (Ok(v), Ok(d)) => (v, d),
            (Err(status), _) | (_, Err(status)) => return status,
        };
        match parse_buffer_elements(value, ElementType::from_bits(element_type), data) {
            Ok(()) => TTStatus::Ok,
            Err(e) => error::report(&e),
        }
    })
}

/// Format `data` as nested bracket groups, emitting at most
/// `max_element_count` elements.
#[no_mangle]
pub unsafe extern "C" fn tt_format_buffer_elements(
    data: TTConstByteSpan,
    shape: *const TTDim,
    shape_rank: usize,
    element_type: u32,
    max_element_count: usize,
    buffer_capacity: usize,
    buffer: *mut c_char,
    out_buffer_length: *mut usize,
) -> TTStatus {
    catch_panic(|| {
        let (data, shape) = match unsafe { (const_byte_span(data), dims(shape, shape_rank)) } {
            (Ok(d), Ok(s)) => (d, s),
            (Err(status), _) | (_, Err(status)) => return status,
        };
        unsafe {
            write_text_output(buffer, buffer_capacity, out_buffer_length, |sink| {
                format_buffer_elements(
                    data,
                    shape,
                    ElementType::from_bits(element_type),
                    max_element_count,
                    sink,
                )
            })
        }
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error on this
/// thread, or null if there is none. The caller must free the returned
/// string with `tt_free_string`.
#[no_mangle]
pub extern "C" fn tt_last_error() -> *mut c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by `tt_last_error`.
#[no_mangle]
pub unsafe extern "C" fn tt_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
