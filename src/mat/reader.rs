//! MAT-file level 5 decoder.
//!
//! Handles both byte orders, zlib-compressed elements, and the numeric,
//! char, cell, and struct array classes. Sparse and object arrays are
//! rejected with [`MatError::Unsupported`].

use super::error::MatError;
use super::types::{
    CellArray, CharArray, MatArray, MatFile, NumericArray, NumericClass, StructArray,
};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::path::Path;

pub(crate) const HEADER_LEN: usize = 128;
pub(crate) const HEADER_TEXT_LEN: usize = 116;

// Data element types (mi*)
pub(crate) const MI_INT8: u32 = 1;
pub(crate) const MI_UINT8: u32 = 2;
pub(crate) const MI_INT16: u32 = 3;
pub(crate) const MI_UINT16: u32 = 4;
pub(crate) const MI_INT32: u32 = 5;
pub(crate) const MI_UINT32: u32 = 6;
pub(crate) const MI_SINGLE: u32 = 7;
pub(crate) const MI_DOUBLE: u32 = 9;
pub(crate) const MI_INT64: u32 = 12;
pub(crate) const MI_UINT64: u32 = 13;
pub(crate) const MI_MATRIX: u32 = 14;
pub(crate) const MI_COMPRESSED: u32 = 15;
pub(crate) const MI_UTF8: u32 = 16;
pub(crate) const MI_UTF16: u32 = 17;
pub(crate) const MI_UTF32: u32 = 18;

// Array classes (mx*) that are not numeric
pub(crate) const MX_CELL: u8 = 1;
pub(crate) const MX_STRUCT: u8 = 2;
const MX_OBJECT: u8 = 3;
pub(crate) const MX_CHAR: u8 = 4;
const MX_SPARSE: u8 = 5;

pub(crate) const FLAG_COMPLEX: u32 = 0x0800;

/// Byte order declared by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big => BigEndian::read_u16(b),
        }
    }

    fn i16(self, b: &[u8]) -> i16 {
        match self {
            Endian::Little => LittleEndian::read_i16(b),
            Endian::Big => BigEndian::read_i16(b),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big => BigEndian::read_u32(b),
        }
    }

    fn i32(self, b: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(b),
            Endian::Big => BigEndian::read_i32(b),
        }
    }

    fn u64(self, b: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(b),
            Endian::Big => BigEndian::read_u64(b),
        }
    }

    fn i64(self, b: &[u8]) -> i64 {
        match self {
            Endian::Little => LittleEndian::read_i64(b),
            Endian::Big => BigEndian::read_i64(b),
        }
    }

    fn f32(self, b: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(b),
            Endian::Big => BigEndian::read_f32(b),
        }
    }

    fn f64(self, b: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(b),
            Endian::Big => BigEndian::read_f64(b),
        }
    }
}

/// One tagged data element with its payload.
struct Element<'a> {
    data_type: u32,
    payload: &'a [u8],
}

/// Sequential reader over a buffer of tagged elements.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], MatError> {
        if n > self.remaining() {
            return Err(MatError::Truncated(context));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn next_element(&mut self, context: &'static str) -> Result<Element<'a>, MatError> {
        let tag = self.take(4, context)?;
        let first = self.endian.u32(tag);

        // Small data element: byte count packed into the upper half of the tag.
        if first >> 16 != 0 {
            let data_type = first & 0xFFFF;
            let size = (first >> 16) as usize;
            if size > 4 {
                return Err(MatError::Malformed(format!(
                    "small element of type {data_type} claims {size} bytes"
                )));
            }
            let packed = self.take(4, context)?;
            return Ok(Element {
                data_type,
                payload: &packed[..size],
            });
        }

        let size_bytes = self.take(4, context)?;
        let size = self.endian.u32(size_bytes) as usize;
        let payload = self.take(size, context)?;

        // Compressed elements are not padded.
        if first != MI_COMPRESSED {
            let pad = (8 - size % 8) % 8;
            self.pos += pad.min(self.remaining());
        }

        Ok(Element {
            data_type: first,
            payload,
        })
    }
}

/// Read and decode a MAT file from disk.
pub fn read_mat_file(path: impl AsRef<Path>) -> Result<MatFile, MatError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_mat(&bytes)
}

/// Decode a MAT file held in memory.
pub fn parse_mat(bytes: &[u8]) -> Result<MatFile, MatError> {
    if bytes.len() < HEADER_LEN {
        return Err(MatError::Truncated("file header"));
    }
    let header = &bytes[..HEADER_LEN];

    let endian = match &header[126..128] {
        b"IM" => Endian::Little,
        b"MI" => Endian::Big,
        other => {
            return Err(MatError::Unsupported(format!(
                "endian indicator {:?} is not a level 5 MAT file",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let version = endian.u16(&header[124..126]);
    if version == 0x0200 {
        return Err(MatError::Unsupported(
            "MAT v7.3 (HDF5) files are not supported".to_string(),
        ));
    }
    if version != 0x0100 {
        tracing::debug!("Unexpected MAT header version {version:#06x}, decoding anyway");
    }

    let header_text = String::from_utf8_lossy(&header[..HEADER_TEXT_LEN])
        .trim_end_matches([' ', '\0'])
        .to_string();

    let mut file = MatFile {
        header_text,
        ..Default::default()
    };

    let mut cursor = Cursor::new(&bytes[HEADER_LEN..], endian);
    while cursor.remaining() >= 8 {
        let element = cursor.next_element("top-level element")?;
        match element.data_type {
            MI_COMPRESSED => {
                let inflated = inflate(element.payload)?;
                let mut inner = Cursor::new(&inflated, endian);
                let matrix = inner.next_element("compressed element")?;
                if matrix.data_type != MI_MATRIX {
                    tracing::debug!(
                        "Skipping compressed element of type {}",
                        matrix.data_type
                    );
                    continue;
                }
                let (name, array) = parse_matrix(matrix.payload, endian)?;
                file.variables.insert(name, array);
            }
            MI_MATRIX => {
                let (name, array) = parse_matrix(element.payload, endian)?;
                file.variables.insert(name, array);
            }
            other => {
                tracing::debug!("Skipping top-level element of type {other}");
            }
        }
    }

    Ok(file)
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>, MatError> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| MatError::Malformed(format!("zlib stream: {e}")))?;
    Ok(out)
}

/// Decode the body of an `miMATRIX` element into its name and array.
fn parse_matrix(payload: &[u8], endian: Endian) -> Result<(String, MatArray), MatError> {
    // Zero-length matrix elements stand for empty arrays (e.g. empty cells).
    if payload.is_empty() {
        return Ok((
            String::new(),
            MatArray::Numeric(NumericArray {
                class: NumericClass::Double,
                dims: vec![0, 0],
                data: Vec::new(),
            }),
        ));
    }

    let mut cursor = Cursor::new(payload, endian);

    let flags = cursor.next_element("array flags")?;
    if flags.payload.len() < 4 {
        return Err(MatError::Malformed("array flags too short".to_string()));
    }
    let flags_word = endian.u32(&flags.payload[..4]);
    let class = (flags_word & 0xFF) as u8;
    let complex = flags_word & FLAG_COMPLEX != 0;

    let dims_element = cursor.next_element("dimensions")?;
    let dims = decode_dims(&dims_element, endian)?;
    let count = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| MatError::Malformed(format!("dimensions {dims:?} overflow")))?;

    let name_element = cursor.next_element("array name")?;
    let name = String::from_utf8_lossy(name_element.payload).into_owned();

    let array = match class {
        MX_CELL => {
            // Every nested element needs at least an 8-byte tag.
            let mut cells = Vec::with_capacity(count.min(cursor.remaining() / 8));
            for _ in 0..count {
                let element = cursor.next_element("cell element")?;
                if element.data_type != MI_MATRIX {
                    return Err(MatError::Malformed(format!(
                        "cell element of type {}",
                        element.data_type
                    )));
                }
                cells.push(parse_matrix(element.payload, endian)?.1);
            }
            MatArray::Cell(CellArray { dims, cells })
        }
        MX_STRUCT => {
            let len_element = cursor.next_element("field name length")?;
            if len_element.payload.len() < 4 {
                return Err(MatError::Malformed("field name length".to_string()));
            }
            let name_len = endian.i32(&len_element.payload[..4]).max(0) as usize;
            let names_element = cursor.next_element("field names")?;
            let fields: Vec<String> = if name_len == 0 {
                Vec::new()
            } else {
                names_element
                    .payload
                    .chunks(name_len)
                    .map(|chunk| {
                        let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
                        String::from_utf8_lossy(&chunk[..end]).into_owned()
                    })
                    .collect()
            };

            let total = count.checked_mul(fields.len()).ok_or_else(|| {
                MatError::Malformed(format!("struct '{name}' has too many fields"))
            })?;
            let mut values = Vec::with_capacity(total.min(cursor.remaining() / 8));
            for _ in 0..total {
                let element = cursor.next_element("struct field")?;
                if element.data_type != MI_MATRIX {
                    return Err(MatError::Malformed(format!(
                        "struct field of type {}",
                        element.data_type
                    )));
                }
                values.push(parse_matrix(element.payload, endian)?.1);
            }
            MatArray::Struct(StructArray {
                dims,
                fields,
                values,
            })
        }
        MX_CHAR => {
            let chars = if count == 0 && cursor.remaining() == 0 {
                Vec::new()
            } else {
                let element = cursor.next_element("char data")?;
                decode_chars(&element, endian)?
            };
            if chars.len() != count {
                return Err(MatError::Malformed(format!(
                    "char array '{name}' holds {} characters for {count} slots",
                    chars.len()
                )));
            }
            MatArray::Char(CharArray { dims, chars })
        }
        MX_OBJECT => return Err(MatError::Unsupported("object arrays".to_string())),
        MX_SPARSE => return Err(MatError::Unsupported("sparse arrays".to_string())),
        code => {
            let numeric_class = NumericClass::from_code(code)
                .ok_or_else(|| MatError::Unsupported(format!("array class {code}")))?;
            if complex {
                return Err(MatError::Unsupported(format!(
                    "complex array '{name}'"
                )));
            }
            let data = if count == 0 && cursor.remaining() == 0 {
                Vec::new()
            } else {
                let element = cursor.next_element("real part")?;
                decode_numeric(&element, endian)?
            };
            if data.len() != count {
                return Err(MatError::Malformed(format!(
                    "array '{name}' holds {} values for dimensions {dims:?}",
                    data.len()
                )));
            }
            MatArray::Numeric(NumericArray {
                class: numeric_class,
                dims,
                data,
            })
        }
    };

    Ok((name, array))
}

fn decode_dims(element: &Element<'_>, endian: Endian) -> Result<Vec<usize>, MatError> {
    if element.data_type != MI_INT32 || element.payload.len() % 4 != 0 {
        return Err(MatError::Malformed(format!(
            "dimensions stored as type {} ({} bytes)",
            element.data_type,
            element.payload.len()
        )));
    }
    element
        .payload
        .chunks_exact(4)
        .map(|b| {
            let d = endian.i32(b);
            usize::try_from(d).map_err(|_| MatError::Malformed(format!("negative dimension {d}")))
        })
        .collect()
}

fn decode_numeric(element: &Element<'_>, endian: Endian) -> Result<Vec<f64>, MatError> {
    let p = element.payload;
    let values = match element.data_type {
        MI_INT8 => p.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 => p.iter().map(|&b| b as f64).collect(),
        MI_INT16 => p.chunks_exact(2).map(|b| endian.i16(b) as f64).collect(),
        MI_UINT16 => p.chunks_exact(2).map(|b| endian.u16(b) as f64).collect(),
        MI_INT32 => p.chunks_exact(4).map(|b| endian.i32(b) as f64).collect(),
        MI_UINT32 => p.chunks_exact(4).map(|b| endian.u32(b) as f64).collect(),
        MI_SINGLE => p.chunks_exact(4).map(|b| endian.f32(b) as f64).collect(),
        MI_DOUBLE => p.chunks_exact(8).map(|b| endian.f64(b)).collect(),
        MI_INT64 => p.chunks_exact(8).map(|b| endian.i64(b) as f64).collect(),
        MI_UINT64 => p.chunks_exact(8).map(|b| endian.u64(b) as f64).collect(),
        other => {
            return Err(MatError::Unsupported(format!(
                "numeric data stored as type {other}"
            )))
        }
    };
    Ok(values)
}

fn decode_chars(element: &Element<'_>, endian: Endian) -> Result<Vec<char>, MatError> {
    let p = element.payload;
    let chars = match element.data_type {
        // Plain uint8 character data is Latin-1.
        MI_UINT8 | MI_INT8 => p.iter().map(|&b| b as char).collect(),
        MI_UTF8 => String::from_utf8_lossy(p).chars().collect(),
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = p.chunks_exact(2).map(|b| endian.u16(b)).collect();
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        MI_UTF32 => p
            .chunks_exact(4)
            .map(|b| char::from_u32(endian.u32(b)).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        other => {
            return Err(MatError::Unsupported(format!(
                "char data stored as type {other}"
            )))
        }
    };
    Ok(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(endian: Endian) -> Vec<u8> {
        let mut h = vec![b' '; HEADER_TEXT_LEN];
        h[..6].copy_from_slice(b"MATLAB");
        h.extend_from_slice(&[0u8; 8]);
        match endian {
            Endian::Little => {
                h.extend_from_slice(&[0x00, 0x01]);
                h.extend_from_slice(b"IM");
            }
            Endian::Big => {
                h.extend_from_slice(&[0x01, 0x00]);
                h.extend_from_slice(b"MI");
            }
        }
        h
    }

    #[test]
    fn test_rejects_short_file() {
        assert!(matches!(parse_mat(&[0u8; 10]), Err(MatError::Truncated(_))));
    }

    #[test]
    fn test_rejects_hdf5_version() {
        let mut bytes = header(Endian::Little);
        bytes[124] = 0x00;
        bytes[125] = 0x02;
        assert!(matches!(parse_mat(&bytes), Err(MatError::Unsupported(_))));
    }

    #[test]
    fn test_header_only_file_has_no_variables() {
        let file = parse_mat(&header(Endian::Little)).unwrap();
        assert!(file.variables.is_empty());
        assert!(file.header_text.starts_with("MATLAB"));
    }

    #[test]
    fn test_big_endian_small_elements() {
        // A 1x1 int32 scalar named "x", written big-endian with small elements.
        let mut body = Vec::new();
        // flags: miUINT32, 8 bytes, class int32 (12)
        body.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 8, 0, 0, 0, 12, 0, 0, 0, 0]);
        // dims: miINT32, 8 bytes, [1, 1]
        body.extend_from_slice(&[0, 0, 0, 5, 0, 0, 0, 8, 0, 0, 0, 1, 0, 0, 0, 1]);
        // name: small element, 1 byte, miINT8
        body.extend_from_slice(&[0, 1, 0, 1, b'x', 0, 0, 0]);
        // data: small element, 4 bytes, miINT32, value -7
        body.extend_from_slice(&[0, 4, 0, 5]);
        body.extend_from_slice(&(-7i32).to_be_bytes());

        let mut bytes = header(Endian::Big);
        bytes.extend_from_slice(&MI_MATRIX.to_be_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        let file = parse_mat(&bytes).unwrap();
        let x = file.get("x").and_then(MatArray::as_numeric).unwrap();
        assert_eq!(x.class, NumericClass::Int32);
        assert_eq!(x.first(), Some(-7.0));
    }

    #[test]
    fn test_truncated_element_is_reported() {
        let mut bytes = header(Endian::Little);
        bytes.extend_from_slice(&MI_MATRIX.to_le_bytes());
        bytes.extend_from_slice(&64u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(parse_mat(&bytes), Err(MatError::Truncated(_))));
    }

    /// An `miMATRIX` cell body claiming `dims` with no cell elements.
    fn cell_header(dims: &[i32]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&MI_UINT32.to_le_bytes());
        body.extend_from_slice(&8u32.to_le_bytes());
        body.extend_from_slice(&(MX_CELL as u32).to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&MI_INT32.to_le_bytes());
        body.extend_from_slice(&((dims.len() * 4) as u32).to_le_bytes());
        for d in dims {
            body.extend_from_slice(&d.to_le_bytes());
        }
        body.resize(body.len() + (8 - body.len() % 8) % 8, 0);
        // Empty name
        body.extend_from_slice(&MI_INT8.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());

        let mut bytes = header(Endian::Little);
        bytes.extend_from_slice(&MI_MATRIX.to_le_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn test_huge_cell_dimensions_are_an_error() {
        let bytes = cell_header(&[i32::MAX, i32::MAX]);
        assert!(parse_mat(&bytes).is_err());

        let bytes = cell_header(&[i32::MAX, i32::MAX, i32::MAX]);
        assert!(matches!(parse_mat(&bytes), Err(MatError::Malformed(_))));

        let bytes = cell_header(&[i32::MAX, 3]);
        assert!(matches!(parse_mat(&bytes), Err(MatError::Truncated(_))));
    }
}
