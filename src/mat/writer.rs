//! Little-endian MAT-file level 5 encoder.
//!
//! Numeric arrays are always stored as `miDOUBLE` and char arrays as
//! `miUINT16`, whatever their declared class.

use super::error::MatError;
use super::reader::{
    HEADER_TEXT_LEN, MI_COMPRESSED, MI_DOUBLE, MI_INT32, MI_INT8, MI_MATRIX,
    MI_UINT16, MI_UINT32, MX_CELL, MX_CHAR, MX_STRUCT,
};
use super::types::MatArray;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

/// Struct field names are padded to this many bytes.
const FIELD_NAME_LEN: usize = 32;

/// Collects named variables and encodes them as one MAT file.
#[derive(Debug, Clone, Default)]
pub struct MatWriter {
    variables: Vec<(String, MatArray)>,
    compress: bool,
}

impl MatWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap every variable in a zlib-compressed element.
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Append a top-level variable.
    pub fn add(&mut self, name: impl Into<String>, array: MatArray) -> &mut Self {
        self.variables.push((name.into(), array));
        self
    }

    /// Encode the whole file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MatError> {
        let mut out = Vec::new();

        let mut text = format!(
            "MATLAB 5.0 MAT-file, Platform: rust, Created by: {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )
        .into_bytes();
        text.resize(HEADER_TEXT_LEN, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(&[0u8; 8]);
        out.write_u16::<LittleEndian>(0x0100)?;
        out.extend_from_slice(b"IM");

        for (name, array) in &self.variables {
            let matrix = encode_matrix(name, array)?;
            if self.compress {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&matrix)?;
                let packed = encoder.finish()?;
                out.write_u32::<LittleEndian>(MI_COMPRESSED)?;
                out.write_u32::<LittleEndian>(packed.len() as u32)?;
                out.extend_from_slice(&packed);
            } else {
                out.extend_from_slice(&matrix);
            }
        }

        Ok(out)
    }

    /// Encode and write to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), MatError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn push_element(out: &mut Vec<u8>, data_type: u32, payload: &[u8]) -> Result<(), MatError> {
    out.write_u32::<LittleEndian>(data_type)?;
    out.write_u32::<LittleEndian>(payload.len() as u32)?;
    out.extend_from_slice(payload);
    let pad = (8 - payload.len() % 8) % 8;
    out.resize(out.len() + pad, 0);
    Ok(())
}

/// Encode one complete `miMATRIX` element, tag included.
fn encode_matrix(name: &str, array: &MatArray) -> Result<Vec<u8>, MatError> {
    let class = match array {
        MatArray::Numeric(a) => a.class.code(),
        MatArray::Char(_) => MX_CHAR,
        MatArray::Cell(_) => MX_CELL,
        MatArray::Struct(_) => MX_STRUCT,
    };

    let mut body = Vec::new();

    let mut flags = Vec::with_capacity(8);
    flags.write_u32::<LittleEndian>(class as u32)?;
    flags.write_u32::<LittleEndian>(0)?;
    push_element(&mut body, MI_UINT32, &flags)?;

    let mut dims = Vec::new();
    for &d in array.dims() {
        let d = i32::try_from(d)
            .map_err(|_| MatError::Malformed(format!("dimension {d} exceeds int32")))?;
        dims.write_i32::<LittleEndian>(d)?;
    }
    push_element(&mut body, MI_INT32, &dims)?;

    push_element(&mut body, MI_INT8, name.as_bytes())?;

    match array {
        MatArray::Numeric(a) => {
            let mut data = Vec::with_capacity(a.data.len() * 8);
            for &v in &a.data {
                data.write_f64::<LittleEndian>(v)?;
            }
            push_element(&mut body, MI_DOUBLE, &data)?;
        }
        MatArray::Char(a) => {
            let mut data = Vec::with_capacity(a.chars.len() * 2);
            for &c in &a.chars {
                // One slot per character; characters outside the BMP degrade to '?'.
                let unit = u16::try_from(c as u32).unwrap_or(b'?' as u16);
                data.write_u16::<LittleEndian>(unit)?;
            }
            push_element(&mut body, MI_UINT16, &data)?;
        }
        MatArray::Cell(a) => {
            for cell in &a.cells {
                body.extend_from_slice(&encode_matrix("", cell)?);
            }
        }
        MatArray::Struct(a) => {
            let mut len = Vec::with_capacity(4);
            len.write_i32::<LittleEndian>(FIELD_NAME_LEN as i32)?;
            push_element(&mut body, MI_INT32, &len)?;

            let mut names = Vec::with_capacity(a.fields.len() * FIELD_NAME_LEN);
            for field in &a.fields {
                let mut bytes = field.as_bytes().to_vec();
                bytes.truncate(FIELD_NAME_LEN - 1);
                bytes.resize(FIELD_NAME_LEN, 0);
                names.extend_from_slice(&bytes);
            }
            push_element(&mut body, MI_INT8, &names)?;

            for value in &a.values {
                body.extend_from_slice(&encode_matrix("", value)?);
            }
        }
    }

    let mut element = Vec::with_capacity(body.len() + 8);
    push_element(&mut element, MI_MATRIX, &body)?;
    Ok(element)
}
