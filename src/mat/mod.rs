//! MATLAB level 5 MAT-file codec.
//!
//! The UniMiB SHAR raw release ships its matrices as `.mat` files. This
//! module decodes them into [`MatArray`] values and can write the subset of
//! the format needed to produce fixtures (numeric, char, cell, and struct
//! arrays).

mod error;
mod reader;
mod types;
mod writer;

pub use error::MatError;
pub use reader::{parse_mat, read_mat_file, Endian};
pub use types::{
    CellArray, CharArray, MatArray, MatFile, NumericArray, NumericClass, StructArray,
};
pub use writer::MatWriter;
