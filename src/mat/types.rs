//! In-memory representation of decoded MAT-file arrays.
//!
//! MATLAB stores every array column-major. The accessors here take
//! `(row, col)` and do the index arithmetic so callers never have to.

use std::collections::BTreeMap;

/// Numeric storage classes that decode into [`NumericArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericClass {
    Double,
    Single,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
}

impl NumericClass {
    /// Map an `mx*_CLASS` code onto a numeric class.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            6 => NumericClass::Double,
            7 => NumericClass::Single,
            8 => NumericClass::Int8,
            9 => NumericClass::Uint8,
            10 => NumericClass::Int16,
            11 => NumericClass::Uint16,
            12 => NumericClass::Int32,
            13 => NumericClass::Uint32,
            14 => NumericClass::Int64,
            15 => NumericClass::Uint64,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        match self {
            NumericClass::Double => 6,
            NumericClass::Single => 7,
            NumericClass::Int8 => 8,
            NumericClass::Uint8 => 9,
            NumericClass::Int16 => 10,
            NumericClass::Uint16 => 11,
            NumericClass::Int32 => 12,
            NumericClass::Uint32 => 13,
            NumericClass::Int64 => 14,
            NumericClass::Uint64 => 15,
        }
    }
}

/// A real-valued numeric array, widened to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub class: NumericClass,
    pub dims: Vec<usize>,
    /// Column-major values
    pub data: Vec<f64>,
}

impl NumericArray {
    /// Build a double matrix from row-major rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for c in 0..n_cols {
            for row in rows {
                data.push(row.get(c).copied().unwrap_or(f64::NAN));
            }
        }
        Self {
            class: NumericClass::Double,
            dims: vec![n_rows, n_cols],
            data,
        }
    }

    /// A 1x1 double.
    pub fn scalar(value: f64) -> Self {
        Self {
            class: NumericClass::Double,
            dims: vec![1, 1],
            data: vec![value],
        }
    }

    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Number of columns; trailing dimensions beyond the second are folded in.
    pub fn cols(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.data.get(col * self.rows() + row).copied()
    }

    /// Copy one row out in column order.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.rows() {
            return None;
        }
        let rows = self.rows();
        Some((0..self.cols()).map(|c| self.data[c * rows + row]).collect())
    }

    /// The first element, as stored for 1x1 values.
    pub fn first(&self) -> Option<f64> {
        self.data.first().copied()
    }
}

/// A character array.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    /// Column-major characters
    pub chars: Vec<char>,
}

impl CharArray {
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            dims: vec![1, chars.len()],
            chars,
        }
    }

    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn cols(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    /// Read one row of the character matrix as a string.
    pub fn row_string(&self, row: usize) -> Option<String> {
        if row >= self.rows() {
            return None;
        }
        let rows = self.rows();
        Some((0..self.cols()).map(|c| self.chars[c * rows + row]).collect())
    }

    /// The text of the first row, or an empty string for an empty array.
    pub fn text(&self) -> String {
        self.row_string(0).unwrap_or_default()
    }
}

/// A cell array of nested arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims: Vec<usize>,
    /// Column-major cells
    pub cells: Vec<MatArray>,
}

impl CellArray {
    /// Build a cell array from row-major rows of cells.
    pub fn from_rows(rows: Vec<Vec<MatArray>>) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut columns: Vec<Vec<MatArray>> = (0..n_cols).map(|_| Vec::new()).collect();
        for row in rows {
            for (c, cell) in row.into_iter().enumerate().take(n_cols) {
                columns[c].push(cell);
            }
        }
        Self {
            dims: vec![n_rows, n_cols],
            cells: columns.into_iter().flatten().collect(),
        }
    }

    /// An n x 1 column of cells.
    pub fn column(cells: Vec<MatArray>) -> Self {
        Self {
            dims: vec![cells.len(), 1],
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn cols(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&MatArray> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.cells.get(col * self.rows() + row)
    }
}

/// A struct array; every element carries the same fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub dims: Vec<usize>,
    pub fields: Vec<String>,
    /// Element-major: element `e`, field `f` lives at `e * fields.len() + f`
    pub values: Vec<MatArray>,
}

impl StructArray {
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn field(&self, element: usize, name: &str) -> Option<&MatArray> {
        let f = self.fields.iter().position(|n| n == name)?;
        self.values.get(element * self.fields.len() + f)
    }
}

/// Any decoded array.
#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
}

impl MatArray {
    pub fn dims(&self) -> &[usize] {
        match self {
            MatArray::Numeric(a) => &a.dims,
            MatArray::Char(a) => &a.dims,
            MatArray::Cell(a) => &a.dims,
            MatArray::Struct(a) => &a.dims,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            MatArray::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<&CharArray> {
        match self {
            MatArray::Char(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            MatArray::Cell(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            MatArray::Struct(a) => Some(a),
            _ => None,
        }
    }

    /// Human-readable class name, used in error messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            MatArray::Numeric(_) => "numeric",
            MatArray::Char(_) => "char",
            MatArray::Cell(_) => "cell",
            MatArray::Struct(_) => "struct",
        }
    }
}

/// Top-level variables of one MAT file, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MatFile {
    pub header_text: String,
    pub variables: BTreeMap<String, MatArray>,
}

impl MatFile {
    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}
