//! Export spreadsheet tables as JSON.
//!
//! Every `.xlsx` workbook in a directory becomes a `.json` file holding an
//! array with one object per data row. The first row of the first sheet is
//! the header and supplies the object keys, which keep the column order.
//!
//! ```json
//! [
//!     {
//!         "id": 1,
//!         "name": "Knife",
//!         "tags": [
//!             "melee",
//!             "light"
//!         ]
//!     }
//! ]
//! ```
//!
//! Non-ASCII text is written as-is.

use crate::{
    files::{self, BatchReport, OutputClaims},
    AssetError, Result,
};
use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use log::info;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Number, Serializer, Value};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    #[allow(missing_docs)]
    Empty,
    #[allow(missing_docs)]
    Bool(bool),
    #[allow(missing_docs)]
    Int(i64),
    /// A number with a fractional part. Date and time cells land here too,
    /// as Excel serial day numbers (days since 1899-12-30, time of day as
    /// the fraction), not as epoch milliseconds.
    Float(f64),
    #[allow(missing_docs)]
    Text(String),
    /// Ordered list of strings, produced by splitting multi-line text.
    Lines(Vec<String>),
}

impl Cell {
    // Dates stay Excel serials, see `Cell::Float`.
    fn from_data(data: &Data) -> Cell {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::Bool(b) => Cell::Bool(*b),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => number_cell(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) => Cell::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }

    /// The cell rendered as plain text. `None` for empty cells.
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Lines(lines) => Some(lines.join("\n")),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Lines(lines) => {
                Value::Array(lines.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

// Spreadsheets store every number as a double; whole numbers are exported
// as integers.
fn number_cell(value: f64) -> Cell {
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Cell::Int(value as i64)
    } else {
        Cell::Float(value)
    }
}

fn split_text(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}

/// A table with a header row.
///
/// Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table. Rows shorter than the header are padded with
    /// [Cell::Empty], longer rows are cut.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Build a table from a worksheet range. The first row is the header.
    ///
    /// Empty header cells are named `Unnamed: <column>` and repeated names
    /// get a `.1`, `.2`, ... suffix so that every key is unique. Rows with
    /// no values at all are left out. Date cells become [Cell::Float]
    /// serial day numbers.
    pub fn from_range(range: &Range<Data>) -> Self {
        let mut source_rows = range.rows();
        let header = match source_rows.next() {
            Some(header) => header,
            None => return Table::new(Vec::new(), Vec::new()),
        };
        let columns = unique_columns(header);
        let rows = source_rows
            .filter(|row| row.iter().any(|data| !matches!(data, Data::Empty)))
            .map(|row| row.iter().map(Cell::from_data).collect())
            .collect();
        Table::new(columns, rows)
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, without the header.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Replace every text cell containing a line break with the list of its
    /// lines. Other cells are left untouched.
    pub fn split_lines(&mut self) {
        for cell in self.rows.iter_mut().flatten() {
            if let Cell::Text(text) = cell {
                if text.contains('\n') {
                    *cell = Cell::Lines(split_text(text));
                }
            }
        }
    }

    /// Turn every column whose name contains `marker` into a list column.
    ///
    /// Blank cells become an empty list, multi-line text is split into its
    /// lines and any other value becomes a list with one element.
    pub fn apply_array_columns(&mut self, marker: &str) {
        let array_columns: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(marker))
            .map(|(idx, _)| idx)
            .collect();
        for row in &mut self.rows {
            for &idx in &array_columns {
                let lines = match &row[idx] {
                    Cell::Lines(_) => continue,
                    cell => match cell.text() {
                        Some(text) if text.trim().is_empty() => Vec::new(),
                        Some(text) => split_text(&text),
                        None => Vec::new(),
                    },
                };
                row[idx] = Cell::Lines(lines);
            }
        }
    }

    /// The table as a JSON array of row objects.
    pub fn to_json(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Cell::to_json))
                    .collect();
                Value::Object(object)
            })
            .collect();
        Value::Array(rows)
    }
}

fn unique_columns(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, data)| {
            let base = match Cell::from_data(data).text() {
                Some(name) if !name.is_empty() => name,
                _ => format!("Unnamed: {}", idx),
            };
            let mut name = base.clone();
            let mut suffix = 0;
            while seen.contains(&name) {
                suffix += 1;
                name = format!("{}.{}", base, suffix);
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

/// Read the first sheet of the `.xlsx` workbook at `path`.
pub fn read_workbook(path: &Path) -> Result<Table> {
    let workbook_error = |message: String| AssetError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook::<Xlsx<_>, _>(path)
        .map_err(|err: XlsxError| workbook_error(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("workbook has no sheets".to_string()))?
        .map_err(|err: XlsxError| workbook_error(err.to_string()))?;
    Ok(Table::from_range(&range))
}

/// Serialize `value` with four space indentation.
pub fn to_pretty_json(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut output = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut output, formatter);
    value.serialize(&mut serializer)?;
    Ok(output)
}

/// Write `value` to `path` as indented UTF-8 JSON.
pub fn write_json(value: &Value, path: &Path) -> Result<()> {
    let bytes = to_pretty_json(value).map_err(|source| AssetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, bytes).map_err(|err| AssetError::io(path, err))
}

/// Is `path` a workbook that should be exported?
///
/// Office keeps lock files named `~$<name>.xlsx` next to open workbooks;
/// anything starting with `~` is skipped.
pub fn is_workbook(path: &Path) -> bool {
    let temporary = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.starts_with('~'));
    !temporary && files::has_extension(path, &["xlsx"])
}

/// Configuration of [export_dir].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory with the workbooks. Not searched recursively.
    pub input_dir: PathBuf,
    /// Where the JSON files are written. Created if missing. May be the
    /// same as `input_dir`.
    pub output_dir: PathBuf,
    /// Split multi-line text cells into lists.
    pub split_lines: bool,
    /// Columns whose name contains this string always hold lists.
    pub array_marker: Option<String>,
}

impl ExportOptions {
    /// Check the input directory and create the output directory.
    pub fn validate(&self) -> Result<()> {
        files::require_dir(&self.input_dir, "input directory")?;
        if let Some(marker) = &self.array_marker {
            if marker.is_empty() {
                return Err(AssetError::InvalidConfig(
                    "array marker must not be empty".to_string(),
                ));
            }
        }
        files::ensure_dir(&self.output_dir, "output directory")
    }
}

/// Export one workbook to `<output_dir>/<stem>.json`.
pub fn export_file(path: &Path, options: &ExportOptions) -> Result<PathBuf> {
    let mut table = read_workbook(path)?;
    if let Some(marker) = &options.array_marker {
        table.apply_array_columns(marker);
    }
    if options.split_lines {
        table.split_lines();
    }

    let output = files::output_path(&options.output_dir, path, "json")?;
    write_json(&table.to_json(), &output)?;
    info!(
        "Exported {} -> {} ({} rows)",
        path.display(),
        output.display(),
        table.rows().len()
    );
    Ok(output)
}

/// Export every workbook directly inside `options.input_dir`.
pub fn export_dir(options: &ExportOptions) -> Result<BatchReport> {
    options.validate()?;
    let sources = files::list_files(&options.input_dir, is_workbook)?;

    let mut report = BatchReport::default();
    let mut claims = OutputClaims::default();
    for source in &sources {
        let outcome = files::output_path(&options.output_dir, source, "json")
            .and_then(|output| claims.claim(output, source))
            .and_then(|()| export_file(source, options))
            .map(|output| vec![output]);
        report.record(source, outcome);
    }
    info!(
        "Export finished: {} tables written, {} failed",
        report.processed,
        report.failures.len()
    );
    Ok(report)
}
