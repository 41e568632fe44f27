//! Data loading utilities

use crate::error::{AnalyticaError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Tokens read as missing in CSV/TSV input, in addition to empty fields
const NULL_TOKENS: &[&str] = &["NA", "N/A", "#N/A", "NaN", "nan", "-nan", "null", "NULL", "None"];

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    JsonLines,
    Excel,
}

impl FileFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            "json" => Ok(FileFormat::Json),
            "jsonl" | "ndjson" => Ok(FileFormat::JsonLines),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(FileFormat::Excel),
            _ => Err(AnalyticaError::DataError(format!(
                "Unsupported file format '{}' for {}; expected csv, tsv, parquet, json, jsonl or xlsx",
                ext,
                path.display()
            ))),
        }
    }
}

/// Data loader for various file formats
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used for CSV schema inference
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Set the number of rows used for CSV schema inference; `None` scans the whole file
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a delimited text file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>, separator: u8) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;

        let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());
        let parse_opts = CsvParseOptions::default()
            .with_separator(separator)
            .with_null_values(Some(null_values));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| AnalyticaError::DataError(e.to_string()))?;
        Ok(df)
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| AnalyticaError::DataError(e.to_string()))
    }

    /// Load a JSON array of records, or line-delimited records when `lines` is set
    pub fn load_json(&self, path: impl AsRef<Path>, lines: bool) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let format = if lines { JsonFormat::JsonLines } else { JsonFormat::Json };

        JsonReader::new(file)
            .with_json_format(format)
            .finish()
            .map_err(|e| AnalyticaError::DataError(e.to_string()))
    }

    /// Load the first worksheet of a spreadsheet; its first row holds the column names
    pub fn load_excel(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        std::fs::metadata(path)?;

        let mut workbook = open_workbook_auto(path).map_err(|e| AnalyticaError::DataError(e.to_string()))?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AnalyticaError::DataError(format!("{} has no worksheets", path.display())))?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| AnalyticaError::DataError(e.to_string()))?;

        sheet_to_frame(&range)
    }

    /// Detect file format from extension, load, and normalize missing values.
    ///
    /// Float cells holding `NaN` or an infinity become nulls, so "missing"
    /// has exactly one representation downstream.
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let format = FileFormat::from_path(path)?;

        let df = match format {
            FileFormat::Csv => self.load_csv(path, b',')?,
            FileFormat::Tsv => self.load_csv(path, b'\t')?,
            FileFormat::Parquet => self.load_parquet(path)?,
            FileFormat::Json => self.load_json(path, false)?,
            FileFormat::JsonLines => self.load_json(path, true)?,
            FileFormat::Excel => self.load_excel(path)?,
        };
        let df = normalize_non_finite(df)?;

        tracing::info!(
            path = %path.display(),
            ?format,
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        Ok(df)
    }
}

fn sheet_to_frame(range: &Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(j, cell)| {
            let name = match cell {
                Data::Empty => format!("column_{}", j),
                other => other.to_string(),
            };
            let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(j)).collect();
            Column::from(sheet_column(&name, &cells))
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// One typed series per worksheet column: integers, floats, booleans, or text
fn sheet_column(name: &str, cells: &[Option<&Data>]) -> Series {
    let present: Vec<&Data> = cells
        .iter()
        .flatten()
        .copied()
        .filter(|c| !matches!(c, Data::Empty | Data::Error(_)))
        .collect();

    if present.iter().all(|c| matches!(c, Data::Int(_))) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Int(v)) => Some(*v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else if present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Int(v)) => Some(*v as f64),
                Some(Data::Float(v)) => Some(*v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else if present.iter().all(|c| matches!(c, Data::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Bool(v)) => Some(*v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                None | Some(Data::Empty) | Some(Data::Error(_)) => None,
                Some(other) => Some(other.to_string()),
            })
            .collect();
        Series::new(name.into(), values)
    }
}

/// Replace non-finite values in float columns with nulls
pub fn normalize_non_finite(mut df: DataFrame) -> Result<DataFrame> {
    let float_columns: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::Float32 | DataType::Float64))
        .map(|c| c.name().clone())
        .collect();

    for name in float_columns {
        let series = df.column(name.as_str())?.as_materialized_series().cast(&DataType::Float64)?;
        let cleaned: Float64Chunked = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        df.with_column(cleaned.with_name(name).into_series())?;
    }

    Ok(df)
}
