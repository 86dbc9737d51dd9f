use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ByteRecord, StringRecord};
use tracing::debug;

use super::source::TableSource;
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;
use crate::errors::{LabelError, Result};

pub const DEFAULT_NULL_TOKEN: &str = "__NA__";

/// Dialect of the delimited files we read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Token standing in for missing string values.
    ///
    /// Missing numeric values are written as an empty field, and read from
    /// either an empty field or this token.
    pub null_token: String,
}

impl Default for TsvOptions {
    fn default() -> Self {
        TsvOptions {
            delimiter: b'\t',
            null_token: DEFAULT_NULL_TOKEN.to_string(),
        }
    }
}

/// A delimited file with a header row, read according to a declared schema.
///
/// Columns are matched to the header by name. Header columns not in the
/// schema are skipped.
#[derive(Debug, Clone)]
pub struct TsvSource {
    path: PathBuf,
    name: String,
    schema: Schema,
    options: TsvOptions,
}

impl TsvSource {
    pub fn new(path: impl Into<PathBuf>, schema: Schema, options: TsvOptions) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        TsvSource {
            path,
            name,
            schema,
            options,
        }
    }

    /// Read from any reader. Errors are reported against this source's path.
    pub fn read_from(&self, reader: impl Read) -> Result<Batch> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let positions = self.header_positions(&headers)?;

        let mut arrays: Vec<Array> = self
            .schema
            .fields()
            .map(|f| Array::with_capacity(f.datatype, 1024))
            .collect();

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            for ((array, &pos), name) in arrays.iter_mut().zip(&positions).zip(self.schema.names()) {
                let value = record.get(pos).unwrap_or("");
                push_value(array, value, &self.options.null_token).map_err(|datatype| {
                    LabelError::Execution(format!(
                        "Failed to parse '{value}' as {datatype} for column '{name}' at line {line} of '{}'",
                        self.name
                    ))
                })?;
            }
        }

        let batch = Batch::try_new(self.schema.clone(), arrays)?;
        debug!(path = %self.name, rows = batch.num_rows(), "read table");

        Ok(batch)
    }

    /// Index of each schema column in the header.
    fn header_positions(&self, headers: &StringRecord) -> Result<Vec<usize>> {
        let mut missing = Vec::new();
        let mut positions = Vec::with_capacity(self.schema.len());
        for name in self.schema.names() {
            match headers.iter().position(|h| h == name) {
                Some(pos) => positions.push(pos),
                None => missing.push(name),
            }
        }
        if !missing.is_empty() {
            return Err(LabelError::Execution(format!(
                "Columns declared in the schema are missing from the header of '{}': {}",
                self.name,
                missing.join(", ")
            )));
        }
        Ok(positions)
    }
}

impl TableSource for TsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn read(&self) -> Result<Batch> {
        let file = File::open(&self.path).map_err(|e| LabelError::io(&self.name, e))?;
        self.read_from(io::BufReader::new(file))
    }
}

/// Parse and append a single field. Returns the array's type on parse failure.
fn push_value(array: &mut Array, value: &str, null_token: &str) -> Result<(), DataType> {
    fn parse<T: FromStr>(value: &str, null_token: &str) -> Option<Option<T>> {
        if value.is_empty() || value == null_token {
            return Some(None);
        }
        value.trim().parse().ok().map(Some)
    }

    let datatype = array.datatype();
    let ok = match array {
        Array::Utf8(v) => {
            v.push((value != null_token).then(|| value.to_string()));
            true
        }
        Array::Boolean(v) => parse(value, null_token).map(|x| v.push(x)).is_some(),
        Array::Int32(v) => parse(value, null_token).map(|x| v.push(x)).is_some(),
        Array::Int64(v) => parse(value, null_token).map(|x| v.push(x)).is_some(),
        Array::Float32(v) => parse(value, null_token).map(|x| v.push(x)).is_some(),
        Array::Float64(v) => parse(value, null_token).map(|x| v.push(x)).is_some(),
    };

    if ok { Ok(()) } else { Err(datatype) }
}

/// Write a batch with a header row. Returns the number of data rows written.
///
/// The header is written even when the batch has no rows.
pub fn write_tsv<W: io::Write>(batch: &Batch, writer: W, options: &TsvOptions) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let mut record = ByteRecord::with_capacity(1024, batch.arrays().len());
    for name in batch.schema().names() {
        record.push_field(name.as_bytes());
    }
    csv_writer.write_byte_record(&record)?;

    for row in 0..batch.num_rows() {
        record.clear();
        for array in batch.arrays() {
            match array.format_value(row) {
                Some(value) => record.push_field(value.as_bytes()),
                None if array.datatype() == DataType::Utf8 => {
                    record.push_field(options.null_token.as_bytes())
                }
                None => record.push_field(b""),
            }
        }
        csv_writer.write_byte_record(&record)?;
    }

    csv_writer
        .flush()
        .map_err(|e| LabelError::io("output", e))?;

    Ok(batch.num_rows())
}

pub fn write_tsv_file(batch: &Batch, path: &Path, options: &TsvOptions) -> Result<usize> {
    let file = File::create(path).map_err(|e| LabelError::io(path.display().to_string(), e))?;
    let rows = write_tsv(batch, io::BufWriter::new(file), options)?;
    debug!(path = %path.display(), rows, "wrote table");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::field::Field;

    fn schema() -> Schema {
        Schema::try_new([
            Field::new("id", DataType::Utf8),
            Field::new("count", DataType::Int64),
            Field::new("freq", DataType::Float64),
        ])
        .unwrap()
    }

    fn source() -> TsvSource {
        TsvSource::new("test.tsv", schema(), TsvOptions::default())
    }

    #[test]
    fn read_with_nulls_and_extra_columns() {
        let input = "extra\tfreq\tid\tcount\nx\t0.5\tc1\t3\ny\t\t__NA__\t__NA__\n";
        let batch = source().read_from(input.as_bytes()).unwrap();

        assert_eq!(vec!["id", "count", "freq"], batch.schema().names().collect::<Vec<_>>());
        assert_eq!(&Array::from(vec![Some("c1"), None]), batch.column("id").unwrap());
        assert_eq!(&Array::from(vec![Some(3_i64), None]), batch.column("count").unwrap());
        assert_eq!(&Array::from(vec![Some(0.5), None]), batch.column("freq").unwrap());
    }

    #[test]
    fn missing_header_column() {
        let err = source().read_from("id\tcount\nc1\t3\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("freq"), "{err}");
    }

    #[test]
    fn parse_error_reports_line() {
        let input = "id\tcount\tfreq\nc1\t3\t0.1\nc2\tmany\t0.2\n";
        let err = source().read_from(input.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'many'"), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn write_nulls_by_type() {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("c1"), None])),
            ("count", Array::from(vec![None, Some(2_i64)])),
        ])
        .unwrap();
        let mut out = Vec::new();
        let rows = write_tsv(&batch, &mut out, &TsvOptions::default()).unwrap();
        assert_eq!(2, rows);
        assert_eq!("id\tcount\nc1\t\n__NA__\t2\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn write_empty_keeps_header() {
        let batch = Batch::empty(schema());
        let mut out = Vec::new();
        write_tsv(&batch, &mut out, &TsvOptions::default()).unwrap();
        assert_eq!("id\tcount\tfreq\n", String::from_utf8(out).unwrap());
    }
}
