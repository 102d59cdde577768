//! Dataset types for driftlens.
//!
//! A dataset is an Arrow table: one or more [`RecordBatch`]es sharing a
//! schema. The Arrow [`DataType`](arrow::datatypes::DataType) of each field
//! is fixed when the data is loaded, so the drift pipeline reads column kinds
//! from the schema instead of inspecting values.

use std::{
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
    sync::Arc,
};

use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatchReader,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    file::properties::WriterProperties,
};

use crate::error::{Error, Result};

/// Rows used for CSV/JSON schema inference.
const INFER_MAX_RECORDS: usize = 1000;

/// Tabular data that the drift pipeline can read.
///
/// All implementations must be thread-safe (Send + Sync) so both testers can
/// read the same dataset from separate threads.
pub trait Dataset: Send + Sync {
    /// Returns the total number of rows in the dataset.
    fn len(&self) -> usize;

    /// Returns true if the dataset contains no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the schema of the dataset.
    fn schema(&self) -> SchemaRef;

    /// Returns an iterator over all RecordBatches in the dataset.
    fn iter(&self) -> Box<dyn Iterator<Item = &RecordBatch> + Send + '_>;

    /// Returns the number of batches in the dataset.
    fn num_batches(&self) -> usize;

    /// Returns the column names in schema order.
    fn column_names(&self) -> Vec<String> {
        self.schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Returns true if the schema has a field called `name`.
    fn has_column(&self, name: &str) -> bool {
        self.schema().index_of(name).is_ok()
    }
}

/// An in-memory dataset backed by Arrow RecordBatches.
///
/// # Example
///
/// ```no_run
/// use driftlens::{ArrowDataset, Dataset};
///
/// let dataset = ArrowDataset::from_csv("data/reference.csv").unwrap();
/// println!("{} rows, columns {:?}", dataset.len(), dataset.column_names());
/// ```
#[derive(Debug, Clone)]
pub struct ArrowDataset {
    batches: Vec<RecordBatch>,
    schema: SchemaRef,
    row_count: usize,
}

impl ArrowDataset {
    /// Creates a new ArrowDataset from a vector of RecordBatches.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batches vector is empty
    /// - The batches have inconsistent schemas
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(Error::EmptyDataset);
        };
        let schema = first.schema();

        for (i, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != schema {
                return Err(Error::schema_mismatch(format!(
                    "Batch {} has different schema than batch 0",
                    i
                )));
            }
        }

        let row_count = batches.iter().map(|b| b.num_rows()).sum();

        Ok(Self {
            batches,
            schema,
            row_count,
        })
    }

    /// Creates an ArrowDataset from a single RecordBatch.
    ///
    /// # Errors
    ///
    /// Never fails for a single batch; kept fallible for symmetry with
    /// [`ArrowDataset::new`].
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        Self::new(vec![batch])
    }

    /// Loads a dataset from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not valid Parquet.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        Self::collect(reader)
    }

    /// Saves the dataset to a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(file, Arc::clone(&self.schema), Some(props))?;
        for batch in &self.batches {
            writer.write(batch)?;
        }
        writer.close()?;
        Ok(())
    }

    /// Loads a dataset from a CSV file, inferring column types.
    ///
    /// Columns whose values all parse as numbers become numeric Arrow types;
    /// everything else stays `Utf8`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_with_options(path, CsvOptions::default())
    }

    /// Loads a dataset from a CSV file with options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    pub fn from_csv_with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        Self::read_csv(BufReader::new(file), options)
    }

    /// Loads a dataset from an in-memory CSV string with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::read_csv(Cursor::new(data.as_bytes()), CsvOptions::default())
    }

    fn read_csv<R: Read + Seek>(mut input: R, options: CsvOptions) -> Result<Self> {
        use arrow_csv::{reader::Format, ReaderBuilder};

        let schema = if let Some(schema) = options.schema {
            Arc::new(schema)
        } else {
            let mut format = Format::default().with_header(options.has_header);
            if let Some(delim) = options.delimiter {
                format = format.with_delimiter(delim);
            }
            let (inferred, _) = format.infer_schema(&mut input, Some(INFER_MAX_RECORDS))?;
            input
                .seek(SeekFrom::Start(0))
                .map_err(|e| Error::Io { path: None, source: e })?;
            Arc::new(inferred)
        };

        let mut builder = ReaderBuilder::new(schema)
            .with_batch_size(options.batch_size)
            .with_header(options.has_header);
        if let Some(delim) = options.delimiter {
            builder = builder.with_delimiter(delim);
        }

        Self::collect(builder.build(input)?)
    }

    /// Saves the dataset to a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        use arrow_csv::WriterBuilder;

        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let mut writer = WriterBuilder::new().with_header(true).build(file);
        for batch in &self.batches {
            writer.write(batch)?;
        }
        Ok(())
    }

    /// Loads a dataset from a JSON Lines (JSONL) file.
    ///
    /// Each line in the file should be a JSON object representing a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        use arrow_json::ReaderBuilder;

        let path = path.as_ref();
        let open = || {
            std::fs::File::open(path)
                .map(BufReader::new)
                .map_err(|e| Error::io(e, path))
        };

        let (inferred, _) =
            arrow_json::reader::infer_json_schema(open()?, Some(INFER_MAX_RECORDS))?;
        let reader = ReaderBuilder::new(Arc::new(inferred))
            .with_batch_size(CsvOptions::DEFAULT_BATCH_SIZE)
            .build(open()?)?;

        Self::collect(reader)
    }

    /// Drains a batch reader into a dataset.
    ///
    /// A reader with a schema but no rows yields a single empty batch, so a
    /// header-only file loads as a zero-row dataset.
    fn collect<I: RecordBatchReader>(reader: I) -> Result<Self> {
        let schema = reader.schema();
        let mut batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
        if batches.is_empty() {
            batches.push(RecordBatch::new_empty(schema));
        }
        Self::new(batches)
    }

    /// Returns the underlying batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consumes the dataset and returns the underlying batches.
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }
}

impl Dataset for ArrowDataset {
    fn len(&self) -> usize {
        self.row_count
    }

    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &RecordBatch> + Send + '_> {
        Box::new(self.batches.iter())
    }

    fn num_batches(&self) -> usize {
        self.batches.len()
    }
}

/// Options for CSV parsing.
///
/// Supplying a [`Schema`] pins each column's type instead of inferring it,
/// which is how a caller declares a numeric-looking column as categorical.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row.
    pub has_header: bool,
    /// Delimiter character (default is comma).
    pub delimiter: Option<u8>,
    /// Batch size for reading.
    pub batch_size: usize,
    /// Optional schema (inferred if not provided).
    pub schema: Option<Schema>,
}

impl CsvOptions {
    const DEFAULT_BATCH_SIZE: usize = 8192;

    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the file has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the delimiter character.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the schema for parsing.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            schema: None,
        }
    }
}
