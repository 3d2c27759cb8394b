//! Reading and writing the delimited files the binaries work with.
//!
//! Training input needs `item_name, category, subcategory, specific_category`
//! columns; inference input needs `item_id, item_name`. Prediction output is
//! UTF-8 with a byte-order mark and columns
//! `item_id, general_category, sub_category, specific_category`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::corpus::{CompositeLabel, LabeledRecord};
use crate::inference::{ItemRecord, PredictionRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const TRAINING_COLUMNS: [&str; 4] = ["item_name", "category", "subcategory", "specific_category"];
pub const ITEM_COLUMNS: [&str; 2] = ["item_id", "item_name"];
pub const PREDICTION_COLUMNS: [&str; 4] =
    ["item_id", "general_category", "sub_category", "specific_category"];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
}

/// One row of a prediction file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub item_id: String,
    pub general_category: String,
    pub sub_category: String,
    pub specific_category: String,
}

impl From<&PredictionRecord> for PredictionRow {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            general_category: record.label.general.clone(),
            sub_category: record.label.sub.clone(),
            specific_category: record.label.specific.clone(),
        }
    }
}

impl PredictionRow {
    pub fn label(&self) -> CompositeLabel {
        CompositeLabel {
            general: self.general_category.clone(),
            sub: self.sub_category.clone(),
            specific: self.specific_category.clone(),
        }
    }
}

/// Reads the labeled training catalog.
pub fn read_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledRecord>, DatasetError> {
    let records = read_training_records_from(open(path.as_ref())?)?;
    info!("Loaded {} training records from {:?}", records.len(), path.as_ref());
    Ok(records)
}

pub fn read_training_records_from<R: Read>(reader: R) -> Result<Vec<LabeledRecord>, DatasetError> {
    read_rows(reader, &TRAINING_COLUMNS)
}

/// Reads items to classify.
pub fn read_items<P: AsRef<Path>>(path: P) -> Result<Vec<ItemRecord>, DatasetError> {
    let items = read_items_from(open(path.as_ref())?)?;
    info!("Loaded {} items from {:?}", items.len(), path.as_ref());
    Ok(items)
}

pub fn read_items_from<R: Read>(reader: R) -> Result<Vec<ItemRecord>, DatasetError> {
    read_rows(reader, &ITEM_COLUMNS)
}

/// Writes predictions in input order, prefixed with a UTF-8 byte-order mark.
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    predictions: &[PredictionRecord],
) -> Result<(), DatasetError> {
    let file = File::create(path.as_ref())?;
    write_predictions_to(BufWriter::new(file), predictions)?;
    info!("Wrote {} predictions to {:?}", predictions.len(), path.as_ref());
    Ok(())
}

pub fn write_predictions_to<W: Write>(
    mut writer: W,
    predictions: &[PredictionRecord],
) -> Result<(), DatasetError> {
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    if predictions.is_empty() {
        csv_writer.write_record(PREDICTION_COLUMNS)?;
    }
    for prediction in predictions {
        csv_writer.serialize(PredictionRow::from(prediction))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Reads a prediction file back, skipping rows with fewer than four fields.
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<PredictionRow>, DatasetError> {
    read_predictions_from(open(path.as_ref())?)
}

pub fn read_predictions_from<R: Read>(reader: R) -> Result<Vec<PredictionRow>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() < PREDICTION_COLUMNS.len() {
            warn!("Skipping prediction row {} with {} fields", line + 1, record.len());
            continue;
        }
        rows.push(PredictionRow {
            item_id: record[0].to_string(),
            general_category: record[1].to_string(),
            sub_category: record[2].to_string(),
            specific_category: record[3].to_string(),
        });
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<BufReader<File>, DatasetError> {
    Ok(BufReader::new(File::open(path)?))
}

fn read_rows<R: Read, T: DeserializeOwned>(reader: R, required: &[&str]) -> Result<Vec<T>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DatasetError::MissingColumn(column.to_string()));
        }
    }
    csv_reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(DatasetError::from)
}
