use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;

use crate::error::{PredictionError, Result};
use crate::prediction::Prediction;
use crate::store::ColumnStore;

/// Name of the row-identifier column in the Parquet archive.
const ID_COLUMN: &str = "id";

/// Header of submission CSV files.
const CSV_HEADER: [&str; 2] = ["id", "prediction"];

/// Decimal places written by [`save_csv`].  The CSV path is lossy by
/// design; the Parquet archive is the lossless one.
const CSV_DECIMALS: usize = 6;

// ---------------------------------------------------------------------------
// Parquet archive
// ---------------------------------------------------------------------------

/// Write a prediction to a Parquet archive.
///
/// Layout: one Utf8 `id` column followed by one Float64 column per model,
/// in stored order.  The schema is self-describing, so model names can be
/// listed later without decoding the values (see [`read_model_names`]).
/// Doubles survive the round trip bit-for-bit.
pub fn save_parquet(prediction: &Prediction, path: &Path) -> Result<()> {
    let store = prediction.store();
    if store.column_count() == 0 {
        return Err(PredictionError::ShapeMismatch(
            "cannot save a prediction with no models".to_string(),
        ));
    }

    let mut fields = vec![Field::new(ID_COLUMN, DataType::Utf8, false)];
    let mut arrays: Vec<Arc<dyn Array>> = vec![Arc::new(StringArray::from(
        store.row_ids().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    ))];
    for name in store.names() {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(store.column(name)?.to_vec())));
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    log::info!(
        "saved {} rows x {} models to {}",
        store.len(),
        store.column_count(),
        path.display()
    );
    Ok(())
}

/// Load a Parquet archive written by [`save_parquet`].
///
/// Row-id order, model-name order, and values come back identical;
/// row-id uniqueness is re-validated on the way in.
pub fn load_parquet(path: &Path) -> Result<Prediction> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    if schema.fields().is_empty() || schema.field(0).name() != ID_COLUMN {
        return Err(archive_err(format!(
            "expected first column '{ID_COLUMN}', got {:?}",
            schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>()
        )));
    }
    let model_fields: Vec<&str> = schema
        .fields()
        .iter()
        .skip(1)
        .map(|f| f.name().as_str())
        .collect();

    let mut ids: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); model_fields.len()];

    for batch_result in reader {
        let batch = batch_result?;
        let id_col = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| archive_err(format!("'{ID_COLUMN}' column is not Utf8")))?;
        ids.extend((0..id_col.len()).map(|i| id_col.value(i).to_string()));

        for (m, values) in columns.iter_mut().enumerate() {
            let col = batch
                .column(m + 1)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    archive_err(format!("column '{}' is not Float64", model_fields[m]))
                })?;
            values.extend(col.values().iter().copied());
        }
    }

    let mut store = ColumnStore::empty();
    for (m, values) in columns.into_iter().enumerate() {
        if m == 0 {
            store = ColumnStore::from_column(std::mem::take(&mut ids), model_fields[0], values)?;
        } else {
            store.add_column(model_fields[m], values, false)?;
        }
    }
    let prediction = Prediction::from_store(store);

    log::info!(
        "loaded {} rows x {} models from {}",
        prediction.len(),
        model_fields.len(),
        path.display()
    );
    Ok(prediction)
}

/// List the model names of an archive from its schema, without decoding
/// the value matrix.
pub fn read_model_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    Ok(builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|n| n != ID_COLUMN)
        .collect())
}

fn archive_err(msg: String) -> PredictionError {
    ParquetError::General(msg).into()
}

// ---------------------------------------------------------------------------
// Submission CSV
// ---------------------------------------------------------------------------

/// Write a single-model submission CSV: header `id,prediction`, one row
/// per row id, values rounded to six decimal places.
///
/// Fails with [`PredictionError::MultiModelCsvUnsupported`] unless the
/// prediction holds exactly one model.
pub fn save_csv(prediction: &Prediction, path: &Path) -> Result<()> {
    let store = prediction.store();
    if store.column_count() != 1 {
        return Err(PredictionError::MultiModelCsvUnsupported(
            store.column_count(),
        ));
    }
    let name = store.names().next().unwrap_or_default().to_string();
    let values = store.column(&name)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for (id, value) in store.row_ids().iter().zip(values) {
        writer.write_record([id.as_str(), &format!("{value:.prec$}", prec = CSV_DECIMALS)])?;
    }
    writer.flush()?;

    log::info!(
        "wrote model '{name}' ({} rows) to {}",
        store.len(),
        path.display()
    );
    Ok(())
}

/// Read a submission CSV back as a single-model prediction named `name`.
///
/// Fails with [`PredictionError::MalformedCsv`] on a wrong field count or
/// an unparsable value; line numbers are 1-based and include the header.
pub fn load_csv(path: &Path, name: impl Into<String>) -> Result<Prediction> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?;
    if headers.len() != 2 {
        return Err(PredictionError::MalformedCsv {
            line: 1,
            reason: format!("expected 2 header fields, found {}", headers.len()),
        });
    }

    let mut ids = Vec::new();
    let mut values = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2; // 1-based, after the header
        let record = record?;
        if record.len() != 2 {
            return Err(PredictionError::MalformedCsv {
                line,
                reason: format!("expected 2 fields, found {}", record.len()),
            });
        }
        let raw = record.get(1).unwrap_or("");
        let value: f64 = raw.trim().parse().map_err(|_| PredictionError::MalformedCsv {
            line,
            reason: format!("'{raw}' is not a number"),
        })?;
        ids.push(record.get(0).unwrap_or("").to_string());
        values.push(value);
    }

    Prediction::from_model(ids, name, values)
}
