use bytes::Bytes;
use csv::{ByteRecord, ReaderBuilder, Terminator, WriterBuilder};

#[derive(Debug)]
pub struct MergeError {
    /// Position of the offending file in the merge input.
    pub file_index: usize,
    pub message: String,
}

/// Concatenates CSV files, keeping the header of the first file only.
///
/// Data rows are emitted in input order. Every file must be well formed on
/// its own; headers of later files are dropped without being compared.
/// Fields are copied as raw bytes and need not be UTF-8.
pub fn merge_csv_files(files: &[Bytes]) -> Result<Bytes, MergeError> {
    let mut header: Option<ByteRecord> = None;
    let mut rows: Vec<ByteRecord> = Vec::new();

    for (file_index, file) in files.iter().enumerate() {
        let to_merge_error = |e: csv::Error| MergeError {
            file_index,
            message: e.to_string(),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file.as_ref());
        let file_header = reader.byte_headers().map_err(to_merge_error)?.clone();
        if file_index == 0 && !file_header.is_empty() {
            header = Some(file_header);
        }
        for record in reader.byte_records() {
            rows.push(record.map_err(to_merge_error)?);
        }
    }

    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    let write_error = |e: csv::Error| MergeError {
        file_index: 0,
        message: format!("failed to serialize merged report: {}", e),
    };
    if let Some(header) = &header {
        writer.write_byte_record(header).map_err(write_error)?;
    }
    for row in &rows {
        writer.write_byte_record(row).map_err(write_error)?;
    }
    let data = writer.into_inner().map_err(|e| MergeError {
        file_index: 0,
        message: format!("failed to flush merged report: {}", e),
    })?;
    Ok(Bytes::from(data))
}
