use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use surveyforge_core::GeneratedTable;

/// Write a table as CSV: header row, then one record per sample.
///
/// Returns the number of bytes written.
pub fn write_table_csv<W: Write>(writer: W, table: &GeneratedTable) -> Result<u64, csv::Error> {
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(table.column_names())?;

    let mut record = Vec::with_capacity(table.column_count());
    for row in 0..table.row_count() {
        record.clear();
        record.extend(
            table
                .columns()
                .iter()
                .map(|column| column.values[row].to_csv()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

/// Write a table to `path`, creating or truncating the file.
pub fn write_table_csv_file(path: &Path, table: &GeneratedTable) -> Result<u64, csv::Error> {
    let file = File::create(path).map_err(csv::Error::from)?;
    write_table_csv(BufWriter::new(file), table)
}

/// Render a table to an in-memory CSV string.
pub fn table_to_csv_string(table: &GeneratedTable) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_table_csv(&mut buffer, table)?;
    String::from_utf8(buffer).map_err(|err| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
