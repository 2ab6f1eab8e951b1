use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use dupgen_core::{RECORD_ID_FIELD, Record, TrueLink};
use rand::Rng;
use rand::seq::SliceRandom;

/// Layout of the records CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvLayout {
    /// Write a `rec_id, <field names>` header row.
    pub header: bool,
    /// Write rows in a random order instead of originals first.
    pub shuffle: bool,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            header: true,
            shuffle: false,
        }
    }
}

/// Write records as CSV with columns in field declaration order.
///
/// Returns the number of bytes written.
pub fn write_records_csv<'a, I, R>(
    path: &Path,
    fields: &[&str],
    records: I,
    missing_value: &str,
    layout: CsvLayout,
    rng: &mut R,
) -> Result<u64, csv::Error>
where
    I: IntoIterator<Item = &'a Record>,
    R: Rng + ?Sized,
{
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    write_records(writer, fields, records, missing_value, layout, rng)
}

/// Same as [`write_records_csv`] for any writer.
pub fn write_records<'a, W, I, R>(
    inner: W,
    fields: &[&str],
    records: I,
    missing_value: &str,
    layout: CsvLayout,
    rng: &mut R,
) -> Result<u64, csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
    R: Rng + ?Sized,
{
    let mut rows: Vec<&Record> = records.into_iter().collect();
    if layout.shuffle {
        rows.shuffle(rng);
    }

    let counting = CountingWriter::new(inner);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    if layout.header {
        let mut header = vec![RECORD_ID_FIELD];
        header.extend_from_slice(fields);
        writer.write_record(&header)?;
    }

    for record in rows {
        let mut row = vec![record.id().to_string()];
        row.extend(
            fields
                .iter()
                .map(|field| record.get(field).unwrap_or(missing_value).to_string()),
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

/// Write true-link pairs as `rec_id,true_match_id` rows.
pub fn write_true_links_csv(path: &Path, links: &[TrueLink]) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    write_true_links(writer, links)
}

pub fn write_true_links<W: Write>(inner: W, links: &[TrueLink]) -> Result<u64, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(CountingWriter::new(inner));
    writer.write_record([RECORD_ID_FIELD, "true_match_id"])?;
    for link in links {
        writer.write_record([link.left.to_string(), link.right.to_string()])?;
    }
    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
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
