//! Journal and ledger CSV plumbing shared by the runners.

use std::io::Write;
use std::path::Path;

use crate::dto::{JournalEntry, LedgerRow};

/// Streams journal rows from `path`, each tagged with the line it started on.
/// Fields and headers are trimmed before deserialization.
pub fn read_journal<P>(
    path: P,
) -> csv::Result<impl Iterator<Item = csv::Result<(u64, JournalEntry)>>>
where
    P: AsRef<Path>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    Ok(reader
        .into_records()
        .map(move |record| -> csv::Result<(u64, JournalEntry)> {
            let record = record?;
            let line = record.position().map_or(0, |pos| pos.line());
            Ok((line, record.deserialize(Some(&headers))?))
        }))
}

/// Writes the ledger snapshot with its header row.
pub fn write_ledger<W>(writer: W, rows: impl IntoIterator<Item = LedgerRow>) -> csv::Result<()>
where
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
