use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::{csv_utils::write_ledger, dto::JournalEntry, settlement::RateTable, Engine};

use super::{replay_entry, snapshot};

use csv_async::{AsyncReaderBuilder, Error as CsvError, Trim};
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

const BUFFER_SIZE: usize = 1024;

type Result<T, E = Box<dyn Error + Send + Sync>> = std::result::Result<T, E>;

/// Replays a journal file asynchronously and writes the ledger snapshot to the provided writer.
/// Spawns two tasks:
/// * CSV reader - streams journal rows from the input file, deserializes them and sends them to the processor via channel.
/// * Processor - receives rows from the channel and applies them until the channel is closed.
///
/// Rows are applied strictly in file order, one unit of work at a time.
///
/// # Arguments
/// * `input_path` - Path to the journal CSV file
/// * `rates` - Rate table used to price payment rows that carry no rate
/// * `writer` - Where to write the ledger snapshot (e.g. stdout)
///
/// # Errors
/// Returns an error if:
/// * The input file cannot be read
/// * The CSV is malformed
/// * Writing to the output fails
pub async fn run<P, W>(input_path: P, rates: Option<RateTable>, writer: W) -> Result<()>
where
    P: AsRef<Path>,
    W: Write,
{
    // Create channel for passing journal rows from reader to processor
    let (tx, rx) = mpsc::channel(BUFFER_SIZE);
    let input_path = input_path.as_ref().to_owned();

    let reader_handle = tokio::spawn(read_journal(input_path, tx));
    let processor_handle = tokio::spawn(process_journal(rx, rates));

    // Wait for reader to finish and propagate any errors
    reader_handle.await??;

    // Get final engine state
    let engine = processor_handle.await?;

    write_ledger(writer, snapshot(&engine)?)?;
    Ok(())
}

/// Reads and deserializes journal rows from a CSV file.
/// Returns them through the provided channel, tagged with the line each row starts on.
async fn read_journal(
    input_path: impl AsRef<Path> + Send,
    tx: mpsc::Sender<(u64, JournalEntry)>,
) -> Result<(), CsvError> {
    let file = File::open(input_path).await?;
    let mut csv_reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_reader(file);
    let headers = csv_reader.headers().await?.clone();

    let mut records = csv_reader.records();
    while let Some(record) = records.next().await {
        // CSV parsing errors are critical - propagate them
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let entry: JournalEntry = record.deserialize(Some(&headers))?;
        if tx.send((line, entry)).await.is_err() {
            // Receiver dropped, exit gracefully
            break;
        }
    }
    Ok(())
}

/// Applies journal rows received through the channel.
/// Returns the final engine state once the channel is closed by the reader.
async fn process_journal(
    mut rx: mpsc::Receiver<(u64, JournalEntry)>,
    rates: Option<RateTable>,
) -> Engine {
    let mut engine = Engine::new();
    while let Some((line, entry)) = rx.recv().await {
        replay_entry(&mut engine, line, entry, rates.as_ref());
    }
    engine
}
