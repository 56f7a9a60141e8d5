use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::{
    csv_utils::{read_journal, write_ledger},
    settlement::RateTable,
    Engine,
};

use super::{replay_entry, snapshot};

/// Replays a journal file and writes the resulting ledger snapshot to the provided writer.
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
pub fn run<P, W>(input_path: P, rates: Option<RateTable>, writer: W) -> Result<(), Box<dyn Error>>
where
    P: AsRef<Path>,
    W: Write,
{
    let mut engine = Engine::new();

    for row in read_journal(input_path)? {
        // CSV parsing errors are critical - propagate them
        let (line, entry) = row?;
        replay_entry(&mut engine, line, entry, rates.as_ref());
    }

    write_ledger(writer, snapshot(&engine)?)?;
    Ok(())
}
