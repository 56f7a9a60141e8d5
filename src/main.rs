use std::env;
use std::error::Error;
use std::fs;
use std::process;

use border_ledger::{run, run_async, RateTable};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: cargo run -- journal.csv [rates.json] [--async]";

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run_app() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run_app() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let use_async = match args.iter().position(|arg| arg == "--async") {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    };
    let (journal, rates_path) = match args.as_slice() {
        [journal] => (journal.clone(), None),
        [journal, rates] => (journal.clone(), Some(rates.clone())),
        _ => return Err(USAGE.into()),
    };
    let rates = match rates_path {
        Some(path) => Some(RateTable::from_json(&fs::read_to_string(path)?)?),
        None => None,
    };

    if use_async {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(run_async(journal, rates, std::io::stdout()))
    } else {
        run(journal, rates, std::io::stdout()).map_err(|err| err.to_string().into())
    }
}
