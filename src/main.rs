//! Pokedex CLI - explore PokeAPI and catch Pokemon from the terminal
//!
//! An interactive prompt over PokeAPI. Responses are cached in memory for the
//! configured TTL and caught Pokemon are saved to a JSON file between runs.

use std::io;
use std::process;

use clap::Parser;
use tokio::io::BufReader;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pokedex::cache::ExpiringCache;
use pokedex::cli::{Cli, StartupConfig};
use pokedex::data::PokeApiClient;
use pokedex::fetch::{build_client, Fetcher};
use pokedex::repl::Repl;
use pokedex::storage::{Pokedex, PokedexStore};

/// Sets up logging to stderr so stdout carries only REPL output.
///
/// `--verbose` turns on debug output for this crate; otherwise `RUST_LOG`
/// is honoured, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pokedex=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Loads the saved collection, starting empty if it cannot be read
fn load_pokedex(store: &PokedexStore) -> Pokedex {
    match store.load() {
        Ok(pokedex) => pokedex,
        Err(e) => {
            warn!(error = %e, "could not load Pokedex");
            println!("Error loading Pokedex: {}", e);
            println!("Starting with an empty Pokedex...");
            Pokedex::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    init_tracing(config.verbose);

    let client = build_client(config.request_timeout)?;
    let cache = ExpiringCache::new(config.cache_ttl)?;
    let api = PokeApiClient::new(Fetcher::new(client, cache.clone()), config.base_url.as_str());

    let store = PokedexStore::new(&config.save_path);
    let pokedex = load_pokedex(&store);
    if !pokedex.is_empty() {
        println!("Loaded {} Pokemon from your saved Pokedex!", pokedex.len());
    }
    println!("Pokedex will be saved to: {}", store.path().display());

    let mut repl = Repl::new(api, store, pokedex);
    let result = repl
        .run(BufReader::new(tokio::io::stdin()), &mut io::stdout())
        .await;

    cache.close();
    result?;

    Ok(())
}
