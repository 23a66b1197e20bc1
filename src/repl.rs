//! Line-oriented command loop
//!
//! Reads commands from an async line source, dispatches them against PokeAPI
//! and the user's collection, and writes all user-facing text to a supplied
//! writer. Command failures are printed and the loop carries on; only I/O
//! failures on the prompt itself end the session early.

use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::catch::attempt_catch;
use crate::data::{ApiError, CaughtPokemon, Pokemon, PokeApiClient};
use crate::storage::{Pokedex, PokedexStore};

/// Prompt printed before each command
pub const PROMPT: &str = "Pokedex > ";

/// Errors a single command can produce
#[derive(Debug, Error)]
pub enum ReplError {
    /// The command needs an argument and none was given
    #[error("The {0} command requires an argument")]
    MissingArgument(&'static str),

    /// The named location area does not exist
    #[error("Area '{0}' does not exist. Please check spelling and try again")]
    AreaNotFound(String),

    /// The named creature does not exist
    #[error("Pokemon '{0}' does not exist. Please check spelling and try again")]
    PokemonNotFound(String),

    /// Any other API failure
    #[error("Error making API call: {0}")]
    Api(#[from] ApiError),

    /// Writing output failed
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// The commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Try to catch a named creature
    Catch,
    /// Leave the REPL
    Exit,
    /// List the creatures in a location area
    Explore,
    /// Print the command list
    Help,
    /// Show details of a caught creature
    Inspect,
    /// Show the next page of location areas
    Map,
    /// Show the previous page of location areas
    Mapb,
    /// List the caught creatures
    Pokedex,
}

impl Command {
    /// Every command, in alphabetical order
    pub const ALL: [Command; 8] = [
        Command::Catch,
        Command::Exit,
        Command::Explore,
        Command::Help,
        Command::Inspect,
        Command::Map,
        Command::Mapb,
        Command::Pokedex,
    ];

    /// Looks up a command by the word typed at the prompt
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Word typed at the prompt to run this command
    pub fn name(self) -> &'static str {
        match self {
            Command::Catch => "catch",
            Command::Exit => "exit",
            Command::Explore => "explore",
            Command::Help => "help",
            Command::Inspect => "inspect",
            Command::Map => "map",
            Command::Mapb => "mapb",
            Command::Pokedex => "pokedex",
        }
    }

    /// One-line description shown by `help`
    pub fn description(self) -> &'static str {
        match self {
            Command::Catch => "Try to catch a Pokemon! Takes a Pokemon name as an argument",
            Command::Exit => "Exit the Pokedex",
            Command::Explore => {
                "Display a list of Pokemon in the provided area. Takes a location area as an argument"
            }
            Command::Help => "Displays all available commands and what they do",
            Command::Inspect => {
                "See details of a Pokemon you have caught. Takes a Pokemon name as an argument"
            }
            Command::Map => "Display the next 20 location areas in the Pokemon games",
            Command::Mapb => "Display the previous 20 location areas in the Pokemon games",
            Command::Pokedex => "See the list of Pokemon you have caught",
        }
    }
}

/// Whether the loop should keep reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Stop the loop
    Exit,
}

/// Splits a line into lowercase words, discarding surrounding whitespace
pub fn clean_input(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}

/// Session state for the command loop
pub struct Repl {
    client: PokeApiClient,
    store: PokedexStore,
    pokedex: Pokedex,
    /// Page `map` shows next; `None` once the last page has been shown
    next_page: Option<String>,
    /// Page `mapb` shows next; `None` while on the first page
    previous_page: Option<String>,
    rng: Box<dyn RngCore + Send>,
}

impl Repl {
    /// Creates a session over `client`, with a collection already loaded from `store`
    pub fn new(client: PokeApiClient, store: PokedexStore, pokedex: Pokedex) -> Self {
        let next_page = Some(client.first_location_page_url());
        Self {
            client,
            store,
            pokedex,
            next_page,
            previous_page: None,
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// Replaces the random source used for catch attempts
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// The user's current collection
    pub fn pokedex(&self) -> &Pokedex {
        &self.pokedex
    }

    /// Runs the loop until `exit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                return Ok(());
            };

            let words = clean_input(&line);
            if words.is_empty() {
                writeln!(out, "Please enter a command")?;
                continue;
            }

            match self.execute(&words, out).await {
                Ok(Flow::Exit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(ReplError::Io(e)) => return Err(e),
                Err(e) => writeln!(out, "An error has occurred: {}", e)?,
            }
            writeln!(out)?;
        }
    }

    /// Runs one already-tokenized command line
    pub async fn execute<W: Write>(
        &mut self,
        words: &[String],
        out: &mut W,
    ) -> Result<Flow, ReplError> {
        let Some(first) = words.first() else {
            return Ok(Flow::Continue);
        };
        let arg = words.get(1).map(String::as_str);

        let Some(command) = Command::from_name(first) else {
            writeln!(out, "Unknown command")?;
            return Ok(Flow::Continue);
        };
        debug!(command = command.name(), ?arg, "dispatching");

        match command {
            Command::Help => self.help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Map => self.map(out).await?,
            Command::Mapb => self.mapb(out).await?,
            Command::Explore => self.explore(require(command, arg)?, out).await?,
            Command::Catch => self.catch(require(command, arg)?, out).await?,
            Command::Inspect => self.inspect(require(command, arg)?, out)?,
            Command::Pokedex => self.list_pokedex(out)?,
        }

        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for command in Command::ALL {
            writeln!(out, "{}: {}", command.name(), command.description())?;
        }
        Ok(())
    }

    async fn map<W: Write>(&mut self, out: &mut W) -> Result<(), ReplError> {
        let Some(url) = self.next_page.clone() else {
            writeln!(out, "You are already on the last page.")?;
            return Ok(());
        };
        self.show_page(&url, out).await
    }

    async fn mapb<W: Write>(&mut self, out: &mut W) -> Result<(), ReplError> {
        let Some(url) = self.previous_page.clone() else {
            writeln!(out, "You are already on the first page.")?;
            return Ok(());
        };
        self.show_page(&url, out).await
    }

    async fn show_page<W: Write>(&mut self, url: &str, out: &mut W) -> Result<(), ReplError> {
        let page = self.client.location_areas(Some(url)).await?;

        for area in &page.results {
            writeln!(out, "{}", area.name)?;
        }

        self.next_page = page.next;
        self.previous_page = page.previous;
        Ok(())
    }

    async fn explore<W: Write>(&mut self, area: &str, out: &mut W) -> Result<(), ReplError> {
        writeln!(out, "Exploring {}...", area)?;

        let area = self.client.location_area(area).await.map_err(|e| {
            if e.is_not_found() {
                ReplError::AreaNotFound(area.to_string())
            } else {
                ReplError::Api(e)
            }
        })?;

        if area.pokemon_encounters.is_empty() {
            writeln!(out, "No Pokemon found.")?;
            return Ok(());
        }

        writeln!(out, "Found Pokemon:")?;
        for encounter in &area.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write>(&mut self, name: &str, out: &mut W) -> Result<(), ReplError> {
        writeln!(out, "Throwing a Pokeball at {}...", name)?;

        let pokemon = self.client.pokemon(name).await.map_err(|e| {
            if e.is_not_found() {
                ReplError::PokemonNotFound(name.to_string())
            } else {
                ReplError::Api(e)
            }
        })?;

        let base_experience = pokemon.base_experience.unwrap_or(0);
        if !attempt_catch(base_experience, &mut *self.rng) {
            writeln!(out, "{} escaped!", name)?;
            return Ok(());
        }

        self.pokedex
            .insert(name.to_string(), CaughtPokemon::now(pokemon));
        writeln!(out, "{} was caught!", name)?;
        writeln!(out, "You may now inspect it with the inspect command")?;

        if let Err(e) = self.store.save(&self.pokedex) {
            warn!(error = %e, "failed to save Pokedex");
            writeln!(out, "Warning: your Pokedex could not be saved: {}", e)?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: &str, out: &mut W) -> io::Result<()> {
        match self.pokedex.get(name) {
            Some(caught) => print_pokemon(&caught.pokemon, out),
            None => writeln!(out, "You have not caught {} yet!", name),
        }
    }

    fn list_pokedex<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.pokedex.is_empty() {
            return writeln!(out, "Your Pokedex is empty. Go catch some Pokemon!");
        }
        writeln!(out, "Your Pokedex:")?;
        for name in self.pokedex.keys() {
            writeln!(out, " - {}", name)?;
        }
        Ok(())
    }
}

fn require(command: Command, arg: Option<&str>) -> Result<&str, ReplError> {
    arg.ok_or(ReplError::MissingArgument(command.name()))
}

fn print_pokemon<W: Write>(pokemon: &Pokemon, out: &mut W) -> io::Result<()> {
    writeln!(out, "Name: {}", pokemon.name)?;
    writeln!(out, "Height: {}", pokemon.height)?;
    writeln!(out, "Weight: {}", pokemon.weight)?;
    writeln!(out, "Stats:")?;
    for stat in &pokemon.stats {
        writeln!(out, " -{}: {}", stat.stat.name, stat.base_stat)?;
    }
    writeln!(out, "Types:")?;
    for t in &pokemon.types {
        writeln!(out, " - {}", t.type_.name)?;
    }
    Ok(())
}
