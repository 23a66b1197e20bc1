//! PokeAPI data models and client
//!
//! This module contains the record types decoded from PokeAPI responses and the
//! client that fetches them through the response cache.

pub mod pokeapi;
pub mod records;

pub use pokeapi::{ApiError, PokeApiClient, POKEAPI_BASE_URL};
pub use records::{
    CaughtPokemon, LocationArea, LocationAreaPage, NamedResource, Pokemon, PokemonEncounter,
    PokemonStat, PokemonType, Sprites,
};
