//! PokeAPI record types
//!
//! Typed views over the JSON payloads returned by PokeAPI. Only the fields the
//! client displays are modelled; everything else in a response is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `{ name, url }` reference to another API resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of the location-area listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAreaPage {
    /// Total number of location areas across all pages
    pub count: u32,
    /// URL of the next page, `None` on the last page
    pub next: Option<String>,
    /// URL of the previous page, `None` on the first page
    pub previous: Option<String>,
    /// Location areas on this page
    pub results: Vec<NamedResource>,
}

/// A single location area and the creatures that can be met there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationArea {
    pub name: String,
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

/// One creature that can be encountered in a location area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

/// A creature as returned by `/pokemon/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub name: String,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    /// Experience gained for defeating it; PokeAPI reports `null` for a few forms
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub sprites: Sprites,
}

/// A base stat value, such as `hp` or `speed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// One of a creature's types, in slot order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

/// Image URLs for a creature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
}

/// A creature in the user's collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaughtPokemon {
    pub pokemon: Pokemon,
    /// When the catch succeeded
    pub caught_at: DateTime<Utc>,
}

impl CaughtPokemon {
    /// Records a catch made now
    pub fn now(pokemon: Pokemon) -> Self {
        Self {
            pokemon,
            caught_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_area_page_from_json() {
        let json = r#"{
            "count": 1281,
            "next": "https://pokeapi.co/api/v2/location-area/?offset=20&limit=20",
            "previous": null,
            "results": [
                {"name": "canalave-city-area", "url": "https://pokeapi.co/api/v2/location-area/1/"},
                {"name": "eterna-city-area", "url": "https://pokeapi.co/api/v2/location-area/2/"}
            ]
        }"#;

        let page: LocationAreaPage = serde_json::from_str(json).unwrap();

        assert_eq!(page.count, 1281);
        assert!(page.next.is_some());
        assert!(page.previous.is_none());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].name, "canalave-city-area");
    }

    #[test]
    fn test_pokemon_ignores_unknown_fields() {
        let json = r#"{
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "weight": 60,
            "base_experience": 112,
            "abilities": [],
            "stats": [
                {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}}
            ],
            "types": [
                {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
            ],
            "sprites": {"front_default": "https://example.com/25.png", "back_default": null}
        }"#;

        let pokemon: Pokemon = serde_json::from_str(json).unwrap();

        assert_eq!(pokemon.name, "pikachu");
        assert_eq!(pokemon.base_experience, Some(112));
        assert_eq!(pokemon.stats[0].stat.name, "hp");
        assert_eq!(pokemon.stats[0].base_stat, 35);
        assert_eq!(pokemon.types[0].type_.name, "electric");
        assert_eq!(
            pokemon.sprites.front_default.as_deref(),
            Some("https://example.com/25.png")
        );
    }

    #[test]
    fn test_pokemon_null_base_experience() {
        let json = r#"{"name": "koraidon-limited-build", "height": 35, "weight": 3030, "base_experience": null}"#;

        let pokemon: Pokemon = serde_json::from_str(json).unwrap();

        assert_eq!(pokemon.base_experience, None);
        assert!(pokemon.stats.is_empty());
        assert!(pokemon.sprites.front_default.is_none());
    }

    #[test]
    fn test_location_area_without_encounters() {
        let area: LocationArea = serde_json::from_str(r#"{"name": "empty-area"}"#).unwrap();
        assert!(area.pokemon_encounters.is_empty());
    }
}
