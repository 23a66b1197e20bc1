//! Pokedex CLI Library
//!
//! Exposes the response cache, the cache-aside fetcher and the REPL building
//! blocks for use by the binary and by integration tests.

pub mod cache;
pub mod catch;
pub mod cli;
pub mod data;
pub mod fetch;
pub mod repl;
pub mod storage;
