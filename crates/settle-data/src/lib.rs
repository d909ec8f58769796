//! Content loading for the settlement engine: maps, building and recipe
//! catalogs and engine tuning from RON, JSON or TOML files, plus the
//! built-in `fantasy_world` content.

pub mod builtin;
pub mod loader;
pub mod schema;

pub use builtin::{builtin_game_data, fantasy_world, standard_catalog};
pub use loader::{DataLoadError, GameData, load_game_data};
