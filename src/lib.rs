// Library exports for Spell Tracker
// This allows integration tests and the binary to share the modules

pub mod auth;
pub mod characters;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod reference;
pub mod routes;
pub mod rules;
pub mod seed;
pub mod spell_lists;
pub mod spells;
pub mod state;
