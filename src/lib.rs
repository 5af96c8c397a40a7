pub mod config;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod mutation;
pub mod mutation_handler;
pub mod patch;
