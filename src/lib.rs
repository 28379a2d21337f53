#[macro_use] extern crate bitflags;
#[macro_use] extern crate diesel;
#[macro_use] extern crate failure;
#[macro_use] extern crate failure_derive;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
#[macro_use] extern crate serde_derive;

#[cfg(not(debug_assertions))]
#[macro_use]
extern crate diesel_migrations;

pub use self::cli::main;

pub(crate) use self::config::Config;

#[macro_use] mod macros;

pub mod audit;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod permissions;
pub mod workflow;

pub type Result<T, E=failure::Error> = std::result::Result<T, E>;
