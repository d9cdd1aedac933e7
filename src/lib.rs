#![warn(rust_2018_idioms)]

#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[macro_use]
pub mod macros;

pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod errors;
pub mod games;
pub mod notifications;
pub mod organizers;
pub mod participants;
pub mod players;
pub mod ratings;
pub mod schema;
pub mod server;
pub mod stats;
pub mod users;
pub mod validator;
