//! Shared territory-tracking dashboard for A-Z directory canvassing.
//!
//! A team claims page ranges ("segments") of a printed directory per zipcode,
//! records progress, and marks completion. The crate is a thin JSON API over
//! a SQLite store: `db` holds the SQL repositories, `api` the axum handlers,
//! and `config` the YAML configuration. Identity is a caller-supplied display
//! name carried on each request; it is not authentication.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
