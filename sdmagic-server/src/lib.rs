//! sdmagic-server: HTTP backend for the SD Magic prompt library
//!
//! CRUD over a category tree, a prompt collection, and a template
//! collection backed by PostgreSQL, plus static/SPA serving for the
//! bundled front-end.

pub mod db;
pub mod http;
pub mod models;
