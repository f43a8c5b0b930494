//! Electrolyte Solutions content API.
//!
//! This library exposes the kernel internals for integration testing.
//! The main entry point for running the server is the `electrolyte` binary.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod file;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
