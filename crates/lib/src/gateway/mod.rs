//! Gateway HTTP server: signed webhook intake and health endpoint.

pub mod server;

pub use server::run_gateway;
