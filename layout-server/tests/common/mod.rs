//! Shared integration test helpers.

pub mod server;

pub use server::TestServer;
