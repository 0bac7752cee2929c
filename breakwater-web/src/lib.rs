//! Breakwater web — the gateway's HTTP surface.
//!
//! Four JSON endpoints over the core resolver, listing and export
//! pipeline, plus the substring-based error classifier the API has always
//! exposed.

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{router, run_server, AppState};
