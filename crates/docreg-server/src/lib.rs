//! HTTP surface for the document registry.
//!
//! Files are addressed by name under the server's own owner identity;
//! records can also be looked up directly by content hash.

pub mod config;
pub mod error;
pub mod handler;
pub mod key;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use key::{load_key, load_or_generate, save_key};
pub use server::DocregServer;
pub use state::AppState;
