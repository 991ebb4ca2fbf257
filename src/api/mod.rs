//! HTTP layer.
//!
//! Every page is returned as a JSON view model; form posts end in a
//! `303 See Other` redirect with a flash message queued in the session.
//! Protected routes sit behind a single session gate.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
