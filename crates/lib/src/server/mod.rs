//! Local development backend.
//!
//! Serves the channel and chat endpoints the client talks to, backed by an
//! in-memory session store, so the client can be exercised without the real
//! ingestion service. Replies echo the message tagged with the session's channel.

mod http;
mod store;

pub use http::{router, run_server, serve};
pub use store::{ChannelSession, SessionStore, Turn, DEFAULT_MAX_SESSIONS, MAX_TURNS_PER_SESSION};
