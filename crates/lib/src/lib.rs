//! Channel Chat core library — chat session client, HTTP backend, transcript and
//! reveal model, plus a local backend, used by both the CLI and desktop applications.

pub mod backend;
pub mod config;
pub mod init;
pub mod reveal;
pub mod server;
pub mod session;
pub mod transcript;
