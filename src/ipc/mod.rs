//! IPC module for daemon-collaborator communication

mod protocol;
mod server;

pub use protocol::{DaemonStatus, DroppedItem, Notification, Request, Response};
pub use server::Server;
