// Network adapter for client sockets.

pub mod client;

pub use client::{world_update_serializer, ws_handler};
