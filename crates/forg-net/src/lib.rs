//! Networking: the Gopher wire transport, the process-wide host address
//! cache and the shared stop flag used to cancel transfers.

mod client;
mod hosts;
mod stop;

pub use client::{
    DEFAULT_CHUNK_SIZE, DeclaredLength, FetchRequest, Fetched, MAX_CHUNK_SIZE, Progress,
    Transport, TransportConfig, chunk_size_for, parse_length_header, read_body,
};
pub use hosts::HostCache;
pub use stop::StopFlag;
