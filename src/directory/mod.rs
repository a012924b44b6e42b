//! Group-directory API client and wire types.

mod client;
mod types;

pub use client::{authenticate, DirectoryAuth, DirectoryClient};
pub use types::{interpret_write, AddMemberRequest, WriteKind, WsResponse};
