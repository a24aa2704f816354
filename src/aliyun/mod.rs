//! Alibaba Cloud Simple Application Server (SWAS) firewall provider
//!
//! Requests use the RPC style API: every parameter travels in the query
//! string of a `POST` and is signed with HMAC-SHA1 over the sorted,
//! percent-encoded parameter set.

pub mod client;
pub mod models;
pub mod signer;

pub use client::SwasClient;
