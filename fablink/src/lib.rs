#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements the FabLink wire protocol, the custom TCP
//! protocol spoken by multi-mode fabricators (additive, mill, laser).
//!
//! Every message on the wire is a frame: a 4-byte big-endian payload
//! length followed by the payload. Control payloads are json messages
//! tagged by `type`; file content travels as raw-byte chunk frames
//! inside a transfer bracket. A connection must complete an
//! authentication handshake before the device accepts anything else.

mod client;
mod error;
pub mod frame;
pub mod message;
pub mod transfer;

pub use client::Client;
pub use error::FabLinkError;
