#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements support for talking to Strata-class printers.
//!
//! Control and telemetry ride a broker-based publish/subscribe channel:
//! the printer pushes full state reports to a per-device report topic,
//! and accepts commands on a per-device command topic. Commands are
//! fire-and-forget; there is no synchronous acknowledgement, state
//! changes show up on the report stream. Bulk file transfer uses a
//! separate authenticated, encrypted FTPS channel.

pub mod client;
pub mod command;
pub mod message;
mod no_auth;
mod parser;
pub mod sequence_id;
