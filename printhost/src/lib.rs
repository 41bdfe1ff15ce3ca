#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements support for the PrintHost HTTP control API, a
//! stateless JSON request/response protocol spoken by large-format print
//! hosts on the local network.
//!
//! The protocol carries no authentication; a PrintHost endpoint is only
//! ever addressed over a trusted LAN. That is a property of the protocol
//! itself, documented here so nobody tries to bolt client-side auth onto
//! a server that cannot enforce it.

mod script;
mod status;
mod upload;

use anyhow::Result;
pub use script::{CANCEL_COMMAND, PAUSE_COMMAND, RESUME_COMMAND};
pub use status::{HostState, JobProgress, StatusReport, Temperatures};
pub use upload::{UploadResponse, UploadResponseItem};

/// Client is a handle to a single PrintHost endpoint.
///
/// There is no persistent session to hold: every operation is an
/// independent HTTP call.
#[derive(Clone)]
pub struct Client {
    pub(crate) url_base: String,
}

impl Client {
    /// Create a new Client for the given base url, for instance
    /// `http://10.0.0.20:7125`.
    pub fn new(url_base: &str) -> Result<Self> {
        Ok(Self {
            url_base: url_base.trim_end_matches('/').to_owned(),
        })
    }
}

/// Returns true if the given error is a transport-level failure (connect
/// refused, timeout, dns) rather than a protocol-level one. Callers use
/// this to decide between "device offline" and "device misbehaving".
pub fn is_transport_error(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<reqwest::Error>() {
        Some(err) => err.is_connect() || err.is_timeout() || err.is_request(),
        None => false,
    }
}
