use thiserror::Error;

/// Errors from a FabLink session.
#[derive(Debug, Error)]
pub enum FabLinkError {
    /// The socket failed underneath us.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The device did not answer within the deadline.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The device refused our credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// A frame declared a payload larger than the protocol allows.
    #[error("frame of {0} bytes exceeds the protocol limit")]
    FrameTooLarge(u32),

    /// The device broke the protocol: wrong message, bad ack accounting,
    /// or a transfer cut short.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl FabLinkError {
    /// True when the failure is transport-level (device likely offline)
    /// rather than a protocol violation.
    pub fn is_transport(&self) -> bool {
        matches!(self, FabLinkError::Io(_) | FabLinkError::Timeout(_))
    }
}
