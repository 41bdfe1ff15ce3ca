//! Ack accounting for chunked file transfer.
//!
//! A transfer is an explicit state machine, not a bare loop: an
//! interrupted or short transfer is a representable state that callers
//! can observe, never a silent success.

use crate::error::FabLinkError;

/// Chunk frame size. 64 KiB keeps a whole chunk well under the frame
/// limit while amortizing the per-frame ack round trip.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// State of one file transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferState {
    /// Bracket opened, no chunk sent yet.
    Begin,
    /// Chunks in flight.
    Sending {
        /// Bytes sent and acknowledged so far.
        bytes_sent: u64,
    },
    /// Device confirmed the full byte count.
    Complete {
        /// Total bytes stored on the device.
        total: u64,
    },
    /// Transfer failed partway through.
    Failed {
        /// Bytes that had been acknowledged when it failed.
        bytes_sent: u64,
        /// What went wrong.
        reason: String,
    },
}

/// Tracks cumulative bytes through one transfer bracket and validates
/// the device's ack accounting.
#[derive(Debug)]
pub struct Transfer {
    total: u64,
    sent: u64,
    state: TransferState,
}

impl Transfer {
    /// Start tracking a transfer of `total` bytes.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            sent: 0,
            state: TransferState::Begin,
        }
    }

    /// Current state.
    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// Record that a chunk of `len` bytes went out. Returns the new
    /// cumulative count.
    pub fn record_chunk(&mut self, len: usize) -> u64 {
        self.sent += len as u64;
        self.state = TransferState::Sending {
            bytes_sent: self.sent,
        };
        self.sent
    }

    /// Validate the device's cumulative ack against what we sent.
    pub fn check_ack(&mut self, received: u64) -> Result<(), FabLinkError> {
        if received != self.sent {
            return Err(self.fail(format!(
                "device acknowledged {} bytes, {} were sent",
                received, self.sent
            )));
        }
        Ok(())
    }

    /// Validate the device's final total and close the bracket.
    pub fn finish(&mut self, total: u64) -> Result<u64, FabLinkError> {
        if self.sent != self.total {
            return Err(self.fail(format!(
                "transfer closed after {} of {} bytes",
                self.sent, self.total
            )));
        }
        if total != self.total {
            return Err(self.fail(format!(
                "device stored {} bytes, expected {}",
                total, self.total
            )));
        }
        self.state = TransferState::Complete { total };
        Ok(total)
    }

    /// Mark the transfer failed with the given reason, returning the
    /// matching error.
    pub fn fail(&mut self, reason: String) -> FabLinkError {
        self.state = TransferState::Failed {
            bytes_sent: self.sent,
            reason: reason.clone(),
        };
        FabLinkError::Protocol(reason)
    }
}
