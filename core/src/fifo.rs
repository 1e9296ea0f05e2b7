//! Command FIFO mirror.
//!
//! The engine keeps its own copy of the bytes the host has streamed into the
//! TPM's data FIFO so that fragmented commands can be reassembled, parsed,
//! and tampered with as a whole. The mirror is cleared when the buffered
//! command is forwarded for execution.

use core::fmt;
use log::warn;
use static_assertions::const_assert;
use wedge_proto::MAX_COMMAND_LEN;

/// Capacity of the FIFO mirror in bytes.
///
/// Matches the receive buffer of the bus driver the engine embeds into; a
/// command larger than this could never reach us in one piece anyway.
pub const FIFO_CAPACITY: usize = 259;

// The mirror must hold any command the host tooling can assemble.
const_assert!(FIFO_CAPACITY >= MAX_COMMAND_LEN);

/// Fixed-capacity byte accumulator for in-flight command bytes.
#[derive(Debug, Clone)]
pub struct CommandFifo {
    data: [u8; FIFO_CAPACITY],
    len: usize,
}

/// Reasons an append can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoError {
    /// Accepting the bytes would exceed [`FIFO_CAPACITY`].
    Overflow {
        /// Bytes already buffered.
        current: usize,
        /// Bytes the caller tried to add.
        incoming: usize,
    },
    /// The caller handed over an empty slice.
    ZeroLength,
}

impl fmt::Display for FifoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FifoError::Overflow { current, incoming } => write!(
                f,
                "FIFO overflow: {} bytes buffered, {} more would exceed capacity",
                current, incoming
            ),
            FifoError::ZeroLength => write!(f, "refusing to append 0 bytes to FIFO"),
        }
    }
}

impl CommandFifo {
    /// Create an empty FIFO mirror.
    pub const fn new() -> Self {
        Self {
            data: [0; FIFO_CAPACITY],
            len: 0,
        }
    }

    /// Append `bytes` to the mirror.
    ///
    /// A refused append leaves the buffered contents untouched.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), FifoError> {
        if bytes.is_empty() {
            warn!("fifo: refusing zero-length append");
            return Err(FifoError::ZeroLength);
        }
        if self.len + bytes.len() > FIFO_CAPACITY {
            warn!(
                "fifo: overflow with {} bytes buffered, {} incoming",
                self.len,
                bytes.len()
            );
            return Err(FifoError::Overflow {
                current: self.len,
                incoming: bytes.len(),
            });
        }
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The buffered command bytes, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the mirror holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CommandFifo {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates() {
        let mut fifo = CommandFifo::new();
        fifo.append(&[0x00, 0xC1]).unwrap();
        fifo.append(&[0x00, 0x00, 0x00, 0x0A]).unwrap();
        assert_eq!(fifo.as_slice(), &[0x00, 0xC1, 0x00, 0x00, 0x00, 0x0A]);
        assert_eq!(fifo.len(), 6);
    }

    #[test]
    fn test_zero_length_refused() {
        let mut fifo = CommandFifo::new();
        fifo.append(&[0xAB]).unwrap();
        assert_eq!(fifo.append(&[]), Err(FifoError::ZeroLength));
        assert_eq!(fifo.as_slice(), &[0xAB]);
    }

    #[test]
    fn test_overflow_preserves_contents() {
        let mut fifo = CommandFifo::new();
        let chunk = [0x55u8; 200];
        fifo.append(&chunk).unwrap();
        let err = fifo.append(&[0x77; 100]).unwrap_err();
        assert_eq!(
            err,
            FifoError::Overflow {
                current: 200,
                incoming: 100
            }
        );
        // The refused bytes must not leak in.
        assert_eq!(fifo.len(), 200);
        assert!(fifo.as_slice().iter().all(|&b| b == 0x55));
    }

    #[test]
    fn test_fill_to_exact_capacity() {
        let mut fifo = CommandFifo::new();
        fifo.append(&[0u8; FIFO_CAPACITY]).unwrap();
        assert_eq!(fifo.len(), FIFO_CAPACITY);
        assert!(fifo.append(&[0]).is_err());
    }

    #[test]
    fn test_clear_then_append() {
        let mut fifo = CommandFifo::new();
        fifo.append(&[1, 2, 3]).unwrap();
        fifo.clear();
        assert!(fifo.is_empty());
        fifo.append(&[9]).unwrap();
        assert_eq!(fifo.as_slice(), &[9]);
    }
}
