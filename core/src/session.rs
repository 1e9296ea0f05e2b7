//! Session model: what the host last asked for, and what the next read
//! from the TPM will therefore contain.
//!
//! TIS reads carry no addressing of their own. The only way to size a read
//! and interpret its bytes is to remember the most recent register write,
//! the burst count the TPM last reported, and the ordinal of the command
//! that is currently executing. This module owns exactly that state.

use crate::bus::Register;
use log::warn;
use wedge_proto::HEADER_LEN;

/// Where the engine is within a response transfer.
///
/// Responses come off the FIFO in two reads: the fixed header first, then
/// the body sized by the burst count. The phase selects between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    /// The next FIFO read returns the 10-byte response header.
    AwaitingHeader,
    /// The next FIFO read returns body bytes.
    AwaitingBody,
}

/// Per-session tracking state.
#[derive(Debug, Clone)]
pub struct SessionState {
    last_register_written: Register,
    last_burst_count: u32,
    last_ordinal: u32,
    read_phase: ReadPhase,
}

impl SessionState {
    /// Fresh state: nothing written, nothing executing.
    ///
    /// Boots header-expecting: the first FIFO read a session ever sizes is
    /// a response header, never the unset burst count.
    pub const fn new() -> Self {
        Self {
            last_register_written: Register::None,
            last_burst_count: 0,
            last_ordinal: 0,
            read_phase: ReadPhase::AwaitingHeader,
        }
    }

    /// The register addressed by the most recent write leg.
    pub fn last_register_written(&self) -> Register {
        self.last_register_written
    }

    /// The burst count most recently read back from the TPM.
    pub fn last_burst_count(&self) -> u32 {
        self.last_burst_count
    }

    /// Ordinal of the command most recently sent for execution.
    ///
    /// Zero when the last execution request could not be parsed.
    pub fn last_ordinal(&self) -> u32 {
        self.last_ordinal
    }

    /// Current position within a response transfer.
    pub fn read_phase(&self) -> ReadPhase {
        self.read_phase
    }

    /// Note which register a write leg addressed.
    pub fn record_register_write(&mut self, register: Register) {
        self.last_register_written = register;
    }

    /// Note that a buffered command was sent for execution.
    ///
    /// Arms the header phase: the first FIFO read that follows will be the
    /// response header.
    pub fn record_executed_ordinal(&mut self, ordinal: u32) {
        self.last_ordinal = ordinal;
        self.read_phase = ReadPhase::AwaitingHeader;
    }

    /// Capture the burst count from a burst register read.
    ///
    /// The TPM reports it little-endian in the first three bytes. A shorter
    /// read is ignored and the previous value kept.
    pub fn record_burst_count(&mut self, bytes: &[u8]) {
        if bytes.len() < 3 {
            warn!("burst count read returned {} bytes, keeping previous", bytes.len());
            return;
        }
        self.last_burst_count =
            ((bytes[2] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[0] as u32);
    }

    /// How many bytes the next read from the TPM will carry.
    ///
    /// Takes `&mut self` because sizing a FIFO read in the header phase
    /// consumes the phase: the read after it is body bytes.
    pub fn predict_next_read_size(&mut self) -> usize {
        match self.last_register_written {
            Register::Access => 1,
            Register::Status => 1,
            Register::BurstCount => 3,
            Register::DeviceId => 4,
            Register::DataFifo => match self.read_phase {
                ReadPhase::AwaitingHeader => {
                    self.read_phase = ReadPhase::AwaitingBody;
                    HEADER_LEN
                }
                ReadPhase::AwaitingBody => self.last_burst_count as usize,
            },
            Register::None => 1,
        }
    }
}

impl Default for SessionState {
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
    fn test_fixed_register_read_sizes() {
        let mut s = SessionState::new();
        s.record_register_write(Register::Access);
        assert_eq!(s.predict_next_read_size(), 1);
        s.record_register_write(Register::Status);
        assert_eq!(s.predict_next_read_size(), 1);
        s.record_register_write(Register::BurstCount);
        assert_eq!(s.predict_next_read_size(), 3);
        s.record_register_write(Register::DeviceId);
        assert_eq!(s.predict_next_read_size(), 4);
        s.record_register_write(Register::None);
        assert_eq!(s.predict_next_read_size(), 1);
    }

    #[test]
    fn test_fifo_read_header_then_body() {
        let mut s = SessionState::new();
        s.record_burst_count(&[0x18, 0x00, 0x00]);
        s.record_executed_ordinal(0x14);
        s.record_register_write(Register::DataFifo);

        // First read after execution is the header, then body at burst size.
        assert_eq!(s.predict_next_read_size(), HEADER_LEN);
        assert_eq!(s.predict_next_read_size(), 0x18);
        assert_eq!(s.predict_next_read_size(), 0x18);
    }

    #[test]
    fn test_burst_count_is_lsb_first() {
        let mut s = SessionState::new();
        s.record_burst_count(&[0x13, 0x02, 0x01]);
        assert_eq!(s.last_burst_count(), 0x01_0213);
    }

    #[test]
    fn test_short_burst_read_keeps_previous() {
        let mut s = SessionState::new();
        s.record_burst_count(&[0x20, 0x00, 0x00]);
        s.record_burst_count(&[0x05]);
        assert_eq!(s.last_burst_count(), 0x20);
    }

    #[test]
    fn test_boots_header_expecting() {
        let mut s = SessionState::new();
        assert_eq!(s.read_phase(), ReadPhase::AwaitingHeader);

        // A FIFO read before any go still gets a header-sized prediction,
        // never the unset burst count.
        s.record_register_write(Register::DataFifo);
        assert_eq!(s.predict_next_read_size(), HEADER_LEN);
        assert_eq!(s.predict_next_read_size(), 0);
    }

    #[test]
    fn test_execution_rearms_header_phase() {
        let mut s = SessionState::new();
        s.record_register_write(Register::DataFifo);
        s.record_burst_count(&[0x0A, 0x00, 0x00]);

        // Drain the power-on header phase; reads then follow the burst count.
        assert_eq!(s.predict_next_read_size(), HEADER_LEN);
        assert_eq!(s.predict_next_read_size(), 0x0A);

        s.record_executed_ordinal(0x46);
        assert_eq!(s.read_phase(), ReadPhase::AwaitingHeader);
        assert_eq!(s.predict_next_read_size(), HEADER_LEN);
        assert_eq!(s.read_phase(), ReadPhase::AwaitingBody);
    }
}
