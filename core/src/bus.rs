//! Bus-level vocabulary: transaction directions, TIS register decode, and
//! the status byte bit assignments.

use bitflags::bitflags;
use core::fmt;

/// Which leg of the interposed bus a transaction travelled.
///
/// Every transaction the embedder observes belongs to exactly one leg. Write
/// legs carry a register-addressing payload; read legs carry raw response
/// bytes whose meaning depends on the register written beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host wrote to the interposer (upstream write leg).
    HostToInterposer,
    /// Interposer answered a host read (upstream read leg).
    InterposerToHost,
    /// Interposer forwarded a write to the TPM (downstream write leg).
    InterposerToTpm,
    /// TPM answered an interposer read (downstream read leg).
    TpmToInterposer,
}

/// TIS-over-I2C register addresses.
///
/// The register is carried in the low nibble of the first payload byte of a
/// write transaction; locality bits above it are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Locality access register.
    Access,
    /// Status register; writing the go bit starts command execution.
    Status,
    /// Burst count register; reads back the FIFO transfer granularity.
    BurstCount,
    /// Command/response FIFO.
    DataFifo,
    /// Vendor and device ID register.
    DeviceId,
    /// Sentinel for addresses outside the decode table, and for read legs
    /// where no register byte is present.
    None,
}

impl Register {
    /// Low nibble of the first payload byte selects the register.
    pub const ADDRESS_MASK: u8 = 0b0000_1111;

    /// Decode the register from the first byte of a write payload.
    pub fn from_wire(byte: u8) -> Self {
        match byte & Self::ADDRESS_MASK {
            0x0 => Register::Access,
            0x1 => Register::Status,
            0x2 => Register::BurstCount,
            0x5 => Register::DataFifo,
            0x6 => Register::DeviceId,
            _ => Register::None,
        }
    }

    /// Short label used in trace output.
    pub const fn name(self) -> &'static str {
        match self {
            Register::Access => "ACCESS",
            Register::Status => "STS",
            Register::BurstCount => "BURST",
            Register::DataFifo => "DATA",
            Register::DeviceId => "VIDDID",
            Register::None => " ",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// TIS status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TpmSts: u8 {
        /// The other status bits are valid.
        const STS_VALID = 0x80;
        /// TPM is ready to receive a command.
        const COMMAND_READY = 0x40;
        /// Writing this bit executes the buffered command.
        const TPM_GO = 0x20;
        /// Response data is waiting in the FIFO.
        const DATA_AVAIL = 0x10;
        /// TPM expects more command bytes.
        const EXPECT = 0x08;
        /// Self test has completed.
        const SELF_TEST_DONE = 0x04;
        /// Host may retry the last response read.
        const RESPONSE_RETRY = 0x02;
    }
}

// =============================================================================
// TESTS
// =============================================================================
