//! Command construction.
//!
//! The interposer itself never originates commands; it only relays what the
//! host sends. The builder exists for exercising the decode path from tests
//! and demo harnesses, and it emits the same wire bytes the attack utility
//! scripts put on the bus.

use crate::ordinal::Ordinal;
use crate::{tag, WireError, WireResult, DIGEST_LEN, MAX_COMMAND_LEN};

/// Fixed-capacity builder that assembles one command at a time.
///
/// `begin` writes the tag and ordinal with a zero length placeholder;
/// `finish` patches the real length over it once the body is in place.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    data: [u8; MAX_COMMAND_LEN],
    pos: usize,
}

impl CommandBuffer {
    /// Create an empty builder.
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_COMMAND_LEN],
            pos: 0,
        }
    }

    /// Discard any partially built command.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Append one byte.
    pub fn write_u8(&mut self, value: u8) -> WireResult<()> {
        if self.pos >= MAX_COMMAND_LEN {
            return Err(WireError::Overflow);
        }
        self.data[self.pos] = value;
        self.pos += 1;
        Ok(())
    }

    /// Append a big-endian u16.
    pub fn write_u16(&mut self, value: u16) -> WireResult<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Append a big-endian u32.
    pub fn write_u32(&mut self, value: u32) -> WireResult<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Append a byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> WireResult<()> {
        if self.pos + bytes.len() > MAX_COMMAND_LEN {
            return Err(WireError::Overflow);
        }
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Start a command: tag, length placeholder, ordinal.
    pub fn begin(&mut self, command_tag: u16, ordinal: Ordinal) -> WireResult<()> {
        self.reset();
        self.write_u16(command_tag)?;
        self.write_u32(0)?; // patched by finish()
        self.write_u32(ordinal.as_u32())
    }

    /// Patch the header length field with the final command size.
    pub fn finish(&mut self) {
        let len = self.pos as u32;
        self.data[2..6].copy_from_slice(&len.to_be_bytes());
    }

    /// The assembled command bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// Build a complete TPM_PCRRead command.
    pub fn build_pcr_read(&mut self, pcr_index: u32) -> WireResult<()> {
        self.begin(tag::RQU_COMMAND, Ordinal::PcrRead)?;
        self.write_u32(pcr_index)?;
        self.finish();
        Ok(())
    }

    /// Build a complete TPM_Extend command.
    pub fn build_pcr_extend(&mut self, pcr_index: u32, digest: &[u8; DIGEST_LEN]) -> WireResult<()> {
        self.begin(tag::RQU_COMMAND, Ordinal::PcrExtend)?;
        self.write_u32(pcr_index)?;
        self.write_bytes(digest)?;
        self.finish();
        Ok(())
    }

    /// Build a complete TPM_GetRandom command.
    pub fn build_get_random(&mut self, num_bytes: u32) -> WireResult<()> {
        self.begin(tag::RQU_COMMAND, Ordinal::GetRandom)?;
        self.write_u32(num_bytes)?;
        self.finish();
        Ok(())
    }

    /// Build a complete TPM_Startup command.
    pub fn build_startup(&mut self, startup_type: u16) -> WireResult<()> {
        self.begin(tag::RQU_COMMAND, Ordinal::Startup)?;
        self.write_u16(startup_type)?;
        self.finish();
        Ok(())
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
