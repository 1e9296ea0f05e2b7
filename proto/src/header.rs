//! Fixed 10-byte command and response headers.

use crate::wire::ByteReader;
use crate::HEADER_LEN;

/// Command header as sent host to TPM.
///
/// `len` counts the whole command including this header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Request tag, see [`crate::tag`].
    pub tag: u16,
    /// Total command length in bytes.
    pub len: u32,
    /// Command ordinal, raw wire value.
    pub ordinal: u32,
}

impl CommandHeader {
    /// Decode from the first 10 bytes of a buffer; `None` if shorter.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let mut r = ByteReader::new(buf);
        let tag = r.read_u16()?;
        let len = r.read_u32()?;
        let ordinal = r.read_u32()?;
        Some(Self { tag, len, ordinal })
    }

    /// Encode back to wire order.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.tag.to_be_bytes());
        out[2..6].copy_from_slice(&self.len.to_be_bytes());
        out[6..10].copy_from_slice(&self.ordinal.to_be_bytes());
        out
    }
}

/// Response header as sent TPM to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Response tag, see [`crate::tag`].
    pub tag: u16,
    /// Total response length in bytes.
    pub len: u32,
    /// TPM result code; zero is success.
    pub code: u32,
}

impl ResponseHeader {
    /// Decode from the first 10 bytes of a buffer; `None` if shorter.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let mut r = ByteReader::new(buf);
        let tag = r.read_u16()?;
        let len = r.read_u32()?;
        let code = r.read_u32()?;
        Some(Self { tag, len, code })
    }

    /// Encode back to wire order.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.tag.to_be_bytes());
        out[2..6].copy_from_slice(&self.len.to_be_bytes());
        out[6..10].copy_from_slice(&self.code.to_be_bytes());
        out
    }

    /// Whether the TPM reported success.
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    // Wire bytes of a PCR-Extend request header: tag 0x00C1, len 34, ord 0x14.
    const EXTEND_HDR: [u8; HEADER_LEN] =
        [0x00, 0xC1, 0x00, 0x00, 0x00, 0x22, 0x00, 0x00, 0x00, 0x14];

    #[test]
    fn test_command_header_parse() {
        let hdr = CommandHeader::parse(&EXTEND_HDR).unwrap();
        assert_eq!(hdr.tag, tag::RQU_COMMAND);
        assert_eq!(hdr.len, 34);
        assert_eq!(hdr.ordinal, 0x14);
    }

    #[test]
    fn test_command_header_encode_round_trip() {
        let hdr = CommandHeader::parse(&EXTEND_HDR).unwrap();
        assert_eq!(hdr.encode(), EXTEND_HDR);
    }

    #[test]
    fn test_short_buffer() {
        assert!(CommandHeader::parse(&EXTEND_HDR[..9]).is_none());
        assert!(ResponseHeader::parse(&[]).is_none());
    }

    #[test]
    fn test_response_header() {
        let wire = [0x00, 0xC4, 0x00, 0x00, 0x00, 0x1E, 0x00, 0x00, 0x00, 0x00];
        let hdr = ResponseHeader::parse(&wire).unwrap();
        assert_eq!(hdr.tag, tag::RSP_COMMAND);
        assert_eq!(hdr.len, 30);
        assert!(hdr.is_success());

        let failed = ResponseHeader { code: 0x26, ..hdr };
        assert!(!failed.is_success());
        assert_eq!(failed.encode()[9], 0x26);
    }
}
