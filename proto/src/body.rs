//! Typed body views for the decoded command set.
//!
//! Bodies are transient views borrowing the reassembled command or the
//! receive buffer; nothing here copies payload bytes. Ordinals outside the
//! decode table still yield the header, with the body marked unsupported.

use crate::header::CommandHeader;
use crate::ordinal::Ordinal;
use crate::wire::ByteReader;
use crate::{DIGEST_LEN, HEADER_LEN, MAX_RANDOM_BYTES, NONCE_LEN};

/// One decoded request: header plus a typed body view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// The fixed 10-byte header.
    pub header: CommandHeader,
    /// Body view dispatched on the header's ordinal.
    pub body: RequestBody<'a>,
}

/// Request body shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBody<'a> {
    /// PCR index to read.
    PcrRead {
        /// Target PCR.
        pcr_index: u32,
    },
    /// PCR index and digest to fold in.
    PcrExtend {
        /// Target PCR.
        pcr_index: u32,
        /// Digest to extend with.
        digest: &'a [u8; DIGEST_LEN],
    },
    /// Requested number of random bytes.
    GetRandom {
        /// Byte count requested from the RNG.
        num_bytes: u32,
    },
    /// Object-specific session setup.
    Osap {
        /// Entity type selector.
        entity_type: u16,
        /// Entity value (handle or index).
        entity_value: u32,
        /// Caller's OSAP nonce.
        nonce_odd: &'a [u8; NONCE_LEN],
    },
    /// Operator authorization installation.
    SetOperatorAuth {
        /// Operator authorization digest.
        auth: &'a [u8; DIGEST_LEN],
    },
    /// Capability query.
    GetCapability {
        /// Capability area selector.
        cap_area: u32,
        /// Sub-capability bytes, bounded by the declared size.
        sub_cap: &'a [u8],
    },
    /// Startup type selector.
    Startup {
        /// Clear, state, or deactivated.
        startup_type: u16,
    },
    /// Public endorsement key read.
    ReadPubek {
        /// Anti-replay nonce.
        anti_replay: &'a [u8; NONCE_LEN],
    },
    /// The ordinal carries no request arguments.
    Empty,
    /// Known ordinal, but fewer body bytes than its shape requires.
    Truncated,
    /// Ordinal outside the decode table; header-only decode.
    Unsupported,
}

/// Decode a reassembled command buffer.
///
/// Returns `None` only when `buf` cannot hold the fixed header. Body
/// decoding never fails the call: malformed or unknown bodies degrade to
/// [`RequestBody::Truncated`] / [`RequestBody::Unsupported`] so the caller
/// can keep relaying the traffic either way.
pub fn parse_command(buf: &[u8]) -> Option<ParsedCommand<'_>> {
    let header = CommandHeader::parse(buf)?;
    let mut r = ByteReader::new(&buf[HEADER_LEN..]);

    let body = match Ordinal::from_raw(header.ordinal) {
        Some(Ordinal::PcrRead) => match r.read_u32() {
            Some(pcr_index) => RequestBody::PcrRead { pcr_index },
            None => RequestBody::Truncated,
        },
        Some(Ordinal::PcrExtend) => match (r.read_u32(), r.read_digest()) {
            (Some(pcr_index), Some(digest)) => RequestBody::PcrExtend { pcr_index, digest },
            _ => RequestBody::Truncated,
        },
        Some(Ordinal::GetRandom) => match r.read_u32() {
            Some(num_bytes) => RequestBody::GetRandom { num_bytes },
            None => RequestBody::Truncated,
        },
        Some(Ordinal::Osap) => match (r.read_u16(), r.read_u32(), r.read_digest()) {
            (Some(entity_type), Some(entity_value), Some(nonce_odd)) => RequestBody::Osap {
                entity_type,
                entity_value,
                nonce_odd,
            },
            _ => RequestBody::Truncated,
        },
        Some(Ordinal::SetOperatorAuth) => match r.read_digest() {
            Some(auth) => RequestBody::SetOperatorAuth { auth },
            None => RequestBody::Truncated,
        },
        Some(Ordinal::GetCapability) => match (r.read_u32(), r.read_u32()) {
            (Some(cap_area), Some(sub_cap_size)) => {
                // Declared length bounded by what actually arrived.
                match r.read_bytes(sub_cap_size as usize) {
                    Some(sub_cap) => RequestBody::GetCapability { cap_area, sub_cap },
                    None => RequestBody::Truncated,
                }
            }
            _ => RequestBody::Truncated,
        },
        Some(Ordinal::Startup) => match r.read_u16() {
            Some(startup_type) => RequestBody::Startup { startup_type },
            None => RequestBody::Truncated,
        },
        Some(Ordinal::ReadPubek) => match r.read_digest() {
            Some(anti_replay) => RequestBody::ReadPubek { anti_replay },
            None => RequestBody::Truncated,
        },
        Some(Ordinal::Oiap) | Some(Ordinal::ContinueSelfTest) => RequestBody::Empty,
        Some(_) | None => RequestBody::Unsupported,
    };

    Some(ParsedCommand { header, body })
}

/// Response body shapes.
///
/// Responses carry no ordinal of their own; the variant is selected by the
/// ordinal of the request that provoked the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBody<'a> {
    /// PCR value read back.
    PcrRead {
        /// Current PCR contents.
        digest: &'a [u8; DIGEST_LEN],
    },
    /// PCR value after the extend.
    PcrExtend {
        /// New PCR contents.
        digest: &'a [u8; DIGEST_LEN],
    },
    /// Random bytes drawn from the RNG.
    GetRandom {
        /// Declared payload size.
        size: u32,
        /// The random bytes, bounded by the declared size.
        bytes: &'a [u8],
    },
    /// OSAP session grant.
    Osap {
        /// Authorization session handle.
        handle: u32,
        /// TPM's session nonce.
        nonce_even: &'a [u8; NONCE_LEN],
        /// TPM's OSAP nonce.
        nonce_even_osap: &'a [u8; NONCE_LEN],
    },
    /// OIAP session grant.
    Oiap {
        /// Authorization session handle.
        handle: u32,
        /// TPM's session nonce.
        nonce_even: &'a [u8; NONCE_LEN],
    },
    /// Capability query result.
    GetCapability {
        /// Capability payload, bounded by the declared size.
        data: &'a [u8],
    },
    /// The response carries no body.
    Empty,
    /// Known ordinal, but fewer body bytes than its shape requires.
    Truncated,
    /// Provoking ordinal outside the decode table.
    Unsupported,
}

/// Decode a response body read.
///
/// `body` holds only the bytes that followed the 10-byte response header;
/// reads are split header-then-body on the bus, so the two never arrive in
/// one buffer. `ordinal` is the raw wire ordinal of the provoking request,
/// supplied by the session tracker.
pub fn parse_response_body(ordinal: u32, body: &[u8]) -> ResponseBody<'_> {
    let mut r = ByteReader::new(body);

    match Ordinal::from_raw(ordinal) {
        Some(Ordinal::PcrRead) => match r.read_digest() {
            Some(digest) => ResponseBody::PcrRead { digest },
            None => ResponseBody::Truncated,
        },
        Some(Ordinal::PcrExtend) => match r.read_digest() {
            Some(digest) => ResponseBody::PcrExtend { digest },
            None => ResponseBody::Truncated,
        },
        Some(Ordinal::GetRandom) => match r.read_u32() {
            Some(size) if size as usize <= MAX_RANDOM_BYTES => {
                match r.read_bytes(size as usize) {
                    Some(bytes) => ResponseBody::GetRandom { size, bytes },
                    None => ResponseBody::Truncated,
                }
            }
            _ => ResponseBody::Truncated,
        },
        Some(Ordinal::Osap) => match (r.read_u32(), r.read_digest(), r.read_digest()) {
            (Some(handle), Some(nonce_even), Some(nonce_even_osap)) => ResponseBody::Osap {
                handle,
                nonce_even,
                nonce_even_osap,
            },
            _ => ResponseBody::Truncated,
        },
        Some(Ordinal::Oiap) => match (r.read_u32(), r.read_digest()) {
            (Some(handle), Some(nonce_even)) => ResponseBody::Oiap { handle, nonce_even },
            _ => ResponseBody::Truncated,
        },
        Some(Ordinal::GetCapability) => match r.read_u32() {
            Some(size) => match r.read_bytes(size as usize) {
                Some(data) => ResponseBody::GetCapability { data },
                None => ResponseBody::Truncated,
            },
            None => ResponseBody::Truncated,
        },
        Some(Ordinal::Startup)
        | Some(Ordinal::ContinueSelfTest)
        | Some(Ordinal::SetOperatorAuth) => ResponseBody::Empty,
        Some(_) | None => ResponseBody::Unsupported,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CommandBuffer;
    use crate::tag;

    #[test]
    fn test_parse_pcr_extend_request() {
        let mut cmd = CommandBuffer::new();
        cmd.build_pcr_extend(7, &[0xD9; DIGEST_LEN]).unwrap();

        let parsed = parse_command(cmd.as_slice()).unwrap();
        assert_eq!(parsed.header.tag, tag::RQU_COMMAND);
        assert_eq!(parsed.header.len, 34);
        assert_eq!(parsed.header.ordinal, Ordinal::PcrExtend.as_u32());
        match parsed.body {
            RequestBody::PcrExtend { pcr_index, digest } => {
                assert_eq!(pcr_index, 7);
                assert_eq!(digest, &[0xD9; DIGEST_LEN]);
            }
            other => panic!("wrong body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_truncated_extend() {
        let mut cmd = CommandBuffer::new();
        cmd.build_pcr_extend(7, &[0xD9; DIGEST_LEN]).unwrap();
        // Cut into the digest: known ordinal, short body.
        let parsed = parse_command(&cmd.as_slice()[..20]).unwrap();
        assert_eq!(parsed.body, RequestBody::Truncated);
    }

    #[test]
    fn test_parse_unknown_ordinal() {
        let hdr = CommandHeader {
            tag: tag::RQU_COMMAND,
            len: 10,
            ordinal: 0x7FFF_0001,
        };
        let raw = hdr.encode();
        let parsed = parse_command(&raw).unwrap();
        assert_eq!(parsed.body, RequestBody::Unsupported);
        assert_eq!(parsed.header.ordinal, 0x7FFF_0001);
    }

    #[test]
    fn test_parse_no_header() {
        assert!(parse_command(&[0x00, 0xC1, 0x00]).is_none());
    }

    #[test]
    fn test_parse_oiap_request_has_no_args() {
        let hdr = CommandHeader {
            tag: tag::RQU_COMMAND,
            len: 10,
            ordinal: Ordinal::Oiap.as_u32(),
        };
        let raw = hdr.encode();
        let parsed = parse_command(&raw).unwrap();
        assert_eq!(parsed.body, RequestBody::Empty);
    }

    #[test]
    fn test_get_capability_sub_cap_bounded() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(tag::RQU_COMMAND, Ordinal::GetCapability).unwrap();
        cmd.write_u32(0x05).unwrap();
        cmd.write_u32(64).unwrap(); // declares 64 sub-cap bytes
        cmd.write_u32(0x0000_000A).unwrap(); // delivers only 4
        cmd.finish();

        let parsed = parse_command(cmd.as_slice()).unwrap();
        assert_eq!(parsed.body, RequestBody::Truncated);
    }

    #[test]
    fn test_get_random_response_round_trip() {
        // 4-byte big-endian size followed by that many bytes.
        let mut body = [0u8; 20];
        body[0..4].copy_from_slice(&16u32.to_be_bytes());
        for (i, b) in body[4..].iter_mut().enumerate() {
            *b = i as u8;
        }

        match parse_response_body(Ordinal::GetRandom.as_u32(), &body) {
            ResponseBody::GetRandom { size, bytes } => {
                assert_eq!(size, 16);
                assert_eq!(bytes.len(), 16);
                assert_eq!(bytes[15], 15);
            }
            other => panic!("wrong body: {:?}", other),
        }
    }

    #[test]
    fn test_get_random_response_oversized_declaration() {
        let mut body = [0u8; 8];
        body[0..4].copy_from_slice(&500u32.to_be_bytes());
        assert_eq!(
            parse_response_body(Ordinal::GetRandom.as_u32(), &body),
            ResponseBody::Truncated
        );
    }

    #[test]
    fn test_osap_response() {
        let mut body = [0u8; 4 + NONCE_LEN + NONCE_LEN];
        body[0..4].copy_from_slice(&0x0200_0001u32.to_be_bytes());
        body[4..24].fill(0xEE);
        body[24..44].fill(0x0F);

        match parse_response_body(Ordinal::Osap.as_u32(), &body) {
            ResponseBody::Osap {
                handle,
                nonce_even,
                nonce_even_osap,
            } => {
                assert_eq!(handle, 0x0200_0001);
                assert_eq!(nonce_even, &[0xEE; NONCE_LEN]);
                assert_eq!(nonce_even_osap, &[0x0F; NONCE_LEN]);
            }
            other => panic!("wrong body: {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_unsupported_responses() {
        assert_eq!(
            parse_response_body(Ordinal::Startup.as_u32(), &[]),
            ResponseBody::Empty
        );
        assert_eq!(
            parse_response_body(Ordinal::TakeOwnership.as_u32(), &[1, 2, 3]),
            ResponseBody::Unsupported
        );
        assert_eq!(parse_response_body(0xABCD, &[]), ResponseBody::Unsupported);
    }
}
