//! # Wedge Proto - TPM 1.2 Wire Codec
//!
//! Bit-exact definitions of the TPM 1.2 command transport as it appears on
//! the serial bus, shared by the interception engine, the console renderer,
//! and the host-side tooling.
//!
//! ## Wire Layout
//!
//! Every command is a fixed 10-byte header followed by an ordinal-specific
//! body; every response mirrors it with a response code in place of the
//! ordinal:
//!
//! ```text
//! ┌──────────┬──────────────┬───────────────┬──────────────────────────┐
//! │ tag: u16 │ length: u32  │ ordinal: u32  │ ordinal-specific body    │
//! ├──────────┼──────────────┼───────────────┼──────────────────────────┤
//! │ tag: u16 │ length: u32  │ code: u32     │ body (ordinal implied by │
//! │          │              │               │ the originating request) │
//! └──────────┴──────────────┴───────────────┴──────────────────────────┘
//! ```
//!
//! All multi-byte numeric fields are big-endian on the wire and are decoded
//! through explicit field extraction ([`ByteReader`]); wire bytes are never
//! reinterpreted in place as typed structs, so the codec is correct on any
//! host endianness. Digests and nonces are 20-byte opaque blobs read
//! verbatim, never byte-swapped.
//!
//! ## Key Pieces
//!
//! - **Headers**: [`CommandHeader`] / [`ResponseHeader`] parse + encode
//! - **Ordinals**: the closed [`Ordinal`] table with display names
//! - **Bodies**: [`parse_command`] / [`parse_response_body`] typed views
//! - **Assembly**: [`CommandBuffer`] for building requests host-side

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

pub mod body;
pub mod builder;
pub mod header;
pub mod ordinal;
pub mod wire;

pub use body::{parse_command, parse_response_body, ParsedCommand, RequestBody, ResponseBody};
pub use builder::CommandBuffer;
pub use header::{CommandHeader, ResponseHeader};
pub use ordinal::Ordinal;
pub use wire::ByteReader;

use core::fmt;

/// Size of the fixed command/response header.
pub const HEADER_LEN: usize = 10;

/// Size of a TPM 1.2 digest (SHA-1).
pub const DIGEST_LEN: usize = 20;

/// Size of a session nonce; same opaque 20-byte blob as a digest.
pub const NONCE_LEN: usize = DIGEST_LEN;

/// Largest random-byte payload a Get-Random response may carry.
pub const MAX_RANDOM_BYTES: usize = 128;

/// Backing capacity of [`CommandBuffer`]; covers every request the tooling
/// assembles with room to spare.
pub const MAX_COMMAND_LEN: usize = 256;

/// Command and response tags.
pub mod tag {
    /// Request without authorization sessions.
    pub const RQU_COMMAND: u16 = 0x00C1;
    /// Request carrying one authorization session.
    pub const RQU_AUTH1_COMMAND: u16 = 0x00C2;
    /// Request carrying two authorization sessions.
    pub const RQU_AUTH2_COMMAND: u16 = 0x00C3;
    /// Response without authorization sessions.
    pub const RSP_COMMAND: u16 = 0x00C4;
    /// Response carrying one authorization session.
    pub const RSP_AUTH1_COMMAND: u16 = 0x00C5;
    /// Response carrying two authorization sessions.
    pub const RSP_AUTH2_COMMAND: u16 = 0x00C6;
}

/// Result type for codec operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors from command assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// A write would exceed the builder's backing capacity.
    Overflow,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Overflow => write!(f, "command exceeds builder capacity"),
        }
    }
}
