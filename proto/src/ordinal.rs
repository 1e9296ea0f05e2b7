//! TPM 1.2 command ordinals.
//!
//! The closed table of commands the interposer knows by name. It mirrors
//! what a Linux TPM 1.2 driver emits during boot, self-test, and ownership
//! operations; anything outside it is relayed untouched and displayed by
//! raw value.

use core::fmt;

/// Known command ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Ordinal {
    /// Open an object-independent authorization session.
    Oiap = 0x0A,
    /// Open an object-specific authorization session.
    Osap = 0x0B,
    /// Take ownership of the TPM.
    TakeOwnership = 0x0D,
    /// Fold a digest into a PCR.
    PcrExtend = 0x14,
    /// Read a PCR's current value.
    PcrRead = 0x15,
    /// Draw bytes from the hardware RNG.
    GetRandom = 0x46,
    /// Full self test.
    SelfTest = 0x50,
    /// Resume the power-on self test.
    ContinueSelfTest = 0x53,
    /// Owner-authorized clear.
    OwnerClear = 0x5B,
    /// Physical-presence clear.
    ForceClear = 0x5D,
    /// Query a capability area.
    GetCapability = 0x65,
    /// Owner-authorized capability query.
    GetCapabilityOwner = 0x66,
    /// Owner-authorized disable.
    OwnerSetDisable = 0x6E,
    /// Physical-presence enable.
    PhysicalEnable = 0x6F,
    /// Allow or block future ownership.
    SetOwnerInstall = 0x71,
    /// Physical-presence activate/deactivate.
    PhysicalSetDeactivated = 0x72,
    /// Install the operator authorization digest.
    SetOperatorAuth = 0x74,
    /// Read the public endorsement key.
    ReadPubek = 0x7C,
    /// Owner-authorized read of an internal public key.
    OwnerReadInternalPub = 0x81,
    /// Startup (clear/state/deactivated).
    Startup = 0x99,
    /// Flush a handle from TPM memory.
    FlushSpecific = 0xBA,
    /// Read from NV storage.
    NvReadValue = 0xCF,
    /// TSC physical presence assertion.
    TscPhysicalPresence = 0x4000_000A,
}

impl Ordinal {
    /// Look up a raw wire ordinal in the known table.
    pub fn from_raw(raw: u32) -> Option<Ordinal> {
        match raw {
            0x0A => Some(Ordinal::Oiap),
            0x0B => Some(Ordinal::Osap),
            0x0D => Some(Ordinal::TakeOwnership),
            0x14 => Some(Ordinal::PcrExtend),
            0x15 => Some(Ordinal::PcrRead),
            0x46 => Some(Ordinal::GetRandom),
            0x50 => Some(Ordinal::SelfTest),
            0x53 => Some(Ordinal::ContinueSelfTest),
            0x5B => Some(Ordinal::OwnerClear),
            0x5D => Some(Ordinal::ForceClear),
            0x65 => Some(Ordinal::GetCapability),
            0x66 => Some(Ordinal::GetCapabilityOwner),
            0x6E => Some(Ordinal::OwnerSetDisable),
            0x6F => Some(Ordinal::PhysicalEnable),
            0x71 => Some(Ordinal::SetOwnerInstall),
            0x72 => Some(Ordinal::PhysicalSetDeactivated),
            0x74 => Some(Ordinal::SetOperatorAuth),
            0x7C => Some(Ordinal::ReadPubek),
            0x81 => Some(Ordinal::OwnerReadInternalPub),
            0x99 => Some(Ordinal::Startup),
            0xBA => Some(Ordinal::FlushSpecific),
            0xCF => Some(Ordinal::NvReadValue),
            0x4000_000A => Some(Ordinal::TscPhysicalPresence),
            _ => None,
        }
    }

    /// Raw wire value.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Ordinal::Oiap => "OIAP",
            Ordinal::Osap => "OSAP",
            Ordinal::TakeOwnership => "TakeOwnership",
            Ordinal::PcrExtend => "PcrExtend",
            Ordinal::PcrRead => "PcrRead",
            Ordinal::GetRandom => "GetRandom",
            Ordinal::SelfTest => "SelfTest",
            Ordinal::ContinueSelfTest => "ContinueSelfTest",
            Ordinal::OwnerClear => "OwnerClear",
            Ordinal::ForceClear => "ForceClear",
            Ordinal::GetCapability => "GetCapability",
            Ordinal::GetCapabilityOwner => "GetCapabilityOwner",
            Ordinal::OwnerSetDisable => "OwnerSetDisable",
            Ordinal::PhysicalEnable => "PhysicalEnable",
            Ordinal::SetOwnerInstall => "SetOwnerInstall",
            Ordinal::PhysicalSetDeactivated => "PhysicalSetDeactivated",
            Ordinal::SetOperatorAuth => "SetOperatorAuth",
            Ordinal::ReadPubek => "ReadPubek",
            Ordinal::OwnerReadInternalPub => "OwnerReadInternalPub",
            Ordinal::Startup => "Startup",
            Ordinal::FlushSpecific => "FlushSpecific",
            Ordinal::NvReadValue => "NvReadValue",
            Ordinal::TscPhysicalPresence => "PhysicalPresence",
        }
    }

}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a raw wire value, `"Unknown"` outside the table.
pub fn name_of(raw: u32) -> &'static str {
    match Ordinal::from_raw(raw) {
        Some(ord) => ord.name(),
        None => "Unknown",
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_known() {
        assert_eq!(Ordinal::from_raw(0x14), Some(Ordinal::PcrExtend));
        assert_eq!(Ordinal::from_raw(0x15), Some(Ordinal::PcrRead));
        assert_eq!(Ordinal::from_raw(0x4000_000A), Some(Ordinal::TscPhysicalPresence));
    }

    #[test]
    fn test_from_raw_unknown() {
        assert_eq!(Ordinal::from_raw(0x0), None);
        assert_eq!(Ordinal::from_raw(0xDEAD_BEEF), None);
    }

    #[test]
    fn test_round_trip() {
        for raw in [0x0A, 0x0B, 0x0D, 0x14, 0x46, 0x99, 0xCF] {
            let ord = Ordinal::from_raw(raw).unwrap();
            assert_eq!(ord.as_u32(), raw);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(Ordinal::PcrExtend.name(), "PcrExtend");
        assert_eq!(name_of(0x46), "GetRandom");
        assert_eq!(name_of(0x1234_5678), "Unknown");
    }
}
