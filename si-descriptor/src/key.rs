//! Compound descriptor identity used for registry dispatch.
//!
//! A tag byte alone does not identify a descriptor: tags `>= 0x80` are
//! private and only meaningful under a private data specifier, and a few
//! tags change meaning inside specific tables.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Well-known descriptor tags.
pub mod tag {
    pub const APPLICATION_USAGE: u8 = 0x16;
    pub const SERVICE_LIST: u8 = 0x41;
    pub const STREAM_IDENTIFIER: u8 = 0x52;
    pub const PRIVATE_DATA_SPECIFIER: u8 = 0x5F;
    pub const EUTELSAT_CHANNEL_NUMBER: u8 = 0x83;
    pub const LOGICAL_CHANNEL_NUMBER: u8 = 0x83;

    /// First tag of the private (user defined) range.
    pub const PRIVATE_RANGE_START: u8 = 0x80;
}

/// Registered private data specifier values.
pub mod pds {
    pub const EACEM: u32 = 0x0000_0028;
    pub const EUTELSAT: u32 = 0x0000_0055;
    pub const NORDIG: u32 = 0x0000_0029;
    pub const OFCOM: u32 = 0x0000_233A;
}

/// Table ids used as descriptor context.
pub mod table_id {
    pub const PMT: u8 = 0x02;
    pub const NIT_ACTUAL: u8 = 0x40;
    pub const NIT_OTHER: u8 = 0x41;
    pub const SDT_ACTUAL: u8 = 0x42;
    pub const SDT_OTHER: u8 = 0x46;
    pub const BAT: u8 = 0x4A;
    pub const AIT: u8 = 0x74;
}

/// Set of protocol families a descriptor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standards(u16);

impl Standards {
    /// Standard-agnostic.
    pub const NONE: Standards = Standards(0x0000);
    pub const MPEG: Standards = Standards(0x0001);
    pub const DVB: Standards = Standards(0x0002);
    pub const SCTE: Standards = Standards(0x0004);
    pub const ATSC: Standards = Standards(0x0008);
    pub const ISDB: Standards = Standards(0x0010);
    pub const JAPAN: Standards = Standards(0x0020);
    pub const ABNT: Standards = Standards(0x0040);

    const NAMES: [(Standards, &'static str); 7] = [
        (Standards::MPEG, "MPEG"),
        (Standards::DVB, "DVB"),
        (Standards::SCTE, "SCTE"),
        (Standards::ATSC, "ATSC"),
        (Standards::ISDB, "ISDB"),
        (Standards::JAPAN, "JAPAN"),
        (Standards::ABNT, "ABNT"),
    ];

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Standards) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Standards) -> bool {
        self.0 & other.0 != 0
    }

    /// Parse one standard name, case-insensitive.
    pub fn from_name(name: &str) -> Option<Standards> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("none") {
            return Some(Standards::NONE);
        }
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(s, _)| *s)
    }

    /// Parse a comma separated list such as `"DVB, ISDB"`.
    pub fn parse_list(list: &str) -> Option<Standards> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .try_fold(Standards::NONE, |acc, s| Some(acc | Self::from_name(s)?))
    }
}

impl BitOr for Standards {
    type Output = Standards;

    fn bitor(self, rhs: Standards) -> Standards {
        Standards(self.0 | rhs.0)
    }
}

impl BitOrAssign for Standards {
    fn bitor_assign(&mut self, rhs: Standards) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Standards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (s, name) in Self::NAMES.iter() {
            if self.contains(*s) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Fully-specified descriptor identity.
///
/// The private data specifier is normalized to zero for tags below
/// [`tag::PRIVATE_RANGE_START`], so two keys for a public tag never differ
/// only by PDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorKey {
    pub tag: u8,
    pub standards: Standards,
    pub pds: u32,
    /// `None` means valid in any table.
    pub table_id: Option<u8>,
}

impl DescriptorKey {
    /// Descriptor defined by a standard, valid in any table.
    pub const fn standard(tag: u8, standards: Standards) -> Self {
        Self {
            tag,
            standards,
            pds: 0,
            table_id: None,
        }
    }

    /// Private descriptor, only meaningful under `pds`.
    pub const fn private(tag: u8, standards: Standards, pds: u32) -> Self {
        Self {
            tag,
            standards,
            pds: normalize_pds(tag, pds),
            table_id: None,
        }
    }

    /// Descriptor whose meaning is specific to one table.
    pub const fn table_specific(tag: u8, standards: Standards, table_id: u8) -> Self {
        Self {
            tag,
            standards,
            pds: 0,
            table_id: Some(table_id),
        }
    }

    pub fn is_private(&self) -> bool {
        is_private_tag(self.tag)
    }

    /// Identity used for lookup, ignoring the standards set.
    pub(crate) fn lookup_id(&self) -> (u8, u32, Option<u8>) {
        (self.tag, self.pds, self.table_id)
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag 0x{:02X} [{}]", self.tag, self.standards)?;
        if self.is_private() {
            write!(f, ", PDS 0x{:08X}", self.pds)?;
        }
        if let Some(tid) = self.table_id {
            write!(f, ", table 0x{:02X}", tid)?;
        }
        Ok(())
    }
}

pub const fn is_private_tag(tag: u8) -> bool {
    tag >= tag::PRIVATE_RANGE_START
}

/// PDS only applies to private tags.
pub const fn normalize_pds(tag: u8, pds: u32) -> u32 {
    if is_private_tag(tag) {
        pds
    } else {
        0
    }
}

/// Human-readable name of a private data specifier.
pub fn pds_name(value: u32) -> &'static str {
    match value {
        pds::EACEM => "EACEM/EICTA",
        pds::EUTELSAT => "Eutelsat",
        pds::NORDIG => "NorDig",
        pds::OFCOM => "Ofcom",
        _ => "unknown",
    }
}
