//! Decoding context supplied by the enclosing table parser.

use serde::{Deserialize, Serialize};

use crate::key::{normalize_pds, Standards};

/// Context needed to resolve a raw tag to a descriptor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiContext {
    /// Standards active for the stream being analyzed.
    pub standards: Standards,
    /// PDS assumed for private tags when the loop carries no
    /// private_data_specifier_descriptor. Zero means none.
    pub default_pds: u32,
    /// Table id enclosing the descriptor loop, if known.
    pub table_id: Option<u8>,
}

impl Default for SiContext {
    fn default() -> Self {
        Self {
            standards: Standards::MPEG | Standards::DVB,
            default_pds: 0,
            table_id: None,
        }
    }
}

impl SiContext {
    pub fn new(standards: Standards) -> Self {
        Self {
            standards,
            ..Self::default()
        }
    }

    pub fn with_default_pds(mut self, pds: u32) -> Self {
        self.default_pds = pds;
        self
    }

    pub fn with_table_id(mut self, table_id: u8) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// PDS that applies to `tag` given the PDS currently active in a loop.
    pub fn effective_pds(&self, tag: u8, loop_pds: Option<u32>) -> u32 {
        normalize_pds(tag, loop_pds.unwrap_or(self.default_pds))
    }
}
