//! Human-readable rendering of descriptors.

use std::fmt::{self, Write};

use crate::bits::BitReader;
use crate::context::SiContext;
use crate::descriptor::{Descriptor, DescriptorList};
use crate::registry::Registry;

/// Bytes per line in hexadecimal dumps.
const HEX_LINE_BYTES: usize = 16;

/// Line-oriented text sink for descriptor display routines.
#[derive(Debug, Default)]
pub struct TablesDisplay {
    out: String,
}

impl TablesDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Hex dump, one line of up to 16 bytes each.
    pub fn display_hex(&mut self, data: &[u8], margin: &str) -> fmt::Result {
        for (i, chunk) in data.chunks(HEX_LINE_BYTES).enumerate() {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            writeln!(
                self,
                "{}{:04X}:  {:<width$}  {}",
                margin,
                i * HEX_LINE_BYTES,
                hex.join(" "),
                ascii,
                width = HEX_LINE_BYTES * 3 - 1
            )?;
        }
        Ok(())
    }

    /// Report what the cursor left unread.
    pub fn display_extra_data(&mut self, buf: &BitReader<'_>, margin: &str) -> fmt::Result {
        let rest = buf.remaining_slice();
        if !rest.is_empty() {
            writeln!(self, "{}Extraneous {} bytes:", margin, rest.len())?;
            self.display_hex(rest, &format!("{}  ", margin))?;
        }
        Ok(())
    }

    /// Header line plus payload rendering for one descriptor.
    pub fn display_descriptor(
        &mut self,
        registry: &Registry,
        desc: &Descriptor,
        index: usize,
        margin: &str,
        context: &SiContext,
        loop_pds: Option<u32>,
    ) -> fmt::Result {
        let tag = desc.tag();
        let entry = registry.resolve_in_context(tag, context, loop_pds);
        let title = entry.map_or_else(|| "unknown".to_string(), |e| e.title());
        writeln!(
            self,
            "{}- Descriptor {}: {} (0x{:02X}, {}), {} bytes",
            margin,
            index,
            title,
            tag,
            tag,
            desc.payload_size()
        )?;

        let inner = format!("{}  ", margin);
        let mut buf = BitReader::new(desc.payload());
        match entry {
            Some(e) => (e.display)(self, &mut buf, &inner),
            None => self.display_hex(desc.payload(), &inner),
        }
    }

    /// Display every descriptor of a loop, tracking the active PDS.
    pub fn display_descriptor_list(
        &mut self,
        registry: &Registry,
        list: &DescriptorList,
        margin: &str,
        context: &SiContext,
    ) -> fmt::Result {
        for (index, desc) in list.iter().enumerate() {
            let loop_pds = list.private_data_specifier(index);
            self.display_descriptor(registry, desc, index, margin, context, loop_pds)?;
        }
        Ok(())
    }
}

impl Write for TablesDisplay {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.push_str(s);
        Ok(())
    }
}
