//! EACEM logical channel number descriptor (private, PDS EACEM/EICTA).
//!
//! Shares tag 0x83 with the Eutelsat channel number descriptor; the
//! private data specifier in force selects which one applies.

use std::any::Any;
use std::fmt::{self, Write};

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::{BitReader, BitWriter};
use crate::descriptor::MAX_PAYLOAD_SIZE;
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{pds, tag, DescriptorKey, Standards};
use crate::registry::{RegistryBuilder, RegistryEntry};
use crate::tree::Element;

const ENTRY_SIZE: usize = 4;

pub const MAX_LOGICAL_CHANNEL_NUMBER: u16 = 0x03FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub service_id: u16,
    pub visible: bool,
    pub lcn: u16,
}

impl Entry {
    pub fn new(service_id: u16, visible: bool, lcn: u16) -> Self {
        Self {
            service_id,
            visible,
            lcn,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalChannelNumberDescriptor {
    pub entries: Vec<Entry>,
}

impl LogicalChannelNumberDescriptor {
    pub const XML_NAME: &'static str = "logical_channel_number_descriptor";
    pub const KEY: DescriptorKey =
        DescriptorKey::private(tag::LOGICAL_CHANNEL_NUMBER, Standards::DVB, pds::EACEM);
    pub const MAX_ENTRIES: usize = MAX_PAYLOAD_SIZE / ENTRY_SIZE;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::new())
    }

    pub fn register(builder: &mut RegistryBuilder) -> Result<(), DescriptorError> {
        builder.register(RegistryEntry {
            key: Self::KEY,
            xml_name: Self::XML_NAME,
            factory: Self::create,
            display: Self::display,
        })
    }

    pub fn display(disp: &mut TablesDisplay, buf: &mut BitReader<'_>, margin: &str) -> fmt::Result {
        while buf.remaining_bytes() >= ENTRY_SIZE {
            let sid = buf.read_u16();
            let visible = buf.read_bool();
            buf.skip_bits(5);
            let lcn = buf.read_bits(10);
            writeln!(
                disp,
                "{}Service Id: {:5} (0x{:04X}), Visible: {}, Channel number: {:3}",
                margin,
                sid,
                sid,
                if visible { "yes" } else { "no" },
                lcn
            )?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for LogicalChannelNumberDescriptor {
    fn key(&self) -> DescriptorKey {
        Self::KEY
    }

    fn xml_name(&self) -> &'static str {
        Self::XML_NAME
    }

    fn clear_content(&mut self) {
        self.entries.clear();
    }

    fn deserialize_payload(&mut self, buf: &mut BitReader<'_>) {
        while !buf.at_end() && !buf.has_error() {
            let sid = buf.read_u16();
            let visible = buf.read_bool();
            buf.skip_bits(5);
            let lcn = buf.read_bits(10) as u16;
            if !buf.has_error() {
                self.entries.push(Entry::new(sid, visible, lcn));
            }
        }
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        for e in &self.entries {
            buf.put_u16(e.service_id);
            buf.put_bool(e.visible);
            buf.put_reserved(5);
            buf.put_bits(e.lcn as u64, 10);
        }
    }

    fn build_xml(&self, root: &mut Element) {
        for e in &self.entries {
            let el = root.add_element("service");
            el.set_int_attribute("service_id", e.service_id, true);
            el.set_int_attribute("logical_channel_number", e.lcn, false);
            el.set_bool_attribute("visible_service", e.visible);
        }
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        for child in element.get_children("service", 0, Self::MAX_ENTRIES)? {
            let service_id = child.get_int_attribute("service_id", true, 0, 0, 0xFFFF)?;
            let lcn = child.get_int_attribute(
                "logical_channel_number",
                true,
                0,
                0,
                MAX_LOGICAL_CHANNEL_NUMBER,
            )?;
            let visible = child.get_bool_attribute("visible_service", false, true)?;
            self.entries.push(Entry::new(service_id, visible, lcn));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
