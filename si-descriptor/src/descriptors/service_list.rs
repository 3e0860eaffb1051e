//! Service list descriptor: services carried by a transport stream.

use std::any::Any;
use std::fmt::{self, Write};

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::{BitReader, BitWriter};
use crate::descriptor::MAX_PAYLOAD_SIZE;
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{tag, DescriptorKey, Standards};
use crate::registry::{RegistryBuilder, RegistryEntry};
use crate::tree::Element;

const ENTRY_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entry {
    pub service_id: u16,
    pub service_type: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceListDescriptor {
    pub entries: Vec<Entry>,
}

impl ServiceListDescriptor {
    pub const XML_NAME: &'static str = "service_list_descriptor";
    pub const KEY: DescriptorKey = DescriptorKey::standard(tag::SERVICE_LIST, Standards::DVB);
    pub const MAX_ENTRIES: usize = MAX_PAYLOAD_SIZE / ENTRY_SIZE;

    pub fn create() -> Box<dyn AbstractDescriptor> {
        Box::<Self>::default()
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
            let stype = buf.read_u8();
            writeln!(
                disp,
                "{}Service Id: {:5} (0x{:04X}), Type: 0x{:02X}",
                margin, sid, sid, stype
            )?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for ServiceListDescriptor {
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
            let service_id = buf.read_u16();
            let service_type = buf.read_u8();
            if !buf.has_error() {
                self.entries.push(Entry {
                    service_id,
                    service_type,
                });
            }
        }
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        for e in &self.entries {
            buf.put_u16(e.service_id);
            buf.put_u8(e.service_type);
        }
    }

    fn build_xml(&self, root: &mut Element) {
        for e in &self.entries {
            let el = root.add_element("service");
            el.set_int_attribute("service_id", e.service_id, true);
            el.set_int_attribute("service_type", e.service_type, true);
        }
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        for child in element.get_children("service", 0, Self::MAX_ENTRIES)? {
            self.entries.push(Entry {
                service_id: child.get_int_attribute("service_id", true, 0, 0, 0xFFFF)?,
                service_type: child.get_int_attribute("service_type", true, 0, 0, 0xFF)?,
            });
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
