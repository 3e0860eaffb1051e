//! Stream identifier descriptor: component tag of an elementary stream.

use std::any::Any;
use std::fmt::{self, Write};

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::{BitReader, BitWriter};
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{tag, DescriptorKey, Standards};
use crate::registry::{RegistryBuilder, RegistryEntry};
use crate::tree::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamIdentifierDescriptor {
    pub component_tag: u8,
}

impl StreamIdentifierDescriptor {
    pub const XML_NAME: &'static str = "stream_identifier_descriptor";
    pub const KEY: DescriptorKey =
        DescriptorKey::standard(tag::STREAM_IDENTIFIER, Standards::DVB);

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
        if buf.remaining_bytes() >= 1 {
            let ctag = buf.read_u8();
            writeln!(disp, "{}Component tag: {} (0x{:02X})", margin, ctag, ctag)?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for StreamIdentifierDescriptor {
    fn key(&self) -> DescriptorKey {
        Self::KEY
    }

    fn xml_name(&self) -> &'static str {
        Self::XML_NAME
    }

    fn clear_content(&mut self) {
        self.component_tag = 0;
    }

    fn deserialize_payload(&mut self, buf: &mut BitReader<'_>) {
        self.component_tag = buf.read_u8();
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        buf.put_u8(self.component_tag);
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_int_attribute("component_tag", self.component_tag, true);
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        self.component_tag = element.get_int_attribute("component_tag", true, 0, 0, 0xFF)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
