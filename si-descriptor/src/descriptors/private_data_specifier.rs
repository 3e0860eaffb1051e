//! Private data specifier descriptor.
//!
//! Sets the PDS that qualifies every following private descriptor of the
//! same loop.

use std::any::Any;
use std::fmt::{self, Write};

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::{BitReader, BitWriter};
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{pds_name, tag, DescriptorKey, Standards};
use crate::registry::{RegistryBuilder, RegistryEntry};
use crate::tree::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivateDataSpecifierDescriptor {
    pub pds: u32,
}

impl PrivateDataSpecifierDescriptor {
    pub const XML_NAME: &'static str = "private_data_specifier_descriptor";
    pub const KEY: DescriptorKey =
        DescriptorKey::standard(tag::PRIVATE_DATA_SPECIFIER, Standards::DVB);

    pub fn new(pds: u32) -> Self {
        Self { pds }
    }

    pub fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
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
        if buf.remaining_bytes() >= 4 {
            let value = buf.read_u32();
            writeln!(disp, "{}Specifier: 0x{:08X} ({})", margin, value, pds_name(value))?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for PrivateDataSpecifierDescriptor {
    fn key(&self) -> DescriptorKey {
        Self::KEY
    }

    fn xml_name(&self) -> &'static str {
        Self::XML_NAME
    }

    fn clear_content(&mut self) {
        self.pds = 0;
    }

    fn deserialize_payload(&mut self, buf: &mut BitReader<'_>) {
        self.pds = buf.read_u32();
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        buf.put_u32(self.pds);
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_int_attribute("private_data_specifier", self.pds, true);
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        self.pds =
            element.get_int_attribute("private_data_specifier", true, 0, 0, u32::MAX)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
