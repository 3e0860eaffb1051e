//! Application usage descriptor.
//!
//! Tag 0x16 has this meaning only inside an Application Information Table;
//! elsewhere the tag belongs to other definitions.

use std::any::Any;
use std::fmt::{self, Write};

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::{BitReader, BitWriter};
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{tag, table_id, DescriptorKey, Standards};
use crate::registry::{RegistryBuilder, RegistryEntry};
use crate::tree::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationUsageDescriptor {
    pub usage_type: u8,
}

impl ApplicationUsageDescriptor {
    pub const XML_NAME: &'static str = "application_usage_descriptor";
    pub const KEY: DescriptorKey =
        DescriptorKey::table_specific(tag::APPLICATION_USAGE, Standards::DVB, table_id::AIT);

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
            let usage = buf.read_u8();
            writeln!(disp, "{}Usage type: {} (0x{:02X})", margin, usage, usage)?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for ApplicationUsageDescriptor {
    fn key(&self) -> DescriptorKey {
        Self::KEY
    }

    fn xml_name(&self) -> &'static str {
        Self::XML_NAME
    }

    fn clear_content(&mut self) {
        self.usage_type = 0;
    }

    fn deserialize_payload(&mut self, buf: &mut BitReader<'_>) {
        self.usage_type = buf.read_u8();
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        buf.put_u8(self.usage_type);
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_int_attribute("usage_type", self.usage_type, true);
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        self.usage_type = element.get_int_attribute("usage_type", true, 0, 0, 0xFF)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SiContext;
    use crate::descriptor::{Descriptor, DescriptorList};
    use crate::registry;

    #[test]
    fn test_decoded_only_inside_ait() {
        let desc = Descriptor::new(0x16, vec![0x01]).unwrap();
        let reg = registry::global();

        let ait = SiContext::default().with_table_id(table_id::AIT);
        let decoded = reg.decode(&desc, &ait, None).unwrap().unwrap();
        assert_eq!(
            decoded
                .downcast_ref::<ApplicationUsageDescriptor>()
                .unwrap()
                .usage_type,
            1
        );

        let pmt = SiContext::default().with_table_id(table_id::PMT);
        assert!(reg.decode(&desc, &pmt, None).is_none());
    }

    #[test]
    fn test_list_display_in_ait() {
        let list = DescriptorList::parse(&[0x16, 0x01, 0x05]).unwrap();
        let mut disp = TablesDisplay::new();
        let ctx = SiContext::default().with_table_id(table_id::AIT);
        disp.display_descriptor_list(registry::global(), &list, "", &ctx)
            .unwrap();
        assert_eq!(
            disp.as_str(),
            "- Descriptor 0: Application Usage (0x16, 22), 1 bytes\n  Usage type: 5 (0x05)\n"
        );
    }

    #[quickcheck_macros::quickcheck]
    fn test_round_trip_any_usage_type(usage_type: u8) -> bool {
        let d = ApplicationUsageDescriptor { usage_type };

        let desc = d.serialize().unwrap();
        let mut from_bin = ApplicationUsageDescriptor::default();
        from_bin.deserialize(&desc).unwrap();

        let tree = d.to_xml();
        let reparsed = Element::parse_xml(&tree.to_xml_string().unwrap()).unwrap();
        let mut from_xml = ApplicationUsageDescriptor::default();
        from_xml.from_xml(&reparsed).unwrap();

        desc.payload() == &[usage_type][..]
            && from_bin == d
            && from_xml == d
            && from_xml.to_xml().equivalent(&tree)
    }
}
