//! Eutelsat channel number descriptor (private, PDS Eutelsat).
//!
//! The payload is a repetition of 8-byte entries, without count field:
//!
//! ```text
//! original_network_id    16
//! transport_stream_id    16
//! service_id             16
//! reserved                4
//! eutelsat_channel_number 12
//! ```

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

const ENTRY_SIZE: usize = 8;

/// Channel numbers are transmitted on 12 bits but only 10 are meaningful.
pub const MAX_CHANNEL_NUMBER: u16 = 0x03FF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entry {
    pub original_network_id: u16,
    pub transport_stream_id: u16,
    pub service_id: u16,
    pub channel_number: u16,
}

impl Entry {
    pub fn new(
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
        channel_number: u16,
    ) -> Self {
        Self {
            original_network_id,
            transport_stream_id,
            service_id,
            channel_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EutelsatChannelNumberDescriptor {
    pub entries: Vec<Entry>,
}

impl EutelsatChannelNumberDescriptor {
    pub const XML_NAME: &'static str = "eutelsat_channel_number_descriptor";
    pub const KEY: DescriptorKey =
        DescriptorKey::private(tag::EUTELSAT_CHANNEL_NUMBER, Standards::DVB, pds::EUTELSAT);
    /// Entries fitting in one descriptor.
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

    /// Print complete entries, then whatever bytes do not form one.
    pub fn display(disp: &mut TablesDisplay, buf: &mut BitReader<'_>, margin: &str) -> fmt::Result {
        while buf.remaining_bytes() >= ENTRY_SIZE {
            let onid = buf.read_u16();
            let tsid = buf.read_u16();
            let sid = buf.read_u16();
            buf.skip_bits(4);
            let channel = buf.read_bits(12);
            writeln!(
                disp,
                "{}Service Id: {:5} (0x{:04X}), Channel number: {:3}, TS Id: {:5} (0x{:04X}), Net Id: {:5} (0x{:04X})",
                margin, sid, sid, channel, tsid, tsid, onid, onid
            )?;
        }
        disp.display_extra_data(buf, margin)
    }
}

impl AbstractDescriptor for EutelsatChannelNumberDescriptor {
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
            let onid = buf.read_u16();
            let tsid = buf.read_u16();
            let sid = buf.read_u16();
            buf.skip_bits(4);
            let channel = buf.read_bits(12) as u16;
            if !buf.has_error() {
                self.entries.push(Entry::new(onid, tsid, sid, channel));
            }
        }
    }

    fn serialize_payload(&self, buf: &mut BitWriter) {
        for e in &self.entries {
            buf.put_u16(e.original_network_id);
            buf.put_u16(e.transport_stream_id);
            buf.put_u16(e.service_id);
            buf.put_reserved(4);
            buf.put_bits(e.channel_number as u64, 12);
        }
    }

    fn build_xml(&self, root: &mut Element) {
        for e in &self.entries {
            let el = root.add_element("service");
            el.set_int_attribute("original_network_id", e.original_network_id, true);
            el.set_int_attribute("transport_stream_id", e.transport_stream_id, true);
            el.set_int_attribute("service_id", e.service_id, true);
            el.set_int_attribute("eutelsat_channel_number", e.channel_number, false);
        }
    }

    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        for child in element.get_children("service", 0, Self::MAX_ENTRIES)? {
            self.entries.push(Entry {
                original_network_id: child.get_int_attribute(
                    "original_network_id",
                    true,
                    0,
                    0,
                    0xFFFF,
                )?,
                transport_stream_id: child.get_int_attribute(
                    "transport_stream_id",
                    true,
                    0,
                    0,
                    0xFFFF,
                )?,
                service_id: child.get_int_attribute("service_id", true, 0, 0, 0xFFFF)?,
                channel_number: child.get_int_attribute(
                    "eutelsat_channel_number",
                    true,
                    0,
                    0,
                    MAX_CHANNEL_NUMBER,
                )?,
            });
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    const SAMPLE: [u8; 8] = [0x12, 0x34, 0x00, 0x01, 0x00, 0x99, 0xF0, 0x25];

    fn sample() -> EutelsatChannelNumberDescriptor {
        EutelsatChannelNumberDescriptor {
            entries: vec![Entry::new(0x1234, 0x0001, 0x0099, 37)],
        }
    }

    fn display_payload(payload: &[u8]) -> String {
        let mut disp = TablesDisplay::new();
        let mut buf = BitReader::new(payload);
        EutelsatChannelNumberDescriptor::display(&mut disp, &mut buf, "").unwrap();
        disp.into_string()
    }

    #[test]
    fn test_serialize_one_entry() {
        let desc = sample().serialize().unwrap();
        assert_eq!(desc.tag(), 0x83);
        assert_eq!(desc.payload(), &SAMPLE);

        let mut buf = BitReader::new(desc.payload());
        let mut back = EutelsatChannelNumberDescriptor::new();
        back.deserialize_payload(&mut buf);
        assert_eq!(buf.remaining_bits(), 0);
        assert!(!buf.has_error());
        assert_eq!(back, sample());
    }

    #[test]
    fn test_reserved_bits_ignored_on_decode() {
        let mut payload = SAMPLE;
        payload[6] = 0x00;
        let desc = Descriptor::new(0x83, payload.to_vec()).unwrap();
        let mut d = EutelsatChannelNumberDescriptor::new();
        d.deserialize(&desc).unwrap();
        assert_eq!(d.entries[0].channel_number, 37);
    }

    #[test]
    fn test_empty_payload() {
        let desc = Descriptor::new(0x83, Vec::new()).unwrap();
        let mut d = sample();
        d.deserialize(&desc).unwrap();
        assert!(d.entries.is_empty());
    }

    #[test]
    fn test_short_payload_is_malformed() {
        let desc = Descriptor::new(0x83, SAMPLE[..7].to_vec()).unwrap();
        let mut d = EutelsatChannelNumberDescriptor::new();
        assert!(matches!(
            d.deserialize(&desc),
            Err(DescriptorError::Malformed { tag: 0x83, .. })
        ));
        assert!(d.entries.is_empty());
    }

    #[test]
    fn test_partial_entry_keeps_whole_ones() {
        let mut payload = SAMPLE.to_vec();
        payload.extend_from_slice(&SAMPLE[..7]);
        let mut buf = BitReader::new(&payload);
        let mut d = EutelsatChannelNumberDescriptor::new();
        d.deserialize_payload(&mut buf);
        assert!(buf.has_error());
        assert_eq!(d.entries.len(), 1);

        let desc = Descriptor::new(0x83, payload).unwrap();
        assert!(d.deserialize(&desc).is_err());
        assert_eq!(d, sample());
    }

    #[test]
    fn test_xml_round_trip() {
        let tree = sample().to_xml();
        assert_eq!(tree.name(), "eutelsat_channel_number_descriptor");
        let service = &tree.children()[0];
        assert_eq!(service.attribute("original_network_id"), Some("0x1234"));
        assert_eq!(service.attribute("service_id"), Some("0x0099"));
        assert_eq!(service.attribute("eutelsat_channel_number"), Some("37"));

        let mut back = EutelsatChannelNumberDescriptor::new();
        back.from_xml(&tree).unwrap();
        assert_eq!(back, sample());
        assert!(back.to_xml().equivalent(&tree));
    }

    #[test]
    fn test_xml_channel_out_of_range() {
        let mut service = sample().to_xml().children()[0].clone();
        service.set_attribute("eutelsat_channel_number", "0x0400");
        let mut root = Element::new(EutelsatChannelNumberDescriptor::XML_NAME);
        root.push_child(service);

        let mut d = sample();
        assert!(matches!(
            d.from_xml(&root),
            Err(DescriptorError::OutOfRange { .. })
        ));
        assert!(d.entries.is_empty());
    }

    #[test]
    fn test_xml_missing_attribute() {
        let mut root = Element::new(EutelsatChannelNumberDescriptor::XML_NAME);
        let s = root.add_element("service");
        s.set_attribute("original_network_id", "1");
        s.set_attribute("transport_stream_id", "1");
        s.set_attribute("eutelsat_channel_number", "1");
        let mut d = EutelsatChannelNumberDescriptor::new();
        assert!(matches!(
            d.from_xml(&root),
            Err(DescriptorError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_xml_too_many_entries() {
        let mut root = Element::new(EutelsatChannelNumberDescriptor::XML_NAME);
        for i in 0..=EutelsatChannelNumberDescriptor::MAX_ENTRIES as u16 {
            let s = root.add_element("service");
            s.set_int_attribute("original_network_id", i, true);
            s.set_int_attribute("transport_stream_id", i, true);
            s.set_int_attribute("service_id", i, true);
            s.set_int_attribute("eutelsat_channel_number", i, false);
        }
        let mut d = EutelsatChannelNumberDescriptor::new();
        assert!(matches!(
            d.from_xml(&root),
            Err(DescriptorError::ChildCount { count: 32, max: 31, .. })
        ));
    }

    #[test]
    fn test_max_entries_fit_in_payload() {
        let d = EutelsatChannelNumberDescriptor {
            entries: vec![Entry::default(); EutelsatChannelNumberDescriptor::MAX_ENTRIES],
        };
        let desc = d.serialize().unwrap();
        assert_eq!(desc.payload_size(), 248);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            display_payload(&SAMPLE),
            "Service Id:   153 (0x0099), Channel number:  37, TS Id:     1 (0x0001), Net Id:  4660 (0x1234)\n"
        );
    }

    #[test]
    fn test_display_truncated() {
        let mut payload = SAMPLE.to_vec();
        payload.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let text = display_payload(&payload);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Service Id:   153"));
        assert_eq!(lines[1], "Extraneous 3 bytes:");
        assert!(lines[2].starts_with("  0000:  AA BB CC"));
        assert_eq!(lines.len(), 3);
    }

    #[quickcheck_macros::quickcheck]
    fn test_round_trip_in_range(mut raw: Vec<(u16, u16, u16, u16)>) -> bool {
        raw.truncate(EutelsatChannelNumberDescriptor::MAX_ENTRIES);
        let d = EutelsatChannelNumberDescriptor {
            entries: raw
                .into_iter()
                .map(|(onid, tsid, sid, ch)| Entry::new(onid, tsid, sid, ch & MAX_CHANNEL_NUMBER))
                .collect(),
        };

        let desc = d.serialize().unwrap();
        let mut from_bin = EutelsatChannelNumberDescriptor::new();
        from_bin.deserialize(&desc).unwrap();

        let tree = d.to_xml();
        let reparsed = Element::parse_xml(&tree.to_xml_string().unwrap()).unwrap();
        let mut from_xml = EutelsatChannelNumberDescriptor::new();
        from_xml.from_xml(&reparsed).unwrap();

        from_bin == d && from_xml == d && from_bin.to_xml().equivalent(&tree)
    }
}
