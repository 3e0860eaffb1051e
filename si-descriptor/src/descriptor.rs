//! Raw descriptors and descriptor loops.
//!
//! Wire format of one descriptor:
//! ```text
//! +-----+--------+-------------------+
//! | Tag | Length |      Payload      |
//! | u8  |   u8   |   Length bytes    |
//! +-----+--------+-------------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, warn};

use crate::context::SiContext;
use crate::error::DescriptorError;
use crate::key::tag;
use crate::registry::Registry;
use crate::tree::Element;

/// Maximum payload size allowed by the one-byte length field.
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Tree name of descriptors kept as opaque bytes.
pub const GENERIC_XML_NAME: &str = "generic_descriptor";

/// One descriptor in wire form, payload still opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    tag: u8,
    payload: Bytes,
}

impl Descriptor {
    pub fn new(tag: u8, payload: impl Into<Bytes>) -> Result<Self, DescriptorError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(DescriptorError::PayloadTooLarge(payload.len()));
        }
        Ok(Self { tag, payload })
    }

    /// Parse one descriptor at the start of `data`.
    ///
    /// Returns the descriptor and the number of bytes it occupies.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), DescriptorError> {
        if data.len() < 2 {
            return Err(DescriptorError::Truncated {
                expected: 2,
                actual: data.len(),
            });
        }
        let length = data[1] as usize;
        if data.len() < 2 + length {
            return Err(DescriptorError::Truncated {
                expected: 2 + length,
                actual: data.len(),
            });
        }
        let desc = Self {
            tag: data[0],
            payload: Bytes::copy_from_slice(&data[2..2 + length]),
        };
        Ok((desc, 2 + length))
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Total size on the wire, header included.
    pub fn size(&self) -> usize {
        2 + self.payload.len()
    }

    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u8(self.tag);
        out.put_u8(self.payload.len() as u8);
        out.put_slice(&self.payload);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.size());
        self.write_to(&mut out);
        out.freeze()
    }

    /// Opaque tree form: `<generic_descriptor tag="0xNN">HEX</generic_descriptor>`.
    pub fn to_generic_xml(&self) -> Element {
        let mut el = Element::new(GENERIC_XML_NAME);
        el.set_int_attribute("tag", self.tag, true);
        el.set_hex_text(&self.payload);
        el
    }

    pub fn from_generic_xml(element: &Element) -> Result<Self, DescriptorError> {
        if element.name() != GENERIC_XML_NAME {
            return Err(DescriptorError::UnexpectedElement {
                expected: GENERIC_XML_NAME.to_string(),
                found: element.name().to_string(),
            });
        }
        let tag = element.get_int_attribute::<u8>("tag", true, 0, 0x00, 0xFF)?;
        Self::new(tag, element.get_hex_text()?)
    }
}

/// Lazy iterator over the descriptors of a loop.
///
/// Yields an error and stops if the loop ends inside a descriptor.
pub struct RawDescriptorIter<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> RawDescriptorIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for RawDescriptorIter<'a> {
    type Item = Result<Descriptor, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        match Descriptor::from_bytes(&self.data[self.offset..]) {
            Ok((desc, used)) => {
                self.offset += used;
                Some(Ok(desc))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Ordered descriptors of one descriptor loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorList {
    descriptors: Vec<Descriptor>,
}

impl DescriptorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split descriptor loop bytes. A truncated final descriptor is an error.
    pub fn parse(data: &[u8]) -> Result<Self, DescriptorError> {
        let descriptors = RawDescriptorIter::new(data).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { descriptors })
    }

    pub fn serialize(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.binary_size());
        for d in &self.descriptors {
            d.write_to(&mut out);
        }
        out.freeze()
    }

    pub fn binary_size(&self) -> usize {
        self.descriptors.iter().map(Descriptor::size).sum()
    }

    pub fn push(&mut self, desc: Descriptor) {
        self.descriptors.push(desc);
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Descriptor> {
        self.descriptors.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// Index of the first descriptor with `tag` at or after `start`.
    pub fn search(&self, tag: u8, start: usize) -> Option<usize> {
        self.descriptors
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, d)| d.tag == tag)
            .map(|(i, _)| i)
    }

    /// PDS set by the last private_data_specifier_descriptor before `index`.
    pub fn private_data_specifier(&self, index: usize) -> Option<u32> {
        self.descriptors[..index.min(self.descriptors.len())]
            .iter()
            .rev()
            .find(|d| d.tag == tag::PRIVATE_DATA_SPECIFIER && d.payload.len() >= 4)
            .map(|d| u32::from_be_bytes([d.payload[0], d.payload[1], d.payload[2], d.payload[3]]))
    }

    /// Append one child per descriptor to `parent`, typed when the registry
    /// resolves and decodes it, opaque otherwise.
    pub fn to_xml(&self, parent: &mut Element, registry: &Registry, context: &SiContext) {
        for (index, desc) in self.descriptors.iter().enumerate() {
            let loop_pds = self.private_data_specifier(index);
            match registry.decode(desc, context, loop_pds) {
                Some(Ok(typed)) => parent.push_child(typed.to_xml()),
                Some(Err(e)) => {
                    warn!("descriptor #{} kept as generic: {}", index, e);
                    parent.push_child(desc.to_generic_xml());
                }
                None => {
                    debug!(
                        "descriptor #{} tag 0x{:02X} unresolved, kept as generic",
                        index, desc.tag
                    );
                    parent.push_child(desc.to_generic_xml());
                }
            }
        }
    }

    /// Rebuild a loop from the children of `parent`.
    pub fn from_xml(parent: &Element, registry: &Registry) -> Result<Self, DescriptorError> {
        let mut list = Self::new();
        for child in parent.children() {
            let desc = if child.name() == GENERIC_XML_NAME {
                Descriptor::from_generic_xml(child)?
            } else {
                registry.from_xml(child)?.serialize()?
            };
            list.push(desc);
        }
        Ok(list)
    }
}

impl<'a> IntoIterator for &'a DescriptorList {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl FromIterator<Descriptor> for DescriptorList {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::pds;
    use crate::registry;

    #[test]
    fn test_parse_descriptor_loop() {
        let data = [
            0x52, 0x01, 0x07, // stream_identifier, length 1
            0x83, 0x00, // private tag, empty payload
            0x41, 0x03, 0x00, 0x10, 0x01, // service_list, length 3
        ];
        let list = DescriptorList::parse(&data).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).unwrap().tag(), 0x52);
        assert_eq!(list.get(0).unwrap().payload(), &[0x07]);
        assert_eq!(list.get(1).unwrap().payload_size(), 0);
        assert_eq!(list.get(2).unwrap().size(), 5);
        assert_eq!(&list.serialize()[..], &data[..]);
    }

    #[test]
    fn test_truncated_final_descriptor() {
        let data = [0x52, 0x01, 0x07, 0x41, 0x05, 0x00, 0x10];
        let r = DescriptorList::parse(&data);
        assert_eq!(
            r,
            Err(DescriptorError::Truncated {
                expected: 7,
                actual: 4
            })
        );

        let data = [0x52, 0x01, 0x07, 0x41];
        assert!(matches!(
            DescriptorList::parse(&data),
            Err(DescriptorError::Truncated { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let data = [0x52, 0x01, 0x07, 0x41, 0x09];
        let mut it = RawDescriptorIter::new(&data);
        assert!(it.next().unwrap().is_ok());
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_empty_loop() {
        let list = DescriptorList::parse(&[]).unwrap();
        assert!(list.is_empty());
        assert!(list.serialize().is_empty());
    }

    #[test]
    fn test_payload_too_large() {
        assert!(Descriptor::new(0x80, vec![0u8; 255]).is_ok());
        assert_eq!(
            Descriptor::new(0x80, vec![0u8; 256]),
            Err(DescriptorError::PayloadTooLarge(256))
        );
    }

    #[test]
    fn test_search_and_private_data_specifier() {
        let data = [
            0x83, 0x00, // before any PDS
            0x5F, 0x04, 0x00, 0x00, 0x00, 0x55, // PDS = Eutelsat
            0x83, 0x00, //
            0x5F, 0x04, 0x00, 0x00, 0x00, 0x28, // PDS = EACEM
            0x83, 0x00,
        ];
        let list = DescriptorList::parse(&data).unwrap();
        assert_eq!(list.search(0x83, 0), Some(0));
        assert_eq!(list.search(0x83, 1), Some(2));
        assert_eq!(list.search(0x99, 0), None);

        assert_eq!(list.private_data_specifier(0), None);
        assert_eq!(list.private_data_specifier(2), Some(pds::EUTELSAT));
        assert_eq!(list.private_data_specifier(4), Some(pds::EACEM));
    }

    #[test]
    fn test_generic_xml_round_trip() {
        let desc = Descriptor::new(0xE7, vec![0x01, 0xAB]).unwrap();
        let el = desc.to_generic_xml();
        assert_eq!(el.attribute("tag"), Some("0xE7"));
        assert_eq!(el.text(), "01AB");
        assert_eq!(Descriptor::from_generic_xml(&el), Ok(desc));
    }

    #[test]
    fn test_list_xml_round_trip() {
        let data = [
            0x5F, 0x04, 0x00, 0x00, 0x00, 0x55, // PDS = Eutelsat
            0x83, 0x08, 0x12, 0x34, 0x00, 0x01, 0x00, 0x99, 0xF0, 0x25, // ECN
            0xE7, 0x02, 0xCA, 0xFE, // unknown private tag
            0x83, 0x07, 0x12, 0x34, 0x00, 0x01, 0x00, 0x99, 0xF0, // malformed ECN
        ];
        let list = DescriptorList::parse(&data).unwrap();
        let reg = registry::global();
        let mut root = Element::new("descriptors");
        list.to_xml(&mut root, reg, &SiContext::default());

        let names: Vec<&str> = root.children().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "private_data_specifier_descriptor",
                "eutelsat_channel_number_descriptor",
                "generic_descriptor",
                "generic_descriptor",
            ]
        );

        let rebuilt = DescriptorList::from_xml(&root, reg).unwrap();
        assert_eq!(&rebuilt.serialize()[..], &data[..]);
    }
}
