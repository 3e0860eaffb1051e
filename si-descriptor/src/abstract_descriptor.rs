//! Contract implemented by every typed descriptor kind.

use std::any::Any;
use std::fmt;

use crate::bits::{BitReader, BitWriter};
use crate::descriptor::Descriptor;
use crate::error::DescriptorError;
use crate::key::DescriptorKey;
use crate::tree::Element;

/// A typed descriptor value.
///
/// Implementors only provide the payload-level hooks; the provided methods
/// add the framing, validation and tree-root handling shared by all kinds.
pub trait AbstractDescriptor: Any + fmt::Debug + Send + Sync {
    /// Wire identity of this kind.
    fn key(&self) -> DescriptorKey;

    /// Name of the root element in tree form.
    fn xml_name(&self) -> &'static str;

    /// Reset to the empty value.
    fn clear_content(&mut self);

    /// Decode the payload from the current cursor position to its end.
    ///
    /// Underruns are reported through the cursor error flag only; entries
    /// decoded before the error are kept.
    fn deserialize_payload(&mut self, buf: &mut BitReader<'_>);

    /// Encode the payload, reserved bits set to one.
    fn serialize_payload(&self, buf: &mut BitWriter);

    /// Add attributes and children to the already-named root element.
    fn build_xml(&self, root: &mut Element);

    /// Fill from a root element whose name was already checked.
    fn analyze_xml(&mut self, element: &Element) -> Result<(), DescriptorError>;

    fn as_any(&self) -> &dyn Any;

    fn tag(&self) -> u8 {
        self.key().tag
    }

    /// Decode a raw descriptor.
    ///
    /// Fails when the cursor reports an underrun or when payload bytes are
    /// left over. On failure `self` keeps whatever was decoded before the
    /// error, which display code may still use.
    fn deserialize(&mut self, desc: &Descriptor) -> Result<(), DescriptorError> {
        self.clear_content();
        let tag = self.tag();
        if desc.tag() != tag {
            return Err(DescriptorError::malformed(
                desc.tag(),
                format!("cannot decode as {} (tag 0x{:02X})", self.xml_name(), tag),
            ));
        }

        let mut buf = BitReader::new(desc.payload());
        self.deserialize_payload(&mut buf);
        if buf.has_error() {
            return Err(DescriptorError::malformed(
                tag,
                format!(
                    "{}-byte payload does not match {} layout",
                    desc.payload_size(),
                    self.xml_name()
                ),
            ));
        }
        if !buf.at_end() {
            return Err(DescriptorError::malformed(
                tag,
                format!("{} extraneous bits", buf.remaining_bits()),
            ));
        }
        Ok(())
    }

    /// Encode into a raw descriptor.
    fn serialize(&self) -> Result<Descriptor, DescriptorError> {
        let mut buf = BitWriter::new();
        self.serialize_payload(&mut buf);
        debug_assert!(buf.is_byte_aligned(), "{} payload not byte aligned", self.xml_name());
        Descriptor::new(self.tag(), buf.into_bytes())
    }

    fn to_xml(&self) -> Element {
        let mut root = Element::new(self.xml_name());
        self.build_xml(&mut root);
        root
    }

    /// Rebuild from tree form. Any invalid attribute fails the whole call
    /// and leaves the value empty.
    fn from_xml(&mut self, element: &Element) -> Result<(), DescriptorError> {
        if element.name() != self.xml_name() {
            return Err(DescriptorError::UnexpectedElement {
                expected: self.xml_name().to_string(),
                found: element.name().to_string(),
            });
        }
        self.clear_content();
        let result = self.analyze_xml(element);
        if result.is_err() {
            self.clear_content();
        }
        result
    }
}

impl dyn AbstractDescriptor {
    pub fn downcast_ref<T: AbstractDescriptor>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: AbstractDescriptor>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
