//! Registry-driven codec for MPEG/DVB/ISDB service information descriptors.
//!
//! A descriptor is a `tag | length | payload` triple found in the descriptor
//! loops of PSI/SI tables. This crate splits loops into raw descriptors,
//! resolves each one to a typed kind through a compound key (tag, private
//! data specifier, enclosing table, standards) and converts typed values
//! between binary, attribute-tree (XML) and human-readable forms.
//!
//! # Wire Format
//!
//! ```text
//! +--------+--------+---------------------+
//! |  Tag   | Length |       Payload       |
//! |   u8   |   u8   |  0..=255 bytes      |
//! +--------+--------+---------------------+
//! ```
//!
//! # Example
//!
//! ```rust
//! use si_descriptor::{registry, DescriptorList, Element, SiContext};
//! use si_descriptor::descriptors::EutelsatChannelNumberDescriptor;
//!
//! let data = [
//!     0x5F, 0x04, 0x00, 0x00, 0x00, 0x55, // private_data_specifier: Eutelsat
//!     0x83, 0x08, 0x12, 0x34, 0x00, 0x01, 0x00, 0x99, 0xF0, 0x25,
//! ];
//! let list = DescriptorList::parse(&data).unwrap();
//! let ctx = SiContext::default();
//!
//! // The 0x83 tag resolves through the PDS set by the preceding descriptor.
//! let typed = registry::global()
//!     .decode(list.get(1).unwrap(), &ctx, list.private_data_specifier(1))
//!     .unwrap()
//!     .unwrap();
//! let ecn = typed.downcast_ref::<EutelsatChannelNumberDescriptor>().unwrap();
//! assert_eq!(ecn.entries[0].channel_number, 37);
//!
//! // Export the loop as XML and rebuild identical bytes.
//! let mut root = Element::new("descriptors");
//! list.to_xml(&mut root, registry::global(), &ctx);
//! let rebuilt = DescriptorList::from_xml(&root, registry::global()).unwrap();
//! assert_eq!(&rebuilt.serialize()[..], &data[..]);
//! ```

pub mod abstract_descriptor;
pub mod bits;
pub mod context;
pub mod descriptor;
pub mod descriptors;
pub mod display;
pub mod error;
pub mod key;
pub mod registry;
pub mod tree;

pub use abstract_descriptor::AbstractDescriptor;
pub use bits::{BitReader, BitWriter};
pub use context::SiContext;
pub use descriptor::{Descriptor, DescriptorList, RawDescriptorIter, MAX_PAYLOAD_SIZE};
pub use display::TablesDisplay;
pub use error::DescriptorError;
pub use key::{DescriptorKey, Standards};
pub use registry::{Registry, RegistryBuilder, RegistryEntry};
pub use tree::Element;
