//! Process-wide descriptor registry.
//!
//! Kinds are registered once through an explicit, ordered initialization
//! routine ([`crate::descriptors::register_all`]); the resulting [`Registry`]
//! is immutable and shared without locking. Applications needing extra kinds
//! build their own registry from [`RegistryBuilder::with_builtins`].

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use once_cell::sync::Lazy;

use crate::abstract_descriptor::AbstractDescriptor;
use crate::bits::BitReader;
use crate::context::SiContext;
use crate::descriptor::Descriptor;
use crate::display::TablesDisplay;
use crate::error::DescriptorError;
use crate::key::{normalize_pds, DescriptorKey, Standards};
use crate::tree::Element;

/// Creates an empty value of one descriptor kind.
pub type Factory = fn() -> Box<dyn AbstractDescriptor>;

/// Renders a payload as human-readable lines.
///
/// The cursor is scoped to exactly the descriptor payload.
pub type DisplayFn = fn(&mut TablesDisplay, &mut BitReader<'_>, &str) -> fmt::Result;

/// Registration record of one descriptor kind.
#[derive(Clone)]
pub struct RegistryEntry {
    pub key: DescriptorKey,
    pub xml_name: &'static str,
    pub factory: Factory,
    pub display: DisplayFn,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("key", &self.key)
            .field("xml_name", &self.xml_name)
            .finish()
    }
}

impl RegistryEntry {
    /// Display title derived from the XML name,
    /// e.g. `service_list_descriptor` gives `Service List`.
    pub fn title(&self) -> String {
        self.xml_name
            .trim_end_matches("_descriptor")
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Collects registrations before freezing them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistryEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with every built-in kind.
    pub fn with_builtins() -> Result<Self, DescriptorError> {
        let mut builder = Self::new();
        crate::descriptors::register_all(&mut builder)?;
        Ok(builder)
    }

    /// Add one kind. Fails if another kind has the same fully-specified key.
    pub fn register(&mut self, mut entry: RegistryEntry) -> Result<(), DescriptorError> {
        entry.key.pds = normalize_pds(entry.key.tag, entry.key.pds);

        if let Some(existing) = self.entries.iter().find(|e| e.key == entry.key) {
            return Err(DescriptorError::RegistrationConflict {
                key: entry.key.to_string(),
                existing: existing.xml_name.to_string(),
                new: entry.xml_name.to_string(),
            });
        }

        debug!("registered {} as {}", entry.xml_name, entry.key);
        self.entries.push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Registry {
        let mut by_id: HashMap<(u8, u32, Option<u8>), Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<&'static str, usize> = HashMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            by_id.entry(entry.key.lookup_id()).or_default().push(index);
            by_name.entry(entry.xml_name).or_insert(index);
        }
        Registry {
            entries: self.entries,
            by_id,
            by_name,
        }
    }
}

/// Immutable lookup table from descriptor keys to kinds.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    by_id: HashMap<(u8, u32, Option<u8>), Vec<usize>>,
    by_name: HashMap<&'static str, usize>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(|| {
    RegistryBuilder::with_builtins()
        .unwrap_or_else(|e| panic!("built-in descriptor registration failed: {}", e))
        .build()
});

/// Registry holding every built-in kind, built on first use.
pub fn global() -> &'static Registry {
    &GLOBAL
}

impl Registry {
    /// Longest-match lookup.
    ///
    /// Tries the table-specific key first, then the table-agnostic one. The
    /// PDS only takes part for private tags, and a private tag under an
    /// unregistered PDS stays unresolved. Among candidates sharing the same
    /// tag/PDS/table, one whose standards intersect `standards` beats a
    /// standard-agnostic one, which beats any other.
    pub fn resolve(
        &self,
        tag: u8,
        standards: Standards,
        pds: u32,
        table_id: Option<u8>,
    ) -> Option<&RegistryEntry> {
        let pds = normalize_pds(tag, pds);
        let found = table_id
            .and_then(|tid| self.pick(&(tag, pds, Some(tid)), standards))
            .or_else(|| self.pick(&(tag, pds, None), standards));
        if found.is_none() {
            trace!(
                "no descriptor kind for tag 0x{:02X}, PDS 0x{:08X}, table {:?}",
                tag,
                pds,
                table_id
            );
        }
        found
    }

    /// Resolve a tag found in a loop, `loop_pds` being the PDS set by a
    /// preceding private_data_specifier_descriptor.
    pub fn resolve_in_context(
        &self,
        tag: u8,
        context: &SiContext,
        loop_pds: Option<u32>,
    ) -> Option<&RegistryEntry> {
        self.resolve(
            tag,
            context.standards,
            context.effective_pds(tag, loop_pds),
            context.table_id,
        )
    }

    /// Lookup used when importing from tree form.
    pub fn resolve_by_name(&self, xml_name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(xml_name).map(|&i| &self.entries[i])
    }

    /// Decode a raw descriptor into its typed form.
    ///
    /// `None` when the tag does not resolve; the caller keeps it opaque.
    /// A malformed payload gives `Err`; use [`Registry::decode_partial`] to
    /// keep the entries read before the error.
    pub fn decode(
        &self,
        desc: &Descriptor,
        context: &SiContext,
        loop_pds: Option<u32>,
    ) -> Option<Result<Box<dyn AbstractDescriptor>, DescriptorError>> {
        let (value, status) = self.decode_partial(desc, context, loop_pds)?;
        Some(status.map(|_| value))
    }

    /// Like [`Registry::decode`], but the value is returned even when the
    /// payload is malformed, holding every complete entry decoded before
    /// the error.
    pub fn decode_partial(
        &self,
        desc: &Descriptor,
        context: &SiContext,
        loop_pds: Option<u32>,
    ) -> Option<(Box<dyn AbstractDescriptor>, Result<(), DescriptorError>)> {
        let entry = self.resolve_in_context(desc.tag(), context, loop_pds)?;
        let mut value = (entry.factory)();
        trace!("decoding {} ({} bytes)", entry.xml_name, desc.payload_size());
        let status = value.deserialize(desc);
        if let Err(e) = &status {
            debug!("partial decode of {}: {}", entry.xml_name, e);
        }
        Some((value, status))
    }

    /// Build a typed descriptor from its tree form.
    pub fn from_xml(&self, element: &Element) -> Result<Box<dyn AbstractDescriptor>, DescriptorError> {
        let entry = self
            .resolve_by_name(element.name())
            .ok_or_else(|| DescriptorError::UnknownXmlName(element.name().to_string()))?;
        let mut value = (entry.factory)();
        value.from_xml(element)?;
        Ok(value)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn pick(&self, id: &(u8, u32, Option<u8>), standards: Standards) -> Option<&RegistryEntry> {
        let rank = |e: &RegistryEntry| {
            if e.key.standards.intersects(standards) {
                2
            } else if e.key.standards.is_empty() {
                1
            } else {
                0
            }
        };

        let mut best: Option<&RegistryEntry> = None;
        for &index in self.by_id.get(id)? {
            let candidate = &self.entries[index];
            if best.map_or(true, |b| rank(candidate) > rank(b)) {
                best = Some(candidate);
            }
        }
        best
    }
}
