//! Attribute tree: the textual counterpart of binary descriptors.
//!
//! An [`Element`] has a name, ordered attributes and ordered children. The
//! typed accessors enforce declared numeric ranges and requiredness and
//! fail with a [`DescriptorError`] instead of truncating values.

mod xml;

use std::fmt;

use crate::error::DescriptorError;

/// Unsigned integer types usable as numeric attributes.
pub trait IntAttribute: Copy + PartialOrd + fmt::Display + fmt::UpperHex {
    /// Hexadecimal digits of the natural width of the type.
    const HEX_DIGITS: usize;

    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_int_attribute {
    ($($t:ty => $digits:expr),*) => {
        $(
            impl IntAttribute for $t {
                const HEX_DIGITS: usize = $digits;

                fn from_u64(value: u64) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_int_attribute!(u8 => 2, u16 => 4, u32 => 8, u64 => 16);

/// One node of the attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Append a new empty child and return it for filling.
    pub fn add_element(&mut self, name: impl Into<String>) -> &mut Element {
        self.children.push(Element::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set an attribute, replacing any previous value with the same name.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set a numeric attribute, as `0x`-prefixed zero-padded hexadecimal
    /// when `hex` is true, as decimal otherwise.
    pub fn set_int_attribute<T: IntAttribute>(&mut self, name: &str, value: T, hex: bool) {
        let text = if hex {
            format!("0x{:0width$X}", value, width = T::HEX_DIGITS)
        } else {
            value.to_string()
        };
        self.set_attribute(name, text);
    }

    pub fn set_bool_attribute(&mut self, name: &str, value: bool) {
        self.set_attribute(name, if value { "true" } else { "false" });
    }

    /// Get a string attribute.
    pub fn get_attribute(
        &self,
        name: &str,
        required: bool,
        default: &str,
    ) -> Result<String, DescriptorError> {
        match self.attribute(name) {
            Some(v) => Ok(v.to_string()),
            None if required => Err(self.missing(name)),
            None => Ok(default.to_string()),
        }
    }

    /// Get a numeric attribute within the inclusive range `min..=max`.
    ///
    /// Decimal and `0x` hexadecimal are accepted, `,` separators are ignored.
    /// An absent optional attribute yields `default`.
    pub fn get_int_attribute<T: IntAttribute>(
        &self,
        name: &str,
        required: bool,
        default: T,
        min: T,
        max: T,
    ) -> Result<T, DescriptorError> {
        let raw = match self.attribute(name) {
            Some(v) => v,
            None if required => return Err(self.missing(name)),
            None => return Ok(default),
        };

        let wide = parse_integer(raw).ok_or_else(|| DescriptorError::InvalidAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
        })?;

        let out_of_range = || DescriptorError::OutOfRange {
            element: self.name.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        };

        let value = T::from_u64(wide).ok_or_else(out_of_range)?;
        if value < min || value > max {
            return Err(out_of_range());
        }
        Ok(value)
    }

    pub fn get_bool_attribute(
        &self,
        name: &str,
        required: bool,
        default: bool,
    ) -> Result<bool, DescriptorError> {
        let raw = match self.attribute(name) {
            Some(v) => v.trim(),
            None if required => return Err(self.missing(name)),
            None => return Ok(default),
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(DescriptorError::InvalidAttribute {
                element: self.name.clone(),
                attribute: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Children named `name`; their count must lie in `min..=max`.
    pub fn get_children(
        &self,
        name: &str,
        min: usize,
        max: usize,
    ) -> Result<Vec<&Element>, DescriptorError> {
        let found: Vec<&Element> = self.children.iter().filter(|c| c.name == name).collect();
        if found.len() < min || found.len() > max {
            return Err(DescriptorError::ChildCount {
                element: self.name.clone(),
                child: name.to_string(),
                count: found.len(),
                min,
                max,
            });
        }
        Ok(found)
    }

    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Store binary content as hexadecimal text.
    pub fn set_hex_text(&mut self, data: &[u8]) {
        self.text = hex::encode_upper(data);
    }

    /// Decode hexadecimal text content, whitespace allowed between digits.
    pub fn get_hex_text(&self) -> Result<Vec<u8>, DescriptorError> {
        let compact: String = self.text.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(hex::decode(compact)?)
    }

    /// Attribute equivalence: same name, same attribute set regardless of
    /// order, same trimmed text, children equivalent pairwise in order.
    pub fn equivalent(&self, other: &Element) -> bool {
        self.name == other.name
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(k, v)| other.attribute(k) == Some(v.as_str()))
            && self.text.trim() == other.text.trim()
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|(a, b)| a.equivalent(b))
    }

    fn missing(&self, attribute: &str) -> DescriptorError {
        DescriptorError::MissingAttribute {
            element: self.name.clone(),
            attribute: attribute.to_string(),
        }
    }
}

fn parse_integer(text: &str) -> Option<u64> {
    let compact: String = text.trim().chars().filter(|&c| c != ',').collect();
    if let Some(digits) = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
    {
        u64::from_str_radix(digits, 16).ok()
    } else {
        compact.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_attribute_formatting() {
        let mut e = Element::new("service");
        e.set_int_attribute("service_id", 0x99u16, true);
        e.set_int_attribute("channel", 37u16, false);
        e.set_int_attribute("type", 1u8, true);
        assert_eq!(e.attribute("service_id"), Some("0x0099"));
        assert_eq!(e.attribute("channel"), Some("37"));
        assert_eq!(e.attribute("type"), Some("0x01"));
    }

    #[test]
    fn test_int_attribute_parsing() {
        let mut e = Element::new("service");
        e.set_attribute("a", "0x1234");
        e.set_attribute("b", "1,000");
        e.set_attribute("c", " 42 ");
        assert_eq!(e.get_int_attribute::<u16>("a", true, 0, 0, 0xFFFF), Ok(0x1234));
        assert_eq!(e.get_int_attribute::<u16>("b", true, 0, 0, 0xFFFF), Ok(1000));
        assert_eq!(e.get_int_attribute::<u8>("c", true, 0, 0, 0xFF), Ok(42));
    }

    #[test]
    fn test_int_attribute_range() {
        let mut e = Element::new("service");
        e.set_attribute("eutelsat_channel_number", "0x0400");
        let r = e.get_int_attribute::<u16>("eutelsat_channel_number", true, 0, 0, 0x03FF);
        assert!(matches!(r, Err(DescriptorError::OutOfRange { .. })));

        e.set_attribute("eutelsat_channel_number", "0x03FF");
        let r = e.get_int_attribute::<u16>("eutelsat_channel_number", true, 0, 0, 0x03FF);
        assert_eq!(r, Ok(0x03FF));

        // Does not fit the type at all.
        e.set_attribute("x", "70000");
        let r = e.get_int_attribute::<u16>("x", true, 0, 0, 0xFFFF);
        assert!(matches!(r, Err(DescriptorError::OutOfRange { .. })));
    }

    #[test]
    fn test_int_attribute_missing_and_invalid() {
        let mut e = Element::new("service");
        let r = e.get_int_attribute::<u16>("service_id", true, 0, 0, 0xFFFF);
        assert!(matches!(r, Err(DescriptorError::MissingAttribute { .. })));
        assert_eq!(e.get_int_attribute::<u16>("service_id", false, 7, 0, 0xFFFF), Ok(7));

        e.set_attribute("service_id", "twelve");
        let r = e.get_int_attribute::<u16>("service_id", true, 0, 0, 0xFFFF);
        assert!(matches!(r, Err(DescriptorError::InvalidAttribute { .. })));

        e.set_attribute("service_id", "-1");
        let r = e.get_int_attribute::<u16>("service_id", true, 0, 0, 0xFFFF);
        assert!(matches!(r, Err(DescriptorError::InvalidAttribute { .. })));
    }

    #[test]
    fn test_bool_attribute() {
        let mut e = Element::new("service");
        e.set_bool_attribute("visible", true);
        assert_eq!(e.get_bool_attribute("visible", true, false), Ok(true));
        assert_eq!(e.get_bool_attribute("hidden", false, false), Ok(false));
        e.set_attribute("visible", "maybe");
        assert!(e.get_bool_attribute("visible", true, false).is_err());
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut e = Element::new("x");
        e.set_attribute("a", "1");
        e.set_attribute("a", "2");
        assert_eq!(e.attributes().len(), 1);
        assert_eq!(e.attribute("a"), Some("2"));
    }

    #[test]
    fn test_get_children_bounds() {
        let mut root = Element::new("d");
        for _ in 0..3 {
            root.add_element("service");
        }
        root.add_element("other");
        assert_eq!(root.get_children("service", 0, 31).unwrap().len(), 3);
        assert!(matches!(
            root.get_children("service", 0, 2),
            Err(DescriptorError::ChildCount { count: 3, .. })
        ));
        assert!(root.get_children("missing", 0, 5).unwrap().is_empty());
        assert!(root.get_children("missing", 1, 5).is_err());
    }

    #[test]
    fn test_hex_text() {
        let mut e = Element::new("generic_descriptor");
        e.set_hex_text(&[0xDE, 0xAD, 0x01]);
        assert_eq!(e.text(), "DEAD01");
        e.set_text("de ad\n 01");
        assert_eq!(e.get_hex_text(), Ok(vec![0xDE, 0xAD, 0x01]));
        e.set_text("xyz");
        assert!(matches!(e.get_hex_text(), Err(DescriptorError::InvalidHex(_))));
    }

    #[test]
    fn test_equivalent_ignores_attribute_order() {
        let mut a = Element::new("service");
        a.set_attribute("x", "1");
        a.set_attribute("y", "2");
        let mut b = Element::new("service");
        b.set_attribute("y", "2");
        b.set_attribute("x", "1");
        assert!(a.equivalent(&b));
        assert_ne!(a, b);

        let mut pa = Element::new("d");
        pa.add_element("s").set_attribute("n", "1");
        pa.add_element("s").set_attribute("n", "2");
        let mut pb = Element::new("d");
        pb.add_element("s").set_attribute("n", "2");
        pb.add_element("s").set_attribute("n", "1");
        assert!(!pa.equivalent(&pb));
    }
}
