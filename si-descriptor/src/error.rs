//! Error types for descriptor decoding, encoding and tree binding.

use thiserror::Error;

/// Errors raised by the descriptor codec framework.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Binary payload does not match the layout of its descriptor kind.
    #[error("Malformed descriptor 0x{tag:02X}: {reason}")]
    Malformed { tag: u8, reason: String },

    /// A descriptor loop ends in the middle of a descriptor.
    #[error("Truncated descriptor: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload does not fit the one-byte length field.
    #[error("Descriptor payload too large: {0} bytes (max: 255)")]
    PayloadTooLarge(usize),

    /// A required attribute is absent.
    #[error("<{element}>: missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute value cannot be parsed.
    #[error("<{element}>: invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// An attribute value lies outside its declared range.
    #[error("<{element}>: '{attribute}' = {value} out of range {min}..={max}")]
    OutOfRange {
        element: String,
        attribute: String,
        value: String,
        min: String,
        max: String,
    },

    /// Wrong number of child elements.
    #[error("<{element}>: {count} <{child}> children, allowed {min}..={max}")]
    ChildCount {
        element: String,
        child: String,
        count: usize,
        min: usize,
        max: usize,
    },

    /// Root element name does not match the descriptor kind.
    #[error("Unexpected element <{found}>, expected <{expected}>")]
    UnexpectedElement { expected: String, found: String },

    /// No registered descriptor kind uses this XML name.
    #[error("Unknown descriptor element <{0}>")]
    UnknownXmlName(String),

    /// Two kinds claim the same fully-specified key.
    #[error("Registration conflict on {key}: '{existing}' already registered, rejecting '{new}'")]
    RegistrationConflict {
        key: String,
        existing: String,
        new: String,
    },

    /// XML text could not be read or written.
    #[error("XML error: {0}")]
    Xml(String),

    /// Hexadecimal content could not be decoded.
    #[error("Invalid hexadecimal data: {0}")]
    InvalidHex(String),
}

impl From<quick_xml::Error> for DescriptorError {
    fn from(e: quick_xml::Error) -> Self {
        DescriptorError::Xml(e.to_string())
    }
}

impl From<hex::FromHexError> for DescriptorError {
    fn from(e: hex::FromHexError) -> Self {
        DescriptorError::InvalidHex(e.to_string())
    }
}

impl DescriptorError {
    /// Shorthand for [`DescriptorError::Malformed`].
    pub fn malformed(tag: u8, reason: impl Into<String>) -> Self {
        DescriptorError::Malformed {
            tag,
            reason: reason.into(),
        }
    }

    /// Returns true for errors coming from binary data rather than tree input.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            DescriptorError::Malformed { .. }
                | DescriptorError::Truncated { .. }
                | DescriptorError::PayloadTooLarge(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = DescriptorError::malformed(0x83, "7 bytes left");
        assert_eq!(e.to_string(), "Malformed descriptor 0x83: 7 bytes left");
        assert!(e.is_binary());

        let e = DescriptorError::MissingAttribute {
            element: "service".to_string(),
            attribute: "service_id".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "<service>: missing required attribute 'service_id'"
        );
        assert!(!e.is_binary());
    }

    #[test]
    fn test_hex_error_conversion() {
        let e: DescriptorError = hex::decode("0").unwrap_err().into();
        assert!(matches!(e, DescriptorError::InvalidHex(_)));
    }
}
