use std::fmt;

use crate::color::ColorParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A constructor or configuration option is out of range or malformed.
    InvalidOption {
        option: &'static str,
        reason: String,
    },
    /// `create_entry` was given an id that already exists in the collection.
    DuplicateId(String),
    /// An entry id is missing its UUIDv4 shape.
    InvalidId(String),
    /// Text typed into a numeric channel could not be read as a number.
    NotNumeric(String),
    /// Unknown color output format name.
    UnsupportedFormat(String),
    /// Unknown color output format type name.
    UnsupportedFormatType(String),
    /// A color value could not be parsed.
    Color(ColorParseError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidOption { option, reason } => {
                write!(f, "invalid option `{}`: {}", option, reason)
            }
            StoreError::DuplicateId(id) => {
                write!(f, "entry with id {} already exists in collection", id)
            }
            StoreError::InvalidId(id) => write!(f, "entry id {:?} is not a UUIDv4", id),
            StoreError::NotNumeric(input) => write!(f, "{:?} is not a number", input),
            StoreError::UnsupportedFormat(name) => {
                write!(f, "unsupported color format: {}", name)
            }
            StoreError::UnsupportedFormatType(name) => {
                write!(f, "unsupported color format type: {}", name)
            }
            StoreError::Color(err) => write!(f, "color error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Color(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ColorParseError> for StoreError {
    fn from(err: ColorParseError) -> Self {
        StoreError::Color(err)
    }
}
