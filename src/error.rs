//! Parse-time and build-time errors, and the message registry used to render them.

use std::{borrow::Cow, collections::HashMap, fmt};
use thiserror::Error;

/// The stable kind of a [`ParseError`].
///
/// Each kind matches the [`ParseError`] variant of the same name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Fewer code points than the minimum size.
    ValueTooShort,
    /// More code points than the maximum size.
    ValueTooLong,
    /// Whitespace where none is allowed.
    InvalidWhitespaceCharacter,
    /// A control character outside the accepted set.
    InvalidControlCharacter,
    /// A quote character outside the accepted set.
    InvalidQuoteCharacter,
    /// Any other code point outside the accepted set.
    InvalidCharacter,
    /// An unpaired UTF-16 surrogate.
    LoneSurrogate,
    /// A number below an inclusive minimum.
    ValueBelowMinInclusive,
    /// A number at or below an exclusive minimum.
    ValueBelowMinExclusive,
    /// A number above an inclusive maximum.
    ValueAboveMaxInclusive,
    /// A number at or above an exclusive maximum.
    ValueAboveMaxExclusive,
    /// The value does not match the configured pattern.
    DoesNotMatchRegex,
    /// The custom validator returned `false`.
    FailedCustomValidation,
}

impl ErrorKind {
    /// All kinds.
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::ValueTooShort,
        ErrorKind::ValueTooLong,
        ErrorKind::InvalidWhitespaceCharacter,
        ErrorKind::InvalidControlCharacter,
        ErrorKind::InvalidQuoteCharacter,
        ErrorKind::InvalidCharacter,
        ErrorKind::LoneSurrogate,
        ErrorKind::ValueBelowMinInclusive,
        ErrorKind::ValueBelowMinExclusive,
        ErrorKind::ValueAboveMaxInclusive,
        ErrorKind::ValueAboveMaxExclusive,
        ErrorKind::DoesNotMatchRegex,
        ErrorKind::FailedCustomValidation,
    ];

    /// The stable upper-snake-case code of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValueTooShort => "VALUE_TOO_SHORT",
            ErrorKind::ValueTooLong => "VALUE_TOO_LONG",
            ErrorKind::InvalidWhitespaceCharacter => "INVALID_WHITESPACE_CHARACTER",
            ErrorKind::InvalidControlCharacter => "INVALID_CONTROL_CHARACTER",
            ErrorKind::InvalidQuoteCharacter => "INVALID_QUOTE_CHARACTER",
            ErrorKind::InvalidCharacter => "INVALID_CHARACTER",
            ErrorKind::LoneSurrogate => "LONE_SURROGATE",
            ErrorKind::ValueBelowMinInclusive => "VALUE_BELOW_MIN_INCLUSIVE",
            ErrorKind::ValueBelowMinExclusive => "VALUE_BELOW_MIN_EXCLUSIVE",
            ErrorKind::ValueAboveMaxInclusive => "VALUE_ABOVE_MAX_INCLUSIVE",
            ErrorKind::ValueAboveMaxExclusive => "VALUE_ABOVE_MAX_EXCLUSIVE",
            ErrorKind::DoesNotMatchRegex => "DOES_NOT_MATCH_REGEX",
            ErrorKind::FailedCustomValidation => "FAILED_CUSTOM_VALIDATION",
        }
    }

    /// Whether this kind rejects a single code point.
    pub const fn is_invalid_code_point(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidWhitespaceCharacter
                | ErrorKind::InvalidControlCharacter
                | ErrorKind::InvalidQuoteCharacter
                | ErrorKind::InvalidCharacter
        )
    }

    /// Whether this kind reports a numeric value outside its bounds.
    pub const fn is_out_of_bounds(self) -> bool {
        matches!(
            self,
            ErrorKind::ValueBelowMinInclusive
                | ErrorKind::ValueBelowMinExclusive
                | ErrorKind::ValueAboveMaxInclusive
                | ErrorKind::ValueAboveMaxExclusive
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value rejected while parsing.
///
/// Indexes count code points from the start of the (normalized) input,
/// except for [`ParseError::LoneSurrogate`] which counts UTF-16 units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The value is shorter than the minimum size.
    #[error("value has {actual} code points, fewer than the minimum of {min}")]
    ValueTooShort {
        /// The minimum size.
        min: usize,
        /// The emitted length.
        actual: usize,
    },

    /// The value grew past the maximum size.
    #[error("value is longer than the maximum of {max} code points")]
    ValueTooLong {
        /// The maximum size.
        max: usize,
    },

    /// Whitespace where none is allowed.
    #[error("invalid whitespace character {} at index {index}", display_code_point(.code_point))]
    InvalidWhitespaceCharacter {
        /// The rejected code point.
        code_point: u32,
        /// Its position.
        index: usize,
    },

    /// A control character outside the accepted set.
    #[error("invalid control character {} at index {index}", display_code_point(.code_point))]
    InvalidControlCharacter {
        /// The rejected code point.
        code_point: u32,
        /// Its position.
        index: usize,
    },

    /// A quote character outside the accepted set.
    #[error("invalid quote character {} at index {index}", display_code_point(.code_point))]
    InvalidQuoteCharacter {
        /// The rejected code point.
        code_point: u32,
        /// Its position.
        index: usize,
    },

    /// Any other code point outside the accepted set.
    #[error("invalid character {} at index {index}", display_code_point(.code_point))]
    InvalidCharacter {
        /// The rejected code point.
        code_point: u32,
        /// Its position.
        index: usize,
    },

    /// An unpaired surrogate in UTF-16 input.
    #[error("lone surrogate {unit:#06X} at UTF-16 index {index}")]
    LoneSurrogate {
        /// The surrogate unit.
        unit: u16,
        /// Its UTF-16 position.
        index: usize,
    },

    /// A number below an inclusive minimum.
    #[error("value is below the minimum of {min}")]
    ValueBelowMinInclusive {
        /// The smallest accepted value.
        min: i64,
    },

    /// A number at or below an exclusive minimum.
    #[error("value must be greater than {min}")]
    ValueBelowMinExclusive {
        /// The exclusive lower bound.
        min: i64,
    },

    /// A number above an inclusive maximum.
    #[error("value is above the maximum of {max}")]
    ValueAboveMaxInclusive {
        /// The largest accepted value.
        max: i64,
    },

    /// A number at or above an exclusive maximum.
    #[error("value must be less than {max}")]
    ValueAboveMaxExclusive {
        /// The exclusive upper bound.
        max: i64,
    },

    /// The value does not match the configured pattern.
    #[error("value does not match the pattern {pattern}")]
    DoesNotMatchRegex {
        /// The pattern as configured, without anchors.
        pattern: String,
    },

    /// The custom validator returned `false`.
    #[error("value failed custom validation")]
    FailedCustomValidation,
}

impl ParseError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::ValueTooShort { .. } => ErrorKind::ValueTooShort,
            ParseError::ValueTooLong { .. } => ErrorKind::ValueTooLong,
            ParseError::InvalidWhitespaceCharacter { .. } => ErrorKind::InvalidWhitespaceCharacter,
            ParseError::InvalidControlCharacter { .. } => ErrorKind::InvalidControlCharacter,
            ParseError::InvalidQuoteCharacter { .. } => ErrorKind::InvalidQuoteCharacter,
            ParseError::InvalidCharacter { .. } => ErrorKind::InvalidCharacter,
            ParseError::LoneSurrogate { .. } => ErrorKind::LoneSurrogate,
            ParseError::ValueBelowMinInclusive { .. } => ErrorKind::ValueBelowMinInclusive,
            ParseError::ValueBelowMinExclusive { .. } => ErrorKind::ValueBelowMinExclusive,
            ParseError::ValueAboveMaxInclusive { .. } => ErrorKind::ValueAboveMaxInclusive,
            ParseError::ValueAboveMaxExclusive { .. } => ErrorKind::ValueAboveMaxExclusive,
            ParseError::DoesNotMatchRegex { .. } => ErrorKind::DoesNotMatchRegex,
            ParseError::FailedCustomValidation => ErrorKind::FailedCustomValidation,
        }
    }

    /// Builds the error for a rejected code point of the given kind.
    pub(crate) fn invalid_code_point(kind: ErrorKind, code_point: u32, index: usize) -> Self {
        match kind {
            ErrorKind::InvalidWhitespaceCharacter => {
                ParseError::InvalidWhitespaceCharacter { code_point, index }
            }
            ErrorKind::InvalidControlCharacter => {
                ParseError::InvalidControlCharacter { code_point, index }
            }
            ErrorKind::InvalidQuoteCharacter => ParseError::InvalidQuoteCharacter { code_point, index },
            _ => ParseError::InvalidCharacter { code_point, index },
        }
    }

    /// The offending code point, for errors that reject one.
    pub fn code_point(&self) -> Option<u32> {
        match *self {
            ParseError::InvalidWhitespaceCharacter { code_point, .. }
            | ParseError::InvalidControlCharacter { code_point, .. }
            | ParseError::InvalidQuoteCharacter { code_point, .. }
            | ParseError::InvalidCharacter { code_point, .. } => Some(code_point),
            ParseError::LoneSurrogate { unit, .. } => Some(u32::from(unit)),
            _ => None,
        }
    }

    /// The position of the offending code point, for errors that reject one.
    pub fn index(&self) -> Option<usize> {
        match *self {
            ParseError::InvalidWhitespaceCharacter { index, .. }
            | ParseError::InvalidControlCharacter { index, .. }
            | ParseError::InvalidQuoteCharacter { index, .. }
            | ParseError::InvalidCharacter { index, .. }
            | ParseError::LoneSurrogate { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Named parameters for message templates.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            ParseError::ValueTooShort { min, actual } => {
                vec![("min", min.to_string()), ("actual", actual.to_string())]
            }
            ParseError::ValueTooLong { max } => vec![("max", max.to_string())],
            ParseError::InvalidWhitespaceCharacter { code_point, index }
            | ParseError::InvalidControlCharacter { code_point, index }
            | ParseError::InvalidQuoteCharacter { code_point, index }
            | ParseError::InvalidCharacter { code_point, index } => vec![
                ("code_point", DisplayCodePoint(*code_point).to_string()),
                ("index", index.to_string()),
            ],
            ParseError::LoneSurrogate { unit, index } => vec![
                ("code_point", format!("U+{:04X}", unit)),
                ("index", index.to_string()),
            ],
            ParseError::ValueBelowMinInclusive { min } | ParseError::ValueBelowMinExclusive { min } => {
                vec![("min", min.to_string())]
            }
            ParseError::ValueAboveMaxInclusive { max } | ParseError::ValueAboveMaxExclusive { max } => {
                vec![("max", max.to_string())]
            }
            ParseError::DoesNotMatchRegex { pattern } => vec![("pattern", pattern.clone())],
            ParseError::FailedCustomValidation => Vec::new(),
        }
    }
}

/// Formats a code point as `U+0041 'A'`, escaping unprintable characters.
struct DisplayCodePoint(u32);

fn display_code_point(code_point: &u32) -> DisplayCodePoint {
    DisplayCodePoint(*code_point)
}

impl fmt::Display for DisplayCodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)?;
        if let Some(ch) = char::from_u32(self.0) {
            write!(f, " '{}'", ch.escape_debug())?;
        }
        Ok(())
    }
}

/// A configuration rejected by a builder's `build()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// An integral parser was built without digits.
    #[error("no radix configured")]
    NoRadixConfigured,

    /// The radix is outside `2..=36`, or a custom alphabet has fewer than two digits.
    #[error("radix {radix} is outside 2..=36, or the digit alphabet is too short")]
    InvalidRadix {
        /// The requested radix.
        radix: u32,
    },

    /// One character names two digit values.
    #[error(
        "character {} is already assigned digit {first_digit} and cannot also be digit {second_digit}",
        display_code_point(.code_point)
    )]
    DuplicateRadixCharacter {
        /// The repeated character.
        code_point: u32,
        /// The digit it was first assigned.
        first_digit: u32,
        /// The digit it was assigned again.
        second_digit: u32,
    },

    /// Configured bounds fall outside the target integer type.
    #[error("bounds [{min}, {max}] are out of range for target type {target_type}")]
    MinMaxOutOfRangeForTargetType {
        /// The configured minimum.
        min: i128,
        /// The configured maximum.
        max: i128,
        /// The target type name.
        target_type: &'static str,
    },

    /// A reversed or out-of-range code point range, or a conversion naming a
    /// surrogate.
    #[error("invalid code point range [{from:#X}, {to:#X}]")]
    InvalidCodePointRange {
        /// The first code point.
        from: u32,
        /// The last code point.
        to: u32,
    },

    /// The minimum size exceeds the maximum size.
    #[error("minimum size {min} is greater than maximum size {max}")]
    MinSizeGreaterThanMaxSize {
        /// The minimum size.
        min: usize,
        /// The maximum size.
        max: usize,
    },

    /// The pattern does not compile.
    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// A code point rejected in lenient mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvalidCodePoint {
    /// The rejected code point.
    pub code_point: u32,
    /// Its code point index in the input.
    pub index: usize,
    /// Why it was rejected.
    pub kind: ErrorKind,
}

impl InvalidCodePoint {
    /// The equivalent strict-mode error.
    pub fn to_error(self) -> ParseError {
        ParseError::invalid_code_point(self.kind, self.code_point, self.index)
    }
}

/// Message templates per [`ErrorKind`].
///
/// Templates reference [`ParseError::parameters`] as `{name}`; unknown
/// placeholders are left as is.
#[derive(Clone, Debug)]
pub struct ErrorMessages {
    templates: HashMap<ErrorKind, Cow<'static, str>>,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        let templates = ErrorKind::ALL
            .iter()
            .map(|&kind| (kind, Cow::Borrowed(default_template(kind))))
            .collect();
        ErrorMessages { templates }
    }
}

fn default_template(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ValueTooShort => "The value must be at least {min} characters long.",
        ErrorKind::ValueTooLong => "The value must be at most {max} characters long.",
        ErrorKind::InvalidWhitespaceCharacter => {
            "Whitespace character {code_point} at position {index} is not allowed."
        }
        ErrorKind::InvalidControlCharacter => {
            "Control character {code_point} at position {index} is not allowed."
        }
        ErrorKind::InvalidQuoteCharacter => {
            "Quote character {code_point} at position {index} is not allowed."
        }
        ErrorKind::InvalidCharacter => "Character {code_point} at position {index} is not allowed.",
        ErrorKind::LoneSurrogate => "Unpaired surrogate {code_point} at position {index}.",
        ErrorKind::ValueBelowMinInclusive => "The value must be at least {min}.",
        ErrorKind::ValueBelowMinExclusive => "The value must be greater than {min}.",
        ErrorKind::ValueAboveMaxInclusive => "The value must be at most {max}.",
        ErrorKind::ValueAboveMaxExclusive => "The value must be less than {max}.",
        ErrorKind::DoesNotMatchRegex => "The value does not have the expected format.",
        ErrorKind::FailedCustomValidation => "The value is not valid.",
    }
}

impl ErrorMessages {
    /// The built-in English templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the template of one kind.
    pub fn with_message(mut self, kind: ErrorKind, template: impl Into<Cow<'static, str>>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// The template of one kind.
    pub fn template(&self, kind: ErrorKind) -> &str {
        self.templates
            .get(&kind)
            .map(|t| t.as_ref())
            .unwrap_or_else(|| default_template(kind))
    }

    /// Renders a user-facing message for `error`.
    pub fn render(&self, error: &ParseError) -> String {
        let mut message = self.template(error.kind()).to_owned();
        for (name, value) in error.parameters() {
            message = message.replace(&format!("{{{}}}", name), &value);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildError, ErrorKind, ErrorMessages, InvalidCodePoint, ParseError};

    #[test]
    fn test_kind_codes() {
        let err = ParseError::InvalidCharacter {
            code_point: '1' as u32,
            index: 2,
        };
        assert_eq!(ErrorKind::InvalidCharacter, err.kind());
        assert_eq!("INVALID_CHARACTER", err.kind().as_str());
        assert_eq!(Some('1' as u32), err.code_point());
        assert_eq!(Some(2), err.index());
        assert_eq!("invalid character U+0031 '1' at index 2", err.to_string());
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        let codes: std::collections::HashSet<_> =
            ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(ErrorKind::ALL.len(), codes.len());
    }

    #[test]
    fn test_render_default_and_override() {
        let messages = ErrorMessages::default();
        let err = ParseError::ValueTooShort { min: 2, actual: 1 };
        assert_eq!("The value must be at least 2 characters long.", messages.render(&err));

        let messages = messages.with_message(ErrorKind::ValueTooShort, "min={min}, got {actual}");
        assert_eq!("min=2, got 1", messages.render(&err));
    }

    #[test]
    fn test_render_escapes_control_characters() {
        let err = ParseError::InvalidControlCharacter {
            code_point: 0x07,
            index: 0,
        };
        assert_eq!(
            "Control character U+0007 '\\u{7}' at position 0 is not allowed.",
            ErrorMessages::new().render(&err)
        );
    }

    #[test]
    fn test_invalid_code_point_to_error() {
        let invalid = InvalidCodePoint {
            code_point: '"' as u32,
            index: 4,
            kind: ErrorKind::InvalidQuoteCharacter,
        };
        assert_eq!(
            ParseError::InvalidQuoteCharacter {
                code_point: '"' as u32,
                index: 4
            },
            invalid.to_error()
        );
    }

    #[test]
    fn test_build_error_display() {
        assert_eq!("no radix configured", BuildError::NoRadixConfigured.to_string());
        let err = BuildError::MinMaxOutOfRangeForTargetType {
            min: -1,
            max: 300,
            target_type: "u8",
        };
        assert_eq!("bounds [-1, 300] are out of range for target type u8", err.to_string());
    }
}
