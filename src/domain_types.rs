//! Ready-made domain string types.

use crate::error::ParseError;
use crate::type_parser::{TypeParser, TypeParserBuilder};
use std::fmt;
use std::sync::OnceLock;

fn letters(size: usize) -> TypeParserBuilder {
    TypeParser::builder()
        .accept_char_range('A', 'Z')
        .accept_char_range('a', 'z')
        .fixed_size(size)
        .to_upper_case()
}

/// An ISO 3166-1 alpha-2 country code: two letters, upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(String);

impl CountryCode {
    /// The shared parser behind [`CountryCode::of`].
    pub fn parser() -> &'static TypeParser {
        static PARSER: OnceLock<TypeParser> = OnceLock::new();
        PARSER.get_or_init(|| {
            letters(2)
                .preserve_null_and_empty()
                .build()
                .expect("country code configuration is valid")
        })
    }

    /// Parses a country code; absent input stays absent.
    pub fn of(input: Option<&str>) -> Result<Option<CountryCode>, ParseError> {
        Self::parser().parse_into(input, |value| value.map(CountryCode))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An IATA airport code: three letters, upper-cased. Absent input becomes
/// the empty code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IataAirportCode(String);

impl IataAirportCode {
    /// The shared parser behind [`IataAirportCode::of`].
    pub fn parser() -> &'static TypeParser {
        static PARSER: OnceLock<TypeParser> = OnceLock::new();
        PARSER.get_or_init(|| {
            letters(3)
                .convert_null_to_empty()
                .build()
                .expect("airport code configuration is valid")
        })
    }

    /// Parses an airport code.
    pub fn of(input: Option<&str>) -> Result<IataAirportCode, ParseError> {
        Self::parser().parse_into(input, |value| IataAirportCode(value.unwrap_or_default()))
    }

    /// The code as a string slice; empty for an absent code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty code.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for IataAirportCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IataAirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{CountryCode, IataAirportCode};
    use crate::{ErrorKind, ParseError};

    #[test]
    fn test_country_code() {
        let fr = CountryCode::of(Some("fr")).unwrap().unwrap();
        assert_eq!("FR", fr.as_str());
        assert_eq!("FR", fr.to_string());
        assert_eq!(Ok(Some(fr.clone())), CountryCode::of(Some(" Fr ")));
        assert_eq!(Ok(None), CountryCode::of(None));

        let short = CountryCode::of(Some("f")).unwrap_err();
        assert_eq!(ErrorKind::ValueTooShort, short.kind());
        assert_eq!(ParseError::ValueTooShort { min: 2, actual: 1 }, short);
        assert_eq!(
            ErrorKind::ValueTooLong,
            CountryCode::of(Some("FRA")).unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::InvalidCharacter,
            CountryCode::of(Some("F1")).unwrap_err().kind()
        );
    }

    #[test]
    fn test_iata_airport_code() {
        let empty = IataAirportCode::of(None).unwrap();
        assert!(empty.is_empty());
        assert_eq!("", empty.as_str());
        assert_eq!("CDG", IataAirportCode::of(Some("cdg")).unwrap().as_str());
        assert_eq!(
            ErrorKind::ValueTooShort,
            IataAirportCode::of(Some("CD")).unwrap_err().kind()
        );
    }
}
