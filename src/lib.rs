#![forbid(unsafe_code)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
//! Validated domain string and integral types.
//!
//! A domain type is declared once as a builder configuration ("accept
//! `A-Z`, convert dashes to a hyphen, at most 64 code points, upper case")
//! and compiled into an immutable parser that can be shared freely between
//! threads. Every call then transforms one input in a single pass.
//!
//! The building blocks are usable on their own:
//!
//! * [`Subset`] is a compiled set of code points. It stores sorted packed
//!   ranges in three width tiers and, when that is cheaper, re-hashes them by
//!   256-code-point block. A general-category bit mask gives a second
//!   acceptance path.
//! * [`Converter`] is a compiled substitution table. Single code points and
//!   categories are looked up directly; multi-code-point sources are matched
//!   through a trie, earliest start first and longest second.
//! * [`TypeParser`] combines both with case, whitespace, normalization,
//!   length, pattern and custom rules.
//! * [`IntegralNumericParser`] reads digits in any radix into a bounded
//!   primitive integer.
//!
//! # Processing order
//!
//! For each input, a [`TypeParser`]:
//!
//! * resolves absent or empty input through its [`NullEmptyPolicy`],
//! * applies its [`NormalizationForm`],
//! * trims leading and trailing whitespace,
//! * walks the remaining code points, applying conversion rules first and
//!   the [`WhitespacePolicy`] and acceptance test to everything else,
//! * cases each emitted code point per [`CasePolicy`] and fails as soon as
//!   the maximum length is exceeded,
//! * checks the minimum length, then the pattern, then the custom validator.
//!
//! ```
//! use typestr::{ErrorKind, TypeParser};
//!
//! let parser = TypeParser::builder()
//!     .accept_char_range('a', 'z')
//!     .accept_char_range('A', 'Z')
//!     .convert_all_dashes_to('-')
//!     .max_size(16)
//!     .to_upper_case()
//!     .build()
//!     .unwrap();
//! assert_eq!(Ok(Some("AB-CD".to_owned())), parser.parse(Some(" ab\u{2013}cd ")));
//! let err = parser.parse(Some("ab1cd")).unwrap_err();
//! assert_eq!(ErrorKind::InvalidCharacter, err.kind());
//! assert_eq!(Some(2), err.index());
//! ```

pub(crate) mod packed_range;

pub(crate) mod category;

pub(crate) mod sequence_arena;

pub(crate) mod int_map;

pub(crate) mod ranges;

pub(crate) mod subset_optimiser;

pub(crate) mod subset_ty;

pub(crate) mod converter;

pub(crate) mod error;

pub(crate) mod type_parser;

pub(crate) mod integral_parser;

pub(crate) mod domain_types;

mod properties;

pub use packed_range::Tier;

pub use category::{category_mask, category_of, category_of_char, UnicodeCategory};

pub use int_map::{IntArrayMap, IntArrayMapBuilder, IntMap, IntMapBuilder};

pub use subset_ty::{CodePointRanges, Subset, SubsetBuilder, SubsetRepresentation};

pub use converter::{ConversionScan, Converter, ConverterBuilder};

pub use error::{BuildError, ErrorKind, ErrorMessages, InvalidCodePoint, ParseError};

pub use type_parser::{
    CasePolicy, LenientParse, NormalizationForm, NullEmptyPolicy, TypeParser, TypeParserBuilder,
    WhitespacePolicy,
};

pub use integral_parser::{IntegralNumericParser, IntegralNumericParserBuilder, IntegralTarget};

pub use domain_types::{CountryCode, IataAirportCode};
