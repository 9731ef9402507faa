use crate::error::{BuildError, ParseError};
use crate::int_map::{IntMap, IntMapBuilder};
use crate::subset_ty::{Subset, SubsetBuilder};
use crate::type_parser::rejection_kind;
use crate::UnicodeCategory;
use std::fmt;
use std::marker::PhantomData;

const DIGITS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const NEGATIVE_SIGNS: [char; 4] = ['-', '\u{2212}', '\u{FE63}', '\u{FF0D}'];
const POSITIVE_SIGNS: [char; 2] = ['+', '\u{FF0B}'];

/// Space-like grouping separators that stand in for each other.
const SPACE_SEPARATORS: [char; 3] = ['\u{202F}', '\u{00A0}', ' '];

/// A primitive integer an [`IntegralNumericParser`] can produce.
pub trait IntegralTarget: Copy + fmt::Debug + Send + Sync + 'static {
    /// The Rust type name, for error messages.
    const NAME: &'static str;
    /// The smallest value, widened.
    const MIN: i64;
    /// The largest value, widened.
    const MAX: i64;

    /// Narrows a value already checked against `MIN..=MAX`.
    fn from_i64(value: i64) -> Self;
}

macro_rules! impl_integral_target {
    ($($ty:ty),*) => {
        $(
            impl IntegralTarget for $ty {
                const NAME: &'static str = stringify!($ty);
                const MIN: i64 = <$ty>::MIN as i64;
                const MAX: i64 = <$ty>::MAX as i64;

                #[inline]
                fn from_i64(value: i64) -> Self {
                    debug_assert!(
                        (<Self as IntegralTarget>::MIN..=<Self as IntegralTarget>::MAX).contains(&value)
                    );
                    value as $ty
                }
            }
        )*
    };
}

impl_integral_target!(i8, i16, i32, i64, u8, u16, u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Bound {
    Inclusive(i64),
    Exclusive(i64),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum DashHandling {
    #[default]
    Keep,
    IgnoreAll,
    IgnoreAllExceptLeadingNegativeSign,
}

/// Parses digit strings in any radix into a bounded integer type.
#[derive(Clone)]
pub struct IntegralNumericParser<T> {
    digits: IntMap,
    radix: u32,
    min: Bound,
    max: Bound,
    ignored: Subset,
    dashes: DashHandling,
    target: PhantomData<fn() -> T>,
}

impl<T: IntegralTarget> IntegralNumericParser<T> {
    /// Returns a builder; a radix must be configured before `build()`.
    pub fn builder() -> IntegralNumericParserBuilder<T> {
        IntegralNumericParserBuilder::new()
    }

    /// The number of distinct digit values.
    pub fn radix(&self) -> u32 {
        self.radix
    }

    /// Parses `input`. Absent, empty and blank input yield `None`.
    pub fn parse(&self, input: Option<&str>) -> Result<Option<T>, ParseError> {
        let (input, offset) = match input {
            None => return Ok(None),
            Some(raw) => (
                raw.trim(),
                raw.chars().take_while(|ch| ch.is_whitespace()).count(),
            ),
        };
        if input.is_empty() {
            return Ok(None);
        }
        self.parse_value(input, offset).map(|value| Some(T::from_i64(value))).map_err(|error| {
            tracing::trace!(kind = %error.kind(), index = ?error.index(), "integral parse failed");
            error
        })
    }

    /// Parses `input` and hands the result to `factory`.
    pub fn parse_into<R, F>(&self, input: Option<&str>, factory: F) -> Result<R, ParseError>
    where
        F: FnOnce(Option<T>) -> R,
    {
        self.parse(input).map(factory)
    }

    /// `offset` is the number of code points trimmed ahead of `input`.
    fn parse_value(&self, input: &str, offset: usize) -> Result<i64, ParseError> {
        let radix = i64::from(self.radix);
        let mut negative = false;
        let mut leading = true;
        let mut digit_count = 0usize;
        let mut value = 0i64;

        for (index, ch) in (offset..).zip(input.chars()) {
            let code_point = ch as u32;
            if let Some(digit) = self.digits.get(code_point as i32) {
                leading = false;
                digit_count += 1;
                let digit = i64::from(digit);
                let next = value.checked_mul(radix).and_then(|shifted| {
                    if negative {
                        shifted.checked_sub(digit)
                    } else {
                        shifted.checked_add(digit)
                    }
                });
                value = match next {
                    Some(next) => next,
                    None if negative => return Err(self.below_min()),
                    None => return Err(self.above_max()),
                };
                continue;
            }
            if leading && self.is_sign(ch) {
                leading = false;
                negative = NEGATIVE_SIGNS.contains(&ch);
                continue;
            }
            if self.ignored.contains(code_point) {
                continue;
            }
            return Err(ParseError::invalid_code_point(rejection_kind(ch), code_point, index));
        }

        if digit_count == 0 {
            return Err(ParseError::ValueTooShort { min: 1, actual: 0 });
        }
        match self.min {
            Bound::Inclusive(min) if value < min => return Err(self.below_min()),
            Bound::Exclusive(min) if value <= min => return Err(self.below_min()),
            _ => {}
        }
        match self.max {
            Bound::Inclusive(max) if value > max => return Err(self.above_max()),
            Bound::Exclusive(max) if value >= max => return Err(self.above_max()),
            _ => {}
        }
        Ok(value)
    }

    fn is_sign(&self, ch: char) -> bool {
        if POSITIVE_SIGNS.contains(&ch) {
            return true;
        }
        NEGATIVE_SIGNS.contains(&ch) && self.dashes != DashHandling::IgnoreAll
    }

    fn below_min(&self) -> ParseError {
        match self.min {
            Bound::Inclusive(min) => ParseError::ValueBelowMinInclusive { min },
            Bound::Exclusive(min) => ParseError::ValueBelowMinExclusive { min },
        }
    }

    fn above_max(&self) -> ParseError {
        match self.max {
            Bound::Inclusive(max) => ParseError::ValueAboveMaxInclusive { max },
            Bound::Exclusive(max) => ParseError::ValueAboveMaxExclusive { max },
        }
    }
}

impl<T: IntegralTarget> fmt::Debug for IntegralNumericParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegralNumericParser")
            .field("target", &T::NAME)
            .field("radix", &self.radix)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("ignored", &self.ignored)
            .field("dashes", &self.dashes)
            .finish()
    }
}

/// Configures an [`IntegralNumericParser`].
pub struct IntegralNumericParserBuilder<T> {
    alphabet: Option<Vec<char>>,
    case_sensitive: bool,
    min: Option<(i128, bool)>,
    max: Option<(i128, bool)>,
    grouping_separators: Vec<char>,
    dashes: DashHandling,
    error: Option<BuildError>,
    target: PhantomData<fn() -> T>,
}

impl<T: IntegralTarget> Default for IntegralNumericParserBuilder<T> {
    fn default() -> Self {
        IntegralNumericParserBuilder {
            alphabet: None,
            case_sensitive: false,
            min: None,
            max: None,
            grouping_separators: Vec::new(),
            dashes: DashHandling::Keep,
            error: None,
            target: PhantomData,
        }
    }
}

impl<T: IntegralTarget> fmt::Debug for IntegralNumericParserBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegralNumericParserBuilder")
            .field("target", &T::NAME)
            .field("alphabet", &self.alphabet)
            .field("case_sensitive", &self.case_sensitive)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("grouping_separators", &self.grouping_separators)
            .field("dashes", &self.dashes)
            .field("error", &self.error)
            .finish()
    }
}

impl<T: IntegralTarget> IntegralNumericParserBuilder<T> {
    /// Creates a builder with no radix, case-insensitive digits and the
    /// target type's full range.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Digits `0-9` then `A-Z`, `radix` of them.
    pub fn allow_base_n_numbers(mut self, radix: u32) -> Self {
        if (2..=36).contains(&radix) {
            self.alphabet = Some(DIGITS.chars().take(radix as usize).collect());
        } else {
            self.record(BuildError::InvalidRadix { radix });
        }
        self
    }

    /// Base 10.
    pub fn allow_decimal_numbers(self) -> Self {
        self.allow_base_n_numbers(10)
    }

    /// Base 16.
    pub fn allow_hexadecimal_numbers(self) -> Self {
        self.allow_base_n_numbers(16)
    }

    /// Uses `digits` as the alphabet: the first character is digit 0.
    pub fn allow_custom_base_numbers(mut self, digits: &str) -> Self {
        let alphabet: Vec<char> = digits.chars().collect();
        if alphabet.len() < 2 {
            self.record(BuildError::InvalidRadix {
                radix: alphabet.len() as u32,
            });
        } else {
            self.alphabet = Some(alphabet);
        }
        self
    }

    /// Letters must match the alphabet's case exactly.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Letters match in either case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Smallest accepted value.
    pub fn min_value_inclusive(mut self, min: impl Into<i128>) -> Self {
        self.min = Some((min.into(), false));
        self
    }

    /// Values must be greater than `min`.
    pub fn min_value_exclusive(mut self, min: impl Into<i128>) -> Self {
        self.min = Some((min.into(), true));
        self
    }

    /// Largest accepted value.
    pub fn max_value_inclusive(mut self, max: impl Into<i128>) -> Self {
        self.max = Some((max.into(), false));
        self
    }

    /// Values must be less than `max`.
    pub fn max_value_exclusive(mut self, max: impl Into<i128>) -> Self {
        self.max = Some((max.into(), true));
        self
    }

    /// Skips `separator` anywhere in the input. A space-like separator also
    /// admits the other space-like separators.
    pub fn grouping_separator(mut self, separator: char) -> Self {
        if SPACE_SEPARATORS.contains(&separator) {
            self.grouping_separators.extend(SPACE_SEPARATORS);
        } else {
            self.grouping_separators.push(separator);
        }
        self
    }

    /// Skips every dash and hyphen, minus signs included.
    pub fn ignore_all_dashes_and_hyphens(mut self) -> Self {
        self.dashes = DashHandling::IgnoreAll;
        self
    }

    /// Skips every dash and hyphen except a leading minus sign.
    pub fn ignore_all_dashes_and_hyphens_except_leading_negative_sign(mut self) -> Self {
        self.dashes = DashHandling::IgnoreAllExceptLeadingNegativeSign;
        self
    }

    fn bound(bound: Option<(i128, bool)>, default: i64) -> Bound {
        match bound {
            Some((value, true)) => Bound::Exclusive(value as i64),
            Some((value, false)) => Bound::Inclusive(value as i64),
            None => Bound::Inclusive(default),
        }
    }

    /// Compiles the parser.
    pub fn build(self) -> Result<IntegralNumericParser<T>, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let alphabet = self.alphabet.ok_or(BuildError::NoRadixConfigured)?;

        let min = self.min.map_or(i128::from(T::MIN), |(min, _)| min);
        let max = self.max.map_or(i128::from(T::MAX), |(max, _)| max);
        let target_range = i128::from(T::MIN)..=i128::from(T::MAX);
        if !target_range.contains(&min) || !target_range.contains(&max) || min > max {
            return Err(BuildError::MinMaxOutOfRangeForTargetType {
                min,
                max,
                target_type: T::NAME,
            });
        }

        let mut digits = IntMapBuilder::new();
        for (digit, &ch) in alphabet.iter().enumerate() {
            let digit = digit as i32;
            let mut forms = vec![ch];
            if !self.case_sensitive {
                forms.extend(ch.to_lowercase().chain(ch.to_uppercase()));
                forms.dedup();
            }
            for form in forms {
                match digits.insert(form as i32, digit) {
                    Some(previous) if previous != digit => {
                        return Err(BuildError::DuplicateRadixCharacter {
                            code_point: form as u32,
                            first_digit: previous as u32,
                            second_digit: digit as u32,
                        })
                    }
                    _ => {}
                }
            }
        }
        let digits = digits.build();

        let mut ignored = SubsetBuilder::new();
        for &separator in &self.grouping_separators {
            ignored.add_range(separator as u32, separator as u32);
        }
        if self.dashes != DashHandling::Keep {
            ignored.add_category(UnicodeCategory::DashPunctuation);
            for ch in NEGATIVE_SIGNS.iter().chain(&['\u{00AD}']) {
                ignored.add_range(*ch as u32, *ch as u32);
            }
        }
        for (code_point, _) in digits.iter() {
            ignored.remove_range(code_point as u32, code_point as u32);
        }
        let ignored = ignored.build()?;

        let radix = alphabet.len() as u32;
        let min = Self::bound(self.min, T::MIN);
        let max = Self::bound(self.max, T::MAX);
        tracing::debug!(
            target_type = T::NAME,
            radix,
            ?min,
            ?max,
            optimal_digit_map = digits.is_optimal(),
            "built integral numeric parser"
        );
        Ok(IntegralNumericParser {
            digits,
            radix,
            min,
            max,
            ignored,
            dashes: self.dashes,
            target: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::IntegralNumericParser;
    use crate::{BuildError, ErrorKind, ParseError};

    fn hex() -> IntegralNumericParser<i64> {
        IntegralNumericParser::builder()
            .allow_hexadecimal_numbers()
            .build()
            .unwrap()
    }

    #[test]
    fn test_hexadecimal() {
        let parser = hex();
        assert_eq!(16, parser.radix());
        assert_eq!(Ok(Some(255)), parser.parse(Some("FF")));
        assert_eq!(Ok(Some(255)), parser.parse(Some("ff")));
        assert_eq!(Ok(Some(-26)), parser.parse(Some("-1a")));
    }

    #[test]
    fn test_extremes_round_trip() {
        let parser = hex();
        let max = format!("{:X}", i64::MAX);
        assert_eq!(Ok(Some(i64::MAX)), parser.parse(Some(&max)));
        assert_eq!(Ok(Some(i64::MIN)), parser.parse(Some("-8000000000000000")));
    }

    #[test]
    fn test_overflow_reports_configured_bound() {
        let parser = hex();
        assert_eq!(
            Err(ParseError::ValueAboveMaxInclusive { max: i64::MAX }),
            parser.parse(Some("8000000000000000"))
        );
        assert_eq!(
            Err(ParseError::ValueBelowMinInclusive { min: i64::MIN }),
            parser.parse(Some("-8000000000000001"))
        );
    }

    #[test]
    fn test_configured_bounds() {
        let parser = IntegralNumericParser::<i32>::builder()
            .allow_hexadecimal_numbers()
            .max_value_inclusive(255)
            .min_value_exclusive(-1)
            .build()
            .unwrap();
        assert_eq!(Ok(Some(255)), parser.parse(Some("FF")));
        assert_eq!(
            Err(ParseError::ValueAboveMaxInclusive { max: 255 }),
            parser.parse(Some("100"))
        );
        assert_eq!(Ok(Some(0)), parser.parse(Some("0")));
        assert_eq!(
            Err(ParseError::ValueBelowMinExclusive { min: -1 }),
            parser.parse(Some("-1"))
        );

        let exclusive = IntegralNumericParser::<u8>::builder()
            .allow_decimal_numbers()
            .max_value_exclusive(10u8)
            .build()
            .unwrap();
        assert_eq!(Ok(Some(9)), exclusive.parse(Some("9")));
        assert_eq!(
            Err(ParseError::ValueAboveMaxExclusive { max: 10 }),
            exclusive.parse(Some("10"))
        );
    }

    #[test]
    fn test_target_type_range() {
        let parser = IntegralNumericParser::<u8>::builder()
            .allow_decimal_numbers()
            .build()
            .unwrap();
        assert_eq!(Ok(Some(255u8)), parser.parse(Some("255")));
        assert_eq!(
            Err(ParseError::ValueAboveMaxInclusive { max: 255 }),
            parser.parse(Some("256"))
        );
        assert_eq!(
            Err(ParseError::ValueBelowMinInclusive { min: 0 }),
            parser.parse(Some("-1"))
        );
    }

    #[test]
    fn test_case_sensitive_digits() {
        let parser = IntegralNumericParser::<i32>::builder()
            .allow_hexadecimal_numbers()
            .case_sensitive()
            .build()
            .unwrap();
        let err = parser.parse(Some("ff")).unwrap_err();
        assert_eq!(ErrorKind::InvalidCharacter, err.kind());
        assert_eq!(Some(0), err.index());
    }

    #[test]
    fn test_base_36_and_custom_alphabet() {
        let base36 = IntegralNumericParser::<i32>::builder()
            .allow_base_n_numbers(36)
            .build()
            .unwrap();
        assert_eq!(Ok(Some(35 * 36 + 35)), base36.parse(Some("zz")));

        let ternary = IntegralNumericParser::<i32>::builder()
            .allow_custom_base_numbers("abc")
            .case_sensitive()
            .build()
            .unwrap();
        assert_eq!(Ok(Some(2 * 9 + 1)), ternary.parse(Some("cab")));
    }

    #[test]
    fn test_grouping_separators() {
        let parser = IntegralNumericParser::<i32>::builder()
            .allow_decimal_numbers()
            .grouping_separator(',')
            .build()
            .unwrap();
        assert_eq!(Ok(Some(1_234_567)), parser.parse(Some("1,234,567")));

        let spaced = IntegralNumericParser::<i32>::builder()
            .allow_decimal_numbers()
            .grouping_separator('\u{202F}')
            .build()
            .unwrap();
        assert_eq!(Ok(Some(1234)), spaced.parse(Some("1\u{202F}234")));
        assert_eq!(Ok(Some(1234)), spaced.parse(Some("1 234")));
        assert_eq!(Ok(Some(1234)), spaced.parse(Some("1\u{A0}234")));

        let err = parser.parse(Some("1 234")).unwrap_err();
        assert_eq!(ErrorKind::InvalidWhitespaceCharacter, err.kind());
        assert_eq!(Some(1), err.index());
    }

    #[test]
    fn test_sign_variants() {
        let parser = IntegralNumericParser::<i32>::builder()
            .allow_decimal_numbers()
            .build()
            .unwrap();
        assert_eq!(Ok(Some(-42)), parser.parse(Some("\u{2212}42")));
        assert_eq!(Ok(Some(-42)), parser.parse(Some("\u{FF0D}42")));
        assert_eq!(Ok(Some(42)), parser.parse(Some("+42")));
        assert_eq!(Ok(Some(7)), parser.parse(Some("\u{FF0B}7")));
        assert_eq!(
            Err(ParseError::InvalidCharacter {
                code_point: '-' as u32,
                index: 2
            }),
            parser.parse(Some("12-3"))
        );
    }

    #[test]
    fn test_ignore_dashes() {
        let all = IntegralNumericParser::<i32>::builder()
            .allow_decimal_numbers()
            .ignore_all_dashes_and_hyphens()
            .build()
            .unwrap();
        assert_eq!(Ok(Some(1234)), all.parse(Some("12-34")));
        assert_eq!(Ok(Some(5)), all.parse(Some("-5")));
        assert_eq!(Ok(Some(12)), all.parse(Some("1\u{2010}2")));

        let keep_sign = IntegralNumericParser::<i32>::builder()
            .allow_decimal_numbers()
            .ignore_all_dashes_and_hyphens_except_leading_negative_sign()
            .build()
            .unwrap();
        assert_eq!(Ok(Some(-1234)), keep_sign.parse(Some("-12-34")));
    }

    #[test]
    fn test_empty_and_digitless_input() {
        let parser = hex();
        assert_eq!(Ok(None), parser.parse(None));
        assert_eq!(Ok(None), parser.parse(Some("")));
        assert_eq!(Ok(None), parser.parse(Some("  ")));
        assert_eq!(
            Err(ParseError::ValueTooShort { min: 1, actual: 0 }),
            parser.parse(Some("-"))
        );
    }

    #[test]
    fn test_error_index_counts_trimmed_whitespace() {
        let parser = hex();
        assert_eq!(
            Err(ParseError::InvalidCharacter {
                code_point: 'x' as u32,
                index: 3
            }),
            parser.parse(Some("  1x"))
        );
        assert_eq!(
            Err(ParseError::InvalidCharacter {
                code_point: 'x' as u32,
                index: 2
            }),
            parser.parse(Some("\u{3000}1x "))
        );
    }

    #[test]
    fn test_parse_into() {
        #[derive(Debug, PartialEq)]
        struct Port(u16);

        let parser = IntegralNumericParser::<u16>::builder()
            .allow_decimal_numbers()
            .build()
            .unwrap();
        assert_eq!(
            Ok(Some(Port(8080))),
            parser.parse_into(Some("8080"), |value| value.map(Port))
        );
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            BuildError::NoRadixConfigured,
            IntegralNumericParser::<i32>::builder().build().unwrap_err()
        );
        assert_eq!(
            BuildError::InvalidRadix { radix: 37 },
            IntegralNumericParser::<i32>::builder()
                .allow_base_n_numbers(37)
                .build()
                .unwrap_err()
        );
        assert_eq!(
            BuildError::MinMaxOutOfRangeForTargetType {
                min: -1,
                max: 255,
                target_type: "u8"
            },
            IntegralNumericParser::<u8>::builder()
                .allow_decimal_numbers()
                .min_value_inclusive(-1)
                .build()
                .unwrap_err()
        );
        assert_eq!(
            BuildError::DuplicateRadixCharacter {
                code_point: '0' as u32,
                first_digit: 0,
                second_digit: 3
            },
            IntegralNumericParser::<i32>::builder()
                .allow_custom_base_numbers("0120")
                .build()
                .unwrap_err()
        );
    }
}
