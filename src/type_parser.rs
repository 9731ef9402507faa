use crate::category::category_of_char;
use crate::converter::{Converter, ConverterBuilder};
use crate::error::{BuildError, ErrorKind, InvalidCodePoint, ParseError};
use crate::subset_ty::{Subset, SubsetBuilder};
use crate::UnicodeCategory;
use regex::Regex;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use unicode_normalization::{is_nfc, is_nfd, is_nfkc, is_nfkd, UnicodeNormalization};

const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// How letters are cased on output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CasePolicy {
    /// Leave case as is.
    #[default]
    Preserve,
    /// Upper-case every code point.
    Upper,
    /// Lower-case every code point.
    Lower,
    /// Title-case the first emitted code point, lower-case the rest.
    Title,
}

/// What happens to whitespace inside the (already trimmed) input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WhitespacePolicy {
    /// Fail unless a conversion rule replaces the whitespace.
    #[default]
    Forbid,
    /// Keep every whitespace character.
    Preserve,
    /// Replace every whitespace character with a substitute.
    PreserveAndConvert(char),
    /// Collapse each run of whitespace to its first character.
    Normalize,
    /// Collapse each run of whitespace to a single substitute.
    NormalizeAndConvert(char),
    /// Drop every whitespace character.
    Remove,
}

impl WhitespacePolicy {
    fn is_normalizing(self) -> bool {
        matches!(
            self,
            WhitespacePolicy::Normalize | WhitespacePolicy::NormalizeAndConvert(_)
        )
    }
}

/// How absent and empty input resolve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullEmptyPolicy {
    /// `None` stays `None`, `""` stays `""`.
    #[default]
    PreserveNullAndEmpty,
    /// `None` becomes `""`.
    ConvertNullToEmpty,
    /// `""` becomes `None`.
    ConvertEmptyToNull,
}

impl NullEmptyPolicy {
    fn resolve_null(self) -> Option<String> {
        match self {
            NullEmptyPolicy::ConvertNullToEmpty => Some(String::new()),
            _ => None,
        }
    }

    fn resolve_empty(self) -> Option<String> {
        match self {
            NullEmptyPolicy::ConvertEmptyToNull => None,
            _ => Some(String::new()),
        }
    }
}

/// The Unicode normalization form applied before parsing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormalizationForm {
    /// No normalization.
    Preserve,
    /// Canonical composition.
    #[default]
    Nfc,
    /// Canonical decomposition.
    Nfd,
    /// Compatibility composition.
    Nfkc,
    /// Compatibility decomposition.
    Nfkd,
}

impl NormalizationForm {
    /// Normalizes `s`, borrowing it when it is already in this form.
    pub fn apply(self, s: &str) -> Cow<'_, str> {
        match self {
            NormalizationForm::Preserve => Cow::Borrowed(s),
            NormalizationForm::Nfc if is_nfc(s) => Cow::Borrowed(s),
            NormalizationForm::Nfc => Cow::Owned(s.nfc().collect()),
            NormalizationForm::Nfd if is_nfd(s) => Cow::Borrowed(s),
            NormalizationForm::Nfd => Cow::Owned(s.nfd().collect()),
            NormalizationForm::Nfkc if is_nfkc(s) => Cow::Borrowed(s),
            NormalizationForm::Nfkc => Cow::Owned(s.nfkc().collect()),
            NormalizationForm::Nfkd if is_nfkd(s) => Cow::Borrowed(s),
            NormalizationForm::Nfkd => Cow::Owned(s.nfkd().collect()),
        }
    }
}

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The outcome of [`TypeParser::parse_lenient`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LenientParse {
    /// The parsed value; rejected code points appear as U+FFFD.
    pub value: Option<String>,
    /// Every rejected code point, in input order.
    pub invalid_code_points: Vec<InvalidCodePoint>,
}

impl LenientParse {
    /// Whether no code point was rejected.
    pub fn is_valid(&self) -> bool {
        self.invalid_code_points.is_empty()
    }
}

/// A compiled string type: acceptance, conversion, case, whitespace,
/// normalization and length rules applied in one pass per call.
///
/// A parser is immutable once built and can be shared across threads.
#[derive(Clone)]
pub struct TypeParser {
    accepted: Subset,
    converter: Converter,
    case: CasePolicy,
    whitespace: WhitespacePolicy,
    null_empty: NullEmptyPolicy,
    normalization: NormalizationForm,
    min_size: usize,
    max_size: usize,
    regex: Option<(Regex, String)>,
    validator: Option<Validator>,
}

impl TypeParser {
    /// Returns a builder with the default policies.
    pub fn builder() -> TypeParserBuilder {
        TypeParserBuilder::new()
    }

    /// The accepted code points.
    pub fn accepted(&self) -> &Subset {
        &self.accepted
    }

    /// The substitution rules.
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// The output case policy.
    pub fn case_policy(&self) -> CasePolicy {
        self.case
    }

    /// The inner whitespace policy.
    pub fn whitespace_policy(&self) -> WhitespacePolicy {
        self.whitespace
    }

    /// How absent and empty input resolve.
    pub fn null_empty_policy(&self) -> NullEmptyPolicy {
        self.null_empty
    }

    /// The normalization form applied first.
    pub fn normalization_form(&self) -> NormalizationForm {
        self.normalization
    }

    /// Minimum length in code points.
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Maximum length in code points.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Parses `input`, failing at the first offending code point.
    pub fn parse(&self, input: Option<&str>) -> Result<Option<String>, ParseError> {
        self.parse_with(input, None).map_err(|error| {
            tracing::trace!(kind = %error.kind(), index = ?error.index(), "parse failed");
            error
        })
    }

    /// Parses UTF-16 input. A lone surrogate fails with its UTF-16 index.
    pub fn parse_utf16(&self, input: Option<&[u16]>) -> Result<Option<String>, ParseError> {
        match input {
            None => self.parse(None),
            Some(units) => {
                let decoded = decode_utf16(units).map_err(|error| {
                    tracing::trace!(kind = %error.kind(), index = ?error.index(), "parse failed");
                    error
                })?;
                self.parse(Some(&decoded))
            }
        }
    }

    /// Parses `input`, replacing rejected code points with U+FFFD instead of
    /// failing. Length, pattern and custom validation still fail.
    pub fn parse_lenient(&self, input: Option<&str>) -> Result<LenientParse, ParseError> {
        let mut invalid_code_points = Vec::new();
        let value = self.parse_with(input, Some(&mut invalid_code_points))?;
        if !invalid_code_points.is_empty() {
            tracing::trace!(count = invalid_code_points.len(), "lenient parse replaced code points");
        }
        Ok(LenientParse {
            value,
            invalid_code_points,
        })
    }

    /// Parses `input` and hands the result to `factory`.
    pub fn parse_into<T, F>(&self, input: Option<&str>, factory: F) -> Result<T, ParseError>
    where
        F: FnOnce(Option<String>) -> T,
    {
        self.parse(input).map(factory)
    }

    fn parse_with(
        &self,
        input: Option<&str>,
        invalid: Option<&mut Vec<InvalidCodePoint>>,
    ) -> Result<Option<String>, ParseError> {
        let input = match input {
            None => return Ok(self.null_empty.resolve_null()),
            Some("") => return Ok(self.null_empty.resolve_empty()),
            Some(input) => input,
        };
        let normalized = self.normalization.apply(input);
        let chars: Vec<char> = normalized.chars().collect();

        let start = chars
            .iter()
            .position(|ch| !ch.is_whitespace())
            .unwrap_or(chars.len());
        let end = chars
            .iter()
            .rposition(|ch| !ch.is_whitespace())
            .map_or(start, |pos| pos + 1);
        if start == end {
            return Ok(self.null_empty.resolve_empty());
        }

        let value = self.transform(&chars, start, end, invalid)?;
        self.validate(&value)?;
        Ok(Some(value))
    }

    fn transform(
        &self,
        chars: &[char],
        start: usize,
        end: usize,
        mut invalid: Option<&mut Vec<InvalidCodePoint>>,
    ) -> Result<String, ParseError> {
        let body = &chars[start..end];
        let mut scan = self.converter.scan(body);
        let mut out = Output::new(self.case, self.max_size, body.len());
        let mut in_whitespace_run = false;

        let mut i = 0;
        while i < body.len() {
            let ch = body[i];
            let index = start + i;

            if let Some((replacement, consumed)) = scan.conversion_for(i, ch as u32) {
                for ch in replacement.iter().filter_map(|&cp| char::from_u32(cp)) {
                    out.push(ch)?;
                }
                // A deletion keeps the surrounding whitespace run going.
                if !replacement.is_empty() {
                    in_whitespace_run = false;
                }
                i += consumed;
                continue;
            }
            i += 1;

            if ch.is_whitespace() {
                let was_in_run = in_whitespace_run;
                in_whitespace_run = true;
                match self.whitespace {
                    WhitespacePolicy::Forbid => {
                        let kind = ErrorKind::InvalidWhitespaceCharacter;
                        reject(&mut out, invalid.as_deref_mut(), kind, ch, index)?;
                    }
                    WhitespacePolicy::Preserve => out.push(ch)?,
                    WhitespacePolicy::PreserveAndConvert(substitute) => {
                        self.push_substitute(&mut out, invalid.as_deref_mut(), substitute, index)?
                    }
                    WhitespacePolicy::Normalize if !was_in_run => out.push(ch)?,
                    WhitespacePolicy::NormalizeAndConvert(substitute) if !was_in_run => {
                        self.push_substitute(&mut out, invalid.as_deref_mut(), substitute, index)?
                    }
                    WhitespacePolicy::Normalize
                    | WhitespacePolicy::NormalizeAndConvert(_)
                    | WhitespacePolicy::Remove => {}
                }
                continue;
            }
            in_whitespace_run = false;

            if self.accepted.contains_char(ch) {
                out.push(ch)?;
            } else {
                reject(&mut out, invalid.as_deref_mut(), rejection_kind(ch), ch, index)?;
            }
        }

        let mut value = out.finish();
        let mut len = value.len_in_code_points;
        if self.whitespace.is_normalizing() {
            let trimmed = value.text.trim();
            if trimmed.len() != value.text.len() {
                value.text = trimmed.to_owned();
                len = value.text.chars().count();
            }
        }
        if len < self.min_size {
            return Err(ParseError::ValueTooShort {
                min: self.min_size,
                actual: len,
            });
        }
        Ok(value.text)
    }

    /// Whitespace substitutes go through the acceptance test like any other
    /// emitted code point; a rejection is reported at the whitespace index.
    fn push_substitute(
        &self,
        out: &mut Output,
        invalid: Option<&mut Vec<InvalidCodePoint>>,
        substitute: char,
        index: usize,
    ) -> Result<(), ParseError> {
        if self.accepted.contains_char(substitute) {
            out.push(substitute)
        } else {
            reject(out, invalid, rejection_kind(substitute), substitute, index)
        }
    }

    fn validate(&self, value: &str) -> Result<(), ParseError> {
        if let Some((regex, pattern)) = &self.regex {
            if !regex.is_match(value) {
                return Err(ParseError::DoesNotMatchRegex {
                    pattern: pattern.clone(),
                });
            }
        }
        if let Some(validator) = &self.validator {
            if !validator(value) {
                return Err(ParseError::FailedCustomValidation);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TypeParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeParser")
            .field("accepted", &self.accepted)
            .field("converter", &self.converter)
            .field("case", &self.case)
            .field("whitespace", &self.whitespace)
            .field("null_empty", &self.null_empty)
            .field("normalization", &self.normalization)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("regex", &self.regex.as_ref().map(|(_, pattern)| pattern))
            .field("custom_validator", &self.validator.is_some())
            .finish()
    }
}

fn reject(
    out: &mut Output,
    invalid: Option<&mut Vec<InvalidCodePoint>>,
    kind: ErrorKind,
    ch: char,
    index: usize,
) -> Result<(), ParseError> {
    match invalid {
        Some(invalid) => {
            invalid.push(InvalidCodePoint {
                code_point: ch as u32,
                index,
                kind,
            });
            out.push_raw(REPLACEMENT_CHARACTER)
        }
        None => Err(ParseError::invalid_code_point(kind, ch as u32, index)),
    }
}

pub(crate) fn rejection_kind(ch: char) -> ErrorKind {
    if ch.is_whitespace() {
        ErrorKind::InvalidWhitespaceCharacter
    } else if ch.is_control() {
        ErrorKind::InvalidControlCharacter
    } else if matches!(ch, '"' | '\'' | '`')
        || matches!(
            category_of_char(ch),
            UnicodeCategory::InitialPunctuation | UnicodeCategory::FinalPunctuation
        )
    {
        ErrorKind::InvalidQuoteCharacter
    } else {
        ErrorKind::InvalidCharacter
    }
}

fn decode_utf16(units: &[u16]) -> Result<String, ParseError> {
    let mut decoded = String::with_capacity(units.len());
    let mut index = 0;
    for result in char::decode_utf16(units.iter().copied()) {
        match result {
            Ok(ch) => {
                decoded.push(ch);
                index += ch.len_utf16();
            }
            Err(e) => {
                return Err(ParseError::LoneSurrogate {
                    unit: e.unpaired_surrogate(),
                    index,
                })
            }
        }
    }
    Ok(decoded)
}

/// The titlecase form of the first code point of a value.
fn to_titlecase(ch: char) -> SmallVec<[char; 3]> {
    match ch {
        '\u{01C4}'..='\u{01C6}' => smallvec::smallvec!['\u{01C5}'],
        '\u{01C7}'..='\u{01C9}' => smallvec::smallvec!['\u{01C8}'],
        '\u{01CA}'..='\u{01CC}' => smallvec::smallvec!['\u{01CB}'],
        '\u{01F1}'..='\u{01F3}' => smallvec::smallvec!['\u{01F2}'],
        _ => {
            let mut upper = ch.to_uppercase();
            let mut title = SmallVec::new();
            title.extend(upper.next());
            title.extend(upper.flat_map(char::to_lowercase));
            title
        }
    }
}

struct Output {
    case: CasePolicy,
    max_size: usize,
    text: String,
    len: usize,
    title_pending: bool,
}

struct Finished {
    text: String,
    len_in_code_points: usize,
}

impl Output {
    fn new(case: CasePolicy, max_size: usize, capacity: usize) -> Self {
        Output {
            case,
            max_size,
            text: String::with_capacity(capacity),
            len: 0,
            title_pending: case == CasePolicy::Title,
        }
    }

    fn push(&mut self, ch: char) -> Result<(), ParseError> {
        match self.case {
            CasePolicy::Preserve => self.push_raw(ch),
            CasePolicy::Upper => ch.to_uppercase().try_for_each(|c| self.push_raw(c)),
            CasePolicy::Lower => ch.to_lowercase().try_for_each(|c| self.push_raw(c)),
            CasePolicy::Title if self.title_pending => {
                self.title_pending = false;
                to_titlecase(ch).into_iter().try_for_each(|c| self.push_raw(c))
            }
            CasePolicy::Title => ch.to_lowercase().try_for_each(|c| self.push_raw(c)),
        }
    }

    fn push_raw(&mut self, ch: char) -> Result<(), ParseError> {
        if self.len == self.max_size {
            return Err(ParseError::ValueTooLong { max: self.max_size });
        }
        self.len += 1;
        self.text.push(ch);
        Ok(())
    }

    fn finish(self) -> Finished {
        Finished {
            text: self.text,
            len_in_code_points: self.len,
        }
    }
}

/// Configures a [`TypeParser`].
///
/// Conversion rules implicitly accept their source code points. Setters
/// never fail; the first invalid setting is reported by [`build`].
///
/// [`build`]: TypeParserBuilder::build
#[derive(Clone, Default)]
pub struct TypeParserBuilder {
    accepted: SubsetBuilder,
    converter: ConverterBuilder,
    case: CasePolicy,
    whitespace: WhitespacePolicy,
    null_empty: NullEmptyPolicy,
    normalization: NormalizationForm,
    min_size: usize,
    max_size: Option<usize>,
    regex: Option<String>,
    validator: Option<Validator>,
}

impl TypeParserBuilder {
    /// Creates a builder with the default policies and no accepted code points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a single code point.
    pub fn accept_code_point(mut self, code_point: u32) -> Self {
        self.accepted.add_range(code_point, code_point);
        self
    }

    /// Accepts every listed code point.
    pub fn accept_code_points(mut self, code_points: &[u32]) -> Self {
        for &code_point in code_points {
            self.accepted.add_range(code_point, code_point);
        }
        self
    }

    /// Accepts the inclusive range `[from, to]`.
    pub fn accept_code_point_range(mut self, from: u32, to: u32) -> Self {
        self.accepted.add_range(from, to);
        self
    }

    /// Accepts one character.
    pub fn accept_char(mut self, ch: char) -> Self {
        self.accepted.add_range(ch as u32, ch as u32);
        self
    }

    /// Accepts every character of `chars`.
    pub fn accept_chars(mut self, chars: &str) -> Self {
        for ch in chars.chars() {
            self.accepted.add_range(ch as u32, ch as u32);
        }
        self
    }

    /// Accepts the inclusive character range `[from, to]`.
    pub fn accept_char_range(mut self, from: char, to: char) -> Self {
        self.accepted.add_range(from as u32, to as u32);
        self
    }

    /// Accepts a whole general category.
    pub fn accept_category(mut self, category: UnicodeCategory) -> Self {
        self.accepted.add_category(category);
        self
    }

    /// Accepts everything `subset` accepts.
    pub fn accept_subset(mut self, subset: &Subset) -> Self {
        self.accepted.add_subset(subset);
        self
    }

    /// Rejects code points even if another rule accepts them.
    pub fn reject_chars(mut self, chars: &str) -> Self {
        for ch in chars.chars() {
            self.accepted.remove_range(ch as u32, ch as u32);
        }
        self
    }

    /// Replaces `from` with `to` (possibly empty) and accepts `from`.
    pub fn convert_char(mut self, from: char, to: &str) -> Self {
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.converter.add_code_point(from as u32, &to);
        self.accepted.add_range(from as u32, from as u32);
        self
    }

    /// Replaces `from` with `to` and accepts `from`.
    pub fn convert_code_point(mut self, from: u32, to: &[u32]) -> Self {
        self.converter.add_code_point(from, to);
        self.accepted.add_range(from, from);
        self
    }

    /// Replaces a character sequence and accepts each of its characters.
    pub fn convert_sequence(mut self, from: &str, to: &str) -> Self {
        let from: Vec<u32> = from.chars().map(u32::from).collect();
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.converter.add_sequence(&from, &to);
        for &cp in &from {
            self.accepted.add_range(cp, cp);
        }
        self
    }

    /// Replaces every member of `category` and accepts the category.
    pub fn convert_category(mut self, category: UnicodeCategory, to: &str) -> Self {
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.converter.add_category(category, &to);
        self.accepted.add_category(category);
        self
    }

    /// Replaces every dash punctuation character with `to`.
    pub fn convert_all_dashes_to(self, to: char) -> Self {
        let mut buf = [0u8; 4];
        self.convert_category(UnicodeCategory::DashPunctuation, to.encode_utf8(&mut buf))
    }

    /// Minimum output length in code points.
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Maximum output length in code points.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Exact output length in code points.
    pub fn fixed_size(self, size: usize) -> Self {
        self.min_size(size).max_size(size)
    }

    /// Sets how absent and empty input resolve.
    pub fn null_empty_policy(mut self, policy: NullEmptyPolicy) -> Self {
        self.null_empty = policy;
        self
    }

    /// Keeps `None` and `""` apart.
    pub fn preserve_null_and_empty(self) -> Self {
        self.null_empty_policy(NullEmptyPolicy::PreserveNullAndEmpty)
    }

    /// Resolves `None` to `""`.
    pub fn convert_null_to_empty(self) -> Self {
        self.null_empty_policy(NullEmptyPolicy::ConvertNullToEmpty)
    }

    /// Resolves `""` to `None`.
    pub fn convert_empty_to_null(self) -> Self {
        self.null_empty_policy(NullEmptyPolicy::ConvertEmptyToNull)
    }

    /// Sets the output case policy.
    pub fn case_policy(mut self, policy: CasePolicy) -> Self {
        self.case = policy;
        self
    }

    /// Upper-cases the output.
    pub fn to_upper_case(self) -> Self {
        self.case_policy(CasePolicy::Upper)
    }

    /// Lower-cases the output.
    pub fn to_lower_case(self) -> Self {
        self.case_policy(CasePolicy::Lower)
    }

    /// Title-cases the first code point and lower-cases the rest.
    pub fn to_title_case(self) -> Self {
        self.case_policy(CasePolicy::Title)
    }

    /// Leaves case untouched.
    pub fn preserve_case(self) -> Self {
        self.case_policy(CasePolicy::Preserve)
    }

    /// Sets the inner whitespace policy.
    pub fn whitespace_policy(mut self, policy: WhitespacePolicy) -> Self {
        self.whitespace = policy;
        self
    }

    /// Rejects inner whitespace.
    pub fn forbid_whitespace(self) -> Self {
        self.whitespace_policy(WhitespacePolicy::Forbid)
    }

    /// Keeps inner whitespace.
    pub fn preserve_whitespace(self) -> Self {
        self.whitespace_policy(WhitespacePolicy::Preserve)
    }

    /// Replaces each inner whitespace character with `substitute`.
    pub fn preserve_and_convert_whitespace_to(self, substitute: char) -> Self {
        self.whitespace_policy(WhitespacePolicy::PreserveAndConvert(substitute))
    }

    /// Collapses inner whitespace runs.
    pub fn normalize_whitespace(self) -> Self {
        self.whitespace_policy(WhitespacePolicy::Normalize)
    }

    /// Collapses inner whitespace runs into one `substitute` each.
    pub fn normalize_and_convert_whitespace_to(self, substitute: char) -> Self {
        self.whitespace_policy(WhitespacePolicy::NormalizeAndConvert(substitute))
    }

    /// Drops inner whitespace.
    pub fn remove_all_whitespace(self) -> Self {
        self.whitespace_policy(WhitespacePolicy::Remove)
    }

    /// Sets the normalization form applied before parsing.
    pub fn normalization_form(mut self, form: NormalizationForm) -> Self {
        self.normalization = form;
        self
    }

    /// The whole output must match `pattern`.
    pub fn matches_regex(mut self, pattern: &str) -> Self {
        self.regex = Some(pattern.to_owned());
        self
    }

    /// Runs `validator` on every successfully transformed value.
    pub fn custom_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Compiles the parser.
    pub fn build(self) -> Result<TypeParser, BuildError> {
        let max_size = self.max_size.unwrap_or(usize::MAX);
        if self.min_size > max_size {
            return Err(BuildError::MinSizeGreaterThanMaxSize {
                min: self.min_size,
                max: max_size,
            });
        }
        if max_size == 0 {
            tracing::warn!("type parser has a maximum size of 0 and only accepts empty values");
        }
        match self.whitespace {
            WhitespacePolicy::PreserveAndConvert(substitute)
            | WhitespacePolicy::NormalizeAndConvert(substitute)
                if !substitute.is_whitespace() && self.whitespace.is_normalizing() =>
            {
                tracing::warn!(
                    substitute = %substitute.escape_debug(),
                    "whitespace substitute is not whitespace and will not be trimmed"
                );
            }
            _ => {}
        }
        let regex = match self.regex {
            Some(pattern) => {
                let anchored = Regex::new(&format!("^(?:{})$", pattern))?;
                Some((anchored, pattern))
            }
            None => None,
        };
        let accepted = self.accepted.build()?;
        let converter = self.converter.build()?;
        if let WhitespacePolicy::PreserveAndConvert(substitute)
        | WhitespacePolicy::NormalizeAndConvert(substitute) = self.whitespace
        {
            if !accepted.contains_char(substitute) {
                tracing::warn!(
                    substitute = %substitute.escape_debug(),
                    "whitespace substitute is not accepted; inner whitespace will be rejected"
                );
            }
        }
        tracing::debug!(
            representation = ?accepted.representation(),
            code_points = accepted.code_point_count(),
            sequence_converter = converter.is_sequence_converter(),
            min_size = self.min_size,
            max_size,
            "built type parser"
        );
        Ok(TypeParser {
            accepted,
            converter,
            case: self.case,
            whitespace: self.whitespace,
            null_empty: self.null_empty,
            normalization: self.normalization,
            min_size: self.min_size,
            max_size,
            regex,
            validator: self.validator,
        })
    }
}

impl fmt::Debug for TypeParserBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeParserBuilder")
            .field("accepted", &self.accepted)
            .field("converter", &self.converter)
            .field("case", &self.case)
            .field("whitespace", &self.whitespace)
            .field("null_empty", &self.null_empty)
            .field("normalization", &self.normalization)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("regex", &self.regex)
            .field("custom_validator", &self.validator.is_some())
            .finish()
    }
}
