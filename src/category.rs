use unicode_general_category::{get_general_category, GeneralCategory};

/// A Unicode general category.
///
/// The discriminant is a stable ordinal in `0..=29`, used as the bit index in
/// 64-bit category masks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum UnicodeCategory {
    /// `Lu`.
    UppercaseLetter = 0,
    /// `Ll`.
    LowercaseLetter,
    /// `Lt`.
    TitlecaseLetter,
    /// `Lm`.
    ModifierLetter,
    /// `Lo`.
    OtherLetter,
    /// `Mn`.
    NonspacingMark,
    /// `Mc`.
    SpacingMark,
    /// `Me`.
    EnclosingMark,
    /// `Nd`.
    DecimalNumber,
    /// `Nl`.
    LetterNumber,
    /// `No`.
    OtherNumber,
    /// `Pc`.
    ConnectorPunctuation,
    /// `Pd`.
    DashPunctuation,
    /// `Ps`.
    OpenPunctuation,
    /// `Pe`.
    ClosePunctuation,
    /// `Pi`.
    InitialPunctuation,
    /// `Pf`.
    FinalPunctuation,
    /// `Po`.
    OtherPunctuation,
    /// `Sm`.
    MathSymbol,
    /// `Sc`.
    CurrencySymbol,
    /// `Sk`.
    ModifierSymbol,
    /// `So`.
    OtherSymbol,
    /// `Zs`.
    SpaceSeparator,
    /// `Zl`.
    LineSeparator,
    /// `Zp`.
    ParagraphSeparator,
    /// `Cc`.
    Control,
    /// `Cf`.
    Format,
    /// `Cs`.
    Surrogate,
    /// `Co`.
    PrivateUse,
    /// `Cn`.
    Unassigned,
}

const ALL: [UnicodeCategory; 30] = {
    use UnicodeCategory::*;
    [
        UppercaseLetter,
        LowercaseLetter,
        TitlecaseLetter,
        ModifierLetter,
        OtherLetter,
        NonspacingMark,
        SpacingMark,
        EnclosingMark,
        DecimalNumber,
        LetterNumber,
        OtherNumber,
        ConnectorPunctuation,
        DashPunctuation,
        OpenPunctuation,
        ClosePunctuation,
        InitialPunctuation,
        FinalPunctuation,
        OtherPunctuation,
        MathSymbol,
        CurrencySymbol,
        ModifierSymbol,
        OtherSymbol,
        SpaceSeparator,
        LineSeparator,
        ParagraphSeparator,
        Control,
        Format,
        Surrogate,
        PrivateUse,
        Unassigned,
    ]
};

impl UnicodeCategory {
    /// All categories in ordinal order.
    pub const ALL: [UnicodeCategory; 30] = ALL;

    /// The stable ordinal of this category.
    #[inline]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// The bit this category occupies in a category mask.
    #[inline]
    pub const fn bit(self) -> u64 {
        1u64 << (self as u32)
    }

    /// Returns the category with the given ordinal.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        ALL.get(ordinal as usize).copied()
    }

    /// The two-letter abbreviation used by the Unicode Character Database.
    pub const fn abbreviation(self) -> &'static str {
        use UnicodeCategory::*;
        match self {
            UppercaseLetter => "Lu",
            LowercaseLetter => "Ll",
            TitlecaseLetter => "Lt",
            ModifierLetter => "Lm",
            OtherLetter => "Lo",
            NonspacingMark => "Mn",
            SpacingMark => "Mc",
            EnclosingMark => "Me",
            DecimalNumber => "Nd",
            LetterNumber => "Nl",
            OtherNumber => "No",
            ConnectorPunctuation => "Pc",
            DashPunctuation => "Pd",
            OpenPunctuation => "Ps",
            ClosePunctuation => "Pe",
            InitialPunctuation => "Pi",
            FinalPunctuation => "Pf",
            OtherPunctuation => "Po",
            MathSymbol => "Sm",
            CurrencySymbol => "Sc",
            ModifierSymbol => "Sk",
            OtherSymbol => "So",
            SpaceSeparator => "Zs",
            LineSeparator => "Zl",
            ParagraphSeparator => "Zp",
            Control => "Cc",
            Format => "Cf",
            Surrogate => "Cs",
            PrivateUse => "Co",
            Unassigned => "Cn",
        }
    }

    /// Whether this is one of the letter categories (`L*`).
    pub const fn is_letter(self) -> bool {
        (self as u32) <= UnicodeCategory::OtherLetter as u32
    }
}

/// Builds a category mask from a list of categories.
pub fn category_mask(categories: &[UnicodeCategory]) -> u64 {
    categories.iter().fold(0, |mask, c| mask | c.bit())
}

/// Returns whether `mask` has the bit of `category` set.
#[inline]
pub(crate) fn mask_contains(mask: u64, category: UnicodeCategory) -> bool {
    (mask >> category.ordinal()) & 1 == 1
}

/// Returns the general category of any code point, surrogates and
/// out-of-range values included.
pub fn category_of(code_point: u32) -> UnicodeCategory {
    match char::from_u32(code_point) {
        Some(ch) => category_of_char(ch),
        None if (0xD800..=0xDFFF).contains(&code_point) => UnicodeCategory::Surrogate,
        None => UnicodeCategory::Unassigned,
    }
}

/// Returns the general category of a `char`.
#[allow(unreachable_patterns)]
pub fn category_of_char(ch: char) -> UnicodeCategory {
    use UnicodeCategory as U;
    match get_general_category(ch) {
        GeneralCategory::UppercaseLetter => U::UppercaseLetter,
        GeneralCategory::LowercaseLetter => U::LowercaseLetter,
        GeneralCategory::TitlecaseLetter => U::TitlecaseLetter,
        GeneralCategory::ModifierLetter => U::ModifierLetter,
        GeneralCategory::OtherLetter => U::OtherLetter,
        GeneralCategory::NonspacingMark => U::NonspacingMark,
        GeneralCategory::SpacingMark => U::SpacingMark,
        GeneralCategory::EnclosingMark => U::EnclosingMark,
        GeneralCategory::DecimalNumber => U::DecimalNumber,
        GeneralCategory::LetterNumber => U::LetterNumber,
        GeneralCategory::OtherNumber => U::OtherNumber,
        GeneralCategory::ConnectorPunctuation => U::ConnectorPunctuation,
        GeneralCategory::DashPunctuation => U::DashPunctuation,
        GeneralCategory::OpenPunctuation => U::OpenPunctuation,
        GeneralCategory::ClosePunctuation => U::ClosePunctuation,
        GeneralCategory::InitialPunctuation => U::InitialPunctuation,
        GeneralCategory::FinalPunctuation => U::FinalPunctuation,
        GeneralCategory::OtherPunctuation => U::OtherPunctuation,
        GeneralCategory::MathSymbol => U::MathSymbol,
        GeneralCategory::CurrencySymbol => U::CurrencySymbol,
        GeneralCategory::ModifierSymbol => U::ModifierSymbol,
        GeneralCategory::OtherSymbol => U::OtherSymbol,
        GeneralCategory::SpaceSeparator => U::SpaceSeparator,
        GeneralCategory::LineSeparator => U::LineSeparator,
        GeneralCategory::ParagraphSeparator => U::ParagraphSeparator,
        GeneralCategory::Control => U::Control,
        GeneralCategory::Format => U::Format,
        GeneralCategory::Surrogate => U::Surrogate,
        GeneralCategory::PrivateUse => U::PrivateUse,
        GeneralCategory::Unassigned => U::Unassigned,
        _ => U::Unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::{category_mask, category_of, mask_contains, UnicodeCategory};

    #[test]
    fn test_ordinals_are_stable() {
        for (idx, cat) in UnicodeCategory::ALL.iter().enumerate() {
            assert_eq!(idx as u32, cat.ordinal());
            assert_eq!(Some(*cat), UnicodeCategory::from_ordinal(idx as u32));
        }
        assert_eq!(None, UnicodeCategory::from_ordinal(30));
    }

    #[test]
    fn test_category_of() {
        assert_eq!(UnicodeCategory::UppercaseLetter, category_of('A' as u32));
        assert_eq!(UnicodeCategory::LowercaseLetter, category_of('z' as u32));
        assert_eq!(UnicodeCategory::DecimalNumber, category_of('7' as u32));
        assert_eq!(UnicodeCategory::DashPunctuation, category_of('-' as u32));
        assert_eq!(UnicodeCategory::DashPunctuation, category_of(0x2014));
        assert_eq!(UnicodeCategory::SpaceSeparator, category_of(' ' as u32));
        assert_eq!(UnicodeCategory::Control, category_of('\n' as u32));
        assert_eq!(UnicodeCategory::Surrogate, category_of(0xD800));
        assert_eq!(UnicodeCategory::Unassigned, category_of(0x110000));
    }

    #[test]
    fn test_mask() {
        let mask = category_mask(&[
            UnicodeCategory::UppercaseLetter,
            UnicodeCategory::DecimalNumber,
        ]);
        assert!(mask_contains(mask, UnicodeCategory::UppercaseLetter));
        assert!(mask_contains(mask, UnicodeCategory::DecimalNumber));
        assert!(!mask_contains(mask, UnicodeCategory::LowercaseLetter));
        assert!(UnicodeCategory::OtherLetter.is_letter());
        assert!(!UnicodeCategory::NonspacingMark.is_letter());
    }
}
