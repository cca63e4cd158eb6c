//! MOBI locale / language codes.
//!
//! The low byte is the main language, the next byte the dialect
//! (e.g. 1033 = 0x0409 = English (US), 2057 = 0x0809 = English (UK)).

static LANGUAGES: &[(u8, &str)] = &[
    (0x00, "Neutral"),
    (0x01, "Arabic"),
    (0x02, "Bulgarian"),
    (0x03, "Catalan"),
    (0x04, "Chinese"),
    (0x05, "Czech"),
    (0x06, "Danish"),
    (0x07, "German"),
    (0x08, "Greek"),
    (0x09, "English"),
    (0x0A, "Spanish"),
    (0x0B, "Finnish"),
    (0x0C, "French"),
    (0x0D, "Hebrew"),
    (0x0E, "Hungarian"),
    (0x0F, "Icelandic"),
    (0x10, "Italian"),
    (0x11, "Japanese"),
    (0x12, "Korean"),
    (0x13, "Dutch"),
    (0x14, "Norwegian"),
    (0x15, "Polish"),
    (0x16, "Portuguese"),
    (0x18, "Romanian"),
    (0x19, "Russian"),
    (0x1A, "Croatian"),
    (0x1B, "Slovak"),
    (0x1C, "Albanian"),
    (0x1D, "Swedish"),
    (0x1E, "Thai"),
    (0x1F, "Turkish"),
    (0x20, "Urdu"),
    (0x21, "Indonesian"),
    (0x22, "Ukrainian"),
    (0x23, "Belarusian"),
    (0x24, "Slovenian"),
    (0x25, "Estonian"),
    (0x26, "Latvian"),
    (0x27, "Lithuanian"),
    (0x29, "Persian"),
    (0x2A, "Vietnamese"),
    (0x2B, "Armenian"),
    (0x2D, "Basque"),
    (0x2F, "Macedonian"),
    (0x36, "Afrikaans"),
    (0x37, "Georgian"),
    (0x38, "Faroese"),
    (0x39, "Hindi"),
    (0x3E, "Malay"),
    (0x41, "Swahili"),
    (0x45, "Bengali"),
    (0x49, "Tamil"),
    (0x4E, "Marathi"),
];

static DIALECTS: &[(u8, u8, &str)] = &[
    (0x04, 0x04, "Traditional"),
    (0x04, 0x08, "Simplified"),
    (0x07, 0x04, "Germany"),
    (0x07, 0x08, "Switzerland"),
    (0x07, 0x0C, "Austria"),
    (0x09, 0x04, "US"),
    (0x09, 0x08, "UK"),
    (0x09, 0x0C, "Australia"),
    (0x09, 0x10, "Canada"),
    (0x09, 0x14, "New Zealand"),
    (0x09, 0x18, "Ireland"),
    (0x0A, 0x04, "Spain"),
    (0x0A, 0x08, "Mexico"),
    (0x0C, 0x04, "France"),
    (0x0C, 0x08, "Belgium"),
    (0x0C, 0x0C, "Canada"),
    (0x0C, 0x10, "Switzerland"),
    (0x10, 0x04, "Italy"),
    (0x10, 0x08, "Switzerland"),
    (0x13, 0x04, "Netherlands"),
    (0x13, 0x08, "Belgium"),
    (0x16, 0x04, "Brazil"),
    (0x16, 0x08, "Portugal"),
];

/// Main language byte of a locale code.
pub fn language_of(code: u32) -> u8 {
    (code & 0xFF) as u8
}

/// Dialect byte of a locale code.
pub fn dialect_of(code: u32) -> u8 {
    ((code >> 8) & 0xFF) as u8
}

/// Compose a locale code from language and dialect bytes.
pub fn compose(language: u8, dialect: u8) -> u32 {
    (u32::from(dialect) << 8) | u32::from(language)
}

/// Display name of a language byte.
pub fn language_name(language: u8) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, name)| *name)
}

/// Display name of a full locale code, e.g. `English (US)`.
pub fn locale_name(code: u32) -> Option<String> {
    let language = language_of(code);
    let name = language_name(language)?;
    let dialect = dialect_of(code);
    let dialect_name = DIALECTS
        .iter()
        .find(|(l, d, _)| *l == language && *d == dialect)
        .map(|(_, _, n)| *n);
    Some(match dialect_name {
        Some(d) => format!("{name} ({d})"),
        None => name.to_string(),
    })
}

/// Look up a locale code by language name and optional dialect name
/// (case-insensitive), e.g. `("english", Some("uk"))`.
pub fn code_for(language: &str, dialect: Option<&str>) -> Option<u32> {
    let lang = LANGUAGES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(language.trim()))
        .map(|(c, _)| *c)?;
    match dialect {
        None => Some(u32::from(lang)),
        Some(d) => DIALECTS
            .iter()
            .find(|(l, _, n)| *l == lang && n.eq_ignore_ascii_case(d.trim()))
            .map(|(_, dc, _)| compose(lang, *dc)),
    }
}
