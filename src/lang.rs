//! Supported-language lookup table
//!
//! Maps human-readable language names to the short codes the translation
//! and TTS services accept. The table is static process-wide data; the CLI
//! exposes it read-only for selection and enumeration.

/// Language name → code pairs, sorted by name
const LANGUAGES: &[(&str, &str)] = &[
    ("afrikaans", "af"),
    ("albanian", "sq"),
    ("amharic", "am"),
    ("arabic", "ar"),
    ("armenian", "hy"),
    ("assamese", "as"),
    ("azerbaijani", "az"),
    ("basque", "eu"),
    ("belarusian", "be"),
    ("bengali", "bn"),
    ("bosnian", "bs"),
    ("bulgarian", "bg"),
    ("catalan", "ca"),
    ("cebuano", "ceb"),
    ("chichewa", "ny"),
    ("chinese (simplified)", "zh-cn"),
    ("chinese (traditional)", "zh-tw"),
    ("corsican", "co"),
    ("croatian", "hr"),
    ("czech", "cs"),
    ("danish", "da"),
    ("dutch", "nl"),
    ("english", "en"),
    ("esperanto", "eo"),
    ("estonian", "et"),
    ("filipino", "tl"),
    ("finnish", "fi"),
    ("french", "fr"),
    ("frisian", "fy"),
    ("galician", "gl"),
    ("georgian", "ka"),
    ("german", "de"),
    ("greek", "el"),
    ("gujarati", "gu"),
    ("haitian creole", "ht"),
    ("hausa", "ha"),
    ("hebrew", "he"),
    ("hindi", "hi"),
    ("hmong", "hmn"),
    ("hungarian", "hu"),
    ("icelandic", "is"),
    ("igbo", "ig"),
    ("indonesian", "id"),
    ("irish", "ga"),
    ("italian", "it"),
    ("japanese", "ja"),
    ("javanese", "jw"),
    ("kannada", "kn"),
    ("korean", "ko"),
    ("latin", "la"),
    ("latvian", "lv"),
    ("lithuanian", "lt"),
    ("malay", "ms"),
    ("malayalam", "ml"),
    ("marathi", "mr"),
    ("nepali", "ne"),
    ("norwegian", "no"),
    ("persian", "fa"),
    ("polish", "pl"),
    ("portuguese", "pt"),
    ("punjabi", "pa"),
    ("romanian", "ro"),
    ("russian", "ru"),
    ("spanish", "es"),
    ("swahili", "sw"),
    ("swedish", "sv"),
    ("tamil", "ta"),
    ("telugu", "te"),
    ("thai", "th"),
    ("turkish", "tr"),
    ("ukrainian", "uk"),
    ("urdu", "ur"),
    ("vietnamese", "vi"),
    ("zulu", "zu"),
];

/// Look up the service code for a language name (case-insensitive).
#[must_use]
pub fn code_for(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(n, _)| *n == needle)
        .map(|(_, code)| *code)
}

/// Reverse lookup: the human-readable name for a service code.
#[must_use]
pub fn name_for(code: &str) -> Option<&'static str> {
    let needle = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(_, c)| *c == needle)
        .map(|(name, _)| *name)
}

/// True if `code` is a known service code.
#[must_use]
pub fn is_known_code(code: &str) -> bool {
    name_for(code).is_some()
}

/// All supported languages as (name, code) pairs, sorted by name.
#[must_use]
pub const fn supported() -> &'static [(&'static str, &'static str)] {
    LANGUAGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(code_for("french"), Some("fr"));
        assert_eq!(code_for("chinese (simplified)"), Some("zh-cn"));
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        assert_eq!(code_for("  French "), Some("fr"));
        assert_eq!(code_for("GERMAN"), Some("de"));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(code_for("klingon"), None);
        assert_eq!(code_for(""), None);
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(name_for("zh-tw"), Some("chinese (traditional)"));
        assert_eq!(name_for("ZU"), Some("zulu"));
        assert_eq!(name_for("xx"), None);
    }

    #[test]
    fn table_is_sorted_by_name() {
        let names: Vec<_> = supported().iter().map(|(n, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = supported().iter().map(|(_, c)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), supported().len());
    }
}
