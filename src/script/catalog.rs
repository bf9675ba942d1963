//! Fixed vocabularies: language styles, environments, and target languages.

use serde::Serialize;

/// Language styles offered for generation, with their descriptions.
pub const LANGUAGE_STYLES: [(&str, &str); 4] = [
    (
        "formal",
        "linguagem formal e profissional, vocabulário cuidadoso e tom respeitoso",
    ),
    (
        "descontraida",
        "linguagem descontraída e próxima, como uma conversa entre amigos",
    ),
    (
        "narrativa",
        "linguagem narrativa, contando uma história com começo, meio e fim",
    ),
    (
        "inspiracional",
        "linguagem inspiradora, que motiva e emociona o espectador",
    ),
];

/// Video environments offered for generation, with their descriptions.
pub const ENVIRONMENTS: [(&str, &str); 4] = [
    (
        "calmo",
        "ambiente calmo e acolhedor, ritmo tranquilo e reflexivo",
    ),
    (
        "suspense",
        "ambiente de suspense, criando tensão e curiosidade até a revelação",
    ),
    (
        "motivacional",
        "ambiente motivacional e energético, com ritmo intenso",
    ),
    (
        "educativo",
        "ambiente educativo, explicando conceitos de forma clara e didática",
    ),
];

const NEUTRAL_STYLE: &str = "linguagem clara e acessível";
const NEUTRAL_ENVIRONMENT: &str = "ambiente neutro e informativo";

pub fn style_description(style: &str) -> &'static str {
    lookup(&LANGUAGE_STYLES, style).unwrap_or(NEUTRAL_STYLE)
}

pub fn environment_description(environment: &str) -> &'static str {
    lookup(&ENVIRONMENTS, environment).unwrap_or(NEUTRAL_ENVIRONMENT)
}

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    let key = key.trim().to_lowercase();
    table.iter().find(|(k, _)| *k == key).map(|(_, d)| *d)
}

/// A language scripts can be translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

/// Generated scripts are always written in this language.
pub const SOURCE_LANGUAGE: &str = "pt-BR";

pub const SUPPORTED_LANGUAGES: [Language; 12] = [
    Language { code: "pt-BR", name: "Portuguese (Brazil)", native_name: "Português (Brasil)" },
    Language { code: "en", name: "English", native_name: "English" },
    Language { code: "es", name: "Spanish", native_name: "Español" },
    Language { code: "fr", name: "French", native_name: "Français" },
    Language { code: "de", name: "German", native_name: "Deutsch" },
    Language { code: "it", name: "Italian", native_name: "Italiano" },
    Language { code: "ja", name: "Japanese", native_name: "日本語" },
    Language { code: "ko", name: "Korean", native_name: "한국어" },
    Language { code: "zh", name: "Chinese (Simplified)", native_name: "中文 (简体)" },
    Language { code: "ru", name: "Russian", native_name: "Русский" },
    Language { code: "ar", name: "Arabic", native_name: "العربية" },
    Language { code: "hi", name: "Hindi", native_name: "हिन्दी" },
];

pub fn language_by_code(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code.trim()))
}

/// Native name for `code`, or the code itself when unknown.
pub fn language_name(code: &str) -> String {
    language_by_code(code)
        .map(|lang| lang.native_name.to_string())
        .unwrap_or_else(|| code.to_string())
}
