//! Interpretation of raw LLM output.
//!
//! Models are asked for bare JSON but often wrap it in prose or markdown
//! fences. The first `{` to the last `}` is tried as JSON; anything else
//! falls back to a usable result built from the raw text.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const SEO_DESCRIPTION_CHARS: usize = 160;
const FALLBACK_TAG_COUNT: usize = 5;

/// Slice from the first `{` to the last `}`, inclusive.
fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Drop markdown fence lines and unwrap inline code.
fn strip_code_fences(raw: &str) -> String {
    let without_fences: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    without_fences.join("\n").replace('`', "").trim().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Tags as models actually send them: an array, a comma-separated string,
/// or null. Non-string array items are skipped.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
        Value::String(joined) => joined.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDraft {
    title: Option<String>,
    content: Option<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    #[serde(deserialize_with = "lenient_tags")]
    seo_tags: Vec<String>,
    thumbnail_prompt: Option<String>,
}

/// A generated script as returned by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptDraft {
    pub title: String,
    pub content: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_tags: Vec<String>,
    pub thumbnail_prompt: String,
    /// False when the fallback was used.
    pub parsed: bool,
}

impl ScriptDraft {
    pub fn parse_or_fallback(raw: &str, theme: &str) -> Self {
        let parsed = json_object_span(raw)
            .and_then(|span| serde_json::from_str::<RawDraft>(span).ok())
            .and_then(|draft| {
                let content = non_blank(draft.content)?;
                let title = non_blank(draft.title).unwrap_or_else(|| theme.to_string());
                Some(Self {
                    seo_title: non_blank(draft.seo_title).unwrap_or_else(|| title.clone()),
                    seo_description: non_blank(draft.seo_description)
                        .unwrap_or_else(|| truncate_chars(&content, SEO_DESCRIPTION_CHARS)),
                    seo_tags: draft.seo_tags,
                    thumbnail_prompt: non_blank(draft.thumbnail_prompt)
                        .unwrap_or_else(|| fallback_thumbnail(theme)),
                    title,
                    content,
                    parsed: true,
                })
            });

        parsed.unwrap_or_else(|| Self::fallback(raw, theme))
    }

    fn fallback(raw: &str, theme: &str) -> Self {
        let content = raw.trim().to_string();
        Self {
            title: theme.to_string(),
            seo_title: theme.to_string(),
            seo_description: truncate_chars(&content, SEO_DESCRIPTION_CHARS),
            seo_tags: theme
                .split_whitespace()
                .take(FALLBACK_TAG_COUNT)
                .map(str::to_string)
                .collect(),
            thumbnail_prompt: fallback_thumbnail(theme),
            content,
            parsed: false,
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn fallback_thumbnail(theme: &str) -> String {
    format!("Thumbnail chamativa para um vídeo do YouTube sobre {}", theme)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTranslation {
    content: Option<String>,
    translated_content: Option<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    #[serde(deserialize_with = "lenient_tags")]
    seo_tags: Vec<String>,
    thumbnail_prompt: Option<String>,
}

/// Translated script body and metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedScript {
    pub content: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_tags: Vec<String>,
    pub thumbnail_prompt: String,
    /// False when the fallback was used.
    pub parsed: bool,
}

/// Metadata kept when the translation does not provide its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginalMetadata {
    pub seo_title: String,
    pub seo_description: String,
    pub seo_tags: Vec<String>,
    pub thumbnail_prompt: String,
}

impl TranslatedScript {
    pub fn parse_or_fallback(raw: &str, original: &OriginalMetadata) -> Self {
        let parsed = json_object_span(raw)
            .and_then(|span| serde_json::from_str::<RawTranslation>(span).ok())
            .and_then(|t| {
                let content = non_blank(t.content).or_else(|| non_blank(t.translated_content))?;
                Some(Self {
                    content,
                    seo_title: non_blank(t.seo_title)
                        .unwrap_or_else(|| original.seo_title.clone()),
                    seo_description: non_blank(t.seo_description)
                        .unwrap_or_else(|| original.seo_description.clone()),
                    seo_tags: Some(t.seo_tags)
                        .filter(|tags| !tags.is_empty())
                        .unwrap_or_else(|| original.seo_tags.clone()),
                    thumbnail_prompt: non_blank(t.thumbnail_prompt)
                        .unwrap_or_else(|| original.thumbnail_prompt.clone()),
                    parsed: true,
                })
            });

        parsed.unwrap_or_else(|| Self {
            content: strip_code_fences(raw),
            seo_title: original.seo_title.clone(),
            seo_description: original.seo_description.clone(),
            seo_tags: original.seo_tags.clone(),
            thumbnail_prompt: original.thumbnail_prompt.clone(),
            parsed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_json() {
        let raw = "Aqui está:\n```json\n{\"title\": \"Juros\", \"content\": \"Olá {pessoal}\", \
                   \"seo_title\": \"Juros SEO\", \"seo_description\": \"desc\", \
                   \"seo_tags\": [\"a\", \"b\"], \"thumbnail_prompt\": \"moedas\"}\n```";

        let draft = ScriptDraft::parse_or_fallback(raw, "juros compostos");

        assert!(draft.parsed);
        assert_eq!(draft.title, "Juros");
        assert_eq!(draft.content, "Olá {pessoal}");
        assert_eq!(draft.seo_tags, vec!["a", "b"]);
    }

    #[test]
    fn test_tags_as_string_or_null_still_parse() {
        let joined = r#"{"content": "texto", "seo_tags": "finanças, juros , ,investimento"}"#;
        let draft = ScriptDraft::parse_or_fallback(joined, "juros");
        assert!(draft.parsed);
        assert_eq!(draft.seo_tags, vec!["finanças", "juros", "investimento"]);

        let null = r#"{"title": "Juros", "content": "texto", "seo_tags": null}"#;
        let draft = ScriptDraft::parse_or_fallback(null, "juros");
        assert!(draft.parsed);
        assert_eq!(draft.title, "Juros");
        assert!(draft.seo_tags.is_empty());

        let mixed = r#"{"content": "texto", "seo_tags": ["dinheiro", 42, null, " renda "]}"#;
        let draft = ScriptDraft::parse_or_fallback(mixed, "juros");
        assert!(draft.parsed);
        assert_eq!(draft.seo_tags, vec!["dinheiro", "renda"]);
    }

    #[test]
    fn test_fallback_shape() {
        let raw = "x".repeat(300);
        let theme = "como investir seu dinheiro com juros compostos hoje";

        let draft = ScriptDraft::parse_or_fallback(&raw, theme);

        assert!(!draft.parsed);
        assert_eq!(draft.title, theme);
        assert_eq!(draft.seo_title, theme);
        assert_eq!(draft.content, raw);
        assert_eq!(draft.seo_description.chars().count(), 160);
        assert_eq!(draft.seo_tags, vec!["como", "investir", "seu", "dinheiro", "com"]);
        assert!(draft.thumbnail_prompt.contains(theme));
    }

    #[test]
    fn test_json_without_content_falls_back() {
        let draft = ScriptDraft::parse_or_fallback("{\"title\": \"Só título\"}", "tema");
        assert!(!draft.parsed);
        assert_eq!(draft.title, "tema");
    }

    #[test]
    fn test_translation_parse_and_fallback() {
        let original = OriginalMetadata {
            seo_title: "Juros".to_string(),
            seo_description: "Descrição".to_string(),
            seo_tags: vec!["juros".to_string()],
            thumbnail_prompt: "moedas".to_string(),
        };

        let parsed = TranslatedScript::parse_or_fallback(
            "{\"content\": \"Hello\", \"seo_title\": \"Interest\"}",
            &original,
        );
        assert!(parsed.parsed);
        assert_eq!(parsed.content, "Hello");
        assert_eq!(parsed.seo_title, "Interest");
        assert_eq!(parsed.seo_description, "Descrição");
        assert_eq!(parsed.seo_tags, original.seo_tags);

        let joined = TranslatedScript::parse_or_fallback(
            "{\"content\": \"Hello\", \"seo_tags\": \"interest, money\"}",
            &original,
        );
        assert!(joined.parsed);
        assert_eq!(joined.seo_tags, vec!["interest", "money"]);

        let null = TranslatedScript::parse_or_fallback(
            "{\"content\": \"Hello\", \"seo_tags\": null}",
            &original,
        );
        assert!(null.parsed);
        assert_eq!(null.seo_tags, original.seo_tags);

        let fallback = TranslatedScript::parse_or_fallback("```\nHello, everyone!\n```", &original);
        assert!(!fallback.parsed);
        assert_eq!(fallback.content, "Hello, everyone!");
        assert_eq!(fallback.seo_tags, original.seo_tags);
    }
}
