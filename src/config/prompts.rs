//! Prompt templates for Roteiro.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub generation: GenerationPrompts,
    pub translation: TranslationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for script generation.
///
/// The generated script is always written in Brazilian Portuguese, so the
/// default template is in Portuguese as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPrompts {
    pub template: String,
}

impl Default for GenerationPrompts {
    fn default() -> Self {
        Self {
            template: r#"Você é um especialista em criação de roteiros para YouTube. Crie um roteiro envolvente e bem estruturado baseado nas informações fornecidas.

TEMA: {{theme}}
DURAÇÃO: {{duration}} minutos
ESTILO DE LINGUAGEM: {{style}} ({{style_description}})
AMBIENTE: {{environment}} ({{environment_description}}){{environment_details}}

TAMANHO OBRIGATÓRIO:
- O campo "content" DEVE ter aproximadamente {{words}} palavras (cerca de {{characters}} caracteres).
- Não entregue um roteiro mais curto: ele precisa preencher {{duration}} minutos de narração.{{context_section}}

INSTRUÇÕES:
1. Crie um roteiro estruturado com introdução, desenvolvimento e conclusão
2. Use o estilo de linguagem {{style}} ao longo de todo o texto
3. Mantenha o ambiente {{environment}} ao longo do vídeo
4. Inclua elementos de engajamento (perguntas, call-to-actions)
5. Estruture o conteúdo para {{duration}} minutos de duração
6. Use as informações dos livros quando relevante para enriquecer o conteúdo

FORMATO DE RESPOSTA (JSON):
{
  "title": "Título atrativo do vídeo",
  "content": "Roteiro completo em português brasileiro",
  "seo_title": "Título otimizado para SEO",
  "seo_description": "Descrição otimizada para SEO (máx 160 caracteres)",
  "seo_tags": ["tag1", "tag2", "tag3", "tag4", "tag5"],
  "thumbnail_prompt": "Prompt detalhado para gerar thumbnail"
}

Responda APENAS com o JSON válido, sem texto adicional."#
                .to_string(),
        }
    }
}

/// Prompt for script translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub template: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are a professional translator specializing in YouTube script translation. Translate the following YouTube script from {{source_language}} to {{target_language}}.

ORIGINAL SCRIPT:
{{content}}{{metadata_section}}

TRANSLATION REQUIREMENTS:
1. Preserve Structure: {{formatting_instruction}}
2. Adapt Idioms: {{idioms_instruction}}
3. Maintain Tone: {{tone_instruction}}
4. Target Audience: Translate for a {{target_audience}} audience
5. Engagement Elements: keep all engagement elements (questions, call-to-actions, hooks)
6. Natural Flow: ensure the translation sounds natural and engaging in {{target_language}}

SPECIFIC INSTRUCTIONS:
- Maintain video timing and pacing cues
- Preserve any timestamps or time markers
- Keep brand names and proper nouns as appropriate
- Ensure cultural sensitivity for the target audience
- Translate the SEO fields and thumbnail prompt as well, if provided

RESPONSE FORMAT (JSON):
{
  "content": "Full translated script",
  "seo_title": "Translated SEO title",
  "seo_description": "Translated SEO description (max 160 characters)",
  "seo_tags": ["tag1", "tag2", "tag3", "tag4", "tag5"],
  "thumbnail_prompt": "Translated thumbnail prompt"
}

Respond ONLY with valid JSON, without any additional text."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let generation_path = custom_path.join("generation.toml");
            if generation_path.exists() {
                let content = std::fs::read_to_string(&generation_path)?;
                prompts.generation = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single left-to-right pass, so values
    /// containing `{{...}}` are inserted literally. Unknown placeholders are
    /// left untouched.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            match after_open.find("}}") {
                Some(close) => {
                    let key = &after_open[..close];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after_open[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.generation.template.contains("{{words}}"));
        assert!(prompts.translation.template.contains("{{target_language}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let mut vars = HashMap::new();
        vars.insert("theme".to_string(), "{{secret}}".to_string());
        vars.insert("secret".to_string(), "leaked".to_string());

        let result = Prompts::render("Theme: {{theme}}", &vars);
        assert_eq!(result, "Theme: {{secret}}");
    }

    #[test]
    fn test_render_keeps_unknown_and_unterminated_placeholders() {
        let vars = HashMap::new();
        assert_eq!(Prompts::render("a {{missing}} b", &vars), "a {{missing}} b");
        assert_eq!(Prompts::render("a {{open", &vars), "a {{open");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("channel".to_string(), "Finanças".to_string());
        prompts.variables.insert("theme".to_string(), "default".to_string());

        let mut vars = HashMap::new();
        vars.insert("theme".to_string(), "Investimentos".to_string());

        let result = prompts.render_with_custom("{{channel}}: {{theme}}", &vars);
        assert_eq!(result, "Finanças: Investimentos");
    }

    #[test]
    fn test_load_custom_generation_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("generation.toml"),
            "template = \"Custom {{theme}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.generation.template, "Custom {{theme}}");
        assert!(prompts.translation.template.contains("ORIGINAL SCRIPT"));
    }
}
