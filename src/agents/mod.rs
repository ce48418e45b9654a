//! Prompt agents
//!
//! A section agent pairs a fixed system instruction with a named-placeholder
//! template and submits one single-turn chat exchange per invocation.
//! Agents are stateless and reusable across calls; they never self-retry.

use crate::error::ReportError;
use crate::models::SectionKey;
use crate::openai::{ChatMessage, TextGenerator};
use crate::sanitize::cleanse_json;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub mod prompts;

/// Substitute a `{name}`-placeholder template from a context map.
///
/// `{{` and `}}` escape to literal braces (templates carry literal heading
/// anchor tags). A placeholder with no matching key is a contract error.
pub fn render_template(
    template: &str,
    context: &BTreeMap<String, String>,
) -> crate::Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(ReportError::MissingPlaceholder(format!(
                                "unterminated placeholder '{{{}'",
                                name
                            )))
                        }
                    }
                }
                match context.get(&name) {
                    Some(value) => out.push_str(value),
                    None => return Err(ReportError::MissingPlaceholder(name)),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// A prompt agent for one report section (or the research pass).
pub struct SectionAgent {
    name: &'static str,
    system_instruction: &'static str,
    template: &'static str,
}

impl SectionAgent {
    pub fn for_section(key: SectionKey) -> Self {
        Self {
            name: key.display_name(),
            system_instruction: prompts::SECTION_WRITER_SYSTEM,
            template: prompts::template_for(key),
        }
    }

    pub fn researcher() -> Self {
        Self {
            name: "Research",
            system_instruction: prompts::RESEARCHER_SYSTEM,
            template: prompts::RESEARCHER_TEMPLATE,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fill the template from `context` and submit it as a single-turn chat
    /// exchange. Any API failure or missing placeholder propagates to the
    /// caller unmodified.
    pub async fn generate(
        &self,
        generator: &dyn TextGenerator,
        context: &BTreeMap<String, String>,
    ) -> crate::Result<String> {
        let prompt = render_template(self.template, context)?;
        debug!(agent = self.name, prompt_len = prompt.len(), "Submitting prompt");

        let messages = [
            ChatMessage::system(self.system_instruction),
            ChatMessage::user(prompt),
        ];

        let text = generator.complete(&messages).await?;
        Ok(text.trim().to_string())
    }
}

/// Variant agent for machine-readable sub-outputs.
///
/// Parses the model output as a JSON object, checks the declared field list,
/// and sanitizes every string leaf. Output that fails to parse or validate
/// resolves to `Ok(None)` instead of propagating; transport errors still
/// propagate.
pub struct StructuredAgent {
    name: &'static str,
    system_instruction: &'static str,
    template: &'static str,
    required_fields: &'static [&'static str],
}

impl StructuredAgent {
    pub fn new(
        name: &'static str,
        system_instruction: &'static str,
        template: &'static str,
        required_fields: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            system_instruction,
            template,
            required_fields,
        }
    }

    pub async fn generate(
        &self,
        generator: &dyn TextGenerator,
        context: &BTreeMap<String, String>,
    ) -> crate::Result<Option<serde_json::Value>> {
        let prompt = render_template(self.template, context)?;

        let messages = [
            ChatMessage::system(self.system_instruction),
            ChatMessage::user(prompt),
        ];

        let raw = generator.complete(&messages).await?;
        Ok(self.parse_response(&raw))
    }

    fn parse_response(&self, raw: &str) -> Option<serde_json::Value> {
        let cleaned = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let value: serde_json::Value = match serde_json::from_str(cleaned) {
            Ok(value) => value,
            Err(e) => {
                warn!(agent = self.name, "Structured output did not parse: {}", e);
                return None;
            }
        };

        let object = match value.as_object() {
            Some(object) => object,
            None => {
                warn!(agent = self.name, "Structured output is not an object");
                return None;
            }
        };

        for field in self.required_fields {
            if !object.contains_key(*field) {
                warn!(
                    agent = self.name,
                    field, "Structured output missing declared field"
                );
                return None;
            }
        }

        Some(cleanse_json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::MockTextGenerator;

    fn ctx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_template_substitutes_and_escapes() {
        let rendered = render_template(
            "Company: {company} {{#anchor}}",
            &ctx(&[("company", "Acme")]),
        )
        .unwrap();
        assert_eq!(rendered, "Company: Acme {#anchor}");
    }

    #[test]
    fn test_render_template_missing_key_names_placeholder() {
        let err = render_template("Hello {who}", &ctx(&[])).unwrap_err();
        assert!(err.is_contract_error());
        match err {
            ReportError::MissingPlaceholder(name) => assert_eq!(name, "who"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_section_agent_trims_response() {
        let generator = MockTextGenerator::new("  ### Section text  \n");
        let agent = SectionAgent::for_section(SectionKey::MarketOpportunity);

        let mut context = ctx(&[("company", "Acme")]);
        context.insert("retrieved_context".into(), "no context".into());

        let text = agent.generate(&generator, &context).await.unwrap();
        assert_eq!(text, "### Section text");
    }

    #[tokio::test]
    async fn test_section_agent_propagates_missing_placeholder() {
        let generator = MockTextGenerator::new("unused");
        let agent = SectionAgent::for_section(SectionKey::MarketOpportunity);

        // No retrieved_context key supplied.
        let result = agent.generate(&generator, &ctx(&[("company", "Acme")])).await;
        assert!(matches!(result, Err(ReportError::MissingPlaceholder(_))));
    }

    #[tokio::test]
    async fn test_structured_agent_invalid_json_yields_none() {
        let generator = MockTextGenerator::new("this is not json");
        let agent = StructuredAgent::new("probe", "system", "analyze {topic}", &["score"]);

        let result = agent
            .generate(&generator, &ctx(&[("topic", "traction")]))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_structured_agent_missing_field_yields_none() {
        let generator = MockTextGenerator::new(r#"{"other": 1}"#);
        let agent = StructuredAgent::new("probe", "system", "analyze {topic}", &["score"]);

        let result = agent
            .generate(&generator, &ctx(&[("topic", "traction")]))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_structured_agent_sanitizes_string_leaves() {
        let generator = MockTextGenerator::new(
            "```json\n{\"score\": 4, \"note\": \"<script>x</script>solid\"}\n```",
        );
        let agent = StructuredAgent::new("probe", "system", "analyze {topic}", &["score"]);

        let value = agent
            .generate(&generator, &ctx(&[("topic", "traction")]))
            .await
            .unwrap()
            .expect("valid structured output");
        assert_eq!(value["score"], 4);
        assert_eq!(value["note"], "solid");
    }
}
