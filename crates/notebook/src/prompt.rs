//! Prompt rendering for grounded answers.
//!
//! The user prompt is a Handlebars template rendered with the question and
//! the active sources. Hosts can replace the template through configuration.

use crate::types::Source;
use handlebars::Handlebars;
use notebook_core::{AppError, AppResult};
use serde::Serialize;

const TEMPLATE_NAME: &str = "answer";

/// Template used when the configuration does not provide one.
pub const DEFAULT_TEMPLATE: &str = "\
User question:
{{question}}

{{#if sources}}
Reference sources maintained by the organization:
{{#each sources}}
- {{this.name}} ({{this.type}}): {{this.path}}
{{#if this.content}}
  Notes: {{this.content}}
{{/if}}
{{/each}}
{{else}}
No internal sources are active. Answer from general knowledge.
{{/if}}
";

#[derive(Serialize)]
struct PromptSource<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    source_type: &'static str,
    path: &'a str,
    content: Option<&'a str>,
}

#[derive(Serialize)]
struct PromptContext<'a> {
    question: &'a str,
    sources: Vec<PromptSource<'a>>,
}

/// Renders the answer prompt.
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
}

impl PromptBuilder {
    /// Compile `template`, or the default template when `None`.
    pub fn new(template: Option<&str>) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(TEMPLATE_NAME, template.unwrap_or(DEFAULT_TEMPLATE))
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self { handlebars })
    }

    /// Render the user prompt for `question` over `sources`.
    pub fn render(&self, question: &str, sources: &[Source]) -> AppResult<String> {
        let context = PromptContext {
            question,
            sources: sources
                .iter()
                .map(|s| PromptSource {
                    name: &s.name,
                    source_type: s.source_type.as_str(),
                    path: &s.path,
                    content: s.content.as_deref(),
                })
                .collect(),
        };

        self.handlebars
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }
}

/// System instructions for the answering model.
pub fn system_prompt(has_sources: bool) -> String {
    let mut prompt = String::from(
        "You are the organization's internal knowledge assistant. \
         Answer workplace questions clearly and practically.\n\n",
    );

    if has_sources {
        prompt.push_str(
            "Ground your answer in the reference sources listed with the question. \
             Prefer them over anything else and say so when they do not cover the question.\n\n",
        );
    } else {
        prompt.push_str(
            "No internal sources are available. Answer from general knowledge and \
             cite public references where possible.\n\n",
        );
    }

    prompt.push_str(
        "Instructions:\n\
         - Give a direct answer first, then any necessary detail\n\
         - Do not invent regulations, document titles or figures\n\
         - Keep the response concise and factual\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;

    fn source(name: &str, path: &str, content: Option<&str>) -> Source {
        Source {
            id: name.to_string(),
            name: name.to_string(),
            source_type: SourceType::Url,
            path: path.to_string(),
            content: content.map(str::to_string),
            is_active: true,
        }
    }

    #[test]
    fn test_render_with_sources() {
        let builder = PromptBuilder::new(None).unwrap();
        let prompt = builder
            .render(
                "What PPE is required?",
                &[
                    source("Policy A", "http://x", Some("Gloves & goggles")),
                    source("Policy B", "http://y", None),
                ],
            )
            .unwrap();

        assert!(prompt.contains("What PPE is required?"));
        assert!(prompt.contains("- Policy A (url): http://x"));
        // No HTML escaping
        assert!(prompt.contains("Notes: Gloves & goggles"));
        assert!(prompt.contains("- Policy B (url): http://y"));
        assert!(!prompt.contains("general knowledge"));
    }

    #[test]
    fn test_render_without_sources() {
        let builder = PromptBuilder::new(None).unwrap();
        let prompt = builder.render("Fire exits?", &[]).unwrap();
        assert!(prompt.contains("Fire exits?"));
        assert!(prompt.contains("Answer from general knowledge."));
    }

    #[test]
    fn test_custom_template() {
        let builder =
            PromptBuilder::new(Some("Q={{question}};{{#each sources}}[{{this.name}}]{{/each}}"))
                .unwrap();
        let prompt = builder
            .render("q1", &[source("A", "a", None), source("B", "b", None)])
            .unwrap();
        assert_eq!(prompt, "Q=q1;[A][B]");
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let result = PromptBuilder::new(Some("{{#if question}}unclosed"));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_system_prompt_variants() {
        assert!(system_prompt(true).contains("Ground your answer"));
        assert!(system_prompt(false).contains("No internal sources"));
    }
}
