//! Page content generation via the OpenAI API

use crate::error::{EbookError, Result};
use crate::store::models::ContentMode;
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Default generation model
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o";

/// Default per-call wall-clock timeout
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Length preset for one content mode.
#[derive(Debug, Clone, Copy)]
pub struct ModePreset {
    pub max_tokens: u32,
    pub length_guidance: &'static str,
}

impl ContentMode {
    /// Token ceiling and prompt guidance for this mode.
    pub fn preset(self) -> ModePreset {
        match self {
            ContentMode::Full => ModePreset {
                max_tokens: 600,
                length_guidance: "Write detailed content of approximately 400-500 words.",
            },
            ContentMode::Medium => ModePreset {
                max_tokens: 450,
                length_guidance: "Write concise content of approximately 250-300 words.",
            },
            ContentMode::Minimal => ModePreset {
                max_tokens: 300,
                length_guidance: "Write brief content of approximately 150-200 words.",
            },
            ContentMode::UltraMinimal => ModePreset {
                max_tokens: 150,
                length_guidance: "Write a single short paragraph of approximately 50-100 words.",
            },
        }
    }
}

/// Everything the generator needs to write one page.
#[derive(Debug)]
pub struct PageContext<'a> {
    pub document_title: &'a str,
    pub document_description: &'a str,
    pub page_title: &'a str,
    pub page_index: u32,
    pub content_mode: ContentMode,
    /// All page titles of the document, in page order.
    pub page_titles: &'a [String],
}

/// A source of generated page text.
///
/// The worker pool depends on this trait; production uses
/// [`OpenAiGenerator`], tests substitute scripted implementations.
#[async_trait]
pub trait PageGenerator: Send + Sync {
    async fn generate(&self, context: &PageContext<'_>) -> Result<String>;
}

fn render_table_of_contents(page_titles: &[String], current_index: u32) -> String {
    page_titles
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let marker = if index as u32 == current_index {
                " <-- YOU ARE HERE"
            } else {
                ""
            };
            format!("{}. {}{}", index + 1, title, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn build_prompt(context: &PageContext<'_>) -> String {
    let preset = context.content_mode.preset();
    let table_of_contents = render_table_of_contents(context.page_titles, context.page_index);
    let page_number = context.page_index + 1;

    format!(
        r#"You are an expert writer creating the content for an ebook.
Ebook title: "{title}"
Description: "{description}"

Full table of contents:
{table_of_contents}

Your task is to write the content ONLY for page {page_number}, titled "{page_title}".

Important instructions:
1. Consider the overall context of the ebook given by the table of contents.
2. Focus strictly on the topic defined by this page's title ("{page_title}").
3. Avoid repeating information that was likely covered in earlier pages or will be covered in later pages; use the table of contents as your guide.
4. {length_guidance}
5. Write in clear and engaging language.
6. Do NOT include the page title or the page number in the content you write, only the page text itself.
7. Do NOT write generic introductions or conclusions for this page; go straight to the point of the title.

Content for page {page_number}:"#,
        title = context.document_title,
        description = context.document_description,
        table_of_contents = table_of_contents,
        page_number = page_number,
        page_title = context.page_title,
        length_guidance = preset.length_guidance,
    )
}

/// OpenAI chat-completion generator with a hard per-call timeout.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout,
        }
    }

    /// Create a generator from `OPENAI_API_KEY` (required) and
    /// `OPENAI_MODEL` (optional).
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EbookError::ConfigError("OPENAI_API_KEY not set".to_string()))?;
        let model = std::env::var("OPENAI_MODEL")
            .unwrap_or_else(|_| DEFAULT_GENERATION_MODEL.to_string());

        Ok(Self::new(&api_key, &model, timeout))
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(max_tokens)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| EbookError::GenerationError(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(EbookError::GenerationError(
                "empty completion response".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl PageGenerator for OpenAiGenerator {
    async fn generate(&self, context: &PageContext<'_>) -> Result<String> {
        let preset = context.content_mode.preset();
        let prompt = build_prompt(context);
        debug!("Generation prompt length: {} chars", prompt.len());
        info!(
            "Generating content for page {} of \"{}\"",
            context.page_index + 1,
            context.document_title
        );

        // The request ceiling is the preset plus a little headroom so the
        // model can finish its last sentence.
        let call = self.complete(prompt, preset.max_tokens + 50);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EbookError::GenerationTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_of_contents_marks_current_page() {
        let rendered =
            render_table_of_contents(&titles(&["Intro", "Body", "Conclusion"]), 1);

        assert_eq!(
            rendered,
            "1. Intro\n2. Body <-- YOU ARE HERE\n3. Conclusion"
        );
    }

    #[test]
    fn test_prompt_embeds_context_and_guidance() {
        let page_titles = titles(&["Getting started", "Going deeper"]);
        let context = PageContext {
            document_title: "Sourdough at Home",
            document_description: "A practical baking guide",
            page_title: "Going deeper",
            page_index: 1,
            content_mode: ContentMode::Minimal,
            page_titles: &page_titles,
        };

        let prompt = build_prompt(&context);

        assert!(prompt.contains("Ebook title: \"Sourdough at Home\""));
        assert!(prompt.contains("2. Going deeper <-- YOU ARE HERE"));
        assert!(prompt.contains("write the content ONLY for page 2"));
        assert!(prompt.contains("approximately 150-200 words"));
        assert!(prompt.contains("Do NOT include the page title"));
    }

    #[test]
    fn test_mode_presets() {
        assert_eq!(ContentMode::Full.preset().max_tokens, 600);
        assert_eq!(ContentMode::Medium.preset().max_tokens, 450);
        assert_eq!(ContentMode::Minimal.preset().max_tokens, 300);
        assert_eq!(ContentMode::UltraMinimal.preset().max_tokens, 150);
    }

    #[test]
    fn test_unknown_mode_uses_medium_preset() {
        let mode = ContentMode::from("SOMETHING_NEW".to_string());
        assert_eq!(mode.preset().max_tokens, 450);
    }
}
