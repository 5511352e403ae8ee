//! Prompt Construction and Section Generation
//!
//! Builds the language-specific prompts for context summarization and
//! per-section guide generation, delegating to the completion client. Pure
//! functions of their inputs aside from the network call.

use crate::completion::{Language, RetryingCompletionClient};
use crate::config::PromptConfig;
use tracing::{debug, warn};

/// Builds prompts and drives per-call generation for one guide run
pub struct SectionGuideGenerator {
    client: RetryingCompletionClient,
    resume_english: String,
    resume_spanish: String,
}

impl SectionGuideGenerator {
    pub fn new(client: RetryingCompletionClient, prompts: &PromptConfig) -> Self {
        Self {
            client,
            resume_english: prompts.resume_english.clone(),
            resume_spanish: prompts.resume_spanish.clone(),
        }
    }

    /// Summarize one project context block. Returns `None` on any completion
    /// failure; the caller treats a missing summary as fatal for the run.
    pub async fn summarize(
        &self,
        block: &str,
        content: &str,
        language: Language,
    ) -> Option<String> {
        let template = match language {
            Language::English => &self.resume_english,
            Language::Spanish => &self.resume_spanish,
        };
        let prompt = format!("{} \n {}", template, content);

        debug!(block, "summarizing context block");
        match self.client.complete(&prompt, language).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(block, error = %err, "context summarization failed");
                None
            }
        }
    }

    /// Generate long-form content for one section titled `section_title`,
    /// grounded in the shared general prompt. Returns `None` on failure.
    pub async fn generate(
        &self,
        general_prompt: &str,
        section_title: &str,
        language: Language,
    ) -> Option<String> {
        let prompt = section_prompt(language, section_title, general_prompt);

        match self.client.complete(&prompt, language).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(section = section_title, error = %err, "section generation failed");
                None
            }
        }
    }
}

/// Language-specific instruction embedding the section title and the full
/// general context.
fn section_prompt(language: Language, title: &str, context: &str) -> String {
    match language {
        Language::Spanish => format!(
            "\nGenera directamente en español el contenido util, detallado, claro y extendida para una sección titulada '{}'. Incluir código python necesario si lo ves conveniente. Toda la respuesta debe ser basado en la siguiente información del proyecto:\n\n{}\n",
            title, context
        ),
        Language::English => format!(
            "\nDirectly generate useful in english, detailed, clear and extended content for a section titled '{}'. Include necessary python code if you see fit. All response should be based on the following project information:\n\n{}\n",
            title, context
        ),
    }
}
