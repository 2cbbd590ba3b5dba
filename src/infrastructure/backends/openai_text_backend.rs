use super::generation_backend::{with_timeout, BackendError, GenerationBackend, Invocation, RawOutput};
use crate::domain::generation::Prompt;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Chat-completion engine serving every text capability.
pub struct OpenAiTextBackend {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTextBackend {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError> {
        let build_error = |e: async_openai::error::OpenAIError| BackendError::Request(e.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(prompt.temperature)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system.as_str())
                    .build()
                    .map_err(build_error)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user.as_str())
                    .build()
                    .map_err(build_error)?
                    .into(),
            ])
            .build()
            .map_err(build_error)?;

        tracing::info!(
            model = %self.model,
            temperature = prompt.temperature,
            prompt_length = prompt.user.len(),
            "Calling OpenAI chat completion"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(error = %e, model = %self.model, "OpenAI chat completion failed");
            BackendError::Request(format!("OpenAI chat error: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(BackendError::EmptyOutput)
    }
}

#[async_trait]
impl GenerationBackend for OpenAiTextBackend {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<RawOutput, BackendError> {
        let Invocation::Completion(prompt) = invocation else {
            return Err(BackendError::Unsupported(format!(
                "{} cannot serve {} invocations",
                self.name(),
                invocation.kind()
            )));
        };

        let start_time = std::time::Instant::now();
        let text = with_timeout(timeout, self.complete(prompt)).await?;

        tracing::info!(
            provider = "openai-chat",
            latency_ms = start_time.elapsed().as_millis(),
            output_length = text.len(),
            "Text generation completed"
        );

        Ok(RawOutput::Text(text))
    }
}
