//! A [`GenerationPort`] backed by OpenAI chat completions, grounded on
//! `dashflow-openai`'s `structured.rs` (`StructuredOutputMethod::JsonSchema`:
//! pass the schema as the response format and let the API enforce it) and
//! on `ChatAnthropic`'s retry-policy field from `dashflow-anthropic`.
//!
//! Schema validation happens twice: the API is asked to conform via
//! `response_format`, and the response is re-validated locally with
//! `jsonschema` before being handed back, since providers occasionally
//! return well-formed-but-non-conforming JSON under load.

use crate::retry::RetryPolicy;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::ports::{GenerationMessage, GenerationPort, TokenUsage};
use serde_json::Value;

/// Number of internal attempts before [`Error::SchemaValidation`] is
/// returned (spec §4.2: "retries internally up to N times, then fails").
const MAX_SCHEMA_ATTEMPTS: u32 = 3;

/// Generates schema-conforming JSON through OpenAI's chat completions API.
pub struct OpenAIGenerationPort {
    client: Client<OpenAIConfig>,
    model: String,
    retry_policy: RetryPolicy,
}

impl OpenAIGenerationPort {
    /// Construct from the `OPENAI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the environment variable is unset.
    pub fn try_new(model: impl Into<String>) -> Result<Self> {
        let key = std::env::var(crate::openai_embeddings::OPENAI_API_KEY)
            .map_err(|_| Error::config("OPENAI_API_KEY is not set"))?;
        let config = OpenAIConfig::new().with_api_key(key);
        Ok(Self {
            client: Client::with_config(config),
            model: model.into(),
            retry_policy: RetryPolicy::exponential(3),
        })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn to_api_messages(messages: &[GenerationMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|m| match m.role {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(Into::into)
                    .map_err(|e| Error::provider("generation", e.to_string())),
                _ => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(Into::into)
                    .map_err(|e| Error::provider("generation", e.to_string())),
            })
            .collect()
    }

    async fn generate_once(
        &self,
        messages: &[GenerationMessage],
        schema: &Value,
        temperature: f32,
    ) -> Result<(Value, TokenUsage)> {
        let api_messages = Self::to_api_messages(messages)?;
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: "structured_output".to_string(),
                schema: Some(schema.clone()),
                strict: Some(true),
            },
        };
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(temperature)
            .messages(api_messages)
            .response_format(response_format)
            .build()
            .map_err(|e| Error::provider("generation", e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::provider("generation", e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider("generation", "no choices returned"))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| Error::provider("generation", "empty message content"))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| Error::provider("generation", format!("response was not valid JSON: {e}")))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                tokens_in: u64::from(u.prompt_tokens),
                tokens_out: u64::from(u.completion_tokens),
            })
            .unwrap_or_default();

        Ok((value, usage))
    }
}

#[async_trait]
impl GenerationPort for OpenAIGenerationPort {
    async fn generate_structured(
        &self,
        messages: &[GenerationMessage],
        schema: &Value,
        temperature: f32,
    ) -> Result<(Value, TokenUsage)> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| Error::provider("generation", format!("invalid schema: {e}")))?;

        let mut last_error = String::new();
        for attempt in 1..=MAX_SCHEMA_ATTEMPTS {
            let (value, usage) = self
                .retry_policy
                .run(|| self.generate_once(messages, schema, temperature))
                .await?;
            if validator.is_valid(&value) {
                return Ok((value, usage));
            }
            last_error = format!("attempt {attempt} did not conform to schema");
            tracing::warn!(attempt, "structured generation failed schema validation");
        }
        Err(Error::SchemaValidation {
            attempts: MAX_SCHEMA_ATTEMPTS,
            message: last_error,
        })
    }
}
