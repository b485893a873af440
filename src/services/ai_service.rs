use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: Option<String>,
}

impl AIService {
    pub fn new(api_key: Option<String>, client: Client) -> Self {
        Self { client, api_key }
    }

    /// Build a personality profile from the user's writing samples. The
    /// profile is stored as opaque JSON on the user row; message delivery
    /// never reads it.
    pub async fn generate_personality_profile(
        &self,
        writing_samples: &[String],
    ) -> Result<JsonValue> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::BadRequest(
                "Personality profiling is not configured on this server".to_string(),
            ));
        };

        let system_prompt = r#"You analyze writing samples and describe their author.
The output must be a valid JSON object with exactly these keys:
- "writing_style": a short paragraph describing tone, sentence rhythm and vocabulary.
- "speech_patterns": an array of recurring phrases or habits found in the samples.
- "personality_traits": an array of 3 to 7 single-word traits.
Base every observation only on the provided samples."#;

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::json!({ "writing_samples": writing_samples }).to_string()}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.4
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "Profile generation failed with status {}",
                response.status()
            )));
        }

        let body: JsonValue = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::Internal("Malformed completion response".to_string()))?;

        let profile: JsonValue = serde_json::from_str(content)?;
        Ok(profile)
    }
}
