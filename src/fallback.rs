//! AI-assisted free-form fallback boundary
//!
//! The fallback is a black box that receives the raw text once every
//! pattern rule has failed. Whatever it returns is validated into the
//! same closed [`Intent`] set immediately; a payload that does not fit
//! is discarded by the parser, never executed as-is.

use super::intent::Intent;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Intent names the fallback service is allowed to return.
const ALLOWED_INTENTS: &[&str] = &[
    "approve_payment",
    "reject_payment",
    "approve_exit",
    "reject_exit",
    "create_payment",
    "create_exit",
    "report",
    "help",
];

/// Untyped payload as returned by the fallback service. This is the one
/// place an open key/value shape is accepted, and it only lives until
/// [`FallbackIntent::into_intent`] runs.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackIntent {
    pub intent: String,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
}

impl FallbackIntent {
    /// Convert the untyped payload into a typed [`Intent`]. `None` means
    /// the payload named an unknown intent or was missing a required
    /// field; the caller downgrades that to `Unrecognized`.
    pub fn into_intent(self) -> Option<Intent> {
        if !ALLOWED_INTENTS.contains(&self.intent.as_str()) {
            return None;
        }
        match self.intent.as_str() {
            "approve_payment" => self.number.map(Intent::ApprovePayment),
            "reject_payment" => self.number.map(Intent::RejectPayment),
            "approve_exit" => self.number.map(Intent::ApproveExit),
            "reject_exit" => self.number.map(Intent::RejectExit),
            "create_payment" => Some(Intent::CreatePayment {
                amount: self.amount?,
                payee: self.payee?,
                description: self.description?,
                bank: self.bank,
            }),
            "create_exit" => Some(Intent::CreateExit {
                count: self.count?,
                item_name: self.item_name?,
                recipient: self.recipient?,
                driver: self.driver,
                plate: self.plate,
            }),
            "report" => Some(Intent::Report),
            "help" => Some(Intent::Help),
            _ => None,
        }
    }
}

/// Interprets free-form text the rule cascade could not place.
#[async_trait::async_trait]
pub trait IntentFallback: Send + Sync {
    async fn interpret(&self, text: &str) -> Result<FallbackIntent>;
}

/// Fallback backed by an OpenAI-compatible chat completion endpoint.
pub struct OpenAiFallback {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

const SYSTEM_PROMPT: &str = "You interpret short business chat commands about \
payment orders and cargo exit permits. Reply with a single JSON object and \
nothing else. The object has an \"intent\" field, one of: approve_payment, \
reject_payment, approve_exit, reject_exit, create_payment, create_exit, \
report, help. Include only the fields that intent needs: number for \
approve/reject; amount, payee, description, bank for create_payment; count, \
item_name, recipient, driver, plate for create_exit. If the message is not \
one of these commands, reply {\"intent\":\"help\"}.";

impl OpenAiFallback {
    pub fn new(api_base: &str, api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IntentFallback for OpenAiFallback {
    async fn interpret(&self, text: &str) -> Result<FallbackIntent> {
        debug!(model = %self.model, "asking fallback service to interpret command");

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
        });

        let response: serde_json::Value = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("fallback request failed")?
            .error_for_status()
            .context("fallback service returned an error status")?
            .json()
            .await
            .context("fallback response was not valid JSON")?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .context("fallback response had no message content")?;

        // models occasionally wrap the object in a markdown fence
        let content = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        serde_json::from_str(content).context("fallback content was not a valid intent payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_payload_converts() {
        let payload: FallbackIntent =
            serde_json::from_str(r#"{"intent":"approve_payment","number":1001}"#).unwrap();
        assert_eq!(payload.into_intent(), Some(Intent::ApprovePayment(1001)));
    }

    #[test]
    fn unknown_intent_is_discarded() {
        let payload: FallbackIntent =
            serde_json::from_str(r#"{"intent":"delete_everything","number":1}"#).unwrap();
        assert_eq!(payload.into_intent(), None);
    }

    #[test]
    fn missing_required_field_is_discarded() {
        let payload: FallbackIntent =
            serde_json::from_str(r#"{"intent":"create_payment","payee":"Acme"}"#).unwrap();
        assert_eq!(payload.into_intent(), None);

        // description is required, same as in the rule grammar
        let payload: FallbackIntent =
            serde_json::from_str(r#"{"intent":"create_payment","amount":1,"payee":"Acme"}"#)
                .unwrap();
        assert_eq!(payload.into_intent(), None);

        let payload: FallbackIntent =
            serde_json::from_str(r#"{"intent":"approve_exit"}"#).unwrap();
        assert_eq!(payload.into_intent(), None);
    }

    #[test]
    fn create_payload_keeps_optional_fields() {
        let payload: FallbackIntent = serde_json::from_str(
            r#"{"intent":"create_payment","amount":500000,"payee":"Acme","description":"rent","bank":"Mellat"}"#,
        )
        .unwrap();
        assert_eq!(
            payload.into_intent(),
            Some(Intent::CreatePayment {
                amount: 500_000,
                payee: "Acme".to_string(),
                description: "rent".to_string(),
                bank: Some("Mellat".to_string()),
            })
        );
    }
}
