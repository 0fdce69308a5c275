//! Model listing for the `models` command.

use serde::Deserialize;

use crate::config::DEFAULT_MODEL;

/// Models shown first, in this order.
const PRIORITY_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash", "gemini-pro"];

/// One entry of the Gemini `models` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-2.0-flash`
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Model identifier without the `models/` prefix.
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods.iter().any(|m| m == "generateContent")
    }

    pub fn is_default(&self) -> bool {
        self.id() == DEFAULT_MODEL
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Keep models usable for cleanup; priority models first, the rest alphabetical.
pub fn sort_models(models: Vec<ModelInfo>) -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = models.into_iter().filter(ModelInfo::supports_generate_content).collect();
    let rank = |m: &ModelInfo| PRIORITY_MODELS.iter().position(|p| *p == m.id()).unwrap_or(PRIORITY_MODELS.len());
    models.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.id().cmp(b.id())));
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: format!("models/{id}"),
            display_name: id.to_uppercase(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_priority_models_first_then_alphabetical() {
        let models = vec![
            model("zeta", &["generateContent"]),
            model("gemini-pro", &["generateContent"]),
            model("alpha", &["generateContent"]),
            model("gemini-2.0-flash", &["generateContent", "countTokens"]),
            model("embedding-001", &["embedContent"]),
        ];

        let ids: Vec<_> = sort_models(models).iter().map(|m| m.id().to_string()).collect();
        assert_eq!(ids, ["gemini-2.0-flash", "gemini-pro", "alpha", "zeta"]);
    }

    #[test]
    fn test_listing_deserializes_camel_case() {
        let json = r#"{"models":[{"name":"models/gemini-2.0-flash","displayName":"Gemini 2.0 Flash","supportedGenerationMethods":["generateContent"]}]}"#;
        let list: ModelList = serde_json::from_str(json).unwrap();
        assert_eq!(list.models[0].id(), "gemini-2.0-flash");
        assert!(list.models[0].is_default());
        assert_eq!(list.models[0].display_name, "Gemini 2.0 Flash");
    }
}
