use crate::models::question::QuestionRecord;
use crate::services::ai_service::ChatTarget;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsPayload {
    #[validate(length(min = 1))]
    pub api_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(default)]
    pub question_types: Vec<String>,
    #[validate(length(min = 1))]
    pub user_input: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportQuestionsPayload {
    pub questions: Vec<QuestionRecord>,
}

/// Single-text helper calls: directory extraction and filename generation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssistantPayload {
    #[validate(length(min = 1))]
    pub api_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompareFilesPayload {
    #[validate(length(min = 1))]
    pub api_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub file_a: String,
    pub file_b: String,
}

impl GenerateQuestionsPayload {
    pub fn chat_target(&self) -> ChatTarget {
        ChatTarget {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }
}

impl AssistantPayload {
    pub fn chat_target(&self) -> ChatTarget {
        ChatTarget {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }
}

impl CompareFilesPayload {
    pub fn chat_target(&self) -> ChatTarget {
        ChatTarget {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }
}
