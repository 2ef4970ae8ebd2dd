use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A generated question as the model returned it. Keys are free-form and
/// keep their insertion order, which matters for header matching.
pub type QuestionRecord = IndexMap<String, JsonValue>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoDataset {
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}
