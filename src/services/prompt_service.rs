use crate::error::Result;
use crate::models::header::HeaderSchema;
use crate::models::question::DemoDataset;
use crate::services::header_matcher::HeaderMatcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

pub const EXAMPLES_PLACEHOLDER: &str = "{{json_example}}";
pub const DIRECTORY_PLACEHOLDER: &str = "{{TOP}}";
const NO_DIRECTORY: &str = "无";

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"你是一名资深的考试命题专家，负责根据用户需求生成高质量的考试题目。

输出要求：
1. 只输出一个 JSON 对象，格式为 {"questions": [...]}，不要输出任何其他说明文字或 Markdown 代码块标记。
2. 每道题目是一个对象，字段名必须与下方示例完全一致（包括括号与注释）。
3. 选择题的选项写在"选项 A"至"选项H"字段中，未使用的选项留空字符串。
4. "正确答案"字段：单选题填写单个选项字母，多选题填写多个字母且不加分隔符（如 ABD），判断题填写"正确"或"错误"。
5. "难度"字段取值为 1 到 5 的整数，数字越大越难。
6. "章节"字段请从下方目录结构中选择最匹配的条目；若目录为"无"，则留空。
7. 每道题都必须提供"解析"。

题型示例：
{{json_example}}

目录结构：
{{TOP}}
"#;

/// Per-call prompt inputs for question generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationPromptInput<'a> {
    pub question_types: &'a [String],
    pub user_input: &'a str,
    pub system_prompt: Option<&'a str>,
    pub directory: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompts {
    pub system: String,
    pub user: String,
}

#[derive(Clone)]
pub struct PromptService {
    demo_questions_path: PathBuf,
    system_prompt_path: PathBuf,
    schema: Arc<HeaderSchema>,
}

impl PromptService {
    pub fn new(
        demo_questions_path: PathBuf,
        system_prompt_path: PathBuf,
        schema: Arc<HeaderSchema>,
    ) -> Self {
        Self {
            demo_questions_path,
            system_prompt_path,
            schema,
        }
    }

    pub async fn load_demo_dataset(&self) -> Result<DemoDataset> {
        let raw = fs::read_to_string(&self.demo_questions_path).await?;
        let dataset: DemoDataset = serde_json::from_str(&raw)?;
        Ok(dataset)
    }

    /// The override file's content when present, otherwise the built-in
    /// template.
    pub async fn load_system_prompt(&self) -> Result<String> {
        match fs::read_to_string(&self.system_prompt_path).await {
            Ok(content) => Ok(content.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(DEFAULT_SYSTEM_PROMPT.trim().to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Distinct question types found in the demo dataset, first seen first.
    pub fn question_types(&self, dataset: &DemoDataset) -> Vec<String> {
        let matcher = HeaderMatcher::new(&self.schema);
        let mut types: Vec<String> = Vec::new();
        for record in &dataset.questions {
            if let Some(qtype) = matcher.question_type_str(record) {
                if !qtype.is_empty() && !types.iter().any(|t| t == qtype) {
                    types.push(qtype.to_string());
                }
            }
        }
        types
    }

    /// One labelled, pretty-printed example per requested type. Types with
    /// no demo record are left out.
    pub fn examples_block(&self, dataset: &DemoDataset, question_types: &[String]) -> Result<String> {
        let matcher = HeaderMatcher::new(&self.schema);
        let mut block = String::new();

        for qtype in question_types {
            let example = dataset
                .questions
                .iter()
                .find(|record| matcher.question_type_str(record) == Some(qtype.as_str()));

            match example {
                Some(record) => {
                    let pretty = serde_json::to_string_pretty(record)?;
                    block.push_str(&format!("\n{}示例：\n{}\n", qtype, pretty));
                }
                None => tracing::warn!(question_type = %qtype, "No demo example for question type"),
            }
        }

        Ok(block)
    }

    pub async fn generation_prompts(&self, input: GenerationPromptInput<'_>) -> Result<GenerationPrompts> {
        let dataset = self.load_demo_dataset().await?;
        let examples = self.examples_block(&dataset, input.question_types)?;

        let template = match input.system_prompt.filter(|s| !s.trim().is_empty()) {
            Some(custom) => custom.to_string(),
            None => self.load_system_prompt().await?,
        };

        Ok(GenerationPrompts {
            system: render_system_prompt(&template, &examples, input.directory),
            user: format!(
                "用户需求：\n{}\n\n请按照system prompt中的格式要求生成题目。",
                input.user_input
            ),
        })
    }
}

pub fn render_system_prompt(template: &str, examples: &str, directory: Option<&str>) -> String {
    let directory = directory
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_DIRECTORY);
    template
        .replace(EXAMPLES_PLACEHOLDER, examples)
        .replace(DIRECTORY_PLACEHOLDER, directory)
}
