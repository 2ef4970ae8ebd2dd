use crate::error::{Error, Result};
use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

const COMPLETE_TIMEOUT: Duration = Duration::from_secs(60);
const STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Text fragments of a streamed completion, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Where and as whom to call an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatTarget {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl ChatTarget {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
}

impl AIService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// One aggregated answer. `None` when the endpoint answered without any
    /// choice content.
    pub async fn complete(
        &self,
        target: &ChatTarget,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)];
        let payload = ChatRequest {
            model: &target.model,
            messages: &messages,
            stream: false,
        };

        let res = self
            .client
            .post(target.completions_url())
            .bearer_auth(&target.api_key)
            .json(&payload)
            .timeout(COMPLETE_TIMEOUT)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Upstream { status, body });
        }

        let text = res.text().await?;
        let body: ChatResponse = serde_json::from_str(&text)?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|s| s.trim().to_string()))
    }

    /// Live completion. Nothing is sent until the stream is first polled, and
    /// every call issues its own upstream request.
    pub fn complete_stream(&self, target: ChatTarget, messages: Vec<ChatMessage>) -> FragmentStream {
        Box::pin(stream_completion(self.client.clone(), target, messages))
    }

    pub fn generate_questions_stream(
        &self,
        target: ChatTarget,
        system_prompt: String,
        user_prompt: String,
    ) -> FragmentStream {
        self.complete_stream(
            target,
            vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
        )
    }

    pub fn compare_files_stream(&self, target: ChatTarget, file_a: &str, file_b: &str) -> FragmentStream {
        let prompt = COMPARE_PROMPT
            .replace("{file_a}", file_a)
            .replace("{file_b}", file_b);
        self.complete_stream(target, vec![ChatMessage::user(prompt)])
    }

    pub async fn extract_directory(&self, target: &ChatTarget, content: &str) -> Result<Option<String>> {
        let user_prompt = format!(
            "请根据以下内容提取或生成目录结构：\n\n{}\n\n请直接输出目录结构，不要有其他说明文字。",
            content
        );
        self.complete(target, DIRECTORY_EXTRACTION_PROMPT, &user_prompt).await
    }

    pub async fn generate_filename(&self, target: &ChatTarget, content: &str) -> Result<Option<String>> {
        let user_prompt = format!(
            "请根据以下内容生成一个合适的文件名：\n\n{}\n\n请直接输出文件名，不要有其他说明文字，不要包含扩展名。",
            content
        );
        self.complete(target, FILENAME_GENERATION_PROMPT, &user_prompt).await
    }
}

fn stream_completion(
    client: Client,
    target: ChatTarget,
    messages: Vec<ChatMessage>,
) -> impl Stream<Item = Result<String>> + Send {
    try_stream! {
        let payload = ChatRequest {
            model: &target.model,
            messages: &messages,
            stream: true,
        };

        let res = client
            .post(target.completions_url())
            .bearer_auth(&target.api_key)
            .json(&payload)
            .timeout(STREAM_TIMEOUT)
            .send()
            .await?;

        if res.status().is_success() {
            let mut fragments = Box::pin(completion_fragments(res.bytes_stream()));
            while let Some(fragment) = fragments.next().await {
                yield fragment?;
            }
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err::<(), _>(Error::Upstream { status, body })?;
        }
    }
}

const DIRECTORY_EXTRACTION_PROMPT: &str = r#"你是一名教材编辑助手。
你的任务是从用户提供的内容中提取章节目录结构；若内容本身没有目录，则根据内容归纳出合理的章节目录。
要求：
1. 使用层级编号（如 1、1.1、1.1.1），每行一个条目。
2. 只输出目录本身，不要输出解释、前言或总结。
3. 保持原文用语，不要改写章节名称。"#;

const FILENAME_GENERATION_PROMPT: &str = r#"你是一名文件命名助手。
根据用户提供的题库或教材内容，给出一个简洁、能概括主题的中文文件名。
要求：
1. 不超过 30 个字符。
2. 不包含扩展名、路径分隔符或以下字符：\ / : * ? " < > |
3. 只输出文件名本身。"#;

const COMPARE_PROMPT: &str = r#"请对比以下两份文件的内容，逐项列出它们的差异（新增、删除、修改），并在最后给出简短总结。

【文件A】
{file_a}

【文件B】
{file_b}"#;

/// Outcome of one line of an event-stream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    Fragment(String),
    Skip,
    Done,
}

/// Classifies one line of the upstream body. Lines that are not `data:`
/// lines, are not JSON, or carry no content delta are skipped.
pub fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(StreamLine::Fragment)
            .unwrap_or(StreamLine::Skip),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed stream chunk");
            StreamLine::Skip
        }
    }
}

/// Splits a byte stream into lines, keeping partial lines across chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// The trailing unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// Turns a raw event-stream body into content fragments. Ends at `[DONE]`,
/// at end of body, or after yielding the first transport error.
pub fn completion_fragments<S, E>(body: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    try_stream! {
        let mut body = Box::pin(body);
        let mut decoder = LineDecoder::default();
        let mut done = false;

        'body: while let Some(chunk) = body.next().await {
            let chunk: Bytes = chunk.map_err(Into::<Error>::into)?;
            for line in decoder.push(&chunk) {
                match parse_stream_line(&line) {
                    StreamLine::Fragment(text) => yield text,
                    StreamLine::Skip => {}
                    StreamLine::Done => {
                        done = true;
                        break 'body;
                    }
                }
            }
        }

        if !done {
            if let Some(line) = decoder.finish() {
                if let StreamLine::Fragment(text) = parse_stream_line(&line) {
                    yield text;
                }
            }
        }
    }
}
