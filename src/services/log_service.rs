use crate::error::Result;
use crate::models::api_log::ApiLogEntry;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

const REDACTED: &str = "***";
const CONSOLE_PREVIEW_CHARS: usize = 100;

/// Bounded JSON log of recent API calls, newest first.
///
/// Each write reads the whole file, prepends the entry, truncates and writes
/// it back; the mutex keeps concurrent requests from losing each other's
/// entries.
#[derive(Clone)]
pub struct ApiLogService {
    path: PathBuf,
    max_entries: usize,
    write_lock: Arc<Mutex<()>>,
}

impl ApiLogService {
    pub fn new(path: PathBuf, max_entries: usize) -> Self {
        Self {
            path,
            max_entries: max_entries.max(1),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn record(&self, entry: ApiLogEntry) -> Result<()> {
        tracing::info!("{}", console_line(&entry));

        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await;
        entries.insert(0, entry);
        entries.truncate(self.max_entries);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(&entries)?;
        fs::write(&self.path, body).await?;
        Ok(())
    }

    #[cfg(test)]
    async fn recent(&self) -> Vec<ApiLogEntry> {
        let _guard = self.write_lock.lock().await;
        self.read_entries().await
    }

    // Missing or unreadable files start a fresh log.
    async fn read_entries(&self) -> Vec<ApiLogEntry> {
        match fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "API log file is corrupt, starting over");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }
}

/// Replaces the values of credential-like keys at any depth.
pub fn redact_secrets(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if is_secret_key(&key) {
                        (key, JsonValue::String(REDACTED.to_string()))
                    } else {
                        (key, redact_secrets(value))
                    }
                })
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(redact_secrets).collect()),
        other => other,
    }
}

fn is_secret_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    normalized.contains("apikey") || normalized == "authorization"
}

fn console_line(entry: &ApiLogEntry) -> String {
    let mut line = format!(
        "[{}] {} {} {} {}ms",
        entry.timestamp, entry.method, entry.path, entry.status, entry.duration_ms
    );
    if let Some(request) = &entry.request {
        line.push_str(&format!(" | Req: {}", preview(request)));
    }
    if let Some(response) = &entry.response {
        line.push_str(&format!(" | Resp: {}", preview(response)));
    }
    line
}

fn preview(value: &JsonValue) -> String {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > CONSOLE_PREVIEW_CHARS {
        let cut: String = text.chars().take(CONSOLE_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(path: &str) -> ApiLogEntry {
        ApiLogEntry {
            timestamp: "2024-01-01 00:00:00".into(),
            method: "POST".into(),
            path: path.into(),
            status: 200,
            duration_ms: 5,
            request: None,
            response: None,
        }
    }

    fn log_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("qbank_log_{}", uuid::Uuid::new_v4()))
            .join("api.log")
    }

    #[test]
    fn secrets_are_redacted_at_any_depth() {
        let body = json!({
            "apiKey": "sk-1",
            "model": "m",
            "nested": { "api_key": "sk-2", "items": [{ "X-API-KEY": "sk-3" }] },
            "Authorization": "Bearer abc"
        });

        let redacted = redact_secrets(body);

        assert_eq!(redacted["apiKey"], "***");
        assert_eq!(redacted["model"], "m");
        assert_eq!(redacted["nested"]["api_key"], "***");
        assert_eq!(redacted["nested"]["items"][0]["X-API-KEY"], "***");
        assert_eq!(redacted["Authorization"], "***");
    }

    #[test]
    fn preview_truncates_on_characters() {
        let long = JsonValue::String("题".repeat(150));
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 103);
        assert!(shown.ends_with("..."));
    }

    #[tokio::test]
    async fn log_keeps_newest_entries_first_and_bounded() {
        let service = ApiLogService::new(log_path(), 3);

        for i in 0..5 {
            service.record(entry(&format!("/api/{}", i))).await.expect("record");
        }

        let paths: Vec<_> = service.recent().await.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/api/4", "/api/3", "/api/2"]);
    }

    #[tokio::test]
    async fn concurrent_writes_are_not_lost() {
        let service = ApiLogService::new(log_path(), 50);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.record(entry(&format!("/api/{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("record");
        }

        assert_eq!(service.recent().await.len(), 10);
    }

    #[tokio::test]
    async fn corrupt_file_starts_a_fresh_log() {
        let path = log_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        std::fs::write(&path, "not json").expect("write");
        let service = ApiLogService::new(path, 50);

        service.record(entry("/api/x")).await.expect("record");

        assert_eq!(service.recent().await.len(), 1);
    }
}
