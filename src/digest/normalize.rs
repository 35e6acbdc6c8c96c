use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::digest::{DigestEntry, DigestSource};
use crate::remote::ExecutionLog;

const DEFAULT_SUBJECT: &str = "AI News Digest";

// Each field resolves through an ordered path list: the top-level key first,
// then the same key nested one level under `result`, then the default. This
// module is the only place that inspects raw agent payload shape.
const SUBJECT_PATHS: &[&[&str]] = &[&["subject"], &["result", "subject"]];
const RECIPIENT_PATHS: &[&[&str]] = &[&["recipient"], &["result", "recipient"]];
const STORIES_PATHS: &[&[&str]] = &[&["stories_count"], &["result", "stories_count"]];
const STATUS_PATHS: &[&[&str]] = &[&["workflow_status"], &["result", "workflow_status"]];
const EMAIL_SENT_PATHS: &[&[&str]] = &[&["email_sent"], &["result", "email_sent"]];
const TIMESTAMP_PATHS: &[&[&str]] = &[&["timestamp"], &["result", "timestamp"]];

/// Lenient parser for agent-generated output. Accepts plain JSON, a fenced
/// ```json block, or the first balanced object embedded in prose. Never
/// panics; returns None on anything unparsable.
pub fn parse_loose(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(inner) {
            return Some(v);
        }
    }
    if let Some(slice) = first_json_object(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(slice) {
            return Some(v);
        }
    }
    None
}

fn strip_code_fence(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.rfind("```")?;
    Some(rest[..end].trim())
}

fn first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in s[start..].char_indices() {
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn lookup<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    Some(cur)
}

// First non-empty string along the path list; empty or wrong-typed values
// fall through to the next path.
fn first_str(v: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| lookup(v, p).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

fn first_u64(v: &Value, paths: &[&[&str]]) -> Option<u64> {
    paths.iter().find_map(|p| lookup(v, p).and_then(Value::as_u64))
}

fn first_bool(v: &Value, paths: &[&[&str]]) -> Option<bool> {
    paths.iter().find_map(|p| lookup(v, p).and_then(Value::as_bool))
}

/// Build a manual-origin entry from an invocation response. Missing or
/// malformed fields resolve to send-time defaults; the entry id is generated
/// client-side.
pub fn manual_entry(parsed: Option<Value>, recipient: &str) -> DigestEntry {
    let raw = parsed.unwrap_or(Value::Null);
    DigestEntry {
        id: format!("manual-{}", Uuid::new_v4()),
        timestamp: first_str(&raw, TIMESTAMP_PATHS).unwrap_or_else(|| Utc::now().to_rfc3339()),
        subject: first_str(&raw, SUBJECT_PATHS).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        recipient: first_str(&raw, RECIPIENT_PATHS).unwrap_or_else(|| recipient.to_string()),
        stories_count: first_u64(&raw, STORIES_PATHS).unwrap_or(0) as u32,
        workflow_status: first_str(&raw, STATUS_PATHS).unwrap_or_else(|| "completed".to_string()),
        email_sent: first_bool(&raw, EMAIL_SENT_PATHS).unwrap_or(true),
        source: DigestSource::Manual,
        raw_response: raw,
    }
}

/// Build a scheduled-origin entry from one execution log row. Failed
/// executions are dropped here and never reach the feed.
pub fn entry_from_execution(log: &ExecutionLog) -> Option<DigestEntry> {
    if !log.success {
        return None;
    }
    let raw = log
        .response_output
        .as_deref()
        .and_then(parse_loose)
        .unwrap_or(Value::Null);
    let id = if log.id.is_empty() {
        format!("log-{}", log.executed_at)
    } else {
        log.id.clone()
    };
    Some(DigestEntry {
        id,
        timestamp: log.executed_at.clone(),
        subject: first_str(&raw, SUBJECT_PATHS).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        recipient: first_str(&raw, RECIPIENT_PATHS).unwrap_or_default(),
        stories_count: first_u64(&raw, STORIES_PATHS).unwrap_or(0) as u32,
        workflow_status: first_str(&raw, STATUS_PATHS).unwrap_or_else(|| "unknown".to_string()),
        email_sent: first_bool(&raw, EMAIL_SENT_PATHS).unwrap_or(false),
        source: DigestSource::Scheduled,
        raw_response: raw,
    })
}

/// Normalize a full execution-log snapshot into feed entries.
pub fn entries_from_executions(logs: &[ExecutionLog]) -> Vec<DigestEntry> {
    logs.iter().filter_map(entry_from_execution).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exec(id: &str, at: &str, success: bool, output: Option<&str>) -> ExecutionLog {
        ExecutionLog {
            id: id.to_string(),
            executed_at: at.to_string(),
            success,
            response_output: output.map(str::to_string),
        }
    }

    #[test]
    fn parse_loose_accepts_plain_json() {
        let v = parse_loose(r#"{"subject":"X"}"#).unwrap();
        assert_eq!(v["subject"], "X");
    }

    #[test]
    fn parse_loose_strips_code_fences() {
        let v = parse_loose("```json\n{\"subject\":\"X\"}\n```").unwrap();
        assert_eq!(v["subject"], "X");
    }

    #[test]
    fn parse_loose_finds_embedded_object() {
        let v = parse_loose("Here you go: {\"a\": {\"b\": 1}} done").unwrap();
        assert_eq!(v["a"]["b"], 1);
    }

    #[test]
    fn parse_loose_returns_none_on_garbage() {
        assert!(parse_loose("").is_none());
        assert!(parse_loose("no json here").is_none());
        assert!(parse_loose("{truncated").is_none());
    }

    #[test]
    fn subject_resolves_through_result_wrapper() {
        let entry = manual_entry(Some(json!({"result": {"subject": "X"}})), "a@b.co");
        assert_eq!(entry.subject, "X");
    }

    #[test]
    fn empty_object_resolves_to_defaults() {
        let entry = manual_entry(Some(json!({})), "a@b.co");
        assert_eq!(entry.subject, DEFAULT_SUBJECT);
        assert_eq!(entry.recipient, "a@b.co");
        assert_eq!(entry.stories_count, 0);
        assert_eq!(entry.workflow_status, "completed");
        assert!(entry.email_sent);
    }

    #[test]
    fn null_payload_resolves_all_fields_without_panicking() {
        let entry = manual_entry(None, "a@b.co");
        assert_eq!(entry.subject, DEFAULT_SUBJECT);
        assert_eq!(entry.workflow_status, "completed");
        assert!(entry.id.starts_with("manual-"));
        assert!(!entry.timestamp.is_empty());
    }

    #[test]
    fn wrong_typed_fields_fall_through_to_defaults() {
        let entry = manual_entry(
            Some(json!({"stories_count": "seven", "email_sent": "yes", "subject": 3})),
            "a@b.co",
        );
        assert_eq!(entry.stories_count, 0);
        assert!(entry.email_sent);
        assert_eq!(entry.subject, DEFAULT_SUBJECT);
    }

    #[test]
    fn scheduled_defaults_differ_from_manual() {
        let log = exec("e1", "2026-02-23T08:00:00Z", true, Some("{}"));
        let entry = entry_from_execution(&log).unwrap();
        assert_eq!(entry.workflow_status, "unknown");
        assert!(!entry.email_sent);
        assert_eq!(entry.source, DigestSource::Scheduled);
    }

    #[test]
    fn failed_executions_are_dropped() {
        let log = exec("e1", "2026-02-23T08:00:00Z", false, Some("{}"));
        assert!(entry_from_execution(&log).is_none());
    }

    #[test]
    fn missing_log_id_derives_from_execution_time() {
        let log = exec("", "2026-02-23T08:00:00Z", true, None);
        let entry = entry_from_execution(&log).unwrap();
        assert_eq!(entry.id, "log-2026-02-23T08:00:00Z");
        assert!(entry.raw_response.is_null());
    }

    #[test]
    fn snapshot_normalization_filters_failures() {
        let logs = vec![
            exec("e1", "2026-02-23T08:00:00Z", true, Some(r#"{"subject":"one"}"#)),
            exec("e2", "2026-02-23T08:10:00Z", false, None),
            exec("e3", "2026-02-23T08:20:00Z", true, None),
        ];
        let entries = entries_from_executions(&logs);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.id != "e2"));
    }
}
