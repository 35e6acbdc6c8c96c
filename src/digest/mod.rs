use serde::Serialize;
use serde_json::Value;

pub mod normalize;
pub mod reconcile;

/// Provenance of a feed item; fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestSource {
    Manual,
    Scheduled,
}

/// One item of the digest feed, in its normalized shape.
#[derive(Clone, Debug, Serialize)]
pub struct DigestEntry {
    pub id: String,
    pub timestamp: String,
    pub subject: String,
    pub recipient: String,
    pub stories_count: u32,
    pub workflow_status: String,
    pub email_sent: bool,
    pub source: DigestSource,
    /// Normalized payload retained for diagnostics.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub raw_response: Value,
}
