//! Submission types - the usage ledger records
//!
//! A submission is written exactly once per successful generation and never
//! mutated afterwards (hard delete only). Inputs are a tagged union keyed by
//! generation kind; decoders for the untagged shapes older records used are
//! provided so history written under the previous schema still renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Unique submission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    /// Create a new random submission ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a submission ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of generation a submission records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionKind {
    /// A short reply to an existing post
    ShortReply,
    /// A batch of viral tweet ideas
    ViralTweet,
}

impl SubmissionKind {
    /// Wire name for this kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ShortReply => "short-reply",
            Self::ViralTweet => "viral-tweet",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed input payload, tagged by generation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SubmissionInput {
    /// Input for a short reply
    #[serde(rename_all = "camelCase")]
    ShortReply {
        /// The post being replied to
        post_content: String,
        /// Requested tone for the reply
        tone: String,
    },
    /// Input for viral tweet generation
    ViralTweet {
        /// Example tweets the output should take style cues from
        examples: Vec<String>,
    },
}

impl SubmissionInput {
    /// The kind this input belongs to
    pub const fn kind(&self) -> SubmissionKind {
        match self {
            Self::ShortReply { .. } => SubmissionKind::ShortReply,
            Self::ViralTweet { .. } => SubmissionKind::ViralTweet,
        }
    }

    /// Decode an input payload for a known kind, accepting both the tagged
    /// schema and the untagged shapes older records were written under.
    pub fn decode(kind: SubmissionKind, value: serde_json::Value) -> Option<Self> {
        if let Ok(input) = serde_json::from_value::<Self>(value.clone()) {
            return Some(input);
        }
        // Older records stored the bare payload without a kind tag.
        match kind {
            SubmissionKind::ShortReply => {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct Legacy {
                    post_content: String,
                    tone: String,
                }
                serde_json::from_value::<Legacy>(value)
                    .ok()
                    .map(|l| Self::ShortReply {
                        post_content: l.post_content,
                        tone: l.tone,
                    })
            }
            SubmissionKind::ViralTweet => {
                #[derive(Deserialize)]
                struct Legacy {
                    examples: Vec<String>,
                }
                serde_json::from_value::<Legacy>(value)
                    .ok()
                    .map(|l| Self::ViralTweet {
                        examples: l.examples,
                    })
            }
        }
    }
}

/// One successful generation, as persisted in the usage ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Submission ID
    pub id: SubmissionId,
    /// Owning user
    pub user_id: UserId,
    /// Generation kind
    pub kind: SubmissionKind,
    /// The input that produced this submission
    pub input: SubmissionInput,
    /// Serialized result text. For viral tweets this is a JSON array of
    /// strings; see [`decode_tweet_result`] for the legacy shape.
    pub result: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Decode a stored viral-tweet result.
///
/// Current records hold a flat JSON array of strings. Records written before
/// the schema change hold `[{hook, body}]`; those are lifted into plain
/// strings so old history still renders.
pub fn decode_tweet_result(raw: &str) -> Option<Vec<String>> {
    if let Ok(tweets) = serde_json::from_str::<Vec<String>>(raw) {
        return Some(tweets);
    }

    #[derive(Deserialize)]
    struct LegacyPost {
        hook: String,
        body: String,
    }
    serde_json::from_str::<Vec<LegacyPost>>(raw)
        .ok()
        .map(|posts| {
            posts
                .into_iter()
                .map(|p| format!("{} {}", p.hook, p.body))
                .collect()
        })
}

/// Per-user usage tally, derived by scanning the ledger. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Short-reply generations
    #[serde(rename = "short-reply")]
    pub short_reply: u64,
    /// Viral-tweet generations
    #[serde(rename = "viral-tweet")]
    pub viral_tweet: u64,
    /// All generations
    pub total: u64,
}

impl UsageCounts {
    /// Tally one submission of the given kind
    pub fn record(&mut self, kind: SubmissionKind) {
        match kind {
            SubmissionKind::ShortReply => self.short_reply += 1,
            SubmissionKind::ViralTweet => self.viral_tweet += 1,
        }
        self.total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_round_trips_tagged_schema() {
        let input = SubmissionInput::ShortReply {
            post_content: "just shipped v2".to_string(),
            tone: "excited".to_string(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["kind"], "short-reply");
        let back = SubmissionInput::decode(SubmissionKind::ShortReply, value).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn input_decodes_legacy_untagged_shape() {
        let legacy = json!({"postContent": "hello", "tone": "friendly"});
        let input = SubmissionInput::decode(SubmissionKind::ShortReply, legacy).unwrap();
        assert_eq!(
            input,
            SubmissionInput::ShortReply {
                post_content: "hello".to_string(),
                tone: "friendly".to_string(),
            }
        );

        let legacy = json!({"examples": ["a", "b"]});
        let input = SubmissionInput::decode(SubmissionKind::ViralTweet, legacy).unwrap();
        assert_eq!(input.kind(), SubmissionKind::ViralTweet);
    }

    #[test]
    fn tweet_result_decodes_current_shape() {
        let raw = r#"["one", "two", "three"]"#;
        assert_eq!(
            decode_tweet_result(raw).unwrap(),
            vec!["one", "two", "three"]
        );
    }

    #[test]
    fn tweet_result_decodes_legacy_hook_body_shape() {
        let raw = r#"[{"hook": "Big news:", "body": "we shipped."}]"#;
        assert_eq!(
            decode_tweet_result(raw).unwrap(),
            vec!["Big news: we shipped."]
        );
    }

    #[test]
    fn tweet_result_rejects_garbage() {
        assert!(decode_tweet_result("not json").is_none());
        assert!(decode_tweet_result(r#"{"a": 1}"#).is_none());
    }

    #[test]
    fn usage_counts_tally() {
        let mut counts = UsageCounts::default();
        counts.record(SubmissionKind::ShortReply);
        counts.record(SubmissionKind::ShortReply);
        counts.record(SubmissionKind::ViralTweet);
        assert_eq!(counts.short_reply, 2);
        assert_eq!(counts.viral_tweet, 1);
        assert_eq!(counts.total, 3);
    }
}
