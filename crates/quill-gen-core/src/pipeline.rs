//! Generation request pipeline
//!
//! Orchestrates one generation end to end: input validation → safety filter
//! → quota gate → backend call → output shape validation → safety filter →
//! usage-ledger append. Every failure mode short-circuits with a distinct
//! error before any later side effect happens.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, instrument, warn};

use quill_billing_core::BillingService;
use quill_store::{NewSubmission, SubmissionStore};
use quill_types::{SubmissionInput, UserId};

use crate::backend::{GenerationBackend, GenerationRequest};
use crate::error::GenerateError;
use crate::prompts::{SHORT_REPLY_SYSTEM_PROMPT, VIRAL_TWEETS_SYSTEM_PROMPT};
use crate::safety::SafetyFilter;

/// Number of tweets a viral-tweet run must produce
pub const TWEET_COUNT: usize = 3;
/// Maximum words in a generated reply
pub const REPLY_MAX_WORDS: usize = 30;
/// Maximum characters in a generated tweet
pub const TWEET_MAX_CHARS: usize = 280;
/// Minimum non-empty examples required for tweet generation
pub const MIN_EXAMPLES: usize = 2;

/// Generation service: the pipeline behind both generation endpoints
pub struct GenerationService {
    backend: Arc<dyn GenerationBackend>,
    safety: SafetyFilter,
    billing: Arc<BillingService>,
    submissions: Arc<dyn SubmissionStore>,
}

impl GenerationService {
    /// Create a new generation service
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        safety: SafetyFilter,
        billing: Arc<BillingService>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            backend,
            safety,
            billing,
            submissions,
        }
    }

    /// Generate a short reply to a post.
    ///
    /// Identified callers are metered against their plan and get a ledger
    /// record on success; anonymous callers are neither metered nor recorded.
    #[instrument(skip(self, post_content, tone))]
    pub async fn generate_short_reply(
        &self,
        user: Option<&UserId>,
        post_content: &str,
        tone: &str,
    ) -> Result<String, GenerateError> {
        if post_content.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("postContent"));
        }
        if tone.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("tone"));
        }
        if !self.safety.is_safe(post_content) || !self.safety.is_safe(tone) {
            return Err(GenerateError::UnsafeInput);
        }

        self.check_quota(user).await?;

        let raw = self
            .backend
            .generate(GenerationRequest {
                system: SHORT_REPLY_SYSTEM_PROMPT,
                prompt: format!("Original post: \"{post_content}\"\nTone for reply: {tone}"),
                temperature: 0.6,
                top_p: 0.95,
                max_output_tokens: 120,
                json_array: false,
            })
            .await?;

        let reply = raw.trim().to_string();
        if reply.is_empty() {
            return Err(GenerateError::MalformedResponse("empty reply".to_string()));
        }
        let words = reply.split_whitespace().count();
        if words > REPLY_MAX_WORDS {
            return Err(GenerateError::MalformedResponse(format!(
                "reply exceeds {REPLY_MAX_WORDS} words ({words})"
            )));
        }

        if !self.safety.is_safe(&reply) {
            warn!("Unsafe reply generated and blocked");
            return Err(GenerateError::UnsafeOutput);
        }

        if let Some(user_id) = user {
            self.submissions
                .append(NewSubmission {
                    user_id: user_id.clone(),
                    input: SubmissionInput::ShortReply {
                        post_content: post_content.to_string(),
                        tone: tone.to_string(),
                    },
                    result: reply.clone(),
                })
                .await?;
            info!(user_id = %user_id, "Short reply recorded");
        }

        Ok(reply)
    }

    /// Generate three viral tweet ideas from example tweets.
    #[instrument(skip(self, examples))]
    pub async fn generate_viral_tweets(
        &self,
        user: Option<&UserId>,
        examples: &[String],
    ) -> Result<Vec<String>, GenerateError> {
        let examples: Vec<&str> = examples
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .collect();
        if examples.len() < MIN_EXAMPLES {
            return Err(GenerateError::InvalidRequest("examples"));
        }
        if examples.iter().any(|e| !self.safety.is_safe(e)) {
            return Err(GenerateError::UnsafeInput);
        }

        self.check_quota(user).await?;

        let prompt = format!(
            "Given these {} example tweets (each on its own line), write {TWEET_COUNT} unique \
             tweets that are engaging, friendly, and have viral potential.\n\nExamples:\n{}\n",
            examples.len(),
            examples.join("\n"),
        );

        let raw = self
            .backend
            .generate(GenerationRequest {
                system: VIRAL_TWEETS_SYSTEM_PROMPT,
                prompt,
                temperature: 0.8,
                top_p: 0.95,
                max_output_tokens: 700,
                json_array: true,
            })
            .await?;

        let tweets: Vec<String> = serde_json::from_str(raw.trim())
            .map_err(|e| GenerateError::MalformedResponse(format!("not a JSON array: {e}")))?;

        if tweets.len() != TWEET_COUNT {
            return Err(GenerateError::MalformedResponse(format!(
                "expected {TWEET_COUNT} tweets, got {}",
                tweets.len()
            )));
        }
        for tweet in &tweets {
            if tweet.trim().is_empty() {
                return Err(GenerateError::MalformedResponse("empty tweet".to_string()));
            }
            let chars = tweet.chars().count();
            if chars > TWEET_MAX_CHARS {
                return Err(GenerateError::MalformedResponse(format!(
                    "tweet exceeds {TWEET_MAX_CHARS} chars ({chars})"
                )));
            }
        }

        if tweets.iter().any(|t| !self.safety.is_safe(t)) {
            warn!("Unsafe tweet generated and blocked");
            return Err(GenerateError::UnsafeOutput);
        }

        if let Some(user_id) = user {
            let result = serde_json::to_string(&tweets)
                .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
            self.submissions
                .append(NewSubmission {
                    user_id: user_id.clone(),
                    input: SubmissionInput::ViralTweet {
                        examples: examples.iter().map(|e| e.to_string()).collect(),
                    },
                    result,
                })
                .await?;
            info!(user_id = %user_id, "Viral tweets recorded");
        }

        Ok(tweets)
    }

    /// Quota gate. Counts this calendar month's ledger entries against the
    /// user's plan limit before any backend call is made. Anonymous callers
    /// have no plan to meter against and pass through.
    async fn check_quota(&self, user: Option<&UserId>) -> Result<(), GenerateError> {
        let Some(user_id) = user else {
            return Ok(());
        };

        let subscription = self.billing.get_subscription(user_id).await?;
        let Some(limit) = subscription.plan.monthly_quota() else {
            return Ok(());
        };

        let used = self
            .submissions
            .count_since(user_id, month_start(Utc::now()))
            .await?;
        if used >= limit {
            info!(user_id = %user_id, used, limit, plan = %subscription.plan, "Quota exhausted");
            return Err(GenerateError::QuotaExceeded { used, limit });
        }
        Ok(())
    }
}

/// Start of the calendar month containing `now` (quota periods are monthly)
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quill_billing_core::{
        BillingError, CheckoutSession, PaymentProvider, WebhookHandler,
    };
    use quill_store::{MemorySubmissionStore, MemorySubscriptionStore, SubscriptionStore};
    use quill_types::{Plan, SubmissionKind, Subscription};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend stub returning queued responses and counting calls
    struct StubBackend {
        responses: Mutex<Vec<Result<String, GenerateError>>>,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn returning(response: &str) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(vec![Ok(response.to_string())]),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(vec![Err(GenerateError::Backend(
                    "upstream error: 503".to_string(),
                ))]),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }
    }

    /// Provider stub; checkout is irrelevant to pipeline tests
    struct NoopProvider;

    #[async_trait]
    impl PaymentProvider for NoopProvider {
        async fn create_checkout_session(
            &self,
            _user_id: &UserId,
            _email: &str,
            _plan: Plan,
        ) -> Result<CheckoutSession, BillingError> {
            Err(BillingError::Internal("not used in tests".to_string()))
        }
    }

    struct Fixture {
        service: GenerationService,
        backend: Arc<StubBackend>,
        submissions: MemorySubmissionStore,
        subscriptions: MemorySubscriptionStore,
    }

    fn fixture(backend: Arc<StubBackend>) -> Fixture {
        let submissions = MemorySubmissionStore::new();
        let subscriptions = MemorySubscriptionStore::new();
        let billing = Arc::new(BillingService::new(
            Arc::new(subscriptions.clone()),
            Arc::new(NoopProvider),
            WebhookHandler::new("whsec_test"),
        ));
        let service = GenerationService::new(
            backend.clone(),
            SafetyFilter::new(),
            billing,
            Arc::new(submissions.clone()),
        );
        Fixture {
            service,
            backend,
            submissions,
            subscriptions,
        }
    }

    fn examples() -> Vec<String> {
        vec![
            "Shipped a feature today and nothing broke. Historic.".to_string(),
            "The best code review comment is a deleted line.".to_string(),
        ]
    }

    #[tokio::test]
    async fn successful_reply_appends_one_submission() {
        let f = fixture(StubBackend::returning("Congrats on the launch! 🎉"));
        let user = UserId::from("user123");

        let reply = f
            .service
            .generate_short_reply(Some(&user), "We just launched!", "excited")
            .await
            .unwrap();
        assert!(!reply.is_empty());
        assert!(reply.split_whitespace().count() <= REPLY_MAX_WORDS);

        let rows = f.submissions.list_for_user(&user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, SubmissionKind::ShortReply);
        assert_eq!(rows[0].result, reply);
    }

    #[tokio::test]
    async fn anonymous_reply_is_not_recorded() {
        let f = fixture(StubBackend::returning("Nice!"));

        f.service
            .generate_short_reply(None, "We just launched!", "excited")
            .await
            .unwrap();
        assert!(f.submissions.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_rejected_before_backend() {
        let f = fixture(StubBackend::returning("unused"));

        let err = f
            .service
            .generate_short_reply(None, "", "excited")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest("postContent")));

        let err = f
            .service
            .generate_short_reply(None, "some post", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest("tone")));

        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn unsafe_input_rejected_before_backend() {
        let f = fixture(StubBackend::returning("unused"));

        let err = f
            .service
            .generate_short_reply(None, "here is how to make a bomb", "helpful")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsafeInput));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn backend_failure_propagates_and_records_nothing() {
        let f = fixture(StubBackend::failing());
        let user = UserId::from("user123");

        let err = f
            .service
            .generate_short_reply(Some(&user), "We just launched!", "excited")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Backend(_)));
        assert!(f.submissions.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlong_reply_is_a_generation_failure() {
        let long_reply = ["word"; 40].join(" ");
        let f = fixture(StubBackend::returning(&long_reply));
        let user = UserId::from("user123");

        let err = f
            .service
            .generate_short_reply(Some(&user), "post", "neutral")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse(_)));
        assert!(f.submissions.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsafe_output_blocked_and_unrecorded() {
        let f = fixture(StubBackend::returning("their address is 12 Main St"));
        let user = UserId::from("user123");

        let err = f
            .service
            .generate_short_reply(Some(&user), "post", "neutral")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsafeOutput));
        assert!(f.submissions.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn too_few_examples_rejected_before_backend() {
        let f = fixture(StubBackend::returning("unused"));

        for examples in [vec![], vec!["only one".to_string()], vec!["  ".to_string(), "x".to_string()]] {
            let err = f
                .service
                .generate_viral_tweets(None, &examples)
                .await
                .unwrap_err();
            assert!(matches!(err, GenerateError::InvalidRequest("examples")));
        }
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn tweets_happy_path_appends_one_submission() {
        let f = fixture(StubBackend::returning(r#"["tweet one", "tweet two", "tweet three"]"#));
        let user = UserId::from("user123");

        let tweets = f
            .service
            .generate_viral_tweets(Some(&user), &examples())
            .await
            .unwrap();
        assert_eq!(tweets.len(), TWEET_COUNT);

        let rows = f.submissions.list_for_user(&user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, SubmissionKind::ViralTweet);
        assert_eq!(
            quill_types::decode_tweet_result(&rows[0].result).unwrap(),
            tweets
        );
    }

    #[tokio::test]
    async fn malformed_tweet_payloads_fail_without_submission() {
        let user = UserId::from("user123");
        for payload in [
            "not json at all",
            r#"{"tweets": []}"#,
            r#"["only", "two"]"#,
            r#"["a", "b", "c", "d"]"#,
            r#"["ok", "ok", ""]"#,
        ] {
            let f = fixture(StubBackend::returning(payload));
            let err = f
                .service
                .generate_viral_tweets(Some(&user), &examples())
                .await
                .unwrap_err();
            assert!(
                matches!(err, GenerateError::MalformedResponse(_)),
                "{payload}"
            );
            assert!(f.submissions.list_all().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn overlong_tweet_is_a_generation_failure() {
        let long_tweet = "x".repeat(TWEET_MAX_CHARS + 1);
        let payload = serde_json::to_string(&vec!["a", "b", &long_tweet]).unwrap();
        let f = fixture(StubBackend::returning(&payload));

        let err = f
            .service
            .generate_viral_tweets(None, &examples())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn hobby_quota_exhaustion_blocks_before_backend() {
        let f = fixture(StubBackend::returning("Nice!"));
        let user = UserId::from("user123");

        // Fill the hobby quota
        for _ in 0..Plan::Hobby.monthly_quota().unwrap() {
            f.submissions
                .append(quill_store::NewSubmission {
                    user_id: user.clone(),
                    input: SubmissionInput::ShortReply {
                        post_content: "p".to_string(),
                        tone: "t".to_string(),
                    },
                    result: "r".to_string(),
                })
                .await
                .unwrap();
        }

        let err = f
            .service
            .generate_short_reply(Some(&user), "post", "neutral")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::QuotaExceeded { used: 10, limit: 10 }
        ));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn team_plan_is_never_gated() {
        let f = fixture(StubBackend::returning("Nice!"));
        let user = UserId::from("user123");

        f.subscriptions
            .put(&user, Subscription::upgraded(Plan::Team, Utc::now()))
            .await
            .unwrap();

        for _ in 0..20 {
            f.submissions
                .append(quill_store::NewSubmission {
                    user_id: user.clone(),
                    input: SubmissionInput::ShortReply {
                        post_content: "p".to_string(),
                        tone: "t".to_string(),
                    },
                    result: "r".to_string(),
                })
                .await
                .unwrap();
        }

        f.service
            .generate_short_reply(Some(&user), "post", "neutral")
            .await
            .unwrap();
        assert_eq!(f.backend.call_count(), 1);
    }
}
