//! Chat trivia
//!
//! Chat activity earns an account a question: every message bumps a counter,
//! and once the counter reaches the threshold and the cooldown has passed, a
//! conditioned claim resets it and a question is asked. The first answer
//! resolves the question, right or wrong. An expiry timer closes questions
//! nobody answered and is a no-op if the answer got there first.

use crate::{ActiveRegistry, Error, Result, TriviaConfig};
use async_trait::async_trait;
use points_ledger::{AccountKey, AccountUpdate, BalanceLedger, Clock, EntryReason};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A question and its expected answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the account
    pub prompt: String,
    /// Accepted answer (compared trimmed, case-insensitive)
    pub answer: String,
}

/// Where questions come from
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Produce the next question to ask
    async fn next_question(&self) -> Result<Question>;
}

/// Fixed list of questions, asked round-robin
#[derive(Debug)]
pub struct StaticQuestions {
    questions: Vec<Question>,
    next: AtomicUsize,
}

impl StaticQuestions {
    /// Source over `questions`; must not be empty
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::Config("Trivia needs at least one question".into()));
        }
        Ok(Self {
            questions,
            next: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl QuestionSource for StaticQuestions {
    async fn next_question(&self) -> Result<Question> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.questions.len();
        Ok(self.questions[index].clone())
    }
}

/// A question waiting for its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    /// Question identifier
    pub question_id: Uuid,
    /// Question asked
    pub question: Question,
    /// Points for a correct answer
    pub reward: i64,
    /// Answer deadline (epoch seconds)
    pub expires_at: i64,
}

/// A question to show the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaPrompt {
    /// Question identifier, needed to schedule the expiry
    pub question_id: Uuid,
    /// Text to show
    pub prompt: String,
    /// Points for a correct answer
    pub reward: i64,
    /// Answer deadline (epoch seconds)
    pub expires_at: i64,
}

/// Outcome of an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaAnswer {
    /// Right answer, reward credited
    Correct {
        /// Question answered
        question_id: Uuid,
        /// Points credited
        reward: i64,
        /// Balance after the credit
        new_balance: i64,
    },
    /// Wrong answer; the question is closed
    Wrong {
        /// Question answered
        question_id: Uuid,
        /// Expected answer
        expected: String,
    },
    /// Answered after the deadline
    Expired {
        /// Question answered
        question_id: Uuid,
    },
    /// Nothing to answer
    NoActiveQuestion,
}

/// Chat trivia awarder
#[derive(Clone)]
pub struct Trivia {
    ledger: BalanceLedger,
    clock: Arc<dyn Clock>,
    config: TriviaConfig,
    source: Arc<dyn QuestionSource>,
    active: ActiveRegistry<AccountKey, ActiveQuestion>,
}

impl std::fmt::Debug for Trivia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trivia")
            .field("config", &self.config)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl Trivia {
    /// Create awarder from config
    pub fn new(
        ledger: BalanceLedger,
        clock: Arc<dyn Clock>,
        config: TriviaConfig,
        source: Arc<dyn QuestionSource>,
    ) -> Self {
        Self {
            ledger,
            clock,
            config,
            source,
            active: ActiveRegistry::new(),
        }
    }

    /// Count a chat message from `key`; returns a question if one is due
    pub async fn on_message(&self, key: &AccountKey) -> Result<Option<TriviaPrompt>> {
        let store = self.ledger.store();
        store
            .find_one_and_update(key, AccountUpdate::RecordChatMessage, true)
            .await?;

        if self.active.contains(key) {
            return Ok(None);
        }

        let now = self.clock.now();
        let claim = AccountUpdate::ClaimTrivia {
            now,
            message_threshold: self.config.message_threshold,
            cooldown_secs: self.config.cooldown_secs,
        };
        if store.find_one_and_update(key, claim, false).await?.is_none() {
            return Ok(None);
        }

        let question = self.source.next_question().await.map_err(|e| {
            tracing::warn!(account = %key, error = %e, "Trivia claimed but no question available");
            e
        })?;

        let active = ActiveQuestion {
            question_id: Uuid::now_v7(),
            question,
            reward: self.config.reward,
            expires_at: now + self.config.answer_window_secs,
        };
        let prompt = TriviaPrompt {
            question_id: active.question_id,
            prompt: active.question.prompt.clone(),
            reward: active.reward,
            expires_at: active.expires_at,
        };

        if !self.active.insert_if_absent(key.clone(), active) {
            return Ok(None);
        }

        tracing::info!(
            account = %key,
            question_id = %prompt.question_id,
            expires_at = prompt.expires_at,
            "Trivia question asked"
        );
        Ok(Some(prompt))
    }

    /// Resolve the open question for `key` with `text`
    pub async fn answer(&self, key: &AccountKey, text: &str) -> Result<TriviaAnswer> {
        let Some(active) = self.active.take(key) else {
            return Ok(TriviaAnswer::NoActiveQuestion);
        };
        let question_id = active.question_id;

        // Taking the question in time wins the claim, whatever the answer
        let in_time = self.clock.now() < active.expires_at;
        self.ledger.metrics().record_claim(in_time);
        if !in_time {
            tracing::debug!(account = %key, %question_id, "Trivia answered too late");
            return Ok(TriviaAnswer::Expired { question_id });
        }

        let correct = text
            .trim()
            .eq_ignore_ascii_case(active.question.answer.trim());
        if !correct {
            tracing::debug!(account = %key, %question_id, "Trivia answered wrong");
            return Ok(TriviaAnswer::Wrong {
                question_id,
                expected: active.question.answer,
            });
        }

        let reason = EntryReason::Trivia { question_id };
        match self.ledger.apply_delta(key, active.reward, reason).await {
            Ok(outcome) => {
                tracing::info!(
                    account = %key,
                    %question_id,
                    reward = active.reward,
                    "Trivia answered"
                );
                Ok(TriviaAnswer::Correct {
                    question_id,
                    reward: active.reward,
                    new_balance: outcome.new_balance,
                })
            }
            Err(e) => {
                tracing::error!(
                    target: "reconciliation",
                    account = %key,
                    %question_id,
                    reward = active.reward,
                    error = %e,
                    "Trivia answered but credit failed"
                );
                Err(Error::Ledger(e))
            }
        }
    }

    /// Close question `question_id` for `key` if still open. Returns whether it was.
    pub fn expire(&self, key: &AccountKey, question_id: Uuid) -> bool {
        let expired = self
            .active
            .take_if(key, |active| active.question_id == question_id)
            .is_some();
        if expired {
            tracing::info!(account = %key, %question_id, "Trivia question expired");
        }
        expired
    }

    /// Open question for `key`, if any
    pub fn active(&self, key: &AccountKey) -> Option<ActiveQuestion> {
        self.active.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_ledger::{ManualClock, MemoryStore};

    fn create_test_trivia(clock: Arc<ManualClock>) -> Trivia {
        let ledger = BalanceLedger::new(Arc::new(MemoryStore::new()));
        let source = StaticQuestions::new(vec![Question {
            prompt: "2 + 2?".into(),
            answer: "4".into(),
        }])
        .unwrap();
        Trivia::new(
            ledger,
            clock,
            TriviaConfig {
                message_threshold: 3,
                cooldown_secs: 600,
                reward: 25,
                answer_window_secs: 30,
            },
            Arc::new(source),
        )
    }

    async fn chat_until_asked(trivia: &Trivia, key: &AccountKey) -> TriviaPrompt {
        for _ in 0..10 {
            if let Some(prompt) = trivia.on_message(key).await.unwrap() {
                return prompt;
            }
        }
        panic!("no question asked");
    }

    #[tokio::test]
    async fn test_question_after_threshold() {
        let trivia = create_test_trivia(Arc::new(ManualClock::new(10_000)));
        let key = AccountKey::scoped("guild", "alice");

        assert!(trivia.on_message(&key).await.unwrap().is_none());
        assert!(trivia.on_message(&key).await.unwrap().is_none());
        let prompt = trivia.on_message(&key).await.unwrap().unwrap();
        assert_eq!(prompt.prompt, "2 + 2?");
        assert_eq!(prompt.expires_at, 10_030);
    }

    #[tokio::test]
    async fn test_correct_answer_credits_once() {
        let trivia = create_test_trivia(Arc::new(ManualClock::new(10_000)));
        let key = AccountKey::scoped("guild", "alice");
        let prompt = chat_until_asked(&trivia, &key).await;

        let answer = trivia.answer(&key, " 4 ").await.unwrap();
        assert_eq!(
            answer,
            TriviaAnswer::Correct {
                question_id: prompt.question_id,
                reward: 25,
                new_balance: 25
            }
        );
        assert_eq!(trivia.answer(&key, "4").await.unwrap(), TriviaAnswer::NoActiveQuestion);
        assert!(!trivia.expire(&key, prompt.question_id));
    }

    #[tokio::test]
    async fn test_wrong_answer_closes_question() {
        let trivia = create_test_trivia(Arc::new(ManualClock::new(10_000)));
        let key = AccountKey::scoped("guild", "alice");
        chat_until_asked(&trivia, &key).await;

        assert!(matches!(
            trivia.answer(&key, "5").await.unwrap(),
            TriviaAnswer::Wrong { .. }
        ));
        assert_eq!(trivia.answer(&key, "4").await.unwrap(), TriviaAnswer::NoActiveQuestion);
        assert_eq!(trivia.ledger.balance(&key).await.unwrap(), 0);

        let claims = &trivia.ledger.metrics().claims_total;
        assert_eq!(claims.with_label_values(&["won"]).get(), 1);
        assert_eq!(claims.with_label_values(&["lost"]).get(), 0);
    }

    #[tokio::test]
    async fn test_expiry_then_late_answer() {
        let clock = Arc::new(ManualClock::new(10_000));
        let trivia = create_test_trivia(clock.clone());
        let key = AccountKey::scoped("guild", "alice");
        let prompt = chat_until_asked(&trivia, &key).await;

        clock.advance(30);
        assert!(trivia.expire(&key, prompt.question_id));
        assert_eq!(trivia.answer(&key, "4").await.unwrap(), TriviaAnswer::NoActiveQuestion);
    }

    #[tokio::test]
    async fn test_answer_past_deadline_not_paid() {
        let clock = Arc::new(ManualClock::new(10_000));
        let trivia = create_test_trivia(clock.clone());
        let key = AccountKey::scoped("guild", "alice");
        let prompt = chat_until_asked(&trivia, &key).await;

        clock.advance(31);
        assert_eq!(
            trivia.answer(&key, "4").await.unwrap(),
            TriviaAnswer::Expired {
                question_id: prompt.question_id
            }
        );
        assert_eq!(trivia.ledger.balance(&key).await.unwrap(), 0);
        assert_eq!(
            trivia.ledger.metrics().claims_total.with_label_values(&["lost"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_cooldown_between_questions() {
        let clock = Arc::new(ManualClock::new(10_000));
        let trivia = create_test_trivia(clock.clone());
        let key = AccountKey::scoped("guild", "alice");
        chat_until_asked(&trivia, &key).await;
        trivia.answer(&key, "4").await.unwrap();

        for _ in 0..5 {
            assert!(trivia.on_message(&key).await.unwrap().is_none());
        }
        clock.advance(600);
        assert!(trivia.on_message(&key).await.unwrap().is_some());
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(StaticQuestions::new(Vec::new()), Err(Error::Config(_))));
    }
}
