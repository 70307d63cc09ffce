// src/questions/mod.rs

//! Question proxy.
//!
//! Tries the keyed QuizAPI, the free Aptitude API and Open Trivia DB in that
//! order. Every provider shape is normalised into the canonical [`Question`].
//! When nothing upstream yields a question the local synthesizer answers
//! instead, so from the caller's point of view this path cannot fail.

pub mod aptitude_api;
pub mod opentdb;
pub mod quizapi;
pub mod synth;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

use crate::config::QuestionsConfig;
use crate::engine::{run_chain, sink::EventSink, BoxedProvider};
use crate::request_id::RequestId;

pub const SOURCE_GENERATED: &str = "generated";
pub const SOURCE_GENERATED_FALLBACK: &str = "generated-fallback";

/// Number of options every canonical question carries.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Question {
    /// The text of the option marked correct.
    #[allow(dead_code)]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer]
    }

    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTION_COUNT && self.correct_answer < OPTION_COUNT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,
    pub source: String,
}

/// Raw query parameters as received over HTTP. Everything is optional and
/// loosely typed; [`QuestionRequest::from_query`] applies the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionQuery {
    pub amount: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub amount: usize,
    pub category: String,
    pub difficulty: String,
}

impl QuestionRequest {
    /// Non-numeric or non-positive `amount` falls back to `default_amount`;
    /// anything above `max_amount` is capped.
    pub fn from_query(query: &QuestionQuery, default_amount: u32, max_amount: u32) -> Self {
        let amount = query
            .amount
            .as_deref()
            .and_then(|a| a.trim().parse::<i64>().ok())
            .filter(|a| *a > 0)
            .unwrap_or(i64::from(default_amount))
            .min(i64::from(max_amount.max(1)));

        let text_or = |v: &Option<String>, default: &str| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            amount: amount as usize,
            category: text_or(&query.category, "all"),
            difficulty: text_or(&query.difficulty, "medium"),
        }
    }
}

/* ---------------- option helpers ---------------- */

/// `Option A`, `Option B`, ... for padding short option sets.
pub fn option_placeholder(index: usize) -> String {
    format!("Option {}", (b'A' + index as u8) as char)
}

/// Bring an option list to exactly four entries while keeping the correct one.
///
/// Surplus incorrect options are dropped from the end; short lists are padded
/// with placeholders. Returns the options and the new index of the correct one.
pub fn fit_options(options: Vec<String>, correct: usize) -> (Vec<String>, usize) {
    let mut fitted = Vec::with_capacity(OPTION_COUNT);
    let mut new_correct = 0;
    let mut incorrect_budget = OPTION_COUNT - 1;

    for (i, option) in options.into_iter().enumerate() {
        if i == correct {
            new_correct = fitted.len();
            fitted.push(option);
        } else if incorrect_budget > 0 {
            incorrect_budget -= 1;
            fitted.push(option);
        }
    }

    while fitted.len() < OPTION_COUNT {
        fitted.push(option_placeholder(fitted.len()));
    }

    (fitted, new_correct)
}

/// Unbiased shuffle that tracks where the correct option ends up.
///
/// Tracking the index (not the text) keeps the answer right even when two
/// options happen to render identically.
pub fn shuffle_with_answer(
    options: Vec<String>,
    correct: usize,
    rng: &mut fastrand::Rng,
) -> (Vec<String>, usize) {
    let mut order: Vec<usize> = (0..options.len()).collect();
    rng.shuffle(&mut order);

    let new_correct = order.iter().position(|&i| i == correct).unwrap_or(0);

    let mut slots: Vec<Option<String>> = options.into_iter().map(Some).collect();
    let shuffled = order
        .iter()
        .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
        .collect();

    (shuffled, new_correct)
}

/// Text of a loosely typed JSON scalar: strings are trimmed, numbers are
/// rendered, anything else (or an empty string) is `None`.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First usable text among several candidate fields.
pub fn first_text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(value_text))
}

/// Batch-local id generator: timestamp + random jitter + position.
pub struct IdSequence {
    prefix: String,
    base: i64,
    jitter: u32,
}

impl IdSequence {
    pub fn new(prefix: &str, rng: &mut fastrand::Rng) -> Self {
        Self {
            prefix: prefix.to_string(),
            base: chrono::Utc::now().timestamp_millis(),
            jitter: rng.u32(0..1000),
        }
    }

    pub fn id(&self, index: usize) -> QuestionId {
        QuestionId(format!(
            "{}-{}{:03}-{}",
            self.prefix, self.base, self.jitter, index
        ))
    }
}

/* ---------------- proxy ---------------- */

pub type QuestionProvider = BoxedProvider<QuestionRequest, Vec<Question>>;

pub struct QuestionProxy {
    providers: Vec<QuestionProvider>,
    default_amount: u32,
    max_amount: u32,
    seed: Option<u64>,
}

impl QuestionProxy {
    /// QuizAPI (only with a usable key), then Aptitude API, then Open Trivia DB.
    pub fn from_config(cfg: &QuestionsConfig, client: reqwest::Client) -> Self {
        let mut providers: Vec<QuestionProvider> = Vec::new();

        match cfg.quizapi.usable_credential() {
            Some(key) => providers.push(Box::new(quizapi::QuizApi::new(
                client.clone(),
                &cfg.quizapi,
                key,
            ))),
            None => tracing::debug!("quizapi disabled: no API key configured"),
        }
        providers.push(Box::new(aptitude_api::AptitudeApi::new(
            client.clone(),
            &cfg.aptitude_api,
        )));
        providers.push(Box::new(opentdb::OpenTdb::new(client, &cfg.opentdb)));

        Self::with_providers(providers, cfg.default_amount, cfg.max_amount)
    }

    pub fn with_providers(
        providers: Vec<QuestionProvider>,
        default_amount: u32,
        max_amount: u32,
    ) -> Self {
        Self {
            providers,
            default_amount,
            max_amount,
            seed: None,
        }
    }

    /// Synthesizer only; no upstream calls.
    pub fn offline(default_amount: u32, max_amount: u32) -> Self {
        Self::with_providers(Vec::new(), default_amount, max_amount)
    }

    /// Make shuffles and template draws reproducible.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn request_from_query(&self, query: &QuestionQuery) -> QuestionRequest {
        QuestionRequest::from_query(query, self.default_amount, self.max_amount)
    }

    fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }

    /// Always returns exactly `req.amount` well-formed questions.
    pub async fn get_questions(
        &self,
        req: &QuestionRequest,
        request_id: &RequestId,
        sink: &mut dyn EventSink,
    ) -> QuestionBatch {
        let mut rng = self.rng();

        let upstream = AssertUnwindSafe(self.from_providers(req, &mut rng, request_id, sink))
            .catch_unwind()
            .await;

        match upstream {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                tracing::info!(
                    request_id = %request_id,
                    amount = req.amount,
                    "no upstream questions, generating locally"
                );
                QuestionBatch {
                    questions: synth::generate(req.amount, &mut rng),
                    source: SOURCE_GENERATED.to_string(),
                }
            }
            Err(_) => {
                tracing::error!(
                    request_id = %request_id,
                    "question providers panicked, generating locally"
                );
                QuestionBatch {
                    questions: synth::generate(req.amount, &mut rng),
                    source: SOURCE_GENERATED_FALLBACK.to_string(),
                }
            }
        }
    }

    async fn from_providers(
        &self,
        req: &QuestionRequest,
        rng: &mut fastrand::Rng,
        request_id: &RequestId,
        sink: &mut dyn EventSink,
    ) -> Option<QuestionBatch> {
        let (questions, source) = run_chain(&self.providers, req, rng, request_id, sink).await?;
        if questions.is_empty() {
            return None;
        }

        Some(QuestionBatch {
            questions: complete_batch(questions, req.amount, rng),
            source: source.to_string(),
        })
    }
}

/// Truncate to `amount`, drop malformed entries, make ids distinct, and top
/// up a short upstream batch with synthesized questions.
fn complete_batch(
    questions: Vec<Question>,
    amount: usize,
    rng: &mut fastrand::Rng,
) -> Vec<Question> {
    let mut out: Vec<Question> = questions
        .into_iter()
        .filter(Question::is_well_formed)
        .take(amount)
        .collect();

    if out.len() < amount {
        let missing = amount - out.len();
        tracing::debug!(missing, "topping up upstream batch with generated questions");
        out.extend(synth::generate(missing, rng));
    }

    let mut seen = HashSet::new();
    for q in &mut out {
        q.id = distinct_id(&q.id, &mut seen);
    }

    out
}

/// `id` itself if unused, else the first free `id-1`, `id-2`, ...
fn distinct_id(id: &QuestionId, seen: &mut HashSet<QuestionId>) -> QuestionId {
    let mut candidate = id.clone();
    let mut suffix = 1;
    while !seen.insert(candidate.clone()) {
        candidate = QuestionId(format!("{}-{}", id.0, suffix));
        suffix += 1;
    }
    candidate
}
