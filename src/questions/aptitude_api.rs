// src/questions/aptitude_api.rs

//! Aptitude API: free, no key, and no stable schema.
//!
//! The payload is recognised by trying a few shape detectors in turn, first
//! for the envelope and then for each question's options.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::questions::{
    first_text, fit_options, value_text, IdSequence, Question, QuestionId, QuestionRequest,
    OPTION_COUNT,
};

const DEFAULT_CATEGORY: &str = "Quantitative Aptitude";

pub struct AptitudeApi {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl AptitudeApi {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
        }
    }
}

/* ---------------- envelope detectors ---------------- */

type EnvelopeDetector = fn(&Value) -> Option<&Vec<Value>>;

const ENVELOPES: &[EnvelopeDetector] = &[bare_sequence, questions_field, data_field];

fn bare_sequence(v: &Value) -> Option<&Vec<Value>> {
    v.as_array()
}

fn questions_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("questions").and_then(Value::as_array)
}

fn data_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("data").and_then(Value::as_array)
}

fn question_rows(raw: &Value) -> Option<&Vec<Value>> {
    ENVELOPES.iter().find_map(|detect| detect(raw))
}

/* ---------------- option detectors ---------------- */

type OptionsDetector = fn(&Value) -> Option<Vec<String>>;

const OPTION_SHAPES: &[OptionsDetector] = &[options_sequence, options_map, discrete_options];

/// `"options": ["a", "b", ...]`
fn options_sequence(q: &Value) -> Option<Vec<String>> {
    let items = q.get("options")?.as_array()?;
    Some(items.iter().filter_map(value_text).collect())
}

/// `"options": {"a": "...", "b": "..."}`
fn options_map(q: &Value) -> Option<Vec<String>> {
    let items = q.get("options")?.as_object()?;
    Some(items.values().filter_map(value_text).collect())
}

/// `option1..option4` or `optionA..optionD`.
fn discrete_options(q: &Value) -> Option<Vec<String>> {
    let found: Vec<String> = (0..OPTION_COUNT)
        .filter_map(|i| {
            let numbered = format!("option{}", i + 1);
            let lettered = format!("option{}", (b'A' + i as u8) as char);
            first_text(q, &[numbered.as_str(), lettered.as_str()])
        })
        .collect();

    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

fn detect_options(q: &Value) -> Vec<String> {
    OPTION_SHAPES
        .iter()
        .find_map(|detect| detect(q))
        .unwrap_or_default()
}

/* ---------------- answer location ---------------- */

/// Where the correct answer sits in `options`:
/// 1. an explicit numeric index
/// 2. the answer text itself
/// 3. a bare option letter (`"B"`)
fn locate_answer(q: &Value, options: &[String]) -> Option<usize> {
    let answer = ["correctAnswer", "correct_answer", "answer"]
        .iter()
        .find_map(|k| q.get(*k).filter(|v| !v.is_null()))?;

    if let Some(index) = answer.as_u64() {
        let index = index as usize;
        return (index < options.len()).then_some(index);
    }

    let text = value_text(answer)?;
    if let Some(pos) = options.iter().position(|o| *o == text) {
        return Some(pos);
    }

    match text.as_bytes() {
        [letter] if letter.is_ascii_alphabetic() => {
            let index = (letter.to_ascii_uppercase() - b'A') as usize;
            (index < options.len()).then_some(index)
        }
        _ => None,
    }
}

/// Normalise one question, or `None` when its correct answer cannot be
/// located among its options.
fn normalize_row(q: &Value, index: usize, ids: &IdSequence) -> Option<Question> {
    let options = detect_options(q);
    let correct = locate_answer(q, &options)?;
    let (options, correct_answer) = fit_options(options, correct);

    let id = q
        .get("id")
        .and_then(value_text)
        .map(QuestionId)
        .unwrap_or_else(|| ids.id(index));

    let letter = (b'A' + correct_answer as u8) as char;

    Some(Question {
        id,
        title: first_text(q, &["topic", "title", "category"])
            .unwrap_or_else(|| format!("Question {}", index + 1)),
        question: first_text(q, &["question", "problem", "statement"])
            .unwrap_or_else(|| "Aptitude question".to_string()),
        options,
        correct_answer,
        explanation: first_text(q, &["explanation", "solution"])
            .unwrap_or_else(|| format!("The correct answer is option {}.", letter)),
        category: first_text(q, &["category", "topic"])
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: None,
    })
}

#[async_trait]
impl Provider for AptitudeApi {
    type Request = QuestionRequest;
    type Output = Vec<Question>;

    fn name(&self) -> &'static str {
        "aptitude-api"
    }

    async fn fetch(&self, _req: &QuestionRequest) -> Result<Option<Value>, ProviderError> {
        let request = self.client.get(&self.url).header(ACCEPT, "application/json");
        send_json(request, self.timeout).await.map(Some)
    }

    fn normalize(
        &self,
        raw: Value,
        req: &QuestionRequest,
        rng: &mut fastrand::Rng,
    ) -> Result<Option<Vec<Question>>, ProviderError> {
        let rows = question_rows(&raw)
            .ok_or_else(|| ProviderError::Malformed("unrecognised envelope".into()))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let ids = IdSequence::new(self.name(), rng);
        let questions: Vec<Question> = rows
            .iter()
            .take(req.amount)
            .enumerate()
            .filter_map(|(i, q)| {
                let normalized = normalize_row(q, i, &ids);
                if normalized.is_none() {
                    tracing::debug!(index = i, "aptitude-api question without a locatable answer");
                }
                normalized
            })
            .collect();

        if questions.is_empty() {
            return Err(ProviderError::Rejected(
                "no question had a locatable correct answer".into(),
            ));
        }

        Ok(Some(questions))
    }
}
