// src/questions/quizapi.rs

//! QuizAPI: keyed, richest schema, strict rate limits.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::questions::{
    first_text, fit_options, shuffle_with_answer, value_text, IdSequence, Question, QuestionId,
    QuestionRequest,
};

const DEFAULT_CATEGORY: &str = "Quantitative Aptitude";

pub struct QuizApi {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    api_key: String,
}

impl QuizApi {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint, api_key: String) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
            api_key,
        }
    }

    fn request(&self, req: &QuestionRequest) -> reqwest::RequestBuilder {
        let limit = req.amount.to_string();
        self.client
            .get(&self.url)
            .header("x-api-key", &self.api_key)
            .query(&[
                ("limit", limit.as_str()),
                ("category", upstream_category(&req.category)),
                ("difficulty", upstream_difficulty(&req.difficulty)),
            ])
    }
}

/// QuizAPI only has two categories worth asking for; everything else goes to `code`.
fn upstream_category(category: &str) -> &'static str {
    if category.trim().eq_ignore_ascii_case("linux") {
        "linux"
    } else {
        "code"
    }
}

fn upstream_difficulty(difficulty: &str) -> &'static str {
    match difficulty.trim().to_ascii_lowercase().as_str() {
        "easy" => "Easy",
        "hard" => "Hard",
        _ => "Medium",
    }
}

fn mentions_quota(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["limit", "quota", "too many"].iter().any(|k| lower.contains(k))
}

/// Message carried by an upstream error body, if any.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| first_text(&v, &["message", "error"]))
        .unwrap_or_else(|| body.to_string())
}

/// Rate limit / quota answers are told apart from ordinary failures so
/// they can be logged distinctly. Neither is retried.
fn classify(error: ProviderError) -> ProviderError {
    match error {
        ProviderError::Status { status, body } => {
            let message = upstream_message(&body);
            if status == 429 || status == 403 || mentions_quota(&message) {
                ProviderError::QuotaExhausted(format!("{}: {}", status, message))
            } else {
                ProviderError::Status { status, body }
            }
        }
        other => other,
    }
}

/// Key of the correct answer (`answer_b`), from `correct_answer` or the
/// `correct_answers` flags.
fn correct_key(q: &Value, keys: &[String]) -> Option<String> {
    if let Some(key) = q.get("correct_answer").and_then(Value::as_str) {
        if keys.iter().any(|k| k == key) {
            return Some(key.to_string());
        }
    }

    let flags = q.get("correct_answers")?;
    keys.iter()
        .find(|k| {
            flags
                .get(format!("{}_correct", k))
                .map(|v| v.as_str() == Some("true") || v.as_bool() == Some(true))
                .unwrap_or(false)
        })
        .cloned()
}

fn tag_names(q: &Value) -> Option<Vec<String>> {
    let tags = q.get("tags")?.as_array()?;
    Some(
        tags.iter()
            .filter_map(|t| value_text(t).or_else(|| t.get("name").and_then(value_text)))
            .collect(),
    )
}

fn normalize_row(
    q: &Value,
    index: usize,
    ids: &IdSequence,
    rng: &mut fastrand::Rng,
) -> Option<Question> {
    let (keys, texts): (Vec<String>, Vec<String>) = q
        .get("answers")?
        .as_object()?
        .iter()
        .filter_map(|(k, v)| value_text(v).map(|text| (k.clone(), text)))
        .unzip();

    let key = correct_key(q, &keys)?;
    let correct = keys.iter().position(|k| *k == key)?;
    let correct_text = texts[correct].clone();

    let (options, correct) = fit_options(texts, correct);
    let (options, correct_answer) = shuffle_with_answer(options, correct, rng);

    let question = first_text(q, &["question"]);

    Some(Question {
        id: q
            .get("id")
            .and_then(value_text)
            .map(QuestionId)
            .unwrap_or_else(|| ids.id(index)),
        title: question
            .clone()
            .unwrap_or_else(|| format!("Question {}", index + 1)),
        question: question.unwrap_or_else(|| "Aptitude question".to_string()),
        options,
        correct_answer,
        explanation: first_text(q, &["explanation"])
            .unwrap_or_else(|| format!("The correct answer is: {}", correct_text)),
        category: first_text(q, &["category"]).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: Some(tag_names(q).unwrap_or_default()),
    })
}

#[async_trait]
impl Provider for QuizApi {
    type Request = QuestionRequest;
    type Output = Vec<Question>;

    fn name(&self) -> &'static str {
        "quizapi"
    }

    async fn fetch(&self, req: &QuestionRequest) -> Result<Option<Value>, ProviderError> {
        send_json(self.request(req), self.timeout)
            .await
            .map(Some)
            .map_err(classify)
    }

    fn normalize(
        &self,
        raw: Value,
        req: &QuestionRequest,
        rng: &mut fastrand::Rng,
    ) -> Result<Option<Vec<Question>>, ProviderError> {
        let rows = match raw.as_array() {
            Some(rows) => rows,
            None => {
                let message = first_text(&raw, &["message", "error"]).unwrap_or_default();
                if mentions_quota(&message) {
                    return Err(ProviderError::QuotaExhausted(message));
                }
                return Err(ProviderError::Malformed("expected a list of questions".into()));
            }
        };

        if rows.is_empty() {
            return Ok(None);
        }

        let ids = IdSequence::new(self.name(), rng);
        let mut questions = Vec::with_capacity(rows.len().min(req.amount));
        for (i, q) in rows.iter().take(req.amount).enumerate() {
            match normalize_row(q, i, &ids, rng) {
                Some(question) => questions.push(question),
                None => tracing::debug!(index = i, "quizapi question without a locatable answer"),
            }
        }

        if questions.is_empty() {
            return Err(ProviderError::Rejected(
                "no question had a locatable correct answer".into(),
            ));
        }

        Ok(Some(questions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuestionsConfig;
    use serde_json::json;

    fn provider() -> QuizApi {
        QuizApi::new(
            reqwest::Client::new(),
            &QuestionsConfig::default().quizapi,
            "key".into(),
        )
    }

    fn normalize(raw: Value, seed: u64) -> Result<Option<Vec<Question>>, ProviderError> {
        let req = QuestionRequest {
            amount: 10,
            category: "all".into(),
            difficulty: "medium".into(),
        };
        provider().normalize(raw, &req, &mut fastrand::Rng::with_seed(seed))
    }

    fn row() -> Value {
        json!({
            "id": 512,
            "question": "Which command lists files?",
            "answers": {
                "answer_a": "cd",
                "answer_b": "ls",
                "answer_c": "rm",
                "answer_d": "mv",
                "answer_e": null,
                "answer_f": null
            },
            "correct_answers": {
                "answer_a_correct": "false",
                "answer_b_correct": "true",
                "answer_c_correct": "false",
                "answer_d_correct": "false"
            },
            "correct_answer": "answer_b",
            "explanation": null,
            "tags": [{ "name": "Linux" }, { "name": "BASH" }],
            "category": "Linux"
        })
    }

    #[test]
    fn request_mapping() {
        assert_eq!(upstream_category("Linux"), "linux");
        assert_eq!(upstream_category("code"), "code");
        assert_eq!(upstream_category("quantitative"), "code");
        assert_eq!(upstream_difficulty("EASY"), "Easy");
        assert_eq!(upstream_difficulty("whatever"), "Medium");
    }

    #[test]
    fn request_sends_key_and_mapped_filters() {
        let req = QuestionRequest {
            amount: 7,
            category: "Linux".into(),
            difficulty: "hard".into(),
        };
        let built = provider().request(&req).build().unwrap();

        assert_eq!(built.headers()["x-api-key"], "key");
        let query: Vec<(String, String)> = built.url().query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("limit".to_string(), "7".to_string()),
                ("category".to_string(), "linux".to_string()),
                ("difficulty".to_string(), "Hard".to_string()),
            ]
        );
    }

    #[test]
    fn shuffled_answers_keep_the_correct_one() {
        for seed in 0..30 {
            let qs = normalize(json!([row()]), seed).unwrap().unwrap();
            let q = &qs[0];
            assert!(q.is_well_formed());
            assert_eq!(q.correct_option(), "ls");
            assert_eq!(q.id, QuestionId("512".into()));
            assert_eq!(q.explanation, "The correct answer is: ls");
            assert_eq!(q.tags.as_deref(), Some(&["Linux".to_string(), "BASH".to_string()][..]));
        }
    }

    #[test]
    fn correct_flags_are_used_when_correct_answer_is_null() {
        let mut q = row();
        q["correct_answer"] = Value::Null;
        let qs = normalize(json!([q]), 1).unwrap().unwrap();
        assert_eq!(qs[0].correct_option(), "ls");
    }

    #[test]
    fn true_false_questions_are_padded() {
        let q = json!({
            "question": "Is ls a command?",
            "answers": { "answer_a": "True", "answer_b": "False" },
            "correct_answer": "answer_a"
        });
        let qs = normalize(json!([q]), 2).unwrap().unwrap();
        assert_eq!(qs[0].options.len(), 4);
        assert_eq!(qs[0].correct_option(), "True");
        assert_eq!(qs[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn unknown_correct_answer_rejects_the_row() {
        let mut q = row();
        q["correct_answer"] = Value::Null;
        q["correct_answers"] = json!({});
        assert!(matches!(
            normalize(json!([q]), 1),
            Err(ProviderError::Rejected(_))
        ));
    }

    #[test]
    fn quota_answers_are_classified() {
        let limited = classify(ProviderError::Status {
            status: 429,
            body: "{}".into(),
        });
        assert!(matches!(limited, ProviderError::QuotaExhausted(_)));

        let worded = classify(ProviderError::Status {
            status: 400,
            body: r#"{"message":"Daily Quota exceeded"}"#.into(),
        });
        assert!(matches!(worded, ProviderError::QuotaExhausted(_)));

        let plain = classify(ProviderError::Status {
            status: 500,
            body: "oops".into(),
        });
        assert!(matches!(plain, ProviderError::Status { status: 500, .. }));

        assert!(matches!(
            normalize(json!({ "error": "Too many requests" }), 0),
            Err(ProviderError::QuotaExhausted(_))
        ));
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(normalize(json!([]), 0).unwrap().is_none());
    }
}
