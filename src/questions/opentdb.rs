// src/questions/opentdb.rs

//! Open Trivia DB: free, HTML-escaped, and general-knowledge leaning.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::questions::{
    fit_options, shuffle_with_answer, IdSequence, Question, QuestionRequest,
};
use crate::util::unescape_html;

const CATEGORY_MATHEMATICS: &str = "19";
const CATEGORY_GENERAL: &str = "9";

pub struct OpenTdb {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl OpenTdb {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
        }
    }

    /// Multiple-choice only; `category` is left out unless it maps.
    fn request(&self, req: &QuestionRequest) -> reqwest::RequestBuilder {
        let amount = req.amount.to_string();
        let mut query = vec![
            ("amount", amount.as_str()),
            ("difficulty", upstream_difficulty(&req.difficulty)),
            ("type", "multiple"),
        ];
        if let (Some(id), _) = category_for(&req.category) {
            query.push(("category", id));
        }

        self.client.get(&self.url).query(&query)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response_code: i64,
    #[serde(default)]
    results: Vec<Trivia>,
}

#[derive(Debug, Deserialize)]
struct Trivia {
    question: String,
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

/// Upstream category id and the label our questions carry for it.
fn category_for(category: &str) -> (Option<&'static str>, &'static str) {
    match category.trim().to_ascii_lowercase().as_str() {
        "quantitative" => (Some(CATEGORY_MATHEMATICS), "Quantitative Aptitude"),
        "logical" => (Some(CATEGORY_GENERAL), "Logical Reasoning"),
        _ => (None, "General Knowledge"),
    }
}

fn upstream_difficulty(difficulty: &str) -> &'static str {
    match difficulty.trim().to_ascii_lowercase().as_str() {
        "easy" => "easy",
        "hard" => "hard",
        _ => "medium",
    }
}

#[async_trait]
impl Provider for OpenTdb {
    type Request = QuestionRequest;
    type Output = Vec<Question>;

    fn name(&self) -> &'static str {
        "opentdb"
    }

    async fn fetch(&self, req: &QuestionRequest) -> Result<Option<Value>, ProviderError> {
        send_json(self.request(req), self.timeout).await.map(Some)
    }

    fn normalize(
        &self,
        raw: Value,
        req: &QuestionRequest,
        rng: &mut fastrand::Rng,
    ) -> Result<Option<Vec<Question>>, ProviderError> {
        let envelope: Envelope =
            serde_json::from_value(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        // 1 no results, 2 invalid parameter, 3/4 token trouble, 5 rate limit
        if envelope.response_code != 0 {
            tracing::debug!(code = envelope.response_code, "opentdb returned no usable results");
            return Ok(None);
        }
        if envelope.results.is_empty() {
            return Ok(None);
        }

        let (_, label) = category_for(&req.category);
        let ids = IdSequence::new(self.name(), rng);

        let questions = envelope
            .results
            .into_iter()
            .take(req.amount)
            .enumerate()
            .map(|(i, t)| {
                let correct_text = unescape_html(&t.correct_answer);
                let mut options: Vec<String> =
                    t.incorrect_answers.iter().map(|a| unescape_html(a)).collect();
                let correct = options.len();
                options.push(correct_text.clone());

                let (options, correct) = fit_options(options, correct);
                let (options, correct_answer) = shuffle_with_answer(options, correct, rng);

                Question {
                    id: ids.id(i),
                    title: format!("Question {}", i + 1),
                    question: unescape_html(&t.question),
                    options,
                    correct_answer,
                    explanation: format!("The correct answer is: {}", correct_text),
                    category: label.to_string(),
                    tags: None,
                }
            })
            .collect();

        Ok(Some(questions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuestionsConfig;
    use serde_json::json;

    fn normalize(raw: Value, category: &str, seed: u64) -> Option<Vec<Question>> {
        let provider = OpenTdb::new(reqwest::Client::new(), &QuestionsConfig::default().opentdb);
        let req = QuestionRequest {
            amount: 10,
            category: category.into(),
            difficulty: "medium".into(),
        };
        provider
            .normalize(raw, &req, &mut fastrand::Rng::with_seed(seed))
            .unwrap()
    }

    fn payload() -> Value {
        json!({
            "response_code": 0,
            "results": [{
                "type": "multiple",
                "difficulty": "medium",
                "category": "Science: Computers",
                "question": "What does &quot;CPU&quot; stand for?",
                "correct_answer": "Central Processing Unit",
                "incorrect_answers": ["Computer Personal Unit", "Central Process Unit", "Core &amp; Power Unit"]
            }]
        })
    }

    #[test]
    fn category_mapping() {
        assert_eq!(category_for("quantitative"), (Some("19"), "Quantitative Aptitude"));
        assert_eq!(category_for("Logical"), (Some("9"), "Logical Reasoning"));
        assert_eq!(category_for("all"), (None, "General Knowledge"));
        assert_eq!(upstream_difficulty("HARD"), "hard");
        assert_eq!(upstream_difficulty(""), "medium");
    }

    fn query_for(category: &str) -> Vec<(String, String)> {
        let provider = OpenTdb::new(reqwest::Client::new(), &QuestionsConfig::default().opentdb);
        let req = QuestionRequest {
            amount: 4,
            category: category.into(),
            difficulty: "easy".into(),
        };
        let built = provider.request(&req).build().unwrap();
        built.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn request_asks_for_multiple_choice_and_maps_the_category() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());

        assert_eq!(
            query_for("all"),
            vec![pair("amount", "4"), pair("difficulty", "easy"), pair("type", "multiple")]
        );
        assert_eq!(
            query_for("quantitative"),
            vec![
                pair("amount", "4"),
                pair("difficulty", "easy"),
                pair("type", "multiple"),
                pair("category", "19"),
            ]
        );
    }

    #[test]
    fn entities_are_decoded_and_the_answer_tracked() {
        for seed in 0..20 {
            let qs = normalize(payload(), "quantitative", seed).unwrap();
            let q = &qs[0];
            assert!(q.is_well_formed());
            assert_eq!(q.question, "What does \"CPU\" stand for?");
            assert_eq!(q.correct_option(), "Central Processing Unit");
            assert!(q.options.iter().any(|o| o == "Core & Power Unit"));
            assert_eq!(q.title, "Question 1");
            assert_eq!(q.category, "Quantitative Aptitude");
            assert_eq!(q.explanation, "The correct answer is: Central Processing Unit");
        }
    }

    #[test]
    fn non_zero_response_code_is_empty() {
        let raw = json!({ "response_code": 1, "results": [] });
        assert!(normalize(raw, "all", 0).is_none());
        let raw = json!({ "response_code": 0, "results": [] });
        assert!(normalize(raw, "all", 0).is_none());
    }

    #[test]
    fn missing_envelope_is_malformed() {
        let provider = OpenTdb::new(reqwest::Client::new(), &QuestionsConfig::default().opentdb);
        let req = QuestionRequest {
            amount: 1,
            category: "all".into(),
            difficulty: "easy".into(),
        };
        let err = provider
            .normalize(json!({ "oops": true }), &req, &mut fastrand::Rng::with_seed(0))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
