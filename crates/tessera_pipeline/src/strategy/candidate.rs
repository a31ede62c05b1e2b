//! Candidate strategy: parallel generations and an automated judge.

use super::{
    Generated, GenerationRequest, GenerationStrategy, StandardStrategy, failure_message,
};
use crate::extraction::parse_structured;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tessera_core::{ContentPart, GenerationResult, Message, Role};
use tessera_error::{GenerationError, GenerationErrorKind, TesseraResult};
use tessera_interface::PromptOptions;

const DEFAULT_JUDGE_INSTRUCTIONS: &str = "You are an impartial judge. Compare the candidate \
responses to the user's request and pick the one that fulfils it best.";

/// Judge model and instructions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JudgeSettings {
    /// Options for the judge call
    pub options: PromptOptions,
    /// Custom judge instructions
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JudgeDecision {
    best_candidate_index: usize,
    #[serde(default)]
    reason: String,
}

fn judge_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "best_candidate_index": {"type": "integer", "minimum": 0},
            "reason": {"type": "string"}
        },
        "required": ["best_candidate_index", "reason"],
        "additionalProperties": false
    })
}

/// Runs `count` standard generations concurrently and keeps the best.
///
/// Failed candidates are tolerated as long as one succeeds. With more than one
/// success and a judge configured, the judge picks the winner; otherwise, and
/// whenever the judge fails, the first successful candidate wins. The winner's
/// candidate file is copied to the final output path and post-processed once.
#[derive(Debug, Clone)]
pub struct CandidateStrategy {
    standard: StandardStrategy,
    count: usize,
    judge: Option<JudgeSettings>,
}

impl CandidateStrategy {
    /// Create a strategy producing `count` candidates.
    pub fn new(standard: StandardStrategy, count: usize) -> Self {
        Self {
            standard,
            count: count.max(1),
            judge: None,
        }
    }

    /// Select winners with a judge.
    pub fn with_judge(mut self, judge: JudgeSettings) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Number of candidates per generation.
    pub fn count(&self) -> usize {
        self.count
    }

    async fn select(&self, request: &GenerationRequest, successes: &[(usize, Generated)]) -> usize {
        let Some(judge) = &self.judge else {
            return 0;
        };
        if successes.len() < 2 {
            return 0;
        }

        match self.ask_judge(request, successes, judge).await {
            Ok(decision) if decision.best_candidate_index < successes.len() => {
                tracing::info!(
                    winner = decision.best_candidate_index,
                    candidate = successes[decision.best_candidate_index].0,
                    reason = %decision.reason,
                    "Judge selected a candidate"
                );
                decision.best_candidate_index
            }
            Ok(decision) => {
                tracing::warn!(
                    index = decision.best_candidate_index,
                    candidates = successes.len(),
                    "Judge picked an out-of-range candidate; using the first"
                );
                0
            }
            Err(e) => {
                tracing::warn!(error = %e, "Judge failed; using the first candidate");
                0
            }
        }
    }

    async fn ask_judge(
        &self,
        request: &GenerationRequest,
        successes: &[(usize, Generated)],
        judge: &JudgeSettings,
    ) -> TesseraResult<JudgeDecision> {
        let instructions = judge
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_JUDGE_INSTRUCTIONS.to_string());

        let mut messages = vec![Message::system(instructions)];
        messages.extend(request.non_system_history().cloned());
        messages.push(request.user_turn().clone());

        let mut parts = vec![ContentPart::Text(format!(
            "There are {} candidate responses to the request above.",
            successes.len()
        ))];
        for (position, (_, generated)) in successes.iter().enumerate() {
            parts.push(ContentPart::Text(format!("Candidate {}:", position)));
            parts.push(generated.artifact.as_content_part());
        }
        parts.push(ContentPart::Text(format!(
            "Choose the best candidate. Respond with JSON: {{\"best_candidate_index\": <0-{}>, \"reason\": \"<why>\"}}",
            successes.len() - 1
        )));
        messages.push(Message {
            role: Role::User,
            content: parts,
        });

        let options = judge
            .options
            .clone()
            .with_cache_salt(format!("{}_judge", request.cache_salt()));

        let value = self
            .standard
            .services()
            .client
            .prompt_structured(&messages, &judge_schema(), &options)
            .await?;
        let value = parse_structured(value)?;

        serde_json::from_value(value).map_err(|e| {
            GenerationError::new(GenerationErrorKind::Judge(format!(
                "unusable decision: {}",
                e
            )))
            .into()
        })
    }
}

#[async_trait]
impl GenerationStrategy for CandidateStrategy {
    #[tracing::instrument(skip_all, fields(salt = %request.cache_salt(), candidates = self.count))]
    async fn generate(&self, request: &GenerationRequest) -> TesseraResult<GenerationResult> {
        let runs = (0..self.count).map(|index| {
            let candidate = request.for_candidate(index);
            async move { (index, self.standard.produce(&candidate).await) }
        });

        let mut successes = Vec::new();
        let mut errors = Vec::new();
        for (index, outcome) in join_all(runs).await {
            match outcome {
                Ok(generated) => successes.push((index, generated)),
                Err(e) => {
                    tracing::warn!(candidate = index, error = %e, "Candidate failed");
                    errors.push(format!("candidate {}: {}", index, failure_message(&e)));
                }
            }
        }

        if successes.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::CandidatesExhausted {
                count: self.count,
                errors: errors.join("; "),
            })
            .into());
        }

        tracing::debug!(
            succeeded = successes.len(),
            failed = errors.len(),
            "Candidates settled"
        );

        let position = self.select(request, &successes).await;
        let (index, winner) = successes.swap_remove(position);

        let persisted = match (request.output_path(), &winner.persisted) {
            (Some(final_path), Some(candidate_file)) => {
                self.standard
                    .services()
                    .store
                    .copy(candidate_file, final_path)
                    .await?;
                tracing::debug!(candidate = index, path = %final_path.display(), "Winner promoted");
                Some(final_path.clone())
            }
            (_, persisted) => persisted.clone(),
        };

        if let Some(command) = request.post_process_command() {
            self.standard
                .post_process(command, &winner.artifact, persisted.as_deref())
                .await;
        }

        Ok(winner.result_at(persisted.as_deref()))
    }

    fn name(&self) -> &'static str {
        "candidate"
    }
}
