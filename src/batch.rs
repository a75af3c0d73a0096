//! Batch-level aggregates for dataset building and model evaluation.
//!
//! Nothing here keeps module-level state: every helper returns an explicit
//! aggregate ([`Dataset`], [`PromptPlan`], [`BatchResult`]) owned by the
//! caller.
//!
//! Error policy follows the data: invariant violations in a sample record
//! stop the batch, while undecodable model answers only mark their token
//! invalid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReasoningConfig;
use crate::decoder::{decode_trajectory, DecodeMode};
use crate::error::{ReasoningError, Result};
use crate::math::Point2;
use crate::prompt::{in_context_example, user_message, SystemPrompt};
use crate::reasoning::{assistant_message, detect_hazards, AssistantTarget};
use crate::record::{SampleRecord, SampleStore};
use crate::transcript::{FineTuneExample, TranscriptLine};

/// Counts language-model tokens; supplied by the caller.
pub trait TokenCounter {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

impl<F: Fn(&str) -> usize> TokenCounter for F {
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// Named token splits of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitManifest {
    /// Training tokens, also the pool of worked examples.
    pub train: Vec<String>,
    /// Validation tokens.
    pub val: Vec<String>,
}

/// Token counts per message role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub system: usize,
    pub user: usize,
    pub assistant: usize,
}

impl TokenUsage {
    /// Sum over all roles.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.system + self.user + self.assistant
    }

    fn add(&mut self, counter: &impl TokenCounter, system: &str, user: &str, assistant: &str) {
        self.system += counter.count(system);
        self.user += counter.count(user);
        self.assistant += counter.count(assistant);
    }
}

/// Fine-tuning examples with their token usage.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub examples: Vec<FineTuneExample>,
    pub usage: TokenUsage,
}

fn lookup<'a>(store: &'a SampleStore, token: &str) -> Result<&'a SampleRecord> {
    store
        .get(token)
        .ok_or_else(|| ReasoningError::data_invariant(format!("token {token} not in sample store")))
}

/// Build one chat example per token.
///
/// # Errors
///
/// Fails on the first token that is missing from the store or whose record
/// cannot be described; invariant violations abort the whole build.
pub fn build_finetune_dataset(
    store: &SampleStore,
    tokens: &[String],
    system: SystemPrompt,
    target: AssistantTarget,
    config: &ReasoningConfig,
    counter: &impl TokenCounter,
) -> Result<Dataset> {
    config.validate()?;
    let mut dataset = Dataset::default();
    for token in tokens {
        let record = lookup(store, token)?;
        let user = user_message(record, config);
        let assistant = assistant_message(record, config, target)?;
        let hazards = detect_hazards(record, config).len();
        if hazards > 0 {
            debug!(token = %token, hazards, "sample has notable objects");
        }
        dataset.usage.add(counter, system.text(), &user, &assistant);
        dataset
            .examples
            .push(FineTuneExample::new(system.text(), user, assistant));
    }
    info!(
        examples = dataset.examples.len(),
        system_tokens = dataset.usage.system,
        user_tokens = dataset.usage.user,
        assistant_tokens = dataset.usage.assistant,
        total_tokens = dataset.usage.total(),
        "built fine-tuning dataset"
    );
    Ok(dataset)
}

/// Training tokens used as worked examples for the `query_index`-th query.
///
/// Queries take consecutive, wrapping windows of `count` training tokens.
#[must_use]
pub fn worked_example_tokens(train: &[String], query_index: usize, count: usize) -> Vec<&str> {
    if train.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|i| train[(query_index * count + i) % train.len()].as_str())
        .collect()
}

/// System and user prompt for one query, fitted to the token budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPlan {
    pub system: String,
    pub user: String,
    /// Worked examples kept in the system prompt.
    pub examples_used: usize,
    /// Tokens of system + user as sent.
    pub tokens: usize,
}

/// Compose the prompt for a query with worked examples from `train`.
///
/// The system prompt falls back in three steps until system + user fit
/// `config.context_budget`: the template with every worked example, the
/// bare template, then an empty system prompt. Examples are kept or
/// dropped as a whole.
///
/// # Errors
///
/// Fails if a worked-example token is missing from the store or its record
/// has no usable ground truth.
pub fn plan_in_context_prompt(
    store: &SampleStore,
    query: &SampleRecord,
    train: &[String],
    query_index: usize,
    config: &ReasoningConfig,
    counter: &impl TokenCounter,
) -> Result<PromptPlan> {
    let examples = worked_example_tokens(train, query_index, config.in_context_examples)
        .into_iter()
        .map(|token| in_context_example(lookup(store, token)?, config))
        .collect::<Result<Vec<_>>>()?;

    let user = user_message(query, config);
    let user_tokens = counter.count(&user);
    let base = SystemPrompt::Full.text();

    let ladder = [
        (format!("{base}{}", examples.concat()), examples.len()),
        (base.to_string(), 0),
    ];
    for (system, examples_used) in ladder {
        let tokens = counter.count(&system) + user_tokens;
        if tokens <= config.context_budget {
            if examples_used < examples.len() {
                debug!(
                    token = %query.token,
                    dropped = examples.len(),
                    "worked examples exceed budget; using bare template"
                );
            }
            return Ok(PromptPlan {
                system,
                user,
                examples_used,
                tokens,
            });
        }
    }

    warn!(token = %query.token, user_tokens, "prompt exceeds budget; dropping system prompt");
    Ok(PromptPlan {
        system: String::new(),
        user,
        examples_used: 0,
        tokens: user_tokens,
    })
}

/// Decoded trajectories of a run, plus the tokens that failed to decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    /// Decoded waypoints by token.
    pub trajectories: BTreeMap<String, Vec<Point2>>,
    /// Raw model answers by token, valid or not.
    pub texts: BTreeMap<String, String>,
    /// Tokens whose answer could not be decoded, in processing order.
    pub invalid_tokens: Vec<String>,
}

impl BatchResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one model answer.
    ///
    /// Returns the transcript line to log when the answer decodes, `None`
    /// when the token was marked invalid.
    ///
    /// # Errors
    ///
    /// Only non-recoverable errors are returned; decode failures are not.
    pub fn record_response(
        &mut self,
        token: &str,
        model_output: &str,
        ground_truth: &str,
        mode: DecodeMode,
    ) -> Result<Option<TranscriptLine>> {
        self.texts.insert(token.to_string(), model_output.to_string());
        if !self.accept(token, model_output, mode)? {
            return Ok(None);
        }
        Ok(Some(TranscriptLine {
            token: token.to_string(),
            model_output: model_output.to_string(),
            ground_truth: ground_truth.to_string(),
        }))
    }

    /// Decode a logged run.
    ///
    /// Undecodable answers are collected in `invalid_tokens`.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable decode error.
    pub fn from_transcripts(lines: &[TranscriptLine], mode: DecodeMode) -> Result<Self> {
        let mut result = Self::new();
        for line in lines {
            result
                .texts
                .insert(line.token.clone(), line.model_output.clone());
            result.accept(&line.token, &line.model_output, mode)?;
        }
        info!(
            decoded = result.trajectories.len(),
            invalid = result.invalid_tokens.len(),
            "decoded transcripts"
        );
        Ok(result)
    }

    fn accept(&mut self, token: &str, text: &str, mode: DecodeMode) -> Result<bool> {
        match decode_trajectory(text, mode) {
            Ok(points) => {
                self.trajectories.insert(token.to_string(), points);
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                warn!(token = %token, error = %e, "invalid token");
                self.invalid_tokens.push(token.to_string());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Tokens of `split` with no decoded trajectory, in split order.
    #[must_use]
    pub fn missing_tokens<'a>(&self, split: &'a [String]) -> Vec<&'a str> {
        split
            .iter()
            .filter(|t| !self.trajectories.contains_key(t.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Agent, EgoState, MissionCommand, FUTURE_STEPS, HORIZON};

    fn sample(token: &str, offset: f64) -> SampleRecord {
        let mut future = [Point2::zeros(); HORIZON];
        for (i, p) in future.iter_mut().enumerate() {
            *p = Point2::new(0.0, (2.0 + offset) * i as f64);
        }
        SampleRecord {
            token: token.to_string(),
            objects: vec![Agent {
                name: "vehicle.car".to_string(),
                bbox: [4.0, 9.0, 0.0, 1.9, 4.5, 1.5, 0.0],
                rel_future_offsets: [Point2::new(0.0, 0.5); FUTURE_STEPS],
                future_valid: [true; FUTURE_STEPS],
            }],
            ego: EgoState::new(
                [0.0, 4.0, 0.0, 0.0, 0.0, 4.08, 1.85, 4.0, 0.0],
                vec![Point2::zeros(); 4],
                vec![Point2::new(0.0, 2.0); 4],
                Some(future),
                Some(vec![Point2::new(0.0, 2.0 + offset); FUTURE_STEPS]),
                MissionCommand::Forward,
            )
            .unwrap(),
        }
    }

    fn store(tokens: &[&str]) -> SampleStore {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), sample(t, i as f64 * 0.1)))
            .collect()
    }

    fn words(text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn tokens(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_build_dataset_and_usage() {
        let store = store(&["a", "b"]);
        let dataset = build_finetune_dataset(
            &store,
            &tokens(&["a", "b"]),
            SystemPrompt::Full,
            AssistantTarget::Reasoning,
            &ReasoningConfig::default(),
            &words,
        )
        .unwrap();
        assert_eq!(dataset.examples.len(), 2);
        assert_eq!(dataset.usage.system, 2 * words(SystemPrompt::Full.text()));
        assert_eq!(
            dataset.usage.total(),
            dataset.usage.system + dataset.usage.user + dataset.usage.assistant
        );
        assert!(dataset.examples[0]
            .content(crate::transcript::Role::Assistant)
            .unwrap()
            .starts_with("Thoughts:\n"));
    }

    #[test]
    fn test_single_hazard_is_notable() {
        let mut record = sample("h", 0.0);
        record.objects[0].bbox[0] = 0.5;
        let config = ReasoningConfig::default();
        assert_eq!(detect_hazards(&record, &config).len(), 1);

        // one hazard and no hazard give answers of the same line count
        let with_hazard = assistant_message(&record, &config, AssistantTarget::Reasoning).unwrap();
        record.objects.clear();
        let without = assistant_message(&record, &config, AssistantTarget::Reasoning).unwrap();
        assert_eq!(with_hazard.lines().count(), without.lines().count());

        let store: SampleStore = [("h".to_string(), record)].into_iter().collect();
        let dataset = build_finetune_dataset(
            &store,
            &tokens(&["h"]),
            SystemPrompt::Full,
            AssistantTarget::Reasoning,
            &config,
            &words,
        )
        .unwrap();
        assert_eq!(dataset.examples.len(), 1);
    }

    #[test]
    fn test_build_dataset_missing_token_is_fatal() {
        let store = store(&["a"]);
        let err = build_finetune_dataset(
            &store,
            &tokens(&["a", "zzz"]),
            SystemPrompt::Full,
            AssistantTarget::TrajectoryOnly,
            &ReasoningConfig::default(),
            &words,
        )
        .unwrap_err();
        assert!(matches!(err, ReasoningError::DataInvariant(_)));
    }

    #[test]
    fn test_worked_example_tokens_wrap() {
        let train = tokens(&["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
        assert_eq!(
            worked_example_tokens(&train, 0, 5),
            vec!["t0", "t1", "t2", "t3", "t4"]
        );
        assert_eq!(
            worked_example_tokens(&train, 1, 5),
            vec!["t5", "t6", "t0", "t1", "t2"]
        );
        assert!(worked_example_tokens(&[], 3, 5).is_empty());
    }

    #[test]
    fn test_in_context_plan_fits() {
        let store = store(&["q", "t0", "t1"]);
        let config = ReasoningConfig::default().with_in_context_examples(2);
        let plan = plan_in_context_prompt(
            &store,
            &store["q"],
            &tokens(&["t0", "t1"]),
            0,
            &config,
            &words,
        )
        .unwrap();
        assert_eq!(plan.examples_used, 2);
        assert_eq!(plan.system.matches("For example:").count(), 2);
        assert!(plan.tokens <= config.context_budget);
    }

    #[test]
    fn test_in_context_plan_falls_back_to_bare_template() {
        let store = store(&["q", "t0", "t1"]);
        let train = tokens(&["t0", "t1"]);
        let base = ReasoningConfig::default().with_in_context_examples(2);
        let full = plan_in_context_prompt(&store, &store["q"], &train, 0, &base, &words).unwrap();
        assert_eq!(full.examples_used, 2);

        // room for the template and one worked example still sends none
        let one_example = in_context_example(&store["t0"], &base).unwrap();
        let budget = words(&format!("{}{one_example}", SystemPrompt::Full.text()))
            + words(&full.user);
        assert!(budget < full.tokens);
        let tight = base.clone().with_context_budget(budget);
        let plan = plan_in_context_prompt(&store, &store["q"], &train, 0, &tight, &words).unwrap();
        assert_eq!(plan.examples_used, 0);
        assert_eq!(plan.system, SystemPrompt::Full.text());

        // one token short of the full plan
        let short = base.clone().with_context_budget(full.tokens - 1);
        let plan = plan_in_context_prompt(&store, &store["q"], &train, 0, &short, &words).unwrap();
        assert_eq!(plan.examples_used, 0);
        assert_eq!(plan.system, SystemPrompt::Full.text());

        // not even the template fits
        let tiny = base.with_context_budget(words(&plan.user) + 1);
        let plan = plan_in_context_prompt(&store, &store["q"], &train, 0, &tiny, &words).unwrap();
        assert_eq!(plan.examples_used, 0);
        assert!(plan.system.is_empty());
    }

    #[test]
    fn test_record_response_skips_invalid() {
        let mut result = BatchResult::new();
        let good = "Meta Action: STOP\nTrajectory:\n[(0.00,0.00), (0.00,0.00), (0.00,0.00), \
                    (0.00,0.00), (0.00,0.00), (0.00,0.00)]";
        let line = result
            .record_response("a", good, "gt", DecodeMode::Strict)
            .unwrap();
        assert_eq!(line.unwrap().ground_truth, "gt");

        let line = result
            .record_response("b", "I cannot plan this.", "gt", DecodeMode::Strict)
            .unwrap();
        assert!(line.is_none());

        assert_eq!(result.trajectories.len(), 1);
        assert_eq!(result.texts.len(), 2);
        assert_eq!(result.invalid_tokens, vec!["b".to_string()]);

        let split = tokens(&["a", "b", "c"]);
        assert_eq!(result.missing_tokens(&split), vec!["b", "c"]);
    }

    #[test]
    fn test_from_transcripts_strict_shape() {
        let lines = vec![
            TranscriptLine {
                token: "a".to_string(),
                model_output: "Trajectory:\n[(1.00,2.00), (3.00,4.00)]".to_string(),
                ground_truth: String::new(),
            },
            TranscriptLine {
                token: "b".to_string(),
                model_output: "[(0,1), (0,2), (0,3), (0,4), (0,5), (0,6)]".to_string(),
                ground_truth: String::new(),
            },
        ];
        let strict = BatchResult::from_transcripts(&lines, DecodeMode::Strict).unwrap();
        assert_eq!(strict.invalid_tokens, vec!["a".to_string()]);
        assert_eq!(strict.trajectories["b"].len(), 6);

        let lenient = BatchResult::from_transcripts(&lines, DecodeMode::Lenient).unwrap();
        assert!(lenient.invalid_tokens.is_empty());
    }

    #[test]
    fn test_from_transcripts_collects_unparsable_answers() {
        let lines: Vec<TranscriptLine> = ["I would slow down.", "Trajectory:\n[(0.0, x)]", ""]
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptLine {
                token: format!("t{i}"),
                model_output: (*text).to_string(),
                ground_truth: String::new(),
            })
            .collect();
        let result = BatchResult::from_transcripts(&lines, DecodeMode::Lenient).unwrap();
        assert!(result.trajectories.is_empty());
        assert_eq!(result.texts.len(), 3);
        assert_eq!(result.invalid_tokens, ["t0", "t1", "t2"]);
    }
}
