use crate::error::{GenerationError, ModelError};
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_SAMPLING_TOP_K: usize = 50;

/// Free-form completion from a raw prompt. No retrieved context is
/// injected; the prompt is used verbatim.
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        max_new_tokens: usize,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct LanguageModelFile {
    #[serde(default = "default_sampling_top_k")]
    sampling_top_k: usize,
    transitions: HashMap<String, HashMap<String, f32>>,
    #[serde(default)]
    start_tokens: HashMap<String, f32>,
}

fn default_sampling_top_k() -> usize {
    DEFAULT_SAMPLING_TOP_K
}

/// Causal token-transition model. Weights are a local JSON artifact
/// mapping a context token to weighted continuations; decoding walks
/// the transitions with temperature scaling and top-k truncation.
pub struct NgramLanguageModel {
    sampling_top_k: usize,
    transitions: HashMap<String, Vec<(String, f32)>>,
    start_tokens: Vec<(String, f32)>,
}

impl NgramLanguageModel {
    /// Loads the weights file. Called once at startup; a missing or
    /// invalid artifact is fatal.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read(path)?;
        let file: LanguageModelFile = serde_json::from_slice(&raw)?;
        Self::from_file(file)
    }

    fn from_file(file: LanguageModelFile) -> Result<Self, ModelError> {
        if file.sampling_top_k == 0 {
            return Err(ModelError::InvalidConfig(
                "sampling_top_k must be positive".to_string(),
            ));
        }
        if file.transitions.is_empty() {
            return Err(ModelError::InvalidConfig(
                "transitions table is empty".to_string(),
            ));
        }

        let mut transitions = HashMap::with_capacity(file.transitions.len());
        for (context, continuations) in file.transitions {
            transitions.insert(context, sorted_candidates(continuations)?);
        }

        Ok(Self {
            sampling_top_k: file.sampling_top_k,
            transitions,
            start_tokens: sorted_candidates(file.start_tokens)?,
        })
    }

    fn sample(&self, candidates: &[(String, f32)], temperature: f32) -> Option<String> {
        let pool = &candidates[..candidates.len().min(self.sampling_top_k)];
        let (greedy, max_weight) = pool.first()?;

        if temperature <= f32::EPSILON {
            return Some(greedy.clone());
        }

        let scaled: Vec<f32> = pool
            .iter()
            .map(|(_, weight)| (weight / max_weight).powf(1.0 / temperature))
            .collect();
        let total: f32 = scaled.iter().sum();

        let mut rng = rand::rng();
        let mut draw: f32 = rng.random::<f32>() * total;
        for ((token, _), weight) in pool.iter().zip(scaled.iter()) {
            draw -= weight;
            if draw <= 0.0 {
                return Some(token.clone());
            }
        }

        Some(greedy.clone())
    }
}

impl TextGenerator for NgramLanguageModel {
    fn generate(
        &self,
        prompt: &str,
        max_new_tokens: usize,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let mut context = prompt
            .split_whitespace()
            .last()
            .map(normalize_token)
            .ok_or(GenerationError::EmptyPrompt)?;

        let mut generated: Vec<String> = Vec::new();
        while generated.len() < max_new_tokens {
            let candidates = match self.transitions.get(&context) {
                Some(candidates) if !candidates.is_empty() => candidates,
                _ if generated.is_empty() && !self.start_tokens.is_empty() => &self.start_tokens,
                _ => break,
            };

            let Some(token) = self.sample(candidates, temperature) else {
                break;
            };
            context = normalize_token(&token);
            generated.push(token);
        }

        if generated.is_empty() {
            return Err(GenerationError::NoContinuation(prompt.to_string()));
        }

        Ok(generated.join(" "))
    }
}

fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn sorted_candidates(
    weighted: HashMap<String, f32>,
) -> Result<Vec<(String, f32)>, ModelError> {
    for (token, weight) in &weighted {
        if !weight.is_finite() || *weight <= 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "weight for token {token:?} must be a positive finite number"
            )));
        }
    }

    let mut candidates: Vec<(String, f32)> = weighted.into_iter().collect();
    // Descending weight, token as tie-breaker so the order is stable.
    candidates.sort_by(|left, right| {
        right
            .1
            .total_cmp(&left.1)
            .then_with(|| left.0.cmp(&right.0))
    });
    Ok(candidates)
}
