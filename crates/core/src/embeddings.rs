use crate::error::ModelError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

const CONFIG_FILE: &str = "config.json";
const TERM_WEIGHTS_FILE: &str = "term_weights.json";

/// Maps text to a fixed-dimension vector. The same instance must serve
/// both indexing and querying; vectors from differently configured
/// embedders are not comparable.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
}

fn default_dimensions() -> usize {
    DEFAULT_EMBEDDING_DIMENSIONS
}

fn default_ngram_size() -> usize {
    3
}

fn default_lowercase() -> bool {
    true
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            ngram_size: default_ngram_size(),
            lowercase: default_lowercase(),
        }
    }
}

/// Hashed character-n-gram sentence embedder. The model artifact is a
/// directory holding `config.json` and, optionally, per-term weights
/// learned offline in `term_weights.json`. Embeddings are L2-normalized,
/// so dot product equals cosine similarity.
pub struct SentenceEmbedder {
    config: EmbedderConfig,
    term_weights: HashMap<String, f32>,
}

impl SentenceEmbedder {
    /// Loads the artifact from `model_dir`. Called once at startup; a
    /// missing or invalid artifact is fatal.
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let config_raw = std::fs::read(model_dir.join(CONFIG_FILE))?;
        let config: EmbedderConfig = serde_json::from_slice(&config_raw)?;

        let weights_path = model_dir.join(TERM_WEIGHTS_FILE);
        let term_weights = if weights_path.exists() {
            serde_json::from_slice(&std::fs::read(&weights_path)?)?
        } else {
            HashMap::new()
        };

        Self::from_parts(config, term_weights)
    }

    pub fn from_parts(
        config: EmbedderConfig,
        term_weights: HashMap<String, f32>,
    ) -> Result<Self, ModelError> {
        if config.dimensions == 0 {
            return Err(ModelError::InvalidConfig(
                "dimensions must be positive".to_string(),
            ));
        }
        if config.ngram_size == 0 {
            return Err(ModelError::InvalidConfig(
                "ngram_size must be positive".to_string(),
            ));
        }

        Ok(Self {
            config,
            term_weights,
        })
    }
}

impl Embedder for SentenceEmbedder {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.config.dimensions];
        let prepared = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        for word in prepared.split_whitespace() {
            let weight = self.term_weights.get(word).copied().unwrap_or(1.0);
            let chars: Vec<char> = word.chars().collect();

            if chars.len() < self.config.ngram_size {
                let bucket = (fnv_hash(word) % vector.len() as u64) as usize;
                vector[bucket] += weight;
                continue;
            }

            for window in chars.windows(self.config.ngram_size) {
                let token = window.iter().collect::<String>();
                let bucket = (fnv_hash(&token) % vector.len() as u64) as usize;
                vector[bucket] += weight;
            }
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

fn fnv_hash(token: &str) -> u64 {
    let mut hash = 1469598103934665603u64;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
