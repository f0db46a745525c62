use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::info;

use super::{NeuralClassifier, NeuralOutcome};
use crate::error::{AnalysisError, Result};
use crate::models::Polarity;

#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayer {
    /// Row-major `[outputs][inputs]`.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect()
    }

    fn check(&self, name: &str, inputs: usize) -> std::result::Result<(), String> {
        if self.weights.is_empty() {
            return Err(format!("{name} layer has no units"));
        }
        if self.weights.len() != self.bias.len() {
            return Err(format!(
                "{name} layer has {} rows but {} biases",
                self.weights.len(),
                self.bias.len()
            ));
        }
        if self.weights.iter().any(|row| row.len() != inputs) {
            return Err(format!("{name} layer rows must have {inputs} inputs"));
        }
        Ok(())
    }
}

/// Mean-pooled word embeddings followed by a tanh hidden layer and a softmax
/// output over binary polarity labels.
#[derive(Debug, Clone, Deserialize)]
pub struct NeuralModel {
    #[serde(default)]
    pub version: String,
    pub labels: Vec<String>,
    pub vocabulary: HashMap<String, usize>,
    pub embeddings: Vec<Vec<f32>>,
    pub hidden: DenseLayer,
    pub output: DenseLayer,
    #[serde(skip)]
    polarities: Vec<Polarity>,
}

impl NeuralModel {
    pub fn load(path: &Path) -> Result<Self> {
        let started = Instant::now();
        let raw = std::fs::read_to_string(path).map_err(|source| AnalysisError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&raw).map_err(|reason| AnalysisError::ModelFormat {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(
            path = %path.display(),
            version = %model.version,
            vocabulary = model.vocabulary.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sentiment model loaded"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, String> {
        let mut model: NeuralModel = serde_json::from_str(raw).map_err(|err| err.to_string())?;
        model.validate()?;
        model.polarities = model
            .labels
            .iter()
            .map(|label| label_polarity(label).map_err(|err| err.to_string()))
            .collect::<std::result::Result<Vec<Polarity>, String>>()?;
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.labels.is_empty() {
            return Err("model declares no labels".to_string());
        }
        let dim = self
            .embeddings
            .first()
            .map(Vec::len)
            .ok_or_else(|| "model has no embeddings".to_string())?;
        if self.embeddings.iter().any(|row| row.len() != dim) {
            return Err(format!("embedding rows must all have {dim} values"));
        }
        if let Some((word, index)) = self
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= self.embeddings.len())
        {
            return Err(format!("token {word:?} points at missing embedding {index}"));
        }

        self.hidden.check("hidden", dim)?;
        self.output.check("output", self.hidden.weights.len())?;
        if self.output.weights.len() != self.labels.len() {
            return Err(format!(
                "output layer has {} units for {} labels",
                self.output.weights.len(),
                self.labels.len()
            ));
        }
        Ok(())
    }

    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let dim = self.embeddings[0].len();
        let mut pooled = vec![0.0f32; dim];
        let mut known = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            if let Some(index) = self.vocabulary.get(&token.to_lowercase()) {
                for (slot, value) in pooled.iter_mut().zip(&self.embeddings[*index]) {
                    *slot += value;
                }
                known += 1;
            }
        }

        if known == 0 {
            return None;
        }
        pooled.iter_mut().for_each(|slot| *slot /= known as f32);
        Some(pooled)
    }
}

impl NeuralClassifier for NeuralModel {
    fn predict(&self, text: &str) -> Result<NeuralOutcome> {
        let Some(pooled) = self.embed(text) else {
            return Ok(NeuralOutcome::NeedsFallback);
        };

        let hidden: Vec<f32> = self.hidden.forward(&pooled).into_iter().map(f32::tanh).collect();
        let probabilities = softmax(&self.output.forward(&hidden));

        let (index, score) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });

        Ok(NeuralOutcome::Label {
            label: self.polarities[index],
            score: score as f64,
        })
    }
}

/// Map a model label such as `POSITIVE` or `neg` onto the binary polarity.
pub fn label_polarity(label: &str) -> Result<Polarity> {
    let lowered = label.to_lowercase();
    if lowered.starts_with("pos") {
        Ok(Polarity::Positive)
    } else if lowered.starts_with("neg") {
        Ok(Polarity::Negative)
    } else {
        Err(AnalysisError::UnknownLabel(label.to_string()))
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|value| value / total).collect()
}

/// Lazily loads the neural model on first use and hands out the shared
/// instance afterwards. Concurrent first calls block on a single load.
#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    model: OnceCell<NeuralModel>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn get(&self) -> Result<&NeuralModel> {
        self.model.get_or_try_init(|| NeuralModel::load(&self.path))
    }
}
