//! Two-stage sentiment classification.
//!
//! The neural model runs first on the translated text. When it has nothing
//! to say about a text it returns [`NeuralOutcome::NeedsFallback`] and the
//! lexicon scorer decides instead. Results always carry the original,
//! untranslated text.

pub mod lexicon;
pub mod neural;

use rayon::prelude::*;

use crate::error::{check_username, AnalysisError, Result};
use crate::models::{Polarity, SentimentResult, TimedRecord};

pub use lexicon::{Lexicon, PolarityScores};
pub use neural::{ModelHandle, NeuralModel};

/// Fields of a text record: `(id, translated_text, original_text)`.
pub const TEXT_FIELDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeuralOutcome {
    Label { label: Polarity, score: f64 },
    NeedsFallback,
}

/// First stage of the pipeline. Implementations may abstain.
pub trait NeuralClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Result<NeuralOutcome>;
}

pub fn classify<N>(
    username: &str,
    texts: &[TimedRecord],
    neural: &N,
    lexicon: &Lexicon,
) -> Result<Vec<SentimentResult>>
where
    N: NeuralClassifier + ?Sized,
{
    check_username(username)?;
    if texts.is_empty() {
        return Err(AnalysisError::EmptyInput("classify"));
    }
    if let Some((index, record)) = texts
        .iter()
        .enumerate()
        .find(|(_, record)| record.len() != TEXT_FIELDS)
    {
        return Err(AnalysisError::TextShape {
            index,
            found: record.len(),
        });
    }

    texts
        .par_iter()
        .map(|record| {
            let (sentiment, degree) = classify_text(&record[1], neural, lexicon)?;
            Ok(SentimentResult {
                original_text: record[2].clone(),
                sentiment,
                degree,
            })
        })
        .collect()
}

pub fn classify_text<N>(translated: &str, neural: &N, lexicon: &Lexicon) -> Result<(Polarity, f64)>
where
    N: NeuralClassifier + ?Sized,
{
    match neural.predict(translated)? {
        NeuralOutcome::Label { label, score } => Ok((label, score)),
        NeuralOutcome::NeedsFallback => Ok(lexicon.scores(translated).dominant()),
    }
}
