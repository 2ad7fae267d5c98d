/*!
 * Translation engine capability.
 *
 * The beam-search engine itself is an external collaborator. This module
 * defines what the rest of the service needs from it: a batch translate
 * operation over tokenized units, and a loader able to bind a fresh engine
 * instance to a given compute device.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::errors::EngineError;

/// Tokenized form of one segment
pub type TranslationUnit = Vec<String>;

/// Compute device an engine instance is bound to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Accelerator when available, CPU otherwise
    #[default]
    Auto,
    /// CPU only
    Cpu,
    /// CUDA accelerator
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        };
        write!(f, "{}", name)
    }
}

/// Beam search parameters passed to every batch invocation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchParams {
    /// Beam width
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,

    /// Stop once this many beams have finished
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Maximum decoded length in tokens
    #[serde(default = "default_max_decoding_length")]
    pub max_decoding_length: usize,

    /// Maximum number of units per engine call
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default = "default_length_penalty")]
    pub length_penalty: f32,

    #[serde(default)]
    pub coverage_penalty: f32,

    /// Never generate the unknown token
    #[serde(default = "default_true")]
    pub disable_unk: bool,

    /// Replace unknown tokens with the most attended source token
    #[serde(default)]
    pub replace_unknowns: bool,

    /// Token forced at the start of every hypothesis (multilingual models)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            beam_size: default_beam_size(),
            patience: default_patience(),
            max_decoding_length: default_max_decoding_length(),
            max_batch_size: default_max_batch_size(),
            length_penalty: default_length_penalty(),
            coverage_penalty: 0.0,
            disable_unk: true,
            replace_unknowns: false,
            target_prefix: None,
        }
    }
}

impl SearchParams {
    /// Same parameters with a different beam width
    pub fn with_beam_size(&self, beam_size: usize) -> Self {
        Self {
            beam_size,
            ..self.clone()
        }
    }
}

fn default_beam_size() -> usize {
    5
}

fn default_patience() -> usize {
    1
}

fn default_max_decoding_length() -> usize {
    256
}

fn default_max_batch_size() -> usize {
    32
}

fn default_length_penalty() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Best-scoring output for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Output pieces
    pub tokens: Vec<String>,
    /// Model score, when the engine reports one
    pub score: Option<f32>,
}

impl Hypothesis {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens, score: None }
    }
}

/// A loaded translation engine bound to one device
pub trait TranslationEngine: Send + Sync {
    /// Device this instance runs on
    fn device(&self) -> Device;

    /// Translate a batch of units. The result must be index-aligned with `batch`.
    fn translate_batch(
        &self,
        batch: &[TranslationUnit],
        params: &SearchParams,
    ) -> Result<Vec<Hypothesis>, EngineError>;
}

/// Constructs engine instances from a model directory
pub trait EngineLoader: Send + Sync {
    fn load(&self, model_dir: &Path, device: Device) -> Result<Arc<dyn TranslationEngine>, EngineError>;
}

/// Identity engine: the hypothesis for every unit is the unit itself.
/// Useful for staging deployments without model weights.
#[derive(Debug)]
pub struct PassthroughEngine {
    device: Device,
}

impl PassthroughEngine {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl TranslationEngine for PassthroughEngine {
    fn device(&self) -> Device {
        self.device
    }

    fn translate_batch(
        &self,
        batch: &[TranslationUnit],
        params: &SearchParams,
    ) -> Result<Vec<Hypothesis>, EngineError> {
        Ok(batch
            .iter()
            .map(|unit| {
                let limit = params.max_decoding_length.max(1);
                Hypothesis::new(unit.iter().take(limit).cloned().collect())
            })
            .collect())
    }
}

/// Loader for [`PassthroughEngine`]
#[derive(Debug, Default)]
pub struct PassthroughLoader;

impl EngineLoader for PassthroughLoader {
    fn load(&self, _model_dir: &Path, device: Device) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        Ok(Arc::new(PassthroughEngine::new(device)))
    }
}
