/*!
 * Core translation service implementation.
 *
 * `TranslationService` owns everything needed to turn documents into
 * translated documents: the segmenter, the subword tokenizer, the batch
 * translator and its search parameters. It is built once at startup and
 * shared by every request.
 */

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{EngineBackend, TranslatorConfig};
use crate::errors::ServiceError;
use crate::file_utils::find_engine_model;

use super::batch::{BatchTranslator, DeviceState};
use super::engine::{Device, EngineLoader, PassthroughLoader, SearchParams, TranslationUnit};
use super::formatting::TextCleaner;
use super::reassembler::reassemble;
use super::segmenter::{RuleBasedDetector, Segment, SentenceSegmenter};
use super::tokenizer::{SubwordModel, SubwordTokenizer};

/// Engine loader for a configured backend
pub fn loader_for(backend: EngineBackend) -> Arc<dyn EngineLoader> {
    match backend {
        EngineBackend::Passthrough => Arc::new(PassthroughLoader),
    }
}

/// Document translation service
pub struct TranslationService {
    segmenter: SentenceSegmenter,
    tokenizer: Arc<dyn SubwordModel>,
    translator: BatchTranslator,
    params: SearchParams,
}

impl TranslationService {
    /// Assemble a service from already-loaded parts
    pub fn new(
        segmenter: SentenceSegmenter,
        tokenizer: Arc<dyn SubwordModel>,
        translator: BatchTranslator,
        params: SearchParams,
    ) -> Self {
        Self {
            segmenter,
            tokenizer,
            translator,
            params,
        }
    }

    /// Load tokenizer and engine from the configured model directory.
    ///
    /// The engine is tried on the preferred device first; when that fails it
    /// is loaded on the fallback device and the service starts in the
    /// `Fallback` state. This call blocks.
    pub fn load(config: &TranslatorConfig, loader: Arc<dyn EngineLoader>) -> Result<Self> {
        let started = Instant::now();
        let model_dir = &config.model_dir;

        if config.backend == EngineBackend::Passthrough {
            if let Some(weights) = find_engine_model(model_dir) {
                return Err(anyhow!(
                    "{} holds translation model weights but the configured backend is passthrough, \
                     which would echo input untranslated",
                    weights.display()
                ));
            }
            warn!("Translation backend is passthrough: text is returned untranslated");
        }

        let tokenizer = SubwordTokenizer::load(model_dir)
            .context(format!("Failed to load tokenizer from {}", model_dir.display()))?;

        let (engine, state) = match loader.load(model_dir, config.device) {
            Ok(engine) => (engine, DeviceState::Primary),
            Err(e) => {
                warn!(
                    "Could not load translation engine on {} ({}), trying {}",
                    config.device, e, config.fallback_device
                );
                let engine = loader
                    .load(model_dir, config.fallback_device)
                    .context(format!("Failed to load translation engine on {}", config.fallback_device))?;
                (engine, DeviceState::Fallback)
            }
        };

        let translator = BatchTranslator::new(engine, loader, model_dir.clone(), config.fallback_device)
            .with_state(state);
        info!(
            "Translation engine loaded on {} in {:.2}s",
            translator.device(),
            started.elapsed().as_secs_f64()
        );

        let segmenter = SentenceSegmenter::new(Box::new(RuleBasedDetector::new()), config.min_fragment_chars);
        Ok(Self::new(segmenter, Arc::new(tokenizer), translator, config.search.clone()))
    }

    /// Run one cheap translation so the first request does not pay initialization costs
    pub async fn warm_up(&self, text: &str) -> Result<(), ServiceError> {
        let started = Instant::now();
        let params = self.params.with_beam_size(1);
        self.translate_with(&[text.to_string()], &params).await?;
        info!("Translation warm-up done in {:.2}s", started.elapsed().as_secs_f64());
        Ok(())
    }

    /// Translate documents, returning one string per input document in the same order
    pub async fn translate_documents(&self, documents: &[String]) -> Result<Vec<String>, ServiceError> {
        self.translate_with(documents, &self.params).await
    }

    /// Translate a single document
    pub async fn translate_text(&self, text: &str) -> Result<String, ServiceError> {
        let mut translated = self.translate_documents(&[text.to_string()]).await?;
        Ok(translated.pop().unwrap_or_default())
    }

    async fn translate_with(&self, documents: &[String], params: &SearchParams) -> Result<Vec<String>, ServiceError> {
        let segments = self.segmenter.segment(documents);
        if segments.is_empty() {
            return Ok(vec![String::new(); documents.len()]);
        }

        let texts: Vec<String> = segments.iter().map(|segment| segment.text.clone()).collect();
        let tokenizer = self.tokenizer.clone();
        let units = on_worker(move || {
            texts
                .iter()
                .map(|text| tokenizer.encode(text))
                .collect::<Result<Vec<TranslationUnit>, _>>()
        })
        .await??;

        let hypotheses = self.translator.translate(&units, params).await?;

        let tokenizer = self.tokenizer.clone();
        let texts = on_worker(move || {
            hypotheses
                .iter()
                .map(|hypothesis| TextCleaner::detokenize(tokenizer.as_ref(), &hypothesis.tokens))
                .collect::<Vec<String>>()
        })
        .await?;

        let translated: Vec<Segment> = segments
            .into_iter()
            .zip(texts)
            .map(|(segment, text)| Segment { text, ..segment })
            .collect();

        Ok(reassemble(&translated, documents.len()))
    }

    /// Fallback state of the underlying translator
    pub fn device_state(&self) -> DeviceState {
        self.translator.state()
    }

    /// Device of the engine currently in use
    pub fn device(&self) -> Device {
        self.translator.device()
    }
}

/// Run CPU-bound tokenizer work on the blocking pool
async fn on_worker<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("tokenizer task aborted: {}", e)))
}
