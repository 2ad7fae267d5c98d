/*!
 * Batched invocation of the translation engine.
 *
 * Units are grouped into batches of at most `max_batch_size` and handed to
 * the engine on the blocking worker pool, so beam search never stalls the
 * request loop. A resource failure on the preferred device triggers a
 * switch to the fallback device:
 *
 * - `Primary`: running on the configured device
 * - `FallingBack`: a fallback engine is being built, or the last attempt
 *   failed; the next resource failure tries to build it again
 * - `Fallback`: the fallback engine is published and used by every caller
 *
 * Construction of the fallback engine happens under a dedicated lock, so
 * concurrent callers that hit the same failure wait for the first one and
 * reuse whatever it published. Each failing call makes at most one attempt.
 */

use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::{EngineError, ServiceError};

use super::engine::{Device, EngineLoader, Hypothesis, SearchParams, TranslationEngine, TranslationUnit};

/// Device fallback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Primary,
    FallingBack,
    Fallback,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::Primary => "primary",
            DeviceState::FallingBack => "falling_back",
            DeviceState::Fallback => "fallback",
        };
        write!(f, "{}", name)
    }
}

/// Currently published engine
struct EngineSlot {
    engine: Arc<dyn TranslationEngine>,
    /// Bumped every time a new engine is published
    generation: u64,
    state: DeviceState,
}

/// Batch translator with single-switch device fallback
pub struct BatchTranslator {
    slot: RwLock<EngineSlot>,

    /// Serializes fallback construction
    fallback_lock: Mutex<()>,

    loader: Arc<dyn EngineLoader>,

    model_dir: PathBuf,

    fallback_device: Device,
}

impl BatchTranslator {
    /// Create a translator around an engine loaded on the preferred device
    pub fn new(
        engine: Arc<dyn TranslationEngine>,
        loader: Arc<dyn EngineLoader>,
        model_dir: impl Into<PathBuf>,
        fallback_device: Device,
    ) -> Self {
        Self {
            slot: RwLock::new(EngineSlot {
                engine,
                generation: 0,
                state: DeviceState::Primary,
            }),
            fallback_lock: Mutex::new(()),
            loader,
            model_dir: model_dir.into(),
            fallback_device,
        }
    }

    /// Start in a given state, e.g. `Fallback` when startup already had to use the fallback device
    pub fn with_state(self, state: DeviceState) -> Self {
        self.slot.write().state = state;
        self
    }

    /// Current fallback state
    pub fn state(&self) -> DeviceState {
        self.slot.read().state
    }

    /// Device of the published engine
    pub fn device(&self) -> Device {
        self.slot.read().engine.device()
    }

    fn current(&self) -> (Arc<dyn TranslationEngine>, u64) {
        let slot = self.slot.read();
        (slot.engine.clone(), slot.generation)
    }

    /// Translate `units`, returning one hypothesis per unit in input order
    pub async fn translate(
        &self,
        units: &[TranslationUnit],
        params: &SearchParams,
    ) -> Result<Vec<Hypothesis>, ServiceError> {
        let batch_size = params.max_batch_size.max(1);
        let mut hypotheses = Vec::with_capacity(units.len());

        for (index, chunk) in units.chunks(batch_size).enumerate() {
            debug!("Translating batch {} ({} units)", index + 1, chunk.len());
            let translated = self.translate_chunk(chunk.to_vec(), params).await?;
            hypotheses.extend(translated);
        }

        Ok(hypotheses)
    }

    async fn translate_chunk(
        &self,
        batch: Vec<TranslationUnit>,
        params: &SearchParams,
    ) -> Result<Vec<Hypothesis>, ServiceError> {
        let (engine, generation) = self.current();

        match run_engine(engine, batch.clone(), params.clone()).await {
            Ok(hypotheses) => Ok(hypotheses),
            Err(e) if e.is_resource() => {
                warn!("Translation engine resource failure: {}", e);
                self.retry_on_fallback(generation, batch, params).await
            }
            Err(e) => {
                error!("Translation engine failure: {}", e);
                Err(ServiceError::Internal(format!("translation failed: {}", e)))
            }
        }
    }

    /// Retry a batch that failed on engine `failed_generation` exactly once on the fallback engine
    async fn retry_on_fallback(
        &self,
        failed_generation: u64,
        batch: Vec<TranslationUnit>,
        params: &SearchParams,
    ) -> Result<Vec<Hypothesis>, ServiceError> {
        let _guard = self.fallback_lock.lock().await;

        let (published, generation, state) = {
            let slot = self.slot.read();
            (slot.engine.clone(), slot.generation, slot.state)
        };

        if generation != failed_generation {
            debug!("Reusing fallback engine published by another request");
            return run_engine(published, batch, params.clone())
                .await
                .map_err(|e| unavailable(&e));
        }

        if state == DeviceState::Fallback {
            return Err(ServiceError::ServiceUnavailable(format!(
                "translation engine unavailable on {} device",
                published.device()
            )));
        }

        self.slot.write().state = DeviceState::FallingBack;
        info!("Building translation engine on fallback device {}", self.fallback_device);

        let loader = self.loader.clone();
        let model_dir = self.model_dir.clone();
        let device = self.fallback_device;
        let built = tokio::task::spawn_blocking(move || loader.load(&model_dir, device))
            .await
            .map_err(|e| EngineError::Runtime(e.to_string()))
            .and_then(|result| result);

        let fallback = match built {
            Ok(engine) => engine,
            Err(e) => {
                error!("Fallback engine construction failed: {}", e);
                return Err(unavailable(&e));
            }
        };

        let hypotheses = run_engine(fallback.clone(), batch, params.clone())
            .await
            .map_err(|e| {
                error!("Retry on fallback device failed: {}", e);
                unavailable(&e)
            })?;

        *self.slot.write() = EngineSlot {
            engine: fallback,
            generation: generation + 1,
            state: DeviceState::Fallback,
        };
        info!("Translation engine switched to {} device", device);

        Ok(hypotheses)
    }
}

fn unavailable(error: &EngineError) -> ServiceError {
    ServiceError::ServiceUnavailable(format!("translation engine unavailable: {}", error))
}

/// Run one batch on the blocking pool and check index alignment
async fn run_engine(
    engine: Arc<dyn TranslationEngine>,
    batch: Vec<TranslationUnit>,
    params: SearchParams,
) -> Result<Vec<Hypothesis>, EngineError> {
    let expected = batch.len();
    let hypotheses = tokio::task::spawn_blocking(move || engine.translate_batch(&batch, &params))
        .await
        .map_err(|e| EngineError::Runtime(format!("engine task aborted: {}", e)))??;

    if hypotheses.len() != expected {
        return Err(EngineError::Runtime(format!(
            "engine returned {} hypotheses for {} units",
            hypotheses.len(),
            expected
        )));
    }

    Ok(hypotheses)
}
