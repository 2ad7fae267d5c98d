/*!
 * Stub translation engines and loaders
 */

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mtbridge::errors::EngineError;
use mtbridge::translation::{Device, EngineLoader, Hypothesis, SearchParams, TranslationEngine, TranslationUnit};

/// Prefixes every piece with `EN:`
pub struct MarkingEngine;

impl TranslationEngine for MarkingEngine {
    fn device(&self) -> Device {
        Device::Cpu
    }

    fn translate_batch(&self, batch: &[TranslationUnit], _: &SearchParams) -> Result<Vec<Hypothesis>, EngineError> {
        Ok(batch
            .iter()
            .map(|unit| Hypothesis::new(unit.iter().map(|piece| format!("EN:{}", piece)).collect()))
            .collect())
    }
}

/// Fails every batch with a resource error after a short delay
pub struct MissingAcceleratorEngine;

impl TranslationEngine for MissingAcceleratorEngine {
    fn device(&self) -> Device {
        Device::Cuda
    }

    fn translate_batch(&self, _: &[TranslationUnit], _: &SearchParams) -> Result<Vec<Hypothesis>, EngineError> {
        std::thread::sleep(Duration::from_millis(30));
        Err(EngineError::Resource("libcublas.so not found".to_string()))
    }
}

/// Builds a marking engine on the requested device and counts constructions
#[derive(Default)]
pub struct CountingLoader {
    builds: AtomicUsize,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl EngineLoader for CountingLoader {
    fn load(&self, _: &Path, _device: Device) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        Ok(Arc::new(MarkingEngine))
    }
}
