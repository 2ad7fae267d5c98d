/*!
 * Document translation pipeline.
 *
 * Documents flow through segmentation, tokenization, batched engine
 * invocation, detokenization and reassembly. Submodules:
 *
 * - `segmenter`: paragraph-aware sentence segmentation
 * - `tokenizer`: subword tokenizer variants
 * - `engine`: translation engine capability and search parameters
 * - `batch`: batching and device fallback
 * - `formatting`: detokenization and text cleanup
 * - `reassembler`: segments back into documents
 * - `core`: the service tying it all together
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, DeviceState};
pub use self::core::{loader_for, TranslationService};
pub use self::engine::{Device, EngineLoader, Hypothesis, SearchParams, TranslationEngine, TranslationUnit};
pub use self::formatting::TextCleaner;
pub use self::reassembler::reassemble;
pub use self::segmenter::{RuleBasedDetector, Segment, SentenceBoundaryDetector, SentenceSegmenter};
pub use self::tokenizer::{SubwordModel, SubwordTokenizer};

// Submodules
pub mod batch;
pub mod core;
pub mod engine;
pub mod formatting;
pub mod reassembler;
pub mod segmenter;
pub mod tokenizer;
