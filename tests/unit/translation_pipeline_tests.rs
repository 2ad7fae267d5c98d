/*!
 * Tests for the translation pipeline through the public API
 */

use std::sync::Arc;

use mtbridge::app_config::TranslatorConfig;
use mtbridge::translation::engine::{PassthroughEngine, PassthroughLoader};
use mtbridge::translation::{
    reassemble, BatchTranslator, Device, DeviceState, SearchParams, SentenceSegmenter, SubwordTokenizer,
    TextCleaner, TranslationService,
};

use crate::common::{self, engines::CountingLoader, marking_service};

fn identity_service(max_batch_size: usize) -> TranslationService {
    TranslationService::new(
        SentenceSegmenter::default(),
        Arc::new(SubwordTokenizer::Whitespace),
        BatchTranslator::new(
            Arc::new(PassthroughEngine::new(Device::Cpu)),
            Arc::new(PassthroughLoader),
            "model",
            Device::Cpu,
        ),
        SearchParams {
            max_batch_size,
            ..SearchParams::default()
        },
    )
}

#[test]
fn test_segmentThenReassemble_withoutFragments_shouldReproduceDocuments() {
    let documents = vec![
        "First sentence here. Second sentence here.\nA new paragraph starts.".to_string(),
        String::new(),
        "Only one line in this document.".to_string(),
    ];

    let segments = SentenceSegmenter::default().segment(&documents);
    assert_eq!(reassemble(&segments, documents.len()), documents);
}

#[test]
fn test_segment_shouldOrderByDocumentThenParagraph() {
    let segments = SentenceSegmenter::default().segment(&["Alpha beta.\nGamma delta.", "Epsilon zeta."]);
    let keys: Vec<_> = segments.iter().map(|s| (s.doc_index, s.paragraph_index)).collect();
    assert_eq!(keys, vec![(0, 0), (0, 1), (1, 0)]);
}

#[test]
fn test_clean_shouldNormalizeSpacingAroundPunctuation() {
    assert_eq!(TextCleaner::clean("Hello  world , friend !"), "Hello world, friend!");
}

#[tokio::test]
async fn test_translateDocuments_anyBatchSize_shouldGiveSameOutput() {
    let documents = vec![
        "One two three. Four five six. Seven eight nine.\nTen eleven twelve.".to_string(),
        "Thirteen fourteen. Fifteen sixteen.".to_string(),
    ];

    let reference = identity_service(64).translate_documents(&documents).await.unwrap();
    for batch_size in [1, 2, 3, 5] {
        let output = identity_service(batch_size).translate_documents(&documents).await.unwrap();
        assert_eq!(output, reference, "batch size {}", batch_size);
    }
}

#[tokio::test]
async fn test_translateDocuments_shouldReturnOneOutputPerInput() {
    let documents = vec!["salam.".to_string(), String::new(), "   ".to_string(), "khoda hafez.".to_string()];
    let output = marking_service().translate_documents(&documents).await.unwrap();

    assert_eq!(output.len(), documents.len());
    assert_eq!(output[0], "EN:salam.");
    assert_eq!(output[1], "");
    assert_eq!(output[2], "");
    assert_eq!(output[3], "EN:khoda EN:hafez.");
}

#[tokio::test]
async fn test_translateText_multiParagraph_shouldKeepLineStructure() {
    let output = marking_service().translate_text("salam donya.\nchetori?").await.unwrap();
    assert_eq!(output, "EN:salam EN:donya.\nEN:chetori?");
}

#[test]
fn test_load_fromDirectoryWithoutTokenizer_shouldUseWhitespaceAndPreferredDevice() {
    let dir = common::create_temp_dir().unwrap();
    let config = TranslatorConfig {
        model_dir: dir.path().to_path_buf(),
        device: Device::Cpu,
        ..TranslatorConfig::default()
    };
    let loader = CountingLoader::new();

    let service = TranslationService::load(&config, loader.clone()).unwrap();

    assert_eq!(loader.builds(), 1);
    assert_eq!(service.device_state(), DeviceState::Primary);
}
