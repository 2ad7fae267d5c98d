/*!
 * Tests for model directory utilities
 */

use mtbridge::file_utils::{dir_exists, ensure_model_present, find_tokenizer_files, TokenizerFiles};

use crate::common;

#[test]
fn test_dirExists_shouldDistinguishFilesAndDirectories() {
    let dir = common::create_temp_dir().unwrap();
    let file = common::create_test_file(dir.path(), "model.bin", "weights").unwrap();

    assert!(dir_exists(dir.path()));
    assert!(!dir_exists(&file));
    assert!(!dir_exists(dir.path().join("missing")));
}

#[test]
fn test_findTokenizerFiles_withEmptyDirectory_shouldReturnNone() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "model.bin", "weights").unwrap();

    assert_eq!(find_tokenizer_files(dir.path()), TokenizerFiles::None);
}

#[tokio::test]
async fn test_ensureModelPresent_existingDirectory_shouldNotRunBootstrap() {
    let dir = common::create_temp_dir().unwrap();
    let command = vec!["false".to_string()];

    assert!(ensure_model_present(dir.path(), Some(&command)).await.unwrap());
}

#[tokio::test]
async fn test_ensureModelPresent_missingDirectory_shouldRunBootstrapOnce() {
    let dir = common::create_temp_dir().unwrap();
    let model_dir = dir.path().join("model");
    let command = vec!["mkdir".to_string(), model_dir.display().to_string()];

    assert!(ensure_model_present(&model_dir, Some(&command)).await.unwrap());
    assert!(dir_exists(&model_dir));
}

#[tokio::test]
async fn test_ensureModelPresent_withoutCommand_shouldReportMissing() {
    let dir = common::create_temp_dir().unwrap();
    let model_dir = dir.path().join("model");

    assert!(!ensure_model_present(&model_dir, None).await.unwrap());
}

#[tokio::test]
async fn test_ensureModelPresent_failingCommand_shouldError() {
    let dir = common::create_temp_dir().unwrap();
    let model_dir = dir.path().join("model");
    let command = vec!["false".to_string()];

    assert!(ensure_model_present(&model_dir, Some(&command)).await.is_err());
}
