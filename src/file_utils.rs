use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use walkdir::WalkDir;

// @module: Model directory utilities

const JOINT_TOKENIZER_NAMES: &[&str] = &["tokenizer.json", "joint.tokenizer.json"];
const SOURCE_TOKENIZER_NAMES: &[&str] = &["source.tokenizer.json", "src.tokenizer.json"];
const TARGET_TOKENIZER_NAMES: &[&str] = &["target.tokenizer.json", "tgt.tokenizer.json"];
const SENTENCEPIECE_EXTENSIONS: &[&str] = &["model", "spm"];

/// Weight files of a converted beam-search translation model
const ENGINE_MODEL_NAMES: &[&str] = &["model.bin"];

/// Tokenizer artifacts found in a model directory
#[derive(Debug, Clone, PartialEq)]
pub enum TokenizerFiles {
    /// One file shared by both directions
    Joint(PathBuf),
    /// Separate source and target files
    Split { source: PathBuf, target: PathBuf },
    /// Raw SentencePiece models (`*.model`, `*.spm`) without a `tokenizer.json` export
    SentencePiece(Vec<PathBuf>),
    /// Nothing usable
    None,
}

// @checks: Directory existence
pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_dir()
}

/// Lowercased file names and paths in the top level of `model_dir`, sorted by name
fn top_level_files(model_dir: &Path) -> Vec<(String, PathBuf)> {
    let mut names: Vec<(String, PathBuf)> = WalkDir::new(model_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.file_name().to_string_lossy().to_lowercase(), e.path().to_path_buf()))
        .collect();
    names.sort();
    names
}

/// Locate tokenizer artifacts in the top level of `model_dir`.
/// A joint tokenizer wins over a split pair; a split pair needs both halves.
/// SentencePiece models are reported only when no `tokenizer.json` layout is present.
pub fn find_tokenizer_files(model_dir: &Path) -> TokenizerFiles {
    let names = top_level_files(model_dir);

    let pick = |candidates: &[&str]| {
        candidates.iter().find_map(|candidate| {
            names
                .iter()
                .find(|(name, _)| name == candidate)
                .map(|(_, path)| path.clone())
        })
    };

    if let Some(joint) = pick(JOINT_TOKENIZER_NAMES) {
        return TokenizerFiles::Joint(joint);
    }

    if let (Some(source), Some(target)) = (pick(SOURCE_TOKENIZER_NAMES), pick(TARGET_TOKENIZER_NAMES)) {
        return TokenizerFiles::Split { source, target };
    }

    let sentencepiece: Vec<PathBuf> = names
        .iter()
        .filter(|(_, path)| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SENTENCEPIECE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .map(|(_, path)| path.clone())
        .collect();

    if sentencepiece.is_empty() {
        TokenizerFiles::None
    } else {
        TokenizerFiles::SentencePiece(sentencepiece)
    }
}

/// Path of converted translation model weights in `model_dir`, if any
pub fn find_engine_model(model_dir: &Path) -> Option<PathBuf> {
    top_level_files(model_dir)
        .into_iter()
        .find(|(name, _)| ENGINE_MODEL_NAMES.contains(&name.as_str()))
        .map(|(_, path)| path)
}

/// Make sure the model directory exists, running the bootstrap command once when it does not.
///
/// Returns `Ok(true)` when the directory is present afterwards. A failing bootstrap
/// command is reported as an error; callers decide whether that is fatal.
pub async fn ensure_model_present(model_dir: &Path, bootstrap_command: Option<&[String]>) -> Result<bool> {
    if dir_exists(model_dir) {
        return Ok(true);
    }

    let Some((program, args)) = bootstrap_command.and_then(|cmd| cmd.split_first()) else {
        warn!("Model directory {} not found and no bootstrap command configured", model_dir.display());
        return Ok(false);
    };

    info!("Model not found at {}, running bootstrap: {} {}", model_dir.display(), program, args.join(" "));

    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .context(format!("Failed to start bootstrap command: {}", program))?;

    if !status.success() {
        return Err(anyhow!("Bootstrap command exited with {}", status));
    }

    Ok(dir_exists(model_dir))
}
