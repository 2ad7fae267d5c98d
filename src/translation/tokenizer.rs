/*!
 * Subword tokenizer variants.
 *
 * The concrete variant is picked once, when the model directory is loaded:
 * a joint tokenizer shared by source and target, separate source/target
 * tokenizers, or plain whitespace splitting when the directory ships no
 * tokenizer artifacts at all.
 */

use log::{debug, info};
use std::fmt;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::errors::TokenizerError;
use crate::file_utils::{find_tokenizer_files, TokenizerFiles};

/// Encode/decode capability used by the translation pipeline
pub trait SubwordModel: Send + Sync {
    /// Split source text into subword pieces
    fn encode(&self, text: &str) -> Result<Vec<String>, TokenizerError>;

    /// Decode target pieces back into text
    fn decode_pieces(&self, pieces: &[String]) -> Result<String, TokenizerError>;

    /// Encode `text` with the target vocabulary and decode the resulting ids
    fn reencode_decode(&self, text: &str) -> Result<String, TokenizerError>;
}

/// Tokenizer selected at construction time
pub enum SubwordTokenizer {
    /// No artifacts: split on whitespace, join with spaces
    Whitespace,
    /// One tokenizer for both directions
    Joint(Box<Tokenizer>),
    /// Separate source and target tokenizers
    Split {
        source: Box<Tokenizer>,
        target: Box<Tokenizer>,
    },
}

impl fmt::Debug for SubwordTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl SubwordTokenizer {
    /// Load whichever layout the model directory provides
    pub fn load(model_dir: &Path) -> Result<Self, TokenizerError> {
        let tokenizer = match find_tokenizer_files(model_dir) {
            TokenizerFiles::Joint(path) => Self::Joint(Box::new(load_file(&path)?)),
            TokenizerFiles::Split { source, target } => Self::Split {
                source: Box::new(load_file(&source)?),
                target: Box::new(load_file(&target)?),
            },
            TokenizerFiles::SentencePiece(paths) => {
                let path = paths.first().map(|p| p.display().to_string()).unwrap_or_default();
                return Err(TokenizerError::Load {
                    path,
                    message: "raw SentencePiece models are not supported, export them to tokenizer.json \
                              (or source.tokenizer.json and target.tokenizer.json)"
                        .to_string(),
                });
            }
            TokenizerFiles::None => Self::Whitespace,
        };
        info!("Tokenizer ready ({})", tokenizer.kind());
        Ok(tokenizer)
    }

    /// Short name of the variant, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Joint(_) => "joint",
            Self::Split { .. } => "split",
        }
    }

    fn source(&self) -> Option<&Tokenizer> {
        match self {
            Self::Whitespace => None,
            Self::Joint(tokenizer) => Some(&**tokenizer),
            Self::Split { source, .. } => Some(&**source),
        }
    }

    fn target(&self) -> Option<&Tokenizer> {
        match self {
            Self::Whitespace => None,
            Self::Joint(tokenizer) => Some(&**tokenizer),
            Self::Split { target, .. } => Some(&**target),
        }
    }
}

fn load_file(path: &Path) -> Result<Tokenizer, TokenizerError> {
    debug!("Loading tokenizer {}", path.display());
    Tokenizer::from_file(path).map_err(|e| TokenizerError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

impl SubwordModel for SubwordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<String>, TokenizerError> {
        match self.source() {
            None => Ok(text.split_whitespace().map(str::to_string).collect()),
            Some(tokenizer) => {
                let encoding = tokenizer
                    .encode(text, false)
                    .map_err(|e| TokenizerError::Encode(e.to_string()))?;
                Ok(encoding.get_tokens().to_vec())
            }
        }
    }

    fn decode_pieces(&self, pieces: &[String]) -> Result<String, TokenizerError> {
        match self.target() {
            None => Ok(pieces.join(" ")),
            Some(tokenizer) => {
                let ids = pieces
                    .iter()
                    .map(|piece| {
                        tokenizer
                            .token_to_id(piece)
                            .ok_or_else(|| TokenizerError::Decode(format!("unknown piece '{}'", piece)))
                    })
                    .collect::<Result<Vec<u32>, _>>()?;
                tokenizer
                    .decode(&ids, true)
                    .map_err(|e| TokenizerError::Decode(e.to_string()))
            }
        }
    }

    fn reencode_decode(&self, text: &str) -> Result<String, TokenizerError> {
        match self.target() {
            None => Ok(text.to_string()),
            Some(tokenizer) => {
                let encoding = tokenizer
                    .encode(text, false)
                    .map_err(|e| TokenizerError::Encode(e.to_string()))?;
                tokenizer
                    .decode(encoding.get_ids(), true)
                    .map_err(|e| TokenizerError::Decode(e.to_string()))
            }
        }
    }
}
