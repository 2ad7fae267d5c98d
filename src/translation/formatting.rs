/*!
 * Detokenization and cleanup of engine output.
 *
 * Turns the pieces of a hypothesis into readable prose: decode through the
 * subword model, drop boundary markers, normalize whitespace and re-attach
 * punctuation and contraction suffixes. Decoding never fails the request;
 * it degrades to cruder strategies instead.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::tokenizer::SubwordModel;

/// SentencePiece word-boundary marker
pub const BOUNDARY_MARKER: char = '\u{2581}';

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());

// "don 't" -> "don't"
static SPACE_BEFORE_APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+'(\w)").unwrap());

// "don' t" -> "don't"
static SPACE_AFTER_APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)'\s+(s|t|d|m|re|ve|ll)\b").unwrap());

/// Text cleaner for hypothesis pieces
pub struct TextCleaner;

impl TextCleaner {
    /// Decode `pieces` and clean the result
    pub fn detokenize(model: &dyn SubwordModel, pieces: &[String]) -> String {
        let decoded = Self::decode(model, pieces);
        Self::clean(&decoded)
    }

    /// Decode with graceful degradation: direct piece decoding, then a
    /// re-encode/decode round of the joined pieces, then a plain join.
    fn decode(model: &dyn SubwordModel, pieces: &[String]) -> String {
        match model.decode_pieces(pieces) {
            Ok(text) => text,
            Err(e) => {
                debug!("Piece decoding failed ({}), re-encoding", e);
                let joined = pieces.join(" ");
                match model.reencode_decode(&joined) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("Re-encode decoding failed ({}), joining raw pieces", e);
                        joined
                    }
                }
            }
        }
    }

    /// Normalize decoded text
    pub fn clean(text: &str) -> String {
        let text = text.replace(BOUNDARY_MARKER, " ");
        let text = WHITESPACE_RUN.replace_all(&text, " ");
        let text = text.trim();
        let text = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
        let text = SPACE_BEFORE_APOSTROPHE.replace_all(&text, "'$1");
        let text = SPACE_AFTER_APOSTROPHE.replace_all(&text, "$1'$2");
        text.trim().to_string()
    }
}
