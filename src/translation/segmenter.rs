/*!
 * Sentence segmentation of input documents.
 *
 * Documents are split into paragraphs on line breaks, paragraphs into
 * sentences by a boundary detector. Very short sentences are folded into
 * the previous segment of the same document so that stray punctuation or
 * line remnants never become translation units on their own.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default merge threshold in characters
pub const DEFAULT_MIN_FRAGMENT_CHARS: usize = 5;

/// One sentence-level unit of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the source document in the input list
    pub doc_index: usize,
    /// Line index within the document
    pub paragraph_index: usize,
    /// Sentence text
    pub text: String,
}

impl Segment {
    pub fn new(doc_index: usize, paragraph_index: usize, text: impl Into<String>) -> Self {
        Self {
            doc_index,
            paragraph_index,
            text: text.into(),
        }
    }
}

/// Splits one paragraph into sentence-like units
pub trait SentenceBoundaryDetector: Send + Sync {
    fn split<'a>(&self, paragraph: &'a str) -> Vec<&'a str>;
}

// Terminal punctuation, optional closing quotes/brackets, then whitespace.
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?\u{061F}\u{06D4}\u{2026}\u{3002}\u{FF01}\u{FF1F}]+["'\u{201D}\u{2019}\u{00BB})\]]*\s+"#).unwrap());

/// Title abbreviations that do not end a sentence
const TITLE_ABBREVIATIONS: &[&str] = &["Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr.", "St.", "vs.", "etc.", "e.g.", "i.e."];

/// Punctuation-driven boundary detector
pub struct RuleBasedDetector {
    abbreviations: HashSet<&'static str>,
}

impl RuleBasedDetector {
    pub fn new() -> Self {
        Self {
            abbreviations: TITLE_ABBREVIATIONS.iter().copied().collect(),
        }
    }

    fn ends_with_abbreviation(&self, text: &str) -> bool {
        text.split_whitespace()
            .last()
            .map(|word| word.trim_start_matches(|c: char| matches!(c, '"' | '\'' | '(' | '\u{201C}')))
            .is_some_and(|word| self.abbreviations.contains(word))
    }
}

impl Default for RuleBasedDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceBoundaryDetector for RuleBasedDetector {
    fn split<'a>(&self, paragraph: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in BOUNDARY.find_iter(paragraph) {
            let candidate = &paragraph[start..boundary.end()];
            if self.ends_with_abbreviation(candidate.trim_end()) {
                continue;
            }
            sentences.push(candidate);
            start = boundary.end();
        }

        if start < paragraph.len() {
            sentences.push(&paragraph[start..]);
        }

        sentences
    }
}

/// Document segmenter
pub struct SentenceSegmenter {
    detector: Box<dyn SentenceBoundaryDetector>,
    min_fragment_chars: usize,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(Box::new(RuleBasedDetector::new()), DEFAULT_MIN_FRAGMENT_CHARS)
    }
}

impl SentenceSegmenter {
    pub fn new(detector: Box<dyn SentenceBoundaryDetector>, min_fragment_chars: usize) -> Self {
        Self {
            detector,
            min_fragment_chars,
        }
    }

    /// Split `documents` into ordered segments.
    ///
    /// Output is ordered by document, then paragraph, then discovery order.
    /// A trimmed sentence shorter than the merge threshold is appended (without
    /// separator) to the previous segment when that segment belongs to the same
    /// document; the first segment of a document is never merged.
    pub fn segment<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();

        for (doc_index, document) in documents.iter().enumerate() {
            for (paragraph_index, paragraph) in document.as_ref().lines().enumerate() {
                for sentence in self.detector.split(paragraph) {
                    let sentence = sentence.trim();
                    if sentence.is_empty() {
                        continue;
                    }

                    let is_fragment = sentence.chars().count() < self.min_fragment_chars;
                    match segments.last_mut() {
                        Some(previous) if is_fragment && previous.doc_index == doc_index => {
                            previous.text.push_str(sentence);
                        }
                        _ => segments.push(Segment::new(doc_index, paragraph_index, sentence)),
                    }
                }
            }
        }

        segments
    }
}
