/*!
 * Rebuilds documents from translated segments.
 */

use super::segmenter::Segment;

/// Join translated segments back into one string per input document.
///
/// The result always has `document_count` entries; documents without
/// segments come back as empty strings. Segments sharing a paragraph are
/// joined with a space, a paragraph change starts a new line.
pub fn reassemble(segments: &[Segment], document_count: usize) -> Vec<String> {
    let mut documents = vec![String::new(); document_count];
    let mut last_paragraph: Vec<Option<usize>> = vec![None; document_count];

    for segment in segments {
        let Some(document) = documents.get_mut(segment.doc_index) else {
            log::warn!(
                "Dropping segment for unknown document {} (have {})",
                segment.doc_index,
                document_count
            );
            continue;
        };

        match last_paragraph[segment.doc_index] {
            None => {}
            Some(previous) if previous == segment.paragraph_index => document.push(' '),
            Some(_) => document.push('\n'),
        }
        document.push_str(&segment.text);
        last_paragraph[segment.doc_index] = Some(segment.paragraph_index);
    }

    documents
}
