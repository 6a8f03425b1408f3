//! Whole-transcript consolidation (applied once a source transcript is
//! fully assembled).

use super::TranscriptLine;
use strsim::normalized_levenshtein;

/// Collapses duplicate and near-duplicate lines that survive the online
/// filter, typically re-emissions of the same utterance across a chunk
/// boundary. Each candidate is compared against the last `lookback` kept
/// lines: exact text match drops the candidate; similarity above the
/// threshold keeps whichever text is longer (the longer capture is assumed
/// to be the more complete one); anything else is appended.
///
/// Order preserving, idempotent, never grows the sequence.
pub fn consolidate_lines(
    lines: &[TranscriptLine],
    similarity_threshold: f64,
    lookback: usize,
) -> Vec<TranscriptLine> {
    let mut kept: Vec<TranscriptLine> = Vec::with_capacity(lines.len());

    for line in lines {
        let mut duplicate = false;
        let window_start = kept.len().saturating_sub(lookback);

        for j in window_start..kept.len() {
            if line.text == kept[j].text {
                duplicate = true;
                break;
            }
            let similarity =
                normalized_levenshtein(&line.text.to_lowercase(), &kept[j].text.to_lowercase());
            if similarity > similarity_threshold {
                if line.text.chars().count() > kept[j].text.chars().count() {
                    kept[j] = line.clone();
                }
                duplicate = true;
                break;
            }
        }

        if !duplicate {
            kept.push(line.clone());
        }
    }

    kept
}
