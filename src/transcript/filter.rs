//! Online segment validity filter (applied as each transcribed segment
//! arrives).

use strsim::normalized_levenshtein;

/// Punctuation stripped when testing whether a segment carries any content.
const TERMINAL_PUNCTUATION: &[char] = &['.', ',', '?', '!'];

/// Hard cap on the retained recent-segment history.
const RECENT_HISTORY_CAP: usize = 10;

/// Rejects low-value segments as they arrive: too short, punctuation-only,
/// or a near-repeat of recently accepted context. The lookback window is
/// bounded so the similarity check stays constant-cost per segment.
///
/// Acoustic backends frequently stutter-repeat an utterance within a chunk;
/// this catches that cheaply during generation. Repetition introduced at
/// chunk boundaries is handled later by the consolidation pass.
#[derive(Debug)]
pub struct SegmentFilter {
    min_length: usize,
    similarity_threshold: f64,
    lookback: usize,
    /// Lower-cased texts of recently accepted segments, oldest first.
    recent: Vec<String>,
}

impl SegmentFilter {
    pub fn new(min_length: usize, similarity_threshold: f64, lookback: usize) -> Self {
        SegmentFilter {
            min_length,
            similarity_threshold,
            lookback,
            recent: Vec::new(),
        }
    }

    /// Returns true and records the segment if it passes all validity rules.
    pub fn accept(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_length {
            return false;
        }

        let without_punctuation: String = trimmed
            .chars()
            .filter(|c| !TERMINAL_PUNCTUATION.contains(c))
            .collect();
        if without_punctuation.trim().is_empty() {
            return false;
        }

        let normalized = trimmed.to_lowercase();
        let window_start = self.recent.len().saturating_sub(self.lookback);
        for previous in &self.recent[window_start..] {
            if normalized_levenshtein(&normalized, previous) > self.similarity_threshold {
                return false;
            }
        }

        self.recent.push(normalized);
        if self.recent.len() > RECENT_HISTORY_CAP {
            self.recent.remove(0);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> SegmentFilter {
        SegmentFilter::new(3, 0.8, 5)
    }

    #[test]
    fn test_rejects_punctuation_only() {
        let mut filter = default_filter();
        assert!(!filter.accept("..."));
        assert!(!filter.accept("?!."));
        assert!(!filter.accept(" , . "));
    }

    #[test]
    fn test_rejects_below_min_length() {
        let mut filter = default_filter();
        assert!(!filter.accept("ok"));
        assert!(!filter.accept(" a "));
    }

    #[test]
    fn test_accepts_fresh_text() {
        let mut filter = default_filter();
        assert!(filter.accept("Patient reports pain"));
    }

    #[test]
    fn test_rejects_near_duplicate_of_recent() {
        let mut filter = default_filter();
        assert!(filter.accept("I will check your blood pressure now"));
        assert!(!filter.accept("I will check your blood pressure now"));
        assert!(!filter.accept("i will check your blood pressure now."));
    }

    #[test]
    fn test_duplicate_outside_lookback_window_is_accepted() {
        let mut filter = default_filter();
        assert!(filter.accept("how are you feeling today"));
        // Five distinct segments push the first one out of the window.
        for line in [
            "does it hurt when you breathe",
            "I am going to listen to your lungs",
            "please sit up for a moment",
            "the doctor will be here shortly",
            "do you need anything for the pain",
        ] {
            assert!(filter.accept(line), "expected acceptance of {:?}", line);
        }
        assert!(filter.accept("how are you feeling today"));
    }

    #[test]
    fn test_min_length_boundary() {
        let mut filter = default_filter();
        assert!(filter.accept("yes"));
    }

    #[test]
    fn test_dissimilar_text_accepted_after_similar_rejected() {
        let mut filter = default_filter();
        assert!(filter.accept("the patient is resting comfortably"));
        assert!(!filter.accept("the patient is resting comfortably now"));
        assert!(filter.accept("vital signs are stable"));
    }
}
