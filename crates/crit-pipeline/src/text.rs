//! Sentence segmentation and small text/number helpers shared across the
//! pipeline stages.

/// Lazy iterator over sentence spans split on terminal punctuation runs.
pub struct Sentences<'a> {
    remaining: &'a str,
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            if self.remaining.is_empty() {
                return None;
            }
            let end = self
                .remaining
                .find(['.', '!', '?'])
                .unwrap_or(self.remaining.len());
            let (span, rest) = self.remaining.split_at(end);
            self.remaining = rest.trim_start_matches(['.', '!', '?']);
            let span = span.trim();
            if !span.is_empty() {
                return Some(span);
            }
        }
    }
}

pub fn sentences(text: &str) -> Sentences<'_> {
    Sentences { remaining: text }
}

/// Lowercased maximal alphabetic runs of length >= 3.
pub(crate) fn alpha_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_lowercase())
        .filter(|w| w.len() >= 3)
        .map(str::to_string)
        .collect()
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
