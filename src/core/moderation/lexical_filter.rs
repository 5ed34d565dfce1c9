// Local word filter - the first, cheapest line of moderation.
//
// Pure and synchronous: it never touches the network, so a hit here means the
// classifier is never called.

use super::moderation_models::FilterResult;

/// Case-insensitive substring filter over a fixed list of banned terms.
#[derive(Debug, Clone)]
pub struct LexicalFilter {
    /// Lower-cased, non-empty terms.
    terms: Vec<String>,
}

impl LexicalFilter {
    pub fn new<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Check `text` against the banned list.
    pub fn check(&self, text: &str) -> FilterResult {
        let lower = text.to_lowercase();
        match self.terms.iter().find(|term| lower.contains(term.as_str())) {
            Some(term) => FilterResult::Reject { term: term.clone() },
            None => FilterResult::Pass,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}
