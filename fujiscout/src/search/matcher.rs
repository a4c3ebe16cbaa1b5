/// Handles literal word matching against lines.
///
/// Words are plain substrings: no word boundaries, no case folding, no regex.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    words: Vec<String>,
}

impl WordMatcher {
    /// Creates a new WordMatcher, dropping duplicate words but keeping order
    pub fn new(words: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(words.len());
        for word in words {
            if !unique.contains(&word) {
                unique.push(word);
            }
        }
        Self { words: unique }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns true if the line contains any word
    pub fn is_match(&self, line: &str) -> bool {
        self.first_match(line).is_some()
    }

    /// Returns the first configured word found in the line
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|word| line.contains(word.as_str()))
            .map(String::as_str)
    }
}

/// Checks if `line` contains any of `words` as a literal substring.
pub fn contains_any(line: &str, words: &[String]) -> bool {
    words.iter().any(|word| line.contains(word.as_str()))
}
