//! Output filtering implementations

use regex::Regex;

/// Trait for output filters
pub trait ContentFilter: Send + Sync {
    /// Labels or patterns found in the content
    fn check(&self, content: &str) -> Vec<String>;

    /// Content with every match removed
    fn scrub(&self, content: &str) -> String;
}

/// ASCII case-insensitive keyword filter working line by line.
///
/// A line reduced to punctuation and whitespace by scrubbing is dropped
/// entirely, so a leaked button label does not leave an empty bullet behind.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<CompiledKeyword>,
}

#[derive(Debug, Clone)]
struct CompiledKeyword {
    keyword: String,
    keyword_lower: String,
}

impl KeywordFilter {
    pub fn new() -> Self {
        Self {
            keywords: Vec::new(),
        }
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new();
        for k in keywords {
            filter.add_keyword(k);
        }
        filter
    }

    pub fn add_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return;
        }
        self.keywords.push(CompiledKeyword {
            keyword_lower: keyword.to_ascii_lowercase(),
            keyword,
        });
        // Longest first, so a label containing another is removed whole.
        self.keywords
            .sort_by(|a, b| b.keyword_lower.len().cmp(&a.keyword_lower.len()));
    }

    fn scrub_line(&self, line: &str) -> String {
        let mut result = line.to_string();
        for k in &self.keywords {
            // to_ascii_lowercase keeps byte offsets aligned with `result`
            let lower = result.to_ascii_lowercase();
            if !lower.contains(&k.keyword_lower) {
                continue;
            }
            let mut next = String::with_capacity(result.len());
            let mut last_end = 0;
            for (start, _) in lower.match_indices(&k.keyword_lower) {
                next.push_str(&result[last_end..start]);
                last_end = start + k.keyword_lower.len();
            }
            next.push_str(&result[last_end..]);
            result = next;
        }
        result
    }
}

impl ContentFilter for KeywordFilter {
    fn check(&self, content: &str) -> Vec<String> {
        let lower = content.to_ascii_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(&k.keyword_lower))
            .map(|k| k.keyword.clone())
            .collect()
    }

    fn scrub(&self, content: &str) -> String {
        if self.check(content).is_empty() {
            return content.to_string();
        }
        content
            .lines()
            .filter_map(|line| {
                let scrubbed = self.scrub_line(line);
                if scrubbed == line {
                    Some(scrubbed)
                } else if scrubbed.chars().any(char::is_alphanumeric) {
                    Some(scrubbed.trim_end().to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Regex pattern filter. Patterns are compiled once at construction;
/// invalid patterns are skipped.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    patterns: Vec<Regex>,
}

impl PatternFilter {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn from_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut filter = Self::new();
        for p in patterns {
            filter.add_pattern(p);
        }
        filter
    }

    /// Returns false when the pattern does not compile.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        match Regex::new(pattern) {
            Ok(re) => {
                self.patterns.push(re);
                true
            }
            Err(_) => false,
        }
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(content))
    }
}

impl ContentFilter for PatternFilter {
    fn check(&self, content: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter_map(|re| re.find(content).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn scrub(&self, content: &str) -> String {
        let mut result = content.to_string();
        for re in &self.patterns {
            result = re.replace_all(&result, "").into_owned();
        }
        result
    }
}
