use regex::Regex;

use crate::error::AnalysisError;

/// Which bucket a query falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    Brand,
    NonBrand,
}

/// A compiled brand-keyword pattern.
///
/// The raw pattern is a `|`-separated disjunction of keywords, e.g.
/// `"acme|acme corp|acmeshop"`. Keywords are trimmed and lowercased at
/// compile time; the empty pattern compiles to a matcher that classifies
/// everything as non-brand.
#[derive(Debug, Clone)]
pub struct BrandPattern {
    keywords: Vec<String>,
}

impl BrandPattern {
    /// Compile and validate a pattern, once, before any row is classified.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidPattern`] when the pattern is not a
    /// valid regular expression and therefore not a usable matcher.
    pub fn compile(pattern: &str) -> Result<Self, AnalysisError> {
        let lowered = pattern.trim().to_lowercase();
        if lowered.is_empty() {
            return Ok(Self { keywords: Vec::new() });
        }

        Regex::new(&lowered).map_err(|e| AnalysisError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let keywords = lowered
            .split('|')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        Ok(Self { keywords })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Classify a query against the compiled keywords.
    ///
    /// Brand requires a whole-token match: keyword `app` matches the query
    /// `app store` but not `apple pie`. Substring hits inside a token do not
    /// count.
    #[must_use]
    pub fn classify(&self, query: &str) -> QueryClass {
        let lowered = query.to_lowercase();
        let is_brand = lowered
            .split_whitespace()
            .any(|token| self.keywords.iter().any(|kw| kw == token));

        if is_brand {
            QueryClass::Brand
        } else {
            QueryClass::NonBrand
        }
    }
}
