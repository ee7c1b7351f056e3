//! Keyword classification of log lines.

/// Classification of a single log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// The line contains the given error keyword and no ignore phrase.
    Error(String),
    /// The line contains an ignore phrase and is exempt from error matching.
    Ignored,
    /// The line matched neither list.
    Benign,
}

/// Classifies a line against the ignore and error keyword lists.
///
/// Matching is case-sensitive substring containment. An ignore match takes
/// precedence: a line containing both an ignore phrase and an error keyword
/// is never reported as an error. The first matching error keyword, in
/// configured order, is the one reported.
pub fn classify_line(line: &str, ignore_keywords: &[String], error_keywords: &[String]) -> LineClass {
    if ignore_keywords.iter().any(|kw| line.contains(kw.as_str())) {
        return LineClass::Ignored;
    }

    for keyword in error_keywords {
        if line.contains(keyword.as_str()) {
            return LineClass::Error(keyword.clone());
        }
    }

    LineClass::Benign
}
