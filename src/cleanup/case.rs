//! Case-style classification and conversion for sibling names

use std::fmt;

/// A recognizable naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    Camel,
    Pascal,
    Snake,
    Kebab,
    Title,
    /// A single all-lowercase word; compatible with camel, snake, and
    /// kebab at once, so it never votes and is never flagged.
    Lower,
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStyle::Camel => "camelCase",
            CaseStyle::Pascal => "PascalCase",
            CaseStyle::Snake => "snake_case",
            CaseStyle::Kebab => "kebab-case",
            CaseStyle::Title => "Title Case",
            CaseStyle::Lower => "lowercase",
        };
        write!(f, "{}", s)
    }
}

/// Classify a name, or `None` when it follows no single convention.
pub fn classify(name: &str) -> Option<CaseStyle> {
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || "_- ".contains(c)) {
        return None;
    }
    let has_underscore = name.contains('_');
    let has_hyphen = name.contains('-');
    let has_space = name.contains(' ');
    let separators = [has_underscore, has_hyphen, has_space]
        .iter()
        .filter(|&&s| s)
        .count();
    if separators > 1 {
        return None;
    }
    let letters: Vec<char> = name.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    if has_underscore {
        return letters.iter().all(|c| c.is_lowercase()).then_some(CaseStyle::Snake);
    }
    if has_hyphen {
        return letters.iter().all(|c| c.is_lowercase()).then_some(CaseStyle::Kebab);
    }
    if has_space {
        let title = name
            .split(' ')
            .filter(|w| !w.is_empty())
            .all(|w| w.chars().next().is_some_and(|c| c.is_uppercase() || c.is_numeric()));
        return title.then_some(CaseStyle::Title);
    }
    let first_upper = letters[0].is_uppercase();
    let any_upper_after = letters[1..].iter().any(|c| c.is_uppercase());
    let any_lower = letters.iter().any(|c| c.is_lowercase());
    match (first_upper, any_upper_after, any_lower) {
        (false, true, _) => Some(CaseStyle::Camel),
        (true, _, true) => Some(CaseStyle::Pascal),
        (false, false, true) => Some(CaseStyle::Lower),
        _ => None,
    }
}

/// Split a name into lowercase words on separators and case boundaries.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        prev_lower = c.is_lowercase() || c.is_numeric();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rejoin words in the given convention.
pub fn apply_style(words: &[String], style: CaseStyle) -> String {
    match style {
        CaseStyle::Camel => {
            let mut out = String::new();
            for (i, w) in words.iter().enumerate() {
                if i == 0 {
                    out.push_str(w);
                } else {
                    out.push_str(&capitalize(w));
                }
            }
            out
        }
        CaseStyle::Pascal => words.iter().map(|w| capitalize(w)).collect(),
        CaseStyle::Snake => words.join("_"),
        CaseStyle::Kebab => words.join("-"),
        CaseStyle::Title => words
            .iter()
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(" "),
        CaseStyle::Lower => words.join(""),
    }
}

/// Convert a name to the given convention.
pub fn convert(name: &str, style: CaseStyle) -> String {
    apply_style(&split_words(name), style)
}
