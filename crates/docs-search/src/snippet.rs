/// Snippet extraction and highlighting for search results.
///
/// A fixed-size window slides over `title + " " + content`; the window containing
/// the most distinct query tokens wins. The excerpt is trimmed so it neither starts
/// nor ends mid-word, every whole-word occurrence of a token is wrapped in the
/// configured markers, and an ellipsis is appended. All offsets are in characters,
/// so multi-byte text is never split.
use regex::{Captures, Regex};
use tracing::warn;

use crate::index::query_tokens;
use crate::model::DocumentRecord;

pub const DEFAULT_WINDOW_CHARS: usize = 150;
pub const DEFAULT_STEP_CHARS: usize = 10;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetConfig {
    pub window: usize,
    pub step: usize,
    pub open_marker: String,
    pub close_marker: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_CHARS,
            step: DEFAULT_STEP_CHARS,
            open_marker: "<mark>".to_string(),
            close_marker: "</mark>".to_string(),
        }
    }
}

pub fn generate_snippet(
    document: &DocumentRecord,
    matched_terms: &[String],
    query: &str,
    config: &SnippetConfig,
) -> String {
    let text = format!("{} {}", document.title, document.content);
    let chars: Vec<char> = text.chars().collect();

    let mut terms: Vec<String> = Vec::new();
    for term in matched_terms
        .iter()
        .map(|t| t.to_lowercase())
        .chain(query_tokens(query))
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    let start = best_window_start(&chars, &terms, config);
    let end = (start + config.window).min(chars.len());
    let excerpt = trim_to_word_boundaries(&chars, start, end);

    let mut snippet = highlight(&excerpt, &terms, config);
    snippet.push_str(ELLIPSIS);
    snippet
}

/// Start of the first window with the most distinct terms; 0 when nothing scores.
fn best_window_start(chars: &[char], terms: &[String], config: &SnippetConfig) -> usize {
    if chars.len() <= config.window || terms.is_empty() {
        return 0;
    }

    let step = config.step.max(1);
    let mut best_start = 0;
    let mut best_score = 0;
    let mut start = 0;
    while start + config.window <= chars.len() {
        let window = chars[start..start + config.window]
            .iter()
            .collect::<String>()
            .to_lowercase();
        let score = terms.iter().filter(|t| window.contains(t.as_str())).count();
        if score > best_score {
            best_start = start;
            best_score = score;
        }
        start += step;
    }
    best_start
}

fn trim_to_word_boundaries(chars: &[char], start: usize, end: usize) -> String {
    let mut lo = start;
    let mut hi = end;

    // Leading partial word: the window opened in the middle of a token.
    if start > 0 && !chars[start - 1].is_whitespace() {
        if let Some(offset) = chars[lo..hi].iter().position(|c| c.is_whitespace()) {
            lo += offset;
        }
    }
    // Trailing partial word: the window closed in the middle of a token.
    if end < chars.len() && !chars[end].is_whitespace() {
        if let Some(offset) = chars[lo..hi].iter().rposition(|c| c.is_whitespace()) {
            hi = lo + offset;
        }
    }

    let trimmed: String = chars[lo..hi].iter().collect();
    let trimmed = trimmed.trim();
    if trimmed.is_empty() {
        chars[start..end].iter().collect::<String>().trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Wrap whole-word, case-insensitive occurrences of `terms` in one pass.
///
/// Longer terms are tried first so "consensus" wins over "con"; a single pass
/// means inserted markers are never matched themselves.
fn highlight(text: &str, terms: &[String], config: &SnippetConfig) -> String {
    if terms.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<&str> = terms.iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    let alternatives: Vec<String> = sorted.iter().map(|t| whole_word_pattern(t)).collect();
    let pattern = format!("(?i)(?:{})", alternatives.join("|"));

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, "highlight pattern rejected, returning plain snippet");
            return text.to_string();
        }
    };

    re.replace_all(text, |caps: &Captures| {
        format!("{}{}{}", config.open_marker, &caps[0], config.close_marker)
    })
    .into_owned()
}

/// `\b` only applies next to word characters; "c++" must still match at its end.
fn whole_word_pattern(term: &str) -> String {
    let escaped = regex::escape(term);
    let leading = term.chars().next().is_some_and(is_word_char);
    let trailing = term.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if leading { r"\b" } else { "" },
        escaped,
        if trailing { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
