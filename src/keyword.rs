//! Keyword normalization for incoming triggers.
//!
//! Trigger text arrives pre-tokenized (split on `/` or whitespace by the
//! transport layer). Before resolution each token is trimmed, internal
//! space runs are collapsed, and alias spellings fold to their canonical
//! keyword.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Alias spellings folded to their canonical keyword.
    static ref ALIASES: HashMap<&'static str, &'static str> = {
        let mut table = HashMap::new();
        table.insert("카드 뽑기", "카드뽑기");
        table.insert("주사위", "다이스");
        table.insert("운세보기", "운세");
        table.insert("도움", "도움말");
        table
    };
}

/// Collapse internal whitespace runs to single spaces.
fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize one keyword; `None` when nothing but whitespace remains.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let collapsed = collapse_spaces(raw);
    if collapsed.is_empty() {
        return None;
    }
    match ALIASES.get(collapsed.as_str()) {
        Some(canonical) => Some((*canonical).to_string()),
        None => Some(collapsed),
    }
}

/// Normalize a keyword sequence.
///
/// Blank entries are dropped. An input that normalizes to nothing yields
/// the supplied fallback (the help keyword) so callers never see an
/// empty sequence.
pub fn normalize_keywords(raw: &[String], fallback: &str) -> Vec<String> {
    let normalized: Vec<String> = raw
        .iter()
        .filter_map(|keyword| normalize_keyword(keyword))
        .collect();
    if normalized.is_empty() {
        vec![fallback.to_string()]
    } else {
        normalized
    }
}
