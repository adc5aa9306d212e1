use crate::error::{Error, Result};

/// Expands `key` to one of `candidates`: exact match first, then a unique prefix.
pub fn expand_key<'a>(key: &str, candidates: &[&'a str]) -> Result<&'a str> {
    let key = key.trim().to_lowercase();

    // 1. Exact match
    if let Some(exact) = candidates.iter().find(|&&c| c == key) {
        return Ok(*exact);
    }

    // 2. Prefix match
    let matches: Vec<&'a str> = candidates
        .iter()
        .filter(|&&c| !key.is_empty() && c.starts_with(key.as_str()))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(Error::Validation(format!("Unknown key: '{}'", key))),
        _ => Err(Error::Validation(format!(
            "Ambiguous key: '{}' matches {:?}",
            key, matches
        ))),
    }
}
