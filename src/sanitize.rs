//! Canonical resort name sanitization
//!
//! A resort's display name is the join key between the reference data, the
//! model artifacts on disk, and the stored per-resort forecast tables. Both
//! key derivations below must stay deterministic and stable: any change to
//! the algorithm silently breaks every existing lookup.

use crate::SkredError;
use anyhow::Result;

/// Feature-group names carry this prefix in the feature store.
pub const FEATURE_GROUP_PREFIX: &str = "aq_predictions_";

/// Feature-store identifier length limit.
const FEATURE_GROUP_MAX_LEN: usize = 63;

/// Sanitize a free-text resort name into a bare ASCII identifier.
///
/// Lowercases, folds accented and Norwegian letters to their ASCII base
/// ("ø"→"o", "å"→"a", "æ"→"ae"), maps whitespace runs to a single
/// underscore, strips everything outside `[a-z0-9_]` and collapses repeated
/// underscores. Idempotent: sanitizing an already-sanitized name is a no-op.
///
/// # Errors
/// Returns [`SkredError::InvalidName`] if nothing survives sanitization,
/// since an empty key would collide across resorts.
pub fn sanitize_name(name: &str) -> Result<String> {
    let mut out = String::with_capacity(name.len());

    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_whitespace() {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        match fold_ascii(c) {
            Some(folded) => out.push_str(folded),
            None => {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    out.push(c);
                } else if c == '_' && !out.ends_with('_') {
                    out.push('_');
                }
                // anything else is dropped
            }
        }
    }

    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        return Err(SkredError::invalid_name(name).into());
    }
    Ok(out)
}

/// Derive the feature-group name for a resort's stored forecast table.
///
/// Prefixes the sanitized name with [`FEATURE_GROUP_PREFIX`] and truncates
/// to the feature store's 63-character identifier limit.
pub fn feature_group_key(name: &str) -> Result<String> {
    let mut key = format!("{FEATURE_GROUP_PREFIX}{}", sanitize_name(name)?);
    key.truncate(FEATURE_GROUP_MAX_LEN);
    Ok(key)
}

/// Fold a lowercase character with diacritics to its ASCII base form.
fn fold_ascii(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'æ' => "ae",
        'ð' => "d",
        'þ' => "th",
        'ß' => "ss",
        'ç' => "c",
        'ñ' => "n",
        _ => return None,
    };
    Some(folded)
}
