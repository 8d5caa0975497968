//! # Name Normalization
//!
//! Deterministic key derivation for uniqueness checks.
//!
//! Catalog uniqueness is accent- and case-insensitive: "Señorío" and
//! "senorio" refer to the same brand. Every create/rename derives a
//! `normalized_name` through [`normalize`] and the database enforces a
//! unique index on that column.

/// Normalizes a display name into a uniqueness key.
///
/// Lower-cases, folds Latin diacritics to their base letter and collapses
/// whitespace runs into single spaces.
///
/// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
///
/// ## Example
/// ```rust
/// use barkeep_core::normalize;
///
/// assert_eq!(normalize("  Café   Añejo "), "cafe anejo");
/// assert_eq!(normalize("STELLA"), "stella");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match fold_diacritic(ch) {
            Some(folded) => out.push_str(folded),
            None => out.extend(ch.to_lowercase()),
        }
    }

    out
}

/// Maps common Latin diacritics to their base letters.
///
/// Covers the Western European range the catalog actually sees; anything
/// outside it passes through unchanged (lower-cased by the caller).
fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => "a",
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => "e",
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => "i",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => "o",
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => "u",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ý' | 'ÿ' | 'Ý' => "y",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize("Stella"), "stella");
        assert_eq!(normalize("MAHOU"), "mahou");
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("Añejo"), "anejo");
        assert_eq!(normalize("Müller"), "muller");
        assert_eq!(normalize("Curaçao"), "curacao");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  San   Miguel  "), "san miguel");
        assert_eq!(normalize("a\t b\n c"), "a b c");
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["  Café   Añejo ", "STELLA", "señorío de los llanos"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
