//! URL slug generation.
//!
//! Slugs are lowercase ASCII with runs of anything else collapsed into a
//! single hyphen. Common Latin accented letters are folded to their ASCII
//! base first so that "Café Crème" becomes `cafe-creme` rather than `caf-cr-me`.

/// Slug used when a title contains no usable characters.
pub const FALLBACK_SLUG: &str = "prompt";

/// Convert `text` into a URL-safe slug.
///
/// Lowercases, folds accents, keeps `[a-z0-9_]`, replaces every other run of
/// characters with one `-`, and trims leading/trailing hyphens. May return an
/// empty string.
pub fn parameterize(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        let folded = fold_char(c);
        let mut emitted = false;
        for f in folded.chars().flat_map(char::to_lowercase) {
            if f.is_ascii_alphanumeric() || f == '_' {
                if pending_hyphen && !result.is_empty() {
                    result.push('-');
                }
                pending_hyphen = false;
                result.push(f);
                emitted = true;
            }
        }
        if !emitted {
            pending_hyphen = true;
        }
    }

    result
}

/// Parameterize `title`, falling back to [`FALLBACK_SLUG`] when empty.
pub fn base_slug(title: &str) -> String {
    let slug = parameterize(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The `attempt`-th slug candidate: `base`, then `base-1`, `base-2`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Fold a character to an ASCII approximation. Characters without one are
/// returned unchanged (and later treated as separators).
fn fold_char(c: char) -> String {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => return c.to_string(),
    };
    folded.to_string()
}
