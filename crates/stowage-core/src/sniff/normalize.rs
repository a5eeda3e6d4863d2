/// Normalize a header caption for fuzzy matching.
///
/// Steps:
/// 1. Trim and lowercase
/// 2. Drop dots and apostrophes outright, so dotted abbreviations stay one
///    word
/// 3. Keep alphanumerics, collapse every run of other characters into a
///    single space
///
/// "Shipping Mark", "SHIPPING-MARK", "shipping_mark" and "  Shipping mark "
/// all normalize to "shipping mark"; "C.B.M." normalizes to "cbm".
pub fn normalize_label(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();

    let mut result = String::with_capacity(lower.len());
    let mut prev_space = true; // start true to skip leading separators
    for c in lower.chars() {
        if c == '.' || c == '\'' {
            continue;
        }
        if c.is_alphanumeric() {
            result.push(c);
            prev_space = false;
        } else if !prev_space {
            result.push(' ');
            prev_space = true;
        }
    }
    if result.ends_with(' ') {
        result.pop();
    }

    result
}

/// True when the normalized header caption contains the normalized target
/// name as a substring.
///
/// "Shipping Mark" matches target "shipping_mark", and so does a longer
/// caption like "Shipping Mark / Consignee". Empty labels never match.
pub fn labels_match(header: &str, target: &str) -> bool {
    let h = normalize_label(header);
    let t = normalize_label(target);
    if h.is_empty() || t.is_empty() {
        return false;
    }
    h.contains(&t)
}
