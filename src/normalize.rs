//! Role-name canonicalization.
//!
//! Role names have historically been entered as free text ("QA Tester",
//! "qa_tester", "QA Testers") and must all resolve to the same registry
//! entry. [`normalize`] produces the canonical map key; [`variations`]
//! produces the candidate keys a lookup is matched under.

use std::collections::HashSet;

/// Canonicalizes a role name into a registry key.
///
/// Lowercases, trims, collapses any run of whitespace or underscores into a
/// single underscore, and strips leading/trailing underscores. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut pending_sep = false;
    for ch in lower.chars() {
        if ch.is_whitespace() || ch == '_' {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Returns the candidate key set for a role name.
///
/// Always contains `normalize(name)`, plus the key with underscores removed,
/// the key with underscores replaced by spaces, a naive singular form
/// (single trailing `s` stripped), and a naive plural form (`s` appended
/// unless already present).
pub fn variations(name: &str) -> HashSet<String> {
    let key = normalize(name);
    let mut out = HashSet::new();
    if key.is_empty() {
        out.insert(key);
        return out;
    }
    out.insert(key.replace('_', ""));
    out.insert(key.replace('_', " "));
    if let Some(singular) = key.strip_suffix('s') {
        out.insert(singular.to_string());
    } else {
        out.insert(format!("{key}s"));
    }
    out.insert(key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_should_canonicalize_free_text() {
        assert_eq!(normalize("QA Tester"), "qa_tester");
        assert_eq!(normalize("  Project   Manager  "), "project_manager");
        assert_eq!(normalize("__hr__admin__"), "hr_admin");
        assert_eq!(normalize("hr _ admin"), "hr_admin");
    }

    #[test]
    fn normalize_should_be_idempotent() {
        for input in ["QA Tester", "  a  b ", "_x_", "already_canonical", "", "  "] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn variations_should_contain_canonical_key() {
        for input in ["QA Tester", "admins", "x", ""] {
            assert!(variations(input).contains(&normalize(input)), "input: {input:?}");
        }
    }

    #[test]
    fn variations_should_cover_separator_and_number_forms() {
        let vars = variations("QA Testers");
        assert!(vars.contains("qa_testers"));
        assert!(vars.contains("qatesters"));
        assert!(vars.contains("qa testers"));
        assert!(vars.contains("qa_tester"));
    }

    #[test]
    fn variations_should_pluralize_non_s_endings() {
        let vars = variations("accountant");
        assert!(vars.contains("accountant"));
        assert!(vars.contains("accountants"));
    }
}
