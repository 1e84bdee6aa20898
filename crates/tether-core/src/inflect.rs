//! Minimal English inflection for accessor-name canonicalization.
//!
//! The dynamic accessor resolver turns free-form names like
//! `admin_user_followers` into a canonical type token. That only needs
//! singularization of the trailing word plus snake_case → UpperCamelCase,
//! so the rule set here is deliberately small.

/// Plural forms that don't follow the suffix rules.
const IRREGULARS: &[(&str, &str)] = &[("people", "person"), ("children", "child")];

/// Singularize a snake_case word. Only the tail is inflected, so compound
/// tokens work: `admin_users` → `admin_user`.
pub fn singularize(word: &str) -> String {
    for (plural, singular) in IRREGULARS {
        if word == *plural {
            return singular.to_string();
        }
        if let Some(stem) = word.strip_suffix(&format!("_{plural}")) {
            return format!("{stem}_{singular}");
        }
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            let keep = &suffix[..suffix.len() - 2];
            return format!("{stem}{keep}");
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// snake_case → UpperCamelCase.
pub fn camelize(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Canonicalize an accessor type token: singularize, then camelize.
/// `admin_users` → `AdminUser`.
pub fn canonical_type_token(token: &str) -> String {
    camelize(&singularize(token))
}
