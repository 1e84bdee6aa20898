//! Dynamic per-type accessor names.
//!
//! Callers can ask for followers through free-form names like
//! `user_followers` or `count_admin_user_followers` instead of spelling out
//! the type filter. The grammar is two fixed patterns:
//!
//! - `count_<type>_followers` → count of followers of that type
//! - `<type>_followers`       → the follow rows for that type
//!
//! Parsing is pure — no delegation happens here — so capability-checking
//! callers can probe [`recognizes`] without side effects. A name matching
//! neither pattern is "not ours": the caller falls through to its normal
//! resolution and only a genuinely unhandled name becomes its error.

use tether_core::Follow;

/// What a recognized accessor name asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Followers,
    FollowersCount,
}

/// A parsed accessor name: the request kind plus the raw (plural,
/// snake_case) type token, not yet canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerAccessor {
    pub kind: AccessorKind,
    pub token: String,
}

/// The result of delegating a recognized accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorOutcome {
    Rows(Vec<Follow>),
    Count(u64),
}

/// Parse an accessor name. `None` means the name doesn't match either
/// pattern; an empty type token never matches.
pub fn parse(name: &str) -> Option<FollowerAccessor> {
    if let Some(rest) = name.strip_prefix("count_") {
        if let Some(token) = rest.strip_suffix("_followers") {
            if !token.is_empty() {
                return Some(FollowerAccessor {
                    kind: AccessorKind::FollowersCount,
                    token: token.to_string(),
                });
            }
        }
    }
    if let Some(token) = name.strip_suffix("_followers") {
        if !token.is_empty() {
            return Some(FollowerAccessor {
                kind: AccessorKind::Followers,
                token: token.to_string(),
            });
        }
    }
    None
}

/// Pure predicate: would [`parse`] recognize this name?
pub fn recognizes(name: &str) -> bool {
    parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_followers_form() {
        let accessor = parse("user_followers").unwrap();
        assert_eq!(accessor.kind, AccessorKind::Followers);
        assert_eq!(accessor.token, "user");
    }

    #[test]
    fn parses_count_form() {
        let accessor = parse("count_admin_users_followers").unwrap();
        assert_eq!(accessor.kind, AccessorKind::FollowersCount);
        assert_eq!(accessor.token, "admin_users");
    }

    #[test]
    fn count_prefix_wins_over_plain_form() {
        // Without precedence this would parse as the "count_user" type.
        let accessor = parse("count_user_followers").unwrap();
        assert_eq!(accessor.kind, AccessorKind::FollowersCount);
        assert_eq!(accessor.token, "user");
    }

    #[test]
    fn rejects_unrelated_names() {
        assert!(parse("followers").is_none());
        assert!(parse("follower_count").is_none());
        assert!(parse("user_following").is_none());
    }

    #[test]
    fn recognizes_is_pure_parse() {
        assert!(recognizes("band_followers"));
        assert!(recognizes("count_bands_followers"));
        assert!(!recognizes("not_a_thing"));
    }
}
