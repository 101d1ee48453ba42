//! Ignore-list entry types, value normalization, and matching.
//!
//! Ignore lists block usernames, exact URLs, and whole domains from being
//! catalogued. Values are stored normalized so that lookups are exact.

use crate::stream::{host_of, string_enum};

string_enum! {
    /// What an ignore-list entry blocks.
    IgnoreListType {
        TwitchUser => "twitch_user",
        DiscordUser => "discord_user",
        Url => "url",
        Domain => "domain",
    }
}

/// Maximum accepted length of an ignore-list value.
pub const MAX_VALUE_LENGTH: usize = 2048;

/// Normalize a raw value for storage and comparison.
///
/// - usernames: trimmed, leading `@` removed, lowercased
/// - urls: trimmed, scheme and host lowercased, trailing `/` removed
/// - domains: scheme, `www.`, path, and port removed, lowercased
pub fn normalize_value(list_type: IgnoreListType, raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Value can't be blank".into());
    }
    if trimmed.len() > MAX_VALUE_LENGTH {
        return Err(format!(
            "Value is too long (maximum is {MAX_VALUE_LENGTH} characters)"
        ));
    }

    let normalized = match list_type {
        IgnoreListType::TwitchUser | IgnoreListType::DiscordUser => {
            trimmed.trim_start_matches('@').to_lowercase()
        }
        IgnoreListType::Url => normalize_url(trimmed),
        IgnoreListType::Domain => normalize_domain(trimmed),
    };

    if normalized.is_empty() {
        return Err(format!("Value '{raw}' is not a valid {list_type}"));
    }
    Ok(normalized)
}

fn normalize_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.find(['/', '?', '#']) {
                Some(idx) => rest.split_at(idx),
                None => (rest, ""),
            };
            format!(
                "{}://{}{}",
                scheme.to_ascii_lowercase(),
                authority.to_ascii_lowercase(),
                path
            )
        }
        None => trimmed.to_string(),
    }
}

fn normalize_domain(value: &str) -> String {
    let host = if value.contains("://") {
        host_of(value).unwrap_or_default()
    } else {
        value
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    host.trim_start_matches("www.").trim_end_matches('.').to_string()
}

/// A normalized entry used for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreEntry {
    pub list_type: IgnoreListType,
    pub value: String,
}

/// Find the first entry that blocks `link`.
///
/// URL entries match when the normalized link starts with the entry; domain
/// entries match the link's host or any subdomain of it.
pub fn match_link<'a>(entries: &'a [IgnoreEntry], link: &str) -> Option<&'a IgnoreEntry> {
    let normalized_link = normalize_url(link.trim());
    let host = host_of(link).map(|h| h.trim_start_matches("www.").to_string());

    entries.iter().find(|entry| match entry.list_type {
        IgnoreListType::Url => normalized_link.starts_with(&entry.value),
        IgnoreListType::Domain => host
            .as_deref()
            .is_some_and(|h| h == entry.value || h.ends_with(&format!(".{}", entry.value))),
        IgnoreListType::TwitchUser | IgnoreListType::DiscordUser => false,
    })
}

/// Find an entry of `list_type` blocking `username`.
pub fn match_username<'a>(
    entries: &'a [IgnoreEntry],
    list_type: IgnoreListType,
    username: &str,
) -> Option<&'a IgnoreEntry> {
    let wanted = username.trim().trim_start_matches('@').to_lowercase();
    entries
        .iter()
        .find(|e| e.list_type == list_type && e.value == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(list_type: IgnoreListType, value: &str) -> IgnoreEntry {
        IgnoreEntry {
            list_type,
            value: normalize_value(list_type, value).unwrap(),
        }
    }

    #[test]
    fn usernames_are_lowercased_without_at() {
        assert_eq!(
            normalize_value(IgnoreListType::TwitchUser, " @SomeUser ").unwrap(),
            "someuser"
        );
    }

    #[test]
    fn domains_drop_scheme_www_and_path() {
        assert_eq!(
            normalize_value(IgnoreListType::Domain, "https://www.Spam.example/path").unwrap(),
            "spam.example"
        );
        assert_eq!(
            normalize_value(IgnoreListType::Domain, "Spam.example:8080/x").unwrap(),
            "spam.example"
        );
    }

    #[test]
    fn urls_keep_path_case_but_drop_trailing_slash() {
        assert_eq!(
            normalize_value(IgnoreListType::Url, "HTTPS://Example.com/Live/").unwrap(),
            "https://example.com/Live"
        );
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(normalize_value(IgnoreListType::Domain, "   ").is_err());
        assert!(normalize_value(IgnoreListType::TwitchUser, "@").is_err());
    }

    #[test]
    fn domain_entries_match_subdomains() {
        let entries = vec![entry(IgnoreListType::Domain, "spam.example")];
        assert!(match_link(&entries, "https://live.spam.example/x").is_some());
        assert!(match_link(&entries, "https://www.spam.example").is_some());
        assert!(match_link(&entries, "https://notspam.example").is_none());
    }

    #[test]
    fn url_entries_match_by_prefix() {
        let entries = vec![entry(IgnoreListType::Url, "https://twitch.tv/badactor")];
        assert!(match_link(&entries, "https://Twitch.tv/badactor/").is_some());
        assert!(match_link(&entries, "https://twitch.tv/someoneelse").is_none());
    }

    #[test]
    fn username_match_is_type_scoped() {
        let entries = vec![entry(IgnoreListType::DiscordUser, "troll")];
        assert!(match_username(&entries, IgnoreListType::DiscordUser, "@Troll").is_some());
        assert!(match_username(&entries, IgnoreListType::TwitchUser, "troll").is_none());
    }
}
