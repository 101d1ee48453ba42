//! Targets of polymorphic notes.

use crate::stream::string_enum;

/// Maximum note body length.
pub const MAX_NOTE_LENGTH: usize = 10_000;

string_enum! {
    /// Record kinds a note can be attached to.
    NotableType {
        Stream => "stream",
        Streamer => "streamer",
        Annotation => "annotation",
        Timestamp => "timestamp",
    }
}

pub fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content can't be blank".into());
    }
    if content.chars().count() > MAX_NOTE_LENGTH {
        return Err(format!(
            "Content is too long (maximum is {MAX_NOTE_LENGTH} characters)"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rules() {
        assert!(validate_content("Saw tear gas at 9pm").is_ok());
        assert!(validate_content("\n ").is_err());
        assert!(validate_content(&"a".repeat(MAX_NOTE_LENGTH + 1)).is_err());
    }

    #[test]
    fn notable_types_parse() {
        assert_eq!(NotableType::parse("streamer"), Some(NotableType::Streamer));
        assert_eq!(NotableType::parse("user"), None);
    }
}
