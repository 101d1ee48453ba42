//! Annotation and timestamp enumerations and validation.

use crate::stream::string_enum;
use crate::types::Timestamp;

/// Maximum title length for annotations and timestamps.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Relevance score bounds for annotation-stream links.
pub const MIN_RELEVANCE: i16 = 1;
pub const MAX_RELEVANCE: i16 = 5;
pub const DEFAULT_RELEVANCE: i16 = 3;

string_enum! {
    /// Kind of real-world event an annotation marks.
    EventType {
        PoliceActivity => "police_activity",
        Arrest => "arrest",
        UseOfForce => "use_of_force",
        MedicalEmergency => "medical_emergency",
        ProtestStart => "protest_start",
        ProtestEnd => "protest_end",
        Violence => "violence",
        PropertyDamage => "property_damage",
        DispersalOrder => "dispersal_order",
        Curfew => "curfew",
        Other => "other",
    }
}

string_enum! {
    PriorityLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// Moderation state of an annotation.
    ReviewStatus {
        Pending => "pending",
        Reviewed => "reviewed",
        Flagged => "flagged",
        Dismissed => "dismissed",
        Resolved => "resolved",
    }
}

/// Validate a required title.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title can't be blank".into());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title is too long (maximum is {MAX_TITLE_LENGTH} characters)"
        ));
    }
    Ok(())
}

pub fn validate_relevance(score: i16) -> Result<(), String> {
    if !(MIN_RELEVANCE..=MAX_RELEVANCE).contains(&score) {
        return Err(format!(
            "relevance_score must be between {MIN_RELEVANCE} and {MAX_RELEVANCE}, got {score}"
        ));
    }
    Ok(())
}

/// Offsets into a stream's recording are seconds from the stream start.
pub fn validate_stream_offset(seconds: i32) -> Result<(), String> {
    if seconds < 0 {
        return Err(format!(
            "stream_timestamp_seconds must be zero or positive, got {seconds}"
        ));
    }
    Ok(())
}

/// Compute the new `resolved_at` for a review status change.
///
/// Entering `resolved` stamps `now` (keeping an existing stamp); any other
/// status clears it.
pub fn resolved_at_for(
    next: ReviewStatus,
    current_resolved_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match next {
        ReviewStatus::Resolved => current_resolved_at.or(Some(now)),
        _ => None,
    }
}

/// Normalize free-form tags: trimmed, lowercased, deduplicated, blanks dropped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let t = tag.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
