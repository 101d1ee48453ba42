//! Stream enumerations, link validation, platform detection, and status
//! lifecycle rules.

use validator::ValidateUrl;

use crate::types::Timestamp;

/// Maximum accepted length for a stream link.
pub const MAX_LINK_LENGTH: usize = 2048;

/// Maximum accepted length for `source`, `title`, and `posted_by`.
pub const MAX_TEXT_FIELD_LENGTH: usize = 255;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $( #[serde(rename = $value)] $variant ),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $value => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Comma-separated list of accepted values, for error messages.
            pub fn accepted() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Liveness state of a stream.
    StreamStatus {
        Live => "live",
        Offline => "offline",
        Unknown => "unknown",
    }
}

string_enum! {
    /// Hosting platform, detected from the link when not supplied.
    Platform {
        TikTok => "tiktok",
        Facebook => "facebook",
        Twitch => "twitch",
        YouTube => "youtube",
        Instagram => "instagram",
        Other => "other",
    }
}

string_enum! {
    StreamKind {
        Video => "video",
        Web => "web",
        Overlay => "overlay",
        Background => "background",
    }
}

string_enum! {
    StreamOrientation {
        Vertical => "vertical",
        Horizontal => "horizontal",
    }
}

/// Parse an enum-valued field, producing a validation message on failure.
pub fn parse_field<T>(
    field: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    accepted: fn() -> String,
) -> Result<T, String> {
    parse(value).ok_or_else(|| {
        format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            accepted()
        )
    })
}

/// Validate a stream link and return its trimmed form.
///
/// Links must be absolute `http`/`https` URLs with a host.
pub fn validate_link(raw: &str) -> Result<String, String> {
    let link = raw.trim();
    if link.is_empty() {
        return Err("Link can't be blank".into());
    }
    if link.len() > MAX_LINK_LENGTH {
        return Err(format!(
            "Link is too long (maximum is {MAX_LINK_LENGTH} characters)"
        ));
    }
    let lower = link.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err("Link must start with http:// or https://".into());
    }
    if !link.to_string().validate_url() || host_of(link).is_none() {
        return Err(format!("Link '{link}' is not a valid URL"));
    }
    Ok(link.to_string())
}

/// Extract the lowercased host of an absolute URL, without port or
/// credentials.
pub fn host_of(link: &str) -> Option<String> {
    let rest = link.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?.trim().to_ascii_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Infer the platform from a link's host.
pub fn detect_platform(link: &str) -> Platform {
    let Some(host) = host_of(link) else {
        return Platform::Other;
    };
    let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    if matches("tiktok.com") {
        Platform::TikTok
    } else if matches("facebook.com") || matches("fb.watch") || matches("fb.com") {
        Platform::Facebook
    } else if matches("twitch.tv") {
        Platform::Twitch
    } else if matches("youtube.com") || matches("youtu.be") {
        Platform::YouTube
    } else if matches("instagram.com") {
        Platform::Instagram
    } else {
        Platform::Other
    }
}

/// Validate a bounded free-text field.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!(
            "{field} is too long (maximum is {max} characters)"
        ));
    }
    Ok(())
}

/// Timestamp columns touched by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusTimestamps {
    pub last_checked_at: Option<Timestamp>,
    pub last_live_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub ended_at: EndChange,
}

/// What a status change does to `ended_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndChange {
    #[default]
    Keep,
    Set(Timestamp),
    /// The stream is live again, so the previous session's end no longer applies.
    Clear,
}

impl EndChange {
    /// The timestamp to write, if any.
    pub fn stamp(self) -> Option<Timestamp> {
        match self {
            EndChange::Set(at) => Some(at),
            EndChange::Keep | EndChange::Clear => None,
        }
    }

    pub fn clears(self) -> bool {
        self == EndChange::Clear
    }
}

/// Compute which lifecycle timestamps change when a stream moves from
/// `current` to `next`.
///
/// Any status report refreshes `last_checked_at`. Going live stamps
/// `last_live_at` (and `started_at` when the stream has never started) and
/// clears `ended_at`; leaving `live` stamps `ended_at`.
pub fn apply_status_change(
    current: StreamStatus,
    next: StreamStatus,
    already_started: bool,
    now: Timestamp,
) -> StatusTimestamps {
    let mut ts = StatusTimestamps {
        last_checked_at: Some(now),
        ..Default::default()
    };

    if next == StreamStatus::Live {
        ts.last_live_at = Some(now);
        if !already_started {
            ts.started_at = Some(now);
        }
        ts.ended_at = EndChange::Clear;
    } else if current == StreamStatus::Live {
        ts.ended_at = EndChange::Set(now);
    }

    ts
}
