//! Conversion between Notion pages and the proxy's stream JSON.
//!
//! The Notion database uses these properties:
//!
//! | Property   | Notion type | Field          |
//! |------------|-------------|----------------|
//! | `Name`     | title       | `name`         |
//! | `URL`      | url         | `url`          |
//! | `Status`   | select      | `status`       |
//! | `Platform` | select      | `platform`     |
//! | `Streamer` | rich text   | `streamer`     |
//! | `City`     | rich text   | `city`         |
//! | `State`    | rich text   | `state`        |
//! | `Pinned`   | checkbox    | `is_pinned`    |

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use streamsource_core::stream::{validate_link, validate_text, Platform, StreamStatus, MAX_TEXT_FIELD_LENGTH};

/// A stream as served by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRecord {
    /// Notion page id.
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub streamer: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub last_edited_at: Option<String>,
}

/// Partial update accepted by `PATCH /api/streams/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub streamer: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub is_pinned: Option<bool>,
}

fn status_label(status: StreamStatus) -> &'static str {
    match status {
        StreamStatus::Live => "Live",
        StreamStatus::Offline => "Offline",
        StreamStatus::Unknown => "Unknown",
    }
}

fn platform_label(platform: Platform) -> &'static str {
    match platform {
        Platform::TikTok => "TikTok",
        Platform::Facebook => "Facebook",
        Platform::Twitch => "Twitch",
        Platform::YouTube => "YouTube",
        Platform::Instagram => "Instagram",
        Platform::Other => "Other",
    }
}

/// Concatenate the `plain_text` of a rich text or title array.
fn plain_text(parts: Option<&Value>) -> Option<String> {
    let text: String = parts?
        .as_array()?
        .iter()
        .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Lowercased select name, normalized to the API value when it is known.
fn select_value(prop: Option<&Value>) -> Option<String> {
    let name = prop?.get("select")?.get("name")?.as_str()?.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

impl StreamRecord {
    /// Map a Notion page object. Returns `None` when the page has no id.
    pub fn from_page(page: &Value) -> Option<Self> {
        let id = page.get("id")?.as_str()?.to_string();
        let empty = Map::new();
        let props = page
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        Some(Self {
            id,
            name: props
                .get("Name")
                .and_then(|p| plain_text(p.get("title")))
                .unwrap_or_default(),
            url: props
                .get("URL")
                .and_then(|p| p.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            status: select_value(props.get("Status")),
            platform: select_value(props.get("Platform")),
            streamer: props.get("Streamer").and_then(|p| plain_text(p.get("rich_text"))),
            city: props.get("City").and_then(|p| plain_text(p.get("rich_text"))),
            state: props.get("State").and_then(|p| plain_text(p.get("rich_text"))),
            is_pinned: props
                .get("Pinned")
                .and_then(|p| p.get("checkbox"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            is_archived: page.get("archived").and_then(Value::as_bool).unwrap_or(false),
            last_edited_at: page
                .get("last_edited_time")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn rich_text(value: &str) -> Value {
    if value.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": { "content": value } }])
    }
}

fn select(label: &str) -> Value {
    json!({ "select": { "name": label } })
}

impl StreamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.status.is_none()
            && self.platform.is_none()
            && self.streamer.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.is_pinned.is_none()
    }

    /// Validate the patch and build the Notion `properties` object.
    ///
    /// Empty strings clear text and URL properties.
    pub fn to_properties(&self) -> Result<Value, String> {
        if self.is_empty() {
            return Err("Patch must change at least one field".into());
        }

        let mut props = Map::new();

        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err("name can't be blank".into());
            }
            validate_text("name", name, MAX_TEXT_FIELD_LENGTH)?;
            props.insert("Name".into(), json!({ "title": rich_text(name) }));
        }
        if let Some(url) = &self.url {
            let url = url.trim();
            let value = if url.is_empty() {
                Value::Null
            } else {
                Value::String(validate_link(url)?)
            };
            props.insert("URL".into(), json!({ "url": value }));
        }
        if let Some(status) = &self.status {
            let status = StreamStatus::parse(&status.trim().to_lowercase()).ok_or_else(|| {
                format!("status must be one of: {}", StreamStatus::accepted())
            })?;
            props.insert("Status".into(), select(status_label(status)));
        }
        if let Some(platform) = &self.platform {
            let platform = Platform::parse(&platform.trim().to_lowercase()).ok_or_else(|| {
                format!("platform must be one of: {}", Platform::accepted())
            })?;
            props.insert("Platform".into(), select(platform_label(platform)));
        }
        for (field, property, value) in [
            ("streamer", "Streamer", &self.streamer),
            ("city", "City", &self.city),
            ("state", "State", &self.state),
        ] {
            if let Some(value) = value {
                let value = value.trim();
                validate_text(field, value, MAX_TEXT_FIELD_LENGTH)?;
                props.insert(property.into(), json!({ "rich_text": rich_text(value) }));
            }
        }
        if let Some(pinned) = self.is_pinned {
            props.insert("Pinned".into(), json!({ "checkbox": pinned }));
        }

        Ok(Value::Object(props))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Value {
        json!({
            "object": "page",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "archived": false,
            "last_edited_time": "2026-05-02T18:04:00.000Z",
            "properties": {
                "Name": { "type": "title", "title": [
                    { "plain_text": "Downtown " }, { "plain_text": "march" }
                ] },
                "URL": { "type": "url", "url": "https://www.twitch.tv/someone" },
                "Status": { "type": "select", "select": { "name": "Live" } },
                "Platform": { "type": "select", "select": { "name": "Twitch" } },
                "Streamer": { "type": "rich_text", "rich_text": [{ "plain_text": "Someone" }] },
                "City": { "type": "rich_text", "rich_text": [] },
                "Pinned": { "type": "checkbox", "checkbox": true }
            }
        })
    }

    #[test]
    fn page_maps_to_record() {
        let record = StreamRecord::from_page(&sample_page()).unwrap();
        assert_eq!(record.name, "Downtown march");
        assert_eq!(record.url.as_deref(), Some("https://www.twitch.tv/someone"));
        assert_eq!(record.status.as_deref(), Some("live"));
        assert_eq!(record.platform.as_deref(), Some("twitch"));
        assert_eq!(record.streamer.as_deref(), Some("Someone"));
        assert_eq!(record.city, None);
        assert_eq!(record.state, None);
        assert!(record.is_pinned);
        assert!(!record.is_archived);
    }

    #[test]
    fn page_without_properties_still_maps() {
        let record = StreamRecord::from_page(&json!({ "id": "abc", "archived": true })).unwrap();
        assert_eq!(record.name, "");
        assert!(record.is_archived);
        assert!(StreamRecord::from_page(&json!({ "properties": {} })).is_none());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(StreamPatch::default().to_properties().is_err());
    }

    #[test]
    fn patch_builds_notion_properties() {
        let patch = StreamPatch {
            status: Some("OFFLINE".into()),
            platform: Some("youtube".into()),
            city: Some("".into()),
            is_pinned: Some(false),
            ..Default::default()
        };
        let props = patch.to_properties().unwrap();
        assert_eq!(props["Status"]["select"]["name"], "Offline");
        assert_eq!(props["Platform"]["select"]["name"], "YouTube");
        assert_eq!(props["City"]["rich_text"], json!([]));
        assert_eq!(props["Pinned"]["checkbox"], false);
        assert!(props.get("Name").is_none());
    }

    #[test]
    fn patch_rejects_unknown_status_and_bad_url() {
        let status = StreamPatch {
            status: Some("sleeping".into()),
            ..Default::default()
        };
        assert!(status.to_properties().unwrap_err().contains("live"));

        let url = StreamPatch {
            url: Some("javascript:alert(1)".into()),
            ..Default::default()
        };
        assert!(url.to_properties().is_err());
    }

    #[test]
    fn patch_clears_url_with_empty_string() {
        let patch = StreamPatch {
            url: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(patch.to_properties().unwrap()["URL"]["url"], Value::Null);
    }
}
