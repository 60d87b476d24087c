/// Data models for civic-service
///
/// Documents are schemaless JSON maps in the store; these types give them
/// their shape on the way in and out. Counter fields default to zero so
/// records written before a counter existed still deserialize.
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Serialize a record into the field map a document carries.
pub(crate) fn document_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "expected an object record, got {}",
            other
        ))),
    }
}

/// Fixed enumeration of administrative areas a report can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Area {
    Gasabo,
    Nyarugenge,
    Kicukiro,
    Kamonyi,
}

impl Area {
    pub const ALL: [Area; 4] = [Area::Gasabo, Area::Nyarugenge, Area::Kicukiro, Area::Kamonyi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Gasabo => "Gasabo",
            Area::Nyarugenge => "Nyarugenge",
            Area::Kicukiro => "Kicukiro",
            Area::Kamonyi => "Kamonyi",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feed scoping: every area, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaFilter {
    #[default]
    All,
    Only(Area),
}

/// Government ministry a report is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ministry {
    #[default]
    Common,
    Health,
    Education,
    Infrastructure,
    Agriculture,
    LocalGovernment,
    Justice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Citizen,
    AreaRepresentative,
    Default,
}

impl Default for Role {
    fn default() -> Self {
        Role::Citizen
    }
}

/// The signed-in principal every mutation is authorized against. Lives for
/// the session only; never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub photo_url: Option<String>,
}

/// Profile record in the `profiles` collection, keyed by auth identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
}

/// An area-tagged citizen report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default)]
    pub ministry: Ministry,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub dislike_count: i64,
    #[serde(default)]
    pub comment_count: i64,
}

impl Post {
    /// Case-insensitive substring match over title and content. An empty
    /// query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.content.to_lowercase().contains(&query)
    }
}

/// Input for creating a post. The author and timestamp come from the session
/// and the store, not the caller.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub area: Option<Area>,
    pub ministry: Ministry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// A message in the shared forum chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumMessage {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(title: &str, content: &str) -> Post {
        Post {
            id: "p1".to_string(),
            title: title.to_string(),
            subtitle: None,
            content: content.to_string(),
            image_url: None,
            area: Some(Area::Gasabo),
            ministry: Ministry::default(),
            author_id: "u1".to_string(),
            author_name: "claudine".to_string(),
            created_at: Utc::now(),
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
        }
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_content() {
        let p = post("Broken street light", "Umuganda road needs repair");
        assert!(p.matches_search("STREET"));
        assert!(p.matches_search("umuganda"));
        assert!(p.matches_search(""));
        assert!(p.matches_search("  road  "));
        assert!(!p.matches_search("water"));
    }

    #[test]
    fn role_round_trips_kebab_case() {
        let json = serde_json::to_string(&Role::AreaRepresentative).unwrap();
        assert_eq!(json, "\"area-representative\"");
        let role: Role = serde_json::from_str("\"citizen\"").unwrap();
        assert_eq!(role, Role::Citizen);
    }

    #[test]
    fn post_counters_default_to_zero() {
        let raw = serde_json::json!({
            "id": "p1",
            "title": "t",
            "content": "c",
            "area": "Kicukiro",
            "author_id": "u1",
            "author_name": "a",
            "created_at": "2026-01-05T08:30:00Z",
        });
        let post: Post = serde_json::from_value(raw).unwrap();
        assert_eq!(post.like_count, 0);
        assert_eq!(post.dislike_count, 0);
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.ministry, Ministry::Common);
        assert_eq!(post.area, Some(Area::Kicukiro));
    }
}
