//! # Domain Models
//!
//! Typed records for every remote collection the admin touches.
//! The remote store owns all of them; these are transient, UI-scoped copies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A row of a named remote collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Remote collection name.
    const TABLE: &'static str;
    /// Primary key. `Display` renders it as a filter value.
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;
}

/// Records carrying a creation time, used for deterministic ordering.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

/// Remote arrays may come back as `null`; treat that as empty.
fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A blog post as stored in `posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Rich-text HTML produced by the editor.
    #[serde(default)]
    pub content: String,
    /// Category names; they reference rows of `categories`.
    #[serde(default, deserialize_with = "nullable_list")]
    pub categories: Vec<String>,
    /// Tag names; they reference rows of `tags`.
    #[serde(default, deserialize_with = "nullable_list")]
    pub tags: Vec<String>,
    /// Public URLs of uploaded images.
    #[serde(default, deserialize_with = "nullable_list")]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The slice of a post the comment views need (`select=id,title,created_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PostSummary {
    pub const COLUMNS: &'static str = "id,title,created_at";
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            created_at: Some(post.created_at),
        }
    }
}

/// A top-level comment on a post. Author fields are a snapshot taken at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

/// A reply to a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

/// Where an ad is rendered on the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdPlacement {
    #[default]
    #[serde(alias = "Header")]
    Header,
    Top,
    Bottom,
    Sidebar,
    Footer,
    InContent,
    Middle,
    PostTop,
    PostBottom,
}

impl AdPlacement {
    pub const ALL: [AdPlacement; 9] = [
        AdPlacement::Header,
        AdPlacement::Top,
        AdPlacement::Bottom,
        AdPlacement::Sidebar,
        AdPlacement::Footer,
        AdPlacement::InContent,
        AdPlacement::Middle,
        AdPlacement::PostTop,
        AdPlacement::PostBottom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdPlacement::Header => "header",
            AdPlacement::Top => "top",
            AdPlacement::Bottom => "bottom",
            AdPlacement::Sidebar => "sidebar",
            AdPlacement::Footer => "footer",
            AdPlacement::InContent => "in-content",
            AdPlacement::Middle => "middle",
            AdPlacement::PostTop => "post-top",
            AdPlacement::PostBottom => "post-bottom",
        }
    }
}

impl fmt::Display for AdPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AdPlacement {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AdPlacement::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| DomainError::UnknownPlacement(s.to_string()))
    }
}

/// An ad as stored in `ads`. Column names are camelCase on the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: i64,
    pub image_url: String,
    pub link_url: String,
    #[serde(default)]
    pub alt_text: String,
    pub placement: AdPlacement,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// The editable fields of an ad, sent as-is on insert and update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdDraft {
    pub image_url: String,
    pub link_url: String,
    pub alt_text: String,
    pub placement: AdPlacement,
}

impl From<&Ad> for AdDraft {
    fn from(ad: &Ad) -> Self {
        Self {
            image_url: ad.image_url.clone(),
            link_url: ad.link_url.clone(),
            alt_text: ad.alt_text.clone(),
            placement: ad.placement,
        }
    }
}

/// A row of `users`, 1:1 with a remote auth identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Editable profile fields. Email is deliberately absent: it is immutable here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// The identity behind a session, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session. Tokens are redacted from `Debug`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Session-change notifications pushed by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

macro_rules! record {
    ($ty:ty, $table:literal, $id:ty) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;
            type Id = $id;

            fn id(&self) -> &$id {
                &self.id
            }
        }
    };
}

record!(Post, "posts", Uuid);
record!(PostSummary, "posts", Uuid);
record!(Comment, "comments", Uuid);
record!(Reply, "replies", Uuid);
record!(Ad, "ads", i64);
record!(UserProfile, "users", Uuid);
record!(Category, "categories", i64);
record!(Tag, "tags", i64);

impl Timestamped for Post {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Comment {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Reply {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Ad {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Object storage bucket names.
pub mod buckets {
    pub const IMAGES: &str = "images";
    pub const PROFILE_IMAGES: &str = "profile-images";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ad_uses_camel_case_columns() {
        let ad: Ad = serde_json::from_value(json!({
            "id": 7,
            "imageUrl": "https://cdn/x.png",
            "linkUrl": "https://shop",
            "altText": "Shop",
            "placement": "post-top",
            "created_at": "2024-11-02T10:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(ad.placement, AdPlacement::PostTop);
        assert_eq!(ad.alt_text, "Shop");

        let back = serde_json::to_value(&ad).unwrap();
        assert_eq!(back["imageUrl"], "https://cdn/x.png");
        assert!(back.get("created_at").is_some());
    }

    #[test]
    fn legacy_capitalised_header_placement_is_accepted() {
        let p: AdPlacement = serde_json::from_value(json!("Header")).unwrap();
        assert_eq!(p, AdPlacement::Header);
        assert!(serde_json::from_value::<AdPlacement>(json!("banner")).is_err());
    }

    #[test]
    fn placement_parses_case_insensitively() {
        assert_eq!("In-Content".parse::<AdPlacement>(), Ok(AdPlacement::InContent));
        assert_eq!(
            "nowhere".parse::<AdPlacement>(),
            Err(DomainError::UnknownPlacement("nowhere".into()))
        );
    }

    #[test]
    fn null_post_lists_decode_as_empty() {
        let post: Post = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "title": "Hello",
            "content": "<p>hi</p>",
            "categories": null,
            "tags": ["rust"],
            "created_at": "2024-11-02T10:00:00Z"
        }))
        .unwrap();
        assert!(post.categories.is_empty());
        assert_eq!(post.tags, vec!["rust".to_string()]);
        assert!(post.images.is_empty());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = Session {
            access_token: "secret-token".into(),
            refresh_token: Some("refresh".into()),
            expires_at: None,
            user: AuthUser {
                id: Uuid::nil(),
                email: None,
            },
        };
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret-token"));
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[test]
    fn profile_changes_never_carry_email() {
        let changes = ProfileChanges {
            full_name: Some("Ada".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, json!({ "full_name": "Ada" }));
    }
}
