//! Post editor state: the draft being edited plus its category, tag and
//! image selections.

use serde::Serialize;
use uuid::Uuid;

use crate::models::Post;

/// URL slug derived from a title: lowercase, trimmed, everything except
/// ASCII letters, digits, whitespace and `-` dropped, whitespace runs
/// collapsed into a single `-`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_gap = false;
    for c in lowered.trim().chars() {
        if c.is_whitespace() {
            if !in_gap {
                slug.push('-');
                in_gap = true;
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
            in_gap = false;
        }
    }
    slug
}

/// Row written to `posts` on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostForm {
    editing: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

impl PostForm {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn editing(post: &Post) -> Self {
        Self {
            editing: Some(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
            categories: post.categories.clone(),
            tags: post.tags.clone(),
            images: post.images.clone(),
        }
    }

    /// Id of the post being edited; `None` for a new post.
    pub fn target(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn select_categories(&mut self, names: impl IntoIterator<Item = String>) {
        self.categories = names.into_iter().collect();
    }

    pub fn select_tags(&mut self, names: impl IntoIterator<Item = String>) {
        self.tags = names.into_iter().collect();
    }

    pub fn toggle_category(&mut self, name: &str) {
        toggle(&mut self.categories, name);
    }

    pub fn toggle_tag(&mut self, name: &str) {
        toggle(&mut self.tags, name);
    }

    pub fn push_images(&mut self, urls: impl IntoIterator<Item = String>) {
        self.images.extend(urls);
    }

    pub fn drop_image(&mut self, url: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|img| img != url);
        before != self.images.len()
    }

    pub fn reset(&mut self) {
        *self = Self::blank();
    }

    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            slug: slugify(&self.title),
            content: self.content.clone(),
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            images: self.images.clone(),
        }
    }
}

fn toggle(list: &mut Vec<String>, name: &str) {
    match list.iter().position(|n| n == name) {
        Some(pos) => {
            list.remove(pos);
        }
        None => list.push(name.to_string()),
    }
}
