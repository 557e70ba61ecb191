//! Plain-text views.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use domains::{Ad, Category, CommentTree, EntityList, Navigation, Post, Route, Tag, UserProfile};
use services::{Dashboard, ServiceError, Surface};

fn stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn navigation(nav: &Navigation) -> String {
    match nav {
        Navigation::Pending => "checking session...".to_string(),
        Navigation::Render(route) => format!("{route}"),
        Navigation::Redirect(Route::Login) => "not signed in; redirected to /login".to_string(),
        Navigation::Redirect(route) => format!("redirected to {route}"),
    }
}

/// One line per failure, worded after where the view would show it.
pub fn error(err: &ServiceError) -> String {
    match err.surface() {
        Surface::FullView => format!("could not load: {}", err.message()),
        Surface::Transient => format!("error: {}", err.message()),
        Surface::InlineForm => format!("sign-in: {}", err.message()),
    }
}

pub fn posts(posts: &EntityList<Post>) -> String {
    if posts.is_empty() {
        return "no posts\n".to_string();
    }
    let mut out = String::new();
    for post in posts {
        let _ = writeln!(out, "{}  {}  {}", post.id, stamp(&post.created_at), post.title);
        if !post.categories.is_empty() || !post.tags.is_empty() {
            let _ = writeln!(
                out,
                "    categories: {}  tags: {}",
                post.categories.join(", "),
                post.tags.join(", ")
            );
        }
        for image in &post.images {
            let _ = writeln!(out, "    image: {image}");
        }
    }
    out
}

pub fn post(post: &Post) -> String {
    format!(
        "{}  {}\nslug: {}\n",
        post.id,
        post.title,
        post.slug.as_deref().unwrap_or("-")
    )
}

pub fn tree(tree: &CommentTree) -> String {
    let mut out = String::new();
    for thread in tree.assemble() {
        let _ = writeln!(out, "{}  {}", thread.post.id, thread.post.title);
        for entry in &thread.comments {
            let c = entry.comment;
            let _ = writeln!(
                out,
                "  [{}] {} ({}, {}): {}",
                c.id,
                c.user_name,
                c.user_email,
                stamp(&c.created_at),
                c.content
            );
            for r in &entry.replies {
                let _ = writeln!(
                    out,
                    "    [{}] {} ({}): {}",
                    r.id,
                    r.user_name,
                    stamp(&r.created_at),
                    r.content
                );
            }
        }
    }
    out
}

pub fn ads(ads: &EntityList<Ad>) -> String {
    let mut out = String::new();
    for ad in ads {
        let _ = writeln!(out, "{}", ad_line(ad));
    }
    if out.is_empty() {
        out.push_str("no ads\n");
    }
    out
}

pub fn ad_line(ad: &Ad) -> String {
    format!(
        "{:>4}  {:<11}  {}  -> {}  \"{}\"",
        ad.id,
        ad.placement.as_str(),
        ad.image_url,
        ad.link_url,
        ad.alt_text
    )
}

pub fn profile(profile: &UserProfile) -> String {
    format!(
        "name:   {}\nemail:  {}\nphone:  {}\nstatus: {}\nimage:  {}\n",
        profile.full_name.as_deref().unwrap_or("-"),
        profile.email,
        profile.phone_number.as_deref().unwrap_or("-"),
        profile.status.as_deref().unwrap_or("-"),
        profile.profile_image.as_deref().unwrap_or("-"),
    )
}

pub fn categories(list: &EntityList<Category>) -> String {
    list.iter().map(|c| format!("{:>4}  {}\n", c.id, c.name)).collect()
}

pub fn tags(list: &EntityList<Tag>) -> String {
    list.iter().map(|t| format!("{:>4}  {}\n", t.id, t.name)).collect()
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::from("latest post\n");
    match &dashboard.latest_post {
        Some(post) => {
            let _ = writeln!(out, "  {}  {}", stamp(&post.created_at), post.title);
        }
        None => out.push_str("  none\n"),
    }

    out.push_str("latest comments\n");
    for entry in &dashboard.latest_comments {
        let c = &entry.comment;
        let _ = writeln!(out, "  {} ({}): {}", c.user_name, stamp(&c.created_at), c.content);
        for r in &entry.replies {
            let _ = writeln!(out, "    {} ({}): {}", r.user_name, stamp(&r.created_at), r.content);
        }
    }

    out.push_str("latest ads\n");
    for ad in &dashboard.latest_ads {
        let _ = writeln!(out, "  {}", ad_line(ad));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domains::{Comment, PostSummary, Reply};
    use uuid::Uuid;

    #[test]
    fn tree_indents_replies_under_their_comment() {
        let at = Utc.with_ymd_and_hms(2024, 11, 1, 9, 0, 0).unwrap();
        let post = PostSummary {
            id: Uuid::nil(),
            title: "Hello".into(),
            created_at: Some(at),
        };
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            content: "nice".into(),
            user_id: Uuid::nil(),
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
            created_at: at,
        };
        let reply = Reply {
            id: Uuid::new_v4(),
            comment_id: comment.id,
            content: "thanks".into(),
            user_id: Uuid::nil(),
            user_name: "Bob".into(),
            user_email: "bob@example.com".into(),
            created_at: at,
        };
        let out = tree(&CommentTree::new(vec![post], vec![comment], vec![reply]));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Hello"));
        assert!(lines[1].starts_with("  [") && lines[1].ends_with(": nice"));
        assert!(lines[2].starts_with("    [") && lines[2].ends_with(": thanks"));
    }

    #[test]
    fn redirects_to_login_say_so() {
        assert_eq!(
            navigation(&Navigation::Redirect(Route::Login)),
            "not signed in; redirected to /login"
        );
        assert_eq!(
            error(&ServiceError::Auth("Invalid login credentials".into())),
            "sign-in: Invalid login credentials"
        );
    }
}
