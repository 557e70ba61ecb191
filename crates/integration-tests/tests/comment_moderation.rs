//! Comment moderation over the in-memory backend: tree assembly, adding
//! comments and replies, and the reply cascade on delete.

use domains::Entry;
use integration_tests::{
    comment_row, post_row, reply_row, Backend, ADMIN_EMAIL, ADMIN_NAME, ADMIN_PASSWORD,
};
use services::{ServiceError, Surface};
use storage_adapters::Op;
use uuid::Uuid;

struct Thread {
    p1: Uuid,
    p2: Uuid,
    c1: Uuid,
    c2: Uuid,
    r1: Uuid,
    r2: Uuid,
}

/// p1 has c1 (replies r1, r2); p2 has c2 and no replies.
fn seeded() -> (Backend, Thread) {
    let t = Thread {
        p1: Uuid::new_v4(),
        p2: Uuid::new_v4(),
        c1: Uuid::new_v4(),
        c2: Uuid::new_v4(),
        r1: Uuid::new_v4(),
        r2: Uuid::new_v4(),
    };
    let backend = Backend::with_tables(vec![
        ("posts", vec![post_row(t.p1, "First", 0), post_row(t.p2, "Second", 5)]),
        (
            "comments",
            vec![
                comment_row(t.c2, t.p2, "on second", 7),
                comment_row(t.c1, t.p1, "on first", 6),
            ],
        ),
        (
            "replies",
            vec![
                reply_row(t.r2, t.c1, "later reply", 9),
                reply_row(t.r1, t.c1, "early reply", 8),
            ],
        ),
    ]);
    (backend, t)
}

#[tokio::test]
async fn tree_nests_replies_under_comments_under_posts() {
    let (backend, t) = seeded();
    let app = backend.context();
    let mut svc = app.comments();
    svc.load().await.unwrap();

    let threads = svc.tree().assemble();
    assert_eq!(threads.len(), 2);

    let first = threads.iter().find(|th| th.post.id == t.p1).unwrap();
    assert_eq!(first.comments.len(), 1);
    assert_eq!(first.comments[0].comment.id, t.c1);
    let reply_ids: Vec<Uuid> = first.comments[0].replies.iter().map(|r| r.id).collect();
    assert_eq!(reply_ids, vec![t.r1, t.r2], "replies oldest first");

    let second = threads.iter().find(|th| th.post.id == t.p2).unwrap();
    assert_eq!(second.comments.len(), 1);
    assert_eq!(second.comments[0].comment.id, t.c2);
    assert!(second.comments[0].replies.is_empty());
}

#[tokio::test]
async fn deleting_a_comment_takes_its_replies_along() {
    let (backend, t) = seeded();
    let app = backend.context();
    let mut svc = app.comments();
    svc.load().await.unwrap();

    assert_eq!(svc.delete(t.c1).await.unwrap(), Entry::Comment);

    assert!(svc.tree().replies_for(t.c1).is_empty());
    assert!(svc.tree().comments_for(t.p1).is_empty());
    assert_eq!(svc.tree().comments_for(t.p2).len(), 1);

    assert!(backend.rows("replies").is_empty());
    assert_eq!(backend.ids("comments"), vec![t.c2.to_string()]);
}

#[tokio::test]
async fn failed_reply_delete_leaves_the_comment_in_place() {
    let (backend, t) = seeded();
    backend
        .records
        .fail_on(Op::Delete, "replies", "permission denied for table replies");
    let app = backend.context();
    let mut svc = app.comments();
    svc.load().await.unwrap();

    let err = svc.delete_comment(t.c1).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Write("permission denied for table replies".into())
    );
    assert_eq!(err.surface(), Surface::Transient);

    assert_eq!(svc.tree().comments_for(t.p1).len(), 1);
    assert_eq!(svc.tree().replies_for(t.c1).len(), 2);
    assert_eq!(backend.rows("comments").len(), 2);
    assert_eq!(backend.rows("replies").len(), 2);
}

#[tokio::test]
async fn deleting_a_reply_keeps_its_siblings() {
    let (backend, t) = seeded();
    let app = backend.context();
    let mut svc = app.comments();
    svc.load().await.unwrap();

    assert_eq!(svc.delete(t.r1).await.unwrap(), Entry::Reply);

    let left: Vec<Uuid> = svc.tree().replies_for(t.c1).iter().map(|r| r.id).collect();
    assert_eq!(left, vec![t.r2]);
    assert_eq!(backend.ids("replies"), vec![t.r2.to_string()]);
    assert_eq!(backend.rows("comments").len(), 2);
}

#[tokio::test]
async fn signed_in_comment_is_added_with_an_author_snapshot() {
    let (backend, t) = seeded();
    let app = backend.context();
    app.auth().sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let mut svc = app.comments();
    svc.load().await.unwrap();
    let before = svc.tree().comments().len();

    let comment = svc.add_comment(t.p2, "Thanks for reading").await.unwrap();
    assert_eq!(svc.tree().comments().len(), before + 1);
    assert_eq!(comment.user_id, backend.admin);
    assert_eq!(comment.user_name, ADMIN_NAME);
    assert_eq!(comment.user_email, ADMIN_EMAIL);
    assert_eq!(backend.rows("comments").len(), before + 1);

    let reply = svc.add_reply(comment.id, "Follow-up").await.unwrap();
    assert_eq!(reply.comment_id, comment.id);
    assert_eq!(svc.tree().replies_for(comment.id).len(), 1);
}

#[tokio::test]
async fn commenting_needs_a_session_and_some_text() {
    let (backend, t) = seeded();
    let app = backend.context();
    let mut svc = app.comments();
    svc.load().await.unwrap();

    let err = svc.add_comment(t.p1, "hello").await.unwrap_err();
    assert_eq!(err, ServiceError::Auth("You must be logged in to comment.".into()));

    app.auth().sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let err = svc.add_reply(t.c1, "   ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert_eq!(svc.tree().comments().len(), 2);
    assert_eq!(svc.tree().replies().len(), 2);
}

#[tokio::test]
async fn failed_load_is_a_full_view_error() {
    let (backend, _) = seeded();
    backend.records.fail_on(Op::Select, "replies", "relation does not exist");
    let app = backend.context();

    let err = app.comments().load().await.unwrap_err();
    assert_eq!(err.surface(), Surface::FullView);
    assert_eq!(err.message(), "relation does not exist");
}
