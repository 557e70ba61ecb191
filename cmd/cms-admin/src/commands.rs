//! One handler per view. Every protected command goes through the session
//! guard first; a redirect renders nothing from the view itself.

use std::path::Path;

use anyhow::{anyhow, Context};
use bytes::Bytes;
use domains::{AdDraft, Entry, Navigation, PostForm, ProfileChanges};
use services::{AppContext, FileUpload};

use crate::cli::{
    AdFields, AdsCommand, Command, CommentsCommand, NamesCommand, PostFields, PostsCommand,
    ProfileCommand,
};
use crate::render;

pub async fn dispatch(app: &AppContext, command: Command) -> anyhow::Result<String> {
    // Signing out never needs the guard's permission.
    if !matches!(command, Command::Logout) {
        match app.enter(command.route()).await {
            Navigation::Render(_) => {}
            other => return Ok(format!("{}\n", render::navigation(&other))),
        }
    }

    match command {
        Command::Login { email, password } => {
            let session = app.auth().sign_in(&email, &password).await?;
            let who = session.user.email.unwrap_or_else(|| session.user.id.to_string());
            Ok(format!("signed in as {who}\n"))
        }
        Command::Logout => {
            let next = app.auth().sign_out().await;
            Ok(format!("signed out; go to {next}\n"))
        }
        Command::Dashboard => Ok(render::dashboard(&app.dashboard().load().await?)),
        Command::Posts { command } => posts(app, command).await,
        Command::Comments { command } => comments(app, command).await,
        Command::Ads { command } => ads(app, command).await,
        Command::Profile { command } => profile(app, command).await,
        Command::Categories { command } => categories(app, command).await,
        Command::Tags { command } => tags(app, command).await,
    }
}

async fn read_upload(path: &Path) -> anyhow::Result<FileUpload> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(FileUpload::new(name, Bytes::from(data)))
}

async fn read_uploads(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<FileUpload>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_upload(path.as_ref()).await?);
    }
    Ok(files)
}

async fn apply_fields(
    form: &mut PostForm,
    fields: PostFields,
    posts: &services::PostService,
) -> anyhow::Result<()> {
    if let Some(title) = fields.title {
        form.title = title;
    }
    if let Some(content) = fields.content {
        form.content = content;
    }
    if !fields.categories.is_empty() {
        form.select_categories(fields.categories);
    }
    if !fields.tags.is_empty() {
        form.select_tags(fields.tags);
    }
    if !fields.images.is_empty() {
        let urls = posts.upload_images(read_uploads(&fields.images).await?).await;
        form.push_images(urls);
    }
    Ok(())
}

async fn posts(app: &AppContext, command: PostsCommand) -> anyhow::Result<String> {
    let mut svc = app.posts();
    match command {
        PostsCommand::List => {
            svc.load().await?;
            Ok(render::posts(svc.posts()))
        }
        PostsCommand::Create { fields } => {
            let mut form = PostForm::blank();
            apply_fields(&mut form, fields, &svc).await?;
            let post = svc.save(&form).await?;
            Ok(render::post(&post))
        }
        PostsCommand::Edit {
            id,
            fields,
            remove_images,
        } => {
            svc.load().await?;
            let mut form = svc
                .posts()
                .get(&id)
                .map(PostForm::editing)
                .ok_or_else(|| anyhow!("post {id} not found"))?;
            for url in &remove_images {
                svc.remove_image(url).await?;
                form.drop_image(url);
            }
            apply_fields(&mut form, fields, &svc).await?;
            let post = svc.save(&form).await?;
            Ok(render::post(&post))
        }
        PostsCommand::Delete { id } => {
            svc.delete(id).await?;
            Ok(format!("deleted post {id}\n"))
        }
        PostsCommand::Upload { files } => {
            let urls = svc.upload_images(read_uploads(&files).await?).await;
            Ok(urls.iter().map(|u| format!("{u}\n")).collect())
        }
    }
}

async fn comments(app: &AppContext, command: CommentsCommand) -> anyhow::Result<String> {
    let mut svc = app.comments();
    svc.load().await?;
    match command {
        CommentsCommand::Tree => Ok(render::tree(svc.tree())),
        CommentsCommand::Add { post, text } => {
            let comment = svc.add_comment(post, &text).await?;
            Ok(format!("added comment {}\n", comment.id))
        }
        CommentsCommand::Reply { comment, text } => {
            let reply = svc.add_reply(comment, &text).await?;
            Ok(format!("added reply {}\n", reply.id))
        }
        CommentsCommand::Delete { id } => match svc.delete(id).await? {
            Entry::Comment => Ok(format!("deleted comment {id} and its replies\n")),
            Entry::Reply => Ok(format!("deleted reply {id}\n")),
        },
    }
}

fn ad_draft(fields: AdFields) -> AdDraft {
    AdDraft {
        image_url: fields.image_url,
        link_url: fields.link_url,
        alt_text: fields.alt_text,
        placement: fields.placement,
    }
}

async fn ads(app: &AppContext, command: AdsCommand) -> anyhow::Result<String> {
    let mut svc = app.ads();
    match command {
        AdsCommand::List => {
            svc.load().await?;
            Ok(render::ads(svc.ads()))
        }
        AdsCommand::Add { fields } => {
            let created = svc.create(&ad_draft(fields)).await?;
            if created.is_empty() {
                return Ok("ad saved\n".to_string());
            }
            Ok(created.iter().map(|ad| render::ad_line(ad) + "\n").collect())
        }
        AdsCommand::Edit { id, fields } => {
            svc.load().await?;
            match svc.update(id, &ad_draft(fields)).await? {
                Some(ad) => Ok(render::ad_line(&ad) + "\n"),
                None => Ok(format!("ad {id} updated\n")),
            }
        }
        AdsCommand::Delete { id } => {
            svc.delete(id).await?;
            Ok(format!("deleted ad {id}\n"))
        }
    }
}

async fn profile(app: &AppContext, command: ProfileCommand) -> anyhow::Result<String> {
    let mut svc = app.profile();
    svc.load().await?;
    match command {
        ProfileCommand::Show => Ok(svc
            .profile()
            .map(render::profile)
            .unwrap_or_default()),
        ProfileCommand::Update {
            full_name,
            phone_number,
            status,
            image,
        } => {
            let changes = ProfileChanges {
                full_name,
                phone_number,
                status,
            };
            let image = match image {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            let saved = svc.save(&changes, image).await?;
            Ok(render::profile(&saved))
        }
    }
}

async fn categories(app: &AppContext, command: NamesCommand) -> anyhow::Result<String> {
    let mut svc = app.taxonomy();
    match command {
        NamesCommand::List => {
            svc.load().await?;
            Ok(render::categories(svc.categories()))
        }
        NamesCommand::Add { name } => Ok(match svc.add_category(&name).await? {
            Some(category) => format!("added category {} ({})\n", category.name, category.id),
            None => "nothing to add\n".to_string(),
        }),
    }
}

async fn tags(app: &AppContext, command: NamesCommand) -> anyhow::Result<String> {
    let mut svc = app.taxonomy();
    match command {
        NamesCommand::List => {
            svc.load().await?;
            Ok(render::tags(svc.tags()))
        }
        NamesCommand::Add { name } => Ok(match svc.add_tag(&name).await? {
            Some(tag) => format!("added tag {} ({})\n", tag.name, tag.id),
            None => "nothing to add\n".to_string(),
        }),
    }
}
