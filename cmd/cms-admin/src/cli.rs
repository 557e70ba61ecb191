use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use domains::{AdPlacement, Route};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "cms-admin")]
#[command(about = "Admin client for posts, comments, ads and profiles")]
#[command(
    after_help = "Environment:\n  CMS__BACKEND__URL        Project URL\n  CMS__BACKEND__ANON_KEY   Public anon key\n  RUST_LOG                 Log filter override"
)]
pub struct Cli {
    /// Directory holding `default.*` and `local.*` settings files.
    #[arg(long, global = true, default_value = "config", env = "CMS_CONFIG_DIR")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Dashboard,
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },
    Comments {
        #[command(subcommand)]
        command: CommentsCommand,
    },
    Ads {
        #[command(subcommand)]
        command: AdsCommand,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    Categories {
        #[command(subcommand)]
        command: NamesCommand,
    },
    Tags {
        #[command(subcommand)]
        command: NamesCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct PostFields {
    #[arg(long)]
    pub title: Option<String>,
    /// Rich-text HTML body.
    #[arg(long)]
    pub content: Option<String>,
    /// Replaces the category selection (repeatable).
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Replaces the tag selection (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Image files to upload and attach (repeatable).
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum PostsCommand {
    List,
    Create {
        #[command(flatten)]
        fields: PostFields,
    },
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: PostFields,
        /// Public URL of an attached image to delete (repeatable).
        #[arg(long = "remove-image")]
        remove_images: Vec<String>,
    },
    Delete {
        id: Uuid,
    },
    /// Upload image files and print their public URLs.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommentsCommand {
    /// Posts with their comments and replies.
    Tree,
    Add {
        #[arg(long)]
        post: Uuid,
        text: String,
    },
    Reply {
        #[arg(long)]
        comment: Uuid,
        text: String,
    },
    /// Delete a comment (with its replies) or a single reply.
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
pub struct AdFields {
    #[arg(long)]
    pub image_url: String,
    #[arg(long)]
    pub link_url: String,
    #[arg(long, default_value = "")]
    pub alt_text: String,
    #[arg(long, default_value_t = AdPlacement::Header)]
    pub placement: AdPlacement,
}

#[derive(Subcommand, Debug)]
pub enum AdsCommand {
    List,
    Add {
        #[command(flatten)]
        fields: AdFields,
    },
    Edit {
        id: i64,
        #[command(flatten)]
        fields: AdFields,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// New profile picture.
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NamesCommand {
    List,
    Add { name: String },
}

impl Command {
    /// The view this command belongs to; the session guard decides on it.
    pub fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Logout => Route::Login,
            Command::Dashboard => Route::Dashboard,
            Command::Posts { command } => match command {
                PostsCommand::List | PostsCommand::Delete { .. } => Route::ManagePosts,
                PostsCommand::Create { .. } | PostsCommand::Upload { .. } => Route::CreatePost,
                PostsCommand::Edit { id, .. } => Route::EditPost(*id),
            },
            Command::Comments { .. } => Route::ManageComments,
            Command::Ads { .. } => Route::ManageAds,
            Command::Profile { .. } => Route::Profile,
            Command::Categories { .. } | Command::Tags { .. } => Route::CreatePost,
        }
    }
}
