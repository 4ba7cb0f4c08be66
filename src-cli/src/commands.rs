use anyhow::{Result, bail};
use clap::Subcommand;
use comment_tree::{CommentId, CommentTreeStore, NewComment, ProjectId};
use page_window::WindowedListPaginator;

use crate::config::Settings;
use crate::output;

#[derive(Subcommand)]
pub enum Command {
    /// List a project's comment threads, one page at a time
    Comments {
        project: ProjectId,
        /// Page to show, clamped to the last page
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Print the visible threads as nested JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a comment, or a reply with --reply-to
    Post {
        project: ProjectId,
        content: String,
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    /// Like a comment
    Like { project: ProjectId, comment: CommentId },
    /// Remove your like from a comment
    Unlike { project: ProjectId, comment: CommentId },
    /// Replace a comment's content
    Edit {
        project: ProjectId,
        comment: CommentId,
        content: String,
    },
    /// Delete a comment
    Delete { project: ProjectId, comment: CommentId },
    /// Show the effective configuration
    Config,
}

pub async fn run(store: &CommentTreeStore, settings: &Settings, command: Command) -> Result<()> {
    match command {
        Command::Comments {
            project,
            page,
            json,
        } => list(store, settings, project, page, json).await,
        Command::Post {
            project,
            content,
            reply_to,
        } => {
            store.set_active_project(project.clone());
            let new_comment = match reply_to {
                Some(parent) => NewComment::reply_to(project, parent, content),
                None => NewComment::new(project, content),
            };
            let created = store.post(new_comment).await?;
            output::print_comment("Posted", &created);
            Ok(())
        }
        Command::Like { project, comment } => set_like(store, project, comment, true).await,
        Command::Unlike { project, comment } => set_like(store, project, comment, false).await,
        Command::Edit {
            project,
            comment,
            content,
        } => {
            store.set_active_project(project);
            let updated = store.update(&comment, content).await?;
            output::print_comment("Updated", &updated);
            Ok(())
        }
        Command::Delete { project, comment } => {
            store.set_active_project(project);
            store.remove(&comment).await?;
            println!("Deleted comment {comment}");
            Ok(())
        }
        Command::Config => bail!("config is handled before connecting"),
    }
}

async fn list(
    store: &CommentTreeStore,
    settings: &Settings,
    project: ProjectId,
    page: usize,
    json: bool,
) -> Result<()> {
    store.set_active_project(project.clone());
    store.refresh(&project).await?;
    let forest = store.snapshot()?;

    let mut paginator = WindowedListPaginator::new(forest.roots.clone(), settings.items_per_page);
    paginator.set_page(page);
    log::debug!(
        "showing page {} of {} for {}",
        paginator.current_page(),
        paginator.page_count(),
        project
    );

    if json {
        output::print_json(paginator.visible_elements())
    } else {
        output::print_threads(&paginator.window());
        Ok(())
    }
}

/// Likes are toggled against the loaded forest, so the project is fetched
/// first.
async fn set_like(
    store: &CommentTreeStore,
    project: ProjectId,
    comment_id: CommentId,
    like: bool,
) -> Result<()> {
    store.set_active_project(project.clone());
    store.refresh(&project).await?;
    if store.snapshot()?.find(&comment_id).is_none() {
        bail!("comment {comment_id} not found in project {project}");
    }

    store.toggle_like(&comment_id, like).await?;

    let forest = store.snapshot()?;
    if let Some(comment) = forest.find(&comment_id) {
        output::print_comment(if like { "Liked" } else { "Unliked" }, comment);
    }
    Ok(())
}
