use std::slice;

use anyhow::Result;
use comment_tree::{Comment, DepthFirst};
use page_window::PaginationWindow;

use crate::config::Config;

const INDENT: &str = "  ";

pub fn format_comment(depth: usize, comment: &Comment) -> String {
    let indent = INDENT.repeat(depth);
    let liked = if comment.liked_by_current_user { "*" } else { " " };
    let edited = if comment.updated_at > comment.created_at {
        " (edited)"
    } else {
        ""
    };
    format!(
        "{indent}[{}] {} {}{edited}  {liked}{} like(s)\n{indent}{INDENT}{}",
        comment.id,
        comment.author_name,
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.like_count,
        comment.content.lines().collect::<Vec<_>>().join(" ")
    )
}

pub fn render_threads(window: &PaginationWindow<'_, Comment>) -> String {
    if window.is_empty() {
        return "No comments yet.".to_string();
    }
    let mut lines = Vec::new();
    for root in window.visible {
        for (depth, comment) in DepthFirst::new(slice::from_ref(root)) {
            lines.push(format_comment(depth, comment));
        }
    }
    let range = window
        .display_range()
        .map(|range| format!("threads {}-{} of {}", range.start(), range.end(), window.total_elements))
        .unwrap_or_default();
    lines.push(format!(
        "page {}/{}  {}",
        window.current_page, window.page_count, range
    ));
    lines.join("\n")
}

pub fn print_threads(window: &PaginationWindow<'_, Comment>) {
    println!("{}", render_threads(window));
}

pub fn print_json(threads: &[Comment]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(threads)?);
    Ok(())
}

pub fn print_comment(action: &str, comment: &Comment) {
    println!("{action} comment {}", comment.id);
    println!("{}", format_comment(0, comment));
}

pub fn print_config(config: &Config) -> Result<()> {
    println!("config dir: {}", config.dir.display());
    println!("{}", serde_json::to_string_pretty(&config.settings)?);
    let token = if config.token.is_some() { "set" } else { "not set" };
    println!("token: {token}");
    Ok(())
}
