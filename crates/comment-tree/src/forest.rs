use std::collections::HashMap;

use crate::CommentId;
use crate::model::Comment;

/// Deepest reply level kept in a forest. Roots are depth 0.
pub const MAX_REPLY_DEPTH: usize = 64;

/// Build a forest from a flat comment list.
///
/// Every comment is copied with its replies cleared, so the input is never
/// modified. Replies keep their input order under their parent, and roots
/// keep their input order at the top level.
///
/// Comments whose `parent_comment_id` does not resolve within the list are
/// dropped, along with anything that replies to them. Cycles are never
/// reachable from a root and are dropped the same way. When an id appears
/// twice, the first occurrence wins.
pub fn build_forest(comments: &[Comment]) -> Vec<Comment> {
    let mut index: HashMap<&CommentId, usize> = HashMap::with_capacity(comments.len());
    let mut nodes: Vec<Option<Comment>> = Vec::with_capacity(comments.len());
    for (position, comment) in comments.iter().enumerate() {
        if index.contains_key(&comment.id) {
            log::warn!("duplicate comment id {} in payload, keeping the first", comment.id);
            nodes.push(None);
            continue;
        }
        index.insert(&comment.id, position);
        nodes.push(Some(comment.detached()));
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots: Vec<usize> = Vec::new();
    let mut orphans = 0usize;
    for (position, node) in nodes.iter().enumerate() {
        let Some(comment) = node else { continue };
        match &comment.parent_comment_id {
            None => roots.push(position),
            Some(parent_id) => match index.get(parent_id) {
                Some(&parent) => children[parent].push(position),
                None => {
                    orphans += 1;
                    log::debug!(
                        "dropping comment {}: parent {} not in payload",
                        comment.id,
                        parent_id
                    );
                }
            },
        }
    }
    if orphans > 0 {
        log::warn!("dropped {} orphaned comment(s) while building forest", orphans);
    }

    // Post-order over an explicit stack: children are assembled before their parent
    // takes them, so reply depth never turns into call depth.
    let mut stack: Vec<(usize, usize, bool)> = roots.iter().rev().map(|&r| (r, 0, false)).collect();
    while let Some((position, depth, assembled)) = stack.pop() {
        if !assembled {
            stack.push((position, depth, true));
            if depth >= MAX_REPLY_DEPTH {
                if !children[position].is_empty() {
                    log::warn!(
                        "dropping {} reply subtree(s) nested deeper than {}",
                        children[position].len(),
                        MAX_REPLY_DEPTH
                    );
                    children[position].clear();
                }
                continue;
            }
            stack.extend(children[position].iter().rev().map(|&child| (child, depth + 1, false)));
            continue;
        }

        let replies: Vec<Comment> = children[position]
            .iter()
            .filter_map(|&child| nodes[child].take())
            .collect();
        if let Some(node) = nodes[position].as_mut() {
            node.replies = replies;
        }
    }

    roots.into_iter().filter_map(|r| nodes[r].take()).collect()
}

/// Depth-first search for `comment_id`, returning the index path from the
/// root slice down to the comment.
pub(crate) fn find_path(roots: &[Comment], comment_id: &CommentId) -> Option<Vec<usize>> {
    let mut stack: Vec<(Vec<usize>, &Comment)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, comment)| (vec![i], comment))
        .collect();

    while let Some((path, comment)) = stack.pop() {
        if &comment.id == comment_id {
            return Some(path);
        }
        if path.len() > MAX_REPLY_DEPTH {
            continue;
        }
        for (i, reply) in comment.replies.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(i);
            stack.push((child_path, reply));
        }
    }
    None
}

pub(crate) fn get_by_path<'a>(roots: &'a [Comment], path: &[usize]) -> Option<&'a Comment> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for &i in rest {
        node = node.replies.get(i)?;
    }
    Some(node)
}

pub(crate) fn get_mut_by_path<'a>(
    roots: &'a mut [Comment],
    path: &[usize],
) -> Option<&'a mut Comment> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get_mut(*first)?;
    for &i in rest {
        node = node.replies.get_mut(i)?;
    }
    Some(node)
}
