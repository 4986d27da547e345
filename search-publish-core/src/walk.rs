//! Full traversal of a content tree.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::content::ContentNode;
use crate::contract::Pad;

/// Iterator over every page reachable from a start page, start page included.
///
/// Frontier based: pages come out in no particular order, each exactly once.
/// Pages are identified by gid, so a malformed tree with cycles or shared
/// children still terminates.
pub struct Walk<'a, P: ?Sized> {
    pad: &'a P,
    frontier: Vec<ContentNode>,
    visited: HashSet<String>,
}

impl<'a, P> Walk<'a, P>
where
    P: Pad + ?Sized,
{
    pub fn new(pad: &'a P, start: ContentNode) -> Self {
        Self {
            pad,
            frontier: vec![start],
            visited: HashSet::new(),
        }
    }
}

impl<P> Iterator for Walk<'_, P>
where
    P: Pad + ?Sized,
{
    type Item = ContentNode;

    fn next(&mut self) -> Option<ContentNode> {
        while let Some(node) = self.frontier.pop() {
            if !self.visited.insert(node.gid.clone()) {
                warn!(gid = %node.gid, path = %node.path, "Page reached twice, content tree is not a tree");
                continue;
            }
            let children = self.pad.children_of(&node);
            debug!(path = %node.path, children = children.len(), "Visiting page");
            self.frontier.extend(
                children
                    .into_iter()
                    .filter(|child| !self.visited.contains(&child.gid)),
            );
            return Some(node);
        }
        None
    }
}

/// Every page reachable from `root`, `root` included, each exactly once.
pub fn walk_all<P>(pad: &P, root: &ContentNode) -> Vec<ContentNode>
where
    P: Pad + ?Sized,
{
    Walk::new(pad, root.clone()).collect()
}
