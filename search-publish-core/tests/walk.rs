use std::collections::HashSet;

use search_publish_core::content::{ContentNode, MemoryPad};
use search_publish_core::contract::Pad;
use search_publish_core::walk::{walk_all, Walk};

/// Builds a tree `depth` levels deep where every page has `fanout` children.
fn wide_tree(depth: usize, fanout: usize) -> (MemoryPad, usize) {
    let root = ContentNode::from_path("/");
    let mut pad = MemoryPad::new(root.clone(), "page", "");
    let mut level = vec![root];
    let mut count = 1;
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in &level {
            for i in 0..fanout {
                let child = ContentNode::from_path(parent.child_path(&format!("p{i}")));
                pad.insert(parent, child.clone(), "page", "");
                next.push(child);
                count += 1;
            }
        }
        level = next;
    }
    (pad, count)
}

#[test]
fn test_walk_visits_every_page_once_including_root() {
    let (pad, count) = wide_tree(3, 3);
    let root = pad.root();

    let pages = walk_all(&pad, &root);

    assert_eq!(pages.len(), count, "1 + 3 + 9 + 27 pages");
    let unique: HashSet<_> = pages.iter().map(|p| p.gid.clone()).collect();
    assert_eq!(unique.len(), count, "No page is visited twice");
    assert!(pages.contains(&root), "Root is part of the walk");
}

#[test]
fn test_walk_of_a_single_page_is_the_page() {
    let root = ContentNode::from_path("/");
    let pad = MemoryPad::new(root.clone(), "page", "");

    assert_eq!(walk_all(&pad, &root), vec![root]);
}

#[test]
fn test_walk_terminates_on_cycles() {
    let root = ContentNode::from_path("/");
    let a = ContentNode::from_path("/a");
    let b = ContentNode::from_path("/a/b");
    let mut pad = MemoryPad::new(root.clone(), "page", "");
    pad.insert(&root, a.clone(), "page", "")
        .insert(&a, b.clone(), "page", "")
        .link(&b, root.clone())
        .link(&b, a.clone())
        .link(&a, a.clone());

    let pages: HashSet<_> = walk_all(&pad, &root).into_iter().collect();

    assert_eq!(pages, HashSet::from([root, a, b]));
}

#[test]
fn test_walk_visits_shared_children_once() {
    let root = ContentNode::from_path("/");
    let left = ContentNode::from_path("/left");
    let right = ContentNode::from_path("/right");
    let shared = ContentNode::from_path("/shared");
    let mut pad = MemoryPad::new(root.clone(), "page", "");
    pad.insert(&root, left.clone(), "page", "")
        .insert(&root, right.clone(), "page", "")
        .insert(&left, shared.clone(), "page", "")
        .link(&right, shared.clone());

    let pages = walk_all(&pad, &root);

    assert_eq!(pages.len(), 4);
    assert_eq!(pages.iter().filter(|p| **p == shared).count(), 1);
}

#[test]
fn test_walk_is_lazy() {
    let (pad, _) = wide_tree(2, 2);

    let first_two: Vec<_> = Walk::new(&pad, pad.root()).take(2).collect();

    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[0], pad.root());
}
