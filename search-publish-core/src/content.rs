//! Content tree handles and the two [`Pad`] implementations.
//!
//! - [`MemoryPad`]: an in-memory tree, assembled page by page.
//! - [`ProjectPad`]: a Lektor-style project on disk (`content/**/contents.lr`, `models/*.ini`).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contract::Pad;
use crate::error::ContentError;
use crate::extract::{parse_fields, MODEL_FIELD};

/// Model assumed for pages that do not name one.
pub const DEFAULT_MODEL: &str = "page";

/// File holding a page's fields inside its directory.
pub const CONTENTS_FILE: &str = "contents.lr";

/// Handle to one page: its global id and its path in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentNode {
    pub gid: String,
    pub path: String,
}

impl ContentNode {
    pub fn new(gid: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            path: path.into(),
        }
    }

    /// Node whose gid is derived from its path, stable across runs.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let gid = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("lektor:{path}").as_bytes());
        Self {
            gid: gid.to_string(),
            path,
        }
    }

    /// Path of the child page called `name`.
    pub fn child_path(&self, name: &str) -> String {
        if self.path.ends_with('/') {
            format!("{}{}", self.path, name)
        } else {
            format!("{}/{}", self.path, name)
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryPage {
    model: String,
    contents: String,
}

/// In-memory content tree.
///
/// ```
/// use search_publish_core::content::{ContentNode, MemoryPad};
///
/// let root = ContentNode::from_path("/");
/// let mut pad = MemoryPad::new(root.clone(), "page", "title: Home");
/// pad.insert(&root, ContentNode::from_path("/blog"), "blog", "");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryPad {
    root: ContentNode,
    pages: HashMap<String, MemoryPage>,
    children: HashMap<String, Vec<ContentNode>>,
    declared: Vec<String>,
}

impl MemoryPad {
    pub fn new(root: ContentNode, model: impl Into<String>, contents: impl Into<String>) -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            root.gid.clone(),
            MemoryPage {
                model: model.into(),
                contents: contents.into(),
            },
        );
        Self {
            root,
            pages,
            children: HashMap::new(),
            declared: Vec::new(),
        }
    }

    /// Adds `node` as a child of `parent`.
    pub fn insert(
        &mut self,
        parent: &ContentNode,
        node: ContentNode,
        model: impl Into<String>,
        contents: impl Into<String>,
    ) -> &mut Self {
        self.pages.insert(
            node.gid.clone(),
            MemoryPage {
                model: model.into(),
                contents: contents.into(),
            },
        );
        self.link(parent, node)
    }

    /// Adds an edge between two pages without touching their data. Allows
    /// building malformed (cyclic) trees.
    pub fn link(&mut self, parent: &ContentNode, child: ContentNode) -> &mut Self {
        self.children
            .entry(parent.gid.clone())
            .or_default()
            .push(child);
        self
    }

    pub fn declare_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.declared.push(model.into());
        self
    }
}

impl Pad for MemoryPad {
    fn root(&self) -> ContentNode {
        self.root.clone()
    }

    fn children_of(&self, node: &ContentNode) -> Vec<ContentNode> {
        self.children.get(&node.gid).cloned().unwrap_or_default()
    }

    fn contents_of(&self, node: &ContentNode) -> String {
        self.pages
            .get(&node.gid)
            .map(|page| page.contents.clone())
            .unwrap_or_default()
    }

    fn model_of(&self, node: &ContentNode) -> String {
        self.pages
            .get(&node.gid)
            .map(|page| page.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    fn declared_models(&self) -> Vec<String> {
        self.declared.clone()
    }
}

/// A site project on disk.
///
/// Every directory under `content/` that holds a `contents.lr` is a page.
/// Model definitions are the `*.ini` files in `models/`.
#[derive(Debug, Clone)]
pub struct ProjectPad {
    project_dir: PathBuf,
    content_dir: PathBuf,
}

impl ProjectPad {
    pub fn open(project_dir: impl AsRef<Path>) -> Result<Self, ContentError> {
        let project_dir = project_dir.as_ref().to_path_buf();
        let content_dir = project_dir.join("content");
        if !content_dir.join(CONTENTS_FILE).is_file() {
            warn!(path = %content_dir.display(), "No root contents file in project");
            return Err(ContentError::MissingRoot(content_dir));
        }
        info!(project = %project_dir.display(), "Opened site project");
        Ok(Self {
            project_dir,
            content_dir,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn dir_of(&self, node: &ContentNode) -> PathBuf {
        node.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.content_dir.clone(), |dir, segment| dir.join(segment))
    }
}

impl Pad for ProjectPad {
    fn root(&self) -> ContentNode {
        ContentNode::from_path("/")
    }

    fn children_of(&self, node: &ContentNode) -> Vec<ContentNode> {
        let dir = self.dir_of(node);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = ?e, "Cannot list page directory");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().join(CONTENTS_FILE).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        debug!(path = %node.path, children = names.len(), "Listed child pages");
        names
            .iter()
            .map(|name| ContentNode::from_path(node.child_path(name)))
            .collect()
    }

    fn contents_of(&self, node: &ContentNode) -> String {
        let file = self.dir_of(node).join(CONTENTS_FILE);
        match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %file.display(), error = ?e, "Cannot read page contents, treating as empty");
                String::new()
            }
        }
    }

    fn model_of(&self, node: &ContentNode) -> String {
        parse_fields(&self.contents_of(node))
            .fields
            .into_iter()
            .rev()
            .find(|(key, value)| key == MODEL_FIELD && !value.is_empty())
            .map(|(_, value)| value)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    fn declared_models(&self) -> Vec<String> {
        let models_dir = self.project_dir.join("models");
        let Ok(entries) = fs::read_dir(&models_dir) else {
            debug!(path = %models_dir.display(), "No models directory in project");
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ini"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
