use crate::OutputFormat;
use anyhow::{Context, anyhow};
use clap::Args;
use lazytree_core::config::TreeViewConfig;
use lazytree_core::node::NodeId;
use lazytree_retriever_mock::{
    DEFAULT_CHILDREN_KEY, DEFAULT_LABEL_KEY, MockItem, MockRetriever, StaticTree,
};
use lazytree_runtime::TreeView;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub type CliResult<T> = anyhow::Result<T>;

/// Options shared by every subcommand that builds a tree view.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(
        long = "data",
        value_name = "FILE",
        help = "JSON tree to load (object = one root, array = forest). Defaults to a built-in food tree."
    )]
    pub data: Option<PathBuf>,

    #[arg(long = "label", value_name = "KEY", default_value = DEFAULT_LABEL_KEY, help = "Object key holding the display label.")]
    pub label: String,

    #[arg(long = "children", value_name = "KEY", default_value = DEFAULT_CHILDREN_KEY, help = "Object key holding the child array.")]
    pub children: String,

    #[arg(long = "paged", help = "Load children page by page instead of all at once.")]
    pub paged: bool,

    #[arg(long = "config", value_name = "FILE", help = "Tree view configuration (JSON, camelCase keys).")]
    pub config: Option<PathBuf>,

    #[arg(long = "buffer", value_name = "N", help = "Override the look-ahead buffer amount.")]
    pub buffer: Option<usize>,

    #[arg(
        long = "fail",
        value_name = "LABEL",
        action = clap::ArgAction::Append,
        help = "Make fetches for nodes with this label fail (repeatable)."
    )]
    pub fail: Vec<String>,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long = "no-color", help = "Disable ANSI colors in text output.")]
    pub no_color: bool,
}

impl Default for TreeArgs {
    fn default() -> Self {
        Self {
            data: None,
            label: DEFAULT_LABEL_KEY.to_owned(),
            children: DEFAULT_CHILDREN_KEY.to_owned(),
            paged: false,
            config: None,
            buffer: None,
            fail: Vec::new(),
            format: OutputFormat::Text,
            no_color: false,
        }
    }
}

pub fn load_tree(args: &TreeArgs) -> CliResult<StaticTree> {
    let Some(path) = &args.data else {
        return Ok(StaticTree::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree data from {}", path.display()))?;
    StaticTree::from_json_str(&json, &args.label, &args.children)
        .with_context(|| format!("invalid tree data in {}", path.display()))
}

pub fn load_config(args: &TreeArgs) -> CliResult<TreeViewConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration from {}", path.display()))?;
            TreeViewConfig::from_json_str(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => TreeViewConfig::default(),
    };
    if let Some(buffer) = args.buffer {
        config = config.with_buffer_amount(buffer);
    }
    Ok(config)
}

pub fn build_view(args: &TreeArgs) -> CliResult<(TreeView<MockItem>, Arc<MockRetriever>)> {
    if args.no_color {
        owo_colors::set_override(false);
    }
    let tree = load_tree(args)?;
    let config = load_config(args)?;
    let retriever = MockRetriever::new(tree);
    for label in &args.fail {
        retriever.fail_for(label.clone());
    }
    let handle = if args.paged { retriever.paged() } else { retriever.basic() };
    let view = TreeView::new(retriever.roots(), handle, config);
    Ok((view, retriever))
}

/// Resolves a slash separated label path (`Foods/Fruit/Apple`) against the
/// nodes loaded so far.
pub fn resolve_path(view: &TreeView<MockItem>, path: &str) -> CliResult<NodeId> {
    let mut candidates = view.roots();
    let mut found = None;
    for segment in path.split('/').map(str::trim).filter(|segment| !segment.is_empty()) {
        let id = candidates
            .iter()
            .copied()
            .find(|id| view.node(*id).is_ok_and(|node| node.label() == segment))
            .ok_or_else(|| anyhow!("no loaded node `{segment}` in path `{path}`"))?;
        candidates = view.forest().children(id);
        found = Some(id);
    }
    found.ok_or_else(|| anyhow!("empty node path"))
}

pub fn node_label(view: &TreeView<MockItem>, id: NodeId) -> String {
    view.node(id).map(|node| node.label().into_owned()).unwrap_or_default()
}
