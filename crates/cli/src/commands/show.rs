use crate::OutputFormat;
use crate::commands::rows::{RowSummary, render_rows_text, summarize_rows};
use crate::util::{CliResult, TreeArgs, build_view};
use clap::Args;
use futures_lite::future::block_on;
use lazytree_core::flatten::Viewport;
use lazytree_core::node::NodeId;
use lazytree_retriever_mock::MockItem;
use lazytree_runtime::TreeView;

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[arg(long = "depth", value_name = "N", default_value_t = 1, help = "Expand nodes above this level (0 = roots only).")]
    pub depth: usize,

    #[arg(long = "rows", value_name = "N", help = "Viewport height in rows; fills the look-ahead buffer below it.")]
    pub rows: Option<usize>,
}

pub fn run(args: &ShowArgs) -> CliResult<String> {
    let (mut view, _) = build_view(&args.tree)?;
    expand_levels(&mut view, args.depth)?;
    if let Some(rows) = args.rows {
        block_on(view.handle_scroll(Viewport::new(0, rows)))?;
    }

    let rows = summarize_rows(&view);
    match args.tree.format {
        OutputFormat::Text => Ok(render_rows_text(&rows, view.config().color_theme)),
        OutputFormat::Json => render_show_json(&rows),
    }
}

/// Expands every node whose level is below `depth`, probing first so leaves
/// stay collapsed.
pub(crate) fn expand_levels(view: &mut TreeView<MockItem>, depth: usize) -> CliResult<()> {
    for level in 0..depth {
        let candidates: Vec<NodeId> = view
            .visible_rows()
            .iter()
            .copied()
            .filter(|id| view.node(*id).is_ok_and(|node| node.depth() == level && !node.is_expanded()))
            .collect();
        for id in candidates {
            if block_on(view.probe_children(id))? {
                block_on(view.expand(id))?;
            }
        }
    }
    Ok(())
}

fn render_show_json(rows: &[RowSummary]) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
