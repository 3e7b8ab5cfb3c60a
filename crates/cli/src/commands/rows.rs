use lazytree_core::config::ColorTheme;
use lazytree_core::node::{LoadState, NodeId};
use lazytree_retriever_mock::MockItem;
use lazytree_runtime::TreeView;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RowSummary {
    pub node: NodeId,
    pub label: String,
    pub depth: usize,
    pub state: LoadState,
    pub expanded: bool,
    pub selected: bool,
    pub has_children: Option<bool>,
    pub all_children_loaded: bool,
    pub children: usize,
}

pub fn summarize_rows(view: &TreeView<MockItem>) -> Vec<RowSummary> {
    view.visible_rows()
        .iter()
        .filter_map(|id| {
            let node = view.node(*id).ok()?;
            Some(RowSummary {
                node: *id,
                label: node.label().into_owned(),
                depth: node.depth(),
                state: node.load_state(),
                expanded: node.is_expanded(),
                selected: node.is_selected(),
                has_children: node.has_children(),
                all_children_loaded: node.all_children_loaded(),
                children: node.child_count(),
            })
        })
        .collect()
}

fn marker(row: &RowSummary) -> &'static str {
    if row.expanded {
        "v"
    } else if row.has_children == Some(false) || (row.all_children_loaded && row.children == 0) {
        "-"
    } else {
        ">"
    }
}

fn colorize_selected(label: &str, theme: ColorTheme) -> String {
    label
        .if_supports_color(Stream::Stdout, |text| match theme {
            ColorTheme::Dark => text.bold().fg_rgb::<79, 166, 255>().to_string(),
            ColorTheme::Light => text.bold().fg_rgb::<0, 95, 175>().to_string(),
            ColorTheme::Neutral => text.bold().fg_rgb::<136, 192, 74>().to_string(),
        })
        .to_string()
}

fn colorize_status(status: &str) -> String {
    status.if_supports_color(Stream::Stdout, |text| text.dimmed().to_string()).to_string()
}

pub fn render_rows_text(rows: &[RowSummary], theme: ColorTheme) -> String {
    let mut output = String::new();
    for row in rows {
        let indent = "  ".repeat(row.depth);
        let label = if row.selected {
            format!("{} *", colorize_selected(&row.label, theme))
        } else {
            row.label.clone()
        };
        let status = match row.state {
            LoadState::Loading => " (loading)",
            LoadState::Error => " (load error)",
            _ if row.expanded && !row.all_children_loaded => " (more)",
            _ => "",
        };
        let _ = writeln!(&mut output, "{indent}{} {label}{}", marker(row), colorize_status(status));
    }
    output.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tree_args, view};
    use futures_lite::future::block_on;
    use rstest::rstest;

    #[rstest]
    fn renders_indented_rows_with_markers() {
        let (mut view, _) = view(&tree_args());
        let foods = view.roots()[0];
        block_on(view.expand(foods)).unwrap();
        let fruit = view.forest().children(foods)[0];
        view.select(fruit).unwrap();

        let text = render_rows_text(&summarize_rows(&view), ColorTheme::Neutral);
        assert_eq!(text, "v Foods\n  > Fruit *\n  > Vegetables");
    }

    #[rstest]
    fn marks_partial_pages_and_leaves() {
        let mut args = tree_args();
        args.paged = true;
        args.buffer = Some(3);
        let (mut view, _) = view(&args);
        let foods = view.roots()[0];
        block_on(view.expand(foods)).unwrap();
        let fruit = view.forest().children(foods)[0];
        block_on(view.expand(fruit)).unwrap();
        let apple = view.forest().children(fruit)[0];
        block_on(view.probe_children(apple)).unwrap();

        let rows = summarize_rows(&view);
        let text = render_rows_text(&rows, ColorTheme::Dark);
        assert!(text.contains("  v Fruit (more)"), "{text}");
        assert!(text.contains("    - Apple"), "{text}");
        assert_eq!(rows[1].state, LoadState::Loaded);
        assert_eq!(rows[1].children, 3);
    }

    #[rstest]
    fn empty_page_renders_as_leaf() {
        let mut args = tree_args();
        args.paged = true;
        let (mut view, _) = view(&args);
        let foods = view.roots()[0];
        block_on(view.expand(foods)).unwrap();
        let fruit = view.forest().children(foods)[0];
        block_on(view.expand(fruit)).unwrap();
        let apple = view.forest().children(fruit)[0];
        block_on(view.expand(apple)).unwrap();
        view.collapse(apple).unwrap();

        let rows = summarize_rows(&view);
        assert_eq!(rows[2].has_children, None);
        assert!(rows[2].all_children_loaded);
        let text = render_rows_text(&rows, ColorTheme::Neutral);
        assert!(text.contains("\n    - Apple\n"), "{text}");
    }

    #[rstest]
    fn rows_serialize_with_state() {
        let (view, _) = view(&tree_args());
        let json = serde_json::to_value(summarize_rows(&view)).unwrap();
        assert_eq!(json[0]["label"], "Foods");
        assert_eq!(json[0]["state"], "Unloaded");
        assert_eq!(json[0]["depth"], 0);
    }
}
