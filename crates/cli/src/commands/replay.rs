use crate::OutputFormat;
use crate::commands::rows::{RowSummary, render_rows_text, summarize_rows};
use crate::util::{CliResult, TreeArgs, build_view, node_label, resolve_path};
use anyhow::{Context, anyhow, bail};
use clap::Args;
use futures_lite::future::block_on;
use lazytree_core::config::ColorTheme;
use lazytree_core::event::TreeViewEventKind;
use lazytree_core::flatten::Viewport;
use lazytree_core::node::NodeId;
use lazytree_retriever_mock::MockItem;
use lazytree_runtime::{ChannelSink, FetchApplied, TreeView};
use serde::Serialize;
use std::fmt::{self, Display, Write};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, mpsc};
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[arg(
        long = "script",
        value_name = "FILE",
        help = "File with one step per line; lines starting with `#` are ignored."
    )]
    pub script: Option<PathBuf>,

    #[arg(
        long = "step",
        value_name = "STEP",
        action = clap::ArgAction::Append,
        help = "Step applied after the script, e.g. \"expand Foods/Fruit\" or \"scroll 0 10\" (repeatable)."
    )]
    pub steps: Vec<String>,
}

/// One UI event of a replay. Nodes are addressed by their label path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Expand(String),
    Collapse(String),
    Toggle(String),
    Select(String),
    Reset(String),
    Retry(String),
    Count(String),
    Probe,
    Scroll { start: usize, end: usize },
    Print,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
        let path = || {
            if rest.is_empty() {
                Err(anyhow!("`{verb}` needs a node path"))
            } else {
                Ok(rest.to_owned())
            }
        };
        match verb.to_ascii_lowercase().as_str() {
            "expand" => Ok(Step::Expand(path()?)),
            "collapse" => Ok(Step::Collapse(path()?)),
            "toggle" => Ok(Step::Toggle(path()?)),
            "select" => Ok(Step::Select(path()?)),
            "reset" => Ok(Step::Reset(path()?)),
            "retry" => Ok(Step::Retry(path()?)),
            "count" => Ok(Step::Count(path()?)),
            "probe" => Ok(Step::Probe),
            "print" => Ok(Step::Print),
            "scroll" => {
                let bounds = rest
                    .split_whitespace()
                    .map(str::parse::<usize>)
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("invalid scroll bounds `{rest}`"))?;
                match bounds.as_slice() {
                    [start, end] => Ok(Step::Scroll { start: *start, end: *end }),
                    _ => bail!("`scroll` needs START and END row indices"),
                }
            }
            "" => bail!("empty step"),
            other => bail!("unknown step `{other}`"),
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Expand(path) => write!(f, "expand {path}"),
            Step::Collapse(path) => write!(f, "collapse {path}"),
            Step::Toggle(path) => write!(f, "toggle {path}"),
            Step::Select(path) => write!(f, "select {path}"),
            Step::Reset(path) => write!(f, "reset {path}"),
            Step::Retry(path) => write!(f, "retry {path}"),
            Step::Count(path) => write!(f, "count {path}"),
            Step::Probe => f.write_str("probe"),
            Step::Scroll { start, end } => write!(f, "scroll {start} {end}"),
            Step::Print => f.write_str("print"),
        }
    }
}

pub fn parse_script(text: &str) -> CliResult<Vec<Step>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| line.parse().with_context(|| format!("script line {}", index + 1)))
        .collect()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EventSummary {
    #[serde(flatten)]
    pub kind: TreeViewEventKind,
    pub node: NodeId,
    pub label: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: String,
    pub outcome: String,
    pub events: Vec<EventSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowSummary>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    #[serde(skip)]
    pub theme: ColorTheme,
    pub steps: Vec<StepReport>,
    pub rows: Vec<RowSummary>,
}

pub fn run(args: &ReplayArgs) -> CliResult<String> {
    let mut steps = match &args.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            parse_script(&text)?
        }
        None => Vec::new(),
    };
    for (index, step) in args.steps.iter().enumerate() {
        steps.push(step.parse().with_context(|| format!("invalid --step #{}", index + 1))?);
    }

    let summary = replay(&args.tree, &steps)?;
    match args.tree.format {
        OutputFormat::Text => Ok(render_replay_text(&summary)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
    }
}

pub fn replay(args: &TreeArgs, steps: &[Step]) -> CliResult<ReplaySummary> {
    let (mut view, _retriever) = build_view(args)?;
    let (sender, receiver) = mpsc::channel();
    view.register_event_sink(Arc::new(ChannelSink::new(sender)));

    let mut reports = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let outcome = apply_step(&mut view, step)
            .with_context(|| format!("step {} (`{step}`) failed", index + 1))?;
        debug!(step = %step, %outcome, "replay step applied");
        let events = receiver
            .try_iter()
            .map(|event| EventSummary {
                kind: event.kind,
                node: event.node,
                label: node_label(&view, event.node),
            })
            .collect();
        let rows = matches!(step, Step::Print).then(|| summarize_rows(&view));
        reports.push(StepReport { step: step.to_string(), outcome, events, rows });
    }

    view.shutdown();
    Ok(ReplaySummary {
        theme: view.config().color_theme,
        steps: reports,
        rows: summarize_rows(&view),
    })
}

fn apply_step(view: &mut TreeView<MockItem>, step: &Step) -> CliResult<String> {
    let outcome = match step {
        Step::Expand(path) => {
            let id = resolve_path(view, path)?;
            describe_fetch(block_on(view.expand(id))?)
        }
        Step::Collapse(path) => {
            let id = resolve_path(view, path)?;
            let collapsed = view.collapse(id)?;
            if collapsed { "collapsed" } else { "already collapsed" }.to_owned()
        }
        Step::Toggle(path) => {
            let id = resolve_path(view, path)?;
            let fetch = block_on(view.toggle_expand(id))?;
            let state = if view.node(id)?.is_expanded() { "expanded" } else { "collapsed" };
            format!("{state}, {}", describe_fetch(fetch))
        }
        Step::Select(path) => {
            let id = resolve_path(view, path)?;
            view.select(id)?;
            format!("selected {path}")
        }
        Step::Reset(path) => {
            let id = resolve_path(view, path)?;
            let freed = view.collapse_and_reset(id)?;
            format!("dropped {freed} cached nodes")
        }
        Step::Retry(path) => {
            let id = resolve_path(view, path)?;
            describe_fetch(block_on(view.retry(id))?)
        }
        Step::Count(path) => {
            let id = resolve_path(view, path)?;
            let count = block_on(view.refresh_child_count(id))?;
            format!("{count} children")
        }
        Step::Probe => {
            let probed = block_on(view.probe_visible())?;
            format!("probed {probed} rows")
        }
        Step::Scroll { start, end } => {
            let applied = block_on(view.handle_scroll(Viewport::new(*start, *end)))?;
            let fetched: usize = applied.iter().map(FetchApplied::fetched).sum();
            format!("{} fetches, {fetched} rows loaded", applied.len())
        }
        Step::Print => format!("{} visible rows", view.visible_rows().len()),
    };
    Ok(outcome)
}

fn describe_fetch(fetch: Option<FetchApplied>) -> String {
    match fetch {
        None => "no fetch".to_owned(),
        Some(FetchApplied::Appended { fetched, exhausted: true, .. }) => {
            format!("loaded {fetched} children (all loaded)")
        }
        Some(FetchApplied::Appended { fetched, .. }) => format!("loaded {fetched} children"),
        Some(FetchApplied::Failed { error, .. }) => format!("load failed: {error}"),
        Some(FetchApplied::Stale { .. }) => "stale completion discarded".to_owned(),
    }
}

fn event_name(kind: TreeViewEventKind) -> String {
    match kind {
        TreeViewEventKind::NodeClicked => "NODE_CLICKED".to_owned(),
        TreeViewEventKind::NodeExpanded => "NODE_EXPANDED".to_owned(),
        TreeViewEventKind::NodeCollapsed => "NODE_COLLAPSED".to_owned(),
        TreeViewEventKind::ChildrenLoaded { count } => format!("CHILDREN_LOADED({count})"),
        TreeViewEventKind::LoadFailed => "LOAD_FAILED".to_owned(),
    }
}

pub fn render_replay_text(summary: &ReplaySummary) -> String {
    let mut output = String::new();
    for report in &summary.steps {
        let _ = writeln!(&mut output, "> {}", report.step);
        let _ = writeln!(&mut output, "  {}", report.outcome);
        for event in &report.events {
            let _ = writeln!(&mut output, "  event {} {}", event_name(event.kind), event.label);
        }
        if let Some(rows) = &report.rows {
            let _ = writeln!(&mut output, "{}", render_rows_text(rows, summary.theme));
        }
    }
    let _ = writeln!(&mut output, "rows:");
    let _ = writeln!(&mut output, "{}", render_rows_text(&summary.rows, summary.theme));
    output.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tree_args;
    use rstest::rstest;
    use tempfile::tempdir;

    fn steps(lines: &[&str]) -> Vec<Step> {
        lines.iter().map(|line| line.parse().expect("step")).collect()
    }

    #[rstest]
    #[case("expand Foods/Fruit loops", Step::Expand("Foods/Fruit loops".into()))]
    #[case("  Select Foods ", Step::Select("Foods".into()))]
    #[case("scroll 0 10", Step::Scroll { start: 0, end: 10 })]
    #[case("print", Step::Print)]
    #[case("probe", Step::Probe)]
    fn parses_steps(#[case] line: &str, #[case] expected: Step) {
        assert_eq!(line.parse::<Step>().unwrap(), expected);
    }

    #[rstest]
    #[case("expand", "needs a node path")]
    #[case("scroll 1", "START and END")]
    #[case("scroll a b", "invalid scroll bounds")]
    #[case("jump Foods", "unknown step")]
    fn rejects_bad_steps(#[case] line: &str, #[case] message: &str) {
        let error = line.parse::<Step>().unwrap_err();
        assert!(error.to_string().contains(message), "{error}");
    }

    #[rstest]
    fn script_skips_comments_and_reports_line() {
        let parsed = parse_script("# setup\nexpand Foods\n\nselect Foods/Fruit\n").unwrap();
        assert_eq!(parsed, steps(&["expand Foods", "select Foods/Fruit"]));

        let error = parse_script("expand Foods\nfly away").unwrap_err();
        assert_eq!(error.to_string(), "script line 2");
    }

    #[rstest]
    fn replays_expand_select_collapse() {
        let summary = replay(
            &tree_args(),
            &steps(&[
                "expand Foods",
                "expand Foods/Fruit",
                "select Foods/Fruit/Apple",
                "collapse Foods/Fruit",
            ]),
        )
        .unwrap();

        assert_eq!(summary.steps[1].outcome, "loaded 8 children (all loaded)");
        assert_eq!(summary.steps[2].events[0].kind, TreeViewEventKind::NodeClicked);
        assert_eq!(summary.steps[2].events[0].label, "Apple");
        assert_eq!(summary.steps[3].outcome, "collapsed");
        assert_eq!(
            render_rows_text(&summary.rows, summary.theme),
            "v Foods\n  > Fruit\n  > Vegetables"
        );
    }

    #[rstest]
    fn failed_fetch_is_an_outcome_not_an_error() {
        let mut args = tree_args();
        args.paged = true;
        args.fail = vec!["Orange".into()];
        let summary = replay(
            &args,
            &steps(&["expand Foods", "expand Foods/Vegetables", "expand Foods/Vegetables/Orange"]),
        )
        .unwrap();

        let report = &summary.steps[2];
        assert_eq!(report.outcome, "load failed: mock failure for 'Orange'");
        assert_eq!(report.events.last().unwrap().kind, TreeViewEventKind::LoadFailed);
        let text = render_replay_text(&summary);
        assert!(text.contains("v Orange (load error)"), "{text}");
    }

    #[rstest]
    fn paged_scroll_and_reset() {
        let mut args = tree_args();
        args.paged = true;
        args.buffer = Some(3);
        let summary = replay(
            &args,
            &steps(&[
                "expand Foods",
                "expand Foods/Fruit",
                "scroll 0 6",
                "reset Foods/Fruit",
                "print",
            ]),
        )
        .unwrap();

        assert_eq!(summary.steps[1].outcome, "loaded 3 children");
        assert_eq!(summary.steps[2].outcome, "1 fetches, 3 rows loaded");
        assert_eq!(summary.steps[3].outcome, "dropped 6 cached nodes");
        assert_eq!(summary.steps[4].rows.as_ref().map(Vec::len), Some(3));
    }

    #[rstest]
    fn unknown_path_aborts_with_step_context() {
        let error = replay(&tree_args(), &steps(&["select Foods/Nope"])).unwrap_err();
        assert_eq!(error.to_string(), "step 1 (`select Foods/Nope`) failed");
        assert!(format!("{error:#}").contains("no loaded node `Nope`"));
    }

    #[rstest]
    fn json_output_flattens_event_kind() {
        let dir = tempdir().expect("temp");
        let script = dir.path().join("steps.txt");
        fs::write(&script, "expand Foods\n").expect("write");
        let mut tree = tree_args();
        tree.format = OutputFormat::Json;
        let args = ReplayArgs { tree, script: Some(script), steps: vec!["toggle Foods".into()] };

        let json: serde_json::Value = serde_json::from_str(&run(&args).unwrap()).unwrap();
        assert_eq!(json["steps"][0]["events"][0]["type"], "NODE_EXPANDED");
        assert_eq!(json["steps"][0]["events"][0]["label"], "Foods");
        assert_eq!(json["steps"][0]["events"][1]["count"], 2);
        assert_eq!(json["steps"][1]["outcome"], "collapsed, no fetch");
        assert_eq!(json["rows"].as_array().map(Vec::len), Some(1));
    }
}
