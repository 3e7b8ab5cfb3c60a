use crate::event::EventDispatcher;
use crate::fetch::{FetchApplied, FetchOutcome, FetchPurpose, PendingFetch};
use crate::throttle::ScrollThrottle;
use lazytree_core::config::TreeViewConfig;
use lazytree_core::event::{TreeViewEvent, TreeViewEventKind, TreeViewEventSink};
use lazytree_core::flatten::{Viewport, VisibleRows};
use lazytree_core::node::{Forest, NodeData, NodeId, TreeNode};
use lazytree_core::paging::PagingParams;
use lazytree_core::retriever::Retriever;
use lazytree_core::selection::Selection;
use lazytree_core::TreeError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SLOW_FETCH: Duration = Duration::from_millis(500);

/// Lazily loaded tree view.
///
/// Owns the forest, the flattened rows and the selection, and is the only
/// writer of node state. Every retriever call is handed out as a
/// [`PendingFetch`] so the embedding event loop decides when (and in which
/// order) completions are applied via [`TreeView::complete`]. The async
/// methods are shortcuts that await the ticket right away.
pub struct TreeView<T: 'static> {
    forest: Forest<T>,
    rows: VisibleRows,
    selection: Selection,
    retriever: Retriever<T>,
    config: TreeViewConfig,
    dispatcher: Arc<EventDispatcher>,
    throttle: ScrollThrottle,
    viewport: Option<Viewport>,
    scroll_fetch: Option<NodeId>,
    tickets: HashMap<NodeId, u64>,
    next_ticket: u64,
}

impl<T: 'static> TreeView<T> {
    pub fn new(
        roots: impl IntoIterator<Item = NodeData<T>>,
        retriever: Retriever<T>,
        config: TreeViewConfig,
    ) -> Self {
        let forest = Forest::with_roots(roots);
        let rows = VisibleRows::rebuild(&forest);
        let throttle = ScrollThrottle::new(config.scroll_throttle());
        debug!(roots = forest.roots().len(), paged = retriever.is_paged(), "tree view created");
        Self {
            forest,
            rows,
            selection: Selection::new(),
            retriever,
            config,
            dispatcher: Arc::new(EventDispatcher::new()),
            throttle,
            viewport: None,
            scroll_fetch: None,
            tickets: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub fn forest(&self) -> &Forest<T> {
        &self.forest
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode<T>, TreeError> {
        self.forest.node(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        self.forest.roots()
    }

    /// Visible rows in depth-first pre-order.
    pub fn visible_rows(&self) -> &[NodeId] {
        self.rows.produce()
    }

    pub fn rows(&self) -> &VisibleRows {
        &self.rows
    }

    pub fn config(&self) -> &TreeViewConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever<T> {
        &self.retriever
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    /// Node currently fetched on behalf of the scroll buffer.
    pub fn scroll_fetch(&self) -> Option<NodeId> {
        self.scroll_fetch
    }

    pub fn event_dispatcher(&self) -> Arc<EventDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn register_event_sink(&self, sink: Arc<dyn TreeViewEventSink>) {
        self.dispatcher.register(sink);
    }

    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }

    pub fn select(&mut self, id: NodeId) -> Result<(), TreeError> {
        let previous = self.selection.select(&mut self.forest, id)?;
        debug!(node = %id, previous = ?previous, "node selected");
        self.emit(TreeViewEventKind::NodeClicked, id);
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Option<NodeId> {
        self.selection.clear(&mut self.forest)
    }

    /// Expands `id` and starts loading its first page if nothing is cached.
    ///
    /// Returns `None` when no fetch is needed: the cache is populated or
    /// exhausted, or a fetch for the node is already in flight. A node whose
    /// previous fetch failed is retried.
    pub fn begin_expand(&mut self, id: NodeId) -> Result<Option<PendingFetch<T>>, TreeError> {
        let node = self.forest.node_mut(id)?;
        if !node.is_expandable() {
            return Err(TreeError::NotExpandable(id));
        }
        let needs_fetch = node.load_error() || node.child_count() == 0;
        if node.expand() {
            let inserted = self.rows.on_expanded(&self.forest, id);
            debug!(node = %id, inserted, "node expanded");
            self.emit(TreeViewEventKind::NodeExpanded, id);
        }
        if !needs_fetch {
            return Ok(None);
        }
        let limit = self.page_limit();
        self.begin_fetch(id, FetchPurpose::Expand, limit)
    }

    /// Hides the children of `id`. They stay cached for the next expand.
    pub fn collapse(&mut self, id: NodeId) -> Result<bool, TreeError> {
        let changed = self.forest.node_mut(id)?.collapse();
        if changed {
            let removed = self.rows.on_collapsed(&self.forest, id);
            debug!(node = %id, removed, "node collapsed");
            self.emit(TreeViewEventKind::NodeCollapsed, id);
        }
        Ok(changed)
    }

    pub fn begin_toggle_expand(
        &mut self,
        id: NodeId,
    ) -> Result<Option<PendingFetch<T>>, TreeError> {
        if self.forest.node(id)?.is_expanded() {
            self.collapse(id)?;
            Ok(None)
        } else {
            self.begin_expand(id)
        }
    }

    /// Collapses `id` and drops its cached subtree so the next expand starts
    /// from offset 0 again. A fetch still in flight for the node or one of
    /// its descendants is discarded when it completes.
    pub fn collapse_and_reset(&mut self, id: NodeId) -> Result<usize, TreeError> {
        self.collapse(id)?;
        let forest = &self.forest;
        let in_subtree = |node: NodeId| node == id || forest.is_descendant(node, id);
        let drop_selection =
            self.selection.selected().is_some_and(|selected| forest.is_descendant(selected, id));
        if self.scroll_fetch.is_some_and(&in_subtree) {
            self.scroll_fetch = None;
        }
        self.tickets.retain(|node, _| !in_subtree(*node));
        if drop_selection {
            self.selection.clear(&mut self.forest);
        }
        let freed = self.forest.reset_subtree(id)?;
        debug!(node = %id, freed, "cached subtree dropped");
        Ok(freed)
    }

    /// Applies a resolved fetch to the tree.
    pub fn complete(&mut self, outcome: FetchOutcome<T>) -> FetchApplied {
        let FetchOutcome { node: id, ticket, purpose, offset, paging, result, elapsed } = outcome;
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let expected = self.tickets.get(&id) == Some(&ticket)
            && self.forest.get(id).is_some_and(|node| node.is_expecting(offset));
        if !expected {
            warn!(
                node = %id,
                offset,
                elapsed_ms,
                "discarding completion that is no longer expected"
            );
            return FetchApplied::Stale { node: id };
        }
        self.tickets.remove(&id);
        if purpose == FetchPurpose::Scroll && self.scroll_fetch == Some(id) {
            self.scroll_fetch = None;
        }

        match result {
            Ok(items) => self.apply_page(id, paging, items, elapsed),
            Err(error) => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.fail_load();
                }
                warn!(node = %id, offset, elapsed_ms, %error, "loading children failed");
                self.emit(TreeViewEventKind::LoadFailed, id);
                FetchApplied::Failed { node: id, error }
            }
        }
    }

    pub async fn expand(&mut self, id: NodeId) -> Result<Option<FetchApplied>, TreeError> {
        let Some(pending) = self.begin_expand(id)? else {
            return Ok(None);
        };
        let outcome = pending.resolve().await;
        Ok(Some(self.complete(outcome)))
    }

    pub async fn toggle_expand(&mut self, id: NodeId) -> Result<Option<FetchApplied>, TreeError> {
        let Some(pending) = self.begin_toggle_expand(id)? else {
            return Ok(None);
        };
        let outcome = pending.resolve().await;
        Ok(Some(self.complete(outcome)))
    }

    /// Expands again after a failed fetch.
    pub async fn retry(&mut self, id: NodeId) -> Result<Option<FetchApplied>, TreeError> {
        self.expand(id).await
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Throttled scroll entry point. Returns a ticket if the viewport change
    /// passed the throttle and the buffer below it needs more rows.
    pub fn begin_scroll(
        &mut self,
        viewport: Viewport,
        now: Instant,
    ) -> Result<Option<PendingFetch<T>>, TreeError> {
        self.viewport = Some(viewport);
        if !self.throttle.admit(viewport, now) {
            debug!(start = viewport.start, end = viewport.end, "scroll throttled");
            return Ok(None);
        }
        self.begin_buffer_fill()
    }

    /// Handles the trailing viewport of a throttled burst once the window is over.
    pub fn poll_scroll(&mut self, now: Instant) -> Result<Option<PendingFetch<T>>, TreeError> {
        match self.throttle.release(now) {
            Some(viewport) => {
                self.viewport = Some(viewport);
                self.begin_buffer_fill()
            }
            None => Ok(None),
        }
    }

    /// Rows missing below the viewport to keep `buffer_amount` rows ready.
    pub fn buffer_deficit(&self) -> usize {
        let Some(viewport) = self.viewport else {
            return 0;
        };
        let below = self.rows.len().saturating_sub(viewport.end);
        self.config.buffer_amount.saturating_sub(below)
    }

    /// Starts the next page for the scroll buffer, if one is needed and no
    /// other scroll fetch is running.
    pub fn begin_buffer_fill(&mut self) -> Result<Option<PendingFetch<T>>, TreeError> {
        if self.scroll_fetch.is_some() || !self.retriever.is_paged() {
            return Ok(None);
        }
        let needed = self.buffer_deficit();
        if needed == 0 {
            return Ok(None);
        }
        let Some(candidate) = self.scroll_candidate() else {
            debug!(needed, "no expanded node left to fill the buffer");
            return Ok(None);
        };
        let pending = self.begin_fetch(candidate, FetchPurpose::Scroll, needed)?;
        if pending.is_some() {
            self.scroll_fetch = Some(candidate);
        }
        Ok(pending)
    }

    /// Unthrottled scroll handling: fetches until the buffer is full or no
    /// node has children left.
    pub async fn handle_scroll(
        &mut self,
        viewport: Viewport,
    ) -> Result<Vec<FetchApplied>, TreeError> {
        self.viewport = Some(viewport);
        let first = self.begin_buffer_fill()?;
        self.drive_buffer_fill(first).await
    }

    pub async fn handle_scroll_at(
        &mut self,
        viewport: Viewport,
        now: Instant,
    ) -> Result<Vec<FetchApplied>, TreeError> {
        let first = self.begin_scroll(viewport, now)?;
        self.drive_buffer_fill(first).await
    }

    pub async fn fill_buffer(&mut self) -> Result<Vec<FetchApplied>, TreeError> {
        let first = self.begin_buffer_fill()?;
        self.drive_buffer_fill(first).await
    }

    /// Asks the retriever whether `id` has children and remembers the answer.
    pub async fn probe_children(&mut self, id: NodeId) -> Result<bool, TreeError> {
        let future = self.retriever.has_children(self.forest.node(id)?.data());
        let has_children = future.await?;
        self.forest.node_mut(id)?.set_has_children(has_children);
        debug!(node = %id, has_children, "children probed");
        Ok(has_children)
    }

    /// Probes every visible row whose child state is still unknown and
    /// returns how many answered. A row whose probe fails keeps its unknown
    /// state; the remaining rows are still probed.
    pub async fn probe_visible(&mut self) -> Result<usize, TreeError> {
        let unknown: Vec<NodeId> = self
            .rows
            .produce()
            .iter()
            .copied()
            .filter(|id| self.forest.get(*id).is_some_and(|node| node.has_children().is_none()))
            .collect();
        let mut probed = 0;
        for id in unknown {
            match self.probe_children(id).await {
                Ok(_) => probed += 1,
                Err(TreeError::Retriever(error)) => {
                    warn!(node = %id, %error, "probing children failed");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(probed)
    }

    /// Fetches the total child count of `id` from a paged retriever.
    pub async fn refresh_child_count(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let future = self.retriever.child_count(self.forest.node(id)?.data())?;
        let count = future.await?;
        let node = self.forest.node_mut(id)?;
        node.set_expected_children(count);
        debug!(node = %id, count, exhausted = node.all_children_loaded(), "child count refreshed");
        Ok(count)
    }

    async fn drive_buffer_fill(
        &mut self,
        first: Option<PendingFetch<T>>,
    ) -> Result<Vec<FetchApplied>, TreeError> {
        let mut applied = Vec::new();
        let mut next = first;
        while let Some(pending) = next {
            let result = self.complete(pending.resolve().await);
            let progressed = matches!(result, FetchApplied::Appended { .. });
            applied.push(result);
            if !self.config.fill_buffer || !progressed {
                break;
            }
            next = self.begin_buffer_fill()?;
        }
        Ok(applied)
    }

    fn begin_fetch(
        &mut self,
        id: NodeId,
        purpose: FetchPurpose,
        limit: usize,
    ) -> Result<Option<PendingFetch<T>>, TreeError> {
        let node = self.forest.node_mut(id)?;
        let paging = if self.retriever.is_paged() {
            Some(PagingParams::new(node.child_count(), limit)?)
        } else {
            None
        };
        let Some(offset) = node.begin_load() else {
            debug!(node = %id, ?purpose, "fetch already running or children exhausted");
            return Ok(None);
        };
        let future = self.retriever.fetch(node.data(), paging);

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.tickets.insert(id, ticket);
        debug!(
            node = %id,
            ?purpose,
            offset,
            limit = paging.map_or(0, |paging| paging.limit()),
            "fetching children"
        );
        Ok(Some(PendingFetch {
            node: id,
            ticket,
            purpose,
            offset,
            paging,
            started: Instant::now(),
            future,
        }))
    }

    fn apply_page(
        &mut self,
        id: NodeId,
        paging: Option<PagingParams>,
        items: Vec<NodeData<T>>,
        elapsed: Duration,
    ) -> FetchApplied {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let fetched = items.len();
        let added = match self.forest.append_children(id, items) {
            Ok(added) => added,
            Err(error) => {
                warn!(node = %id, %error, "dropping page for a vanished node");
                return FetchApplied::Stale { node: id };
            }
        };
        let Some(node) = self.forest.get_mut(id) else {
            return FetchApplied::Stale { node: id };
        };
        node.finish_load();
        let short_page = paging.is_none_or(|paging| paging.is_exhausted_by(fetched));
        let reached_expected =
            node.expected_children().is_some_and(|expected| node.child_count() >= expected);
        if short_page || reached_expected {
            node.mark_all_children_loaded();
        }
        let exhausted = node.all_children_loaded();

        let inserted = self.rows.on_children_appended(&self.forest, id, &added);
        debug!(node = %id, fetched, inserted, exhausted, elapsed_ms, "children loaded");
        if elapsed >= SLOW_FETCH {
            warn!(node = %id, fetched, elapsed_ms, "slow children fetch");
        }
        self.emit(TreeViewEventKind::ChildrenLoaded { count: fetched }, id);
        FetchApplied::Appended { node: id, fetched, exhausted }
    }

    /// First visible node that is expanded, can load more and is idle.
    fn scroll_candidate(&self) -> Option<NodeId> {
        self.rows.produce().iter().copied().find(|id| {
            self.forest.get(*id).is_some_and(|node| {
                node.is_expanded()
                    && !node.all_children_loaded()
                    && !node.is_loading()
                    && !node.load_error()
            })
        })
    }

    fn page_limit(&self) -> usize {
        let viewport = self
            .viewport
            .map(|viewport| viewport.len())
            .or_else(|| self.config.viewport_capacity())
            .unwrap_or(0);
        (viewport + self.config.buffer_amount).max(1)
    }

    fn emit(&self, kind: TreeViewEventKind, node: NodeId) {
        self.dispatcher.dispatch(TreeViewEvent::new(kind, node));
    }
}

impl<T: 'static> std::fmt::Debug for TreeView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeView")
            .field("nodes", &self.forest.len())
            .field("rows", &self.rows.len())
            .field("selected", &self.selection.selected())
            .field("retriever", &self.retriever)
            .field("viewport", &self.viewport)
            .field("scroll_fetch", &self.scroll_fetch)
            .finish_non_exhaustive()
    }
}
