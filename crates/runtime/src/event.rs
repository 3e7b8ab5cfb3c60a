use lazytree_core::event::{TreeViewEvent, TreeViewEventSink};
use std::sync::{Arc, PoisonError, RwLock, mpsc};

/// Fans tree view events out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: RwLock<Vec<Arc<dyn TreeViewEventSink>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sink: Arc<dyn TreeViewEventSink>) {
        self.sinks.write().unwrap_or_else(PoisonError::into_inner).push(sink);
    }

    pub fn dispatch(&self, event: TreeViewEvent) {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner).clone();
        for sink in &sinks {
            sink.dispatch(event);
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drops all sinks; later events go nowhere.
    pub fn shutdown(&self) {
        self.sinks.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher").field("sinks", &self.sink_count()).finish()
    }
}

/// Forwards events into an mpsc channel.
pub struct ChannelSink {
    sender: mpsc::Sender<TreeViewEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<TreeViewEvent>) -> Self {
        Self { sender }
    }
}

impl TreeViewEventSink for ChannelSink {
    fn dispatch(&self, event: TreeViewEvent) {
        // A dropped receiver only means nobody listens anymore.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazytree_core::event::TreeViewEventKind;
    use lazytree_core::node::{Forest, NodeData};
    use rstest::rstest;

    #[rstest]
    fn dispatches_to_all_sinks_until_shutdown() {
        let mut forest = Forest::new();
        let node = forest.add_root(NodeData::new("A".to_owned(), "name"));
        let dispatcher = EventDispatcher::new();
        let (first_tx, first_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel();
        dispatcher.register(Arc::new(ChannelSink::new(first_tx)));
        dispatcher.register(Arc::new(ChannelSink::new(second_tx)));

        let event = TreeViewEvent::new(TreeViewEventKind::NodeClicked, node);
        dispatcher.dispatch(event);
        assert_eq!(first_rx.try_recv().unwrap(), event);
        assert_eq!(second_rx.try_recv().unwrap(), event);

        dispatcher.shutdown();
        dispatcher.dispatch(event);
        assert_eq!(dispatcher.sink_count(), 0);
        assert!(first_rx.try_recv().is_err());
    }

    #[rstest]
    fn closed_receiver_is_ignored() {
        let mut forest = Forest::new();
        let node = forest.add_root(NodeData::new("A".to_owned(), "name"));
        let dispatcher = EventDispatcher::new();
        let (sender, receiver) = mpsc::channel();
        dispatcher.register(Arc::new(ChannelSink::new(sender)));
        drop(receiver);
        dispatcher.dispatch(TreeViewEvent::new(TreeViewEventKind::NodeCollapsed, node));
    }
}
