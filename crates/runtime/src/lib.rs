mod event;
mod fetch;
mod throttle;
mod view;

pub use event::{ChannelSink, EventDispatcher};
pub use fetch::{FetchApplied, FetchOutcome, FetchPurpose, PendingFetch};
pub use throttle::ScrollThrottle;
pub use view::TreeView;
