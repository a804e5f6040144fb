pub mod detail;
pub mod log;
pub mod observer;
pub mod overlay;
pub mod progress;

pub use detail::CitationDetail;
pub use log::{LogEntry, LogLevel, LogService};
pub use observer::{Observers, Subscription};
pub use overlay::{CitationOverlay, LinkOpener, OverlayState};
pub use progress::{
    BackoffPolicy, ChannelEffect, ConnectionState, ExponentialBackoff, FixedBackoff,
    ProgressChannel, ProgressError, ProgressUpdate, ReconnectToken, SocketId,
};
