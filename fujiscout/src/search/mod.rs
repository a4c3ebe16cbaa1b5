//! The scanning engine.
//!
//! A scan drains a [`WorkQueue`](crate::queue::WorkQueue) one folder at a
//! time. Inside a folder every file whose name passes the
//! [`PathFilter`](crate::filters::PathFilter) is read line by line by the
//! [`FileProcessor`]; lines containing one of the target words become
//! [`MatchRecord`](crate::results::MatchRecord)s, annotated from the file name
//! and appended to a [`ResultSink`](crate::output::ResultSink) right away.
//!
//! Everything runs sequentially on the caller's thread. Hosts that need a
//! responsive surface run [`scan`] on a worker thread and watch it through a
//! [`ScanObserver`](crate::progress::ScanObserver):
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let (tx, rx) = std::sync::mpsc::channel();
//! let worker = {
//!     let cancel = cancel.clone();
//!     std::thread::spawn(move || scan(&config, &mut ChannelObserver::new(tx), &cancel))
//! };
//! for event in rx {
//!     // render ScanEvent::Progress / ScanEvent::Matches
//! }
//! let summary = worker.join().unwrap()?;
//! ```
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::{scan, ScanEngine, ScanOptions};
pub use matcher::WordMatcher;
pub use processor::FileProcessor;
