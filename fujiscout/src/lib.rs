pub mod cancel;
pub mod config;
pub mod errors;
pub mod filters;
pub mod name;
pub mod output;
pub mod progress;
pub mod queue;
pub mod results;
pub mod search;

pub use cancel::CancellationToken;
pub use config::{ScanConfig, ScanRequest};
pub use errors::{ScanError, ScanResult};
pub use progress::{ScanEvent, ScanObserver};
pub use results::{MatchRecord, ScanSummary};
pub use search::scan;
