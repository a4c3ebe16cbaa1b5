//! Progress reporting from the scan worker.
//!
//! The engine calls a [`ScanObserver`] synchronously from the thread that runs
//! the scan. Hosts that render progress elsewhere can use [`ChannelObserver`]
//! to forward [`ScanEvent`]s over a channel; a slow receiver never blocks the
//! scan because `mpsc` channels are unbounded.
use std::sync::mpsc::Sender;

/// Receives progress notifications from a running scan
pub trait ScanObserver {
    /// A human-readable status line (folder or file transition, final result)
    fn on_progress(&mut self, message: &str);

    /// The running total of matches, called after every match
    fn on_match(&mut self, total_matches: usize);
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_progress(&mut self, _message: &str) {}
    fn on_match(&mut self, _total_matches: usize) {}
}

/// A transient notification emitted by the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Progress(String),
    Matches(usize),
}

/// Forwards notifications as [`ScanEvent`]s over an `mpsc` channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<ScanEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<ScanEvent>) -> Self {
        Self { tx }
    }
}

impl ScanObserver for ChannelObserver {
    fn on_progress(&mut self, message: &str) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.tx.send(ScanEvent::Progress(message.to_string()));
    }

    fn on_match(&mut self, total_matches: usize) {
        let _ = self.tx.send(ScanEvent::Matches(total_matches));
    }
}

/// Adapts a pair of closures into a [`ScanObserver`]
pub struct CallbackObserver<P, M>
where
    P: FnMut(&str),
    M: FnMut(usize),
{
    on_progress: P,
    on_match: M,
}

impl<P, M> CallbackObserver<P, M>
where
    P: FnMut(&str),
    M: FnMut(usize),
{
    pub fn new(on_progress: P, on_match: M) -> Self {
        Self {
            on_progress,
            on_match,
        }
    }
}

impl<P, M> ScanObserver for CallbackObserver<P, M>
where
    P: FnMut(&str),
    M: FnMut(usize),
{
    fn on_progress(&mut self, message: &str) {
        (self.on_progress)(message)
    }

    fn on_match(&mut self, total_matches: usize) {
        (self.on_match)(total_matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_observer_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let mut observer = ChannelObserver::new(tx);
        observer.on_progress("Searching in folder: a");
        observer.on_match(3);
        drop(observer);

        let events: Vec<ScanEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ScanEvent::Progress("Searching in folder: a".to_string()),
                ScanEvent::Matches(3)
            ]
        );
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut observer = ChannelObserver::new(tx);
        observer.on_progress("still running");
        observer.on_match(1);
    }

    #[test]
    fn test_callback_observer() {
        let mut messages = Vec::new();
        let mut last_total = 0;
        {
            let mut observer =
                CallbackObserver::new(|m: &str| messages.push(m.to_string()), |n| last_total = n);
            observer.on_progress("one");
            observer.on_match(7);
        }
        assert_eq!(messages, vec!["one".to_string()]);
        assert_eq!(last_total, 7);
    }
}
