//! Single-flight debounce of event-stream updates.
//!
//! The first batch after an idle period opens a fixed window. Batches that
//! arrive while the window is open only add ids; the window is never
//! extended. When it closes, everything collected is flushed at once.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

pub const COALESCE_WINDOW: Duration = Duration::from_millis(1200);

#[derive(Debug)]
pub struct Coalescer {
    window: Duration,
    pending: BTreeSet<String>,
    deadline: Option<Instant>,
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new()
    }
}

impl Coalescer {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(COALESCE_WINDOW)
    }

    #[must_use]
    pub const fn with_window(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeSet::new(),
            deadline: None,
        }
    }

    /// Record the ids patched by one event batch, received at `now`.
    ///
    /// Returns true if this batch opened a new window.
    pub fn push(&mut self, ids: impl IntoIterator<Item = String>, now: Instant) -> bool {
        self.pending.extend(ids);

        if self.deadline.is_some() {
            return false;
        }

        self.deadline = Some(now + self.window);
        true
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    /// Close the window if it has expired at `now`, returning the collected ids.
    pub fn poll(&mut self, now: Instant) -> Option<BTreeSet<String>> {
        match self.deadline {
            Some(deadline) if deadline <= now => Some(self.flush()),
            _ => None,
        }
    }

    /// Close the window unconditionally and go back to idle.
    pub fn flush(&mut self) -> BTreeSet<String> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use maplit::btreeset;
    use tokio::time::Instant;

    use crate::coalesce::{COALESCE_WINDOW, Coalescer};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn idle_until_first_batch() {
        let mut co = Coalescer::new();
        let t0 = Instant::now();

        assert!(!co.is_waiting());
        assert_eq!(co.poll(t0 + ms(5000)), None);

        assert!(co.push(ids(&["a"]), t0));
        assert_eq!(co.deadline(), Some(t0 + COALESCE_WINDOW));
    }

    #[test]
    fn window_is_not_restarted() {
        let mut co = Coalescer::new();
        let t0 = Instant::now();

        assert!(co.push(ids(&["a"]), t0));
        assert!(!co.push(ids(&["b"]), t0 + ms(500)));
        assert!(!co.push(ids(&["a", "c"]), t0 + ms(900)));

        assert_eq!(co.deadline(), Some(t0 + ms(1200)));
        assert_eq!(co.poll(t0 + ms(1199)), None);

        let flushed = co.poll(t0 + ms(1200)).unwrap();
        assert_eq!(flushed, btreeset! {String::from("a"), String::from("b"), String::from("c")});
        assert!(!co.is_waiting());
        assert!(co.pending().is_empty());

        /* only one flush for the whole burst */
        assert_eq!(co.poll(t0 + ms(2100)), None);
    }

    #[test]
    fn next_batch_starts_a_new_cycle() {
        let mut co = Coalescer::new();
        let t0 = Instant::now();

        co.push(ids(&["a"]), t0);
        co.poll(t0 + ms(1200)).unwrap();

        assert!(co.push(ids(&["d"]), t0 + ms(1300)));
        assert_eq!(co.deadline(), Some(t0 + ms(2500)));
        assert_eq!(co.poll(t0 + ms(2500)), Some(btreeset! {String::from("d")}));
    }

    #[test]
    fn empty_batch_still_opens_window() {
        let mut co = Coalescer::with_window(ms(10));
        let t0 = Instant::now();

        assert!(co.push(ids(&[]), t0));
        assert_eq!(co.poll(t0 + ms(10)), Some(btreeset! {}));
    }
}
