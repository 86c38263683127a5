use std::time::Duration;

use crate::services::page::{SearchPage, StabilitySignal};

/// How many identical consecutive measurements mean the listing is done
/// growing.
const STABLE_READS: u32 = 3;

/// Tracks the run of identical stability signals across scroll iterations.
pub struct StabilityTracker {
    last: Option<StabilitySignal>,
    identical_reads: u32,
}

impl StabilityTracker {
    pub fn new() -> Self {
        StabilityTracker {
            last: None,
            identical_reads: 0,
        }
    }

    /// Feeds one measurement. Returns true once the same signal has been
    /// read `STABLE_READS` times in a row.
    pub fn observe(&mut self, signal: StabilitySignal) -> bool {
        match self.last {
            Some(last) if last == signal => self.identical_reads += 1,
            _ => self.identical_reads = 1,
        }
        self.last = Some(signal);
        self.identical_reads >= STABLE_READS
    }

    /// True right after the first no-change observation. The loader uses
    /// this to fire a single perturbation scroll before measuring again.
    pub fn first_repeat(&self) -> bool {
        self.identical_reads == 2
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scrolls the page until the listing stops growing or the iteration
/// budget runs out, then scrolls back to the top.
///
/// Scroll and measure failures are downgraded to warnings: the site can
/// hiccup mid-scroll and whatever is already rendered is still worth
/// extracting.
pub async fn load_full_listing<P: SearchPage>(
    page: &P,
    max_iterations: u32,
    settle: Duration,
) -> StabilitySignal {
    let mut tracker = StabilityTracker::new();
    let mut last_signal = StabilitySignal::default();

    for iteration in 0..max_iterations {
        if let Err(e) = page.scroll_to_bottom().await {
            log::warn!("Scroll to bottom failed: {:?}", e);
        }
        tokio::time::sleep(settle).await;

        let signal = match page.measure().await {
            Ok(signal) => signal,
            Err(e) => {
                log::warn!("Failed to measure page, keeping previous reading: {:?}", e);
                last_signal
            }
        };
        last_signal = signal;

        if tracker.observe(signal) {
            log::info!(
                "Listing stable at {} cards after {} scroll iterations",
                signal.card_count,
                iteration + 1
            );
            break;
        }

        if tracker.first_repeat() {
            if let Err(e) = page.nudge().await {
                log::warn!("Perturbation scroll failed: {:?}", e);
            }
        }
    }

    if let Err(e) = page.scroll_to_top().await {
        log::warn!("Scroll back to top failed: {:?}", e);
    }

    last_signal
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{load_full_listing, StabilityTracker};
    use crate::services::page::{SearchPage, StabilitySignal};

    fn signal(height: u64, card_count: usize) -> StabilitySignal {
        StabilitySignal { height, card_count }
    }

    /// Replays a scripted sequence of measurements; the last one repeats
    /// once the script runs out.
    struct FakePage {
        signals: Mutex<Vec<StabilitySignal>>,
        measures: AtomicUsize,
        nudges: AtomicUsize,
        top_scrolls: AtomicUsize,
    }

    impl FakePage {
        fn new(signals: Vec<StabilitySignal>) -> Self {
            FakePage {
                signals: Mutex::new(signals),
                measures: AtomicUsize::new(0),
                nudges: AtomicUsize::new(0),
                top_scrolls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchPage for FakePage {
        async fn wait_for_cards(&self, _timeout: Duration) -> bool {
            true
        }

        async fn scroll_to_bottom(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn scroll_to_top(&self) -> anyhow::Result<()> {
            self.top_scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn nudge(&self) -> anyhow::Result<()> {
            self.nudges.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn measure(&self) -> anyhow::Result<StabilitySignal> {
            let index = self.measures.fetch_add(1, Ordering::SeqCst);
            let signals = self.signals.lock().unwrap();
            let signal = signals
                .get(index)
                .or_else(|| signals.last())
                .copied()
                .unwrap_or_default();
            Ok(signal)
        }

        async fn reload(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn page_source(&self) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn tracker_stops_on_third_identical_read() {
        let mut tracker = StabilityTracker::new();
        assert!(!tracker.observe(signal(1000, 20)));
        assert!(!tracker.observe(signal(1000, 20)));
        assert!(tracker.observe(signal(1000, 20)));
    }

    #[test]
    fn tracker_resets_when_the_signal_changes() {
        let mut tracker = StabilityTracker::new();
        assert!(!tracker.observe(signal(1000, 20)));
        assert!(!tracker.observe(signal(1000, 20)));
        assert!(!tracker.observe(signal(1400, 28)));
        assert!(!tracker.observe(signal(1400, 28)));
        assert!(tracker.observe(signal(1400, 28)));
    }

    #[test]
    fn tracker_flags_the_first_repeat_only() {
        let mut tracker = StabilityTracker::new();
        tracker.observe(signal(1000, 20));
        assert!(!tracker.first_repeat());
        tracker.observe(signal(1000, 20));
        assert!(tracker.first_repeat());
    }

    #[tokio::test]
    async fn loop_terminates_on_stable_signal_before_budget() {
        let page = FakePage::new(vec![signal(1000, 20)]);

        let final_signal = load_full_listing(&page, 50, Duration::ZERO).await;

        assert_eq!(page.measures.load(Ordering::SeqCst), 3);
        assert_eq!(final_signal.card_count, 20);
        assert_eq!(page.top_scrolls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loop_exhausts_budget_when_signal_keeps_growing() {
        let signals = (1..=10).map(|i| signal(i * 500, (i * 12) as usize));
        // Only the first 6 are reachable with a budget of 6.
        let page = FakePage::new(signals.take(6).collect());

        load_full_listing(&page, 6, Duration::ZERO).await;

        assert_eq!(page.measures.load(Ordering::SeqCst), 6);
        assert_eq!(page.nudges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn loop_nudges_once_on_first_repeat() {
        let page = FakePage::new(vec![signal(1000, 20), signal(1000, 20), signal(1600, 32)]);

        load_full_listing(&page, 50, Duration::ZERO).await;

        // Second read repeats -> one nudge; growth resumes, then the
        // signal settles again without a second first-repeat nudge until
        // the next plateau starts.
        assert!(page.nudges.load(Ordering::SeqCst) >= 1);
    }
}
