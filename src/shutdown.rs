//! Downtime bookkeeping. Each idle episode is attributed to the step where it
//! began, with a running duration in hours.

#[derive(Clone, Copy, Debug)]
struct Episode {
    start: usize,
    duration: u32,
}

/// Tracks the contiguous idle episodes of one component.
#[derive(Clone, Copy, Debug)]
pub struct ShutdownTracker {
    episode: Option<Episode>,
}

impl ShutdownTracker {
    /// A new tracker considers the component idle since before the first step,
    /// so a plant that never starts reports downtime from step zero.
    pub fn new() -> Self {
        Self { episode: Some(Episode { start: 0, duration: 0 }) }
    }

    /// Records one hour of operation. Returns the current episode's start step
    /// and its accumulated duration, or `None` while producing.
    pub fn observe(&mut self, step: usize, producing: bool) -> Option<(usize, u32)> {
        if producing {
            self.episode = None;
            return None;
        }
        let episode = self.episode.get_or_insert(Episode { start: step, duration: 0 });
        episode.duration += 1;
        Some((episode.start, episode.duration))
    }
}

impl Default for ShutdownTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_from_the_start() {
        let mut tracker = ShutdownTracker::new();
        assert_eq!(tracker.observe(1, false), Some((0, 1)));
        assert_eq!(tracker.observe(2, false), Some((0, 2)));
    }

    #[test]
    fn test_production_closes_the_episode() {
        let mut tracker = ShutdownTracker::new();
        tracker.observe(1, false);
        assert_eq!(tracker.observe(2, true), None);
        // A later outage opens a fresh episode at its own step.
        assert_eq!(tracker.observe(5, false), Some((5, 1)));
        assert_eq!(tracker.observe(6, false), Some((5, 2)));
    }
}
