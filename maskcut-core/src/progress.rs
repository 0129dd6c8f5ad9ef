//! Milestone-based progress tracking.
//!
//! Reporting is separated from presentation: `update` returns the
//! milestones crossed by a frame and the caller decides how to log them.

/// Fixed progress milestones, in percent of total frame count.
pub const MILESTONES: [u64; 4] = [25, 50, 75, 100];

/// Tracks which milestones have been reported for one video.
///
/// Scoped to a single pipeline run and discarded afterwards. Inert when
/// the container does not report a usable total frame count.
#[derive(Debug)]
pub struct ProgressTracker {
    total_frames: u64,
    reported: [bool; MILESTONES.len()],
}

impl ProgressTracker {
    pub fn new(total_frames: u64) -> Self {
        Self {
            total_frames,
            reported: [false; MILESTONES.len()],
        }
    }

    /// Records that `frame_index` (1-based) has been processed and returns
    /// the milestones newly crossed, each reported exactly once.
    pub fn update(&mut self, frame_index: u64) -> Vec<u64> {
        if self.total_frames == 0 {
            return Vec::new();
        }

        let percent = frame_index.saturating_mul(100) / self.total_frames;
        let mut crossed = Vec::new();
        for (slot, milestone) in MILESTONES.into_iter().enumerate() {
            if percent >= milestone && !self.reported[slot] {
                self.reported[slot] = true;
                crossed.push(milestone);
            }
        }
        crossed
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_frames_emit_each_milestone_once() {
        let mut tracker = ProgressTracker::new(100);
        let mut emitted = Vec::new();
        for frame in 1..=100 {
            emitted.extend(tracker.update(frame));
        }
        assert_eq!(emitted, vec![25, 50, 75, 100]);
    }

    #[test]
    fn milestones_fire_at_exact_frames() {
        let mut tracker = ProgressTracker::new(100);
        assert!(tracker.update(24).is_empty());
        assert_eq!(tracker.update(25), vec![25]);
        assert!(tracker.update(26).is_empty());
        assert_eq!(tracker.update(100), vec![50, 75, 100]);
    }

    #[test]
    fn short_videos_collapse_milestones() {
        let mut tracker = ProgressTracker::new(2);
        assert_eq!(tracker.update(1), vec![25, 50]);
        assert_eq!(tracker.update(2), vec![75, 100]);
    }

    #[test]
    fn unknown_total_disables_reporting() {
        let mut tracker = ProgressTracker::new(0);
        for frame in 1..=500 {
            assert!(tracker.update(frame).is_empty());
        }
    }

    #[test]
    fn duplicate_updates_do_not_repeat_milestones() {
        let mut tracker = ProgressTracker::new(4);
        assert_eq!(tracker.update(4), vec![25, 50, 75, 100]);
        assert!(tracker.update(4).is_empty());
    }
}
