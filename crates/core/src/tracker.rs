//! Works out which day is "current" from what the renderer laid out.

use tracing::debug;

use crate::model::DateKey;

/// Vertical extent of one rendered day, in the renderer's scroll coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRect {
    pub date: DateKey,
    pub top: f64,
    pub height: f64,
}

impl DayRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn intersects(&self, rect: &DayRect) -> bool {
        rect.bottom() > self.top && rect.top < self.bottom()
    }
}

/// Day whose centre is closest to the viewport centre among the days that
/// overlap the viewport. The earlier rect wins a tie.
pub fn resolve_active_date(rects: &[DayRect], viewport: Viewport) -> Option<DateKey> {
    let center = viewport.center();
    let mut best: Option<(DateKey, f64)> = None;
    for rect in rects.iter().filter(|rect| viewport.intersects(rect)) {
        let distance = (rect.center() - center).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((rect.date, distance)),
        }
    }
    best.map(|(date, _)| date)
}

#[derive(Debug, Clone, Default)]
pub struct VisibleDateTracker {
    active: Option<DateKey>,
}

impl VisibleDateTracker {
    pub fn new(initial: DateKey) -> Self {
        Self {
            active: Some(initial),
        }
    }

    pub fn active(&self) -> Option<DateKey> {
        self.active
    }

    /// Recompute from the latest layout. Returns the new date only when it
    /// differs from the one already published.
    pub fn update(&mut self, rects: &[DayRect], viewport: Viewport) -> Option<DateKey> {
        let resolved = resolve_active_date(rects, viewport)?;
        if self.active == Some(resolved) {
            return None;
        }
        debug!(date = %resolved, "active date changed");
        self.active = Some(resolved);
        Some(resolved)
    }

    /// Point the tracker at `date` directly, e.g. after a jump.
    pub fn set(&mut self, date: DateKey) -> bool {
        if self.active == Some(date) {
            return false;
        }
        self.active = Some(date);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> DateKey {
        DateKey::from_ymd(2024, 3, 4).unwrap().offset(offset)
    }

    fn stacked(heights: &[f64]) -> Vec<DayRect> {
        let mut top = 0.0;
        heights
            .iter()
            .enumerate()
            .map(|(i, height)| {
                let rect = DayRect {
                    date: day(i as i64),
                    top,
                    height: *height,
                };
                top += height;
                rect
            })
            .collect()
    }

    #[test]
    fn picks_rect_closest_to_viewport_center() {
        let rects = stacked(&[100.0, 100.0, 100.0, 100.0]);
        let viewport = Viewport {
            top: 120.0,
            height: 100.0,
        };
        assert_eq!(resolve_active_date(&rects, viewport), Some(day(1)));
    }

    #[test]
    fn partial_overlap_counts_and_ties_keep_first() {
        let rects = stacked(&[100.0, 100.0]);
        let viewport = Viewport {
            top: 50.0,
            height: 100.0,
        };
        assert_eq!(resolve_active_date(&rects, viewport), Some(day(0)));
    }

    #[test]
    fn offscreen_rects_are_ignored() {
        let rects = stacked(&[100.0, 100.0]);
        let viewport = Viewport {
            top: 500.0,
            height: 100.0,
        };
        assert_eq!(resolve_active_date(&rects, viewport), None);
    }

    #[test]
    fn tall_rect_beats_distant_small_one() {
        let rects = stacked(&[40.0, 400.0, 40.0]);
        let viewport = Viewport {
            top: 0.0,
            height: 480.0,
        };
        assert_eq!(resolve_active_date(&rects, viewport), Some(day(1)));
    }

    #[test]
    fn tracker_publishes_only_changes() {
        let rects = stacked(&[100.0, 100.0, 100.0]);
        let mut tracker = VisibleDateTracker::new(day(0));
        let first = Viewport {
            top: 0.0,
            height: 100.0,
        };
        assert_eq!(tracker.update(&rects, first), None);

        let second = Viewport {
            top: 100.0,
            height: 100.0,
        };
        assert_eq!(tracker.update(&rects, second), Some(day(1)));
        assert_eq!(tracker.update(&rects, second), None);
        assert_eq!(tracker.active(), Some(day(1)));
    }
}
