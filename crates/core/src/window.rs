//! Contiguous, growable range of calendar days backing the infinite agenda.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::model::{DateKey, Direction};

pub const INITIAL_DAYS_BEFORE: i64 = 21;
pub const INITIAL_SPAN: usize = 42;
pub const EXTEND_BATCH: usize = 7;
pub const EDGE_THRESHOLD_PX: f64 = 300.0;
pub const EXTEND_COOL_DOWN: Duration = Duration::from_millis(50);
/// Farthest a single jump may reach past either edge of the window.
pub const MAX_JUMP_DAYS: i64 = 3_660;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JumpError {
    #[error("{0} is too far from the loaded days")]
    TooFar(DateKey),
}

/// Scroll position reported by the presentation layer, in its own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_top(&self) -> f64 {
        self.offset_top
    }

    pub fn distance_from_bottom(&self) -> f64 {
        self.content_height - (self.offset_top + self.viewport_height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendOutcome {
    Extended {
        direction: Direction,
        added: Vec<DateKey>,
    },
    /// A previous extension is still settling; nothing was added.
    CoolingDown,
}

impl ExtendOutcome {
    pub fn added(&self) -> &[DateKey] {
        match self {
            ExtendOutcome::Extended { added, .. } => added,
            ExtendOutcome::CoolingDown => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateWindow {
    dates: Vec<DateKey>,
    threshold: f64,
    in_flight_until: Option<Instant>,
}

impl DateWindow {
    /// Window of [`INITIAL_SPAN`] days starting [`INITIAL_DAYS_BEFORE`] days
    /// before `anchor`.
    pub fn around(anchor: DateKey) -> Self {
        let first = anchor.offset(-INITIAL_DAYS_BEFORE);
        Self::starting_at(first, INITIAL_SPAN)
    }

    pub fn starting_at(first: DateKey, len: usize) -> Self {
        let dates = (0..len as i64).map(|i| first.offset(i)).collect();
        Self {
            dates,
            threshold: EDGE_THRESHOLD_PX,
            in_flight_until: None,
        }
    }

    /// Use a different edge threshold, for presentations that scroll in rows.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn dates(&self) -> &[DateKey] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<DateKey> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<DateKey> {
        self.dates.last().copied()
    }

    pub fn contains(&self, date: DateKey) -> bool {
        self.index_of(date).is_some()
    }

    /// Position of `date`, computed from the first day.
    pub fn index_of(&self, date: DateKey) -> Option<usize> {
        let first = self.first()?;
        let offset = first.days_until(date);
        if offset < 0 || offset as usize >= self.dates.len() {
            return None;
        }
        Some(offset as usize)
    }

    /// Consecutive groups of seven days, the last one possibly shorter.
    pub fn weeks(&self) -> impl Iterator<Item = &[DateKey]> {
        self.dates.chunks(7)
    }

    /// Grow the window by one batch. Always applied.
    pub fn extend(&mut self, direction: Direction) -> Vec<DateKey> {
        let added: Vec<DateKey> = match (direction, self.first(), self.last()) {
            (Direction::After, _, Some(last)) => {
                (1..=EXTEND_BATCH as i64).map(|i| last.offset(i)).collect()
            }
            (Direction::Before, Some(first), _) => (1..=EXTEND_BATCH as i64)
                .rev()
                .map(|i| first.offset(-i))
                .collect(),
            _ => return Vec::new(),
        };

        match direction {
            Direction::After => self.dates.extend(added.iter().copied()),
            Direction::Before => {
                self.dates.splice(0..0, added.iter().copied());
            }
        }
        debug!(%direction, len = self.dates.len(), "extended date window");
        added
    }

    pub fn is_extending(&self, now: Instant) -> bool {
        self.in_flight_until.map(|until| now < until).unwrap_or(false)
    }

    /// Guarded extension used by scroll triggers. Rejected while an earlier
    /// extension is still cooling down.
    pub fn request_extend(&mut self, direction: Direction, now: Instant) -> ExtendOutcome {
        if self.is_extending(now) {
            return ExtendOutcome::CoolingDown;
        }
        let added = self.extend(direction);
        self.in_flight_until = Some(now + EXTEND_COOL_DOWN);
        ExtendOutcome::Extended { direction, added }
    }

    /// Clear the in-flight guard once the cooldown has elapsed.
    pub fn settle(&mut self, now: Instant) {
        if !self.is_extending(now) {
            self.in_flight_until = None;
        }
    }

    /// Extend toward whichever edge is within the threshold, preferring the top.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) -> Option<ExtendOutcome> {
        let direction = if metrics.distance_from_top() < self.threshold {
            Direction::Before
        } else if metrics.distance_from_bottom() < self.threshold {
            Direction::After
        } else {
            return None;
        };
        Some(self.request_extend(direction, now))
    }

    /// Extend in whole batches until `date` is part of the window. Returns
    /// the number of days added before the old first day. Targets more than
    /// [`MAX_JUMP_DAYS`] past an edge are rejected and leave the window as is.
    pub fn ensure_contains(&mut self, date: DateKey) -> Result<usize, JumpError> {
        let (Some(first), Some(last)) = (self.first(), self.last()) else {
            return Ok(0);
        };
        let (direction, gap) = if date < first {
            (Direction::Before, date.days_until(first))
        } else if date > last {
            (Direction::After, last.days_until(date))
        } else {
            return Ok(0);
        };
        if gap > MAX_JUMP_DAYS {
            return Err(JumpError::TooFar(date));
        }

        let added = (gap as usize).div_ceil(EXTEND_BATCH) * EXTEND_BATCH;
        match direction {
            Direction::Before => {
                let prefix = (1..=added as i64).rev().map(|i| first.offset(-i));
                self.dates.splice(0..0, prefix);
            }
            Direction::After => {
                self.dates.extend((1..=added as i64).map(|i| last.offset(i)));
            }
        }
        debug!(%direction, added, len = self.dates.len(), "extended date window");
        Ok(match direction {
            Direction::Before => added,
            Direction::After => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn anchor() -> DateKey {
        DateKey::from_ymd(2024, 3, 4).unwrap()
    }

    fn assert_contiguous(window: &DateWindow) {
        for pair in window.dates().windows(2) {
            assert_eq!(pair[0].succ(), pair[1]);
        }
    }

    #[test]
    fn initial_window_spans_six_weeks_around_anchor() {
        let window = DateWindow::around(anchor());
        assert_eq!(window.len(), 42);
        assert_eq!(window.first(), Some(anchor().offset(-21)));
        assert_eq!(window.last(), Some(anchor().offset(20)));
        assert_eq!(window.index_of(anchor()), Some(21));
        assert_contiguous(&window);
    }

    #[test]
    fn extending_both_ways_stays_contiguous() {
        let mut window = DateWindow::around(anchor());
        let after = window.extend(Direction::After);
        assert_eq!(after.first().copied(), Some(anchor().offset(21)));
        assert_eq!(after.last().copied(), Some(anchor().offset(27)));

        let before = window.extend(Direction::Before);
        assert_eq!(before.first().copied(), Some(anchor().offset(-28)));
        assert_eq!(before.last().copied(), Some(anchor().offset(-22)));

        assert_eq!(window.len(), 56);
        assert_contiguous(&window);
    }

    #[test]
    fn guarded_extend_rejects_during_cool_down() {
        let mut window = DateWindow::around(anchor());
        let t0 = Instant::now();
        assert!(matches!(
            window.request_extend(Direction::After, t0),
            ExtendOutcome::Extended { .. }
        ));
        assert_eq!(
            window.request_extend(Direction::Before, t0 + Duration::from_millis(10)),
            ExtendOutcome::CoolingDown
        );
        assert_eq!(window.len(), 49);

        let later = t0 + Duration::from_millis(60);
        window.settle(later);
        assert!(!window.is_extending(later));
        assert_eq!(window.request_extend(Direction::Before, later).added().len(), 7);
        assert_contiguous(&window);
    }

    #[rstest]
    #[case(100.0, Some(Direction::Before))]
    #[case(1000.0, None)]
    #[case(2000.0, Some(Direction::After))]
    fn scroll_trigger_picks_nearest_edge(
        #[case] offset_top: f64,
        #[case] expected: Option<Direction>,
    ) {
        let mut window = DateWindow::around(anchor());
        let metrics = ScrollMetrics {
            offset_top,
            viewport_height: 800.0,
            content_height: 3000.0,
        };
        let direction = match window.on_scroll(metrics, Instant::now()) {
            Some(ExtendOutcome::Extended { direction, .. }) => Some(direction),
            _ => None,
        };
        assert_eq!(direction, expected);
    }

    #[test]
    fn top_edge_wins_when_both_are_close() {
        let mut window = DateWindow::around(anchor()).with_threshold(10.0);
        let metrics = ScrollMetrics {
            offset_top: 0.0,
            viewport_height: 20.0,
            content_height: 20.0,
        };
        let outcome = window.on_scroll(metrics, Instant::now()).unwrap();
        assert!(matches!(
            outcome,
            ExtendOutcome::Extended {
                direction: Direction::Before,
                ..
            }
        ));
    }

    #[test]
    fn ensure_contains_extends_in_batches() {
        let mut window = DateWindow::around(anchor());
        let far_past = anchor().offset(-40);
        let prepended = window.ensure_contains(far_past).unwrap();
        assert_eq!(prepended, 21);
        assert!(window.contains(far_past));

        let far_future = anchor().offset(60);
        assert_eq!(window.ensure_contains(far_future), Ok(0));
        assert!(window.contains(far_future));
        assert_eq!(window.len() % 7, 0);
        assert_contiguous(&window);
    }

    #[test]
    fn ensure_contains_prepends_a_long_jump_at_once() {
        let mut window = DateWindow::around(anchor());
        let edge = window.first().unwrap();
        let target = edge.offset(-MAX_JUMP_DAYS);
        let prepended = window.ensure_contains(target).unwrap();
        assert_eq!(prepended % EXTEND_BATCH, 0);
        assert!(prepended >= MAX_JUMP_DAYS as usize);
        assert!(prepended < MAX_JUMP_DAYS as usize + EXTEND_BATCH);
        assert!(window.contains(target));
        assert_eq!(window.index_of(edge), Some(prepended));
        assert_contiguous(&window);
    }

    #[rstest]
    #[case(DateKey::from_ymd(1000, 1, 1).unwrap())]
    #[case(DateKey::from_ymd(9999, 12, 31).unwrap())]
    fn far_jumps_leave_the_window_untouched(#[case] target: DateKey) {
        let mut window = DateWindow::around(anchor());
        let before = window.dates().to_vec();
        assert_eq!(window.ensure_contains(target), Err(JumpError::TooFar(target)));
        assert_eq!(window.dates(), before.as_slice());
    }

    #[test]
    fn weeks_chunk_by_seven() {
        let window = DateWindow::around(anchor());
        let weeks: Vec<&[DateKey]> = window.weeks().collect();
        assert_eq!(weeks.len(), 6);
        assert!(weeks.iter().all(|week| week.len() == 7));
    }
}
