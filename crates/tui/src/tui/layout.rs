//! Flattens the date window into terminal rows and reports where each day
//! landed, so the visible-date tracker can work in row units.

use crate::core::{AgendaSession, DateKey, DayRect, DropTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowKind {
    Week { start: DateKey },
    Day { date: DateKey, count: usize },
    Task { id: String, date: DateKey },
    /// Placeholder under a day without tasks, so the day can be targeted.
    Empty { date: DateKey },
}

impl RowKind {
    pub(crate) fn date(&self) -> DateKey {
        match self {
            RowKind::Week { start } => *start,
            RowKind::Day { date, .. } | RowKind::Task { date, .. } | RowKind::Empty { date } => {
                *date
            }
        }
    }

    pub(crate) fn task_id(&self) -> Option<&str> {
        match self {
            RowKind::Task { id, .. } => Some(id),
            _ => None,
        }
    }

    pub(crate) fn is_selectable(&self) -> bool {
        !matches!(self, RowKind::Week { .. })
    }

    pub(crate) fn drop_target(&self) -> Option<DropTarget> {
        match self {
            RowKind::Week { .. } => None,
            RowKind::Day { date, .. } | RowKind::Empty { date } => Some(DropTarget::Day(*date)),
            RowKind::Task { id, date } => Some(DropTarget::Row {
                task_id: id.clone(),
                date: *date,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AgendaLayout {
    rows: Vec<RowKind>,
    day_rects: Vec<DayRect>,
}

impl AgendaLayout {
    pub(crate) fn build(session: &AgendaSession) -> Self {
        Self::from_weeks(session.weeks(), |date| {
            session
                .tasks_on(date)
                .into_iter()
                .map(|task| task.id.clone())
                .collect()
        })
    }

    pub(crate) fn from_weeks<'a, W, F>(weeks: W, task_ids: F) -> Self
    where
        W: IntoIterator<Item = &'a [DateKey]>,
        F: Fn(DateKey) -> Vec<String>,
    {
        let mut rows = Vec::new();
        let mut day_rects = Vec::new();
        for week in weeks {
            let Some(start) = week.first().copied() else {
                continue;
            };
            rows.push(RowKind::Week { start });
            for date in week.iter().copied() {
                let ids = task_ids(date);
                let top = rows.len();
                rows.push(RowKind::Day {
                    date,
                    count: ids.len(),
                });
                if ids.is_empty() {
                    rows.push(RowKind::Empty { date });
                }
                rows.extend(ids.into_iter().map(|id| RowKind::Task { id, date }));
                day_rects.push(DayRect {
                    date,
                    top: top as f64,
                    height: (rows.len() - top) as f64,
                });
            }
        }
        Self { rows, day_rects }
    }

    pub(crate) fn rows(&self) -> &[RowKind] {
        &self.rows
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn row(&self, index: usize) -> Option<&RowKind> {
        self.rows.get(index)
    }

    /// Days overlapping rows `top..top + height`, plus one neighbour on each
    /// side. Relies on `day_rects` being ordered by `top`.
    pub(crate) fn visible_day_rects(&self, top: usize, height: usize) -> &[DayRect] {
        let (top, bottom) = (top as f64, (top + height) as f64);
        let start = self
            .day_rects
            .partition_point(|rect| rect.bottom() <= top)
            .saturating_sub(1);
        let end = self.day_rects.partition_point(|rect| rect.top < bottom);
        let end = (end + 1).min(self.day_rects.len()).max(start);
        &self.day_rects[start..end]
    }

    pub(crate) fn day_rect(&self, date: DateKey) -> Option<&DayRect> {
        self.day_rects.iter().find(|rect| rect.date == date)
    }

    pub(crate) fn find_day(&self, date: DateKey) -> Option<usize> {
        self.day_rect(date).map(|rect| rect.top as usize)
    }

    pub(crate) fn find_task(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.task_id() == Some(id))
    }

    /// Where `row` sits in this layout, if it still exists.
    pub(crate) fn relocate(&self, row: &RowKind) -> Option<usize> {
        match row {
            RowKind::Task { id, .. } => self.find_task(id),
            RowKind::Day { date, .. } => self.find_day(*date),
            RowKind::Empty { date } => self.find_day(*date).map(|index| index + 1),
            RowKind::Week { start } => self
                .rows
                .iter()
                .position(|candidate| matches!(candidate, RowKind::Week { start: s } if s == start)),
        }
    }

    /// Next selectable row `steps` rows away, clamped to the layout.
    pub(crate) fn step(&self, from: usize, steps: isize) -> usize {
        if self.rows.is_empty() {
            return 0;
        }
        let last = self.rows.len() - 1;
        let mut index = (from as isize + steps).clamp(0, last as isize) as usize;
        let forward = steps >= 0;
        loop {
            if self.rows[index].is_selectable() {
                return index;
            }
            match (forward, index) {
                (true, i) if i < last => index += 1,
                (false, i) if i > 0 => index -= 1,
                _ => return self.nearest_selectable(index),
            }
        }
    }

    /// Header row of the day after (or before) the one containing `from`.
    pub(crate) fn neighbour_day(&self, from: usize, forward: bool) -> Option<usize> {
        let date = self.rows.get(from)?.date();
        let position = self.day_rects.iter().position(|rect| rect.date == date);
        let target = match (position, forward) {
            (Some(i), true) => self.day_rects.get(i + 1),
            (Some(i), false) if i > 0 => self.day_rects.get(i - 1),
            // A week row belongs to the day right below it.
            (None, true) => self.day_rects.iter().find(|rect| rect.date >= date),
            _ => None,
        }?;
        Some(target.top as usize)
    }

    fn nearest_selectable(&self, index: usize) -> usize {
        (index..self.rows.len())
            .chain((0..index).rev())
            .find(|i| self.rows[*i].is_selectable())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DateWindow;
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> DateKey {
        DateKey::from_ymd(2024, 3, 4).unwrap().offset(offset)
    }

    fn layout() -> AgendaLayout {
        let window = DateWindow::starting_at(day(0), 14);
        AgendaLayout::from_weeks(window.weeks(), |date| {
            if date == day(1) {
                vec!["a".into(), "b".into()]
            } else {
                Vec::new()
            }
        })
    }

    #[test]
    fn days_without_tasks_get_a_placeholder_row() {
        let layout = layout();
        assert_eq!(layout.row(0), Some(&RowKind::Week { start: day(0) }));
        assert_eq!(layout.row(1), Some(&RowKind::Day { date: day(0), count: 0 }));
        assert_eq!(layout.row(2), Some(&RowKind::Empty { date: day(0) }));
        assert_eq!(layout.row(3), Some(&RowKind::Day { date: day(1), count: 2 }));
        assert_eq!(layout.find_task("b"), Some(5));
        // Two week rows, 14 day rows, 13 placeholders, 2 tasks.
        assert_eq!(layout.len(), 31);
    }

    #[test]
    fn day_rects_cover_header_and_entries() {
        let layout = layout();
        let rect = layout.day_rect(day(1)).copied().unwrap();
        assert_eq!(rect.top, 3.0);
        assert_eq!(rect.height, 3.0);
        let second_week = layout.day_rect(day(7)).copied().unwrap();
        assert_eq!(second_week.top, 17.0);
        assert_eq!(layout.day_rects.len(), 14);
    }

    #[test]
    fn visible_day_rects_cover_viewport_and_neighbours() {
        let layout = layout();
        let dates: Vec<DateKey> = layout
            .visible_day_rects(6, 4)
            .iter()
            .map(|rect| rect.date)
            .collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(4)]);

        assert_eq!(layout.visible_day_rects(0, 2)[0].date, day(0));
        assert_eq!(layout.visible_day_rects(0, 2).len(), 2);
        let tail = layout.visible_day_rects(29, 10);
        assert_eq!(tail.last().map(|rect| rect.date), Some(day(13)));
        assert_eq!(tail.len(), 2);
        assert_eq!(layout.visible_day_rects(500, 10).len(), 1);
    }

    #[test]
    fn step_skips_week_rows() {
        let layout = layout();
        assert_eq!(layout.step(1, -1), 1);
        let last_of_first_week = layout.find_day(day(6)).unwrap() + 1;
        assert_eq!(layout.step(last_of_first_week, 1), last_of_first_week + 2);
        assert_eq!(layout.step(last_of_first_week + 2, -1), last_of_first_week);
        assert_eq!(layout.step(0, 1_000), layout.len() - 1);
    }

    #[test]
    fn neighbour_day_walks_headers() {
        let layout = layout();
        assert_eq!(layout.neighbour_day(5, true), layout.find_day(day(2)));
        assert_eq!(layout.neighbour_day(5, false), layout.find_day(day(0)));
        assert_eq!(layout.neighbour_day(1, false), None);
    }

    #[test]
    fn relocate_follows_rows_across_rebuilds() {
        let before = layout();
        let window = DateWindow::starting_at(day(-7), 21);
        let after = AgendaLayout::from_weeks(window.weeks(), |date| {
            if date == day(1) {
                vec!["a".into(), "b".into()]
            } else {
                Vec::new()
            }
        });
        let row = before.row(5).cloned().unwrap();
        assert_eq!(after.relocate(&row), Some(5 + 15));
        assert_eq!(
            after.row(after.relocate(&row).unwrap()).and_then(RowKind::task_id),
            Some("b")
        );
    }

    #[test]
    fn drop_targets_follow_row_kind() {
        let layout = layout();
        assert_eq!(layout.row(0).unwrap().drop_target(), None);
        assert_eq!(
            layout.row(2).unwrap().drop_target(),
            Some(DropTarget::Day(day(0)))
        );
        assert_eq!(
            layout.row(4).unwrap().drop_target(),
            Some(DropTarget::Row {
                task_id: "a".into(),
                date: day(1),
            })
        );
    }
}
