use crate::calendar::month_bounds;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Longest span, in days, that a single event is expanded over.
pub const MAX_EXPANSION_DAYS: usize = 3650;
pub const UPCOMING_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    MarketHoliday,
    Exhibition,
    Hackathon,
    Milestone,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::MarketHoliday,
        Layer::Exhibition,
        Layer::Hackathon,
        Layer::Milestone,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Layer::MarketHoliday => "market-holiday",
            Layer::Exhibition => "exhibition",
            Layer::Hackathon => "hackathon",
            Layer::Milestone => "milestone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Layer::MarketHoliday => "Market holiday",
            Layer::Exhibition => "Exhibition",
            Layer::Hackathon => "Hackathon",
            Layer::Milestone => "Milestone",
        }
    }

    /// Key that toggles the layer in the project tab.
    pub fn toggle_key(&self) -> char {
        match self {
            Layer::MarketHoliday => 'm',
            Layer::Exhibition => 'x',
            Layer::Hackathon => 'h',
            Layer::Milestone => 't',
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Layer::ALL
            .into_iter()
            .find(|layer| layer.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Layer::ALL.iter().map(|l| l.id()).collect();
                format!("unknown layer `{}` (expected one of {})", s, known.join(", "))
            })
    }
}

/// Placement policy for an event on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pin {
    /// Shown on every day it covers.
    #[default]
    None,
    /// Shown once, on the first day of whichever month is displayed.
    MonthStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub layer: Layer,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub pin: Pin,
    pub detail: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        layer: Layer,
        title: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Event {
            id: id.into(),
            layer,
            title: title.into(),
            start,
            end,
            pin: Pin::None,
            detail: None,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pin = Pin::MonthStart;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.end >= from && self.start <= to
    }

    /// Number of days covered, inclusive. Zero for reversed ranges.
    pub fn span_days(&self) -> usize {
        let days = (self.end - self.start).num_days() + 1;
        days.max(0) as usize
    }

    /// Days from start to end inclusive, capped at `MAX_EXPANSION_DAYS`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
            .take(MAX_EXPANSION_DAYS)
    }

    pub fn range_label(&self) -> String {
        if self.start == self.end {
            date_key(self.start)
        } else {
            format!("{} ~ {}", date_key(self.start), date_key(self.end))
        }
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Events grouped under the `YYYY-MM-DD` keys they occur on. Each list keeps
/// the order of the input events.
#[derive(Debug, Default)]
pub struct EventIndex<'a> {
    by_day: BTreeMap<String, Vec<&'a Event>>,
}

impl<'a> EventIndex<'a> {
    pub fn get(&self, key: &str) -> &[&'a Event] {
        self.by_day.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn on(&self, date: NaiveDate) -> &[&'a Event] {
        self.get(&date_key(date))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_day.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }

    fn push(&mut self, date: NaiveDate, event: &'a Event) {
        self.by_day.entry(date_key(date)).or_default().push(event);
    }
}

/// Indexes `events` for display in the month containing `month`.
///
/// Month-start pinned events land on the month's first day when their range
/// overlaps the month and are dropped otherwise. Every other event is
/// expanded over each day it covers, inside the month or not.
pub fn index_events<'a, I>(events: I, month: NaiveDate) -> EventIndex<'a>
where
    I: IntoIterator<Item = &'a Event>,
{
    let (month_start, month_end) = month_bounds(month);
    let mut index = EventIndex::default();
    for event in events {
        match event.pin {
            Pin::MonthStart => {
                if event.overlaps(month_start, month_end) {
                    index.push(month_start, event);
                }
            }
            Pin::None => {
                if event.span_days() > MAX_EXPANSION_DAYS {
                    warn!(
                        "event=expansion_capped id={} span_days={} cap={}",
                        event.id,
                        event.span_days(),
                        MAX_EXPANSION_DAYS
                    );
                }
                for day in event.days() {
                    index.push(day, event);
                }
            }
        }
    }
    index
}

/// Events starting after the month containing `month`, soonest first.
pub fn upcoming_events<'a, I>(events: I, month: NaiveDate) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    let (_, month_end) = month_bounds(month);
    let mut upcoming: Vec<&Event> = events
        .into_iter()
        .filter(|event| event.start > month_end)
        .collect();
    upcoming.sort_by_key(|event| event.start);
    upcoming.truncate(UPCOMING_LIMIT);
    upcoming
}

pub fn filter_layers<'a>(events: &'a [Event], enabled: &BTreeSet<Layer>) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| enabled.contains(&event.layer))
        .collect()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Built-in schedule shown in the project tab.
pub fn catalog() -> Vec<Event> {
    vec![
        Event::new(
            "mh-new-year",
            Layer::MarketHoliday,
            "New Year market closure",
            ymd(2026, 1, 1),
            ymd(2026, 1, 2),
        ),
        Event::new(
            "ex-design-archive",
            Layer::Exhibition,
            "Design archive exhibition",
            ymd(2026, 1, 15),
            ymd(2026, 4, 30),
        )
        .pinned()
        .with_detail("Paper textures and scrapbook layouts, gallery 2F"),
        Event::new(
            "mh-seollal",
            Layer::MarketHoliday,
            "Seollal market closure",
            ymd(2026, 2, 16),
            ymd(2026, 2, 18),
        ),
        Event::new(
            "ex-paper-fair",
            Layer::Exhibition,
            "Paper & craft fair",
            ymd(2026, 2, 20),
            ymd(2026, 2, 20),
        )
        .with_detail("Noise patterns and paper grain samples"),
        Event::new(
            "ms-brd",
            Layer::Milestone,
            "BRD sign-off and schedule lock",
            ymd(2026, 2, 27),
            ymd(2026, 2, 27),
        ),
        Event::new(
            "ms-semester",
            Layer::Milestone,
            "Spring semester",
            ymd(2026, 3, 2),
            ymd(2026, 6, 19),
        )
        .pinned(),
        Event::new(
            "mh-independence",
            Layer::MarketHoliday,
            "Independence Movement Day (observed)",
            ymd(2026, 3, 2),
            ymd(2026, 3, 2),
        ),
        Event::new(
            "ms-wireframe",
            Layer::Milestone,
            "Wireframe feedback round",
            ymd(2026, 3, 13),
            ymd(2026, 3, 13),
        ),
        Event::new(
            "hk-spring",
            Layer::Hackathon,
            "Spring campus hackathon",
            ymd(2026, 3, 21),
            ymd(2026, 3, 22),
        )
        .with_detail("48h, teams of four"),
        Event::new(
            "ms-color-test",
            Layer::Milestone,
            "Concept color test",
            ymd(2026, 4, 3),
            ymd(2026, 4, 3),
        ),
        Event::new(
            "mh-childrens-day",
            Layer::MarketHoliday,
            "Children's Day market closure",
            ymd(2026, 5, 5),
            ymd(2026, 5, 5),
        ),
        Event::new(
            "ex-illustration",
            Layer::Exhibition,
            "Illustration fair",
            ymd(2026, 6, 11),
            ymd(2026, 6, 14),
        ),
        Event::new(
            "hk-summer-ai",
            Layer::Hackathon,
            "Summer AI hackathon",
            ymd(2026, 7, 11),
            ymd(2026, 7, 12),
        ),
        Event::new(
            "mh-chuseok",
            Layer::MarketHoliday,
            "Chuseok market closure",
            ymd(2026, 9, 24),
            ymd(2026, 9, 26),
        ),
        Event::new(
            "hk-autumn",
            Layer::Hackathon,
            "Autumn product jam",
            ymd(2026, 11, 7),
            ymd(2026, 11, 8),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn same_day_event_has_one_entry() {
        let events = vec![Event::new(
            "fair",
            Layer::Exhibition,
            "Fair",
            date(2026, 2, 20),
            date(2026, 2, 20),
        )];
        let index = index_events(&events, date(2026, 2, 1));
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["2026-02-20"]);
        assert_eq!(ids(index.get("2026-02-20")), vec!["fair"]);
    }

    #[test]
    fn multi_day_event_expands_each_day_once() {
        let events = vec![Event::new(
            "closure",
            Layer::MarketHoliday,
            "Closure",
            date(2026, 2, 16),
            date(2026, 2, 18),
        )];
        let index = index_events(&events, date(2026, 2, 1));
        assert_eq!(
            index.keys().collect::<Vec<_>>(),
            vec!["2026-02-16", "2026-02-17", "2026-02-18"]
        );
        for key in ["2026-02-16", "2026-02-17", "2026-02-18"] {
            assert_eq!(ids(index.get(key)), vec!["closure"]);
        }
    }

    #[test]
    fn expansion_ignores_month_boundaries() {
        let events = vec![Event::new(
            "span",
            Layer::Hackathon,
            "Span",
            date(2026, 1, 31),
            date(2026, 2, 1),
        )];
        let index = index_events(&events, date(2026, 2, 1));
        assert_eq!(index.len(), 2);
        assert_eq!(ids(index.on(date(2026, 1, 31))), vec!["span"]);
    }

    #[test]
    fn reversed_range_disappears() {
        let events = vec![Event::new(
            "backwards",
            Layer::Milestone,
            "Backwards",
            date(2026, 2, 18),
            date(2026, 2, 16),
        )];
        let index = index_events(&events, date(2026, 2, 1));
        assert!(index.is_empty());
        assert_eq!(events[0].span_days(), 0);
    }

    #[test]
    fn pinned_event_lands_on_first_of_overlapping_month() {
        let events = vec![Event::new(
            "semester",
            Layer::Milestone,
            "Semester",
            date(2026, 3, 2),
            date(2026, 6, 19),
        )
        .pinned()];

        for month in [3, 4, 5, 6] {
            let reference = date(2026, month, 10);
            let index = index_events(&events, reference);
            assert_eq!(index.len(), 1);
            assert_eq!(ids(index.on(date(2026, month, 1))), vec!["semester"]);
        }
    }

    #[test]
    fn pinned_event_outside_month_is_omitted() {
        let events = vec![Event::new(
            "semester",
            Layer::Milestone,
            "Semester",
            date(2026, 3, 2),
            date(2026, 6, 19),
        )
        .pinned()];
        assert!(index_events(&events, date(2026, 2, 1)).is_empty());
        assert!(index_events(&events, date(2026, 7, 1)).is_empty());
    }

    #[test]
    fn pinned_event_touching_month_edges_is_kept() {
        let ends_on_first = vec![Event::new(
            "wrap-up",
            Layer::Exhibition,
            "Wrap-up",
            date(2026, 1, 20),
            date(2026, 2, 1),
        )
        .pinned()];
        let index = index_events(&ends_on_first, date(2026, 2, 10));
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["2026-02-01"]);

        let starts_on_last = vec![Event::new(
            "opening",
            Layer::Exhibition,
            "Opening",
            date(2026, 2, 28),
            date(2026, 3, 15),
        )
        .pinned()];
        let index = index_events(&starts_on_last, date(2026, 2, 10));
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["2026-02-01"]);
    }

    #[test]
    fn entries_keep_input_order() {
        let events = vec![
            Event::new("b", Layer::Milestone, "B", date(2026, 2, 5), date(2026, 2, 5)),
            Event::new("a", Layer::Exhibition, "A", date(2026, 2, 1), date(2026, 2, 5)),
            Event::new("c", Layer::Hackathon, "C", date(2026, 2, 5), date(2026, 2, 6)),
        ];
        let index = index_events(&events, date(2026, 2, 1));
        assert_eq!(ids(index.on(date(2026, 2, 5))), vec!["b", "a", "c"]);
    }

    #[test]
    fn huge_ranges_are_capped() {
        let events = vec![Event::new(
            "forever",
            Layer::Exhibition,
            "Forever",
            date(2000, 1, 1),
            date(2100, 1, 1),
        )];
        let index = index_events(&events, date(2026, 2, 1));
        assert_eq!(index.len(), MAX_EXPANSION_DAYS);
        assert!(index.get("2000-01-01").len() == 1);
    }

    #[test]
    fn upcoming_is_sorted_and_capped() {
        let events = vec![
            Event::new("late", Layer::Hackathon, "Late", date(2026, 9, 1), date(2026, 9, 2)),
            Event::new("now", Layer::Milestone, "Now", date(2026, 2, 3), date(2026, 2, 3)),
            Event::new("soon", Layer::Milestone, "Soon", date(2026, 3, 1), date(2026, 3, 1)),
            Event::new("mid", Layer::Exhibition, "Mid", date(2026, 5, 1), date(2026, 5, 9)),
            Event::new("next", Layer::Exhibition, "Next", date(2026, 4, 1), date(2026, 4, 1)),
            Event::new("later", Layer::Hackathon, "Later", date(2026, 6, 1), date(2026, 6, 1)),
        ];
        let upcoming = upcoming_events(&events, date(2026, 2, 14));
        assert_eq!(ids(&upcoming), vec!["soon", "next", "mid", "later"]);
    }

    #[test]
    fn filter_layers_keeps_enabled_only() {
        let events = catalog();
        let enabled: BTreeSet<Layer> = [Layer::Hackathon].into_iter().collect();
        let filtered = filter_layers(&events, &enabled);
        assert!(!filtered.is_empty());
        assert!(filtered.iter().all(|e| e.layer == Layer::Hackathon));
    }

    #[test]
    fn catalog_ids_are_unique_and_ranges_ordered() {
        let events = catalog();
        let unique: BTreeSet<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(unique.len(), events.len());
        assert!(events.iter().all(|e| e.start <= e.end));
    }

    #[test]
    fn layer_parses_from_id() {
        assert_eq!("exhibition".parse::<Layer>(), Ok(Layer::Exhibition));
        assert_eq!(" Market-Holiday ".parse::<Layer>(), Ok(Layer::MarketHoliday));
        assert!("party".parse::<Layer>().is_err());
    }
}
