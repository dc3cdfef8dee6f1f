use chrono::{NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

pub type GoalId = String;

pub const MAX_PROGRESS: u8 = 100;

static DISPLAY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x{AC00}-\x{D7A3}]+[A-Za-z]?$").unwrap());

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: GoalId,
    pub title: String,
    #[serde(default, with = "blank_text")]
    pub content: Option<String>,
    #[serde(default, with = "blank_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "blank_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub completed: bool,
    pub created_at: i64,
    #[serde(default)]
    pub image_data_url: String,
}

/// The persisted vision board: the student's display name plus every goal,
/// newest first.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisionBoard {
    #[serde(default, alias = "studentName")]
    pub display_name: String,
    #[serde(default)]
    pub goals: Vec<GoalRecord>,
}

/// Form contents for creating or editing a goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub content: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: u8,
    pub completed: bool,
    pub image_data_url: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal title is required")]
    TitleRequired,
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid date (use YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("goal not found: {0}")]
    NotFound(String),
}

/// Non-blocking complaint about a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameWarning {
    pub name: String,
}

impl fmt::Display for NameWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name `{}` should be Hangul, optionally ending in one Latin letter",
            self.name
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalFilter {
    #[default]
    All,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalSort {
    #[default]
    Deadline,
    Progress,
}

impl GoalFilter {
    pub const ALL: [GoalFilter; 3] = [GoalFilter::All, GoalFilter::Ongoing, GoalFilter::Completed];

    pub fn id(&self) -> &'static str {
        match self {
            GoalFilter::All => "all",
            GoalFilter::Ongoing => "ongoing",
            GoalFilter::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalFilter::All => "All",
            GoalFilter::Ongoing => "Ongoing",
            GoalFilter::Completed => "Completed",
        }
    }

    pub fn accepts(&self, goal: &GoalRecord) -> bool {
        match self {
            GoalFilter::All => true,
            GoalFilter::Ongoing => !goal.completed,
            GoalFilter::Completed => goal.completed,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            GoalFilter::All => GoalFilter::Ongoing,
            GoalFilter::Ongoing => GoalFilter::Completed,
            GoalFilter::Completed => GoalFilter::All,
        }
    }
}

impl GoalSort {
    pub fn id(&self) -> &'static str {
        match self {
            GoalSort::Deadline => "deadline",
            GoalSort::Progress => "progress",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalSort::Deadline => "Closest deadline",
            GoalSort::Progress => "Highest progress",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            GoalSort::Deadline => GoalSort::Progress,
            GoalSort::Progress => GoalSort::Deadline,
        }
    }
}

impl std::str::FromStr for GoalFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalFilter::ALL
            .into_iter()
            .find(|f| f.id() == s.trim())
            .ok_or_else(|| format!("unknown filter `{}` (all, ongoing, completed)", s))
    }
}

impl std::str::FromStr for GoalSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "deadline" => Ok(GoalSort::Deadline),
            "progress" => Ok(GoalSort::Progress),
            other => Err(format!("unknown sort `{}` (deadline, progress)", other)),
        }
    }
}

/// Returns the goals to display, filtered and ordered. The input is left
/// untouched and ties keep their original relative order.
pub fn view_goals(goals: &[GoalRecord], filter: GoalFilter, sort: GoalSort) -> Vec<&GoalRecord> {
    let mut view: Vec<&GoalRecord> = goals.iter().filter(|goal| filter.accepts(goal)).collect();
    view.sort_by(|a, b| compare_goals(a, b, sort));
    view
}

fn compare_goals(a: &GoalRecord, b: &GoalRecord, sort: GoalSort) -> Ordering {
    let primary = match sort {
        GoalSort::Progress => b.progress.cmp(&a.progress),
        GoalSort::Deadline => Ordering::Equal,
    };
    primary.then_with(|| compare_deadlines(a, b))
}

// Missing end dates sort last; newer goals win ties.
fn compare_deadlines(a: &GoalRecord, b: &GoalRecord) -> Ordering {
    let by_end = match (a.end_date, b.end_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_end.then_with(|| b.created_at.cmp(&a.created_at))
}

/// `None` when the name is empty or acceptable.
pub fn name_warning(name: &str) -> Option<NameWarning> {
    let trimmed = name.trim();
    if trimmed.is_empty() || DISPLAY_NAME_RE.is_match(trimmed) {
        None
    } else {
        Some(NameWarning {
            name: trimmed.to_string(),
        })
    }
}

/// Days-left badge for a goal's end date relative to `today`.
pub fn dday_label(end: Option<NaiveDate>, today: NaiveDate) -> String {
    let end = match end {
        Some(end) => end,
        None => return "No deadline".to_string(),
    };
    let diff = (end - today).num_days();
    match diff.cmp(&0) {
        Ordering::Equal => "D-day".to_string(),
        Ordering::Greater => format!("D-{}", diff),
        Ordering::Less => format!("D+{}", diff.abs()),
    }
}

pub fn parse_date_field(input: &str) -> Result<Option<NaiveDate>, GoalError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| GoalError::InvalidDate(trimmed.to_string()))
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl GoalRecord {
    /// Marks the goal done or not. Completing always fills progress.
    pub fn apply_completed(&mut self, completed: bool) {
        self.completed = completed;
        if completed {
            self.progress = MAX_PROGRESS;
        }
    }

    /// Sets progress, clamped to 0..=100. Anything below 100 reopens the goal.
    pub fn apply_progress(&mut self, progress: u8) {
        self.progress = progress.min(MAX_PROGRESS);
        if self.progress < MAX_PROGRESS {
            self.completed = false;
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_data_url.is_empty()
    }

    fn normalize(&mut self) -> bool {
        let before = (self.progress, self.completed);
        self.progress = self.progress.min(MAX_PROGRESS);
        if self.completed {
            self.progress = MAX_PROGRESS;
        }
        before != (self.progress, self.completed)
    }
}

impl GoalDraft {
    pub fn from_record(goal: &GoalRecord) -> Self {
        GoalDraft {
            title: goal.title.clone(),
            content: goal.content.clone().unwrap_or_default(),
            start_date: goal.start_date,
            end_date: goal.end_date,
            progress: goal.progress,
            completed: goal.completed,
            image_data_url: goal.image_data_url.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), GoalError> {
        if self.title.trim().is_empty() {
            return Err(GoalError::TitleRequired);
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(GoalError::InvalidRange { start, end });
            }
        }
        Ok(())
    }

    fn write_into(&self, goal: &mut GoalRecord) {
        let content = self.content.trim();
        goal.title = self.title.trim().to_string();
        goal.content = if content.is_empty() {
            None
        } else {
            Some(content.to_string())
        };
        goal.start_date = self.start_date;
        goal.end_date = self.end_date;
        goal.image_data_url = self.image_data_url.clone();
        goal.apply_progress(self.progress);
        if self.completed {
            goal.apply_completed(true);
        }
    }
}

impl VisionBoard {
    pub fn get(&self, id: &str) -> Option<&GoalRecord> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut GoalRecord, GoalError> {
        self.goals
            .iter_mut()
            .find(|goal| goal.id == id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))
    }

    /// Validates `draft` and adds it at the front of the list.
    pub fn create(&mut self, draft: &GoalDraft, now_ms: i64) -> Result<&GoalRecord, GoalError> {
        draft.validate()?;
        // createdAt stays strictly increasing even when the clock stalls.
        let newest = self.goals.iter().map(|g| g.created_at).max();
        let created_at = match newest {
            Some(newest) if newest >= now_ms => newest + 1,
            _ => now_ms,
        };
        let mut goal = GoalRecord {
            id: self.fresh_id(),
            title: String::new(),
            content: None,
            start_date: None,
            end_date: None,
            progress: 0,
            completed: false,
            created_at,
            image_data_url: String::new(),
        };
        draft.write_into(&mut goal);
        self.goals.insert(0, goal);
        Ok(&self.goals[0])
    }

    /// Validates `draft` and overwrites the goal's editable fields.
    pub fn update(&mut self, id: &str, draft: &GoalDraft) -> Result<(), GoalError> {
        draft.validate()?;
        let goal = self.get_mut(id)?;
        draft.write_into(goal);
        Ok(())
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<(), GoalError> {
        self.get_mut(id)?.apply_completed(completed);
        Ok(())
    }

    pub fn set_progress(&mut self, id: &str, progress: u8) -> Result<(), GoalError> {
        self.get_mut(id)?.apply_progress(progress);
        Ok(())
    }

    /// Moves progress by `delta` points, saturating at 0 and 100.
    pub fn nudge_progress(&mut self, id: &str, delta: i16) -> Result<u8, GoalError> {
        let goal = self.get_mut(id)?;
        let next = (goal.progress as i16 + delta).clamp(0, MAX_PROGRESS as i16) as u8;
        goal.apply_progress(next);
        if next == MAX_PROGRESS && delta > 0 {
            goal.apply_completed(true);
        }
        Ok(goal.progress)
    }

    pub fn remove(&mut self, id: &str) -> Result<GoalRecord, GoalError> {
        let idx = self
            .goals
            .iter()
            .position(|goal| goal.id == id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        Ok(self.goals.remove(idx))
    }

    /// Stores the trimmed name. Invalid names are kept but reported.
    pub fn set_display_name(&mut self, raw: &str) -> Option<NameWarning> {
        self.display_name = raw.trim().to_string();
        name_warning(&self.display_name)
    }

    /// Repairs records loaded from disk so completed goals read 100%.
    /// Returns how many records changed.
    pub fn normalize(&mut self) -> usize {
        self.goals
            .iter_mut()
            .map(GoalRecord::normalize)
            .filter(|changed| *changed)
            .count()
    }

    fn fresh_id(&self) -> GoalId {
        loop {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect();
            let id = format!("goal-{}", suffix.to_lowercase());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

// Older snapshots store missing text and dates as empty strings.
mod blank_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|text| !text.trim().is_empty()))
    }
}

mod blank_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Some)
                .map_err(|err| D::Error::custom(format!("bad date `{}`: {}", text, err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(id: &str, end: Option<NaiveDate>, created_at: i64) -> GoalRecord {
        GoalRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: None,
            start_date: None,
            end_date: end,
            progress: 0,
            completed: false,
            created_at,
            image_data_url: String::new(),
        }
    }

    fn ids(view: &[&GoalRecord]) -> Vec<String> {
        view.iter().map(|g| g.id.clone()).collect()
    }

    fn draft(title: &str) -> GoalDraft {
        GoalDraft {
            title: title.to_string(),
            ..GoalDraft::default()
        }
    }

    #[test]
    fn ongoing_filter_drops_completed_goals() {
        let mut done = goal("done", None, 1);
        done.completed = true;
        let goals = vec![done, goal("open", None, 2)];
        let view = view_goals(&goals, GoalFilter::Ongoing, GoalSort::Deadline);
        assert_eq!(ids(&view), vec!["open"]);

        let view = view_goals(&goals, GoalFilter::Completed, GoalSort::Deadline);
        assert_eq!(ids(&view), vec!["done"]);
    }

    #[test]
    fn deadline_sort_puts_missing_end_last() {
        let goals = vec![
            goal("march", Some(date(2026, 3, 1)), 1),
            goal("none", None, 2),
            goal("feb", Some(date(2026, 2, 1)), 3),
        ];
        let view = view_goals(&goals, GoalFilter::All, GoalSort::Deadline);
        assert_eq!(ids(&view), vec!["feb", "march", "none"]);
        assert_eq!(goals[0].id, "march", "input order is untouched");
    }

    #[test]
    fn deadline_ties_prefer_newest() {
        let goals = vec![
            goal("old", Some(date(2026, 3, 1)), 1),
            goal("new", Some(date(2026, 3, 1)), 5),
            goal("open-old", None, 2),
            goal("open-new", None, 9),
        ];
        let view = view_goals(&goals, GoalFilter::All, GoalSort::Deadline);
        assert_eq!(ids(&view), vec!["new", "old", "open-new", "open-old"]);
    }

    #[test]
    fn progress_sort_falls_back_to_deadline() {
        let mut a = goal("a", None, 1);
        a.progress = 40;
        let mut b = goal("b", Some(date(2026, 5, 1)), 2);
        b.progress = 80;
        let mut c = goal("c", Some(date(2026, 4, 1)), 3);
        c.progress = 40;
        let goals = vec![a, b, c];
        let view = view_goals(&goals, GoalFilter::All, GoalSort::Progress);
        assert_eq!(ids(&view), vec!["b", "c", "a"]);
    }

    #[test]
    fn empty_input_yields_empty_view() {
        assert!(view_goals(&[], GoalFilter::All, GoalSort::Progress).is_empty());
    }

    #[test]
    fn blank_title_is_rejected_without_mutation() {
        let mut board = VisionBoard::default();
        let err = board.create(&draft("   "), 10).unwrap_err();
        assert_eq!(err, GoalError::TitleRequired);
        assert!(board.goals.is_empty());
    }

    #[test]
    fn inverted_range_is_rejected_on_create_and_update() {
        let mut board = VisionBoard::default();
        let id = board.create(&draft("Read more"), 10).unwrap().id.clone();
        let bad = GoalDraft {
            start_date: Some(date(2026, 3, 10)),
            end_date: Some(date(2026, 3, 1)),
            ..draft("Read more")
        };
        assert!(matches!(
            board.create(&bad, 11),
            Err(GoalError::InvalidRange { .. })
        ));
        assert!(matches!(
            board.update(&id, &bad),
            Err(GoalError::InvalidRange { .. })
        ));
        assert_eq!(board.goals.len(), 1);
        assert_eq!(board.goals[0].start_date, None);
    }

    #[test]
    fn create_trims_and_prepends() {
        let mut board = VisionBoard::default();
        board.create(&draft("first"), 100).unwrap();
        let second = GoalDraft {
            content: "  ".into(),
            ..draft("  second  ")
        };
        board.create(&second, 100).unwrap();
        assert_eq!(board.goals[0].title, "second");
        assert_eq!(board.goals[0].content, None);
        assert!(board.goals[0].created_at > board.goals[1].created_at);
        assert_ne!(board.goals[0].id, board.goals[1].id);
    }

    #[test]
    fn completing_forces_full_progress() {
        let mut board = VisionBoard::default();
        let done_draft = GoalDraft {
            progress: 30,
            completed: true,
            ..draft("ship it")
        };
        let id = board.create(&done_draft, 1).unwrap().id.clone();
        assert_eq!(board.get(&id).map(|g| g.progress), Some(100));

        board.set_completed(&id, false).unwrap();
        let goal = board.get(&id).unwrap();
        assert!(!goal.completed);
        assert_eq!(goal.progress, 100);

        board.set_completed(&id, true).unwrap();
        board.set_progress(&id, 70).unwrap();
        let goal = board.get(&id).unwrap();
        assert!(!goal.completed);
        assert_eq!(goal.progress, 70);
    }

    #[test]
    fn nudge_saturates_and_completes_at_full() {
        let mut board = VisionBoard::default();
        let id = board.create(&draft("run"), 1).unwrap().id.clone();
        assert_eq!(board.nudge_progress(&id, -10).unwrap(), 0);
        board.set_progress(&id, 95).unwrap();
        assert_eq!(board.nudge_progress(&id, 10).unwrap(), 100);
        assert!(board.get(&id).unwrap().completed);
        assert_eq!(board.nudge_progress(&id, -10).unwrap(), 90);
        assert!(!board.get(&id).unwrap().completed);
    }

    #[test]
    fn remove_unknown_goal_is_an_error() {
        let mut board = VisionBoard::default();
        assert_eq!(
            board.remove("goal-nope"),
            Err(GoalError::NotFound("goal-nope".into()))
        );
    }

    #[test]
    fn normalize_repairs_completed_goals() {
        let mut stale = goal("stale", None, 1);
        stale.completed = true;
        stale.progress = 40;
        let mut board = VisionBoard {
            display_name: String::new(),
            goals: vec![stale, goal("fine", None, 2)],
        };
        assert_eq!(board.normalize(), 1);
        assert_eq!(board.goals[0].progress, 100);
    }

    #[test]
    fn display_name_rule() {
        assert_eq!(name_warning(""), None);
        assert_eq!(name_warning("김땡땡"), None);
        assert_eq!(name_warning("김땡땡A"), None);
        assert!(name_warning("김땡땡AB").is_some());
        assert!(name_warning("Kim").is_some());
        assert!(name_warning("A김").is_some());

        let mut board = VisionBoard::default();
        assert!(board.set_display_name("  Kim ").is_some());
        assert_eq!(board.display_name, "Kim");
    }

    #[test]
    fn dday_labels() {
        let today = date(2026, 2, 10);
        assert_eq!(dday_label(None, today), "No deadline");
        assert_eq!(dday_label(Some(today), today), "D-day");
        assert_eq!(dday_label(Some(date(2026, 2, 13)), today), "D-3");
        assert_eq!(dday_label(Some(date(2026, 2, 8)), today), "D+2");
    }

    #[test]
    fn snapshot_accepts_legacy_blank_fields() {
        let yaml = r#"
studentName: 김땡땡A
goals:
  - id: goal-1
    title: Read ten books
    content: ""
    startDate: ""
    endDate: "2026-12-31"
    progress: 20
    completed: false
    createdAt: 1767225600000
    imageDataUrl: ""
"#;
        let board: VisionBoard = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(board.display_name, "김땡땡A");
        let goal = &board.goals[0];
        assert_eq!(goal.content, None);
        assert_eq!(goal.start_date, None);
        assert_eq!(goal.end_date, Some(date(2026, 12, 31)));
        assert!(!goal.has_image());
    }

    #[test]
    fn parse_date_field_handles_blank_and_garbage() {
        assert_eq!(parse_date_field(""), Ok(None));
        assert_eq!(parse_date_field("2026-02-01"), Ok(Some(date(2026, 2, 1))));
        assert_eq!(
            parse_date_field("02/01"),
            Err(GoalError::InvalidDate("02/01".into()))
        );
    }
}
