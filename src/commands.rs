use crate::calendar::{first_of_month, month_grid, pad_trailing, WEEKDAY_HEADINGS};
use crate::cli::{GoalCommand, GoalFields, PrefCommand};
use crate::config::Config;
use crate::events::{
    catalog, date_key, filter_layers, index_events, upcoming_events, Event, EventIndex, Layer, Pin,
};
use crate::goals::{
    dday_label, now_millis, view_goals, GoalDraft, GoalError, GoalRecord, VisionBoard,
};
use crate::storage::{load_board, load_ui_state, save_board, save_ui_state};
use crate::taps::TapKind;
use crate::ui;
use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use std::collections::BTreeSet;

pub fn taps() -> Result<()> {
    for (idx, tap) in TapKind::ALL.iter().enumerate() {
        println!("{} {:<12} {}", idx + 1, tap.id(), tap.title());
        println!("  {}", tap.description());
    }
    Ok(())
}

pub fn calendar(config: &Config, month: Option<NaiveDate>, layers: Vec<Layer>) -> Result<()> {
    let month = first_of_month(month.unwrap_or_else(today));
    let enabled = resolve_layers(config, layers);
    let all = catalog();
    let visible = filter_layers(&all, &enabled);
    let index = index_events(visible.iter().copied(), month);

    for line in render_month(month, &index) {
        println!("{}", line);
    }
    println!();

    debug!("event=calendar_index month={} days={}", month.format("%Y-%m"), index.len());
    let prefix = month.format("%Y-%m-").to_string();
    let mut any = false;
    for key in index.keys().filter(|key| key.starts_with(&prefix)) {
        for event in index.get(key) {
            any = true;
            println!("  {}  {}", key, describe_event(event));
        }
    }
    if !any {
        println!("  (no events this month)");
    }

    println!();
    println!("Upcoming");
    let upcoming = upcoming_events(visible.iter().copied(), month);
    if upcoming.is_empty() {
        println!("  (nothing scheduled)");
    }
    for event in upcoming {
        println!("  {}  {}", event.range_label(), describe_event(event));
    }
    Ok(())
}

pub fn events(config: &Config, date: NaiveDate, layers: Vec<Layer>) -> Result<()> {
    let enabled = resolve_layers(config, layers);
    let all = catalog();
    let visible = filter_layers(&all, &enabled);
    let index = index_events(visible.iter().copied(), date);
    let on_day = index.on(date);
    println!("{}", date.format("%A, %Y-%m-%d"));
    if on_day.is_empty() {
        println!("  (no events)");
    }
    for event in on_day {
        println!("  - {}", describe_event(event));
        if let Some(detail) = &event.detail {
            println!("    {}", detail);
        }
    }
    Ok(())
}

pub fn goal(config: &Config, command: GoalCommand) -> Result<()> {
    let mut board = load_board(&config.data);
    match command {
        GoalCommand::List { filter, sort } => {
            if !board.display_name.is_empty() {
                println!("{}'s vision board", board.display_name);
            }
            println!("{}", board_summary(&board));
            let view = view_goals(&board.goals, filter, sort);
            println!("{} / {} ({} shown)", filter.label(), sort.label(), view.len());
            if view.is_empty() {
                println!("  (no goals yet)");
            }
            let today = today();
            for goal in view {
                print_goal(goal, today);
            }
            return Ok(());
        }
        GoalCommand::Add {
            title,
            fields,
            done,
        } => {
            let mut draft = GoalDraft {
                title,
                ..GoalDraft::default()
            };
            apply_fields(&mut draft, fields);
            draft.completed = done;
            let goal = board.create(&draft, now_millis()).context("adding goal")?;
            let id = goal.id.clone();
            info!("event=goal_create id={}", id);
            println!("Added goal {}", id);
        }
        GoalCommand::Edit {
            id,
            title,
            fields,
            clear_start,
            clear_end,
        } => {
            let existing = board
                .get(&id)
                .ok_or_else(|| GoalError::NotFound(id.clone()))?;
            let mut draft = GoalDraft::from_record(existing);
            if let Some(title) = title {
                draft.title = title;
            }
            if clear_start {
                draft.start_date = None;
            }
            if clear_end {
                draft.end_date = None;
            }
            apply_fields(&mut draft, fields);
            board
                .update(&id, &draft)
                .with_context(|| format!("editing goal {}", id))?;
            info!("event=goal_update id={}", id);
            println!("Updated goal {}", id);
        }
        GoalCommand::Done { id } => {
            board.set_completed(&id, true)?;
            println!("Completed {}", id);
        }
        GoalCommand::Reopen { id } => {
            board.set_completed(&id, false)?;
            println!("Reopened {}", id);
        }
        GoalCommand::Progress { id, value } => {
            board.set_progress(&id, value)?;
            println!("{} is at {}%", id, value);
        }
        GoalCommand::Delete { id, yes } => {
            let title = board
                .get(&id)
                .map(|g| g.title.clone())
                .ok_or_else(|| GoalError::NotFound(id.clone()))?;
            if !yes {
                println!("Not deleting \"{}\" ({}); pass --yes to confirm", title, id);
                return Ok(());
            }
            board.remove(&id)?;
            info!("event=goal_delete id={}", id);
            println!("Deleted {}", id);
        }
    }
    save_board(&config.data, &board)
}

pub fn name(config: &Config, value: Option<String>) -> Result<()> {
    let mut board = load_board(&config.data);
    match value {
        None => {
            if board.display_name.is_empty() {
                println!("(no name set)");
            } else {
                println!("{}", board.display_name);
            }
            Ok(())
        }
        Some(raw) => {
            if let Some(warning) = board.set_display_name(&raw) {
                eprintln!("warning: {}", warning);
            }
            save_board(&config.data, &board)?;
            println!("Name set to {}", board.display_name);
            Ok(())
        }
    }
}

pub fn pref(config: &Config, command: PrefCommand) -> Result<()> {
    let mut state = load_ui_state(&config.data);
    match command {
        PrefCommand::Get { tab, key } => {
            match state.taps.get(tab, &key) {
                Some(value) => println!("{}", value),
                None => println!("(unset)"),
            }
            Ok(())
        }
        PrefCommand::Set { tab, key, value } => {
            state.taps.set(tab, key.clone(), value);
            save_ui_state(&config.data, &state)?;
            println!("Saved {}.{}", tab.id(), key);
            Ok(())
        }
    }
}

pub fn tui(config: &Config) -> Result<()> {
    let board = load_board(&config.data);
    let state = load_ui_state(&config.data);
    ui::run(board, state, config.data.clone())
}

fn resolve_layers(config: &Config, requested: Vec<Layer>) -> BTreeSet<Layer> {
    if requested.is_empty() {
        load_ui_state(&config.data).enabled_layers()
    } else {
        requested.into_iter().collect()
    }
}

fn apply_fields(draft: &mut GoalDraft, fields: GoalFields) {
    if let Some(content) = fields.content {
        draft.content = content;
    }
    if let Some(start) = fields.start {
        draft.start_date = Some(start);
    }
    if let Some(end) = fields.end {
        draft.end_date = Some(end);
    }
    if let Some(progress) = fields.progress {
        draft.progress = progress;
        if progress < 100 {
            draft.completed = false;
        }
    }
    if let Some(image) = fields.image {
        draft.image_data_url = image;
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn describe_event(event: &Event) -> String {
    let pin = match event.pin {
        Pin::MonthStart => " (all month)",
        Pin::None => "",
    };
    format!("[{}] {}{}", event.layer.label(), event.title, pin)
}

/// Text rendering of a month: title, weekday headings, then one row per
/// week. Days with events show their count.
fn render_month(month: NaiveDate, index: &EventIndex<'_>) -> Vec<String> {
    let mut lines = vec![format!("{:^42}", month.format("%B %Y").to_string())];
    lines.push(
        WEEKDAY_HEADINGS
            .iter()
            .map(|h| format!("{:^6}", h))
            .collect::<Vec<_>>()
            .join("")
            .trim_end()
            .to_string(),
    );
    let cells = pad_trailing(month_grid(month));
    for week in cells.chunks(7) {
        let row = week
            .iter()
            .map(|cell| match cell.date() {
                None => "      ".to_string(),
                Some(date) => {
                    let count = index.on(date).len();
                    if count > 0 {
                        format!("{:>2}({}) ", date.day(), count.min(9))
                    } else {
                        format!("{:>2}    ", date.day())
                    }
                }
            })
            .collect::<String>();
        lines.push(row.trim_end().to_string());
    }
    lines
}

fn print_goal(goal: &GoalRecord, today: NaiveDate) {
    let mark = if goal.completed { "x" } else { " " };
    println!(
        "  [{}] {}: {}  {}%  {}",
        mark,
        goal.id,
        goal.title,
        goal.progress,
        dday_label(goal.end_date, today)
    );
    if let (Some(start), Some(end)) = (goal.start_date, goal.end_date) {
        println!("      {} ~ {}", date_key(start), date_key(end));
    }
    if let Some(content) = &goal.content {
        println!("      {}", content);
    }
    if goal.has_image() {
        println!("      (image attached)");
    }
}

fn board_summary(board: &VisionBoard) -> String {
    let done = board.goals.iter().filter(|g| g.completed).count();
    format!("{} goals, {} completed", board.goals.len(), done)
}
