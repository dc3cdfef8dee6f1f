use crate::calendar::{
    first_of_month, month_grid, pad_trailing, shift_month, DayCell, WEEKDAY_HEADINGS,
};
use crate::events::{
    catalog, date_key, filter_layers, index_events, upcoming_events, Event, Layer, Pin,
};
use crate::goals::{
    dday_label, name_warning, now_millis, parse_date_field, view_goals, GoalDraft, GoalError,
    GoalFilter, GoalRecord, VisionBoard, MAX_PROGRESS,
};
use crate::prefs::{UiState, MEMO_FOCUS_KEY};
use crate::storage::{save_board, save_ui_state, DataLocation, SaveDebouncer, SAVE_QUIET_PERIOD};
use crate::taps::{TapBody, TapKind};
use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{error, info};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const PROGRESS_STEP: i16 = 10;
const PAPER: Color = Color::Rgb(28, 26, 22);
const INK: Color = Color::Rgb(236, 228, 210);
const HIGHLIGHT: Color = Color::Rgb(255, 235, 178);

pub fn run(board: VisionBoard, state: UiState, location: DataLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(board, state, location);
    let result = app.event_loop(&mut terminal);
    let flushed = app.flush();
    teardown_terminal(&mut terminal)?;
    result.and(flushed)
}

struct App {
    board: VisionBoard,
    ui: UiState,
    location: DataLocation,
    events: Vec<Event>,
    saves: SaveDebouncer,
    last_save: Instant,
    status: String,
    mode: Mode,
    calendar: CalendarState,
    vision: VisionState,
}

enum Mode {
    Normal,
    Creating(GoalForm),
    Editing { goal_id: String, form: GoalForm },
    ConfirmDelete { goal_id: String },
    EditingName(FieldValue),
    EditingFocus(FieldValue),
}

struct CalendarState {
    month: NaiveDate,
    cursor: NaiveDate,
}

struct VisionState {
    selected: usize,
    offset: usize,
}

impl CalendarState {
    fn new(today: NaiveDate) -> Self {
        CalendarState {
            month: first_of_month(today),
            cursor: today,
        }
    }

    fn move_cursor(&mut self, days: i64) {
        if let Some(next) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = next;
            self.month = first_of_month(next);
        }
    }

    fn shift_month(&mut self, delta: i32) {
        self.month = shift_month(self.month, delta);
        self.cursor = self.month;
    }
}

struct GoalForm {
    title: FieldValue,
    content: FieldValue,
    start: FieldValue,
    end: FieldValue,
    image: FieldValue,
    progress: u8,
    completed: bool,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Title,
    Content,
    Start,
    End,
    Progress,
    Completed,
    Image,
}

enum FormAction {
    Create,
    Edit(String),
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    /// Shared single-line editing keys. Returns false for keys it ignores.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c)
            }
            _ => return false,
        }
        true
    }
}

impl App {
    fn new(board: VisionBoard, ui: UiState, location: DataLocation) -> Self {
        let status = format!("Loaded notebook from {}", location.root.display());
        App {
            board,
            ui,
            location,
            events: catalog(),
            saves: SaveDebouncer::new(SAVE_QUIET_PERIOD),
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
            calendar: CalendarState::new(Local::now().date_naive()),
            vision: VisionState {
                selected: 0,
                offset: 0,
            },
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
            if self.saves.due(Instant::now()) {
                if let Err(err) = self.flush() {
                    self.status = format!("{:#}; will retry", err);
                }
            }
        }
        Ok(())
    }

    fn active(&self) -> TapKind {
        self.ui.taps.active()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => Ok(self.handle_normal_key(key)),
            Mode::Creating(_) | Mode::Editing { .. } => {
                self.handle_form_key(key);
                Ok(false)
            }
            Mode::ConfirmDelete { .. } => {
                self.handle_confirm_key(key);
                Ok(false)
            }
            Mode::EditingName(_) | Mode::EditingFocus(_) => {
                self.handle_line_edit_key(key);
                Ok(false)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.set_tab(TapKind::ALL[idx]);
                return false;
            }
            KeyCode::Tab => {
                self.set_tab(self.active().next());
                return false;
            }
            KeyCode::BackTab => {
                self.set_tab(self.active().prev());
                return false;
            }
            _ => {}
        }
        match self.active() {
            TapKind::Project => self.handle_calendar_key(key),
            TapKind::VisionBoard => self.handle_vision_key(key),
            TapKind::Settings => self.handle_settings_key(key),
            TapKind::Memo | TapKind::Ideas | TapKind::Reading | TapKind::Inspire => {}
        }
        false
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.calendar.move_cursor(-1),
            KeyCode::Right => self.calendar.move_cursor(1),
            KeyCode::Up => self.calendar.move_cursor(-7),
            KeyCode::Down => self.calendar.move_cursor(7),
            KeyCode::Char('[') => self.calendar.shift_month(-1),
            KeyCode::Char(']') => self.calendar.shift_month(1),
            KeyCode::Char('g') => {
                self.calendar = CalendarState::new(Local::now().date_naive());
                self.status = "Back to today".into();
            }
            KeyCode::Char(c) => {
                if let Some(layer) = Layer::ALL.into_iter().find(|l| l.toggle_key() == c) {
                    let shown = self.ui.toggle_layer(layer);
                    self.status = format!(
                        "{} layer {}",
                        layer.label(),
                        if shown { "shown" } else { "hidden" }
                    );
                    self.mark_dirty();
                }
            }
            _ => {}
        }
    }

    fn handle_vision_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.vision.selected = self.vision.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.vision.selected + 1 < self.visible_goals().len() {
                    self.vision.selected += 1;
                }
            }
            KeyCode::Char('n') => {
                self.mode = Mode::Creating(GoalForm::new());
                self.status = "New goal (Tab/Shift-Tab move, Ctrl+Enter save, Esc cancel)".into();
            }
            KeyCode::Char('e') => match self.selected_goal() {
                Some(goal) => {
                    let goal_id = goal.id.clone();
                    let form = GoalForm::from_goal(goal);
                    self.status = format!("Editing {}", goal_id);
                    self.mode = Mode::Editing { goal_id, form };
                }
                None => self.status = "No goal selected to edit".into(),
            },
            KeyCode::Char('d') => match self.selected_goal() {
                Some(goal) => {
                    let goal_id = goal.id.clone();
                    self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", goal_id);
                    self.mode = Mode::ConfirmDelete { goal_id };
                }
                None => self.status = "No goal selected to delete".into(),
            },
            KeyCode::Char(' ') => {
                let selected = self.selected_goal().map(|g| (g.id.clone(), g.completed));
                if let Some((id, completed)) = selected {
                    self.apply_goal_change(&id, |board| board.set_completed(&id, !completed));
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_selected(PROGRESS_STEP),
            KeyCode::Char('-') => self.nudge_selected(-PROGRESS_STEP),
            KeyCode::Char('f') => {
                self.ui.goal_filter = self.ui.goal_filter.next();
                self.vision.selected = 0;
                self.status = format!("Showing {}", self.ui.goal_filter.label().to_lowercase());
                self.mark_dirty();
            }
            KeyCode::Char('s') => {
                self.ui.goal_sort = self.ui.goal_sort.toggled();
                self.status = format!("Sorted by {}", self.ui.goal_sort.label().to_lowercase());
                self.mark_dirty();
            }
            KeyCode::Char('N') => {
                self.mode = Mode::EditingName(FieldValue::new(&self.board.display_name));
                self.status = "Editing name (Enter save, Esc cancel)".into();
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Char('e') | KeyCode::Enter) {
            let current = self
                .ui
                .taps
                .get(TapKind::Memo, MEMO_FOCUS_KEY)
                .unwrap_or_default();
            self.mode = Mode::EditingFocus(FieldValue::new(current));
            self.status = "Editing memo focus (Enter or Esc to finish)".into();
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close_form = match &mut mode {
            Mode::Creating(form) => self.process_form_key(FormAction::Create, form, key),
            Mode::Editing { goal_id, form } => {
                let id = goal_id.clone();
                self.process_form_key(FormAction::Edit(id), form, key)
            }
            _ => false,
        };
        self.mode = if close_form { Mode::Normal } else { mode };
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let goal_id = match &self.mode {
            Mode::ConfirmDelete { goal_id } => goal_id.clone(),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.board.remove(&goal_id) {
                    Ok(goal) => {
                        info!("event=goal_delete id={}", goal_id);
                        self.status = format!("Deleted \"{}\"", goal.title);
                        self.mark_dirty();
                        self.clamp_selection();
                    }
                    Err(err) => self.status = format!("Delete failed: {}", err),
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_line_edit_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::EditingName(mut field) => match key.code {
                KeyCode::Esc => {
                    self.status = "Canceled".into();
                    Mode::Normal
                }
                KeyCode::Enter => {
                    self.status = match self.board.set_display_name(&field.value) {
                        Some(warning) => format!("Saved with warning: {}", warning),
                        None => "Name saved".into(),
                    };
                    self.mark_dirty();
                    Mode::Normal
                }
                _ => {
                    field.handle_key(key);
                    Mode::EditingName(field)
                }
            },
            Mode::EditingFocus(mut field) => match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.status = "Memo focus saved".into();
                    Mode::Normal
                }
                _ => {
                    if field.handle_key(key) {
                        // Stored on every keystroke, like a live input.
                        self.ui
                            .taps
                            .set(TapKind::Memo, MEMO_FOCUS_KEY, field.value.clone());
                        self.mark_dirty();
                    }
                    Mode::EditingFocus(field)
                }
            },
            other => other,
        };
    }

    fn set_tab(&mut self, tap: TapKind) {
        if self.active() != tap {
            self.ui.taps.set_active(tap);
            self.status = format!("Opened {}", tap.title());
            self.mark_dirty();
        }
    }

    fn process_form_key(&mut self, action: FormAction, form: &mut GoalForm, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Enter => {
                let control = key.modifiers.contains(KeyModifiers::CONTROL);
                if form.field == FormField::Content && !control {
                    form.content.insert_char('\n');
                } else {
                    return self.try_submit(action, form);
                }
            }
            _ => match form.field {
                FormField::Progress => match key.code {
                    KeyCode::Left | KeyCode::Char('-') => form.nudge_progress(-5),
                    KeyCode::Right | KeyCode::Char('+') => form.nudge_progress(5),
                    _ => {}
                },
                FormField::Completed => {
                    if matches!(key.code, KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) {
                        form.set_completed(!form.completed);
                    }
                }
                FormField::Content => match key.code {
                    KeyCode::Up => form.content.move_up(),
                    KeyCode::Down => form.content.move_down(),
                    _ => {
                        form.content.handle_key(key);
                    }
                },
                _ => {
                    if let Some(field) = form.active_text_mut() {
                        field.handle_key(key);
                    }
                }
            },
        }
        false
    }

    fn try_submit(&mut self, action: FormAction, form: &GoalForm) -> bool {
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                return false;
            }
        };
        let result = match &action {
            FormAction::Create => self
                .board
                .create(&draft, now_millis())
                .map(|goal| goal.id.clone()),
            FormAction::Edit(id) => self.board.update(id, &draft).map(|_| id.clone()),
        };
        match result {
            Ok(id) => {
                let verb = match action {
                    FormAction::Create => "Created",
                    FormAction::Edit(_) => "Updated",
                };
                info!("event=goal_{} id={}", verb.to_lowercase(), id);
                self.status = format!("{} {}", verb, id);
                self.mark_dirty();
                if let Some(pos) = self.visible_goals().iter().position(|g| g.id == id) {
                    self.vision.selected = pos;
                }
                true
            }
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                false
            }
        }
    }

    fn apply_goal_change<F>(&mut self, id: &str, change: F)
    where
        F: FnOnce(&mut VisionBoard) -> Result<(), GoalError>,
    {
        match change(&mut self.board) {
            Ok(()) => {
                if let Some(goal) = self.board.get(id) {
                    self.status = format!(
                        "{}: {}% {}",
                        goal.title,
                        goal.progress,
                        if goal.completed { "(done)" } else { "" }
                    )
                    .trim_end()
                    .to_string();
                }
                self.mark_dirty();
                self.clamp_selection();
            }
            Err(err) => self.status = format!("Update failed: {}", err),
        }
    }

    fn nudge_selected(&mut self, delta: i16) {
        if let Some(id) = self.selected_goal().map(|g| g.id.clone()) {
            self.apply_goal_change(&id, |board| board.nudge_progress(&id, delta).map(|_| ()));
        }
    }

    fn visible_goals(&self) -> Vec<&GoalRecord> {
        view_goals(&self.board.goals, self.ui.goal_filter, self.ui.goal_sort)
    }

    fn selected_goal(&self) -> Option<&GoalRecord> {
        self.visible_goals().get(self.vision.selected).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_goals().len();
        self.vision.selected = self.vision.selected.min(len.saturating_sub(1));
    }

    fn mark_dirty(&mut self) {
        self.saves.mark(Instant::now());
    }

    fn flush(&mut self) -> Result<()> {
        if !self.saves.is_dirty() {
            return Ok(());
        }
        let saved = save_board(&self.location, &self.board)
            .and_then(|_| save_ui_state(&self.location, &self.ui));
        match saved {
            Ok(()) => {
                self.saves.clear();
                self.last_save = Instant::now();
                Ok(())
            }
            Err(err) => {
                error!("event=save_failed error={:#}", err);
                // Stays dirty; the next retry waits out another quiet period.
                self.saves.mark(Instant::now());
                Err(anyhow!("saving notebook: {:#}", err))
            }
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_tap(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Goal", form),
            Mode::Editing { form, .. } => self.draw_form(f, "Edit Goal", form),
            Mode::ConfirmDelete { goal_id } => self.draw_confirm(f, goal_id),
            Mode::EditingName(field) => self.draw_name_dialog(f, field),
            Mode::EditingFocus(field) => self.draw_focus_dialog(f, field),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(12), Constraint::Min(20)])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            "FRIDAY",
            Style::default().fg(INK).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(title, sections[0]);

        let labels: Vec<Line> = TapKind::ALL
            .iter()
            .enumerate()
            .map(|(idx, tap)| Line::from(format!("{} {}", idx + 1, tap.label())))
            .collect();
        let tabs = Tabs::new(labels)
            .select(self.active().index())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )
            .divider(Span::styled("│", Style::default().fg(Color::DarkGray)))
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(tabs, sections[1]);
    }

    fn draw_tap(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let tap = self.active();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(PAPER))
            .title(Span::styled(
                format!(" TAP MODULE · {} ", tap.title()),
                Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(3)])
            .split(inner);
        let description = Paragraph::new(Line::from(Span::styled(
            tap.description(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )))
        .wrap(Wrap { trim: true });
        f.render_widget(description, rows[0]);

        let body = rows[1];
        match tap.body() {
            TapBody::Text(text) => self.draw_memo(f, body, text),
            TapBody::List(items) => {
                let items: Vec<ListItem> = items
                    .iter()
                    .map(|item| {
                        ListItem::new(format!("• {}", item)).style(Style::default().fg(INK))
                    })
                    .collect();
                f.render_widget(List::new(items), body);
            }
            TapBody::Chips(chips) => {
                let mut spans = Vec::new();
                for chip in chips {
                    spans.push(Span::styled(
                        format!(" {} ", chip),
                        Style::default().fg(Color::Black).bg(HIGHLIGHT),
                    ));
                    spans.push(Span::raw("  "));
                }
                f.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), body);
            }
            TapBody::Swatches(colors) => {
                let constraints = vec![Constraint::Ratio(1, colors.len() as u32); colors.len()];
                let cells = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(constraints)
                    .split(body);
                for (cell, (r, g, b)) in cells.iter().zip(colors.iter()) {
                    let swatch = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray))
                        .style(Style::default().bg(Color::Rgb(*r, *g, *b)))
                        .title(Span::styled(
                            format!("#{:02x}{:02x}{:02x}", r, g, b),
                            Style::default().fg(Color::Black),
                        ));
                    f.render_widget(swatch, *cell);
                }
            }
            TapBody::Calendar => self.draw_calendar(f, body),
            TapBody::VisionBoard => self.draw_vision(f, body),
            TapBody::Settings => self.draw_settings(f, body),
        }
    }

    fn draw_memo(&self, f: &mut ratatui::Frame<'_>, area: Rect, text: &str) {
        let mut lines = vec![Line::from(Span::styled(text.to_string(), Style::default().fg(INK)))];
        if let Some(focus) = self.ui.taps.get(TapKind::Memo, MEMO_FOCUS_KEY) {
            if !focus.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("Focus: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        focus.to_string(),
                        Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
                    ),
                ]));
            }
        }
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let enabled = self.ui.enabled_layers();
        let visible = filter_layers(&self.events, &enabled);
        let index = index_events(visible.iter().copied(), self.calendar.month);
        let upcoming = upcoming_events(visible.iter().copied(), self.calendar.month);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(area);

        let month = self.calendar.month;
        let mut lines = vec![Line::from(Span::styled(
            month.format("%B %Y").to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::from(
            WEEKDAY_HEADINGS
                .iter()
                .map(|h| Span::styled(format!("{:^7}", h), Style::default().fg(Color::Gray)))
                .collect::<Vec<_>>(),
        ));
        let cells = pad_trailing(month_grid(month));
        for week in cells.chunks(7) {
            let spans = week
                .iter()
                .map(|cell| match cell {
                    DayCell::Blank => Span::raw("       "),
                    DayCell::Day(date) => {
                        let count = index.on(*date).len();
                        let text = if count > 0 {
                            format!("{:>3}•{:<2} ", date.day(), count)
                        } else {
                            format!("{:>3}    ", date.day())
                        };
                        let mut style = Style::default().fg(if count > 0 {
                            Color::LightYellow
                        } else {
                            Color::Gray
                        });
                        if *date == self.calendar.cursor {
                            style = style
                                .bg(HIGHLIGHT)
                                .fg(Color::Black)
                                .add_modifier(Modifier::BOLD);
                        }
                        Span::styled(text, style)
                    }
                })
                .collect::<Vec<_>>();
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(""));
        let mut legend = Vec::new();
        for layer in Layer::ALL {
            let on = enabled.contains(&layer);
            legend.push(Span::styled(
                format!("[{}] {} ", layer.toggle_key(), layer.label()),
                if on {
                    Style::default().fg(layer_color(layer))
                } else {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                },
            ));
        }
        lines.push(Line::from(legend));

        let grid = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(if index.is_empty() {
                    "Calendar · no events"
                } else {
                    "Calendar"
                }),
        );
        f.render_widget(grid, columns[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);

        let cursor = self.calendar.cursor;
        let on_day = index.on(cursor);
        let day_items: Vec<ListItem> = if on_day.is_empty() {
            vec![ListItem::new("No events")]
        } else {
            on_day.iter().map(|event| event_item(event, false)).collect()
        };
        let day_list = List::new(day_items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!("{}", cursor.format("%a %Y-%m-%d"))),
        );
        f.render_widget(day_list, side[0]);

        let upcoming_items: Vec<ListItem> = if upcoming.is_empty() {
            vec![ListItem::new("Nothing scheduled")]
        } else {
            upcoming.iter().map(|event| event_item(event, true)).collect()
        };
        let upcoming_list = List::new(upcoming_items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Upcoming"),
        );
        f.render_widget(upcoming_list, side[1]);
    }

    fn draw_vision(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(5),
            ])
            .split(area);

        let name = if self.board.display_name.is_empty() {
            "(press N to set your name)".to_string()
        } else {
            self.board.display_name.clone()
        };
        let mut header = vec![
            Span::styled("Name: ", Style::default().fg(Color::Gray)),
            Span::styled(name, Style::default().fg(INK).add_modifier(Modifier::BOLD)),
        ];
        if let Some(warning) = name_warning(&self.board.display_name) {
            header.push(Span::raw("  "));
            header.push(Span::styled(warning.to_string(), Style::default().fg(Color::LightRed)));
        }
        header.push(Span::raw("   "));
        for filter in GoalFilter::ALL {
            let style = if filter == self.ui.goal_filter {
                Style::default().fg(Color::Black).bg(HIGHLIGHT)
            } else {
                Style::default().fg(Color::Gray)
            };
            header.push(Span::styled(format!(" {} ", filter.label()), style));
        }
        header.push(Span::styled(
            format!("   sort: {}", self.ui.goal_sort.label()),
            Style::default().fg(Color::LightBlue),
        ));
        f.render_widget(Paragraph::new(Line::from(header)), rows[0]);

        let today = Local::now().date_naive();
        let selected_idx = self.vision.selected;
        let (items, len) = {
            let goals = self.visible_goals();
            let items: Vec<ListItem> = if goals.is_empty() {
                vec![ListItem::new("No goals yet. Press n to add the first one.")]
            } else {
                goals
                    .iter()
                    .map(|goal| goal_item(goal, today, rows[1].width))
                    .collect()
            };
            (items, goals.len())
        };
        let mut state = ListState::default();
        let viewport = rows[1].height.saturating_sub(2) as usize;
        let selected = selected_idx.min(len.saturating_sub(1));
        self.vision.offset = adjust_offset(selected, self.vision.offset, viewport, 1, len);
        *state.offset_mut() = self.vision.offset;
        if len > 0 {
            state.select(Some(selected));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(format!("Goals ({})", len)),
            )
            .highlight_style(
                Style::default()
                    .bg(HIGHLIGHT)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, rows[1], &mut state);

        let detail = match self.selected_goal() {
            Some(goal) => goal_detail(goal),
            None => vec![Line::from("No goal selected")],
        };
        let detail = Paragraph::new(detail).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Selected"),
        );
        f.render_widget(detail, rows[2]);
    }

    fn draw_settings(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focus = self
            .ui
            .taps
            .get(TapKind::Memo, MEMO_FOCUS_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or("(not set yet)");
        let lines = vec![
            Line::from(vec![
                Span::styled("Memo tab focus: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    focus.to_string(),
                    Style::default().fg(INK).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                "e.g. product strategy, brand tone",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Data directory: {}", self.location.root.display()),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(rows[1]);
        let status = Paragraph::new(self.status.clone()).wrap(Wrap { trim: true });
        f.render_widget(status, bottom[0]);
        let saved = if self.saves.is_dirty() {
            "unsaved changes".to_string()
        } else {
            format!("saved {}", format_elapsed(self.last_save))
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                saved,
                Style::default().fg(Color::DarkGray),
            )))
            .alignment(Alignment::Right),
            bottom[1],
        );
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1-7/Tab", Style::default().fg(Color::LightCyan)),
            Span::raw(" tabs  "),
        ];
        match self.active() {
            TapKind::Project => spans.extend([
                Span::styled("←↑↓→", Style::default().fg(Color::LightCyan)),
                Span::raw(" day  "),
                Span::styled("[ ]", Style::default().fg(Color::LightCyan)),
                Span::raw(" month  "),
                Span::styled("g", Style::default().fg(Color::LightCyan)),
                Span::raw(" today  "),
                Span::styled("m x h t", Style::default().fg(Color::LightGreen)),
                Span::raw(" layers  "),
            ]),
            TapKind::VisionBoard => spans.extend([
                Span::styled("↑↓", Style::default().fg(Color::LightCyan)),
                Span::raw(" select  "),
                Span::styled("n", Style::default().fg(Color::LightMagenta)),
                Span::raw(" new  "),
                Span::styled("e", Style::default().fg(Color::LightYellow)),
                Span::raw(" edit  "),
                Span::styled("space", Style::default().fg(Color::LightGreen)),
                Span::raw(" done  "),
                Span::styled("+/-", Style::default().fg(Color::LightGreen)),
                Span::raw(" progress  "),
                Span::styled("f/s", Style::default().fg(Color::LightBlue)),
                Span::raw(" filter/sort  "),
                Span::styled("N", Style::default().fg(Color::LightYellow)),
                Span::raw(" name  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
            ]),
            TapKind::Settings => spans.extend([
                Span::styled("e", Style::default().fg(Color::LightYellow)),
                Span::raw(" edit focus  "),
            ]),
            TapKind::Memo | TapKind::Ideas | TapKind::Reading | TapKind::Inspire => {}
        }
        spans.extend([
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &GoalForm) {
        let area = centered_rect(70, 70, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines("Title", &form.title, form.field == FormField::Title));
        fields.extend(field_lines("Content", &form.content, form.field == FormField::Content));
        fields.extend(field_lines(
            "Start (YYYY-MM-DD)",
            &form.start,
            form.field == FormField::Start,
        ));
        fields.extend(field_lines("End (YYYY-MM-DD)", &form.end, form.field == FormField::End));
        fields.push(toggle_line(
            "Progress",
            format!("{} {}%", progress_bar(form.progress, 20), form.progress),
            form.field == FormField::Progress,
        ));
        fields.push(toggle_line(
            "Completed",
            if form.completed { "[x]" } else { "[ ]" }.to_string(),
            form.field == FormField::Completed,
        ));
        fields.extend(field_lines("Image (data URL)", &form.image, form.field == FormField::Image));
        fields.push(Line::from(""));
        fields.push(Line::from(Span::styled(
            "Ctrl+Enter save • Esc cancel • Tab/Shift-Tab move • ←/→ adjust progress • Space toggles completed",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, goal_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .board
            .get(goal_id)
            .map(|g| g.title.clone())
            .unwrap_or_else(|| goal_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_name_dialog(&self, f: &mut ratatui::Frame<'_>, field: &FieldValue) {
        let area = centered_rect(50, 25, f.size());
        let mut lines = field_lines("Name", field, true);
        lines.push(Line::from(""));
        match name_warning(&field.value) {
            Some(warning) => lines.push(Line::from(Span::styled(
                warning.to_string(),
                Style::default().fg(Color::LightRed),
            ))),
            None => lines.push(Line::from(Span::styled(
                "e.g. 김땡땡A",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        let dialog = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Display Name")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_focus_dialog(&self, f: &mut ratatui::Frame<'_>, field: &FieldValue) {
        let area = centered_rect(50, 20, f.size());
        let dialog = Paragraph::new(field_lines("Memo focus", field, true)).block(
            Block::default()
                .title("Settings")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

impl GoalForm {
    fn new() -> Self {
        GoalForm {
            title: FieldValue::new(""),
            content: FieldValue::new(""),
            start: FieldValue::new(""),
            end: FieldValue::new(""),
            image: FieldValue::new(""),
            progress: 0,
            completed: false,
            field: FormField::Title,
        }
    }

    fn from_goal(goal: &GoalRecord) -> Self {
        let draft = GoalDraft::from_record(goal);
        GoalForm {
            title: FieldValue::new(&draft.title),
            content: FieldValue::new(&draft.content),
            start: FieldValue::new(&draft.start_date.map(date_key).unwrap_or_default()),
            end: FieldValue::new(&draft.end_date.map(date_key).unwrap_or_default()),
            image: FieldValue::new(&draft.image_data_url),
            progress: draft.progress,
            completed: draft.completed,
            field: FormField::Title,
        }
    }

    fn to_draft(&self) -> Result<GoalDraft, GoalError> {
        Ok(GoalDraft {
            title: self.title.value.clone(),
            content: self.content.value.clone(),
            start_date: parse_date_field(&self.start.value)?,
            end_date: parse_date_field(&self.end.value)?,
            progress: self.progress,
            completed: self.completed,
            image_data_url: self.image.value.trim().to_string(),
        })
    }

    fn nudge_progress(&mut self, delta: i16) {
        let next = (self.progress as i16 + delta).clamp(0, MAX_PROGRESS as i16) as u8;
        self.progress = next;
        if next < MAX_PROGRESS {
            self.completed = false;
        }
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        if completed {
            self.progress = MAX_PROGRESS;
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Content,
            FormField::Content => FormField::Start,
            FormField::Start => FormField::End,
            FormField::End => FormField::Progress,
            FormField::Progress => FormField::Completed,
            FormField::Completed => FormField::Image,
            FormField::Image => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Image,
            FormField::Content => FormField::Title,
            FormField::Start => FormField::Content,
            FormField::End => FormField::Start,
            FormField::Progress => FormField::End,
            FormField::Completed => FormField::Progress,
            FormField::Image => FormField::Completed,
        };
    }

    fn active_text_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Content => Some(&mut self.content),
            FormField::Start => Some(&mut self.start),
            FormField::End => Some(&mut self.end),
            FormField::Image => Some(&mut self.image),
            FormField::Progress | FormField::Completed => None,
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn layer_color(layer: Layer) -> Color {
    match layer {
        Layer::MarketHoliday => Color::LightRed,
        Layer::Exhibition => Color::LightMagenta,
        Layer::Hackathon => Color::LightGreen,
        Layer::Milestone => Color::LightCyan,
    }
}

fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (progress.min(MAX_PROGRESS) as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn prev_char(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

fn event_item(event: &Event, show_range: bool) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled("■ ", Style::default().fg(layer_color(event.layer))),
        Span::styled(
            truncate_text(&event.title, 40),
            Style::default().fg(INK).add_modifier(Modifier::BOLD),
        ),
    ];
    if show_range || event.pin == Pin::MonthStart {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            event.range_label(),
            Style::default().fg(Color::LightYellow),
        ));
    }
    let mut lines = vec![Line::from(spans)];
    if let Some(detail) = &event.detail {
        lines.push(Line::from(Span::styled(
            format!("  {}", detail),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        )));
    }
    ListItem::new(lines)
}

fn goal_item(goal: &GoalRecord, today: NaiveDate, width: u16) -> ListItem<'static> {
    let check = if goal.completed { "[x] " } else { "[ ] " };
    let title_width = (width as usize).saturating_sub(48).max(12);
    let mut spans = vec![
        Span::styled(check, Style::default().fg(Color::LightGreen)),
        Span::styled(
            format!("{:<w$}", truncate_text(&goal.title, title_width), w = title_width),
            Style::default().fg(INK).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:<12}", dday_label(goal.end_date, today)),
            Style::default().fg(Color::LightYellow),
        ),
        Span::styled(
            format!("{} {:>3}%", progress_bar(goal.progress, 10), goal.progress),
            Style::default().fg(if goal.completed {
                Color::LightGreen
            } else {
                Color::Gray
            }),
        ),
    ];
    if goal.has_image() {
        spans.push(Span::styled(" ▣", Style::default().fg(Color::LightMagenta)));
    }
    ListItem::new(Line::from(spans))
}

fn goal_detail(goal: &GoalRecord) -> Vec<Line<'static>> {
    let mut head = vec![Span::styled(
        goal.title.clone(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];
    match (goal.start_date, goal.end_date) {
        (Some(start), Some(end)) => head.push(Span::styled(
            format!("  {} ~ {}", date_key(start), date_key(end)),
            Style::default().fg(Color::LightRed),
        )),
        (None, Some(end)) => head.push(Span::styled(
            format!("  until {}", date_key(end)),
            Style::default().fg(Color::LightRed),
        )),
        (Some(start), None) => head.push(Span::styled(
            format!("  from {}", date_key(start)),
            Style::default().fg(Color::LightRed),
        )),
        (None, None) => {}
    }
    head.push(Span::styled(
        format!("  {}", goal.id),
        Style::default().fg(Color::DarkGray),
    ));
    let mut lines = vec![Line::from(head)];
    if let Some(content) = &goal.content {
        lines.push(Line::from(Span::styled(
            content.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    if goal.has_image() {
        lines.push(Line::from(Span::styled(
            format!("image: {}", truncate_text(&goal.image_data_url, 48)),
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::DIM),
        )));
    }
    lines
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn toggle_line(label: &str, value: String, active: bool) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{}: ", label),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::DIM),
        ),
        Span::styled(
            value,
            Style::default().fg(if active { Color::Cyan } else { Color::White }),
        ),
    ])
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
    }

    fn test_app(dir: &TempDir) -> App {
        let mut ui = UiState::default();
        ui.taps.set_active(TapKind::VisionBoard);
        App::new(VisionBoard::default(), ui, DataLocation::new(dir.path()))
    }

    #[test]
    fn form_creates_goal_and_marks_dirty() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        type_text(&mut app, "Run a 10k");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.board.goals.len(), 1);
        assert_eq!(app.board.goals[0].title, "Run a 10k");
        assert!(app.saves.is_dirty());

        app.flush().unwrap();
        assert!(!app.saves.is_dirty());
        assert!(DataLocation::new(dir.path()).snapshot_path().exists());
    }

    #[test]
    fn failed_save_keeps_changes_pending() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "occupied").unwrap();
        let mut ui = UiState::default();
        ui.taps.set_active(TapKind::VisionBoard);
        let mut app = App::new(VisionBoard::default(), ui, DataLocation::new(&blocker));

        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        type_text(&mut app, "Unsaved");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.saves.is_dirty());

        assert!(app.flush().is_err());
        assert!(app.saves.is_dirty());
        // The exit flush must still see the pending goal and fail loudly.
        assert!(app.flush().is_err());
        assert!(app.saves.is_dirty());

        app.location = DataLocation::new(dir.path().join("data"));
        app.flush().unwrap();
        assert!(!app.saves.is_dirty());
        assert!(app.location.snapshot_path().exists());
    }

    #[test]
    fn empty_title_keeps_form_open() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert!(matches!(app.mode, Mode::Creating(_)));
        assert!(app.board.goals.is_empty());
        assert!(app.status.contains(&GoalError::TitleRequired.to_string()));
    }

    #[test]
    fn delete_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.board
            .create(
                &GoalDraft {
                    title: "Keep me".into(),
                    ..GoalDraft::default()
                },
                1,
            )
            .unwrap();

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.board.goals.len(), 1);

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.board.goals.is_empty());
    }

    #[test]
    fn space_and_progress_keys_follow_completion_rule() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.board
            .create(
                &GoalDraft {
                    title: "Read".into(),
                    progress: 40,
                    ..GoalDraft::default()
                },
                1,
            )
            .unwrap();

        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert_eq!(app.board.goals[0].progress, 100);
        assert!(app.board.goals[0].completed);

        app.handle_key(key(KeyCode::Char('-'))).unwrap();
        assert_eq!(app.board.goals[0].progress, 90);
        assert!(!app.board.goals[0].completed);
    }

    #[test]
    fn calendar_cursor_drags_month_along() {
        let mut calendar = CalendarState::new(NaiveDate::from_ymd_opt(2026, 2, 27).unwrap());
        calendar.move_cursor(7);
        assert_eq!(calendar.month, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        calendar.shift_month(-2);
        assert_eq!(calendar.cursor, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn settings_focus_is_stored_while_typing() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Char('7'))).unwrap();
        assert_eq!(app.active(), TapKind::Settings);
        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        type_text(&mut app, "tone");
        assert_eq!(app.ui.taps.get(TapKind::Memo, MEMO_FOCUS_KEY), Some("tone"));
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(50, 10), "█████░░░░░");
        assert_eq!(progress_bar(100, 4), "████");
    }

    #[test]
    fn text_helpers() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a much longer title", 10), "a much ...");
        let text = "ab\ncd";
        assert_eq!(line_state(text, 4), (vec![0, 3], 1, 1));
        assert_eq!(index_at_col(text, 0, 1), 1);
        assert_eq!(index_at_col(text, 3, 5), 5);
    }

    #[test]
    fn adjust_offset_keeps_selection_visible() {
        assert_eq!(adjust_offset(0, 0, 5, 1, 20), 0);
        assert_eq!(adjust_offset(10, 0, 5, 1, 20), 7);
        assert_eq!(adjust_offset(2, 7, 5, 1, 20), 1);
    }
}
