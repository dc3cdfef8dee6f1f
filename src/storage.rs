use crate::goals::VisionBoard;
use crate::prefs::UiState;
use anyhow::{Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FILE: &str = "friday_visionboard_v1.yml";
pub const STATE_FILE: &str = "state.yml";
pub const SAVE_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct DataLocation {
    pub root: PathBuf,
}

impl DataLocation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataLocation { root: root.into() }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "friday").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Loads the vision board. A missing or unreadable snapshot yields an empty
/// board; an unparsable one is moved aside first so the next save cannot
/// clobber it.
pub fn load_board(location: &DataLocation) -> VisionBoard {
    let mut board: VisionBoard = read_or_default(&location.snapshot_path());
    let repaired = board.normalize();
    if repaired > 0 {
        info!("event=snapshot_normalized repaired={}", repaired);
    }
    debug!(
        "event=snapshot_loaded goals={} path={}",
        board.goals.len(),
        location.snapshot_path().display()
    );
    board
}

pub fn save_board(location: &DataLocation, board: &VisionBoard) -> Result<()> {
    write_yaml(&location.snapshot_path(), board).context("saving vision board")
}

pub fn load_ui_state(location: &DataLocation) -> UiState {
    read_or_default(&location.state_path())
}

pub fn save_ui_state(location: &DataLocation, state: &UiState) -> Result<()> {
    write_yaml(&location.state_path(), state).context("saving ui state")
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return T::default(),
        Err(err) => {
            warn!("event=storage_read_failed path={} error={}", path.display(), err);
            return T::default();
        }
    };
    if data.trim().is_empty() {
        return T::default();
    }
    match serde_yaml::from_str(&data) {
        Ok(value) => value,
        Err(err) => {
            warn!("event=storage_corrupt path={} error={}", path.display(), err);
            quarantine(path);
            T::default()
        }
    }
}

fn quarantine(path: &Path) {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt-{}", stamp));
    let target = PathBuf::from(target);
    match fs::rename(path, &target) {
        Ok(()) => info!("event=storage_quarantined path={}", target.display()),
        Err(err) => warn!(
            "event=storage_quarantine_failed path={} error={}",
            path.display(),
            err
        ),
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    let serialized = serde_yaml::to_string(value).context("serializing")?;
    let mut tmp =
        NamedTempFile::new_in(dir).with_context(|| format!("creating temp file in {:?}", dir))?;
    tmp.write_all(serialized.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

/// Coalesces bursts of changes into one write once edits go quiet.
#[derive(Debug)]
pub struct SaveDebouncer {
    quiet: Duration,
    pending_since: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(quiet: Duration) -> Self {
        SaveDebouncer {
            quiet,
            pending_since: None,
        }
    }

    /// Records a change; the quiet period restarts.
    pub fn mark(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) => now.saturating_duration_since(since) >= self.quiet,
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending_since = None;
    }
}
