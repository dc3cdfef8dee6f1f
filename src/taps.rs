use serde::{Deserialize, Serialize};

/// The notebook's tabs ("TAP modules"), in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapKind {
    #[default]
    Memo,
    Project,
    Ideas,
    Reading,
    VisionBoard,
    Inspire,
    Settings,
}

/// What a tab renders in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapBody {
    Text(&'static str),
    List(&'static [&'static str]),
    Chips(&'static [&'static str]),
    Swatches(&'static [(u8, u8, u8)]),
    Calendar,
    VisionBoard,
    Settings,
}

impl TapKind {
    pub const ALL: [TapKind; 7] = [
        TapKind::Memo,
        TapKind::Project,
        TapKind::Ideas,
        TapKind::Reading,
        TapKind::VisionBoard,
        TapKind::Inspire,
        TapKind::Settings,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            TapKind::Memo => "memo",
            TapKind::Project => "project",
            TapKind::Ideas => "ideas",
            TapKind::Reading => "reading",
            TapKind::VisionBoard => "visionboard",
            TapKind::Inspire => "inspire",
            TapKind::Settings => "settings",
        }
    }

    pub fn from_id(id: &str) -> Option<TapKind> {
        let wanted = id.trim().to_ascii_lowercase();
        TapKind::ALL.into_iter().find(|tap| tap.id() == wanted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TapKind::Memo => "Memo",
            TapKind::Project => "Project",
            TapKind::Ideas => "Ideas",
            TapKind::Reading => "Reading",
            TapKind::VisionBoard => "Vision",
            TapKind::Inspire => "Inspire",
            TapKind::Settings => "Settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TapKind::Memo => "Today's memo",
            TapKind::Project => "Projects in flight",
            TapKind::Ideas => "Idea board",
            TapKind::Reading => "Reading list",
            TapKind::VisionBoard => "Vision board",
            TapKind::Inspire => "Inspiration",
            TapKind::Settings => "Settings",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TapKind::Memo => "A place to sketch key ideas. Hop between tabs quickly.",
            TapKind::Project => {
                "Schedule of holidays, exhibitions, hackathons and milestones by month."
            }
            TapKind::Ideas => "A workspace for jotting thoughts down and sorting them.",
            TapKind::Reading => "Articles and references to read. Interests live in the preference store.",
            TapKind::VisionBoard => "Track goals as cards and keep an eye on progress.",
            TapKind::Inspire => "Scraps of color, photos and phrases.",
            TapKind::Settings => "Per-tab preferences, kept in a lightweight state store.",
        }
    }

    pub fn body(&self) -> TapBody {
        match self {
            TapKind::Memo => TapBody::Text(
                "Lines that came up in meetings, quick sketches. Each TAP is an \
                 independent module, so new sections never disturb existing ones.",
            ),
            TapKind::Project => TapBody::Calendar,
            TapKind::Ideas => TapBody::Chips(&[
                "Write it now",
                "Grid notes",
                "Quick sorting",
                "Weekly ideas",
            ]),
            TapKind::Reading => TapBody::List(&[
                "Research on noise patterns and paper texture",
                "Scrapbook-style UI examples",
                "Designing modular content structures",
            ]),
            TapKind::VisionBoard => TapBody::VisionBoard,
            TapKind::Inspire => TapBody::Swatches(&[
                (0xf6, 0xd9, 0xc4),
                (0xd5, 0xe6, 0xf7),
                (0xf7, 0xef, 0xc6),
                (0xdf, 0xe8, 0xd1),
            ]),
            TapKind::Settings => TapBody::Settings,
        }
    }

    pub fn index(&self) -> usize {
        TapKind::ALL
            .iter()
            .position(|tap| tap == self)
            .unwrap_or_default()
    }

    pub fn next(&self) -> TapKind {
        TapKind::ALL[(self.index() + 1) % TapKind::ALL.len()]
    }

    pub fn prev(&self) -> TapKind {
        let len = TapKind::ALL.len();
        TapKind::ALL[(self.index() + len - 1) % len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        for tap in TapKind::ALL {
            assert_eq!(TapKind::from_id(tap.id()), Some(tap));
        }
        assert_eq!(TapKind::from_id("VisionBoard"), Some(TapKind::VisionBoard));
        assert_eq!(TapKind::from_id("calendar"), None);
    }

    #[test]
    fn serde_uses_ids() {
        for tap in TapKind::ALL {
            let yaml = serde_yaml::to_string(&tap).unwrap();
            assert_eq!(yaml.trim(), tap.id());
        }
    }

    #[test]
    fn next_and_prev_wrap() {
        assert_eq!(TapKind::Settings.next(), TapKind::Memo);
        assert_eq!(TapKind::Memo.prev(), TapKind::Settings);
        assert_eq!(TapKind::Project.next().prev(), TapKind::Project);
    }

    #[test]
    fn interactive_tabs_have_dedicated_bodies() {
        assert_eq!(TapKind::Project.body(), TapBody::Calendar);
        assert_eq!(TapKind::VisionBoard.body(), TapBody::VisionBoard);
        assert_eq!(TapKind::Settings.body(), TapBody::Settings);
    }
}
