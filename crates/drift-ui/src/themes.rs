use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect the terminal background from `COLORFGBG` (`"fg;bg"`).
///
/// Background values 0–6 are dark, 7–15 light. Anything else is treated as
/// dark.
pub fn detect_background() -> BackgroundType {
    background_from(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from(colorfgbg: Option<&str>) -> BackgroundType {
    colorfgbg
        .and_then(|val| val.split(';').next_back())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| {
            if bg <= 6 {
                BackgroundType::Dark
            } else {
                BackgroundType::Light
            }
        })
        .unwrap_or(BackgroundType::Dark)
}

/// Styles used by the report and the plots.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Text ─────────────────────────────────────────────────────────────────
    pub header: Style,
    pub text: Style,
    pub label: Style,
    pub axis: Style,

    // ── Plot series ──────────────────────────────────────────────────────────
    pub estimated: Style,
    pub realized: Style,
    pub threshold: Style,
    pub alert: Style,
    /// Cycled through for per-column drift series.
    pub palette: Vec<Color>,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            axis: Style::default().fg(Color::Gray),

            estimated: Style::default().fg(Color::Cyan),
            realized: Style::default().fg(Color::Magenta),
            threshold: Style::default().fg(Color::DarkGray),
            alert: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            palette: vec![
                Color::Cyan,
                Color::Magenta,
                Color::Yellow,
                Color::Green,
                Color::LightBlue,
            ],
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Black),
            label: Style::default().fg(Color::DarkGray),
            axis: Style::default().fg(Color::DarkGray),

            estimated: Style::default().fg(Color::Blue),
            realized: Style::default().fg(Color::Magenta),
            threshold: Style::default().fg(Color::Gray),
            alert: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            palette: vec![
                Color::Blue,
                Color::Magenta,
                Color::Red,
                Color::Green,
                Color::DarkGray,
            ],
        }
    }

    /// Choose a theme from the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names (including `auto`) fall back
    /// to [`Self::auto_detect`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "dark" => Self::dark(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Series colour for the `index`-th drift column.
    pub fn series_style(&self, index: usize) -> Style {
        match self.palette.len() {
            0 => self.text,
            n => Style::default().fg(self.palette[index % n]),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
