//! Terminal styling and number formatting.
//!
//! Color is on by default and disabled by `NO_COLOR` or `TERM=dumb`.

/// ANSI escape codes used by the text renderers.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    /// Section headings.
    pub const BOLD: &str = "\x1b[1m";
    /// Secondary text (units, notes).
    pub const GRAY: &str = "\x1b[90m";
    /// Port names.
    pub const CYAN: &str = "\x1b[36m";
    /// Savings (negative deltas).
    pub const GREEN: &str = "\x1b[32m";
    /// Penalties (positive deltas) and fallback warnings.
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Resolved color codes, empty when color is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub bold: &'static str,
    pub gray: &'static str,
    pub cyan: &'static str,
    pub green: &'static str,
    pub red: &'static str,
    pub yellow: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            bold: colors::BOLD,
            gray: colors::GRAY,
            cyan: colors::CYAN,
            green: colors::GREEN,
            red: colors::RED,
            yellow: colors::YELLOW,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            bold: "",
            gray: "",
            cyan: "",
            green: "",
            red: "",
            yellow: "",
        }
    }

    /// `colored()` when the terminal supports ANSI colors, `plain()` otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    /// Color for a delta: green when cabotage saves, red when it costs more.
    pub fn for_delta(&self, delta: f64) -> &'static str {
        if delta < 0.0 {
            self.green
        } else if delta > 0.0 {
            self.red
        } else {
            ""
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Whether ANSI color codes should be emitted.
///
/// Respects `NO_COLOR` (https://no-color.org/) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Whether the locale advertises UTF-8 through `LANG` or `LC_ALL`.
#[must_use]
pub fn supports_unicode() -> bool {
    ["LC_ALL", "LANG"].iter().any(|var| {
        std::env::var(var)
            .map(|v| v.to_uppercase().contains("UTF"))
            .unwrap_or(false)
    })
}

/// Arrow used between route endpoints.
#[must_use]
pub fn arrow() -> &'static str {
    if supports_unicode() {
        "→"
    } else {
        "->"
    }
}

/// Format a value with thousand separators and a fixed number of decimals.
///
/// ```
/// # use cabotage_cli::terminal::format_number;
/// assert_eq!(format_number(999.0, 0), "999");
/// assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
/// assert_eq!(format_number(-4200.5, 1), "-4,200.5");
/// ```
#[must_use]
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
