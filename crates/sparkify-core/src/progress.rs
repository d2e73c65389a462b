//! Numbered progress lines.

/// How a progress line is numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    /// `"3 of 8 -- message"`
    Of,
    /// `"3/8: message"`
    Slash,
}

/// Emits numbered progress lines at `info` level.
#[derive(Debug, Clone)]
pub struct Progress {
    step: u32,
    total: u32,
    style: Style,
}

impl Progress {
    /// Start a run of `total` steps rendered as `"<n> of <total> -- <message>"`.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            step: 0,
            total,
            style: Style::Of,
        }
    }

    /// Start a run of `total` steps rendered as `"<n>/<total>: <message>"`.
    #[must_use]
    pub fn slashed(total: u32) -> Self {
        Self {
            style: Style::Slash,
            ..Self::new(total)
        }
    }

    /// Advance to the next step and log it. Returns the rendered line.
    pub fn advance(&mut self, message: impl AsRef<str>) -> String {
        self.step = (self.step + 1).min(self.total);
        let line = match self.style {
            Style::Of => format!("{} of {} -- {}", self.step, self.total, message.as_ref()),
            Style::Slash => format!("{}/{}: {}", self.step, self.total, message.as_ref()),
        };
        tracing::info!(step = self.step, total = self.total, "{line}");
        line
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn step(&self) -> u32 {
        self.step
    }
}
