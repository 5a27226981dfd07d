use keel_core::MigrationState;
use std::io::IsTerminal;

#[derive(Clone, Copy)]
pub enum Color {
    Green,
    Yellow,
    Red,
    Dim,
}

/// ANSI coloring, off when the stream is not a terminal or `NO_COLOR` is set.
#[derive(Clone, Copy)]
pub struct Style {
    use_color_stdout: bool,
    use_color_stderr: bool,
}

impl Style {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();

        Self {
            use_color_stdout: !no_color && std::io::stdout().is_terminal(),
            use_color_stderr: !no_color && std::io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self {
            use_color_stdout: false,
            use_color_stderr: false,
        }
    }

    pub fn ok(&self) -> String {
        self.paint_stdout(Color::Green, "✔")
    }

    pub fn fail(&self) -> String {
        self.paint_stdout(Color::Red, "✘")
    }

    pub fn bullet(&self) -> String {
        "•".to_string()
    }

    pub fn arrow(&self) -> String {
        self.paint_stdout(Color::Yellow, "→")
    }

    pub fn warn_text(&self, text: &str) -> String {
        self.paint_stdout(Color::Yellow, text)
    }

    /// Pads before painting so escape codes do not break column alignment.
    pub fn state(&self, state: MigrationState, width: usize) -> String {
        let color = match state {
            MigrationState::Success | MigrationState::Baseline => Color::Green,
            MigrationState::Pending => Color::Yellow,
            MigrationState::BelowBaseline | MigrationState::Ignored => Color::Dim,
            MigrationState::Failed | MigrationState::Missing | MigrationState::Drift => Color::Red,
        };
        let padded = format!("{:<width$}", state.as_str());
        self.paint_stdout(color, &padded)
    }

    pub fn paint_stdout(&self, color: Color, text: &str) -> String {
        if !self.use_color_stdout {
            return text.to_string();
        }
        paint(color, text)
    }

    pub fn paint_stderr(&self, color: Color, text: &str) -> String {
        if !self.use_color_stderr {
            return text.to_string();
        }
        paint(color, text)
    }
}

fn paint(color: Color, text: &str) -> String {
    let code = match color {
        Color::Green => "32",
        Color::Yellow => "33",
        Color::Red => "31",
        Color::Dim => "2",
    };

    format!("\u{1b}[{code}m{text}\u{1b}[0m")
}
