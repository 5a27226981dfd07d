use crate::style::Style;
use keel_core::MigrationInfo;

const LABEL_WIDTH: usize = 32;
const KEY_WIDTH: usize = 18;

pub struct Ui {
    style: Style,
    width: usize,
}

impl Ui {
    pub fn new(style: Style) -> Self {
        Self { style, width: 48 }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn rule(&self) -> String {
        "-".repeat(self.width)
    }

    pub fn header(&self, title: &str) -> Vec<String> {
        vec![self.rule(), format!("Keel {title}"), self.rule()]
    }

    pub fn footer(&self) -> String {
        self.rule()
    }

    pub fn kv(&self, key: &str, value: &str) -> String {
        format!("{key:<KEY_WIDTH$}: {value}")
    }

    pub fn ok_line(&self, message: &str) -> String {
        format!("{} {}", self.style.ok(), message)
    }

    pub fn fail_line(&self, message: &str) -> String {
        format!("{} {}", self.style.fail(), message)
    }

    pub fn info_line(&self, message: &str) -> String {
        format!("{} {}", self.style.arrow(), message)
    }

    /// `  • label.......... status suffix`
    pub fn list_item(&self, label: &str, status: &str, suffix: Option<&str>) -> String {
        let dots = ".".repeat(LABEL_WIDTH.saturating_sub(label.chars().count()));

        match suffix {
            Some(suffix) if !suffix.is_empty() => {
                format!("  {} {label}{dots} {status} {suffix}", self.style.bullet())
            }
            _ => format!("  {} {label}{dots} {status}", self.style.bullet()),
        }
    }

    pub fn info_table(&self, rows: &[MigrationInfo]) -> Vec<String> {
        let version_width = rows
            .iter()
            .map(|r| r.version.as_str().len())
            .chain([7])
            .max()
            .unwrap_or(7);
        let description_width = rows
            .iter()
            .map(|r| r.description.chars().count())
            .chain([11])
            .max()
            .unwrap_or(11)
            .min(40);
        let state_width = 14;

        let mut lines = vec![format!(
            "{:<version_width$}  {:<description_width$}  {:<state_width$}  Installed on",
            "Version", "Description", "State"
        )];

        for row in rows {
            let description: String = row.description.chars().take(description_width).collect();
            let installed_on = row
                .installed_on
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();

            lines.push(format!(
                "{:<version_width$}  {:<description_width$}  {}  {installed_on}",
                row.version.as_str(),
                description,
                self.style.state(row.state, state_width),
            ));
        }

        lines
    }
}
