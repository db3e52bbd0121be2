//! Notification message rendering

use crate::diff::RowDiff;
use crate::error::CoreError;
use std::str::FromStr;

/// Language used for the fixed parts of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// Vietnamese
    #[default]
    Vi,
    /// English
    En,
}

/// Fixed strings for one locale
struct Labels {
    header: &'static str,
    sheet: &'static str,
    old: &'static str,
    new: &'static str,
    status: &'static str,
    blank: &'static str,
}

impl Locale {
    fn labels(self) -> &'static Labels {
        match self {
            Locale::Vi => &Labels {
                header: "📣 Google Sheets vừa được cập nhật:",
                sheet: "Sheet",
                old: "Cũ",
                new: "Mới",
                status: "Trạng thái",
                blank: "(trống)",
            },
            Locale::En => &Labels {
                header: "📣 Google Sheets was just updated:",
                sheet: "Sheet",
                old: "Old",
                new: "New",
                status: "Status",
                blank: "(empty)",
            },
        }
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" => Ok(Locale::Vi),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            _ => Err(CoreError::UnknownLocale(s.to_string())),
        }
    }
}

/// Renders row diffs into the text posted to the webhook
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    sheet_name: String,
    spreadsheet_id: String,
    locale: Locale,
}

impl MessageFormatter {
    pub fn new(sheet_name: impl Into<String>, spreadsheet_id: impl Into<String>, locale: Locale) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            spreadsheet_id: spreadsheet_id.into(),
            locale,
        }
    }

    /// Link back to the watched spreadsheet
    pub fn source_url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}/edit", self.spreadsheet_id)
    }

    /// Render a notification for a non-empty list of diffs
    ///
    /// Callers must not invoke this with an empty list; a change confined to
    /// column C produces no diffs and no message.
    pub fn render(&self, diffs: &[RowDiff]) -> String {
        debug_assert!(!diffs.is_empty(), "render called without diffs");
        let labels = self.locale.labels();

        let mut lines = Vec::with_capacity(diffs.len() + 4);
        lines.push(labels.header.to_string());
        lines.push(format!("• {}: **{}**", labels.sheet, self.sheet_name));
        lines.push(String::new());

        for diff in diffs {
            let row = diff.row;
            lines.push(format!(
                "• {}: (A{row}) `{}` : (B{row}) `{}`\n\
                 • {}: (A{row}) `{}` : (B{row}) `{}`\n\
                 • {}: `{}`\n",
                labels.old,
                self.cell(&diff.old[0]),
                self.cell(&diff.old[1]),
                labels.new,
                self.cell(&diff.new[0]),
                self.cell(&diff.new[1]),
                labels.status,
                self.cell(&diff.new[2]),
            ));
        }

        lines.push(format!("🔗 {}", self.source_url()));
        lines.join("\n")
    }

    /// Escape a cell for inline code, substituting the blank placeholder
    fn cell(&self, value: &str) -> String {
        if value.trim().is_empty() {
            self.locale.labels().blank.to_string()
        } else {
            value.replace('`', "\\`")
        }
    }
}
