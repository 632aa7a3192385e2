use thiserror::Error;

/// Normalized input for adding or editing a task from any client (CLI or TUI).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub text: Vec<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub private: bool,
    pub remind_minutes: Option<u32>,
    pub voice_note: Option<String>,
}

impl TaskInput {
    pub fn from_text<T: AsRef<str>>(text: T) -> Self {
        Self {
            text: text
                .as_ref()
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
            ..Self::default()
        }
    }

    pub fn require_text(&self) -> Result<(), CaptureError> {
        if self.text.iter().all(|word| word.trim().is_empty()) {
            return Err(CaptureError::EmptyText);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Task text cannot be empty")]
    EmptyText,
    #[error("Pick a day for the task")]
    MissingDate,
    #[error("Unrecognized date '{0}'. Try YYYY-MM-DD, today, tomorrow, +3d, mon")]
    InvalidDate(String),
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),
    #[error("Invalid reminder '{0}': expected minutes before the task")]
    InvalidReminder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_blank_words() {
        let input = TaskInput {
            text: vec!["  ".into(), "".into()],
            ..TaskInput::default()
        };
        assert_eq!(input.require_text(), Err(CaptureError::EmptyText));
        assert!(TaskInput::from_text("Buy milk").require_text().is_ok());
    }
}
