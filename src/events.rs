use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// transient message shown after a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// queue of notices collected during operations, drained by the ui
#[derive(Debug, Default)]
pub struct Notifications {
    notices: Vec<Notice>,
}

impl Notifications {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    pub fn emit(&mut self, level: NoticeLevel, message: impl Into<String>, timestamp: DateTime<Utc>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
            timestamp,
        });
    }

    pub fn success(&mut self, message: impl Into<String>, timestamp: DateTime<Utc>) {
        self.emit(NoticeLevel::Success, message, timestamp);
    }

    pub fn error(&mut self, message: impl Into<String>, timestamp: DateTime<Utc>) {
        self.emit(NoticeLevel::Error, message, timestamp);
    }

    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}
