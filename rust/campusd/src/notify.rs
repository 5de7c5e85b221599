use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Transient user-facing messages. Drained into the response of the request
/// that produced them; nothing is kept once drained.
#[derive(Debug, Default)]
pub struct Notifier {
    pending: Vec<Notification>,
}

impl Notifier {
    pub fn info(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(title.into(), description.into(), Severity::Default);
    }

    pub fn destructive(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(title.into(), description.into(), Severity::Destructive);
    }

    fn push(&mut self, title: String, description: String, severity: Severity) {
        self.pending.push(Notification {
            title,
            description,
            severity,
        });
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    #[cfg(test)]
    pub fn peek(&self) -> &[Notification] {
        &self.pending
    }
}
