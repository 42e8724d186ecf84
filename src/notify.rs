use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Default,
    Destructive,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Default => "default",
            Severity::Destructive => "destructive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Severity::Default),
            "destructive" => Some(Severity::Destructive),
            _ => None,
        }
    }
}

/// User-facing feedback surface. Only the "show message" capability of the
/// host application's toast system is consumed.
pub trait Notifier: Send + Sync {
    fn show(&self, title: &str, description: &str, severity: Severity);
}

/// Renders notifications through the log pipeline; the default for headless
/// embedders.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, title: &str, description: &str, severity: Severity) {
        match severity {
            Severity::Default => tracing::info!("{}: {}", title, description),
            Severity::Destructive => tracing::warn!("{}: {}", title, description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_roundtrip() {
        for (s, expected) in [
            ("default", Severity::Default),
            ("destructive", Severity::Destructive),
        ] {
            assert_eq!(Severity::parse(s).unwrap().as_str(), expected.as_str());
        }
        assert!(Severity::parse("nope").is_none());
    }
}
