use serde::{Deserialize, Serialize};

/// One side of the bridge.
///
/// Every message and channel identifier is an opaque string scoped to one
/// platform. Telegram ids happen to look numeric and Slack message ids are
/// timestamp tokens like `"1714.0023"`; the core never parses or compares
/// them as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Slack,
}

impl Platform {
    /// The platform on the opposite side of the bridge.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Telegram => Self::Slack,
            Self::Slack => Self::Telegram,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Slack => "slack",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_flips_sides() {
        assert_eq!(Platform::Telegram.other(), Platform::Slack);
        assert_eq!(Platform::Slack.other(), Platform::Telegram);
    }
}
