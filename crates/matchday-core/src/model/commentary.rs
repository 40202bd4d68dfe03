// ── Commentary domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which feed produced an entry. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommentarySource {
    /// Third-party ball-by-ball provider.
    External,
    /// Our own scorers.
    InHouse,
    Other(String),
}

impl CommentarySource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::External => "external",
            Self::InHouse => "in-house",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for CommentarySource {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "external" => Self::External,
            "in-house" => Self::InHouse,
            _ => Self::Other(tag),
        }
    }
}

impl From<CommentarySource> for String {
    fn from(source: CommentarySource) -> Self {
        match source {
            CommentarySource::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CommentarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-ball lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Setup commentary before the delivery.
    PreBall,
    /// The delivery itself.
    #[default]
    Ball,
    /// Reaction and analysis after the delivery.
    PostBall,
}

impl Phase {
    /// Ordering rank within one ball: setup, delivery, analysis.
    pub fn rank(self) -> u8 {
        match self {
            Self::PreBall => 0,
            Self::Ball => 1,
            Self::PostBall => 2,
        }
    }

    /// Parse a wire tag. Accepts kebab, snake, camel and upper-snake
    /// spellings; returns `None` for anything else.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let folded: String = tag
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "preball" => Some(Self::PreBall),
            "ball" => Some(Self::Ball),
            "postball" => Some(Self::PostBall),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreBall => "pre-ball",
            Self::Ball => "ball",
            Self::PostBall => "post-ball",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `over.ball` label shown in the feed, e.g. `12.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BallLabel {
    pub over: u32,
    pub ball: u32,
}

impl fmt::Display for BallLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.over, self.ball)
    }
}

/// One normalized commentary entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryEntry {
    pub id: Option<String>,
    pub over: u32,
    pub ball: u32,
    pub source: CommentarySource,
    pub phase: Phase,
    pub text: String,
    pub runs: Option<u32>,
    pub wicket: bool,
    pub author: Option<String>,
    /// Explicit position among post-ball entries of the same ball.
    pub order: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub innings: Option<u32>,
}

impl CommentaryEntry {
    pub fn label(&self) -> BallLabel {
        BallLabel {
            over: self.over,
            ball: self.ball,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tags_in_every_spelling() {
        for tag in ["pre-ball", "pre_ball", "preBall", "PRE_BALL", "Pre Ball"] {
            assert_eq!(Phase::from_tag(tag), Some(Phase::PreBall), "{tag}");
        }
        assert_eq!(Phase::from_tag("post-ball"), Some(Phase::PostBall));
        assert_eq!(Phase::from_tag("BALL"), Some(Phase::Ball));
        assert_eq!(Phase::from_tag("innings-break"), None);
    }

    #[test]
    fn phase_ranks() {
        assert!(Phase::PreBall.rank() < Phase::Ball.rank());
        assert!(Phase::Ball.rank() < Phase::PostBall.rank());
        assert_eq!(Phase::default(), Phase::Ball);
    }

    #[test]
    fn source_tags_round_trip_verbatim() {
        assert_eq!(CommentarySource::from("in-house".to_owned()), CommentarySource::InHouse);
        let other = CommentarySource::from("radio".to_owned());
        assert_eq!(other, CommentarySource::Other("radio".into()));
        assert_eq!(String::from(other), "radio");
    }

    #[test]
    fn label_display() {
        let label = BallLabel { over: 12, ball: 3 };
        assert_eq!(label.to_string(), "12.3");
    }
}
