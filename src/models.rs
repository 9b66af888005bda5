use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Neutral => "NEUTRAL",
            Sentiment::Negative => "NEGATIVE",
        }
    }

    /// Marker and bar color shared by both charts.
    pub fn color(self) -> &'static str {
        match self {
            Sentiment::Positive => "#28a745",
            Sentiment::Neutral => "#6c757d",
            Sentiment::Negative => "#dc3545",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(Sentiment::Positive),
            "NEUTRAL" => Ok(Sentiment::Neutral),
            "NEGATIVE" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "TOTAL")]
    pub total: u64,
    #[serde(rename = "AVG_SCORE")]
    pub avg_score: f64,
    #[serde(rename = "POSITIVE")]
    pub positive: u64,
    #[serde(rename = "NEUTRAL")]
    pub neutral: u64,
    #[serde(rename = "NEGATIVE")]
    pub negative: u64,
}

impl Stats {
    pub fn count(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: String,
    pub score: f64,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(default)]
    pub published_at: Option<String>,
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub company: Option<Company>,
    pub stats: Stats,
    pub timeline: Vec<TimelinePoint>,
    pub mentions: Vec<Mention>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub company_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MentionsParams {
    pub sentiment: Option<String>,
    pub days: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
