use crate::models::Stats;
use serde::Serialize;

const TREND_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTrend {
    Up,
    Flat,
    Down,
}

impl SentimentTrend {
    pub fn from_score(avg_score: f64) -> Self {
        if avg_score > TREND_THRESHOLD {
            SentimentTrend::Up
        } else if avg_score < -TREND_THRESHOLD {
            SentimentTrend::Down
        } else {
            SentimentTrend::Flat
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SentimentTrend::Up => "↑",
            SentimentTrend::Flat => "→",
            SentimentTrend::Down => "↓",
        }
    }

    pub fn style(self) -> &'static str {
        match self {
            SentimentTrend::Up => "success",
            SentimentTrend::Flat => "secondary",
            SentimentTrend::Down => "danger",
        }
    }
}

/// Percent of mentions per sentiment, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentShares {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total: u64,
    pub avg_score: String,
    pub positive_pct: String,
    pub neutral_pct: String,
    pub negative_pct: String,
    pub positive_bar_width_pct: f64,
    pub negative_bar_width_pct: f64,
    pub trend: SentimentTrend,
}

pub fn shares(stats: &Stats) -> SentimentShares {
    // An empty distribution reads as 0% everywhere rather than NaN.
    let divisor = if stats.total == 0 { 1.0 } else { stats.total as f64 };
    let pct = |count: u64| round_to_tenth(100.0 * count as f64 / divisor);

    SentimentShares {
        positive: pct(stats.positive),
        neutral: pct(stats.neutral),
        negative: pct(stats.negative),
    }
}

pub fn summarize(stats: &Stats) -> MetricsSummary {
    let shares = shares(stats);

    MetricsSummary {
        total: stats.total,
        avg_score: format!("{:.2}", stats.avg_score),
        positive_pct: percent_label(shares.positive),
        neutral_pct: percent_label(shares.neutral),
        negative_pct: percent_label(shares.negative),
        positive_bar_width_pct: (100.0 * stats.avg_score).max(0.0),
        negative_bar_width_pct: (-100.0 * stats.avg_score).max(0.0),
        trend: SentimentTrend::from_score(stats.avg_score),
    }
}

pub fn percent_label(value: f64) -> String {
    format!("{value:.1}%")
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(positive: u64, neutral: u64, negative: u64, avg_score: f64) -> Stats {
        Stats {
            total: positive + neutral + negative,
            avg_score,
            positive,
            neutral,
            negative,
        }
    }

    #[test]
    fn summary_matches_reference_dashboard() {
        let summary = summarize(&stats(6, 3, 1, 0.35));
        assert_eq!(summary.total, 10);
        assert_eq!(summary.avg_score, "0.35");
        assert_eq!(summary.positive_pct, "60.0%");
        assert_eq!(summary.neutral_pct, "30.0%");
        assert_eq!(summary.negative_pct, "10.0%");
        assert!((summary.positive_bar_width_pct - 35.0).abs() < 1e-9);
        assert_eq!(summary.negative_bar_width_pct, 0.0);
        assert_eq!(summary.trend, SentimentTrend::Up);
    }

    #[test]
    fn negative_score_fills_only_the_negative_gauge() {
        let summary = summarize(&stats(1, 1, 4, -0.42));
        assert_eq!(summary.positive_bar_width_pct, 0.0);
        assert!((summary.negative_bar_width_pct - 42.0).abs() < 1e-9);
        assert_eq!(summary.avg_score, "-0.42");
        assert_eq!(summary.trend, SentimentTrend::Down);
    }

    #[test]
    fn empty_distribution_reads_zero_percent() {
        let summary = summarize(&stats(0, 0, 0, 0.0));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.positive_pct, "0.0%");
        assert_eq!(summary.neutral_pct, "0.0%");
        assert_eq!(summary.negative_pct, "0.0%");
        assert_eq!(summary.positive_bar_width_pct, 0.0);
        assert_eq!(summary.negative_bar_width_pct, 0.0);
        assert_eq!(summary.trend, SentimentTrend::Flat);
    }

    #[test]
    fn shares_sum_to_one_hundred_within_rounding() {
        let samples = [
            (1, 1, 1),
            (7, 0, 0),
            (2, 5, 11),
            (13, 17, 19),
            (1, 2, 997),
            (333, 333, 334),
        ];
        for (p, n, g) in samples {
            let s = shares(&stats(p, n, g, 0.0));
            let sum = s.positive + s.neutral + s.negative;
            assert!((sum - 100.0).abs() <= 0.15 + 1e-9, "{p}/{n}/{g} summed to {sum}");
        }
    }

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(SentimentTrend::from_score(0.2), SentimentTrend::Flat);
        assert_eq!(SentimentTrend::from_score(0.21), SentimentTrend::Up);
        assert_eq!(SentimentTrend::from_score(-0.2), SentimentTrend::Flat);
        assert_eq!(SentimentTrend::from_score(-0.25).arrow(), "↓");
    }
}
