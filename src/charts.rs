//! Chart specifications for the distribution and timeline panels.
//!
//! Builders are pure: the same input always yields the same spec. Specs are
//! plain data; [`BarChart::to_plotly`] and [`TimelineChart::to_plotly`] turn
//! them into the `{data, layout, config}` triple the page hands to Plotly.

use crate::models::{Sentiment, Stats, TimelinePoint, Viewport};
use crate::stats::{percent_label, shares};
use serde::Serialize;
use serde_json::{Value, json};

pub const SCORE_AXIS_RANGE: [f64; 2] = [-1.1, 1.1];
const CHART_HEIGHT: u32 = 300;
const MIN_CHART_WIDTH: u32 = 280;
const TWO_COLUMN_BREAKPOINT: u32 = 992;
const TREND_COLOR: &str = "rgba(100, 100, 100, 0.5)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSlot {
    /// Shares a row with another panel on wide screens.
    Half,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartLayout {
    pub width: Option<u32>,
    pub height: u32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: None,
            height: CHART_HEIGHT,
        }
    }
}

impl ChartLayout {
    pub fn for_viewport(viewport: Viewport, slot: ChartSlot) -> Self {
        let gutter = 48;
        let usable = viewport.width.saturating_sub(gutter);
        let width = match slot {
            ChartSlot::Half if viewport.width >= TWO_COLUMN_BREAKPOINT => {
                usable.saturating_sub(gutter) / 2
            }
            _ => usable,
        };
        Self {
            width: Some(width.max(MIN_CHART_WIDTH)),
            height: CHART_HEIGHT,
        }
    }

    fn apply(&self, layout: &mut Value) {
        layout["height"] = json!(self.height);
        match self.width {
            Some(width) => layout["width"] = json!(width),
            None => layout["autosize"] = json!(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: &'static str,
    pub value: u64,
    pub color: &'static str,
    /// Share of all mentions, drawn just above the bar.
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub bars: Vec<Bar>,
    pub layout: ChartLayout,
}

pub fn build_distribution_chart(stats: &Stats) -> BarChart {
    let shares = shares(stats);
    let bars = Sentiment::ALL
        .into_iter()
        .map(|sentiment| {
            let share = match sentiment {
                Sentiment::Positive => shares.positive,
                Sentiment::Neutral => shares.neutral,
                Sentiment::Negative => shares.negative,
            };
            Bar {
                label: category_label(sentiment),
                value: stats.count(sentiment),
                color: sentiment.color(),
                annotation: percent_label(share),
            }
        })
        .collect();

    BarChart {
        bars,
        layout: ChartLayout::default(),
    }
}

impl BarChart {
    pub fn with_layout(mut self, layout: ChartLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn to_plotly(&self) -> Value {
        let labels: Vec<&str> = self.bars.iter().map(|bar| bar.label).collect();
        let values: Vec<u64> = self.bars.iter().map(|bar| bar.value).collect();
        let colors: Vec<&str> = self.bars.iter().map(|bar| bar.color).collect();
        let text: Vec<String> = values.iter().map(u64::to_string).collect();
        let annotations: Vec<Value> = self
            .bars
            .iter()
            .map(|bar| {
                json!({
                    "x": bar.label,
                    "y": bar.value,
                    "text": bar.annotation,
                    "showarrow": false,
                    "yshift": 10
                })
            })
            .collect();

        let mut layout = json!({
            "plot_bgcolor": "rgba(0,0,0,0)",
            "paper_bgcolor": "rgba(0,0,0,0)",
            "margin": {"l": 40, "r": 20, "t": 20, "b": 40},
            "xaxis": {"title": "", "fixedrange": true},
            "yaxis": {"title": "Number of Mentions", "fixedrange": true},
            "annotations": annotations
        });
        self.layout.apply(&mut layout);

        json!({
            "data": [{
                "x": labels,
                "y": values,
                "type": "bar",
                "marker": {"color": colors},
                "text": text,
                "textposition": "auto"
            }],
            "layout": layout,
            "config": plot_config()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub colors: Vec<&'static str>,
}

/// Least-squares fit of score against position in the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub fitted: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceZone {
    pub sentiment: Sentiment,
    pub from: f64,
    pub to: f64,
    pub fill: &'static str,
}

pub const REFERENCE_ZONES: [ReferenceZone; 3] = [
    ReferenceZone {
        sentiment: Sentiment::Positive,
        from: 0.1,
        to: 1.1,
        fill: "rgba(40, 167, 69, 0.1)",
    },
    ReferenceZone {
        sentiment: Sentiment::Neutral,
        from: -0.1,
        to: 0.1,
        fill: "rgba(108, 117, 125, 0.1)",
    },
    ReferenceZone {
        sentiment: Sentiment::Negative,
        from: -1.1,
        to: -0.1,
        fill: "rgba(220, 53, 69, 0.1)",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineChart {
    pub scatter: ScatterSeries,
    pub trend: Option<TrendLine>,
    pub y_range: [f64; 2],
    pub zero_line: bool,
    pub layout: ChartLayout,
}

pub fn build_timeline_chart(timeline: &[TimelinePoint]) -> TimelineChart {
    let scatter = ScatterSeries {
        x: timeline.iter().map(|point| point.date.clone()).collect(),
        y: timeline.iter().map(|point| point.score).collect(),
        colors: timeline.iter().map(|point| point.sentiment.color()).collect(),
    };
    let trend = fit_trend(&scatter.y);

    TimelineChart {
        scatter,
        trend,
        y_range: SCORE_AXIS_RANGE,
        zero_line: true,
        layout: ChartLayout::default(),
    }
}

/// Points are treated as equally spaced: x is the index 0..n-1, not the date.
/// Returns `None` for fewer than two points.
pub fn fit_trend(scores: &[f64]) -> Option<TrendLine> {
    let n = scores.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = scores.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (index, score) in scores.iter().enumerate() {
        let dx = index as f64 - x_mean;
        numerator += dx * (score - y_mean);
        denominator += dx * dx;
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;
    let fitted = (0..n).map(|index| slope * index as f64 + intercept).collect();

    Some(TrendLine {
        slope,
        intercept,
        fitted,
    })
}

impl TimelineChart {
    pub fn with_layout(mut self, layout: ChartLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn to_plotly(&self) -> Value {
        let mut traces = vec![json!({
            "x": self.scatter.x,
            "y": self.scatter.y,
            "mode": "markers",
            "type": "scatter",
            "marker": {"color": self.scatter.colors, "size": 10},
            "name": "Sentiment"
        })];
        if let Some(trend) = &self.trend {
            traces.push(json!({
                "x": self.scatter.x,
                "y": trend.fitted,
                "mode": "lines",
                "type": "scatter",
                "line": {"color": TREND_COLOR, "width": 2},
                "name": "Trend"
            }));
        }

        let shapes: Vec<Value> = match (self.scatter.x.first(), self.scatter.x.last()) {
            (Some(first), Some(last)) => REFERENCE_ZONES
                .iter()
                .map(|zone| {
                    json!({
                        "type": "rect",
                        "xref": "x",
                        "x0": first,
                        "x1": last,
                        "y0": zone.from,
                        "y1": zone.to,
                        "fillcolor": zone.fill,
                        "line": {"width": 0},
                        "layer": "below"
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut layout = json!({
            "plot_bgcolor": "rgba(0,0,0,0)",
            "paper_bgcolor": "rgba(0,0,0,0)",
            "margin": {"l": 40, "r": 20, "t": 20, "b": 40},
            "xaxis": {"title": "Date", "fixedrange": true},
            "yaxis": {
                "title": "Sentiment Score",
                "range": self.y_range,
                "zeroline": self.zero_line,
                "zerolinecolor": "rgba(0,0,0,0.2)",
                "zerolinewidth": 1,
                "fixedrange": true
            },
            "shapes": shapes,
            "showlegend": true,
            "legend": {
                "orientation": "h",
                "yanchor": "bottom",
                "y": 1.02,
                "xanchor": "right",
                "x": 1
            }
        });
        self.layout.apply(&mut layout);

        json!({
            "data": traces,
            "layout": layout,
            "config": plot_config()
        })
    }
}

fn category_label(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "Positive",
        Sentiment::Neutral => "Neutral",
        Sentiment::Negative => "Negative",
    }
}

fn plot_config() -> Value {
    json!({"responsive": true, "displayModeBar": false})
}
