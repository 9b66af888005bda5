use crate::models::{Mention, MentionsParams, Sentiment, TimelinePoint};
use crate::ui::{escape_html, is_web_link};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::{cmp::Ordering, str::FromStr};

pub const NO_MENTIONS: &str = "No mentions available.";
pub const NO_MATCHES: &str = "No mentions match the selected filters.";
pub const COLUMNS: [&str; 6] = ["Date", "Title", "Source", "Sentiment", "Score", "Link"];
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStyle {
    Success,
    Danger,
}

impl RowStyle {
    pub fn for_sentiment(sentiment: Sentiment) -> Option<Self> {
        match sentiment {
            Sentiment::Positive => Some(RowStyle::Success),
            Sentiment::Negative => Some(RowStyle::Danger),
            Sentiment::Neutral => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RowStyle::Success => "success",
            RowStyle::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub date: String,
    pub title: String,
    pub source: String,
    pub sentiment: String,
    pub score: String,
    pub url: String,
    pub style: Option<RowStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Zero-based.
    pub index: usize,
    pub size: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableSpec {
    Placeholder {
        message: String,
    },
    Table {
        columns: Vec<&'static str>,
        rows: Vec<TableRow>,
        page: Option<PageInfo>,
    },
}

impl TableSpec {
    fn placeholder(message: &str) -> Self {
        TableSpec::Placeholder {
            message: message.to_string(),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        match self {
            TableSpec::Placeholder { .. } => &[],
            TableSpec::Table { rows, .. } => rows,
        }
    }

    pub fn to_html(&self) -> String {
        let (rows, page) = match self {
            TableSpec::Placeholder { message } => {
                return format!("<p class=\"placeholder\">{}</p>", escape_html(message));
            }
            TableSpec::Table { rows, page, .. } => (rows, page),
        };

        let mut html = String::from("<table class=\"table table-striped\">\n<thead><tr>");
        for column in COLUMNS {
            html.push_str(&format!("<th>{column}</th>"));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for row in rows {
            match row.style {
                Some(style) => html.push_str(&format!("<tr class=\"table-{}\">", style.as_str())),
                None => html.push_str("<tr>"),
            }
            html.push_str(&format!(
                "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&row.date),
                escape_html(&row.title),
                escape_html(&row.source),
                escape_html(&row.sentiment),
                escape_html(&row.score),
                link_cell(&row.url),
            ));
        }
        html.push_str("</tbody>\n</table>");

        if let Some(page) = page {
            html.push_str(&format!(
                "\n<p class=\"pager\" data-page=\"{}\" data-pages=\"{}\">Page {} of {} ({} mentions)</p>",
                page.index + 1,
                page.page_count,
                page.index + 1,
                page.page_count,
                page.total_rows
            ));
        }
        html
    }
}

fn link_cell(url: &str) -> String {
    // Only web links become anchors; anything else is shown inert.
    if is_web_link(url) {
        format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">View</a>",
            escape_html(url)
        )
    } else {
        escape_html(url)
    }
}

pub fn render_mentions_table(mentions: &[Mention]) -> TableSpec {
    if mentions.is_empty() {
        return TableSpec::placeholder(NO_MENTIONS);
    }

    TableSpec::Table {
        columns: COLUMNS.to_vec(),
        rows: mentions.iter().map(table_row).collect(),
        page: None,
    }
}

fn table_row(mention: &Mention) -> TableRow {
    TableRow {
        date: display_date(mention.published_at.as_deref()),
        title: mention.title.clone(),
        source: display_source(mention.source.as_deref()),
        sentiment: title_case(mention.sentiment.as_str()),
        score: format!("{:.2}", mention.sentiment_score),
        url: mention.url.clone(),
        style: RowStyle::for_sentiment(mention.sentiment),
    }
}

pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Reads the calendar date from an ISO-like timestamp such as
/// `2024-03-01`, `2024-03-01T09:30:00` or `2024-03-01 09:30:00`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let prefix = value.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn display_date(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => "Unknown".to_string(),
        Some(raw) => parse_date(raw)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

fn display_source(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => "Unknown".to_string(),
        Some(source) => source.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    #[default]
    All,
    LastDays(u32),
    /// Inclusive on both ends.
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl DateWindow {
    pub fn is_all(&self) -> bool {
        matches!(self, DateWindow::All | DateWindow::Range { from: None, to: None })
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match *self {
            DateWindow::All => true,
            // A period reaching past the earliest representable date admits everything.
            DateWindow::LastDays(days) => today
                .checked_sub_days(Days::new(u64::from(days)))
                .is_none_or(|cutoff| date >= cutoff),
            DateWindow::Range { from, to } => {
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            }
        }
    }

    fn admits(&self, raw: Option<&str>, today: NaiveDate) -> bool {
        if self.is_all() {
            return true;
        }
        raw.and_then(parse_date)
            .is_some_and(|date| self.contains(date, today))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Title,
    Source,
    Sentiment,
    Score,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" | "published_at" => Ok(SortColumn::Date),
            "title" => Ok(SortColumn::Title),
            "source" => Ok(SortColumn::Source),
            "sentiment" => Ok(SortColumn::Sentiment),
            "score" | "sentiment_score" => Ok(SortColumn::Score),
            other => Err(format!("cannot sort by '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based.
    pub index: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableQuery {
    pub sentiment: Option<Sentiment>,
    pub window: DateWindow,
    pub sort: Option<SortSpec>,
    pub page: Option<PageRequest>,
}

impl TableQuery {
    pub fn from_params(params: &MentionsParams) -> Result<Self, String> {
        let sentiment = match params.sentiment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case("all") => None,
            Some(value) => Some(value.parse::<Sentiment>()?),
        };

        // A rolling period wins over an explicit range.
        let window = match params.days {
            Some(days) => DateWindow::LastDays(days),
            None => {
                let from = parse_param_date("from", params.from.as_deref())?;
                let to = parse_param_date("to", params.to.as_deref())?;
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(format!("'from' ({from}) is after 'to' ({to})"));
                    }
                }
                DateWindow::Range { from, to }
            }
        };

        let sort = match params.sort.as_deref() {
            None | Some("") => None,
            Some(column) => Some(SortSpec {
                column: column.parse()?,
                order: match params.order.as_deref() {
                    None | Some("") => SortOrder::Ascending,
                    Some(order) => order.parse()?,
                },
            }),
        };

        let page = match (params.page, params.per_page) {
            (None, None) => None,
            (page, per_page) => {
                let size = per_page.unwrap_or(DEFAULT_PAGE_SIZE);
                if size == 0 {
                    return Err("per_page must be at least 1".to_string());
                }
                Some(PageRequest {
                    index: page.unwrap_or(1).saturating_sub(1),
                    size,
                })
            }
        };

        Ok(Self {
            sentiment,
            window,
            sort,
            page,
        })
    }
}

fn parse_param_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| format!("'{name}' must be a YYYY-MM-DD date, got '{raw}'")),
    }
}

/// Filters, sorts and pages mentions before rendering them.
pub fn render_mentions_page(
    mentions: &[Mention],
    query: &TableQuery,
    today: NaiveDate,
) -> TableSpec {
    if *query == TableQuery::default() || mentions.is_empty() {
        return render_mentions_table(mentions);
    }

    let mut selected: Vec<&Mention> = mentions
        .iter()
        .filter(|mention| query.sentiment.is_none_or(|wanted| mention.sentiment == wanted))
        .filter(|mention| query.window.admits(mention.published_at.as_deref(), today))
        .collect();

    if selected.is_empty() {
        return TableSpec::placeholder(NO_MATCHES);
    }

    if let Some(sort) = query.sort {
        selected.sort_by(|a, b| {
            let ordering = compare_mentions(a, b, sort.column);
            match sort.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    let total_rows = selected.len();
    let (visible, page) = match query.page {
        None => (&selected[..], None),
        Some(request) => {
            let page_count = total_rows.div_ceil(request.size);
            let index = request.index.min(page_count - 1);
            let start = index * request.size;
            let end = (start + request.size).min(total_rows);
            (
                &selected[start..end],
                Some(PageInfo {
                    index,
                    size: request.size,
                    page_count,
                    total_rows,
                }),
            )
        }
    };

    TableSpec::Table {
        columns: COLUMNS.to_vec(),
        rows: visible.iter().map(|mention| table_row(mention)).collect(),
        page,
    }
}

fn compare_mentions(a: &Mention, b: &Mention, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Date => {
            let left = a.published_at.as_deref();
            let right = b.published_at.as_deref();
            left.and_then(parse_date)
                .cmp(&right.and_then(parse_date))
                .then_with(|| left.cmp(&right))
        }
        SortColumn::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortColumn::Source => {
            display_source(a.source.as_deref()).cmp(&display_source(b.source.as_deref()))
        }
        SortColumn::Sentiment => {
            title_case(a.sentiment.as_str()).cmp(&title_case(b.sentiment.as_str()))
        }
        SortColumn::Score => a.sentiment_score.total_cmp(&b.sentiment_score),
    }
}

pub fn filter_timeline(
    timeline: &[TimelinePoint],
    window: &DateWindow,
    today: NaiveDate,
) -> Vec<TimelinePoint> {
    timeline
        .iter()
        .filter(|point| window.admits(Some(point.date.as_str()), today))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionCard {
    pub title: String,
    pub meta: String,
    pub url: String,
    pub style: Option<RowStyle>,
}

/// Newest mentions first; undated mentions sort last.
pub fn recent_mentions(mentions: &[Mention], limit: usize) -> Vec<MentionCard> {
    let mut ordered: Vec<&Mention> = mentions.iter().collect();
    ordered.sort_by(|a, b| compare_mentions(b, a, SortColumn::Date));

    ordered
        .into_iter()
        .take(limit)
        .map(|mention| MentionCard {
            title: mention.title.clone(),
            meta: format!(
                "{} • {}",
                display_source(mention.source.as_deref()),
                mention
                    .published_at
                    .as_deref()
                    .and_then(parse_date)
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "Unknown date".to_string())
            ),
            url: mention.url.clone(),
            style: RowStyle::for_sentiment(mention.sentiment),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(date: Option<&str>, title: &str, sentiment: Sentiment, score: f64) -> Mention {
        Mention {
            published_at: date.map(str::to_string),
            title: title.to_string(),
            source: Some("Wire".to_string()),
            sentiment,
            sentiment_score: score,
            url: format!("https://news.example/{}", title.to_lowercase().replace(' ', "-")),
        }
    }

    fn sample() -> Vec<Mention> {
        vec![
            mention(Some("2024-03-10T08:00:00"), "Record quarter", Sentiment::Positive, 0.81),
            mention(Some("2024-03-05"), "Board meeting", Sentiment::Neutral, 0.02),
            mention(Some("2024-02-20 12:00:00"), "Recall announced", Sentiment::Negative, -0.66),
            mention(None, "Undated note", Sentiment::Neutral, 0.0),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    #[test]
    fn empty_mentions_render_placeholder() {
        let table = render_mentions_table(&[]);
        assert_eq!(
            table,
            TableSpec::Placeholder {
                message: NO_MENTIONS.to_string()
            }
        );
        let html = table.to_html();
        assert!(html.contains("No mentions available."));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn rows_keep_input_order_and_styles() {
        let table = render_mentions_table(&sample());
        let rows = table.rows();
        let titles: Vec<&str> = rows.iter().map(|row| row.title.as_str()).collect();
        assert_eq!(titles, ["Record quarter", "Board meeting", "Recall announced", "Undated note"]);

        assert_eq!(rows[0].style, Some(RowStyle::Success));
        assert_eq!(rows[1].style, None);
        assert_eq!(rows[2].style, Some(RowStyle::Danger));
        assert_eq!(rows[0].sentiment, "Positive");
        assert_eq!(rows[2].score, "-0.66");
        assert_eq!(rows[0].date, "2024-03-10");
        assert_eq!(rows[3].date, "Unknown");

        let html = table.to_html();
        assert!(html.contains("<tr class=\"table-success\">"));
        assert!(html.contains("<tr class=\"table-danger\">"));
        assert!(html.contains("target=\"_blank\""));
    }

    #[test]
    fn html_output_escapes_text() {
        let mut hostile = mention(
            Some("2024-03-01"),
            "<script>alert(1)</script>",
            Sentiment::Neutral,
            0.0,
        );
        hostile.url = "javascript:alert(1)".to_string();
        let html = render_mentions_table(&[hostile]).to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("href=\"javascript"));
    }

    #[test]
    fn title_case_lowers_the_tail() {
        assert_eq!(title_case("NEGATIVE"), "Negative");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn sentiment_filter_and_empty_match_placeholder() {
        let query = TableQuery {
            sentiment: Some(Sentiment::Negative),
            ..TableQuery::default()
        };
        let table = render_mentions_page(&sample(), &query, today());
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].title, "Recall announced");

        let none = vec![mention(Some("2024-03-01"), "Calm", Sentiment::Neutral, 0.0)];
        let table = render_mentions_page(&none, &query, today());
        assert_eq!(
            table,
            TableSpec::Placeholder {
                message: NO_MATCHES.to_string()
            }
        );
    }

    #[test]
    fn rolling_period_overrides_range() {
        let params = MentionsParams {
            sentiment: Some("all".into()),
            days: Some(7),
            from: Some("2020-01-01".into()),
            to: Some("2020-01-31".into()),
            sort: None,
            order: None,
            page: None,
            per_page: None,
        };
        let query = TableQuery::from_params(&params).unwrap();
        assert_eq!(query.window, DateWindow::LastDays(7));

        let table = render_mentions_page(&sample(), &query, today());
        let titles: Vec<&str> = table.rows().iter().map(|row| row.title.as_str()).collect();
        assert_eq!(titles, ["Record quarter", "Board meeting"]);
    }

    #[test]
    fn range_is_inclusive_and_drops_undated() {
        let query = TableQuery {
            window: DateWindow::Range {
                from: NaiveDate::from_ymd_opt(2024, 2, 20),
                to: NaiveDate::from_ymd_opt(2024, 3, 5),
            },
            ..TableQuery::default()
        };
        let table = render_mentions_page(&sample(), &query, today());
        let titles: Vec<&str> = table.rows().iter().map(|row| row.title.as_str()).collect();
        assert_eq!(titles, ["Board meeting", "Recall announced"]);
    }

    #[test]
    fn explicit_sort_and_pagination() {
        let query = TableQuery {
            sort: Some(SortSpec {
                column: SortColumn::Score,
                order: SortOrder::Descending,
            }),
            page: Some(PageRequest { index: 1, size: 3 }),
            ..TableQuery::default()
        };
        let table = render_mentions_page(&sample(), &query, today());
        match &table {
            TableSpec::Table { rows, page, .. } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].title, "Recall announced");
                assert_eq!(
                    *page,
                    Some(PageInfo {
                        index: 1,
                        size: 3,
                        page_count: 2,
                        total_rows: 4
                    })
                );
            }
            other => panic!("expected a table, got {other:?}"),
        }
        assert!(table.to_html().contains("Page 2 of 2 (4 mentions)"));
    }

    #[test]
    fn bad_params_are_rejected() {
        let mut params = MentionsParams {
            sentiment: Some("mixed".into()),
            days: None,
            from: None,
            to: None,
            sort: None,
            order: None,
            page: None,
            per_page: None,
        };
        assert!(TableQuery::from_params(&params).is_err());

        params.sentiment = None;
        params.from = Some("03/01/2024".into());
        assert!(TableQuery::from_params(&params).is_err());

        params.from = Some("2024-03-09".into());
        params.to = Some("2024-03-01".into());
        assert!(TableQuery::from_params(&params).is_err());

        params.to = None;
        params.sort = Some("url".into());
        assert!(TableQuery::from_params(&params).is_err());
    }

    #[test]
    fn timeline_window_keeps_order() {
        let timeline = vec![
            TimelinePoint {
                date: "2024-02-01".into(),
                score: 0.1,
                sentiment: Sentiment::Neutral,
            },
            TimelinePoint {
                date: "2024-03-08T10:00:00".into(),
                score: 0.5,
                sentiment: Sentiment::Positive,
            },
            TimelinePoint {
                date: "2024-03-11".into(),
                score: -0.4,
                sentiment: Sentiment::Negative,
            },
        ];
        let kept = filter_timeline(&timeline, &DateWindow::LastDays(7), today());
        let dates: Vec<&str> = kept.iter().map(|point| point.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-08T10:00:00", "2024-03-11"]);
        assert_eq!(filter_timeline(&timeline, &DateWindow::All, today()).len(), 3);
    }

    #[test]
    fn huge_rolling_period_admits_everything_dated() {
        let query = TableQuery {
            window: DateWindow::LastDays(u32::MAX),
            ..TableQuery::default()
        };
        let table = render_mentions_page(&sample(), &query, today());
        assert_eq!(table.rows().len(), 3);

        let oldest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert!(DateWindow::LastDays(u32::MAX).contains(oldest, today()));
    }

    #[test]
    fn recent_cards_are_newest_first() {
        let cards = recent_mentions(&sample(), 2);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Record quarter");
        assert_eq!(cards[0].meta, "Wire • 2024-03-10");
        assert_eq!(cards[1].title, "Board meeting");

        let all = recent_mentions(&sample(), RECENT_LIMIT);
        assert_eq!(all.last().unwrap().meta, "Wire • Unknown date");
    }
}
