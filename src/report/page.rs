//! Dashboard Page Generator
//! Builds the static HTML page: header, sidebar with logo and date range,
//! table previews and the seven question sections with their charts.

use crate::data::DateBounds;
use crate::report::QuestionReport;
use chrono::NaiveDate;
use polars::prelude::*;

pub const PAGE_TITLE: &str = "Bike sharing dataset 🚲";

/// Everything the page shows, with chart and logo paths relative to the page.
pub struct PageContent<'a> {
    pub bounds: DateBounds,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub logo: Option<&'a str>,
    pub full: &'a DataFrame,
    pub filtered: &'a DataFrame,
    pub preview_rows: usize,
    pub reports: &'a [QuestionReport],
    pub charts: &'a [String],
}

pub struct DashboardPage;

impl DashboardPage {
    pub fn render_html(content: &PageContent<'_>) -> String {
        let mut html = String::with_capacity(16 * 1024);
        html.push_str(&format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 0; display: flex; background: #f4f4f6; }}
aside {{ width: 240px; padding: 16px; background: #e8e8ec; min-height: 100vh; }}
aside img {{ max-width: 100%; }}
main {{ flex: 1; padding: 24px; overflow-x: auto; }}
table {{ border-collapse: collapse; font-size: 12px; margin-bottom: 8px; }}
th, td {{ border: 1px solid #ccc; padding: 2px 6px; text-align: right; }}
th {{ background: #ddd; }}
section img {{ max-width: 100%; }}
</style>
</head>
<body>
"#,
            title = escape(PAGE_TITLE)
        ));

        html.push_str(&Self::sidebar(content));
        html.push_str("<main>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape(PAGE_TITLE)));

        html.push_str("<h2>Merged rentals</h2>\n");
        html.push_str(&Self::table_preview(content.full, content.preview_rows));
        html.push_str("<h2>Selected range</h2>\n");
        html.push_str(&Self::table_preview(content.filtered, content.preview_rows));

        for (report, chart) in content.reports.iter().zip(content.charts) {
            html.push_str(&format!(
                "<section id=\"q{n}\">\n<p><strong>Question {n}:</strong> {label}</p>\n<img src=\"{src}\" alt=\"{alt}\">\n</section>\n",
                n = report.number,
                label = escape(&report.label),
                src = escape(chart),
                alt = escape(&report.chart.title),
            ));
        }

        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    fn sidebar(content: &PageContent<'_>) -> String {
        let logo = content
            .logo
            .map(|src| format!("<img src=\"{}\" alt=\"logo\">\n", escape(src)))
            .unwrap_or_default();
        format!(
            "<aside>\n{logo}<h3>Date range</h3>\n<p>{start} &ndash; {end}</p>\n<p><small>available: {min} &ndash; {max}</small></p>\n</aside>\n",
            start = content.start,
            end = content.end,
            min = content.bounds.min,
            max = content.bounds.max,
        )
    }

    /// First `rows` rows of `df` as an HTML table, with a row count caption.
    pub fn table_preview(df: &DataFrame, rows: usize) -> String {
        let shown = df.height().min(rows);
        let mut html = format!(
            "<table>\n<caption>{} of {} rows, {} columns</caption>\n<tr>",
            shown,
            df.height(),
            df.width()
        );
        for name in df.get_column_names() {
            html.push_str(&format!("<th>{}</th>", escape(name)));
        }
        html.push_str("</tr>\n");

        for i in 0..shown {
            html.push_str("<tr>");
            for column in df.get_columns() {
                let cell = column
                    .get(i)
                    .map(|v| {
                        if v.is_null() {
                            String::new()
                        } else {
                            v.to_string().trim_matches('"').to_string()
                        }
                    })
                    .unwrap_or_default();
                html.push_str(&format!("<td>{}</td>", escape(&cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
        html
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportScope;
    use crate::report::{build_report, Question};

    fn frame() -> DataFrame {
        df!(
            "season" => [1i64, 2, 3],
            "total_rentals" => [Some(10i64), None, Some(30)]
        )
        .unwrap()
    }

    #[test]
    fn preview_limits_rows_and_blanks_nulls() {
        let html = DashboardPage::table_preview(&frame(), 2);
        assert!(html.contains("<caption>2 of 3 rows, 2 columns</caption>"));
        assert!(html.contains("<th>season</th><th>total_rentals</th>"));
        assert!(html.contains("<tr><td>1</td><td>10</td></tr>"));
        assert!(html.contains("<tr><td>2</td><td></td></tr>"));
        assert!(!html.contains("<td>30</td>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn page_lists_questions_with_charts() {
        let df = frame();
        let report = build_report(Question::Season, ReportScope::Full, &df).unwrap();
        let date = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
        let charts = vec!["q1_season.png".to_string()];
        let html = DashboardPage::render_html(&PageContent {
            bounds: DateBounds { min: date, max: date },
            start: date,
            end: date,
            logo: Some("logo.jpg"),
            full: &df,
            filtered: &df,
            preview_rows: 5,
            reports: std::slice::from_ref(&report),
            charts: &charts,
        });
        assert!(html.contains("<strong>Question 1:</strong> How does the season affect"));
        assert!(html.contains("<img src=\"q1_season.png\""));
        assert!(html.contains("<img src=\"logo.jpg\" alt=\"logo\">"));
        assert!(html.contains("2011-01-01 &ndash; 2011-01-01"));
    }
}
