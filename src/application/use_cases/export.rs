// ============================================================
// DASHBOARD EXPORT
// ============================================================
// Render the current dashboard view as one sectioned CSV document

use chrono::NaiveDateTime;
use csv::WriterBuilder;

use crate::domain::dashboard::{ChartData, DashboardData, DashboardFilter};
use crate::domain::error::{AppError, Result};
use crate::domain::website::Website;

pub const EXPORT_TOP_WORDS: i64 = 20;
pub const EXPORT_DETAIL_ROWS: i64 = 1000;

pub fn export_file_name(generated_at: NaiveDateTime) -> String {
    format!(
        "siteimprove_dashboard_export_{}.csv",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

type SectionWriter<'a> = csv::Writer<&'a mut Vec<u8>>;

/// Sections are separated by a blank line; rows vary in width
pub fn export_dashboard_csv(
    data: &DashboardData,
    filter: &DashboardFilter,
    websites: &[Website],
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>> {
    let website_names: Vec<&str> = websites
        .iter()
        .filter(|w| filter.website_ids.contains(&w.id))
        .map(|w| w.name.as_str())
        .collect();
    let report_types: Vec<&str> = filter.report_types.iter().map(|t| t.as_str()).collect();
    let stats = &data.summary_stats;

    let mut out = Vec::new();

    write_section(&mut out, |w| {
        w.write_record(["Siteimprove Misspellings Dashboard Export"])?;
        w.write_record([
            "Generated".to_string(),
            generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Filters"])?;
        w.write_record(["Websites".to_string(), website_names.join("; ")])?;
        w.write_record(["Report types".to_string(), report_types.join("; ")])?;
        w.write_record([
            "Date range".to_string(),
            format!("{} to {}", filter.start, filter.end),
        ])
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Summary", "Value"])?;
        for (name, value) in [
            ("Total Reports", stats.total_reports),
            ("Total Misspellings", stats.total_misspellings),
            ("Total Words to Review", stats.total_words_to_review),
            ("Total Pages Affected", stats.total_pages_affected),
        ] {
            w.write_record([name.to_string(), value.to_string()])?;
        }
        Ok(())
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Trends"])?;
        write_chart(w, &data.trend_data, "Date", "No trend data available")
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Top Words"])?;
        write_chart(w, &data.top_words, "Word", "No top words data available")
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Language Distribution"])?;
        write_chart(
            w,
            &data.language_distribution,
            "Language",
            "No language data available",
        )
    })?;

    write_section(&mut out, |w| {
        w.write_record(["Detailed Data"])?;
        if data.detailed_data.data.is_empty() {
            return w.write_record(["No detailed data available"]);
        }
        w.write_record([
            "Type",
            "Word",
            "Suggestion",
            "Language",
            "First Detected",
            "Pages",
            "Probability",
            "Website",
            "Report Date",
        ])?;
        for row in &data.detailed_data.data {
            w.write_record([
                row.kind.clone(),
                row.word.clone(),
                row.suggestion.clone().unwrap_or_default(),
                row.language.clone().unwrap_or_default(),
                format_date(row.first_detected),
                row.pages.map(|p| p.to_string()).unwrap_or_default(),
                row.probability.clone().unwrap_or_default(),
                row.website.clone(),
                format_date(row.report_date),
            ])?;
        }
        Ok(())
    })?;

    // No separator after the last section
    out.pop();
    Ok(out)
}

/// Writes one section followed by an empty line.
/// The blank is pushed by hand: a record with one empty field is written as `""`
fn write_section<F>(out: &mut Vec<u8>, write: F) -> Result<()>
where
    F: FnOnce(&mut SectionWriter<'_>) -> csv::Result<()>,
{
    {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(&mut *out);
        write(&mut writer)
            .map_err(|e| AppError::Internal(format!("Failed to write export: {}", e)))?;
        writer.flush()?;
    }
    out.push(b'\n');
    Ok(())
}

/// Labels down the first column, one column per dataset
fn write_chart(
    writer: &mut SectionWriter<'_>,
    chart: &ChartData,
    label_header: &str,
    empty_message: &str,
) -> csv::Result<()> {
    if chart.labels.is_empty() || chart.datasets.is_empty() {
        return writer.write_record([empty_message]);
    }

    let mut header = vec![label_header.to_string()];
    header.extend(
        chart
            .datasets
            .iter()
            .map(|d| d.label.clone().unwrap_or_else(|| "Count".to_string())),
    );
    writer.write_record(&header)?;

    for (i, label) in chart.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(
            chart
                .datasets
                .iter()
                .map(|d| d.data.get(i).copied().unwrap_or(0).to_string()),
        );
        writer.write_record(&row)?;
    }
    Ok(())
}

fn format_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
