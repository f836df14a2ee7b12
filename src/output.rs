use std::io::Write;

use colored::Colorize;

use crate::advisory::DisplayAdvisory;

const TABLE_TITLE: &str = "AIX/VIOS Security Advisories";
const HEADERS: [&str; 7] = ["Issued", "Updated", "Abstract", "URL", "Reboot", "CVE", "CVSS"];
const COLUMN_GAP: &str = "  ";

pub trait OutputFormatter {
    fn write_results(
        &self,
        advisories: &[DisplayAdvisory],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// One padded fragment of a table cell. High-severity CVSS scores are the
/// only fragments that carry the highlight.
struct CellLine {
    text: String,
    highlight: bool,
}

impl CellLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: false,
        }
    }
}

/// A table row. The CVE and CVSS columns stack one line per entry; the
/// other columns occupy the first line only.
fn row_cells(advisory: &DisplayAdvisory) -> [Vec<CellLine>; 7] {
    let mut cve_lines = Vec::new();
    let mut score_lines = Vec::new();
    for entry in &advisory.cvss_entries {
        cve_lines.push(CellLine::plain(entry.cve_id.clone()));
        score_lines.push(CellLine {
            text: entry.score.to_string(),
            highlight: entry.score.is_high(),
        });
    }

    [
        vec![CellLine::plain(advisory.issued_display())],
        vec![CellLine::plain(advisory.updated_display.clone())],
        vec![CellLine::plain(advisory.abstract_text.clone())],
        vec![CellLine::plain(advisory.url.clone())],
        vec![CellLine::plain(advisory.reboot.clone())],
        cve_lines,
        score_lines,
    ]
}

pub struct TableOutput;

impl OutputFormatter for TableOutput {
    fn write_results(
        &self,
        advisories: &[DisplayAdvisory],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let rows: Vec<[Vec<CellLine>; 7]> = advisories.iter().map(row_cells).collect();

        let mut widths: [usize; 7] = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                for line in cell {
                    *width = (*width).max(line.text.chars().count());
                }
            }
        }

        writeln!(writer, "{TABLE_TITLE}")?;
        writeln!(writer)?;

        let header: Vec<String> = HEADERS
            .iter()
            .zip(widths)
            .map(|(h, w)| format!("{h:<w$}"))
            .collect();
        writeln!(writer, "{}", header.join(COLUMN_GAP).trim_end())?;
        write_rule(writer, &widths)?;

        for row in &rows {
            let height = row.iter().map(Vec::len).max().unwrap_or(1);
            for line_idx in 0..height {
                let mut fields = Vec::with_capacity(7);
                for (cell, width) in row.iter().zip(widths.iter()) {
                    match cell.get(line_idx) {
                        Some(line) => fields.push(pad(line, *width)),
                        None => fields.push(" ".repeat(*width)),
                    }
                }
                writeln!(writer, "{}", fields.join(COLUMN_GAP).trim_end())?;
            }
            write_rule(writer, &widths)?;
        }
        Ok(())
    }
}

fn write_rule(writer: &mut dyn Write, widths: &[usize; 7]) -> std::io::Result<()> {
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", rule.join(COLUMN_GAP))
}

// Pad before colouring so escape codes do not skew the column width.
fn pad(line: &CellLine, width: usize) -> String {
    let chars = line.text.chars().count();
    let padding = " ".repeat(width.saturating_sub(chars));
    if line.highlight {
        format!("{}{padding}", line.text.as_str().red())
    } else {
        format!("{}{padding}", line.text)
    }
}

/// Prints only the chosen URL per advisory, one per line.
pub struct UrlOutput;

impl OutputFormatter for UrlOutput {
    fn write_results(
        &self,
        advisories: &[DisplayAdvisory],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for advisory in advisories {
            writeln!(writer, "{}", advisory.url)?;
        }
        Ok(())
    }
}

pub struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn write_results(
        &self,
        advisories: &[DisplayAdvisory],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, advisories)?;
        writeln!(writer)?;
        Ok(())
    }
}

pub fn formatter(urls_only: bool, json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput)
    } else if urls_only {
        Box::new(UrlOutput)
    } else {
        Box::new(TableOutput)
    }
}
