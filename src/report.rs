use crate::error::ScanError;
use crate::types::ScanReport;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use std::io::{self, Write};

#[must_use]
pub fn build_table(report: &ScanReport) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::ASCII_HORIZONTAL_ONLY);
    table.set_header(vec!["File", "Size (KB)"]);

    for record in &report.displayed {
        table.add_row(vec![
            Cell::new(record.relative_path.display()),
            Cell::new(format!("{:.1}", record.size_kb)),
        ]);
    }

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn render_report(report: &ScanReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        "Scanning:".cyan(),
        report.root_resolved.display()
    )?;
    writeln!(out, "Found {} text files:", report.total_files_found)?;
    writeln!(out)?;

    writeln!(out, "{}", build_table(report))?;

    writeln!(out, "Displayed files: {}", report.displayed.len())?;
    writeln!(out, "Total size: {:.1} KB", report.total_displayed_size_kb)?;

    if !report.skipped.is_empty() {
        writeln!(
            out,
            "{}",
            format!("Skipped entries: {}", report.skipped.len()).yellow()
        )?;
    }
    if report.cancelled {
        writeln!(out, "{}", "Scan cancelled; results are partial.".yellow())?;
    }
    writeln!(out)
}

pub fn render_error(err: &ScanError, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", err.to_string().red())
}
