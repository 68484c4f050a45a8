use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use tracing::info;

use std::{fmt::Display, path::Path};

use crate::{
    error::Result,
    presentation::{CellStyle, LEADING_COLUMNS},
    summary::{SalesSummary, SummaryRow},
};

/// Name of the worksheet the summary is written to.
pub const SUMMARY_SHEET: &str = "Sales Summary";

fn text_cells(row: &SummaryRow) -> Vec<String> {
    let text = |s: &Option<String>| s.clone().unwrap_or_default();
    let mut cells = vec![
        text(&row.product_code),
        text(&row.product_name),
        text(&row.color_name),
        row.price.map(|p| p.to_string()).unwrap_or_default(),
    ];
    cells.extend(row.quantities.iter().map(i64::to_string));
    cells.push(row.total.to_string());
    cells
}

/// Prints the summary as a plain-text table, followed by the column totals
/// and any ledger codes missing from the product master.
impl Display for SalesSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers = self.headers();
        let rows: Vec<Vec<String>> = self.rows.iter().map(text_cells).collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .map(|cells| cells[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();
        let line = |f: &mut std::fmt::Formatter<'_>, cells: &[String]| -> std::fmt::Result {
            for (i, (cell, &width)) in cells.iter().zip(&widths).enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                if i < LEADING_COLUMNS - 1 {
                    write!(f, "{cell:width$}")?;
                } else {
                    write!(f, "{cell:>width$}")?;
                }
            }
            writeln!(f)
        };

        line(f, &headers)?;
        let length = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        writeln!(f, "{:-<length$}", "")?;
        for cells in &rows {
            line(f, cells)?;
        }
        writeln!(f, "{:-<length$}", "")?;

        let mut totals = vec![String::new(); LEADING_COLUMNS];
        totals[0] = "Total".to_string();
        totals.extend((0..self.months.len()).map(|m| {
            self.rows
                .iter()
                .map(|r| r.quantities[m])
                .sum::<i64>()
                .to_string()
        }));
        totals.push(self.rows.iter().map(|r| r.total).sum::<i64>().to_string());
        line(f, &totals)?;

        if !self.unmatched.is_empty() {
            writeln!(f, "Not in product master: {}", self.unmatched.join(", "))?;
        }
        Ok(())
    }
}

/// Converts a cell style into a workbook format.
fn format_for(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if let Some(rgb) = style.fill {
        format = format
            .set_background_color(Color::RGB(rgb))
            .set_pattern(FormatPattern::Solid);
    }
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }
    if style.bold {
        format = format.set_bold();
    }
    let borders = style.borders;
    if borders.top {
        format = format.set_border_top(FormatBorder::Thin);
    }
    if borders.bottom {
        format = format.set_border_bottom(FormatBorder::Thin);
    }
    if borders.left {
        format = format.set_border_left(FormatBorder::Thin);
    }
    if borders.right {
        format = format.set_border_right(FormatBorder::Thin);
    }
    format
}

fn write_text(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
    format: &Format,
) -> Result<()> {
    match value {
        Some(text) => sheet.write_string_with_format(row, col, text, format)?,
        None => sheet.write_blank(row, col, format)?,
    };
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn write_count(sheet: &mut Worksheet, row: u32, col: u16, value: Option<i64>, format: &Format) -> Result<()> {
    match value {
        Some(n) => sheet.write_number_with_format(row, col, n as f64, format)?,
        None => sheet.write_blank(row, col, format)?,
    };
    Ok(())
}

/// Writes `summary` to a new workbook at `path`, applying its presentation
/// styles cell by cell.
///
/// # Errors
///
/// Returns any errors from building or saving the workbook.
#[allow(clippy::cast_possible_truncation)]
pub fn write_summary(summary: &SalesSummary, path: impl AsRef<Path>) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;

    let styles = &summary.presentation;
    for (col, heading) in summary.headers().iter().enumerate() {
        let style = styles.header.get(col).copied().unwrap_or_default();
        sheet.write_string_with_format(0, col as u16, heading, &format_for(&style))?;
    }

    for (i, row) in summary.rows.iter().enumerate() {
        let r = i as u32 + 1;
        let cell_styles = styles.rows.get(i).map(Vec::as_slice).unwrap_or_default();
        let format = |col: usize| format_for(&cell_styles.get(col).copied().unwrap_or_default());

        write_text(sheet, r, 0, row.product_code.as_deref(), &format(0))?;
        write_text(sheet, r, 1, row.product_name.as_deref(), &format(1))?;
        write_text(sheet, r, 2, row.color_name.as_deref(), &format(2))?;
        write_count(sheet, r, 3, row.price.map(|p| p.amount()), &format(3))?;
        for (m, &qty) in row.quantities.iter().enumerate() {
            let col = LEADING_COLUMNS + m;
            write_count(sheet, r, col as u16, Some(qty), &format(col))?;
        }
        let col = LEADING_COLUMNS + row.quantities.len();
        write_count(sheet, r, col as u16, Some(row.total), &format(col))?;
    }

    sheet.set_column_width(0, 14)?;
    sheet.set_column_width(1, 32)?;
    sheet.set_column_width(2, 14)?;
    workbook.save(path.as_ref())?;
    info!(
        path = %path.as_ref().display(),
        rows = summary.rows.len(),
        "wrote sales summary"
    );
    Ok(())
}
