//! Cell styling for the sales summary sheet.
//!
//! Styles are worked out here as plain data so the rules can be tested
//! without opening a workbook; [`crate::report`] only copies them onto cells.

use crate::summary::SummaryRow;

/// Product-code cell fill per leather type, as `0xRRGGBB`.
pub const LEATHER_FILLS: [(&str, u32); 5] = [
    ("BRI", 0xEB_F1DE),
    ("VIN BR", 0xCC_C0DA),
    ("NATUR", 0xFD_E9D9),
    ("VTC BADALASSI", 0xDD_D9C4),
    ("BADALASSI", 0xFA_BF8F),
];

/// Font size of the product code, color name and price data cells.
pub const SMALL_FONT: u8 = 9;

/// Number of fixed columns before the month columns.
pub const LEADING_COLUMNS: usize = 4;

const CODE: usize = 0;
const NAME: usize = 1;
const COLOR_NAME: usize = 2;
const PRICE: usize = 3;

/// Which sides of a cell carry a thin border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Borders {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

/// Formatting for one cell. The default is an unformatted cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub fill: Option<u32>,
    pub font_size: Option<u8>,
    pub bold: bool,
    pub borders: Borders,
}

impl CellStyle {
    #[must_use]
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Styles for the header row and every data row, cell by cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    pub header: Vec<CellStyle>,
    pub rows: Vec<Vec<CellStyle>>,
}

/// Returns the fill for a product-code cell of `leather_type`, if it has one.
#[must_use]
pub fn leather_fill(leather_type: &str) -> Option<u32> {
    LEATHER_FILLS
        .iter()
        .find(|(t, _)| *t == leather_type)
        .map(|&(_, rgb)| rgb)
}

/// Works out cell styles for `rows` of a summary with `months` month
/// columns.
///
/// Every data cell gets left and right borders. A row whose product code is
/// present and differs from the code above it (the header text, for the
/// first row) gets a top border across the whole row, so each product
/// family opens with a rule; rows blanked by duplicate suppression never
/// start one. The last row gets a bottom border.
#[must_use]
pub fn build(rows: &[SummaryRow], months: usize) -> Presentation {
    let width = LEADING_COLUMNS + months + 1;
    let total = width - 1;

    let mut header = vec![CellStyle::default(); width];
    header[NAME].bold = true;
    header[total].bold = true;

    let mut previous_code: Option<&str> = Some("Product Code");
    let mut styled: Vec<Vec<CellStyle>> = rows
        .iter()
        .map(|row| {
            let code = row.product_code.as_deref();
            let opens_group = code.is_some() && code != previous_code;
            previous_code = code;

            let mut cells = vec![
                CellStyle {
                    borders: Borders {
                        top: opens_group,
                        left: true,
                        right: true,
                        bottom: false,
                    },
                    ..CellStyle::default()
                };
                width
            ];
            cells[CODE].fill = leather_fill(&row.leather_type);
            for col in [CODE, COLOR_NAME, PRICE] {
                cells[col].font_size = Some(SMALL_FONT);
            }
            cells[NAME].bold = true;
            cells[total].bold = true;
            cells
        })
        .collect();

    if let Some(last) = styled.last_mut() {
        for cell in last {
            cell.borders.bottom = true;
        }
    }
    Presentation {
        header,
        rows: styled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: Option<&str>, leather: &str) -> SummaryRow {
        SummaryRow {
            product_code: code.map(str::to_string),
            leather_type: leather.to_string(),
            quantities: vec![0, 0],
            ..SummaryRow::default()
        }
    }

    fn tops(p: &Presentation) -> Vec<bool> {
        p.rows.iter().map(|cells| cells[0].borders.top).collect()
    }

    #[test]
    fn build_fn_puts_top_borders_at_code_changes() {
        let rows = vec![
            row(Some("71001234"), "BRI"),
            row(None, "BRI"),
            row(Some("71001234"), "BRI"),
            row(Some("71005678"), "NATUR"),
            row(Some("71005678"), "NATUR"),
        ];
        let p = build(&rows, 2);
        assert_eq!(tops(&p), vec![true, false, true, true, false]);
        for cells in &p.rows {
            assert_eq!(cells.len(), 7);
            assert!(cells.iter().all(|c| c.borders.left && c.borders.right));
            assert!(cells.iter().all(|c| c.borders.top == cells[0].borders.top));
        }
    }

    #[test]
    fn build_fn_borders_the_bottom_of_the_last_row_only() {
        let rows = vec![row(Some("A"), "other"), row(Some("B"), "other")];
        let p = build(&rows, 2);
        assert!(p.rows[0].iter().all(|c| !c.borders.bottom));
        assert!(p.rows[1].iter().all(|c| c.borders.bottom));
    }

    #[test]
    fn build_fn_fills_code_cells_by_leather_type() {
        let rows = vec![row(Some("A"), "BADALASSI"), row(Some("B"), "BR/RUS")];
        let p = build(&rows, 0);
        assert_eq!(p.rows[0][0].fill, Some(0xFA_BF8F));
        assert_eq!(p.rows[0][1].fill, None);
        assert_eq!(p.rows[1][0].fill, None);
    }

    #[test]
    fn build_fn_sets_fonts_and_bold_columns() {
        let p = build(&[row(Some("A"), "other")], 2);
        let cells = &p.rows[0];
        let sizes: Vec<_> = cells.iter().map(|c| c.font_size).collect();
        assert_eq!(sizes, vec![Some(9), None, Some(9), Some(9), None, None, None]);
        let bold: Vec<_> = cells.iter().map(|c| c.bold).collect();
        assert_eq!(bold, vec![false, true, false, false, false, false, true]);

        let header_bold: Vec<_> = p.header.iter().map(|c| c.bold).collect();
        assert_eq!(header_bold, vec![false, true, false, false, false, false, true]);
        assert!(p.header.iter().all(|c| c.borders == Borders::default()));
    }

    #[test]
    fn build_fn_handles_an_empty_summary() {
        let p = build(&[], 0);
        assert_eq!(p.header.len(), 5);
        assert!(p.rows.is_empty());
    }
}
