//! Streaming xlsx writer
//!
//! Materializes one artifact per combination without collecting the result
//! set into an intermediate structure: the header row is written from the
//! schema alone, all data rows are bulk-loaded from the forward-only row
//! source in one streaming pass, and formatting is applied afterwards in one
//! pass over the used range. Interleaving per-row styling with per-row data
//! writes is far slower than bulk load followed by bulk style, so the
//! ordering here is load first, format last.

use crate::adapters::gateway::{CellData, ColumnMeta, RowSource};
use crate::config::schema::{FormatConfig, OutputConfig};
use crate::core::export::cancel::CancelToken;
use crate::domain::{Combination, QuerySpec, WriteError};
use crate::writer::name::artifact_file_name;
use crate::writer::pool::{border_style, WorkbookPool};
use crate::writer::{ArtifactWriter, WriteReport};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Timelike};
use futures::StreamExt;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use umya_spreadsheet::{NumberingFormat, Spreadsheet, Worksheet};

/// Streaming writer backed by the workbook pool
pub struct SheetWriter {
    pool: Arc<WorkbookPool>,
    output: OutputConfig,
    format: FormatConfig,
    // Cancellation is observed once per this many data rows.
    cancel_check_rows: u64,
}

impl SheetWriter {
    /// Create a writer over a shared workbook pool
    pub fn new(
        pool: Arc<WorkbookPool>,
        output: OutputConfig,
        format: FormatConfig,
        cancel_check_rows: u64,
    ) -> Self {
        Self {
            pool,
            output,
            format,
            cancel_check_rows: cancel_check_rows.max(1),
        }
    }

    /// Stream rows into the worksheet body; returns data rows written
    async fn load_rows(
        &self,
        sheet: &mut Worksheet,
        schema: &[ColumnMeta],
        mut rows: RowSource,
        cancel: &CancelToken,
    ) -> Result<u64, WriteError> {
        // Header row from the schema only; no data has been read yet.
        for (i, column) in schema.iter().enumerate() {
            sheet
                .get_cell_mut((i as u32 + 1, 1))
                .set_value(column.name.clone());
        }

        let text_columns = self.text_column_indices(schema);
        let mut written: u64 = 0;

        while let Some(item) = rows.next().await {
            let cells = item.map_err(|e| WriteError::RowSource(e.to_string()))?;
            written += 1;
            let row = written as u32 + 1;

            for (i, cell) in cells.iter().enumerate() {
                let col = i as u32 + 1;
                let forced_text = text_columns.contains(&col);
                write_cell(sheet, col, row, cell, forced_text);
            }

            if written % self.cancel_check_rows == 0 && cancel.is_cancelled() {
                return Err(WriteError::Interrupted);
            }
        }

        Ok(written)
    }

    /// Single formatting pass over the used range, after the body is loaded
    fn apply_formatting(
        &self,
        sheet: &mut Worksheet,
        schema: &[ColumnMeta],
        data_rows: u64,
    ) -> Result<(), WriteError> {
        let columns = schema.len() as u32;
        let last_row = data_rows as u32 + 1;
        let header_fill = self.pool.argb(&self.format.header_fill)?;
        let border = border_style(&self.format.header_border);
        let date_columns = self.date_column_indices(schema);
        let text_columns = self.text_column_indices(schema);

        for row in 1..=last_row {
            for col in 1..=columns {
                let style = sheet.get_style_mut((col, row));

                style.get_font_mut().set_name(self.format.font_name.clone());
                style.get_font_mut().set_size(self.format.font_size);

                if row == 1 {
                    style.set_background_color(header_fill.clone());
                    style.get_font_mut().set_bold(true);
                    let borders = style.get_borders_mut();
                    borders.get_top_mut().set_border_style(border);
                    borders.get_bottom_mut().set_border_style(border);
                    borders.get_left_mut().set_border_style(border);
                    borders.get_right_mut().set_border_style(border);
                } else if date_columns.contains(&col) {
                    style
                        .get_number_format_mut()
                        .set_format_code(self.format.date_format.clone());
                } else if text_columns.contains(&col) {
                    style
                        .get_number_format_mut()
                        .set_format_code(NumberingFormat::FORMAT_TEXT);
                }

                if self.format.wrap_text && row > 1 {
                    style.get_alignment_mut().set_wrap_text(true);
                }
            }
        }

        if self.format.autosize {
            self.autosize_columns(sheet, columns, data_rows);
        }

        Ok(())
    }

    // Width from a bounded sample of rows; sizing the full body of a large
    // artifact costs more than it is worth.
    fn autosize_columns(&self, sheet: &mut Worksheet, columns: u32, data_rows: u64) {
        let sample_rows = (self.format.autosize_sample_rows as u64).min(data_rows) as u32;

        for col in 1..=columns {
            let mut widest = sheet.get_value((col, 1)).chars().count();
            for row in 2..=(sample_rows + 1) {
                widest = widest.max(sheet.get_value((col, row)).chars().count());
            }
            let width = ((widest as f64) * 1.1).clamp(8.0, 60.0);
            sheet
                .get_column_dimension_mut(&column_letter(col))
                .set_width(width);
        }
    }

    fn date_column_indices(&self, schema: &[ColumnMeta]) -> HashSet<u32> {
        column_indices(schema, &self.format.date_columns)
    }

    fn text_column_indices(&self, schema: &[ColumnMeta]) -> HashSet<u32> {
        column_indices(schema, &self.format.text_columns)
    }
}

#[async_trait]
impl ArtifactWriter for SheetWriter {
    async fn write(
        &self,
        combination: &Combination,
        query: &QuerySpec,
        schema: &[ColumnMeta],
        rows: RowSource,
        cancel: &CancelToken,
    ) -> Result<WriteReport, WriteError> {
        let started = Instant::now();

        std::fs::create_dir_all(&self.output.directory)
            .map_err(|e| WriteError::OutputDirectory(format!("{}: {e}", self.output.directory)))?;

        let mut book = self.pool.acquire();
        let result = self
            .populate(&mut book, combination, query, schema, rows, cancel)
            .await;
        // Workbooks go back dirty; acquire resets before reuse.
        let rows_written = match result {
            Ok(rows_written) => rows_written,
            Err(e) => {
                self.pool.release(book);
                return Err(e);
            }
        };

        let file_name = artifact_file_name(
            &self.output.file_prefix,
            query,
            combination,
            Local::now().naive_local(),
        );
        let path = PathBuf::from(&self.output.directory).join(file_name);

        let persisted = umya_spreadsheet::writer::xlsx::write(&book, &path)
            .map_err(|e| WriteError::Io(format!("{}: {e}", path.display())));
        self.pool.release(book);
        persisted?;

        tracing::debug!(
            sequence = combination.sequence,
            rows = rows_written,
            path = %path.display(),
            "Artifact written"
        );

        Ok(WriteReport {
            rows_written,
            elapsed: started.elapsed(),
            path,
        })
    }
}

impl SheetWriter {
    async fn populate(
        &self,
        book: &mut Spreadsheet,
        combination: &Combination,
        _query: &QuerySpec,
        schema: &[ColumnMeta],
        rows: RowSource,
        cancel: &CancelToken,
    ) -> Result<u64, WriteError> {
        let sheet_name = self.output.sheet_name.clone();
        book.new_sheet(&sheet_name)
            .map_err(|e| WriteError::Engine(format!("Failed to create worksheet: {e}")))?;
        let sheet = book
            .get_sheet_by_name_mut(&sheet_name)
            .ok_or_else(|| WriteError::Engine("Worksheet vanished after creation".to_string()))?;

        let rows_written = self.load_rows(sheet, schema, rows, cancel).await?;

        tracing::trace!(
            sequence = combination.sequence,
            rows = rows_written,
            "Body loaded, applying formatting"
        );

        self.apply_formatting(sheet, schema, rows_written)?;
        Ok(rows_written)
    }
}

fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, cell: &CellData, forced_text: bool) {
    let target = sheet.get_cell_mut((col, row));
    match cell {
        CellData::Null => {}
        CellData::Text(v) => {
            if forced_text {
                // Preserves significant leading zeros and code-like values.
                target.set_value_string(v.clone());
            } else {
                target.set_value(v.clone());
            }
        }
        CellData::Int(v) => {
            if forced_text {
                target.set_value_string(v.to_string());
            } else {
                target.set_value_number(*v as f64);
            }
        }
        CellData::Float(v) => {
            target.set_value_number(*v);
        }
        CellData::Bool(v) => {
            target.set_value_bool(*v);
        }
        CellData::Date(v) => {
            target.set_value_number(excel_serial_date(*v));
        }
        CellData::Timestamp(v) => {
            let fraction = v.time().num_seconds_from_midnight() as f64 / 86_400.0;
            target.set_value_number(excel_serial_date(v.date()) + fraction);
        }
    }
}

// Serial day count from the 1900 epoch as xlsx expects it.
fn excel_serial_date(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("fixed epoch");
    (date - epoch).num_days() as f64
}

fn column_indices(schema: &[ColumnMeta], names: &[String]) -> HashSet<u32> {
    schema
        .iter()
        .enumerate()
        .filter(|(_, c)| names.iter().any(|n| n.eq_ignore_ascii_case(&c.name)))
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII column letters")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn test_excel_serial_date() {
        assert_eq!(
            excel_serial_date(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()),
            2.0
        );
        assert_eq!(
            excel_serial_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            45658.0
        );
    }

    #[test]
    fn test_column_indices_case_insensitive() {
        let schema = vec![
            ColumnMeta {
                name: "trade_date".to_string(),
            },
            ColumnMeta {
                name: "Port".to_string(),
            },
        ];
        let indices = column_indices(&schema, &["PORT".to_string()]);
        assert!(indices.contains(&2));
        assert!(!indices.contains(&1));
    }
}
