use crate::error::Result;
use crate::models::header::HeaderSchema;
use crate::models::question::QuestionRecord;
use crate::services::header_matcher::HeaderMatcher;
use rust_xlsxwriter::*;
use serde_json::Value as JsonValue;

pub const SHEET_TITLE: &str = "题库（答案请直接导入）";
pub const EXPORT_FILENAME: &str = "exam_questions.xlsx";

const FONT_NAME: &str = "宋体";
const FONT_SIZE: f64 = 11.0;
const HEADER_ROW_HEIGHT: f64 = 40.0;
const DATA_ROW_HEIGHT: f64 = 30.0;

/// Longest text Excel accepts in one cell, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// A single rendered cell of the question sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<Option<&JsonValue>> for CellValue {
    fn from(value: Option<&JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => CellValue::Blank,
            Some(JsonValue::String(s)) => CellValue::Text(clip_cell_text(s.clone())),
            Some(JsonValue::Bool(b)) => CellValue::Bool(*b),
            Some(JsonValue::Number(n)) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            Some(other) => CellValue::Text(clip_cell_text(other.to_string())),
        }
    }
}

// Oversized text is cut on a char boundary instead of failing the export.
fn clip_cell_text(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_CELL_CHARS) {
        tracing::warn!(
            chars = text.chars().count(),
            "Cell text exceeds Excel's limit, truncating"
        );
        text.truncate(cut);
    }
    text
}

pub struct ExportService;

impl ExportService {
    /// Cell matrix for the data rows: one row per record, one cell per
    /// canonical column, in schema order.
    pub fn build_grid(schema: &HeaderSchema, records: &[QuestionRecord]) -> Vec<Vec<CellValue>> {
        let matcher = HeaderMatcher::new(schema);
        records
            .iter()
            .map(|record| {
                schema
                    .labels()
                    .map(|label| CellValue::from(matcher.resolve(label, record)))
                    .collect()
            })
            .collect()
    }

    /// Generate the question-bank workbook.
    pub fn generate_questions_xlsx(
        schema: &HeaderSchema,
        records: &[QuestionRecord],
    ) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_TITLE)?;

        let header_format = Format::new()
            .set_font_name(FONT_NAME)
            .set_font_size(FONT_SIZE)
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_background_color(Color::RGB(0xB4C7E7));

        let cell_format = Format::new()
            .set_font_name(FONT_NAME)
            .set_font_size(FONT_SIZE)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin);

        for (col, column) in schema.columns().iter().enumerate() {
            worksheet.set_column_width(col as u16, column.width)?;
        }

        worksheet.set_row_height(0, HEADER_ROW_HEIGHT)?;
        for (col, label) in schema.labels().enumerate() {
            worksheet.write_string_with_format(0, col as u16, label, &header_format)?;
        }

        for (idx, cells) in Self::build_grid(schema, records).iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.set_row_height(row, DATA_ROW_HEIGHT)?;

            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Blank => {
                        // Blank cells still carry the border.
                        worksheet.write_blank(row, col, &cell_format)?;
                    }
                    CellValue::Text(text) => {
                        worksheet.write_string_with_format(row, col, text, &cell_format)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number_with_format(row, col, *n, &cell_format)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean_with_format(row, col, *b, &cell_format)?;
                    }
                }
            }
        }

        tracing::info!(questions = records.len(), "Question workbook generated");

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
