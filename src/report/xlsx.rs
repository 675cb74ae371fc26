//! Spreadsheet exports: one worksheet, bold header row, fixed column widths

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, Workbook, Worksheet, XlsxError};

use crate::{
    error::{AppError, AppResult},
    models::{activity::ActivityWithTools, tool::ToolView},
    report::format_date_short,
};

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const TOOL_COLUMNS: [(&str, f64); 6] = [
    ("Kode Alat", 14.0),
    ("Nama Alat", 30.0),
    ("Merk", 20.0),
    ("Jam Maksimal", 14.0),
    ("Sisa Jam", 12.0),
    ("Kondisi", 14.0),
];

const ACTIVITY_COLUMNS: [(&str, f64); 6] = [
    ("Nama Kegiatan", 30.0),
    ("Deskripsi", 40.0),
    ("Tanggal", 12.0),
    ("Operator", 22.0),
    ("Peralatan", 36.0),
    ("Jam Pakai", 10.0),
];

impl From<XlsxError> for AppError {
    fn from(e: XlsxError) -> Self {
        AppError::Internal(format!("Failed to build spreadsheet: {}", e))
    }
}

fn write_header(sheet: &mut Worksheet, columns: &[(&str, f64)]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, (title, width)) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, *width)?;
        sheet.write_string_with_format(0, col, *title, &bold)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn excel_date(date: NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

/// Tools worksheet: code, name, brand, max hours, remaining hours, condition
pub fn tools_workbook(tools: &[ToolView]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Peralatan")?;
        write_header(sheet, &TOOL_COLUMNS)?;

        for (index, view) in tools.iter().enumerate() {
            let row = index as u32 + 1;
            let t = &view.tool;
            sheet.write_string(row, 0, t.tool_code.as_str())?;
            sheet.write_string(row, 1, t.name.as_str())?;
            sheet.write_string(row, 2, t.brand.as_str())?;
            sheet.write_number(row, 3, f64::from(t.max_hour_usage))?;
            sheet.write_number(row, 4, view.remaining_hours as f64)?;
            sheet.write_string(row, 5, t.condition.label())?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// Activities worksheet: name, description, date, operator, tool names, hours
pub fn activities_workbook(activities: &[ActivityWithTools]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    {
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let sheet = workbook.add_worksheet();
        sheet.set_name("Kegiatan")?;
        write_header(sheet, &ACTIVITY_COLUMNS)?;

        for (index, item) in activities.iter().enumerate() {
            let row = index as u32 + 1;
            let a = &item.activity;
            sheet.write_string(row, 0, a.name.as_str())?;
            sheet.write_string(row, 1, a.description.as_str())?;
            match excel_date(a.date) {
                Some(date) => sheet.write_datetime_with_format(row, 2, &date, &date_format)?,
                // Excel dates start in 1900
                None => sheet.write_string(row, 2, format_date_short(a.date))?,
            };
            sheet.write_string(row, 3, a.operator_name.as_str())?;
            sheet.write_string(row, 4, item.tool_names())?;
            sheet.write_number(row, 5, f64::from(a.tool_usage))?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::{
        models::tool::ToolUsage,
        report::sort::tests::activity,
        usage::{self, tests::{charge, tool}},
    };

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn assert_in_order(xml: &str, texts: &[&str]) {
        let mut from = 0;
        for text in texts {
            let tag = format!("<t>{}</t>", text);
            let at = xml[from..].find(&tag).unwrap_or_else(|| panic!("{} missing or out of order", text));
            from += at + tag.len();
        }
    }

    #[test]
    fn test_tools_workbook() {
        let tools = vec![
            usage::summarize(&ToolUsage::new(tool("EXC-01", "Excavator", "Komatsu", 2000), vec![charge("K1", 10)])),
            usage::summarize(&ToolUsage::new(tool("GEN-01", "Genset", "Yamaha", 5), vec![charge("K2", 9)])),
        ];
        let bytes = tools_workbook(&tools).unwrap();

        let strings = part(&bytes, "xl/sharedStrings.xml");
        assert_in_order(&strings, &["Kode Alat", "Nama Alat", "Merk", "Jam Maksimal", "Sisa Jam", "Kondisi"]);
        assert_in_order(&strings, &["EXC-01", "Excavator", "Komatsu", "Baik"]);

        let sheet = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="D2"><v>2000</v></c>"#));
        assert!(sheet.contains(r#"<c r="E2"><v>1990</v></c>"#));
        assert!(sheet.contains(r#"<c r="E3"><v>-4</v></c>"#));
    }

    #[test]
    fn test_activities_workbook_empty_and_filled() {
        let empty = activities_workbook(&[]).unwrap();
        assert_in_order(
            &part(&empty, "xl/sharedStrings.xml"),
            &["Nama Kegiatan", "Deskripsi", "Tanggal", "Operator", "Peralatan", "Jam Pakai"],
        );

        let rows = vec![activity("K1", "Patroli", 2, "Budi", 4)];
        let bytes = activities_workbook(&rows).unwrap();
        assert_in_order(&part(&bytes, "xl/sharedStrings.xml"), &["Patroli", "Budi", "Genset"]);
        assert!(part(&bytes, "xl/worksheets/sheet1.xml").contains(r#"<c r="F2"><v>4</v></c>"#));
    }

    #[test]
    fn test_dates_before_1900_are_written_as_text() {
        let mut row = activity("K1", "Patroli", 2, "Budi", 4);
        row.activity.date = NaiveDate::from_ymd_opt(24, 3, 2).unwrap();

        let bytes = activities_workbook(&[row]).unwrap();
        assert_in_order(&part(&bytes, "xl/sharedStrings.xml"), &["Patroli", "02/03/0024"]);
    }
}
