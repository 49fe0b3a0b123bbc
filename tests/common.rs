// Fixture builders for robot task exports
#![allow(dead_code)]

use std::io::{Cursor, Write};

use chrono::{NaiveDate, NaiveDateTime};
use cleaning_report_normalizer::profiles::UnitSystem;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ADJUSTED_AT: &str = "2024-05-02 17:00:00";

pub fn adjusted_at() -> NaiveDateTime {
    NaiveDateTime::parse_from_str(ADJUSTED_AT, "%Y-%m-%d %H:%M:%S").expect("valid fixture timestamp")
}

/// Headers of a full task export, in the order the console writes them
pub fn export_headers(system: UnitSystem) -> Vec<String> {
    let (area, volume) = match system {
        UnitSystem::Metric => ("㎡", "L"),
        UnitSystem::Imperial => ("ft²", "gal"),
    };

    vec![
        "Robot name".to_string(),
        "S/N".to_string(),
        "Map name".to_string(),
        "Cleaning plan".to_string(),
        "User".to_string(),
        "Task start time".to_string(),
        "End time".to_string(),
        "Task status".to_string(),
        "Task completion (%)".to_string(),
        format!("Actual cleaning area({area})"),
        "Total time".to_string(),
        "Total time (h)".to_string(),
        "Plan running time (s)".to_string(),
        format!("Water usage ({volume})"),
        "Brush (%)".to_string(),
        "Filter (%)".to_string(),
        "Squeegee(%)".to_string(),
        format!("Planned crystallization area ({area})"),
        format!("Actual crystallization area ({area})"),
        format!("Cleaning plan area ({area})"),
        format!("Uncleaned area ({area})"),
        "Start battery level (%)".to_string(),
        "End battery level (%)".to_string(),
        "Receive task report time".to_string(),
        "Task type".to_string(),
        "Task start mode".to_string(),
        "Download link".to_string(),
        format!("Work efficiency ({area}/h)"),
        "Remarks".to_string(),
    ]
}

fn default_value(header: &str) -> &'static str {
    match header {
        "Robot name" => "Scrubber 50",
        "S/N" => "GS100-0001",
        "Map name" => "Level 1",
        "Cleaning plan" => "Lobby",
        "User" => "ops",
        "Task start time" => "2024-05-01 07:00:00",
        "End time" => "2024-05-01 07:45:00",
        "Task status" => "Completed",
        "Task completion (%)" => "100",
        "Total time" => "0:45:00",
        "Total time (h)" => "0.75",
        "Plan running time (s)" => "2700",
        "Brush (%)" => "100.00",
        "Filter (%)" => "0.00",
        "Squeegee(%)" => "87.5",
        "Start battery level (%)" => "90",
        "End battery level (%)" => "60",
        "Receive task report time" => "2024-05-01 08:00:00",
        "Task type" => "Scrubbing",
        "Task start mode" => "Manual",
        "Download link" => "https://reports.example.invalid/task/1",
        "Remarks" => "",
        h if h.starts_with("Actual cleaning area") => "1,250.5",
        h if h.starts_with("Water usage") => "10",
        h if h.contains("crystallization") => "-",
        h if h.starts_with("Cleaning plan area") => "1,300",
        h if h.starts_with("Uncleaned area") => "49.5",
        h if h.starts_with("Work efficiency") => "1,667.33",
        _ => "",
    }
}

/// One export row: defaults for every header, with `overrides` applied
pub fn task_row(headers: &[String], overrides: &[(&str, &str)]) -> Vec<String> {
    headers
        .iter()
        .map(|h| {
            overrides
                .iter()
                .find(|(name, _)| name == h)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| default_value(h).to_string())
        })
        .collect()
}

pub fn to_csv(headers: &[String], rows: &[Vec<String>]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(headers).expect("write header");
        for row in rows {
            writer.write_record(row).expect("write row");
        }
        writer.flush().expect("flush csv");
    }
    out
}

/// CSV export with one row per override set
pub fn export_csv(system: UnitSystem, rows: &[&[(&str, &str)]]) -> Vec<u8> {
    let headers = export_headers(system);
    let rows: Vec<Vec<String>> = rows.iter().map(|o| task_row(&headers, o)).collect();
    to_csv(&headers, &rows)
}

const REPORT_TIME_HEADER: &str = "Receive task report time";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Tasks" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 1 uses the built-in "m/d/yy h:mm" format so calamine reads it as a datetime
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font/></fonts><fills count="1"><fill/></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA
fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii column letters")
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Days since the 1900-system epoch, as Excel stores datetimes
fn excel_serial(value: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid excel epoch");
    (*value - epoch).num_seconds() as f64 / 86_400.0
}

fn sheet_cell(reference: &str, header: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if header == REPORT_TIME_HEADER {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
            return Some(format!(r#"<c r="{reference}" s="1"><v>{}</v></c>"#, excel_serial(&dt)));
        }
    }
    if let Ok(number) = value.parse::<f64>() {
        return Some(format!(r#"<c r="{reference}"><v>{number}</v></c>"#));
    }
    Some(format!(
        r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
        escape_xml(value)
    ))
}

fn sheet_xml(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str(&format!(
        r#"<dimension ref="A1:{}{}"/><sheetData>"#,
        column_letter(headers.len().saturating_sub(1)),
        rows.len() + 1
    ));

    let header_row = headers.to_vec();
    for (row_idx, values) in std::iter::once(&header_row).chain(rows).enumerate() {
        let row_number = row_idx + 1;
        xml.push_str(&format!(r#"<row r="{row_number}">"#));
        for (col_idx, value) in values.iter().enumerate() {
            let reference = format!("{}{}", column_letter(col_idx), row_number);
            let cell = if row_idx == 0 {
                Some(format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape_xml(value)
                ))
            } else {
                sheet_cell(&reference, &headers[col_idx], value)
            };
            if let Some(cell) = cell {
                xml.push_str(&cell);
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Minimal .xlsx workbook with one "Tasks" sheet
///
/// Report times become real Excel datetimes, plain numbers numeric cells and
/// everything else inline strings. Empty values leave the cell out.
pub fn to_xlsx(headers: &[String], rows: &[Vec<String>]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("xl/workbook.xml", WORKBOOK_XML.to_string()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
            ("xl/styles.xml", STYLES_XML.to_string()),
            ("xl/worksheets/sheet1.xml", sheet_xml(headers, rows)),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).expect("start workbook part");
            zip.write_all(content.as_bytes()).expect("write workbook part");
        }
        zip.finish().expect("finish workbook");
    }
    buffer
}

/// Workbook export with one row per override set
pub fn export_xlsx(system: UnitSystem, rows: &[&[(&str, &str)]]) -> Vec<u8> {
    let headers = export_headers(system);
    let rows: Vec<Vec<String>> = rows.iter().map(|o| task_row(&headers, o)).collect();
    to_xlsx(&headers, &rows)
}
