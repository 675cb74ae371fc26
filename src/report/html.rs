//! Printable HTML reports.
//!
//! The output is a complete standalone document; turning it into paper or PDF
//! is left to the browser's print dialog.

use std::fmt::Write;

use chrono::NaiveDate;

use super::{format_date_long, format_date_short, Period, Signer};
use crate::{
    config::ReportConfig,
    models::{
        activity::ActivityWithTools,
        tool::{ActivityCharge, ToolView},
    },
};

const STYLE: &str = r#"
  @page { size: A4 landscape; margin: 15mm; }
  body { font-family: "Times New Roman", serif; font-size: 11pt; color: #000; }
  .letterhead { display: inline-block; text-align: center; font-weight: bold; line-height: 1.3; }
  .letterhead hr { border: 0; border-top: 1px solid #000; margin: 2px 0 0 0; }
  h1 { text-align: center; font-size: 13pt; margin: 24px 0 2px 0; text-decoration: underline; }
  .subtitle { text-align: center; margin: 0 0 16px 0; }
  table.data { width: 100%; border-collapse: collapse; }
  table.data th, table.data td { border: 1px solid #000; padding: 4px 6px; vertical-align: top; }
  table.data th { background: #e6e6e6; }
  table.info td { padding: 2px 8px 2px 0; }
  .num { text-align: right; }
  .center { text-align: center; }
  .negative { color: #b00000; font-weight: bold; }
  .signature { margin-top: 32px; width: 300px; margin-left: auto; text-align: center; }
  .signature .space { height: 70px; }
  .signature .name { font-weight: bold; text-decoration: underline; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn period_line(period: &Period) -> String {
    format!(
        "Periode {} s.d. {}",
        format_date_long(period.start),
        format_date_long(period.end)
    )
}

fn document(
    config: &ReportConfig,
    title: &str,
    subtitle: Option<&str>,
    body: &str,
    signer: &Signer,
    printed_on: NaiveDate,
) -> String {
    let mut html = String::with_capacity(body.len() + 4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n<div class=\"letterhead\">\n");
    for line in &config.letterhead {
        let _ = writeln!(html, "  <div>{}</div>", escape(line));
    }
    html.push_str("  <hr>\n</div>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(title));
    if let Some(subtitle) = subtitle {
        let _ = writeln!(html, "<p class=\"subtitle\">{}</p>", escape(subtitle));
    }
    html.push_str(body);
    let _ = write!(
        html,
        concat!(
            "<div class=\"signature\">\n",
            "  <div>{city}, {date}</div>\n",
            "  <div>{title}</div>\n",
            "  <div class=\"space\"></div>\n",
            "  <div class=\"name\">{name}</div>\n",
            "  <div>NRP {id}</div>\n",
            "</div>\n"
        ),
        city = escape(&config.city),
        date = format_date_long(printed_on),
        title = escape(&config.signer_title),
        name = escape(&signer.name),
        id = escape(&signer.identifier),
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn hours_cell(hours: i64) -> String {
    if hours < 0 {
        format!("<td class=\"num negative\">{}</td>", hours)
    } else {
        format!("<td class=\"num\">{}</td>", hours)
    }
}

/// Activities report. An activity linked to several tools becomes a row
/// group with one row per tool.
pub fn activities_report(
    config: &ReportConfig,
    period: &Period,
    activities: &[ActivityWithTools],
    signer: &Signer,
    printed_on: NaiveDate,
) -> String {
    let mut body = String::new();
    body.push_str(concat!(
        "<table class=\"data\">\n<thead>\n<tr>",
        "<th>No</th><th>Kode Kegiatan</th><th>Nama Kegiatan</th><th>Deskripsi</th>",
        "<th>Tanggal</th><th>Operator</th><th>Kode Alat</th><th>Nama Alat</th><th>Jam Pakai</th>",
        "</tr>\n</thead>\n<tbody>\n"
    ));

    if activities.is_empty() {
        body.push_str("<tr><td colspan=\"9\" class=\"center\">Tidak ada kegiatan pada periode ini</td></tr>\n");
    }

    for (index, item) in activities.iter().enumerate() {
        let a = &item.activity;
        let span = item.tools.len().max(1);
        let _ = write!(
            body,
            concat!(
                "<tr><td class=\"center\" rowspan=\"{span}\">{no}</td>",
                "<td rowspan=\"{span}\">{code}</td><td rowspan=\"{span}\">{name}</td>",
                "<td rowspan=\"{span}\">{desc}</td><td rowspan=\"{span}\">{date}</td>",
                "<td rowspan=\"{span}\">{operator}</td>"
            ),
            span = span,
            no = index + 1,
            code = escape(&a.activity_code),
            name = escape(&a.name),
            desc = escape(&a.description),
            date = format_date_short(a.date),
            operator = escape(&a.operator_name),
        );

        match item.tools.split_first() {
            None => {
                let _ = writeln!(
                    body,
                    "<td>-</td><td>-</td><td class=\"num\">{}</td></tr>",
                    a.tool_usage
                );
            }
            Some((first, rest)) => {
                let _ = writeln!(
                    body,
                    "<td>{}</td><td>{}</td><td class=\"num\" rowspan=\"{}\">{}</td></tr>",
                    escape(&first.tool_code),
                    escape(&first.name),
                    span,
                    a.tool_usage
                );
                for tool in rest {
                    let _ = writeln!(
                        body,
                        "<tr><td>{}</td><td>{}</td></tr>",
                        escape(&tool.tool_code),
                        escape(&tool.name)
                    );
                }
            }
        }
    }
    body.push_str("</tbody>\n</table>\n");

    document(
        config,
        "LAPORAN PENGGUNAAN PERALATAN DALAM KEGIATAN",
        Some(&period_line(period)),
        &body,
        signer,
        printed_on,
    )
}

/// Single tool report: identity block followed by its activity history
pub fn tool_report(
    config: &ReportConfig,
    tool: &ToolView,
    activities: &[ActivityCharge],
    period: Option<&Period>,
    signer: &Signer,
    printed_on: NaiveDate,
) -> String {
    let t = &tool.tool;
    let mut body = String::new();
    let _ = write!(
        body,
        concat!(
            "<table class=\"info\">\n",
            "<tr><td>Kode Alat</td><td>:</td><td>{code}</td></tr>\n",
            "<tr><td>Nama Alat</td><td>:</td><td>{name}</td></tr>\n",
            "<tr><td>Merk</td><td>:</td><td>{brand}</td></tr>\n",
            "<tr><td>Jam Pakai Maksimal</td><td>:</td><td>{max} jam</td></tr>\n",
            "<tr><td>Jam Terpakai</td><td>:</td><td>{used} jam</td></tr>\n",
            "<tr><td>Sisa Jam Pakai</td><td>:</td><td>{remaining} jam</td></tr>\n",
            "<tr><td>Kondisi</td><td>:</td><td>{condition}</td></tr>\n",
            "</table>\n<br>\n"
        ),
        code = escape(&t.tool_code),
        name = escape(&t.name),
        brand = escape(&t.brand),
        max = t.max_hour_usage,
        used = tool.used_hours,
        remaining = tool.remaining_hours,
        condition = t.condition.label(),
    );

    body.push_str(concat!(
        "<table class=\"data\">\n<thead>\n<tr>",
        "<th>No</th><th>Kode Kegiatan</th><th>Nama Kegiatan</th><th>Tanggal</th>",
        "<th>Operator</th><th>Jam Pakai</th>",
        "</tr>\n</thead>\n<tbody>\n"
    ));
    if activities.is_empty() {
        body.push_str("<tr><td colspan=\"6\" class=\"center\">Belum ada kegiatan</td></tr>\n");
    }
    let mut period_total: i64 = 0;
    for (index, a) in activities.iter().enumerate() {
        period_total += i64::from(a.tool_usage);
        let _ = writeln!(
            body,
            "<tr><td class=\"center\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
            index + 1,
            escape(&a.activity_code),
            escape(&a.name),
            format_date_short(a.date),
            escape(&a.operator_name),
            a.tool_usage
        );
    }
    let _ = writeln!(
        body,
        "</tbody>\n<tfoot>\n<tr><th colspan=\"5\" class=\"num\">Jumlah</th><th class=\"num\">{}</th></tr>\n</tfoot>\n</table>",
        period_total
    );

    let subtitle = period.map(period_line);
    document(
        config,
        &format!("LAPORAN RIWAYAT PENGGUNAAN {}", t.name.to_uppercase()),
        subtitle.as_deref(),
        &body,
        signer,
        printed_on,
    )
}

/// All-tools report with remaining hours
pub fn tools_report(
    config: &ReportConfig,
    tools: &[ToolView],
    signer: &Signer,
    printed_on: NaiveDate,
) -> String {
    let mut body = String::new();
    body.push_str(concat!(
        "<table class=\"data\">\n<thead>\n<tr>",
        "<th>No</th><th>Kode Alat</th><th>Nama Alat</th><th>Merk</th>",
        "<th>Jam Maksimal</th><th>Jam Terpakai</th><th>Sisa Jam</th><th>Kondisi</th>",
        "</tr>\n</thead>\n<tbody>\n"
    ));
    if tools.is_empty() {
        body.push_str("<tr><td colspan=\"8\" class=\"center\">Belum ada peralatan</td></tr>\n");
    }
    for (index, view) in tools.iter().enumerate() {
        let t = &view.tool;
        let _ = writeln!(
            body,
            "<tr><td class=\"center\">{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>{}<td class=\"center\">{}</td></tr>",
            index + 1,
            escape(&t.tool_code),
            escape(&t.name),
            escape(&t.brand),
            t.max_hour_usage,
            view.used_hours,
            hours_cell(view.remaining_hours),
            t.condition.label()
        );
    }
    body.push_str("</tbody>\n</table>\n");

    document(
        config,
        "LAPORAN DATA PERALATAN",
        Some(&format!("Keadaan per {}", format_date_long(printed_on))),
        &body,
        signer,
        printed_on,
    )
}
