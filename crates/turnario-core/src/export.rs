//! Spreadsheet export of the schedule grid.
//!
//! Produces a downloadable CSV with every grid column: the calendar
//! context (date, weekday, holiday, clinic day) followed by one status
//! column per doctor.

use crate::grid::ScheduleGrid;

/// Download file name for a month's export.
pub fn export_file_name(year: i32, month: u32) -> String {
    format!("turni_{}_{:02}.csv", year, month)
}

/// Render the full grid as CSV (RFC 4180 quoting).
pub fn to_csv(grid: &ScheduleGrid) -> String {
    let doctors: Vec<_> = grid.doctors().iter().collect();

    let mut out = String::new();
    let mut header: Vec<String> = ["Date", "Weekday", "Holiday", "Holiday Name", "Clinic Day"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(doctors.iter().map(|d| d.as_str().to_string()));
    push_row(&mut out, &header);

    for row in grid.rows() {
        let mut fields = vec![
            row.date.format("%Y-%m-%d").to_string(),
            row.date.format("%A").to_string(),
            yes_or_empty(row.is_holiday()),
            row.holiday_name().to_string(),
            yes_or_empty(row.clinic_day),
        ];
        for doctor in &doctors {
            let status = row.status(doctor).unwrap_or_default();
            fields.push(status.label().to_string());
        }
        push_row(&mut out, &fields);
    }

    out
}

fn yes_or_empty(flag: bool) -> String {
    if flag { "yes".to_string() } else { String::new() }
}

fn push_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(field));
    }
    out.push_str("\r\n");
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
