//! Monthly day tallies for fixed-salary staff and the sheet they are imported from.

use std::collections::{HashMap, HashSet};

use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::round2;
use crate::model::attendance::AttendanceRecord;

/// Every month is settled as 30 days.
pub const DAYS_IN_MONTH: i32 = 30;

/// Errors shown before the user gets "+N more".
pub const SHOWN_ERRORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCounts {
    pub working_days: u32,
    pub leave: u32,
    pub unpaid_leave: u32,
}

impl DayCounts {
    /// Days that are paid out of the fixed amount.
    pub fn paid_days(&self) -> u32 {
        self.working_days + self.leave
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DayCountError {
    #[display(fmt = "{} must be between 0 and 30 (got {})", field, value)]
    OutOfRange { field: &'static str, value: i32 },

    #[display(
        fmt = "Working days, leave and unpaid leave must add up to 30 (total: {})",
        total
    )]
    WrongTotal { total: i32 },
}

fn in_range(field: &'static str, value: i32) -> Result<u32, DayCountError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= DAYS_IN_MONTH as u32)
        .ok_or(DayCountError::OutOfRange { field, value })
}

/// Passes iff all three are in `0..=30` and add up to exactly 30.
pub fn validate_days(
    working_days: i32,
    leave: i32,
    unpaid_leave: i32,
) -> Result<DayCounts, DayCountError> {
    let counts = DayCounts {
        working_days: in_range("Working days", working_days)?,
        leave: in_range("Leave", leave)?,
        unpaid_leave: in_range("Unpaid leave", unpaid_leave)?,
    };

    let total = working_days + leave + unpaid_leave;
    if total != DAYS_IN_MONTH {
        return Err(DayCountError::WrongTotal { total });
    }

    Ok(counts)
}

/// Fixed amount pro-rated over paid days.
pub fn fixed_salary(monthly_amount: f64, counts: &DayCounts) -> f64 {
    round2(monthly_amount / DAYS_IN_MONTH as f64 * f64::from(counts.paid_days()))
}

/// First [`SHOWN_ERRORS`] messages joined, with a "+N more" tail.
pub fn summarize_errors(messages: &[String]) -> String {
    let shown = messages
        .iter()
        .take(SHOWN_ERRORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");

    match messages.len().checked_sub(SHOWN_ERRORS) {
        Some(rest) if rest > 0 => format!("{shown} (+{rest} more)"),
        _ => shown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// Spreadsheet row number, header is row 1
    pub row: usize,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NameMismatch {
    pub row: usize,
    pub name: String,
}

/// One data row of an attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub row: usize,
    pub name: String,
    pub days: Result<DayCounts, String>,
}

#[derive(Debug, Display)]
pub enum SheetError {
    #[display(fmt = "Missing column: {}", _0)]
    MissingColumn(&'static str),

    #[display(fmt = "Unreadable sheet: {}", _0)]
    Csv(csv::Error),

    #[display(fmt = "The sheet has no data rows")]
    Empty,
}

impl From<csv::Error> for SheetError {
    fn from(e: csv::Error) -> Self {
        SheetError::Csv(e)
    }
}

pub const NAME_COLUMN: &str = "Name";
pub const WORKING_DAYS_COLUMN: &str = "Working Days";
pub const LEAVE_COLUMN: &str = "Leave";
pub const UNPAID_LEAVE_COLUMN: &str = "Unpaid Leave";

fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, SheetError> {
    let wanted = header_key(name);
    headers
        .iter()
        .position(|h| header_key(h) == wanted)
        .ok_or(SheetError::MissingColumn(name))
}

fn parse_day(raw: &str, field: &str) -> Result<i32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    // spreadsheets export whole numbers as "22.0"
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{field} is not a number: '{raw}'"))?;
    if value.fract() != 0.0 {
        return Err(format!("{field} must be a whole number: '{raw}'"));
    }
    Ok(value as i32)
}

/// Parse a CSV attendance sheet. Header names are matched ignoring case,
/// spaces and punctuation. Blank lines are skipped.
pub fn parse_sheet(data: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let name_col = column(&headers, NAME_COLUMN)?;
    let working_col = column(&headers, WORKING_DAYS_COLUMN)?;
    let leave_col = column(&headers, LEAVE_COLUMN)?;
    let unpaid_col = column(&headers, UNPAID_LEAVE_COLUMN)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // csv skips blank lines, so the record index drifts from the sheet row
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let field = |col: usize| record.get(col).unwrap_or("").to_string();
        let name = field(name_col);

        let days = if name.is_empty() {
            Err("Name is required".to_string())
        } else {
            parse_day(&field(working_col), WORKING_DAYS_COLUMN).and_then(|working| {
                let leave = parse_day(&field(leave_col), LEAVE_COLUMN)?;
                let unpaid = parse_day(&field(unpaid_col), UNPAID_LEAVE_COLUMN)?;
                validate_days(working, leave, unpaid).map_err(|e| e.to_string())
            })
        };

        rows.push(SheetRow {
            row,
            name,
            days,
        });
    }

    if rows.is_empty() {
        return Err(SheetError::Empty);
    }
    Ok(rows)
}

/// Render records in the import layout plus identifier and salary.
pub fn write_sheet(records: &[AttendanceRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        NAME_COLUMN,
        "Identifier",
        "Month",
        WORKING_DAYS_COLUMN,
        LEAVE_COLUMN,
        UNPAID_LEAVE_COLUMN,
        "Salary",
    ])?;

    for r in records {
        writer.write_record([
            r.name.clone(),
            r.identifier.clone().unwrap_or_default(),
            r.month.clone(),
            r.working_days.to_string(),
            r.leave_days.to_string(),
            r.unpaid_leave.to_string(),
            format!("{:.2}", r.salary),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Outcome of resolving a sheet name to an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    None,
    One(u64),
    Many,
}

/// Case-insensitive index of employee names, usernames and identifiers.
/// A key shared by two employees resolves to [`NameMatch::Many`].
#[derive(Debug, Default)]
pub struct UserDirectory {
    ids: HashMap<String, u64>,
    ambiguous: HashSet<String>,
}

impl UserDirectory {
    fn key(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn insert<'a>(&mut self, user_id: u64, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            let key = Self::key(name);
            if key.is_empty() {
                continue;
            }
            match self.ids.get(&key) {
                Some(existing) if *existing != user_id => {
                    self.ambiguous.insert(key);
                }
                Some(_) => {}
                None => {
                    self.ids.insert(key, user_id);
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> NameMatch {
        let key = Self::key(name);
        if self.ambiguous.contains(&key) {
            return NameMatch::Many;
        }
        match self.ids.get(&key) {
            Some(id) => NameMatch::One(*id),
            None => NameMatch::None,
        }
    }
}

/// A sheet row that passed validation and resolved to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    pub row: usize,
    pub user_id: u64,
    pub days: DayCounts,
}

/// Every problem found in a sheet, collected before anything is written.
#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportProblems {
    pub validation_errors: Vec<RowError>,
    pub mismatches: Vec<NameMismatch>,
}

impl ImportProblems {
    pub fn is_empty(&self) -> bool {
        self.validation_errors.is_empty() && self.mismatches.is_empty()
    }

    /// One line per problem, in row order.
    pub fn messages(&self) -> Vec<String> {
        let mut lines: Vec<(usize, String)> = self
            .validation_errors
            .iter()
            .map(|e| (e.row, format!("Row {} ({}): {}", e.row, e.name, e.message)))
            .chain(self.mismatches.iter().map(|m| {
                (m.row, format!("Row {}: '{}' does not match any employee", m.row, m.name))
            }))
            .collect();
        lines.sort_by_key(|(row, _)| *row);
        lines.into_iter().map(|(_, line)| line).collect()
    }
}

/// Resolve every row to a user. All rows must validate and match, and no
/// user may appear twice, or nothing is returned.
pub fn match_rows<F>(rows: Vec<SheetRow>, lookup: F) -> Result<Vec<MatchedRow>, ImportProblems>
where
    F: Fn(&str) -> NameMatch,
{
    let mut problems = ImportProblems::default();
    let mut matched: Vec<MatchedRow> = Vec::with_capacity(rows.len());

    for SheetRow { row, name, days } in rows {
        let days = match days {
            Ok(days) => days,
            Err(message) => {
                problems.validation_errors.push(RowError { row, name, message });
                continue;
            }
        };

        let user_id = match lookup(&name) {
            NameMatch::One(user_id) => user_id,
            NameMatch::None => {
                problems.mismatches.push(NameMismatch { row, name });
                continue;
            }
            NameMatch::Many => {
                let message = "Name matches more than one employee".to_string();
                problems.validation_errors.push(RowError { row, name, message });
                continue;
            }
        };

        if let Some(first) = matched.iter().find(|m| m.user_id == user_id) {
            let message = format!("Duplicate of row {}", first.row);
            problems.validation_errors.push(RowError { row, name, message });
            continue;
        }

        matched.push(MatchedRow { row, user_id, days });
    }

    if problems.is_empty() {
        Ok(matched)
    } else {
        Err(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_thirty() {
        assert_eq!(
            validate_days(22, 4, 4),
            Ok(DayCounts {
                working_days: 22,
                leave: 4,
                unpaid_leave: 4
            })
        );
        assert!(validate_days(30, 0, 0).is_ok());
        assert!(validate_days(0, 0, 30).is_ok());
    }

    #[test]
    fn reports_the_total_when_off() {
        let err = validate_days(22, 4, 3).unwrap_err();
        assert_eq!(err, DayCountError::WrongTotal { total: 29 });
        assert!(err.to_string().contains("29"));

        assert_eq!(
            validate_days(25, 4, 4).unwrap_err(),
            DayCountError::WrongTotal { total: 33 }
        );
    }

    #[test]
    fn never_clamps_out_of_range_values() {
        assert_eq!(
            validate_days(32, -1, -1).unwrap_err(),
            DayCountError::OutOfRange {
                field: "Working days",
                value: 32
            }
        );
        assert_eq!(
            validate_days(30, -2, 2).unwrap_err().to_string(),
            "Leave must be between 0 and 30 (got -2)"
        );
    }

    #[test]
    fn passes_iff_sum_is_thirty() {
        for w in 0..=30 {
            for l in 0..=(30 - w) {
                for u in 0..=30 {
                    assert_eq!(validate_days(w, l, u).is_ok(), w + l + u == 30);
                }
            }
        }
    }

    #[test]
    fn salary_counts_paid_days_only() {
        let counts = validate_days(22, 4, 4).unwrap();
        assert_eq!(fixed_salary(30_000.0, &counts), 26_000.0);
        assert_eq!(fixed_salary(0.0, &counts), 0.0);
    }

    #[test]
    fn summary_truncates_after_three() {
        let messages: Vec<String> = (1..=5).map(|i| format!("e{i}")).collect();
        assert_eq!(summarize_errors(&messages), "e1; e2; e3 (+2 more)");
        assert_eq!(summarize_errors(&messages[..3]), "e1; e2; e3");
        assert_eq!(summarize_errors(&messages[..1]), "e1");
        assert_eq!(summarize_errors(&[]), "");
    }

    #[test]
    fn parses_sheet_with_row_numbers() {
        let sheet = b"Name,Working Days,Leave,Unpaid Leave\n\
                      Asha,22,4,4\n\
                      ,,,\n\
                      Vikram,22.0,4,3\n\
                      Meena,abc,4,4\n\
                      ,20,5,5\n";

        let rows = parse_sheet(sheet).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].name, "Asha");
        assert!(rows[0].days.is_ok());

        assert_eq!(rows[1].row, 4);
        assert!(rows[1].days.as_ref().unwrap_err().contains("total: 29"));

        assert!(rows[2].days.as_ref().unwrap_err().contains("not a number"));
        assert_eq!(rows[3].days, Err("Name is required".to_string()));
    }

    #[test]
    fn blank_lines_keep_sheet_row_numbers() {
        let sheet = b"Name,Working Days,Leave,Unpaid Leave\nAsha,22,4,4\n\nVikram,22,4,3\n";

        let rows = parse_sheet(sheet).unwrap();
        let numbered: Vec<(usize, &str)> = rows.iter().map(|r| (r.row, r.name.as_str())).collect();
        assert_eq!(numbered, vec![(2, "Asha"), (4, "Vikram")]);
    }

    #[test]
    fn header_matching_is_loose() {
        let sheet = b"name,working_days,LEAVE,unpaid-leave\nAsha,30,0,0\n";
        let rows = parse_sheet(sheet).unwrap();
        assert_eq!(rows[0].days.as_ref().unwrap().working_days, 30);
    }

    #[test]
    fn missing_column_and_empty_sheet() {
        let err = parse_sheet(b"Name,Working Days,Leave\nAsha,30,0\n").unwrap_err();
        assert_eq!(err.to_string(), "Missing column: Unpaid Leave");

        let err = parse_sheet(b"Name,Working Days,Leave,Unpaid Leave\n").unwrap_err();
        assert!(matches!(err, SheetError::Empty));
    }

    #[test]
    fn export_uses_import_columns() {
        let records = vec![AttendanceRecord {
            id: 1,
            user_id: 7,
            month: "2025-03".to_string(),
            name: "Asha".to_string(),
            identifier: Some("EMP-7".to_string()),
            working_days: 22,
            leave_days: 4,
            unpaid_leave: 4,
            salary: 26_000.0,
        }];

        let bytes = write_sheet(&records).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Name,Identifier,Month,Working Days,Leave,Unpaid Leave,Salary")
        );
        assert_eq!(lines.next(), Some("Asha,EMP-7,2025-03,22,4,4,26000.00"));

        let reparsed = parse_sheet(text.as_bytes()).unwrap();
        assert!(reparsed[0].days.is_ok());
    }

    fn sheet_row(row: usize, name: &str, days: Result<DayCounts, String>) -> SheetRow {
        SheetRow {
            row,
            name: name.to_string(),
            days,
        }
    }

    fn directory() -> UserDirectory {
        let mut directory = UserDirectory::default();
        directory.insert(7, ["Asha", "asha", "EMP-7"]);
        directory.insert(8, ["Vikram", "vikram.r"]);
        directory
    }

    fn lookup(name: &str) -> NameMatch {
        directory().lookup(name)
    }

    #[test]
    fn all_rows_matching_are_returned() {
        let full = validate_days(30, 0, 0).unwrap();
        let rows = vec![sheet_row(2, "Asha", Ok(full)), sheet_row(3, "Vikram", Ok(full))];

        let matched = match_rows(rows, lookup).unwrap();
        assert_eq!(matched.iter().map(|m| m.user_id).collect::<Vec<_>>(), vec![7, 8]);
    }

    #[test]
    fn one_bad_row_rejects_the_whole_sheet() {
        let full = validate_days(30, 0, 0).unwrap();
        let rows = vec![
            sheet_row(2, "Asha", Ok(full)),
            sheet_row(3, "Nobody", Ok(full)),
            sheet_row(4, "Vikram", Err("total: 29".to_string())),
            sheet_row(5, "EMP-7", Ok(full)),
        ];

        let problems = match_rows(rows, lookup).unwrap_err();
        assert_eq!(
            problems.mismatches,
            vec![NameMismatch {
                row: 3,
                name: "Nobody".to_string()
            }]
        );
        assert_eq!(problems.validation_errors.len(), 2);
        assert_eq!(problems.validation_errors[1].message, "Duplicate of row 2");

        let messages = problems.messages();
        assert!(messages[0].starts_with("Row 3:"));
        assert!(messages[1].starts_with("Row 4 (Vikram)"));
    }

    #[test]
    fn shared_names_are_ambiguous() {
        let mut directory = directory();
        directory.insert(9, ["Asha", "asha.k"]);
        directory.insert(10, ["Ravi", "VIKRAM.R"]);

        assert_eq!(directory.lookup(" ASHA "), NameMatch::Many);
        assert_eq!(directory.lookup("vikram.r"), NameMatch::Many);
        assert_eq!(directory.lookup("emp-7"), NameMatch::One(7));
        assert_eq!(directory.lookup("asha.k"), NameMatch::One(9));
        assert_eq!(directory.lookup("Nobody"), NameMatch::None);
    }

    #[test]
    fn ambiguous_name_rejects_the_row() {
        let mut directory = directory();
        directory.insert(9, ["Asha"]);
        let full = validate_days(30, 0, 0).unwrap();
        let rows = vec![sheet_row(2, "Vikram", Ok(full)), sheet_row(3, "Asha", Ok(full))];

        let problems = match_rows(rows, |name| directory.lookup(name)).unwrap_err();
        assert!(problems.mismatches.is_empty());
        assert_eq!(
            problems.validation_errors,
            vec![RowError {
                row: 3,
                name: "Asha".to_string(),
                message: "Name matches more than one employee".to_string()
            }]
        );
        assert_eq!(
            problems.messages(),
            vec!["Row 3 (Asha): Name matches more than one employee".to_string()]
        );
    }
}
