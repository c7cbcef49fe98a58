//! Student answer sheets: the blank template written after generation and
//! the filled-in workbook read back for grading.

use super::{cell, cell_number, cell_text, Header};
use crate::error::WorkbookError;
use crate::grading::StudentSubmission;
use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const STUDENT_ID: &str = "student_id";
pub const VARIANT_ID: &str = "variant_id";
/// Sheet name of the answer template.
pub const TEMPLATE_SHEET: &str = "Risposte";

/// Writes an empty answer sheet with columns `student_id`, `variant_id`, `1..=questions`.
pub fn write_template(path: &Path, questions: usize) -> Result<(), WorkbookError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;
    sheet.write_string_with_format(0, 0, STUDENT_ID, &bold)?;
    sheet.write_string_with_format(0, 1, VARIANT_ID, &bold)?;
    for number in 1..=questions {
        let col = u16::try_from(number + 1).unwrap_or(u16::MAX);
        sheet.write_string_with_format(0, col, number.to_string(), &bold)?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), questions, "Wrote answer template");
    Ok(())
}

/// Reads submissions from the first sheet.
///
/// Rows without a student id are skipped. A repeated student id replaces the
/// earlier row. Only columns named by a positive integer are answers.
pub fn read_submissions(path: &Path) -> Result<Vec<StudentSubmission>, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;
    let first = workbook
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| WorkbookError::NoSheets(path.display().to_string()))?;
    let range = workbook.worksheet_range(&first)?;

    let mut rows = range.rows();
    let header = rows.next().map(Header::new).unwrap_or_default();
    let missing = header.missing(&[STUDENT_ID, VARIANT_ID]);
    if !missing.is_empty() {
        return Err(WorkbookError::MissingColumns {
            path: path.display().to_string(),
            columns: missing.join(", "),
        });
    }
    let (Some(student_col), Some(variant_col)) =
        (header.position(STUDENT_ID), header.position(VARIANT_ID))
    else {
        return Err(WorkbookError::MissingColumns {
            path: path.display().to_string(),
            columns: format!("{}, {}", STUDENT_ID, VARIANT_ID),
        });
    };

    let answer_cols: Vec<(usize, usize)> = header
        .columns()
        .filter_map(|(col, name)| {
            name.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| (col, n))
        })
        .collect();

    let mut submissions: Vec<StudentSubmission> = Vec::new();
    for row in rows {
        let student_id = cell_text(cell(row, student_col));
        if student_id.is_empty() {
            continue;
        }

        let variant_cell = cell(row, variant_col);
        let variant_id = match cell_number(variant_cell) {
            Some(n) if n >= 0.0 => (n.trunc() as u64).to_string(),
            _ => cell_text(variant_cell),
        };

        let answers: BTreeMap<usize, String> = answer_cols
            .iter()
            .map(|(col, number)| (*number, cell_text(cell(row, *col))))
            .collect();

        let submission = StudentSubmission {
            student_id,
            variant_id,
            answers,
        };

        match submissions
            .iter_mut()
            .find(|s| s.student_id == submission.student_id)
        {
            Some(existing) => {
                warn!(
                    student = %submission.student_id,
                    "Duplicate student id, keeping the later row"
                );
                *existing = submission;
            }
            None => submissions.push(submission),
        }
    }

    info!(path = %path.display(), count = submissions.len(), "Loaded submissions");
    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("student_answers.xlsx");
        write_template(&path, 4).expect("template written");

        let mut workbook = open_workbook_auto(&path).expect("template readable");
        assert_eq!(workbook.sheet_names(), vec![TEMPLATE_SHEET.to_string()]);
        let range = workbook
            .worksheet_range(TEMPLATE_SHEET)
            .expect("template sheet");
        let header: Vec<String> = range
            .rows()
            .next()
            .expect("header row")
            .iter()
            .map(cell_text)
            .collect();
        assert_eq!(header, vec!["student_id", "variant_id", "1", "2", "3", "4"]);

        // an empty template yields no submissions
        assert!(read_submissions(&path).expect("readable").is_empty());
    }

    #[test]
    fn test_read_submissions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, h) in ["student_id", "variant_id", "1", "2", "note"].iter().enumerate() {
            sheet.write_string(0, col as u16, *h).expect("header");
        }
        sheet.write_string(1, 0, "rossi").expect("cell");
        sheet.write_number(1, 1, 3.0).expect("cell");
        sheet.write_string(1, 2, "a").expect("cell");
        sheet.write_string(1, 4, "ignored").expect("cell");

        sheet.write_number(2, 1, 1.0).expect("cell");
        sheet.write_string(2, 2, "B").expect("cell");

        sheet.write_string(3, 0, "bianchi").expect("cell");
        sheet.write_string(3, 1, "2").expect("cell");
        sheet.write_string(3, 3, "C").expect("cell");

        sheet.write_string(4, 0, "rossi").expect("cell");
        sheet.write_string(4, 1, "3.0").expect("cell");
        sheet.write_string(4, 2, "D").expect("cell");
        workbook.save(&path).expect("save");

        let submissions = read_submissions(&path).expect("submissions load");
        assert_eq!(submissions.len(), 2);

        let rossi = &submissions[0];
        assert_eq!(rossi.student_id, "rossi");
        assert_eq!(rossi.variant_id, "3");
        assert_eq!(rossi.answers.get(&1).map(String::as_str), Some("D"));
        assert_eq!(rossi.answers.get(&2).map(String::as_str), Some(""));
        assert_eq!(rossi.answers.len(), 2);

        let bianchi = &submissions[1];
        assert_eq!(bianchi.variant_id, "2");
        assert_eq!(bianchi.answers.get(&1).map(String::as_str), Some(""));
        assert_eq!(bianchi.answers.get(&2).map(String::as_str), Some("C"));
    }

    #[test]
    fn test_missing_required_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "student_id").expect("header");
        sheet.write_string(0, 1, "1").expect("header");
        workbook.save(&path).expect("save");

        assert!(matches!(
            read_submissions(&path),
            Err(WorkbookError::MissingColumns { .. })
        ));
    }
}
