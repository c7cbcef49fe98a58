//! Per-student summary workbook.

use crate::analytics::stats::round2;
use crate::error::WorkbookError;
use crate::grading::{GradedResult, Outcome};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

/// Column headers of the summary sheet, left to right.
pub const SUMMARY_COLUMNS: [&str; 16] = [
    "Student ID",
    "Var",
    "Corr",
    "Err",
    "ND",
    "P.Corr",
    "P.Err",
    "P.ND",
    "Tot",
    "Max",
    "%",
    "%*10 (0.25)",
    "%ile",
    "Z",
    "Stanine",
    "answers",
];

/// One row of the summary sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub student_id: String,
    pub variant_id: String,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub blank_count: usize,
    pub correct_score: f64,
    pub wrong_score: f64,
    pub blank_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    /// Percentage on a 0-10 scale rounded to the nearest quarter.
    pub grade: f64,
    pub percentile: f64,
    pub z_score: f64,
    pub stanine: String,
    pub answers: String,
}

impl SummaryRow {
    pub fn from_result(result: &GradedResult) -> Self {
        let answers = result
            .answers
            .iter()
            .map(|a| {
                let response = if a.outcome == Outcome::Blank {
                    "-"
                } else {
                    a.response.as_str()
                };
                format!("{}: {} (corr: {})", a.number, response, a.correct_label)
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            student_id: result.student_id.clone(),
            variant_id: result.variant_id.clone(),
            correct_count: result.correct_count,
            wrong_count: result.wrong_count,
            blank_count: result.blank_count,
            correct_score: result.correct_score,
            wrong_score: result.wrong_score,
            blank_score: result.blank_score,
            total_score: result.total_score,
            max_score: result.max_score,
            percentage: result.percentage,
            grade: quarter_grade(result.percentage),
            percentile: result.standing.map(|s| round2(s.percentile)).unwrap_or(0.0),
            z_score: result.standing.map(|s| round2(s.z_score)).unwrap_or(0.0),
            stanine: result
                .standing
                .map(|s| s.stanine.to_string())
                .unwrap_or_default(),
            answers,
        }
    }
}

/// `percentage / 10`, rounded to the nearest 0.25.
pub fn quarter_grade(percentage: f64) -> f64 {
    (percentage / 10.0 * 4.0).round() / 4.0
}

/// Summary rows sorted by student id.
pub fn summary_rows(results: &[GradedResult]) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = results.iter().map(SummaryRow::from_result).collect();
    rows.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    rows
}

/// Writes the summary workbook.
pub fn write_summary(path: &Path, results: &[GradedResult]) -> Result<(), WorkbookError> {
    let rows = summary_rows(results);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in SUMMARY_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).unwrap_or(u32::MAX);
        sheet.write_string(r, 0, &row.student_id)?;
        sheet.write_string(r, 1, &row.variant_id)?;
        sheet.write_number(r, 2, row.correct_count as f64)?;
        sheet.write_number(r, 3, row.wrong_count as f64)?;
        sheet.write_number(r, 4, row.blank_count as f64)?;
        sheet.write_number(r, 5, row.correct_score)?;
        sheet.write_number(r, 6, row.wrong_score)?;
        sheet.write_number(r, 7, row.blank_score)?;
        sheet.write_number(r, 8, row.total_score)?;
        sheet.write_number(r, 9, row.max_score)?;
        sheet.write_number(r, 10, row.percentage)?;
        sheet.write_number(r, 11, row.grade)?;
        sheet.write_number(r, 12, row.percentile)?;
        sheet.write_number(r, 13, row.z_score)?;
        sheet.write_string(r, 14, &row.stanine)?;
        sheet.write_string(r, 15, &row.answers)?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote student summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Stanine, StudentStanding};
    use crate::grading::AnswerDetail;
    use crate::workbook::cell_text;
    use calamine::{open_workbook_auto, Reader};

    fn graded(student: &str) -> GradedResult {
        GradedResult {
            student_id: student.to_string(),
            variant_id: "2".to_string(),
            correct_count: 1,
            wrong_count: 0,
            blank_count: 1,
            correct_score: 4.0,
            wrong_score: 0.0,
            blank_score: 1.0,
            total_score: 5.0,
            max_score: 8.0,
            percentage: 62.5,
            answers: vec![
                AnswerDetail {
                    number: 1,
                    category: "Algebra".to_string(),
                    response: "b".to_string(),
                    correct_label: "B".to_string(),
                    outcome: Outcome::Correct,
                    points: 4.0,
                },
                AnswerDetail {
                    number: 2,
                    category: "Storia".to_string(),
                    response: String::new(),
                    correct_label: "A".to_string(),
                    outcome: Outcome::Blank,
                    points: 1.0,
                },
            ],
            standing: Some(StudentStanding {
                z_score: 0.4567,
                percentile: 66.6666,
                stanine: Stanine::B,
            }),
        }
    }

    #[test]
    fn test_quarter_grade() {
        assert_eq!(quarter_grade(62.5), 6.25);
        assert_eq!(quarter_grade(58.0), 5.75);
        assert_eq!(quarter_grade(100.0), 10.0);
        assert_eq!(quarter_grade(0.0), 0.0);
        assert_eq!(quarter_grade(71.0), 7.0);
    }

    #[test]
    fn test_row_contents() {
        let row = SummaryRow::from_result(&graded("s1"));
        assert_eq!(row.answers, "1: b (corr: B), 2: - (corr: A)");
        assert_eq!(row.grade, 6.25);
        assert_eq!(row.percentile, 66.67);
        assert_eq!(row.z_score, 0.46);
        assert_eq!(row.stanine, "B");
    }

    #[test]
    fn test_rows_sorted_by_student() {
        let rows = summary_rows(&[graded("zeta"), graded("alfa"), graded("mu")]);
        let ids: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["alfa", "mu", "zeta"]);
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report_students_summary.xlsx");
        write_summary(&path, &[graded("b"), graded("a")]).expect("summary written");

        let mut workbook = open_workbook_auto(&path).expect("summary readable");
        let name = workbook.sheet_names().into_iter().next().expect("one sheet");
        let range = workbook.worksheet_range(&name).expect("sheet range");
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], SUMMARY_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][0], "a");
        assert_eq!(rows[1][11], "6.25");
        assert_eq!(rows[2][0], "b");
    }
}
