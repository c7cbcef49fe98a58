//! Question-bank workbook reader.
//!
//! Every sheet is a category. One valid row is drawn from each sheet: a row is
//! valid when both the question text and the correct answer are non-empty.

use super::{cell, cell_number, cell_text, Header};
use crate::bank::{Question, ScoreOverrides};
use crate::error::WorkbookError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::{debug, info, warn};

pub const QUESTION_TEXT: &str = "Testo della domanda";
pub const CORRECT_ANSWER: &str = "Risposta corretta";
/// Prefix (lower-cased) of distractor columns.
pub const ALTERNATIVE_PREFIX: &str = "alternativa";
pub const CHOICE_COLUMNS: &str = "Numero Colonne Alternative";
pub const SCORE_CORRECT: &str = "Punteggio corretta";
pub const SCORE_WRONG: &str = "Punteggio errata";
pub const SCORE_BLANK: &str = "Punteggio non data";

/// Reads one randomly drawn question per sheet, in sheet order.
///
/// Sheets without the required columns or without a valid row are skipped
/// with a warning.
pub fn read_questions(path: &Path, rng: &mut ChaCha8Rng) -> Result<Vec<Question>, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(WorkbookError::NoSheets(path.display().to_string()));
    }

    let mut questions = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name)?;
        if let Some(question) = draw_question(&name, &range, rng) {
            questions.push(question);
        }
    }

    info!(
        path = %path.display(),
        count = questions.len(),
        "Loaded questions"
    );
    Ok(questions)
}

fn draw_question(sheet: &str, range: &Range<Data>, rng: &mut ChaCha8Rng) -> Option<Question> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        warn!(sheet, "Sheet is empty, skipping");
        return None;
    };
    let header = Header::new(header_row);

    let missing = header.missing(&[QUESTION_TEXT, CORRECT_ANSWER]);
    if !missing.is_empty() {
        warn!(sheet, missing = ?missing, "Sheet lacks required columns, skipping");
        return None;
    }
    let text_col = header.position(QUESTION_TEXT)?;
    let correct_col = header.position(CORRECT_ANSWER)?;

    let valid: Vec<&[Data]> = rows
        .filter(|row| {
            !cell_text(cell(row, text_col)).is_empty()
                && !cell_text(cell(row, correct_col)).is_empty()
        })
        .collect();

    let Some(row) = valid.choose(rng) else {
        warn!(sheet, "No valid row found, skipping");
        return None;
    };
    debug!(sheet, candidates = valid.len(), "Drew question row");

    let distractors: Vec<String> = header
        .columns()
        .filter(|(_, name)| name.to_lowercase().starts_with(ALTERNATIVE_PREFIX))
        .map(|(col, _)| cell_text(cell(row, col)))
        .collect();

    let choice_columns = header
        .position(CHOICE_COLUMNS)
        .and_then(|col| cell_number(cell(row, col)))
        .filter(|n| *n >= 1.0)
        .map(|n| n as usize)
        .unwrap_or(1);

    let score = |name: &str| {
        header
            .position(name)
            .and_then(|col| cell_number(cell(row, col)))
    };
    let scores = ScoreOverrides {
        correct: score(SCORE_CORRECT),
        wrong: score(SCORE_WRONG),
        blank: score(SCORE_BLANK),
    };

    Some(
        Question::new(
            sheet,
            cell_text(cell(row, text_col)),
            cell_text(cell(row, correct_col)),
            distractors,
        )
        .with_scores(scores)
        .with_choice_columns(choice_columns),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::create_rng;
    use rust_xlsxwriter::Workbook;

    fn write_bank(path: &Path) {
        let mut workbook = Workbook::new();

        let algebra = workbook.add_worksheet();
        algebra.set_name("Algebra").expect("sheet name");
        let headers = [
            QUESTION_TEXT,
            CORRECT_ANSWER,
            "Alternativa 1",
            "alternativa 2",
            CHOICE_COLUMNS,
            SCORE_CORRECT,
        ];
        for (col, h) in headers.iter().enumerate() {
            algebra.write_string(0, col as u16, *h).expect("header");
        }
        algebra.write_string(1, 0, "$2+2$?").expect("cell");
        algebra.write_number(1, 1, 4.0).expect("cell");
        algebra.write_number(1, 2, 5.0).expect("cell");
        algebra.write_number(1, 3, 4.0).expect("cell");
        algebra.write_number(1, 4, 2.0).expect("cell");
        algebra.write_number(1, 5, 6.0).expect("cell");
        // invalid: no correct answer
        algebra.write_string(2, 0, "orphan").expect("cell");

        let empty = workbook.add_worksheet();
        empty.set_name("Vuoto").expect("sheet name");
        empty.write_string(0, 0, QUESTION_TEXT).expect("header");
        empty.write_string(0, 1, CORRECT_ANSWER).expect("header");

        let storia = workbook.add_worksheet();
        storia.set_name("Storia").expect("sheet name");
        storia.write_string(0, 0, QUESTION_TEXT).expect("header");
        storia.write_string(0, 1, CORRECT_ANSWER).expect("header");
        storia.write_string(0, 2, "Alternativa A").expect("header");
        storia.write_string(0, 3, SCORE_WRONG).expect("header");
        storia.write_string(1, 0, "Unità d'Italia?").expect("cell");
        storia.write_string(1, 1, "1861").expect("cell");
        storia.write_string(1, 2, "1848").expect("cell");
        storia.write_string(1, 3, "non numerico").expect("cell");

        workbook.save(path).expect("save workbook");
    }

    #[test]
    fn test_read_questions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("questions.xlsx");
        write_bank(&path);

        let mut rng = create_rng(Some(1));
        let questions = read_questions(&path, &mut rng).expect("bank should load");

        let categories: Vec<&str> = questions.iter().map(|q| q.category.as_str()).collect();
        assert_eq!(categories, vec!["Algebra", "Storia"]);

        let algebra = &questions[0];
        assert_eq!(algebra.text, "$2+2$?");
        let answers: Vec<&str> = algebra.answers.iter().map(|a| a.text.as_str()).collect();
        // distractor equal to the correct answer is dropped
        assert_eq!(answers, vec!["4", "5"]);
        assert!(algebra.answers[0].is_correct);
        assert_eq!(algebra.choice_columns, 2);
        assert_eq!(algebra.scores.correct, Some(6.0));
        assert_eq!(algebra.scores.wrong, None);

        let storia = &questions[1];
        assert_eq!(storia.answers.len(), 2);
        assert_eq!(storia.choice_columns, 1);
        assert!(storia.scores.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let mut rng = create_rng(Some(1));
        let result = read_questions(Path::new("/no/such/questions.xlsx"), &mut rng);
        assert!(result.is_err());
    }
}
