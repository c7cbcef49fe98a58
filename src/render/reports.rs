//! Plaintext reports for both phases.
//!
//! Builders return the whole report as a `String`; writing is left to the
//! pipeline. Numbers are shown rounded to two decimals.

use crate::analytics::stats::round2;
use crate::analytics::{CohortStatistics, QuestionAnalytics};
use crate::grading::{GradedResult, Outcome};
use crate::registry::AnswerKeyRegistry;

fn num(value: f64) -> String {
    round2(value).to_string()
}

fn by_total_desc(results: &[GradedResult]) -> Vec<&GradedResult> {
    let mut sorted: Vec<&GradedResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}

/// One line per variant: `Variante <id>: Domanda 1: <label> (<category>) ...`.
pub fn answer_keys_report(registry: &AnswerKeyRegistry) -> String {
    registry
        .variants()
        .iter()
        .map(|key| {
            let questions: Vec<String> = key
                .entries
                .iter()
                .map(|e| format!("Domanda {}: {} ({})", e.number, e.label, e.category))
                .collect();
            format!("Variante {}: {}", key.variant_id, questions.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-category item analysis.
pub fn question_report(items: &[QuestionAnalytics], stats: &CohortStatistics) -> String {
    let mut lines = vec![
        "=== Report delle Domande ===".to_string(),
        String::new(),
        format!("Numero totale di domande: {}", items.len()),
        format!("Numero totale di studenti: {}", stats.num_students),
        format!("Punteggio medio del test: {}", num(stats.average_score)),
        String::new(),
        "Dettaglio per Domanda:".to_string(),
    ];

    for item in items {
        lines.push(String::new());
        lines.push(format!("== Domanda: {} ==", item.category));
        lines.push(format!(
            "Risposte corrette: {} ({}%)",
            item.tally.correct,
            num(item.correct_pct)
        ));
        lines.push(format!(
            "Risposte errate: {} ({}%)",
            item.tally.wrong,
            num(item.wrong_pct)
        ));
        lines.push(format!(
            "Risposte non date: {} ({}%)",
            item.tally.blank,
            num(item.blank_pct)
        ));
        lines.push(format!(
            "Indice di difficoltà: {} (0=facile, 1=difficile)",
            num(item.difficulty)
        ));
        lines.push(format!(
            "Indice di discriminazione: {} (-1=negativo, 1=positivo)",
            num(item.discrimination)
        ));
        lines.push(format!("Valutazione difficoltà: {}", item.difficulty_rating()));
        lines.push(format!(
            "Valutazione discriminazione: {}",
            item.discrimination_rating()
        ));
    }

    lines.join("\n")
}

fn cohort_lines(stats: &CohortStatistics) -> Vec<String> {
    vec![
        format!("Numero di studenti: {}", stats.num_students),
        format!("Punteggio medio: {}", num(stats.average_score)),
        format!("Punteggio mediano: {}", num(stats.median_score)),
        format!("Deviazione standard: {}", num(stats.std_deviation)),
        format!("Punteggio minimo: {}", num(stats.min_score)),
        format!("Punteggio massimo: {}", num(stats.max_score)),
        format!(
            "Quartili (25%, 50%, 75%): {}, {}, {}",
            num(stats.quartiles[0]),
            num(stats.quartiles[1]),
            num(stats.quartiles[2])
        ),
        format!("Soglia di sufficienza: {}%", num(stats.passing_threshold * 100.0)),
        format!("Percentuale di promossi: {}%", num(stats.pass_rate * 100.0)),
        format!("Media risposte corrette: {}", num(stats.avg_correct_count)),
        format!("Media risposte errate: {}", num(stats.avg_wrong_count)),
        format!("Media risposte non date: {}", num(stats.avg_blank_count)),
        format!("Media punti risposte corrette: {}", num(stats.avg_correct_score)),
        format!("Media punti risposte errate: {}", num(stats.avg_wrong_score)),
        format!("Media punti risposte non date: {}", num(stats.avg_blank_score)),
    ]
}

/// Cohort statistics followed by a table of students, best first.
pub fn student_report(results: &[GradedResult], stats: &CohortStatistics) -> String {
    let mut lines = vec![
        "=== Report degli Studenti ===".to_string(),
        String::new(),
        "Statistiche Generali:".to_string(),
    ];
    lines.extend(cohort_lines(stats));
    lines.push(String::new());
    lines.push("Dettaglio per Studente:".to_string());
    lines.push(
        "Student ID | Var | Corr | Err | ND | P.Corr | P.Err | P.ND | Tot | Max | % | %ile | Z | Stanine"
            .to_string(),
    );
    lines.push("-".repeat(100));

    for r in by_total_desc(results) {
        let (percentile, z_score, stanine) = match r.standing {
            Some(s) => (num(s.percentile), num(s.z_score), s.stanine.to_string()),
            None => ("0".to_string(), "0".to_string(), String::new()),
        };
        lines.push(format!(
            "{} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {}% | {} | {} | {}",
            r.student_id,
            r.variant_id,
            r.correct_count,
            r.wrong_count,
            r.blank_count,
            num(r.correct_score),
            num(r.wrong_score),
            num(r.blank_score),
            num(r.total_score),
            num(r.max_score),
            num(r.percentage),
            percentile,
            z_score,
            stanine
        ));
    }

    lines.join("\n")
}

/// One block per student, best first, with every answer spelled out.
pub fn detailed_student_report(results: &[GradedResult]) -> String {
    let mut lines = vec!["=== Report Dettagliato degli Studenti ===".to_string()];

    for r in by_total_desc(results) {
        lines.push(String::new());
        lines.push(format!("---- Studente: {} ----", r.student_id));
        lines.push(format!("Variante del test: {}", r.variant_id));
        lines.push(String::new());
        lines.push(format!(
            "Punteggio totale: {} su {} ({}%)",
            num(r.total_score),
            num(r.max_score),
            num(r.percentage)
        ));
        lines.push(format!(
            "Punti da risposte corrette: {} (n. risposte: {})",
            num(r.correct_score),
            r.correct_count
        ));
        lines.push(format!(
            "Punti da risposte errate: {} (n. risposte: {})",
            num(r.wrong_score),
            r.wrong_count
        ));
        lines.push(format!(
            "Punti da risposte non date: {} (n. risposte: {})",
            num(r.blank_score),
            r.blank_count
        ));

        if let Some(s) = r.standing {
            lines.push(String::new());
            lines.push("Confrontato con la classe:".to_string());
            lines.push(format!("Percentile: {} (0-100)", num(s.percentile)));
            lines.push(format!(
                "Z-Score: {} (distanza dalla media in unità di deviazione standard)",
                num(s.z_score)
            ));
            lines.push(format!("Stanine: {} (F- = peggiore, S+ = migliore)", s.stanine));
        }

        lines.push(String::new());
        lines.push("Dettaglio risposte:".to_string());
        for a in &r.answers {
            let status = match a.outcome {
                Outcome::Correct => format!("CORRETTA (punti: {})", num(a.points)),
                Outcome::Wrong => format!(
                    "ERRATA - Risposta corretta: {} (punti: {})",
                    a.correct_label,
                    num(a.points)
                ),
                Outcome::Blank => format!("NON DATA (punti: {})", num(a.points)),
            };
            let response = if a.outcome == Outcome::Blank {
                "-"
            } else {
                a.response.as_str()
            };
            lines.push(format!(
                "Domanda {} ({}): Risposta: {} - {}",
                a.number, a.category, response, status
            ));
        }
    }

    lines.join("\n")
}

/// Short cohort summary plus every variant's answer key.
pub fn teacher_report(stats: &CohortStatistics, registry: &AnswerKeyRegistry) -> String {
    let mut lines = vec![
        "=== Report Sintetico per l'Insegnante ===".to_string(),
        format!("Numero di studenti: {}", stats.num_students),
        format!("Punteggio medio: {}", num(stats.average_score)),
        format!("Mediana: {}", num(stats.median_score)),
        format!("Deviazione standard: {}", num(stats.std_deviation)),
        format!("Percentuale di promossi: {}%", num(stats.pass_rate * 100.0)),
        String::new(),
        "Dettaglio per variante:".to_string(),
    ];

    for key in registry.variants() {
        lines.push(String::new());
        lines.push(format!("Variante {}:", key.variant_id));
        for e in &key.entries {
            lines.push(format!(
                "Domanda {}: Risposta {} (Foglio: {})",
                e.number, e.label, e.category
            ));
        }
    }

    lines.join("\n")
}
