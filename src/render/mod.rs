//! Output rendering: LaTeX variant documents, SVG charts and plaintext reports.

pub mod charts;
pub mod latex;
pub mod reports;

pub use charts::{pie_chart_file_name, question_pie_chart, score_histogram, stacked_bar_chart};
pub use latex::{render_variant, variant_file_stem, DocumentLayout, LatexCompiler};
pub use reports::{
    answer_keys_report, detailed_student_report, question_report, student_report, teacher_report,
};
