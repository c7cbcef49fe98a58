//! Variant documents: LaTeX source rendering and PDF compilation.
//!
//! Documents use the `exam` class. Question and answer texts are LaTeX
//! source and are inserted verbatim.

use crate::config::{AnswerLabelFormat, ExamConfig};
use crate::error::RenderError;
use crate::generator::Variant;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tera::{Context, Tera};
use tracing::{debug, warn};

/// Answer-grid columns per row.
pub const GRID_COLUMNS: usize = 10;

/// How many times the compiler runs per document.
const COMPILER_PASSES: usize = 2;

/// Auxiliary files removed after compilation.
const AUX_EXTENSIONS: [&str; 6] = ["aux", "log", "out", "toc", "fls", "fdb_latexmk"];

const VARIANT_TEMPLATE: &str = r#"\documentclass{exam}
\usepackage[{{ geometry }}]{geometry}
\usepackage{multicol}
\usepackage{enumitem}
\usepackage{fancyhdr}
\usepackage{graphicx}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{fancybox}
\usepackage{siunitx}
\renewcommand{\questionlabel}{\thequestion.\hspace{0.5em}}
\renewcommand{\choicelabel}{({{ choice_counter }}{choice})\hspace{0.3em}}
{% raw %}\newcommand{\um}[2]{\SI[output-decimal-marker={,}]{#1}{#2}}{% endraw %}
\firstpageheader{ {{- header_left -}} }{ {{- header_center -}} }{ {{- header_right -}} }
\runningfooter{ {{- footer_left -}} }{ {{- footer_center -}} }{ {{- footer_right -}} }
\newcounter{variant}
\begin{document}
\setcounter{variant}{ {{- variant_id -}} }
\noindent \textbf{\makebox[0.60\textwidth]{Nome e cognome:\enspace\hrulefill} \makebox[0.15\textwidth]{ Classe:\enspace\hrulefill} \makebox[0.20\textwidth]{ Data:\enspace\hrulefill}}
\bigskip
\noindent\textbf{Griglia Risposte (variante {{ variant_id }})}
{% for row in grid %}
\begin{center}
\begin{tabular}{|{% for n in row %}c|{% endfor %}}
\hline
{{ row | join(sep=" & ") }} \\ \hline
{% for n in row %}{% if not loop.first %} & {% endif %}\rule{1cm}{0pt}\rule[-0.5em]{0pt}{1.5em}{% endfor %} \\ \hline
\end{tabular}
\end{center}
{% if not loop.last %}\vspace{0.3em}{% endif %}
{% endfor %}
\vspace{1em}
\begin{questions}
{% for q in questions %}
\question {{ q.text }}
\vspace{0.2em}
{% if q.answers | length > 0 %}
{% if q.columns > 1 %}\begin{multicols}{ {{- q.columns -}} }{% endif %}
\begin{choices}
{% for answer in q.answers %}\choice {{ answer }}
{% endfor %}\end{choices}
{% if q.columns > 1 %}\end{multicols}{% endif %}
{% endif %}
{% endfor %}
\end{questions}
\end{document}
"#;

/// Page layout shared by every variant of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub geometry: String,
    pub header_left: String,
    pub header_center: String,
    pub header_right: String,
    pub footer_left: String,
    pub footer_center: String,
    pub footer_right: String,
    pub label_format: AnswerLabelFormat,
}

impl DocumentLayout {
    pub fn from_config(config: &ExamConfig) -> Self {
        Self {
            geometry: config.geometry_options.clone(),
            header_left: config.firstpageheader_left.clone(),
            header_center: config.header_center().to_string(),
            header_right: config.firstpageheader_right.clone(),
            footer_left: config.runningfooter_left.clone(),
            footer_center: config.runningfooter_center.clone(),
            footer_right: config.runningfooter_right.clone(),
            label_format: config.choice_label_format,
        }
    }
}

#[derive(Serialize)]
struct QuestionView<'a> {
    text: &'a str,
    answers: Vec<&'a str>,
    columns: usize,
}

/// Question numbers of the answer grid, at most [`GRID_COLUMNS`] per row.
pub fn answer_grid(questions: usize) -> Vec<Vec<String>> {
    (1..=questions)
        .collect::<Vec<_>>()
        .chunks(GRID_COLUMNS)
        .map(|chunk| chunk.iter().map(|n| n.to_string()).collect())
        .collect()
}

/// Renders the LaTeX source of one variant.
pub fn render_variant(variant: &Variant, layout: &DocumentLayout) -> Result<String, RenderError> {
    let questions: Vec<QuestionView> = variant
        .questions
        .iter()
        .map(|q| QuestionView {
            text: &q.text,
            answers: q.answers.iter().map(|a| a.text.as_str()).collect(),
            columns: q.choice_columns,
        })
        .collect();

    let mut context = Context::new();
    context.insert("geometry", &layout.geometry);
    context.insert("choice_counter", layout.label_format.latex_counter());
    context.insert("header_left", &layout.header_left);
    context.insert("header_center", &layout.header_center);
    context.insert("header_right", &layout.header_right);
    context.insert("footer_left", &layout.footer_left);
    context.insert("footer_center", &layout.footer_center);
    context.insert("footer_right", &layout.footer_right);
    context.insert("variant_id", &variant.id);
    context.insert("grid", &answer_grid(variant.questions.len()));
    context.insert("questions", &questions);

    Ok(Tera::one_off(VARIANT_TEMPLATE, &context, false)?)
}

/// File stem used for a variant's `.tex` and `.pdf`.
pub fn variant_file_stem(variant_id: &str) -> String {
    format!("test_variant_{}", variant_id)
}

/// Blocking wrapper around the external LaTeX compiler.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
}

impl LatexCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Checks that the compiler can be started.
    pub fn check_available(&self) -> Result<(), RenderError> {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|_| ())
            .map_err(|e| RenderError::CompilerUnavailable {
                compiler: self.program.clone(),
                reason: e.to_string(),
            })
    }

    /// Compiles `tex_path` into `pdf_dir`.
    ///
    /// The compiler runs a fixed number of passes regardless of exit status;
    /// compilation succeeded if the PDF exists afterwards. Auxiliary files are
    /// removed in every case.
    pub fn compile(
        &self,
        tex_path: &Path,
        pdf_dir: &Path,
        variant_id: &str,
    ) -> Result<PathBuf, RenderError> {
        let stem = tex_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| variant_file_stem(variant_id));
        let pdf_path = pdf_dir.join(format!("{}.pdf", stem));

        let result = self.run_passes(tex_path, pdf_dir);
        cleanup_aux_files(pdf_dir, &stem);
        if let Some(tex_dir) = tex_path.parent() {
            cleanup_aux_files(tex_dir, &stem);
        }
        result?;

        if pdf_path.exists() {
            Ok(pdf_path)
        } else {
            Err(RenderError::NoOutput {
                variant: variant_id.to_string(),
            })
        }
    }

    fn run_passes(&self, tex_path: &Path, pdf_dir: &Path) -> Result<(), RenderError> {
        for pass in 1..=COMPILER_PASSES {
            let output = Command::new(&self.program)
                .arg("-interaction=nonstopmode")
                .arg(format!("-output-directory={}", pdf_dir.display()))
                .arg(tex_path)
                .output()
                .map_err(|e| RenderError::CompilerUnavailable {
                    compiler: self.program.clone(),
                    reason: e.to_string(),
                })?;
            debug!(
                tex = %tex_path.display(),
                pass,
                status = ?output.status.code(),
                "Compiler pass finished"
            );
        }
        Ok(())
    }
}

fn cleanup_aux_files(dir: &Path, stem: &str) {
    for ext in AUX_EXTENSIONS {
        let path = dir.join(format!("{}.{}", stem, ext));
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Could not remove auxiliary file");
            }
        }
    }
}
