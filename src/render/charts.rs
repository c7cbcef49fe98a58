//! SVG charts for the grading reports.
//!
//! Geometry is computed here; markup comes from small tera templates rendered
//! with autoescaping so category names are safe to embed.

use crate::analytics::{CohortStatistics, QuestionAnalytics};
use crate::error::RenderError;
use serde::Serialize;
use std::f64::consts::PI;
use tera::{Context, Tera};

const CORRECT_COLOR: &str = "#2e7d32";
const WRONG_COLOR: &str = "#c62828";
const BLANK_COLOR: &str = "#9e9e9e";

/// Number of histogram bins.
pub const HISTOGRAM_BINS: usize = 10;

const PIE_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="480" height="400" viewBox="0 0 480 400">
<rect width="100%" height="100%" fill="white"/>
<text x="240" y="30" text-anchor="middle" font-family="sans-serif" font-size="16">Distribuzione Risposte - Domanda: {{ title }}</text>
{% for s in slices %}{% if s.full %}<circle cx="{{ cx }}" cy="{{ cy }}" r="{{ r }}" fill="{{ s.color }}" stroke="white"/>
{% else %}<path d="{{ s.path }}" fill="{{ s.color }}" stroke="white"/>
{% endif %}<text x="{{ s.label_x }}" y="{{ s.label_y }}" text-anchor="middle" font-family="sans-serif" font-size="12">{{ s.label }} {{ s.percent }}%</text>
{% endfor %}</svg>
"##;

const STACKED_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
<rect width="100%" height="100%" fill="white"/>
<text x="{{ width / 2 }}" y="24" text-anchor="middle" font-family="sans-serif" font-size="16">Distribuzione Risposte per Domanda</text>
<line x1="{{ left }}" y1="{{ top }}" x2="{{ left }}" y2="{{ bottom }}" stroke="black"/>
<line x1="{{ left }}" y1="{{ bottom }}" x2="{{ width - 20 }}" y2="{{ bottom }}" stroke="black"/>
{% for tick in ticks %}<text x="{{ left - 6 }}" y="{{ tick.y }}" text-anchor="end" font-family="sans-serif" font-size="10">{{ tick.label }}</text>
{% endfor %}{% for bar in bars %}{% for seg in bar.segments %}<rect x="{{ bar.x }}" y="{{ seg.y }}" width="{{ bar_width }}" height="{{ seg.height }}" fill="{{ seg.color }}"/>
{% endfor %}<text x="{{ bar.label_x }}" y="{{ bottom + 14 }}" text-anchor="end" font-family="sans-serif" font-size="11" transform="rotate(-45 {{ bar.label_x }} {{ bottom + 14 }})">{{ bar.label }}</text>
{% endfor %}{% for item in legend %}<rect x="{{ item.x }}" y="40" width="12" height="12" fill="{{ item.color }}"/><text x="{{ item.x + 16 }}" y="50" font-family="sans-serif" font-size="11">{{ item.label }}</text>
{% endfor %}</svg>
"##;

const HISTOGRAM_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="400" viewBox="0 0 640 400">
<rect width="100%" height="100%" fill="white"/>
<text x="320" y="24" text-anchor="middle" font-family="sans-serif" font-size="16">Distribuzione dei Punteggi</text>
<line x1="{{ left }}" y1="{{ top }}" x2="{{ left }}" y2="{{ bottom }}" stroke="black"/>
<line x1="{{ left }}" y1="{{ bottom }}" x2="{{ right }}" y2="{{ bottom }}" stroke="black"/>
{% for bin in bins %}<rect x="{{ bin.x }}" y="{{ bin.y }}" width="{{ bin.width }}" height="{{ bin.height }}" fill="skyblue" stroke="black"/>
{% endfor %}{% for tick in ticks %}<text x="{{ tick.x }}" y="{{ bottom + 16 }}" text-anchor="middle" font-family="sans-serif" font-size="10">{{ tick.label }}</text>
{% endfor %}{% for marker in markers %}<line x1="{{ marker.x }}" y1="{{ top }}" x2="{{ marker.x }}" y2="{{ bottom }}" stroke="{{ marker.color }}" stroke-width="2" stroke-dasharray="{{ marker.dash }}"/>
<text x="{{ right - 10 }}" y="{{ marker.legend_y }}" text-anchor="end" font-family="sans-serif" font-size="11" fill="{{ marker.color }}">{{ marker.label }}</text>
{% endfor %}<text x="{{ center }}" y="390" text-anchor="middle" font-family="sans-serif" font-size="12">Punteggio</text>
</svg>
"##;

#[derive(Serialize)]
struct Slice {
    path: String,
    full: bool,
    color: &'static str,
    label: &'static str,
    percent: String,
    label_x: String,
    label_y: String,
}

/// Pie chart of correct/wrong/blank shares for one question.
pub fn question_pie_chart(item: &QuestionAnalytics) -> Result<String, RenderError> {
    let (cx, cy, r) = (240.0, 215.0, 140.0);
    let parts = [
        ("Corrette", item.correct_pct, CORRECT_COLOR),
        ("Errate", item.wrong_pct, WRONG_COLOR),
        ("Non Date", item.blank_pct, BLANK_COLOR),
    ];
    let total: f64 = parts.iter().map(|p| p.1).sum();

    // start at 140 degrees, counter-clockwise
    let mut angle = 140f64.to_radians();
    let mut slices = Vec::new();
    for (label, value, color) in parts {
        if value <= 0.0 || total <= 0.0 {
            continue;
        }
        let sweep = value / total * 2.0 * PI;
        let end = angle + sweep;
        let point = |a: f64| (cx + r * a.cos(), cy - r * a.sin());
        let (x1, y1) = point(angle);
        let (x2, y2) = point(end);
        let large_arc = u8::from(sweep > PI);
        let mid = angle + sweep / 2.0;
        let (lx, ly) = (cx + r * 0.6 * mid.cos(), cy - r * 0.6 * mid.sin());

        slices.push(Slice {
            path: format!(
                "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 0 {:.2} {:.2} Z",
                cx, cy, x1, y1, r, r, large_arc, x2, y2
            ),
            full: sweep >= 2.0 * PI - 1e-9,
            color,
            label,
            percent: format!("{:.1}", value / total * 100.0),
            label_x: format!("{:.2}", if sweep >= 2.0 * PI - 1e-9 { cx } else { lx }),
            label_y: format!("{:.2}", if sweep >= 2.0 * PI - 1e-9 { cy } else { ly }),
        });
        angle = end;
    }

    let mut context = Context::new();
    context.insert("title", &item.category);
    context.insert("cx", &cx);
    context.insert("cy", &cy);
    context.insert("r", &r);
    context.insert("slices", &slices);
    Ok(Tera::one_off(PIE_TEMPLATE, &context, true)?)
}

#[derive(Serialize)]
struct Segment {
    y: String,
    height: String,
    color: &'static str,
}

#[derive(Serialize)]
struct Bar {
    x: String,
    label_x: String,
    label: String,
    segments: Vec<Segment>,
}

#[derive(Serialize)]
struct Tick {
    x: String,
    y: String,
    label: String,
}

#[derive(Serialize)]
struct LegendItem {
    x: f64,
    color: &'static str,
    label: &'static str,
}

/// Stacked percentage bars (correct, blank, wrong) for every question.
pub fn stacked_bar_chart(items: &[QuestionAnalytics]) -> Result<String, RenderError> {
    let (left, top, plot_height) = (60.0, 60.0, 300.0);
    let bottom = top + plot_height;
    let slot = 48.0;
    let bar_width = slot * 0.8;
    let width = (left + slot * items.len() as f64 + 40.0).max(480.0);
    let height = bottom + 120.0;

    let bars: Vec<Bar> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let x = left + slot * i as f64 + (slot - bar_width) / 2.0;
            let mut base = bottom;
            let segments = [
                (item.correct_pct, CORRECT_COLOR),
                (item.blank_pct, BLANK_COLOR),
                (item.wrong_pct, WRONG_COLOR),
            ]
            .into_iter()
            .map(|(pct, color)| {
                let h = pct.clamp(0.0, 100.0) / 100.0 * plot_height;
                base -= h;
                Segment {
                    y: format!("{:.2}", base),
                    height: format!("{:.2}", h),
                    color,
                }
            })
            .collect();
            Bar {
                x: format!("{:.2}", x),
                label_x: format!("{:.2}", x + bar_width / 2.0),
                label: item.category.clone(),
                segments,
            }
        })
        .collect();

    let ticks: Vec<Tick> = (0..=4)
        .map(|i| {
            let pct = i as f64 * 25.0;
            Tick {
                x: String::new(),
                y: format!("{:.2}", bottom - pct / 100.0 * plot_height + 4.0),
                label: format!("{}%", pct),
            }
        })
        .collect();

    let legend = vec![
        LegendItem { x: left, color: CORRECT_COLOR, label: "Corrette" },
        LegendItem { x: left + 90.0, color: BLANK_COLOR, label: "Non Date" },
        LegendItem { x: left + 180.0, color: WRONG_COLOR, label: "Errate" },
    ];

    let mut context = Context::new();
    context.insert("width", &width);
    context.insert("height", &height);
    context.insert("left", &left);
    context.insert("top", &top);
    context.insert("bottom", &bottom);
    context.insert("bar_width", &format!("{:.2}", bar_width));
    context.insert("bars", &bars);
    context.insert("ticks", &ticks);
    context.insert("legend", &legend);
    Ok(Tera::one_off(STACKED_TEMPLATE, &context, true)?)
}

#[derive(Serialize)]
struct Bin {
    x: String,
    y: String,
    width: String,
    height: String,
}

#[derive(Serialize)]
struct Marker {
    x: String,
    color: &'static str,
    dash: &'static str,
    label: &'static str,
    legend_y: f64,
}

/// Bin counts over `[lo, hi]`. A zero-width range is widened by 0.5 each side.
pub fn histogram_bins(scores: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    if scores.is_empty() || bins == 0 {
        return (0.0, 1.0, vec![0; bins]);
    }
    let mut lo = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo <= 0.0 {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0; bins];
    for score in scores {
        let index = (((score - lo) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    (lo, hi, counts)
}

/// Histogram of total scores with mean, median and passing-score markers.
pub fn score_histogram(scores: &[f64], stats: &CohortStatistics) -> Result<String, RenderError> {
    let (left, right, top, bottom) = (60.0, 620.0, 50.0, 350.0);
    let (lo, hi, counts) = histogram_bins(scores, HISTOGRAM_BINS);

    let passing = stats.passing_score();
    let domain_lo = [lo, stats.average_score, stats.median_score, passing]
        .into_iter()
        .fold(f64::INFINITY, f64::min);
    let domain_hi = [hi, stats.average_score, stats.median_score, passing]
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    let span = (domain_hi - domain_lo).max(f64::EPSILON);
    let x_of = |v: f64| left + (v - domain_lo) / span * (right - left);

    let max_count = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let bin_width = (hi - lo) / HISTOGRAM_BINS as f64;
    let bins: Vec<Bin> = counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let x0 = x_of(lo + bin_width * i as f64);
            let x1 = x_of(lo + bin_width * (i + 1) as f64);
            let h = *count as f64 / max_count * (bottom - top);
            Bin {
                x: format!("{:.2}", x0),
                y: format!("{:.2}", bottom - h),
                width: format!("{:.2}", (x1 - x0).max(0.0)),
                height: format!("{:.2}", h),
            }
        })
        .collect();

    let ticks: Vec<Tick> = (0..=HISTOGRAM_BINS)
        .step_by(2)
        .map(|i| {
            let v = lo + bin_width * i as f64;
            Tick {
                x: format!("{:.2}", x_of(v)),
                y: String::new(),
                label: format!("{:.1}", v),
            }
        })
        .collect();

    let markers = vec![
        Marker {
            x: format!("{:.2}", x_of(stats.average_score)),
            color: "red",
            dash: "6,4",
            label: "Media",
            legend_y: top + 10.0,
        },
        Marker {
            x: format!("{:.2}", x_of(stats.median_score)),
            color: "green",
            dash: "none",
            label: "Mediana",
            legend_y: top + 26.0,
        },
        Marker {
            x: format!("{:.2}", x_of(passing)),
            color: "orange",
            dash: "8,3,2,3",
            label: "Soglia Sufficienza",
            legend_y: top + 42.0,
        },
    ];

    let mut context = Context::new();
    context.insert("left", &left);
    context.insert("right", &right);
    context.insert("center", &((left + right) / 2.0));
    context.insert("top", &top);
    context.insert("bottom", &bottom);
    context.insert("bins", &bins);
    context.insert("ticks", &ticks);
    context.insert("markers", &markers);
    Ok(Tera::one_off(HISTOGRAM_TEMPLATE, &context, true)?)
}

/// File name for a question's pie chart, with characters invalid in paths removed.
pub fn pie_chart_file_name(category: &str) -> String {
    let safe: String = category
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect();
    format!("question_{}.svg", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::QuestionTally;

    fn item(category: &str, correct: f64, wrong: f64, blank: f64) -> QuestionAnalytics {
        QuestionAnalytics {
            category: category.to_string(),
            tally: QuestionTally::default(),
            correct_pct: correct,
            wrong_pct: wrong,
            blank_pct: blank,
            difficulty: 1.0 - correct / 100.0,
            discrimination: 0.0,
        }
    }

    #[test]
    fn test_pie_chart() {
        let svg = question_pie_chart(&item("Algebra <1>", 50.0, 25.0, 25.0)).expect("render");
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("Corrette 50.0%"));
        assert!(svg.contains("Algebra &lt;1&gt;"));
    }

    #[test]
    fn test_pie_chart_single_slice() {
        let svg = question_pie_chart(&item("Q", 100.0, 0.0, 0.0)).expect("render");
        assert_eq!(svg.matches("<circle").count(), 1);
        assert_eq!(svg.matches("<path").count(), 0);
    }

    #[test]
    fn test_stacked_bar_chart() {
        let items = vec![item("A", 60.0, 20.0, 20.0), item("B", 10.0, 90.0, 0.0)];
        let svg = stacked_bar_chart(&items).expect("render");
        // 2 bars x 3 segments + background + 3 legend swatches
        assert_eq!(svg.matches("<rect").count(), 10);
        assert!(svg.contains(">A</text>"));
    }

    #[test]
    fn test_histogram_bins() {
        let (lo, hi, counts) = histogram_bins(&[0.0, 1.0, 2.0, 10.0], 10);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 10.0);
        assert_eq!(counts.iter().sum::<usize>(), 4);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[9], 1);

        let (lo, hi, counts) = histogram_bins(&[5.0, 5.0], 10);
        assert_eq!((lo, hi), (4.5, 5.5));
        assert_eq!(counts.iter().filter(|c| **c == 2).count(), 1);
    }

    #[test]
    fn test_score_histogram() {
        let mut stats = CohortStatistics::empty(0.58);
        stats.average_score = 6.0;
        stats.median_score = 5.0;
        stats.avg_max_score = 12.0;
        let svg = score_histogram(&[1.0, 5.0, 5.0, 8.0, 12.0], &stats).expect("render");
        assert_eq!(svg.matches("fill=\"skyblue\"").count(), HISTOGRAM_BINS);
        assert!(svg.contains("Soglia Sufficienza"));
    }

    #[test]
    fn test_pie_chart_file_name() {
        assert_eq!(pie_chart_file_name("Cap. 1: <Moto>?"), "question_Cap. 1 Moto.svg");
    }
}
