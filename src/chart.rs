//! SVG rendering of a scaling report: one bar per worker count, with a
//! dotted line and markers joining the bar tops.

use std::fmt::Write as _;
use std::path::Path;

use crate::storage::{write_atomic, PersistenceError, ScalingReport};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;

/// Renders `report` as a standalone SVG document.
pub fn render_svg(report: &ScalingReport) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x0 = MARGIN_LEFT;
    let y0 = MARGIN_TOP + plot_h;
    let y_max = nice_ceiling(report.max_elapsed());

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="24" text-anchor="middle" font-size="16">Search time by worker count</text>"#,
        WIDTH / 2.0
    );

    // Axes and y grid
    for i in 0..=Y_TICKS {
        let value = y_max * i as f64 / Y_TICKS as f64;
        let y = y0 - plot_h * i as f64 / Y_TICKS as f64;
        let _ = writeln!(
            svg,
            r##"<line x1="{x0}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
            x0 + plot_w
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            x0 - 6.0,
            y + 4.0,
            format_seconds(value)
        );
    }
    let _ = writeln!(
        svg,
        r#"<line x1="{x0}" y1="{y0}" x2="{:.1}" y2="{y0}" stroke="black"/>"#,
        x0 + plot_w
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{x0}" y1="{MARGIN_TOP}" x2="{x0}" y2="{y0}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Workers</text>"#,
        x0 + plot_w / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{:.1}" text-anchor="middle" transform="rotate(-90 18 {:.1})">Elapsed time, s</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0
    );

    if !report.is_empty() {
        let slot = plot_w / report.len() as f64;
        let bar_w = slot * 0.5;
        let mut points = Vec::with_capacity(report.len());

        for (i, (workers, seconds)) in report.iter().enumerate() {
            let center = x0 + slot * (i as f64 + 0.5);
            let bar_h = if y_max > 0.0 { plot_h * seconds / y_max } else { 0.0 };
            let top = y0 - bar_h;
            points.push((center, top));

            let _ = writeln!(
                svg,
                r##"<rect x="{:.1}" y="{top:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="#4c72b0"><title>{workers} worker(s): {seconds:.3} s</title></rect>"##,
                center - bar_w / 2.0
            );
            let _ = writeln!(
                svg,
                r#"<text x="{center:.1}" y="{:.1}" text-anchor="middle">{workers}</text>"#,
                y0 + 18.0
            );
        }

        let polyline: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="black" stroke-dasharray="2,4"/>"#,
            polyline.join(" ")
        );
        for (x, y) in points {
            let _ = writeln!(
                svg,
                r#"<path d="M{:.1},{:.1} L{:.1},{:.1} M{:.1},{:.1} L{:.1},{:.1}" stroke="black" stroke-width="2"/>"#,
                x - 5.0,
                y - 5.0,
                x + 5.0,
                y + 5.0,
                x - 5.0,
                y + 5.0,
                x + 5.0,
                y - 5.0
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Renders `report` and writes it to `path`.
pub fn write_chart(report: &ScalingReport, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    write_atomic(path.as_ref(), render_svg(report).as_bytes())
}

/// Rounds `value` up to 1, 2 or 5 times a power of ten.
fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let scaled = value / magnitude;
    let step = if scaled <= 1.0 {
        1.0
    } else if scaled <= 2.0 {
        2.0
    } else if scaled <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

fn format_seconds(value: f64) -> String {
    if value >= 10.0 {
        format!("{:.0}", value)
    } else if value >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::StatisticsRecord;
    use crate::storage::tests::temp_path;

    fn report() -> ScalingReport {
        ScalingReport::from_records(&[
            StatisticsRecord::new(1, 8.0),
            StatisticsRecord::new(2, 4.2),
            StatisticsRecord::new(4, 2.5),
        ])
    }

    #[test]
    fn test_one_bar_per_worker_count() {
        let svg = render_svg(&report());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches(r##"fill="#4c72b0""##).count(), 3);
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("4 worker(s): 2.500 s"));
    }

    #[test]
    fn test_empty_report_renders_axes_only() {
        let svg = render_svg(&ScalingReport::default());
        assert!(svg.contains("Workers"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(0.0), 1.0);
        assert_eq!(nice_ceiling(8.0), 10.0);
        assert_eq!(nice_ceiling(4.2), 5.0);
        assert_eq!(nice_ceiling(150.0), 200.0);
    }

    #[test]
    fn test_write_chart() {
        let path = temp_path("chart.svg");
        write_chart(&report(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_svg(&report()));
        let _ = std::fs::remove_file(&path);
    }
}
