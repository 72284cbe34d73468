//! Fixed SVG renderer for chart specifications.
//!
//! The renderer only reads data from a validated `ChartSpec`; nothing in the
//! model's output is interpreted as code.

use super::chart::{ChartSpec, ChartType};
use std::f64::consts::PI;
use std::fmt::Write;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;

const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

fn color(idx: usize) -> &'static str {
    PALETTE[idx % PALETTE.len()]
}

/// Escape text for use in SVG content and attributes.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Render a validated chart to a standalone SVG document.
pub fn render_svg(spec: &ChartSpec) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    if !spec.title.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="32" text-anchor="middle" font-size="20" font-weight="bold">{}</text>"#,
            WIDTH / 2.0,
            escape(&spec.title)
        );
    }

    match spec.chart_type {
        ChartType::Bar | ChartType::Line => draw_axes_chart(&mut svg, spec),
        ChartType::Pie => draw_pie(&mut svg, spec),
    }

    svg.push_str("</svg>\n");
    svg
}

/// Value range for the y axis, always including zero.
fn value_range(spec: &ChartSpec) -> (f64, f64) {
    let values = spec.series.iter().flat_map(|s| s.values.iter().copied());
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < f64::EPSILON {
        (min, min + 1.0)
    } else {
        (min, max)
    }
}

fn draw_axes_chart(svg: &mut String, spec: &ChartSpec) {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let bottom = MARGIN_TOP + plot_h;
    let (min, max) = value_range(spec);
    let y_of = |v: f64| bottom - (v - min) / (max - min) * plot_h;

    // Grid and y-axis ticks
    for tick in 0..=Y_TICKS {
        let value = min + (max - min) * tick as f64 / Y_TICKS as f64;
        let y = y_of(value);
        let _ = writeln!(
            svg,
            r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="12">{label}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_w,
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
            label = format_value(value)
        );
    }

    let zero_y = y_of(0.0);
    let _ = writeln!(
        svg,
        r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#333"/><line x1="{x1}" y1="{top}" x2="{x1}" y2="{bottom}" stroke="#333"/>"##,
        x1 = MARGIN_LEFT,
        x2 = MARGIN_LEFT + plot_w,
        y = zero_y,
        top = MARGIN_TOP,
        bottom = bottom
    );

    let band = plot_w / spec.labels.len() as f64;
    for (idx, label) in spec.labels.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{}" text-anchor="middle" font-size="12">{}</text>"#,
            MARGIN_LEFT + band * (idx as f64 + 0.5),
            bottom + 20.0,
            escape(label)
        );
    }

    match spec.chart_type {
        ChartType::Bar => {
            let group_w = band * 0.8;
            let bar_w = group_w / spec.series.len() as f64;
            for (s_idx, series) in spec.series.iter().enumerate() {
                for (idx, value) in series.values.iter().enumerate() {
                    let x = MARGIN_LEFT + band * idx as f64 + band * 0.1 + bar_w * s_idx as f64;
                    let (top, height) = if *value >= 0.0 {
                        (y_of(*value), zero_y - y_of(*value))
                    } else {
                        (zero_y, y_of(*value) - zero_y)
                    };
                    let _ = writeln!(
                        svg,
                        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                        x,
                        top,
                        bar_w,
                        height,
                        color(s_idx),
                        escape(&series.name),
                        format_value(*value)
                    );
                }
            }
        }
        ChartType::Line => {
            for (s_idx, series) in spec.series.iter().enumerate() {
                let points: Vec<(f64, f64)> = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(idx, v)| (MARGIN_LEFT + band * (idx as f64 + 0.5), y_of(*v)))
                    .collect();
                let path = points
                    .iter()
                    .map(|(x, y)| format!("{:.1},{:.1}", x, y))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                    path,
                    color(s_idx)
                );
                for (x, y) in points {
                    let _ = writeln!(
                        svg,
                        r#"<circle cx="{:.1}" cy="{:.1}" r="3.5" fill="{}"/>"#,
                        x,
                        y,
                        color(s_idx)
                    );
                }
            }
        }
        ChartType::Pie => unreachable!("pie charts have no axes"),
    }

    if let Some(x_label) = spec.x_label.as_deref().filter(|l| !l.is_empty()) {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{}" text-anchor="middle" font-size="14">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 20.0,
            escape(x_label)
        );
    }
    if let Some(y_label) = spec.y_label.as_deref().filter(|l| !l.is_empty()) {
        let cy = MARGIN_TOP + plot_h / 2.0;
        let _ = writeln!(
            svg,
            r#"<text x="18" y="{cy:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 18 {cy:.1})">{}</text>"#,
            escape(y_label)
        );
    }

    let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
    draw_legend(svg, &names);
}

fn draw_pie(svg: &mut String, spec: &ChartSpec) {
    let values = &spec.series[0].values;
    let total: f64 = values.iter().sum();
    let cx = MARGIN_LEFT + (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / 2.0;
    let cy = MARGIN_TOP + (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / 2.0;
    let r = (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / 2.0;

    let mut angle = -PI / 2.0;
    for (idx, value) in values.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let fraction = value / total;
        let title = format!(
            "{}: {} ({:.1}%)",
            escape(&spec.labels[idx]),
            format_value(*value),
            fraction * 100.0
        );

        if fraction >= 1.0 {
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"><title>{}</title></circle>"#,
                cx,
                cy,
                r,
                color(idx),
                title
            );
            break;
        }

        let end = angle + fraction * 2.0 * PI;
        let large_arc = if fraction > 0.5 { 1 } else { 0 };
        let _ = writeln!(
            svg,
            r#"<path d="M {cx:.1} {cy:.1} L {x1:.1} {y1:.1} A {r:.1} {r:.1} 0 {large_arc} 1 {x2:.1} {y2:.1} Z" fill="{fill}" stroke="white"><title>{title}</title></path>"#,
            x1 = cx + r * angle.cos(),
            y1 = cy + r * angle.sin(),
            x2 = cx + r * end.cos(),
            y2 = cy + r * end.sin(),
            fill = color(idx),
        );
        angle = end;
    }

    let names: Vec<&str> = spec.labels.iter().map(String::as_str).collect();
    draw_legend(svg, &names);
}

fn draw_legend(svg: &mut String, names: &[&str]) {
    let x = WIDTH - MARGIN_RIGHT + 20.0;
    for (idx, name) in names.iter().enumerate() {
        let y = MARGIN_TOP + 22.0 * idx as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{x}" y="{y}" width="12" height="12" fill="{}"/><text x="{tx}" y="{ty}" font-size="12">{}</text>"#,
            color(idx),
            escape(name),
            tx = x + 18.0,
            ty = y + 10.0
        );
    }
}
