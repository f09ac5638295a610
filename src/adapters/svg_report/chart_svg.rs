//! SVG line chart rendering.

use chrono::NaiveDateTime;

/// Every Nth bar gets an x-axis label, starting at index 1.
pub const TICK_EVERY: usize = 30;

pub struct LineSeries<'a> {
    pub label: &'a str,
    pub color: &'a str,
    pub values: &'a [f64],
}

pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub y_label: &'a str,
    pub width: f64,
    pub height: f64,
    pub timestamps: &'a [NaiveDateTime],
    pub lines: &'a [LineSeries<'a>],
}

const PADDING: f64 = 50.0;

fn value_range(lines: &[LineSeries]) -> Option<(f64, f64)> {
    let mut values = lines
        .iter()
        .flat_map(|l| l.values.iter().copied())
        .filter(|v| v.is_finite());
    let first = values.next()?;
    Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub fn tick_indexes(len: usize) -> Vec<usize> {
    (0..len).filter(|i| i % TICK_EVERY == 1).collect()
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a chart as an SVG `<g>` group positioned at (`x`, `y`). Returns an
/// empty string when there is nothing to plot.
pub fn render_chart_group(spec: &ChartSpec, x: f64, y: f64) -> String {
    let n = spec.timestamps.len();
    let Some((min_v, max_v)) = value_range(spec.lines) else {
        return String::new();
    };
    if n == 0 {
        return String::new();
    }

    let plot_width = spec.width - 2.0 * PADDING;
    let plot_height = spec.height - 2.0 * PADDING;

    let range = max_v - min_v;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if n > 1 {
        plot_width / (n - 1) as f64
    } else {
        0.0
    };
    let to_x = |i: usize| PADDING + i as f64 * scale_x;
    let to_y = |v: f64| spec.height - PADDING - (v - min_v) * scale_y;

    let mut svg = format!(r#"<g transform="translate({:.1},{:.1})">"#, x, y);
    svg.push_str(&format!(
        r#"<rect width="{:.0}" height="{:.0}" fill="white"/>"#,
        spec.width, spec.height
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="20" text-anchor="middle" font-size="14">{}</text>"#,
        spec.width / 2.0,
        escape(spec.title)
    ));

    // axes
    svg.push_str(&format!(
        r##"<line x1="{p:.1}" y1="{p:.1}" x2="{p:.1}" y2="{b:.1}" stroke="#333"/><line x1="{p:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="#333"/>"##,
        p = PADDING,
        b = spec.height - PADDING,
        r = spec.width - PADDING
    ));
    svg.push_str(&format!(
        r#"<text x="12" y="{:.1}" font-size="10" transform="rotate(-90 12 {:.1})" text-anchor="middle">{}</text>"#,
        spec.height / 2.0,
        spec.height / 2.0,
        escape(spec.y_label)
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.2}</text><text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.2}</text>"#,
        PADDING - 4.0,
        to_y(max_v) + 3.0,
        max_v,
        PADDING - 4.0,
        to_y(min_v) + 3.0,
        min_v
    ));

    for i in tick_indexes(n) {
        let tx = to_x(i);
        let ty = spec.height - PADDING + 12.0;
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="8" text-anchor="end" transform="rotate(-50 {:.1} {:.1})">{}</text>"#,
            tx,
            ty,
            tx,
            ty,
            spec.timestamps[i].format("%Y-%m-%d")
        ));
    }

    for (k, line) in spec.lines.iter().enumerate() {
        let points: Vec<String> = line
            .values
            .iter()
            .take(n)
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| format!("{:.1},{:.1}", to_x(i), to_y(v)))
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
            line.color,
            points.join(" ")
        ));

        let ly = PADDING + 14.0 * k as f64;
        let lx = spec.width - PADDING - 110.0;
        svg.push_str(&format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2"/><text x="{:.1}" y="{:.1}" font-size="10">{}</text>"#,
            lx,
            ly,
            lx + 16.0,
            ly,
            line.color,
            lx + 20.0,
            ly + 3.0,
            escape(line.label)
        ));
    }

    svg.push_str("</g>");
    svg
}

pub fn wrap_document(width: f64, height: f64, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">{body}</svg>
"#,
        w = width,
        h = height,
        body = body
    )
}
