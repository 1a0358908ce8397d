use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::path::Path;

use thiserror::Error;

use crate::{
    buffer::padded_range,
    overlay::{color_hex, Overlay, LIVE_COLOR},
    sampler::Sample,
};

const BACKGROUND: &str = "#071227";
const PLOT_BACKGROUND: &str = "#081722";
const AXIS_COLOR: &str = "#8fe6c7";
const GRID_COLOR: &str = "#063346";

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 48.0;
const GRID_DIVISIONS: usize = 5;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

pub fn write_recording_csv(filename: &Path, samples: &[Sample]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(filename)?;

    writer.write_record(["timestamp", "value"])?;
    for sample in samples {
        writer.write_record(&[sample.timestamp.to_string(), sample.value.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes an `(n, 2)` array of `[timestamp, value]` rows.
pub fn write_recording_npy(filename: &Path, samples: &[Sample]) -> Result<(), ExportError> {
    use npyz::WriterBuilder;

    let mut file = std::fs::File::create(filename)?;

    let mut writer = {
        npyz::WriteOptions::new()
            .default_dtype()
            .shape(&[samples.len() as u64, 2])
            .writer(&mut file)
            .begin_nd()?
    };

    for sample in samples {
        writer.extend([sample.timestamp, sample.value])?;
    }

    writer.finish()?;
    file.sync_all()?;

    Ok(())
}

pub fn write_svg(
    filename: &Path,
    live: &[[f64; 2]],
    overlays: &[Overlay],
    title: Option<&str>,
    size: (f64, f64),
) -> Result<(), ExportError> {
    let svg = render_svg(live, overlays, title, size);

    let mut file = std::fs::File::create(filename)?;
    file.write_all(svg.as_bytes())?;
    file.sync_all()?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn is_finite_point(p: &[f64; 2]) -> bool {
    p[0].is_finite() && p[1].is_finite()
}

impl Bounds {
    /// Non-finite points are ignored, as they are when drawing.
    fn enclosing<'a>(series: impl Iterator<Item = &'a [[f64; 2]]> + Clone) -> Bounds {
        let points = series.flat_map(|s| s.iter().filter(|p| is_finite_point(p)));
        let xs = points.clone().map(|p| p[0]);
        let ys = points.map(|p| p[1]);

        let (x_min, x_max) = match xs.fold(None, |acc: Option<(f64, f64)>, x| match acc {
            None => Some((x, x)),
            Some((min, max)) => Some((min.min(x), max.max(x))),
        }) {
            Some((min, max)) if max > min => (min, max),
            Some((min, _)) => (min - 0.5, min + 0.5),
            None => (0.0, 1.0),
        };
        let (y_min, y_max) = padded_range(ys).unwrap_or((0.0, 1.0));

        Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

struct Frame {
    bounds: Bounds,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn new(bounds: Bounds, (width, height): (f64, f64)) -> Frame {
        Frame {
            bounds,
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
        }
    }

    fn to_screen(&self, [x, y]: [f64; 2]) -> (f64, f64) {
        let b = &self.bounds;
        let sx = self.left + (x - b.x_min) / (b.x_max - b.x_min) * self.width;
        let sy = self.top + (b.y_max - y) / (b.y_max - b.y_min) * self.height;
        (sx, sy)
    }
}

fn polyline(svg: &mut String, frame: &Frame, points: &[[f64; 2]], color: &str) -> fmt::Result {
    let coords = points
        .iter()
        .filter(|p| is_finite_point(p))
        .map(|&p| {
            let (x, y) = frame.to_screen(p);
            format!("{:.2},{:.2}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        coords, color
    )
}

fn grid(svg: &mut String, frame: &Frame) -> fmt::Result {
    let bounds = &frame.bounds;

    for i in 0..=GRID_DIVISIONS {
        let fraction = i as f64 / GRID_DIVISIONS as f64;

        let x = frame.left + fraction * frame.width;
        let x_value = bounds.x_min + fraction * (bounds.x_max - bounds.x_min);
        writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{}" x2="{x:.2}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            frame.top,
            frame.top + frame.height,
            GRID_COLOR
        )?;
        writeln!(
            svg,
            r#"<text x="{x:.2}" y="{:.2}" fill="{}" font-size="11" text-anchor="middle">{:.2}</text>"#,
            frame.top + frame.height + 16.0,
            AXIS_COLOR,
            x_value
        )?;

        let y = frame.top + fraction * frame.height;
        let y_value = bounds.y_max - fraction * (bounds.y_max - bounds.y_min);
        writeln!(
            svg,
            r#"<line x1="{}" y1="{y:.2}" x2="{}" y2="{y:.2}" stroke="{}" stroke-width="1"/>"#,
            frame.left,
            frame.left + frame.width,
            GRID_COLOR
        )?;
        writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="11" text-anchor="end">{:.2}</text>"#,
            frame.left - 6.0,
            y + 4.0,
            AXIS_COLOR,
            y_value
        )?;
    }

    Ok(())
}

fn write_document(
    svg: &mut String,
    live: &[[f64; 2]],
    overlays: &[Overlay],
    title: Option<&str>,
    size: (f64, f64),
) -> fmt::Result {
    let series = std::iter::once(live).chain(overlays.iter().map(|o| o.points.as_slice()));
    let frame = Frame::new(Bounds::enclosing(series), size);
    let (width, height) = size;

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    )?;
    writeln!(svg, "<title>FlowBench Export</title>")?;
    writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        width, height, BACKGROUND
    )?;
    writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}"/>"#,
        frame.left, frame.top, frame.width, frame.height, PLOT_BACKGROUND, AXIS_COLOR
    )?;

    grid(svg, &frame)?;

    writeln!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="13" text-anchor="middle">X</text>"#,
        frame.left + frame.width / 2.0,
        height - 10.0,
        AXIS_COLOR
    )?;
    writeln!(
        svg,
        r#"<text x="14" y="{:.2}" fill="{}" font-size="13" text-anchor="middle" transform="rotate(-90 14 {:.2})">Flow</text>"#,
        frame.top + frame.height / 2.0,
        AXIS_COLOR,
        frame.top + frame.height / 2.0
    )?;

    if let Some(title) = title {
        writeln!(
            svg,
            r#"<text x="{:.2}" y="24" fill="{}" font-size="15" text-anchor="middle">{}</text>"#,
            width / 2.0,
            AXIS_COLOR,
            escape_text(title)
        )?;
    }

    if !live.is_empty() {
        polyline(svg, &frame, live, &color_hex(LIVE_COLOR))?;
    }

    for overlay in overlays {
        polyline(svg, &frame, &overlay.points, &color_hex(overlay.color))?;

        let marker = color_hex(overlay.marker_color);
        for &point in overlay.points.iter().filter(|p| is_finite_point(p)) {
            let (x, y) = frame.to_screen(point);
            writeln!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="3.5" fill="{}"/>"#,
                x, y, marker
            )?;
        }
    }

    writeln!(svg, "</svg>")
}

/// Renders the live series and the overlays as a standalone SVG document.
pub fn render_svg(
    live: &[[f64; 2]],
    overlays: &[Overlay],
    title: Option<&str>,
    size: (f64, f64),
) -> String {
    let mut svg = String::new();

    // fmt::Write for String never fails
    if let Err(err) = write_document(&mut svg, live, overlays, title, size) {
        log::error!("failed to render SVG document: {:?}", err);
    }

    svg
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
