//! Financial trend chart: grouped bars of revenue and net profit per year.
//!
//! The chart is first built as a [`BarChart`] value (categories plus one
//! series per metric) and only then rasterised, so tests can check ordering
//! and bar counts without decoding pixels.
//!
//! ```text
//!  ┌──────────────────────────────────────────┐
//!  │ ■ REVENUE  ■ NET PROFIT                  │  legend, top-left
//!  │ ───────────────────────────────────────  │  white grid lines
//!  │   ▇▂        ▇▃        ▇▃                 │
//!  │  2022      2023      2024                │  oldest → newest
//!  └──────────────────────────────────────────┘
//! ```

use crate::error::DeckError;
use crate::model::FinancialYear;
use crate::pipeline::glyphs::{draw_text, text_height, text_width};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 500;

/// `#003366`
pub const REVENUE_COLOR: Rgb<u8> = Rgb([0x00, 0x33, 0x66]);
/// `#DAA520`
pub const NET_PROFIT_COLOR: Rgb<u8> = Rgb([0xDA, 0xA5, 0x20]);

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PLOT_FILL: Rgb<u8> = Rgb([238, 238, 238]);
const GRID: Rgb<u8> = Rgb([255, 255, 255]);
const ZERO_LINE: Rgb<u8> = Rgb([120, 120, 120]);
const LABEL: Rgb<u8> = Rgb([60, 60, 60]);
const LEGEND_BORDER: Rgb<u8> = Rgb([200, 200, 200]);

// Plot area inside the 800×500 canvas.
const PLOT_LEFT: i64 = 90;
const PLOT_RIGHT: i64 = 780;
const PLOT_TOP: i64 = 20;
const PLOT_BOTTOM: i64 = 440;

const FONT_SCALE: u32 = 2;
const TARGET_TICKS: f64 = 5.0;
const MAX_TICKS: i64 = 20;
/// Bars are clamped to ±this so axis arithmetic stays finite.
const VALUE_LIMIT: f64 = 1e300;
/// Share of each category slot covered by its bars.
const GROUP_FILL: f64 = 0.8;

/// One coloured bar per category.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb<u8>,
    pub values: Vec<f64>,
}

/// A grouped bar chart: `series[s].values[c]` is the bar for series `s` in
/// category `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl BarChart {
    /// Revenue and net-profit bars per year, oldest year first.
    ///
    /// The model lists years newest-first, so the input is reversed. Missing
    /// or non-numeric amounts chart as 0.
    pub fn from_financials(financials: &[FinancialYear]) -> Self {
        let chronological: Vec<&FinancialYear> = financials.iter().rev().collect();
        BarChart {
            categories: chronological
                .iter()
                .map(|f| f.year_label().to_string())
                .collect(),
            series: vec![
                Series {
                    name: "Revenue".to_string(),
                    color: REVENUE_COLOR,
                    values: chronological.iter().map(|f| f.revenue_value()).collect(),
                },
                Series {
                    name: "Net Profit".to_string(),
                    color: NET_PROFIT_COLOR,
                    values: chronological.iter().map(|f| f.net_profit_value()).collect(),
                },
            ],
        }
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn bars_per_category(&self) -> usize {
        self.series.len()
    }

    fn value(&self, series: usize, category: usize) -> f64 {
        self.series[series]
            .values
            .get(category)
            .copied()
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| v.clamp(-VALUE_LIMIT, VALUE_LIMIT))
    }

    /// Axis bounds and tick step. The range always includes zero.
    fn axis(&self) -> (f64, f64, f64) {
        let values = (0..self.series.len())
            .flat_map(|s| (0..self.categories.len()).map(move |c| (s, c)))
            .map(|(s, c)| self.value(s, c));
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let span = if max > min { max - min } else { 1.0 };
        let step = nice_step(span / TARGET_TICKS);
        let lo = (min / step).floor() * step;
        let mut hi = (max / step).ceil() * step;
        if hi <= lo {
            hi = lo + step;
        }
        (lo, hi, step)
    }

    /// Rasterise to an 800×500 RGB image.
    pub fn render(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
        fill_rect(&mut img, PLOT_LEFT, PLOT_TOP, PLOT_RIGHT, PLOT_BOTTOM, PLOT_FILL);

        let (lo, hi, step) = self.axis();
        let to_y = |v: f64| -> i64 {
            let frac = (v - lo) / (hi - lo);
            PLOT_BOTTOM - (frac * (PLOT_BOTTOM - PLOT_TOP) as f64).round() as i64
        };

        // Grid and y-axis labels
        let label_h = text_height(FONT_SCALE) as i64;
        let ticks = ((hi - lo) / step).round() as i64;
        for i in 0..=ticks.clamp(0, MAX_TICKS) {
            let v = lo + i as f64 * step;
            let y = to_y(v);
            fill_rect(&mut img, PLOT_LEFT, y, PLOT_RIGHT, y + 1, GRID);
            let label = compact_label(v);
            let x = PLOT_LEFT - 8 - text_width(&label, FONT_SCALE) as i64;
            draw_text(&mut img, x, y - label_h / 2, &label, FONT_SCALE, LABEL);
        }

        let zero_y = to_y(0.0);
        fill_rect(&mut img, PLOT_LEFT, zero_y, PLOT_RIGHT, zero_y + 1, ZERO_LINE);

        // Bars and category labels
        let n = self.categories.len();
        if n > 0 && !self.series.is_empty() {
            let slot = (PLOT_RIGHT - PLOT_LEFT) as f64 / n as f64;
            let bar_w = slot * GROUP_FILL / self.series.len() as f64;
            for (c, category) in self.categories.iter().enumerate() {
                let group_left = PLOT_LEFT as f64 + c as f64 * slot + slot * (1.0 - GROUP_FILL) / 2.0;
                for (s, series) in self.series.iter().enumerate() {
                    let x0 = (group_left + s as f64 * bar_w).round() as i64;
                    let x1 = (group_left + (s + 1) as f64 * bar_w).round() as i64 - 1;
                    let y = to_y(self.value(s, c));
                    fill_rect(&mut img, x0, y.min(zero_y), x1, y.max(zero_y), series.color);
                }

                let centre = PLOT_LEFT as f64 + (c as f64 + 0.5) * slot;
                let x = centre.round() as i64 - text_width(category, FONT_SCALE) as i64 / 2;
                draw_text(&mut img, x, PLOT_BOTTOM + 12, category, FONT_SCALE, LABEL);
            }
        }

        self.draw_legend(&mut img);
        img
    }

    fn draw_legend(&self, img: &mut RgbImage) {
        if self.series.is_empty() {
            return;
        }
        let swatch = 14_i64;
        let gap = 8_i64;
        let pad = 8_i64;
        let row_h = swatch + 6;
        let widest = self
            .series
            .iter()
            .map(|s| text_width(&s.name, FONT_SCALE) as i64)
            .max()
            .unwrap_or(0);

        let x0 = PLOT_LEFT + 10;
        let y0 = PLOT_TOP + 10;
        let x1 = x0 + pad * 2 + swatch + gap + widest;
        let y1 = y0 + pad * 2 + row_h * self.series.len() as i64 - 6;
        fill_rect(img, x0 - 1, y0 - 1, x1 + 1, y1 + 1, LEGEND_BORDER);
        fill_rect(img, x0, y0, x1, y1, BACKGROUND);

        for (i, series) in self.series.iter().enumerate() {
            let y = y0 + pad + i as i64 * row_h;
            fill_rect(img, x0 + pad, y, x0 + pad + swatch - 1, y + swatch - 1, series.color);
            let text_y = y + (swatch - text_height(FONT_SCALE) as i64) / 2;
            draw_text(img, x0 + pad + swatch + gap, text_y, &series.name, FONT_SCALE, LABEL);
        }
    }

    /// Rasterise and PNG-encode.
    pub fn render_png(&self) -> Result<Vec<u8>, DeckError> {
        let img = self.render();
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| DeckError::ChartRenderFailed(e.to_string()))?;
        debug!(
            "Chart rendered: {} categories, {} bytes PNG",
            self.categories.len(),
            buf.len()
        );
        Ok(buf)
    }
}

/// Render the chart for a financials sequence straight to PNG bytes.
pub fn render_financials_png(financials: &[FinancialYear]) -> Result<Vec<u8>, DeckError> {
    BarChart::from_financials(financials).render_png()
}

/// Round `raw` up to 1, 2, or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Short tick label: `1500` → `1.5K`, `2000000` → `2M`, `0.5` → `0.5`.
fn compact_label(v: f64) -> String {
    let abs = v.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (v / 1e9, "B")
    } else if abs >= 1e6 {
        (v / 1e6, "M")
    } else if abs >= 1e3 {
        (v / 1e3, "K")
    } else {
        (v, "")
    };
    let text = format!("{:.1}", scaled);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    if text == "-0" {
        format!("0{}", suffix)
    } else {
        format!("{}{}", text, suffix)
    }
}

/// Fill the inclusive rectangle `(x0, y0)..=(x1, y1)`, clipped to the image.
fn fill_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let (xa, xb) = (x0.max(0), x1.min(w - 1));
    let (ya, yb) = (y0.max(0), y1.min(h - 1));
    for y in ya..=yb {
        for x in xa..=xb {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}
