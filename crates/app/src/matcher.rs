//! Template matching by normalized cross-correlation.
//!
//! For every placement of the template inside the frame the matcher computes
//! the mean-subtracted correlation coefficient
//!
//! ```text
//!            Σ (T - mean T) · (W - mean W)
//! score = ------------------------------------
//!         sqrt(Σ (T - mean T)² · Σ (W - mean W)²)
//! ```
//!
//! where `W` is the frame window under the template. Scores lie in
//! `[-1, 1]`; `1` is a perfect match. Window sums come from integral images
//! so only the cross term costs `O(template area)` per placement.
//!
//! A flat (zero-variance) template or window has no defined coefficient:
//! two flat images score `1`, a flat image against a textured one scores `0`.

use image::GrayImage;

use framebot_domain::geometry::{Point, Size};

/// Below this a window sum of squared deviations counts as flat. Any
/// non-flat 8-bit window has at least `1 - 1/n`.
const FLAT_EPSILON: f64 = 1e-6;

/// A template placement and its correlation score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Top-left corner of the placement, relative to the frame.
    pub location: Point,
    pub score: f64,
}

/// Correlation scores for every valid placement, row-major.
#[derive(Debug, Clone)]
pub struct ScoreField {
    width: u32,
    height: u32,
    scores: Vec<f64>,
}

impl ScoreField {
    /// Number of placements along each axis.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(index(x, y, self.width)).copied()
    }

    /// The highest-scoring placement; ties go to the first in scan order.
    #[must_use]
    pub fn best(&self) -> Option<Match> {
        self.placements()
            .fold(None, |best: Option<Match>, candidate| match best {
                Some(b) if b.score >= candidate.score => Some(b),
                _ => Some(candidate),
            })
    }

    /// Every placement scoring at least `threshold`, in scan order.
    #[must_use]
    pub fn at_least(&self, threshold: f64) -> Vec<Match> {
        self.placements().filter(|m| m.score >= threshold).collect()
    }

    fn placements(&self) -> impl Iterator<Item = Match> + '_ {
        self.scores.iter().enumerate().map(|(i, &score)| {
            let (x, y) = position(i, self.width);
            Match {
                location: Point::new(x, y),
                score,
            }
        })
    }
}

/// Stateless normalized cross-correlation matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateMatcher;

impl TemplateMatcher {
    /// Score every placement of `template` inside `frame`.
    ///
    /// Returns `None` when the template is empty or larger than the frame in
    /// either dimension.
    #[must_use]
    pub fn score(frame: &GrayImage, template: &GrayImage) -> Option<ScoreField> {
        let (fw, fh) = frame.dimensions();
        let (tw, th) = template.dimensions();
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let prepared = PreparedTemplate::new(template);
        let integral = Integral::new(frame);
        let pixels = frame.as_raw();
        let n = f64::from(tw) * f64::from(th);

        let out_w = fw - tw + 1;
        let out_h = fh - th + 1;
        let mut scores = Vec::with_capacity(index(0, out_h, out_w));

        for y in 0..out_h {
            for x in 0..out_w {
                let (sum, sum_sq) = integral.window(x, y, tw, th);
                let window_var = sum_sq - sum * sum / n;

                let mut cross = 0.0;
                for row in 0..th {
                    let start = index(x, y + row, fw);
                    let frame_row = &pixels[start..start + tw as usize];
                    cross += prepared
                        .row(row)
                        .iter()
                        .zip(frame_row)
                        .map(|(t, &w)| t * f64::from(w))
                        .sum::<f64>();
                }

                scores.push(coefficient(cross, prepared.variance, window_var));
            }
        }

        Some(ScoreField {
            width: out_w,
            height: out_h,
            scores,
        })
    }

    /// The single best placement of `template` inside `frame`.
    #[must_use]
    pub fn match_best(frame: &GrayImage, template: &GrayImage) -> Option<Match> {
        Self::score(frame, template).and_then(|field| field.best())
    }

    /// All placements scoring at least `threshold`, in row-major scan order.
    ///
    /// Overlapping placements of the same feature are all reported.
    #[must_use]
    pub fn match_all(frame: &GrayImage, template: &GrayImage, threshold: f64) -> Vec<Match> {
        Self::score(frame, template)
            .map(|field| field.at_least(threshold))
            .unwrap_or_default()
    }
}

fn coefficient(cross: f64, template_var: f64, window_var: f64) -> f64 {
    let template_flat = template_var < FLAT_EPSILON;
    let window_flat = window_var < FLAT_EPSILON;
    match (template_flat, window_flat) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => (cross / (template_var * window_var).sqrt()).clamp(-1.0, 1.0),
    }
}

/// Template pixels with the mean removed, plus their sum of squares.
struct PreparedTemplate {
    width: usize,
    centered: Vec<f64>,
    variance: f64,
}

impl PreparedTemplate {
    fn new(template: &GrayImage) -> Self {
        let raw = template.as_raw();
        #[allow(clippy::cast_precision_loss)]
        let mean = raw.iter().map(|&p| f64::from(p)).sum::<f64>() / raw.len() as f64;
        let centered: Vec<f64> = raw.iter().map(|&p| f64::from(p) - mean).collect();
        let variance = centered.iter().map(|v| v * v).sum();
        Self {
            width: template.width() as usize,
            centered,
            variance,
        }
    }

    fn row(&self, row: u32) -> &[f64] {
        let start = row as usize * self.width;
        &self.centered[start..start + self.width]
    }
}

/// Summed-area tables of pixel values and squared pixel values.
///
/// Both tables carry a leading zero row and column so window sums need no
/// bounds special-casing.
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl Integral {
    fn new(frame: &GrayImage) -> Self {
        let (w, h) = frame.dimensions();
        let stride = w as usize + 1;
        let mut sum = vec![0_u64; stride * (h as usize + 1)];
        let mut sum_sq = vec![0_u64; sum.len()];

        for y in 0..h as usize {
            let mut row_sum = 0_u64;
            let mut row_sq = 0_u64;
            for x in 0..w as usize {
                let v = u64::from(frame.as_raw()[y * w as usize + x]);
                row_sum += v;
                row_sq += v * v;
                let at = (y + 1) * stride + x + 1;
                sum[at] = sum[at - stride] + row_sum;
                sum_sq[at] = sum_sq[at - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// Sum and sum of squares of the `w`×`h` window at (`x`, `y`).
    #[allow(clippy::cast_precision_loss)]
    fn window(&self, x: u32, y: u32, w: u32, h: u32) -> (f64, f64) {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let rect = |table: &[u64]| {
            let s = self.stride;
            table[y1 * s + x1] + table[y0 * s + x0] - table[y0 * s + x1] - table[y1 * s + x0]
        };
        (rect(&self.sum) as f64, rect(&self.sum_sq) as f64)
    }
}

fn index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn position(i: usize, width: u32) -> (i32, i32) {
    let width = width as usize;
    ((i % width) as i32, (i / width) as i32)
}
