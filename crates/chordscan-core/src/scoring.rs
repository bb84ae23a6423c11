//! Cosine similarity between beat chroma and chord templates

use crate::chroma::ChromaMatrix;
use crate::error::{AnalysisError, Result};
use crate::templates::TemplateBank;

const EPSILON: f64 = 1e-9;

/// Per-beat, per-chord similarity scores, row-major (T x N)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl ScoreMatrix {
    /// Build from explicit rows; all rows must have the same width
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(AnalysisError::ShapeMismatch(format!(
                "score row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                cols
            )));
        }
        Ok(Self {
            data: rows.iter().flatten().copied().collect(),
            rows: rows.len(),
            cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

/// Score every chroma row against every template
pub fn score(chroma: &ChromaMatrix, templates: &TemplateBank) -> ScoreMatrix {
    let unit_templates: Vec<[f64; 12]> = templates.templates().iter().map(unit).collect();

    let mut data = Vec::with_capacity(chroma.num_rows() * unit_templates.len());
    for row in chroma.rows() {
        let v = unit(row);
        data.extend(unit_templates.iter().map(|t| dot(&v, t)));
    }

    ScoreMatrix {
        data,
        rows: chroma.num_rows(),
        cols: unit_templates.len(),
    }
}

fn unit(v: &[f64; 12]) -> [f64; 12] {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt() + EPSILON;
    v.map(|x| x / norm)
}

fn dot(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
