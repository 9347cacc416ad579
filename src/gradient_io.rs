//! b-value / b-vector text file parsing
//!
//! FSL-style whitespace-separated tables. The b-vector file may hold three
//! rows of N columns or N rows of three columns; three-row layout wins
//! when both fit. b-values are read as a flat sequence regardless of line
//! breaks.

use std::path::Path;

use crate::error::PowerMapError;

/// Read a b-value file: one value per acquisition.
pub fn read_bvals(path: &Path) -> Result<Vec<f64>, PowerMapError> {
    let text = read_text(path)?;
    parse_bvals(&text).map_err(|reason| invalid(path, reason))
}

/// Read a b-vector file: one 3-vector per acquisition.
pub fn read_bvecs(path: &Path) -> Result<Vec<[f64; 3]>, PowerMapError> {
    let text = read_text(path)?;
    parse_bvecs(&text).map_err(|reason| invalid(path, reason))
}

fn read_text(path: &Path) -> Result<String, PowerMapError> {
    std::fs::read_to_string(path).map_err(|e| PowerMapError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn invalid(path: &Path, reason: String) -> PowerMapError {
    PowerMapError::InvalidGradientTable(format!("{}: {reason}", path.display()))
}

fn parse_bvals(text: &str) -> Result<Vec<f64>, String> {
    let values = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| format!("not a number: {tok:?}"))
        })
        .collect::<Result<Vec<f64>, String>>()?;
    if values.is_empty() {
        return Err("no b-values found".to_string());
    }
    Ok(values)
}

fn parse_bvecs(text: &str) -> Result<Vec<[f64; 3]>, String> {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| format!("not a number: {tok:?}"))
                })
                .collect::<Result<Vec<f64>, String>>()
        })
        .collect::<Result<Vec<Vec<f64>>, String>>()?;

    if rows.is_empty() {
        return Err("no b-vectors found".to_string());
    }

    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return Err("ragged rows".to_string());
    }

    if rows.len() == 3 {
        // Three rows of N columns: x, y and z components per row.
        Ok((0..width)
            .map(|c| [rows[0][c], rows[1][c], rows[2][c]])
            .collect())
    } else if width == 3 {
        Ok(rows.iter().map(|r| [r[0], r[1], r[2]]).collect())
    } else {
        Err(format!(
            "expected 3 rows or 3 columns, got {} x {width}",
            rows.len()
        ))
    }
}
