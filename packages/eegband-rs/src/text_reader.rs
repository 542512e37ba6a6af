// Delimited-text signal reader
//
// Format assumptions:
// - Each non-empty line is one row of numbers; lines starting with '#' are comments
// - Rows are channels, columns are samples
// - A single row or a single column is one channel
// - No sampling rate is encoded; the caller supplies one

use crate::error::{EegError, Result};
use crate::format::FileFormat;
use crate::types::DecodedSignal;
use rayon::prelude::*;
use std::path::Path;

/// Delimiter candidates, probed in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Whitespace,
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    pub const PROBE_ORDER: [Delimiter; 4] = [
        Delimiter::Whitespace,
        Delimiter::Comma,
        Delimiter::Tab,
        Delimiter::Semicolon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Delimiter::Whitespace => "whitespace",
            Delimiter::Comma => "comma",
            Delimiter::Tab => "tab",
            Delimiter::Semicolon => "semicolon",
        }
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Comma => line.split(',').map(str::trim).collect(),
            Delimiter::Tab => line.split('\t').map(str::trim).collect(),
            Delimiter::Semicolon => line.split(';').map(str::trim).collect(),
        }
    }
}

/// Numeric matrix parsed from text, rows as they appear in the file
#[derive(Debug, Clone)]
pub struct TextMatrix {
    pub rows: Vec<Vec<f64>>,
    pub delimiter: Delimiter,
}

impl TextMatrix {
    /// Shape the parsed rows into `[channel][sample]`. A single column is
    /// treated like a single row.
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        let num_cols = self.rows.first().map(|r| r.len()).unwrap_or(0);
        if num_cols == 1 && self.rows.len() > 1 {
            vec![self.rows.into_iter().map(|r| r[0]).collect()]
        } else {
            self.rows
        }
    }
}

fn data_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Parse every line with one delimiter; any bad token or ragged row fails it.
pub fn parse_with(content: &str, delimiter: Delimiter) -> Result<TextMatrix> {
    let lines = data_lines(content);
    if lines.is_empty() {
        return Err(EegError::Decode("file contains no data rows".to_string()));
    }

    let rows = lines
        .par_iter()
        .map(|&(line_no, line)| {
            delimiter
                .split(line)
                .iter()
                .enumerate()
                .map(|(col, token)| {
                    token.parse::<f64>().map_err(|_| {
                        EegError::Decode(format!(
                            "invalid numeric value '{}' at line {}, column {}",
                            token,
                            line_no,
                            col + 1
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let num_cols = rows[0].len();
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_cols) {
        return Err(EegError::Decode(format!(
            "line {} has {} values, expected {}",
            lines[idx].0,
            row.len(),
            num_cols
        )));
    }

    Ok(TextMatrix { rows, delimiter })
}

/// Try each delimiter in probe order and keep the first that parses
pub fn probe(content: &str) -> Result<TextMatrix> {
    let mut last_error = None;
    for delimiter in Delimiter::PROBE_ORDER {
        match parse_with(content, delimiter) {
            Ok(matrix) => {
                log::debug!("Delimiter probe accepted {}", delimiter.name());
                return Ok(matrix);
            }
            Err(e) => {
                log::trace!("Delimiter {} rejected: {}", delimiter.name(), e);
                last_error = Some(e);
            }
        }
    }

    Err(EegError::Decode(format!(
        "no delimiter candidate parsed the file: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Read a delimited-text file at the given (assumed) sample rate
pub fn read_text_signal(path: &Path, sample_rate: f64) -> Result<DecodedSignal> {
    let content = std::fs::read_to_string(path)?;
    let matrix = probe(&content)?;
    let delimiter = matrix.delimiter;
    let data = matrix.into_channels();

    let channel_names = (0..data.len())
        .map(|i| format!("Channel {}", i + 1))
        .collect();

    log::info!(
        "Parsed text file {} ({} delimited): {} channels x {} samples, assuming {} Hz",
        path.display(),
        delimiter.name(),
        data.len(),
        data.first().map(|c| c.len()).unwrap_or(0),
        sample_rate
    );

    Ok(DecodedSignal {
        data,
        sample_rate,
        channel_names,
        format: FileFormat::DelimitedText,
        processing_method: format!("delimited text ({}), assumed {} Hz", delimiter.name(), sample_rate),
    })
}
