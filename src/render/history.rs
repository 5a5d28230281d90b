//! On-disk persistence for rendered state histories.
//!
//! The file is delimited tabular text with a fixed header. The first data row
//! carries the environment title and the rendered operating-range rows as a
//! nested-list literal; every following row carries one rendered frame:
//!
//! ```text
//! title,specs,time,state_values,potential,costs
//! Anm6,"[[...], [...]]",,,,
//! ,,2035-01-01 00:00:00,"[[...], [...], [...]]","[...]","[0.1, 0.0]"
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;

use super::literal;
use super::{RenderError, TIME_FORMAT};

/// Column header of the history file.
pub const HISTORY_HEADER: [&str; 6] = [
    "title",
    "specs",
    "time",
    "state_values",
    "potential",
    "costs",
];

/// One rendered frame: the state preceding a step plus its costs.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFrame {
    /// Simulation timestamp of the frame.
    pub time: NaiveDateTime,
    /// Rendered state-value groups, in [`crate::constants::RENDERED_STATE`] order.
    pub state_values: Vec<Vec<f64>>,
    /// Pre-curtailment generation potential of each VRE (MW).
    pub potential: Vec<f64>,
    /// Total energy loss and constraint-violation penalty.
    pub costs: [f64; 2],
}

/// The accumulated record of a rendered episode.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderHistory {
    /// Environment title shown by the visualization layer.
    pub title: String,
    /// Rendered operating-range rows, in [`crate::constants::RENDERED_SPECS`] order.
    pub specs: Vec<Vec<f64>>,
    /// Rendered frames in step order.
    pub frames: Vec<HistoryFrame>,
}

impl RenderHistory {
    /// Starts an empty history for an episode.
    pub fn new(title: impl Into<String>, specs: Vec<Vec<f64>>) -> Self {
        Self {
            title: title.into(),
            specs,
            frames: Vec::new(),
        }
    }

    /// Appends one frame.
    pub fn push(&mut self, frame: HistoryFrame) {
        self.frames.push(frame);
    }

    /// Writes the history to any writer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if writing fails.
    pub fn write(&self, writer: impl Write) -> Result<(), RenderError> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);

        wtr.write_record(HISTORY_HEADER)?;
        wtr.write_record([
            self.title.as_str(),
            &literal::format_nested(&self.specs),
            "",
            "",
            "",
            "",
        ])?;
        for frame in &self.frames {
            wtr.write_record([
                "",
                "",
                &frame.time.format(TIME_FORMAT).to_string(),
                &literal::format_nested(&frame.state_values),
                &literal::format_list(&frame.potential),
                &literal::format_list(&frame.costs),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes the history to a file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    /// Reads a history from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Parse`] naming the offending line if the header,
    /// the specs row, or any frame row is malformed.
    pub fn read(reader: impl Read) -> Result<Self, RenderError> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.iter().ne(HISTORY_HEADER) {
            return Err(RenderError::Parse {
                line: 1,
                message: format!("unexpected header \"{}\"", headers.iter().collect::<Vec<_>>().join(",")),
            });
        }

        let parse_err = |line: u64, e: &dyn std::fmt::Display| RenderError::Parse {
            line,
            message: e.to_string(),
        };

        let mut records = rdr.records();

        let first = records
            .next()
            .ok_or(RenderError::Parse {
                line: 2,
                message: "missing title/specs row".into(),
            })??;
        let title = first.get(0).unwrap_or("").to_string();
        let specs = literal::parse_nested(first.get(1).unwrap_or(""))
            .map_err(|e| parse_err(2, &e))?;

        let mut history = Self::new(title, specs);
        for (i, record) in records.enumerate() {
            let line = i as u64 + 3;
            let record = record?;
            let time = NaiveDateTime::parse_from_str(record.get(2).unwrap_or(""), TIME_FORMAT)
                .map_err(|e| parse_err(line, &e))?;
            let state_values = literal::parse_nested(record.get(3).unwrap_or(""))
                .map_err(|e| parse_err(line, &e))?;
            let potential = literal::parse_list(record.get(4).unwrap_or(""))
                .map_err(|e| parse_err(line, &e))?;
            let costs = literal::parse_list(record.get(5).unwrap_or(""))
                .map_err(|e| parse_err(line, &e))?;
            let costs: [f64; 2] = costs.try_into().map_err(|v: Vec<f64>| RenderError::Parse {
                line,
                message: format!("expected 2 cost values, got {}", v.len()),
            })?;
            history.push(HistoryFrame {
                time,
                state_values,
                potential,
                costs,
            });
        }

        Ok(history)
    }

    /// Reads a history from a file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the file cannot be opened, or
    /// [`RenderError::Parse`] if its contents are malformed.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let file = File::open(path)?;
        Self::read(file)
    }
}
