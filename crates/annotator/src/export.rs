// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV rendering of an annotation.

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use thiserror::Error;

use shared_types::ResidueAnnotation;

/// Which track to export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsvMode {
    EightState,
    ThreeState,
}

impl CsvMode {
    pub const ALL: [CsvMode; 2] = [CsvMode::EightState, CsvMode::ThreeState];

    pub fn header(self) -> [&'static str; 3] {
        match self {
            CsvMode::EightState => ["index", "state8", "conf8"],
            CsvMode::ThreeState => ["index", "state3", "conf3"],
        }
    }

    fn digit(self) -> char {
        match self {
            CsvMode::EightState => '8',
            CsvMode::ThreeState => '3',
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `{ID}-predictions-{8|3}-state.csv`, with `entry` standing in for a missing ID.
pub fn csv_filename(identifier: Option<&str>, mode: CsvMode) -> String {
    let id = identifier
        .map(|id| id.trim().to_uppercase())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "entry".to_owned());
    format!("{id}-predictions-{}-state.csv", mode.digit())
}

pub fn write_csv<W: Write>(
    annotations: &[ResidueAnnotation],
    mode: CsvMode,
    wtr: &mut Writer<W>,
) -> Result<(), csv::Error> {
    wtr.write_record(mode.header())?;
    for a in annotations {
        let (state, confidence) = match mode {
            CsvMode::EightState => (a.state8.symbol(), a.confidence8),
            CsvMode::ThreeState => (a.state3().symbol(), a.confidence3),
        };
        wtr.write_record([
            a.index.to_string(),
            state.to_string(),
            format!("{confidence:.3}"),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(annotations: &[ResidueAnnotation], mode: CsvMode) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    {
        let mut wtr = Writer::from_writer(&mut buffer);
        write_csv(annotations, mode, &mut wtr)?;
    }
    // every field written is ASCII
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write one track into `dir` under its derived filename. Returns the path written.
pub fn write_csv_file(
    dir: &Path,
    identifier: Option<&str>,
    annotations: &[ResidueAnnotation],
    mode: CsvMode,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(csv_filename(identifier, mode));
    let file = std::fs::File::create(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    let mut wtr = Writer::from_writer(file);
    write_csv(annotations, mode, &mut wtr)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::State8;

    fn sample() -> Vec<ResidueAnnotation> {
        vec![
            ResidueAnnotation::new(1, State8::Helix310, 0.91234, 0.9),
            ResidueAnnotation::new(2, State8::Bridge, 0.5, 0.5),
            ResidueAnnotation::new(3, State8::Turn, 0.7777, 0.75),
        ]
    }

    #[test]
    fn eight_state_csv() {
        let csv = to_csv_string(&sample(), CsvMode::EightState).unwrap();
        assert_eq!(csv, "index,state8,conf8\n1,G,0.912\n2,B,0.500\n3,T,0.778\n");
    }

    #[test]
    fn three_state_csv() {
        let csv = to_csv_string(&sample(), CsvMode::ThreeState).unwrap();
        assert_eq!(csv, "index,state3,conf3\n1,H,0.900\n2,E,0.500\n3,C,0.750\n");
    }

    #[test]
    fn empty_annotation_is_header_only() {
        let csv = to_csv_string(&[], CsvMode::ThreeState).unwrap();
        assert_eq!(csv, "index,state3,conf3\n");
    }

    #[test]
    fn filenames() {
        assert_eq!(
            csv_filename(Some("1crn"), CsvMode::EightState),
            "1CRN-predictions-8-state.csv"
        );
        assert_eq!(
            csv_filename(None, CsvMode::ThreeState),
            "entry-predictions-3-state.csv"
        );
        assert_eq!(
            csv_filename(Some("  "), CsvMode::EightState),
            "entry-predictions-8-state.csv"
        );
    }

    #[test]
    fn writes_files_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv_file(dir.path(), Some("1UBQ"), &sample(), CsvMode::EightState).unwrap();
        assert_eq!(path, dir.path().join("1UBQ-predictions-8-state.csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("index,state8,conf8\n1,G,0.912\n"));
    }
}
