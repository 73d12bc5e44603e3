use crate::prelude::{SurveyError, SurveyResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Frequency of the Haslam all-sky survey [MHz].
pub const HASLAM_FREQ_MHZ: f64 = 408.0;

/// Spectral index of the synchrotron sky.
const SYNCHROTRON_INDEX: f64 = -2.6;

/// Width of one temperature entry in the map file.
const FIELD_WIDTH: usize = 5;

/// 90 longitude bins of 4 degrees by 180 latitude bins of 1 degree.
pub const CELLS: usize = 16_200;

/// Tabulated 408 MHz sky temperature map.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyTemperatureMap {
    cells: Vec<f64>,
}

impl SkyTemperatureMap {
    /// Reads a map stored as 5-character fixed-width fields. Fields that do
    /// not parse as numbers are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> SurveyResult<Self> {
        let mut cells = Vec::with_capacity(CELLS);
        for line in reader.lines() {
            let line = line?;
            for field in line.as_bytes().chunks(FIELD_WIDTH) {
                let parsed = std::str::from_utf8(field)
                    .ok()
                    .and_then(|text| text.trim().parse::<f64>().ok());
                if let Some(value) = parsed {
                    cells.push(value);
                }
            }
        }
        Self::from_cells(cells)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SurveyResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_cells(cells: Vec<f64>) -> SurveyResult<Self> {
        if cells.len() < CELLS {
            return Err(SurveyError::SkyMap(format!(
                "expected {} temperatures, found {}",
                CELLS,
                cells.len()
            )));
        }
        Ok(Self { cells })
    }

    /// The same temperature everywhere on the sky.
    pub fn uniform(t_408: f64) -> Self {
        Self {
            cells: vec![t_408; CELLS],
        }
    }

    fn index(gl: f64, gb: f64) -> usize {
        let l = gl.rem_euclid(360.0);
        let j = (gb + 90.5).clamp(0.0, 179.0);
        let nl = if l < 0.5 { 359.0 } else { l - 0.5 };
        let i = nl / 4.0;
        180 * (i as usize) + (j as usize)
    }

    /// Temperature at 408 MHz in the cell holding the given galactic
    /// coordinates [deg].
    pub fn lookup(&self, gl: f64, gb: f64) -> f64 {
        self.cells[Self::index(gl, gb)]
    }

    /// Sky temperature at `freq` MHz, assuming a synchrotron-dominated sky.
    pub fn temperature(&self, gl: f64, gb: f64, freq: f64) -> f64 {
        self.lookup(gl, gb) * (freq / HASLAM_FREQ_MHZ).powf(SYNCHROTRON_INDEX)
    }
}
