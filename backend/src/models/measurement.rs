//! Measurement rows: one pixel's IV-curve test result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IV-curve parameters reported for each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "PCE")]
    Pce,
    #[serde(rename = "FF")]
    Ff,
    #[serde(rename = "Max Power")]
    MaxPower,
    #[serde(rename = "HI")]
    Hi,
    #[serde(rename = "I_sc")]
    Isc,
    #[serde(rename = "V_oc")]
    Voc,
    #[serde(rename = "R_series")]
    Rseries,
    #[serde(rename = "R_shunt")]
    Rshunt,
}

impl Parameter {
    /// All parameters in chart order.
    pub const ALL: [Parameter; 8] = [
        Parameter::Pce,
        Parameter::Ff,
        Parameter::MaxPower,
        Parameter::Hi,
        Parameter::Isc,
        Parameter::Voc,
        Parameter::Rseries,
        Parameter::Rshunt,
    ];

    /// Short label used by the chart endpoints.
    pub fn label(self) -> &'static str {
        match self {
            Parameter::Pce => "PCE",
            Parameter::Ff => "FF",
            Parameter::MaxPower => "Max Power",
            Parameter::Hi => "HI",
            Parameter::Isc => "I_sc",
            Parameter::Voc => "V_oc",
            Parameter::Rseries => "R_series",
            Parameter::Rshunt => "R_shunt",
        }
    }

    /// Spreadsheet column header, units included.
    pub fn column(self) -> &'static str {
        match self {
            Parameter::Pce => "PCE (%)",
            Parameter::Ff => "FF (%)",
            Parameter::MaxPower => "Max Power (mW/cm2)",
            Parameter::Hi => "HI (%)",
            Parameter::Isc => "J_sc (mA/cm2)",
            Parameter::Voc => "V_oc (V)",
            Parameter::Rseries => "R_series (Ohm.cm2)",
            Parameter::Rshunt => "R_shunt (Ohm.cm2)",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Match a normalized name (see [`normalize_key`]) against labels and aliases.
    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "pce" => Some(Parameter::Pce),
            "ff" | "fillfactor" => Some(Parameter::Ff),
            "maxpower" | "pmax" => Some(Parameter::MaxPower),
            "hi" | "hysteresisindex" => Some(Parameter::Hi),
            "isc" | "jsc" => Some(Parameter::Isc),
            "voc" => Some(Parameter::Voc),
            "rseries" | "rs" => Some(Parameter::Rseries),
            "rshunt" | "rsh" => Some(Parameter::Rshunt),
            _ => None,
        }
    }

    /// Resolve a spreadsheet header to a parameter.
    ///
    /// Units in a trailing parenthesis are ignored (`PCE (%)`). Headers with
    /// text after the unit, such as `PCE (%)_AVG`, are derived columns and
    /// never match.
    pub fn from_column(header: &str) -> Option<Self> {
        let head = match header.find('(') {
            Some(open) => {
                let close = header[open..].find(')')? + open;
                if !header[close + 1..].trim().is_empty() {
                    return None;
                }
                &header[..open]
            }
            None => header,
        };
        Self::from_normalized(&normalize_key(head))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column(s).ok_or_else(|| format!("Unknown parameter '{}'", s))
    }
}

/// Lowercase and drop everything that is not alphanumeric.
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// IV sweep direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanDirection {
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "R")]
    Reverse,
}

impl ScanDirection {
    pub fn code(self) -> &'static str {
        match self {
            ScanDirection::Forward => "F",
            ScanDirection::Reverse => "R",
        }
    }
}

impl fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ScanDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "f" | "fwd" | "forward" => Ok(ScanDirection::Forward),
            "r" | "rev" | "reverse" => Ok(ScanDirection::Reverse),
            _ => Err(format!("Unknown scan direction '{}'", s)),
        }
    }
}

/// Values of the non-PCE parameters; PCE is held on the row itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValues([Option<f64>; 8]);

impl ParameterValues {
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.0[parameter.index()]
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        self.0[parameter.index()] = Some(value);
    }
}

/// One validated pixel measurement.
///
/// `(batch_id, sheet_id, device_id, pixel_id, scan_direction)` together
/// identify a measurement; any one of them alone is not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    /// Position of the row in the uploaded sequence
    pub row_index: usize,
    pub batch_id: String,
    pub sheet_id: String,
    /// Rows without a device still count for statistics but never qualify for selection.
    pub device_id: Option<String>,
    pub pixel_id: String,
    pub scan_direction: Option<ScanDirection>,
    pub pce: f64,
    pub values: ParameterValues,
    pub date: Option<NaiveDate>,
}

impl MeasurementRow {
    /// Value of `parameter`, if the row carries one.
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Pce => Some(self.pce),
            other => self.values.get(other),
        }
    }
}
