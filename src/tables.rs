use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::error::{Error, Result};

const EMBEDDED_TABLES_JSON: &str = include_str!("../data/tables.json");

pub const DEFAULT_TABLES_PATH: &str = "data/tables.json";

/// Inclusive `[low, high]` range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactorRange {
    pub low: f64,
    pub high: f64,
}

impl FactorRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.low..=self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Baseline {
    pub label: String,
    pub length_cm: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Development {
    pub label: String,
    pub range: FactorRange,
}

/// A selectable modifier. Labels without an effect are offered in the form
/// but leave the length unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Modifier {
    pub label: String,
    pub effect: Option<FactorRange>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub label: String,
    pub length_cm: f64,
}

/// The fixed lookup tables. Entry order matters: it is the display order in
/// the form, the draw order for modifiers, and the tie-break order for the
/// closest reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Tables {
    pub baselines: Vec<Baseline>,
    pub development: Vec<Development>,
    pub modifiers: Vec<Modifier>,
    pub references: Vec<Reference>,
}

impl Tables {
    pub fn baseline_cm(&self, category: &str) -> Option<f64> {
        self.baselines
            .iter()
            .find(|entry| entry.label == category)
            .map(|entry| entry.length_cm)
    }

    pub fn development_range(&self, label: &str) -> Option<FactorRange> {
        self.development
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.range)
    }

    pub fn modifier(&self, label: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|entry| entry.label == label)
    }

    /// Tables compiled into the binary. Used when the JSON tables cannot be
    /// loaded.
    pub fn builtin() -> Self {
        Self {
            baselines: vec![
                baseline("East Asian", 13.5),
                baseline("Western Europe/North America/Oceania", 14.0),
                baseline("Middle East/Eastern Europe", 14.5),
                baseline("Central/West Africa", 15.0),
                baseline("global average", 14.0),
            ],
            development: vec![
                development("random", 0.80, 1.20),
                development("delayed", 0.80, 0.95),
                development("slightly below average", 0.95, 1.00),
                development("average range", 1.00, 1.05),
                development("well developed", 1.05, 1.10),
                development("very well developed", 1.10, 1.20),
            ],
            modifiers: vec![
                modifier("Cobra tech", Some(FactorRange::new(1.4, 2.5))),
                modifier("estrogen analog", Some(FactorRange::new(0.3, 0.7))),
                modifier("testosterone supplement", None),
                modifier("growth hormone", None),
                modifier("synthetic steroids", None),
            ],
            references: vec![
                reference("bank card", 8.56),
                reference("smartphone", 14.0),
                reference("standard pencil", 17.5),
                reference("soda can height", 12.0),
                reference("TV remote", 16.0),
                reference("banana (medium)", 18.0),
                reference("A4 short edge", 21.0),
                reference("cola bottle", 23.0),
                reference("laptop width", 30.0),
                reference("forearm", 35.0),
                reference("standard ruler", 40.0),
                reference("large pizza diameter", 45.0),
                reference("half meter", 50.0),
            ],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.baselines.is_empty() {
            return Err(Error::invalid("baselines", "table is empty"));
        }
        if self.development.is_empty() {
            return Err(Error::invalid("development", "table is empty"));
        }
        if self.references.is_empty() {
            return Err(Error::invalid("references", "table is empty"));
        }
        for entry in &self.baselines {
            if !entry.length_cm.is_finite() {
                return Err(Error::invalid(
                    "baselines",
                    format!("'{}' has a non-finite length", entry.label),
                ));
            }
        }
        for entry in &self.development {
            if !entry.range.is_valid() {
                return Err(Error::invalid(
                    "development",
                    format!(
                        "'{}' has an invalid range {}..={}",
                        entry.label, entry.range.low, entry.range.high
                    ),
                ));
            }
        }
        for entry in &self.modifiers {
            if let Some(range) = entry.effect {
                if !range.is_valid() {
                    return Err(Error::invalid(
                        "modifiers",
                        format!(
                            "'{}' has an invalid range {}..={}",
                            entry.label, range.low, range.high
                        ),
                    ));
                }
            }
        }
        for entry in &self.references {
            if !entry.length_cm.is_finite() {
                return Err(Error::invalid(
                    "references",
                    format!("'{}' has a non-finite length", entry.label),
                ));
            }
        }
        Ok(())
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Loads the tables from `path`, or from the embedded copy when the file does
/// not exist.
pub fn load_tables(path: impl AsRef<Path>) -> Result<Tables> {
    let path = path.as_ref();
    let data = match fs::read_to_string(path) {
        Ok(data) => {
            tracing::debug!(path = %path.display(), "loading tables from disk");
            data
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "tables file not found, using embedded tables");
            EMBEDDED_TABLES_JSON.to_string()
        }
        Err(err) => return Err(Error::io(path, err)),
    };
    parse_tables(&data)
}

pub fn parse_tables(data: &str) -> Result<Tables> {
    let parsed: TablesFile = serde_json::from_str(data)?;
    let tables = parsed.into_tables()?;
    tables.validate()?;
    Ok(tables)
}

#[derive(Deserialize)]
struct TablesFile {
    baselines: Vec<LengthJson>,
    development: Vec<RangeJson>,
    #[serde(default)]
    modifiers: Vec<ModifierJson>,
    references: Vec<LengthJson>,
}

#[derive(Deserialize)]
struct LengthJson {
    label: String,
    length_cm: f64,
}

#[derive(Deserialize)]
struct RangeJson {
    label: String,
    low: f64,
    high: f64,
}

#[derive(Deserialize)]
struct ModifierJson {
    label: String,
    low: Option<f64>,
    high: Option<f64>,
}

impl TablesFile {
    fn into_tables(self) -> Result<Tables> {
        let mut modifiers = Vec::with_capacity(self.modifiers.len());
        for entry in self.modifiers {
            let effect = match (entry.low, entry.high) {
                (Some(low), Some(high)) => Some(FactorRange::new(low, high)),
                (None, None) => None,
                _ => {
                    return Err(Error::invalid(
                        "modifiers",
                        format!("'{}' needs both low and high, or neither", entry.label),
                    ))
                }
            };
            modifiers.push(Modifier {
                label: entry.label,
                effect,
            });
        }
        Ok(Tables {
            baselines: self
                .baselines
                .into_iter()
                .map(|entry| baseline(entry.label, entry.length_cm))
                .collect(),
            development: self
                .development
                .into_iter()
                .map(|entry| development(entry.label, entry.low, entry.high))
                .collect(),
            modifiers,
            references: self
                .references
                .into_iter()
                .map(|entry| reference(entry.label, entry.length_cm))
                .collect(),
        })
    }
}

fn baseline(label: impl Into<String>, length_cm: f64) -> Baseline {
    Baseline {
        label: label.into(),
        length_cm,
    }
}

fn development(label: impl Into<String>, low: f64, high: f64) -> Development {
    Development {
        label: label.into(),
        range: FactorRange::new(low, high),
    }
}

fn modifier(label: impl Into<String>, effect: Option<FactorRange>) -> Modifier {
    Modifier {
        label: label.into(),
        effect,
    }
}

fn reference(label: impl Into<String>, length_cm: f64) -> Reference {
    Reference {
        label: label.into(),
        length_cm,
    }
}
