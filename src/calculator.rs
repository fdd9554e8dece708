use rand::Rng;

use crate::tables::{FactorRange, Reference, Tables};

pub const DEFAULT_BASELINE_CM: f64 = 14.0;
pub const DEFAULT_DEVELOPMENT_RANGE: FactorRange = FactorRange::new(1.00, 1.05);
pub const ERECTION_RANGE: FactorRange = FactorRange::new(1.2, 1.7);

const HEIGHT_PIVOT_CM: f64 = 175.0;
const HEIGHT_EFFECT_PER_CM: f64 = 0.01;
const HEIGHT_EFFECT_LIMIT: f64 = 0.3;

const FAT_PAD_NONE_BELOW: f64 = 18.5;
const FAT_PAD_NORMAL_MAX: f64 = 24.9;
const FAT_PAD_OVERWEIGHT_MAX: f64 = 29.9;
const FAT_PAD_NORMAL: FactorRange = FactorRange::new(0.0, 0.5);
const FAT_PAD_OVERWEIGHT: FactorRange = FactorRange::new(0.5, 1.5);
const FAT_PAD_OBESE: FactorRange = FactorRange::new(1.5, 3.0);

/// Differences below this are reported as "about the same length".
pub const SAME_LENGTH_TOLERANCE_CM: f64 = 0.5;

pub fn body_mass_index(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Length hidden by the suprapubic fat pad. Each band's upper bound is
/// inclusive; anything above the overweight band (including NaN) samples the
/// obese range.
pub fn fat_pad_reduction(bmi: f64, rng: &mut impl Rng) -> f64 {
    if bmi < FAT_PAD_NONE_BELOW {
        0.0
    } else if bmi <= FAT_PAD_NORMAL_MAX {
        FAT_PAD_NORMAL.sample(rng)
    } else if bmi <= FAT_PAD_OVERWEIGHT_MAX {
        FAT_PAD_OVERWEIGHT.sample(rng)
    } else {
        FAT_PAD_OBESE.sample(rng)
    }
}

pub fn height_effect(height_cm: f64) -> f64 {
    ((height_cm - HEIGHT_PIVOT_CM) * HEIGHT_EFFECT_PER_CM)
        .clamp(-HEIGHT_EFFECT_LIMIT, HEIGHT_EFFECT_LIMIT)
}

pub fn erection_factor(rng: &mut impl Rng) -> f64 {
    ERECTION_RANGE.sample(rng)
}

/// Everything the calculation reads. Built from the form on each compute.
#[derive(Clone, Debug, PartialEq)]
pub struct CalcInput {
    pub category: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub development: String,
    pub modifiers: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    About,
    Longer,
    Shorter,
}

/// A length measured against its nearest reference object.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub reference: String,
    pub reference_cm: f64,
    /// Signed: positive when the measured length is longer.
    pub difference_cm: f64,
}

impl Comparison {
    pub fn relation(&self) -> Relation {
        if self.difference_cm.abs() < SAME_LENGTH_TOLERANCE_CM {
            Relation::About
        } else if self.difference_cm > 0.0 {
            Relation::Longer
        } else {
            Relation::Shorter
        }
    }
}

/// One calculation's output. Values are unrounded; rounding happens when
/// they are displayed or exported.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurements {
    pub adjusted_base_cm: f64,
    pub hormone_modifier: f64,
    pub flaccid_actual_cm: f64,
    pub bmi: f64,
    pub fat_pad_cm: f64,
    pub flaccid_visible_cm: f64,
    pub erection_factor: f64,
    pub erect_cm: f64,
    pub flaccid_actual_reference: Option<Comparison>,
    pub flaccid_visible_reference: Option<Comparison>,
    pub erect_reference: Option<Comparison>,
    pub modifiers: Vec<String>,
}

impl Measurements {
    pub fn erect_growth_cm(&self) -> f64 {
        self.erect_cm - self.flaccid_actual_cm
    }
}

#[derive(Clone, Debug, Default)]
pub struct Calculator {
    tables: Tables,
}

impl Calculator {
    pub fn new(tables: Tables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn hormone_modifier(&self, development: &str, rng: &mut impl Rng) -> f64 {
        self.tables
            .development_range(development)
            .unwrap_or(DEFAULT_DEVELOPMENT_RANGE)
            .sample(rng)
    }

    /// Multiplies `value` by one independent draw per selected modifier that
    /// has an effect, in table order.
    pub fn apply_modifiers(&self, value: f64, selected: &[String], rng: &mut impl Rng) -> f64 {
        let mut factor = 1.0;
        for modifier in &self.tables.modifiers {
            let Some(range) = modifier.effect else {
                continue;
            };
            if selected.iter().any(|label| *label == modifier.label) {
                factor *= range.sample(rng);
            }
        }
        value * factor
    }

    /// Nearest reference by absolute difference; the earliest entry wins a
    /// tie. `None` only when nothing compares below infinity (NaN input).
    pub fn closest_reference(&self, length_cm: f64) -> Option<&Reference> {
        let mut closest = None;
        let mut min_diff = f64::INFINITY;
        for reference in &self.tables.references {
            let diff = (length_cm - reference.length_cm).abs();
            if diff < min_diff {
                min_diff = diff;
                closest = Some(reference);
            }
        }
        closest
    }

    pub fn reference_comparison(&self, length_cm: f64) -> Option<Comparison> {
        self.closest_reference(length_cm).map(|reference| Comparison {
            reference: reference.label.clone(),
            reference_cm: reference.length_cm,
            difference_cm: length_cm - reference.length_cm,
        })
    }

    pub fn calculate(&self, input: &CalcInput, rng: &mut impl Rng) -> Measurements {
        let base_cm = self
            .tables
            .baseline_cm(&input.category)
            .unwrap_or_else(|| {
                tracing::warn!(
                    category = %input.category,
                    fallback_cm = DEFAULT_BASELINE_CM,
                    "unknown category, using default baseline"
                );
                DEFAULT_BASELINE_CM
            });
        if self.tables.development_range(&input.development).is_none() {
            tracing::warn!(
                development = %input.development,
                "unknown development setting, using default range"
            );
        }
        for label in &input.modifiers {
            if self.tables.modifier(label).is_none() {
                tracing::debug!(modifier = %label, "ignoring unrecognized modifier");
            }
        }

        let adjusted_base_cm = base_cm + height_effect(input.height_cm);
        let hormone_modifier = self.hormone_modifier(&input.development, rng);
        let flaccid_actual_cm =
            self.apply_modifiers(adjusted_base_cm * hormone_modifier, &input.modifiers, rng);

        let bmi = body_mass_index(input.height_cm, input.weight_kg);
        let fat_pad_cm = fat_pad_reduction(bmi, rng);
        let flaccid_visible_cm = (flaccid_actual_cm - fat_pad_cm).max(0.0);

        let erection_factor = erection_factor(rng);
        let erect_cm = flaccid_actual_cm * erection_factor;

        tracing::debug!(
            adjusted_base_cm,
            hormone_modifier,
            flaccid_actual_cm,
            bmi,
            fat_pad_cm,
            erection_factor,
            "calculated measurements"
        );

        Measurements {
            adjusted_base_cm,
            hormone_modifier,
            flaccid_actual_cm,
            bmi,
            fat_pad_cm,
            flaccid_visible_cm,
            erection_factor,
            erect_cm,
            flaccid_actual_reference: self.reference_comparison(flaccid_actual_cm),
            flaccid_visible_reference: self.reference_comparison(flaccid_visible_cm),
            erect_reference: self.reference_comparison(erect_cm),
            modifiers: input.modifiers.clone(),
        }
    }
}
