use std::ops::RangeInclusive;

use rand::Rng;

use crate::calculator::{CalcInput, Calculator, Measurements};

pub const HEIGHT_RANGE_CM: RangeInclusive<u32> = 140..=220;
pub const WEIGHT_RANGE_KG: RangeInclusive<u32> = 40..=150;

pub const DEFAULT_CATEGORY: &str = "global average";
pub const DEFAULT_HEIGHT_CM: u32 = 175;
pub const DEFAULT_WEIGHT_KG: u32 = 70;
pub const DEFAULT_DEVELOPMENT: &str = "random";

/// The editable fields of the form. Edits never trigger a calculation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormState {
    pub creator_name: String,
    pub character_name: String,
    pub category: String,
    pub height_cm: u32,
    pub weight_kg: u32,
    pub development: String,
    /// Selected modifier labels in selection order, without duplicates.
    pub modifiers: Vec<String>,
}

impl FormState {
    pub fn set_height_cm(&mut self, height_cm: u32) {
        self.height_cm = height_cm.clamp(*HEIGHT_RANGE_CM.start(), *HEIGHT_RANGE_CM.end());
    }

    pub fn set_weight_kg(&mut self, weight_kg: u32) {
        self.weight_kg = weight_kg.clamp(*WEIGHT_RANGE_KG.start(), *WEIGHT_RANGE_KG.end());
    }

    pub fn has_modifier(&self, label: &str) -> bool {
        self.modifiers.iter().any(|selected| selected == label)
    }

    pub fn set_modifier(&mut self, label: &str, selected: bool) {
        if selected {
            if !self.has_modifier(label) {
                self.modifiers.push(label.to_string());
            }
        } else {
            self.modifiers.retain(|existing| existing != label);
        }
    }

    pub fn to_input(&self) -> CalcInput {
        CalcInput {
            category: self.category.clone(),
            height_cm: f64::from(self.height_cm),
            weight_kg: f64::from(self.weight_kg),
            development: self.development.clone(),
            modifiers: self.modifiers.clone(),
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            creator_name: String::new(),
            character_name: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            height_cm: DEFAULT_HEIGHT_CM,
            weight_kg: DEFAULT_WEIGHT_KG,
            development: DEFAULT_DEVELOPMENT.to_string(),
            modifiers: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    HasResult,
}

/// Form fields plus the result of the last compute action.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub form: FormState,
    result: Option<Measurements>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.result.is_some() {
            Phase::HasResult
        } else {
            Phase::Idle
        }
    }

    pub fn result(&self) -> Option<&Measurements> {
        self.result.as_ref()
    }

    /// Runs the calculator on the current fields and replaces any previous
    /// result.
    pub fn compute(&mut self, calculator: &Calculator, rng: &mut impl Rng) -> &Measurements {
        let input = self.form.to_input();
        tracing::info!(
            category = %input.category,
            height_cm = input.height_cm,
            weight_kg = input.weight_kg,
            development = %input.development,
            modifiers = ?input.modifiers,
            recompute = self.result.is_some(),
            "computing"
        );
        self.result.insert(calculator.calculate(&input, rng))
    }

    pub fn reset(&mut self) {
        tracing::info!("resetting form");
        self.form = FormState::default();
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn new_session_is_idle_with_defaults() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.result().is_none());
        assert_eq!(session.form.category, "global average");
        assert_eq!(session.form.height_cm, 175);
        assert_eq!(session.form.weight_kg, 70);
        assert_eq!(session.form.development, "random");
        assert!(session.form.modifiers.is_empty());
        assert!(session.form.creator_name.is_empty());
        assert!(session.form.character_name.is_empty());
    }

    #[test]
    fn compute_moves_to_has_result_and_recompute_overwrites() {
        let calculator = Calculator::default();
        let mut session = Session::new();
        let mut rng = StdRng::seed_from_u64(11);

        let first = session.compute(&calculator, &mut rng).clone();
        assert_eq!(session.phase(), Phase::HasResult);

        session.form.category = "Central/West Africa".to_string();
        let second = session.compute(&calculator, &mut rng).clone();
        assert_eq!(session.phase(), Phase::HasResult);
        assert_ne!(first, second);
        assert_eq!(session.result(), Some(&second));
    }

    #[test]
    fn field_edits_do_not_recompute() {
        let calculator = Calculator::default();
        let mut session = Session::new();
        let before = session
            .compute(&calculator, &mut StdRng::seed_from_u64(3))
            .clone();
        session.form.set_height_cm(210);
        session.form.set_modifier("Cobra tech", true);
        assert_eq!(session.result(), Some(&before));
    }

    #[test]
    fn reset_restores_every_default_and_clears_result() {
        let calculator = Calculator::default();
        let mut session = Session::new();
        session.form.creator_name = "someone".to_string();
        session.form.character_name = "Rook".to_string();
        session.form.category = "East Asian".to_string();
        session.form.set_height_cm(190);
        session.form.set_weight_kg(95);
        session.form.development = "well developed".to_string();
        session.form.set_modifier("estrogen analog", true);
        session.compute(&calculator, &mut StdRng::seed_from_u64(5));

        session.reset();

        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.result().is_none());
        assert_eq!(session.form, FormState::default());
    }

    #[test]
    fn height_and_weight_setters_clamp_to_slider_bounds() {
        let mut form = FormState::default();
        form.set_height_cm(100);
        assert_eq!(form.height_cm, 140);
        form.set_height_cm(300);
        assert_eq!(form.height_cm, 220);
        form.set_weight_kg(10);
        assert_eq!(form.weight_kg, 40);
        form.set_weight_kg(200);
        assert_eq!(form.weight_kg, 150);
        form.set_weight_kg(88);
        assert_eq!(form.weight_kg, 88);
    }

    #[test]
    fn modifier_selection_keeps_order_without_duplicates() {
        let mut form = FormState::default();
        form.set_modifier("growth hormone", true);
        form.set_modifier("Cobra tech", true);
        form.set_modifier("growth hormone", true);
        assert_eq!(form.modifiers, vec!["growth hormone", "Cobra tech"]);

        form.set_modifier("growth hormone", false);
        assert_eq!(form.modifiers, vec!["Cobra tech"]);
        assert!(form.has_modifier("Cobra tech"));
        assert!(!form.has_modifier("growth hormone"));
    }

    #[test]
    fn input_mirrors_form_fields() {
        let mut form = FormState::default();
        form.set_height_cm(182);
        form.set_modifier("synthetic steroids", true);
        let input = form.to_input();
        assert_eq!(input.category, DEFAULT_CATEGORY);
        assert_eq!(input.height_cm, 182.0);
        assert_eq!(input.weight_kg, 70.0);
        assert_eq!(input.development, DEFAULT_DEVELOPMENT);
        assert_eq!(input.modifiers, vec!["synthetic steroids"]);
    }
}
