//! Turns a calculation into what the user sees: labeled display groups,
//! reference sentences, and the plain-text export.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::calculator::{Comparison, Measurements, Relation, body_mass_index};
use crate::error::{Error, Result};
use crate::form::{FormState, Session};

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M";
const EXPORT_TITLE: &str = "OC size estimate";
const UNNAMED_CHARACTER: &str = "unnamed";
const ANONYMOUS_CREATOR: &str = "not provided";

pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "underweight"
    } else if bmi < 25.0 {
        "normal"
    } else if bmi < 30.0 {
        "overweight"
    } else {
        "obese"
    }
}

/// Live readout shown next to the sliders, before any compute.
pub fn bmi_readout(form: &FormState) -> String {
    let bmi = body_mass_index(f64::from(form.height_cm), f64::from(form.weight_kg));
    format!("{bmi:.1} ({})", bmi_category(bmi))
}

pub fn comparison_sentence(comparison: &Comparison) -> String {
    match comparison.relation() {
        Relation::About => format!(
            "About the length of {} ({}cm)",
            comparison.reference, comparison.reference_cm
        ),
        Relation::Longer => format!(
            "{:.1}cm longer than {}",
            comparison.difference_cm, comparison.reference
        ),
        Relation::Shorter => format!(
            "{:.1}cm shorter than {}",
            comparison.difference_cm.abs(),
            comparison.reference
        ),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayField {
    pub label: &'static str,
    pub value: String,
    /// Percentage change or reference sentence shown under the value.
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayGroup {
    pub title: &'static str,
    pub fields: Vec<DisplayField>,
}

fn field(label: &'static str, value: String, note: Option<String>) -> DisplayField {
    DisplayField { label, value, note }
}

pub fn display_groups(result: &Measurements) -> Vec<DisplayGroup> {
    let sentence = |comparison: &Option<Comparison>| comparison.as_ref().map(comparison_sentence);
    vec![
        DisplayGroup {
            title: "Flaccid",
            fields: vec![
                field(
                    "Actual length",
                    format!("{:.2}cm", result.flaccid_actual_cm),
                    sentence(&result.flaccid_actual_reference),
                ),
                field(
                    "Visible length",
                    format!("{:.2}cm", result.flaccid_visible_cm),
                    sentence(&result.flaccid_visible_reference),
                ),
            ],
        },
        DisplayGroup {
            title: "Erect",
            fields: vec![
                field(
                    "Erect length",
                    format!("{:.2}cm", result.erect_cm),
                    sentence(&result.erect_reference),
                ),
                field(
                    "Growth",
                    format!("+{:.1}cm", result.erect_growth_cm()),
                    Some(format!("+{:.0}%", (result.erection_factor - 1.0) * 100.0)),
                ),
                field("Erection factor", format!("{:.2}", result.erection_factor), None),
            ],
        },
        DisplayGroup {
            title: "Other factors",
            fields: vec![
                field("Base size", format!("{:.2}cm", result.adjusted_base_cm), None),
                field("Hormone factor", format!("{:.3}", result.hormone_modifier), None),
                field("Fat pad", format!("-{:.2}cm", result.fat_pad_cm), None),
            ],
        },
    ]
}

pub fn identity_line(form: &FormState, at: NaiveDateTime) -> Option<String> {
    let mut parts = Vec::new();
    if !form.creator_name.is_empty() {
        parts.push(format!("Creator: {}", form.creator_name));
    }
    if !form.character_name.is_empty() {
        parts.push(format!("Character: {}", form.character_name));
    }
    if parts.is_empty() {
        return None;
    }
    parts.push(format!("Time: {}", at.format(DISPLAY_TIME_FORMAT)));
    Some(parts.join(" | "))
}

pub fn modifier_line(result: &Measurements) -> Option<String> {
    if result.modifiers.is_empty() {
        None
    } else {
        Some(format!("Modifiers used: {}", result.modifiers.join(", ")))
    }
}

/// A ready-to-save text export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

/// Builds the export for the session's current result; `None` while idle.
pub fn export_for(session: &Session, at: NaiveDateTime) -> Option<Export> {
    session
        .result()
        .map(|result| build_export(&session.form, result, at))
}

pub fn build_export(form: &FormState, result: &Measurements, at: NaiveDateTime) -> Export {
    let creator = non_empty_or(&form.creator_name, ANONYMOUS_CREATOR);
    let character = non_empty_or(&form.character_name, UNNAMED_CHARACTER);

    let mut contents = String::new();
    contents.push_str(EXPORT_TITLE);
    contents.push('\n');
    contents.push_str(&format!("Time: {}\n", at.format(DISPLAY_TIME_FORMAT)));
    contents.push_str(&format!("Creator: {creator}\n"));
    contents.push_str(&format!("Character: {character}\n"));
    contents.push('\n');
    contents.push_str(&format!(
        "Flaccid actual length: {:.2}cm\n",
        result.flaccid_actual_cm
    ));
    contents.push_str(&format!(
        "Flaccid visible length: {:.2}cm\n",
        result.flaccid_visible_cm
    ));
    contents.push_str(&format!("Erect length: {:.2}cm\n", result.erect_cm));
    contents.push_str(&format!("Erection factor: {:.2}\n", result.erection_factor));
    contents.push_str(&format!("Base size: {:.2}cm\n", result.adjusted_base_cm));
    contents.push_str(&format!("Hormone factor: {:.3}\n", result.hormone_modifier));
    contents.push_str(&format!("Fat pad: {:.2}cm\n", result.fat_pad_cm));

    Export {
        file_name: format!(
            "OC_size_{}_{}.txt",
            file_safe(character),
            at.format(FILE_TIME_FORMAT)
        ),
        contents,
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect()
}

/// Writes `export` into `dir`, creating the directory when needed.
pub fn write_export(dir: &Path, export: &Export) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
    let path = dir.join(&export.file_name);
    let file = File::create(&path).map_err(|err| Error::io(&path, err))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(export.contents.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|err| Error::io(&path, err))?;
    tracing::info!(path = %path.display(), "wrote export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::calculator::Calculator;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 0))
            .expect("valid timestamp")
    }

    fn sample_result() -> Measurements {
        Measurements {
            adjusted_base_cm: 13.5,
            hormone_modifier: 1.0234,
            flaccid_actual_cm: 13.816,
            bmi: 22.857,
            fat_pad_cm: 0.31,
            flaccid_visible_cm: 13.506,
            erection_factor: 1.45,
            erect_cm: 20.0332,
            flaccid_actual_reference: None,
            flaccid_visible_reference: None,
            erect_reference: None,
            modifiers: Vec::new(),
        }
    }

    fn comparison(reference: &str, reference_cm: f64, difference_cm: f64) -> Comparison {
        Comparison {
            reference: reference.to_string(),
            reference_cm,
            difference_cm,
        }
    }

    #[test]
    fn bmi_categories_use_half_open_bands() {
        assert_eq!(bmi_category(18.4), "underweight");
        assert_eq!(bmi_category(18.5), "normal");
        assert_eq!(bmi_category(24.99), "normal");
        assert_eq!(bmi_category(25.0), "overweight");
        assert_eq!(bmi_category(30.0), "obese");
    }

    #[test]
    fn bmi_readout_for_default_form() {
        assert_eq!(bmi_readout(&FormState::default()), "22.9 (normal)");
    }

    #[test]
    fn comparison_sentences() {
        assert_eq!(
            comparison_sentence(&comparison("smartphone", 14.0, 0.2)),
            "About the length of smartphone (14cm)"
        );
        assert_eq!(
            comparison_sentence(&comparison("banana (medium)", 18.0, 1.04)),
            "1.0cm longer than banana (medium)"
        );
        assert_eq!(
            comparison_sentence(&comparison("bank card", 8.56, -1.56)),
            "1.6cm shorter than bank card"
        );
    }

    #[test]
    fn display_groups_round_for_display() {
        let groups = display_groups(&sample_result());
        let titles: Vec<_> = groups.iter().map(|group| group.title).collect();
        assert_eq!(titles, ["Flaccid", "Erect", "Other factors"]);

        let erect = &groups[1];
        assert_eq!(erect.fields[0].value, "20.03cm");
        assert_eq!(erect.fields[1].value, "+6.2cm");
        assert_eq!(erect.fields[1].note.as_deref(), Some("+45%"));
        assert_eq!(erect.fields[2].value, "1.45");

        let other = &groups[2];
        assert_eq!(other.fields[1].value, "1.023");
        assert_eq!(other.fields[2].value, "-0.31cm");
    }

    #[test]
    fn display_groups_carry_reference_sentences() {
        let calculator = Calculator::default();
        let mut session = Session::new();
        session.compute(&calculator, &mut StdRng::seed_from_u64(9));
        let result = session.result().expect("result");
        let groups = display_groups(result);
        assert!(groups[0].fields.iter().all(|field| field.note.is_some()));
        assert!(groups[1].fields[0].note.is_some());
    }

    #[test]
    fn identity_line_only_with_names() {
        let mut form = FormState::default();
        assert_eq!(identity_line(&form, at()), None);
        form.character_name = "Rook".to_string();
        assert_eq!(
            identity_line(&form, at()).as_deref(),
            Some("Character: Rook | Time: 2024-03-09 14:05")
        );
        form.creator_name = "ash".to_string();
        assert_eq!(
            identity_line(&form, at()).as_deref(),
            Some("Creator: ash | Character: Rook | Time: 2024-03-09 14:05")
        );
    }

    #[test]
    fn modifier_line_lists_selection() {
        let mut result = sample_result();
        assert_eq!(modifier_line(&result), None);
        result.modifiers = vec!["Cobra tech".to_string(), "growth hormone".to_string()];
        assert_eq!(
            modifier_line(&result).as_deref(),
            Some("Modifiers used: Cobra tech, growth hormone")
        );
    }

    #[test]
    fn export_uses_placeholders_for_missing_names() {
        let export = build_export(&FormState::default(), &sample_result(), at());
        assert_eq!(export.file_name, "OC_size_unnamed_20240309_1405.txt");
        let expected = "\
OC size estimate
Time: 2024-03-09 14:05
Creator: not provided
Character: unnamed

Flaccid actual length: 13.82cm
Flaccid visible length: 13.51cm
Erect length: 20.03cm
Erection factor: 1.45
Base size: 13.50cm
Hormone factor: 1.023
Fat pad: 0.31cm
";
        assert_eq!(export.contents, expected);
    }

    #[test]
    fn whitespace_name_counts_as_given_on_screen_and_in_export() {
        let mut form = FormState::default();
        form.character_name = "   ".to_string();
        assert_eq!(
            identity_line(&form, at()).as_deref(),
            Some("Character:     | Time: 2024-03-09 14:05")
        );
        let export = build_export(&form, &sample_result(), at());
        assert!(export.contents.contains("Character:    \n"));
        assert!(!export.contents.contains("unnamed"));
        assert_eq!(export.file_name, "OC_size_   _20240309_1405.txt");
    }

    #[test]
    fn export_file_name_strips_path_separators() {
        let mut form = FormState::default();
        form.character_name = "../Rook: v2".to_string();
        let export = build_export(&form, &sample_result(), at());
        assert_eq!(export.file_name, "OC_size_.._Rook_ v2_20240309_1405.txt");
        assert!(export.contents.contains("Character: ../Rook: v2\n"));
    }

    #[test]
    fn export_only_available_with_result() {
        let mut session = Session::new();
        assert!(export_for(&session, at()).is_none());
        session.compute(&Calculator::default(), &mut StdRng::seed_from_u64(1));
        assert!(export_for(&session, at()).is_some());
        session.reset();
        assert!(export_for(&session, at()).is_none());
    }

    #[test]
    fn write_export_creates_directory_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("exports");
        let export = build_export(&FormState::default(), &sample_result(), at());
        let path = write_export(&target, &export).expect("export written");
        assert_eq!(path, target.join(&export.file_name));
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written, export.contents);
    }
}
