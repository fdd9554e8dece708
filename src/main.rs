use std::path::PathBuf;

use eframe::egui;
use oc_size_calc::form::{HEIGHT_RANGE_CM, WEIGHT_RANGE_KG};
use oc_size_calc::{Calculator, Session, Tables, load_tables, report, tables};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXPORT_DIR: &str = "exports";

const DISCLAIMER: &[&str] = &[
    "For entertainment and character writing only.",
    "Not a medical tool; results have no medical meaning.",
    "Do not relate results to real people.",
    "Cobra tech and estrogen analog are fictional substances.",
];

struct EstimatorApp {
    calculator: Calculator,
    session: Session,
    export_dir: PathBuf,
    save_status: Option<String>,
}

impl EstimatorApp {
    fn new(calculator: Calculator) -> Self {
        Self {
            calculator,
            session: Session::new(),
            export_dir: PathBuf::from(EXPORT_DIR),
            save_status: None,
        }
    }

    fn render_inputs(&mut self, ui: &mut egui::Ui) {
        let tables = self.calculator.tables();
        let form = &mut self.session.form;

        egui::CollapsingHeader::new("Creator info")
            .default_open(false)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Creator name");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.creator_name).hint_text("optional"),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Character name");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.character_name).hint_text("optional"),
                    );
                });
            });

        egui::CollapsingHeader::new("Disclaimer")
            .default_open(true)
            .show(ui, |ui| {
                for line in DISCLAIMER {
                    ui.label(format!("• {line}"));
                }
            });

        ui.separator();
        ui.heading("Basic info");
        ui.horizontal(|ui| {
            ui.label("Background");
            egui::ComboBox::from_id_source("category")
                .selected_text(form.category.as_str())
                .show_ui(ui, |ui| {
                    for entry in &tables.baselines {
                        ui.selectable_value(
                            &mut form.category,
                            entry.label.clone(),
                            entry.label.as_str(),
                        );
                    }
                });
        });
        ui.add(egui::Slider::new(&mut form.height_cm, HEIGHT_RANGE_CM).text("Height (cm)"));
        ui.add(egui::Slider::new(&mut form.weight_kg, WEIGHT_RANGE_KG).text("Weight (kg)"));
        ui.label(format!("BMI: {}", report::bmi_readout(form)));

        egui::CollapsingHeader::new("Advanced")
            .default_open(false)
            .show(ui, |ui| {
                ui.columns(2, |columns| {
                    columns[0].label("Development");
                    for entry in &tables.development {
                        columns[0].radio_value(
                            &mut form.development,
                            entry.label.clone(),
                            entry.label.as_str(),
                        );
                    }
                    columns[1].label("Modifiers");
                    for modifier in &tables.modifiers {
                        let mut selected = form.has_modifier(&modifier.label);
                        if columns[1]
                            .checkbox(&mut selected, modifier.label.as_str())
                            .changed()
                        {
                            form.set_modifier(&modifier.label, selected);
                        }
                    }
                });
            });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Compute").clicked() {
                self.session.compute(&self.calculator, &mut rand::thread_rng());
                self.save_status = None;
            }
            if ui.button("Reset").clicked() {
                self.session.reset();
                self.save_status = None;
            }
        });
    }

    fn render_result(&mut self, ui: &mut egui::Ui) {
        let Some(result) = self.session.result() else {
            return;
        };
        let now = chrono::Local::now().naive_local();

        ui.separator();
        if let Some(identity) = report::identity_line(&self.session.form, now) {
            ui.label(identity);
        }
        ui.heading("Result");
        for group in report::display_groups(result) {
            ui.strong(group.title);
            egui::Grid::new(group.title)
                .num_columns(3)
                .striped(true)
                .show(ui, |ui| {
                    for field in &group.fields {
                        ui.label(field.label);
                        ui.monospace(field.value.as_str());
                        ui.label(field.note.as_deref().unwrap_or(""));
                        ui.end_row();
                    }
                });
        }
        if let Some(line) = report::modifier_line(result) {
            ui.label(line);
        }

        ui.separator();
        if ui.button("Save result").clicked() {
            if let Some(export) = report::export_for(&self.session, now) {
                self.save_status = Some(match report::write_export(&self.export_dir, &export) {
                    Ok(path) => format!("Saved to {}", path.display()),
                    Err(err) => {
                        tracing::error!(error = %err, "export failed");
                        format!("Save failed: {err}")
                    }
                });
            }
        }
        if let Some(status) = &self.save_status {
            ui.label(status.as_str());
        }
    }
}

impl eframe::App for EstimatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("OC Size Estimator");
                ui.label("Statistical-model toy for original character writing.");
                ui.separator();
                self.render_inputs(ui);
                ui.separator();
                self.render_actions(ui);
                self.render_result(ui);
                ui.separator();
                ui.small("Entertainment only | population-statistics toy | no medical value");
            });
        });
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "oc_size_calc=info".into());
    let json = std::env::var("OC_SIZE_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn load_calculator() -> Calculator {
    let tables = load_tables(tables::DEFAULT_TABLES_PATH).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load tables, using built-in tables");
        Tables::builtin()
    });
    Calculator::new(tables)
}

/// True on unix when neither an X11 nor a Wayland display is set.
fn lacks_display(var: impl Fn(&str) -> Option<String>) -> bool {
    cfg!(target_family = "unix") && var("DISPLAY").is_none() && var("WAYLAND_DISPLAY").is_none()
}

fn main() -> eframe::Result<()> {
    apply_wsl_winit_workaround();
    init_tracing();

    if lacks_display(|key| std::env::var(key).ok()) {
        tracing::error!("no GUI display detected (missing DISPLAY/WAYLAND_DISPLAY), exiting");
        std::process::exit(1);
    }

    let calculator = load_calculator();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 820.0])
            .with_min_inner_size([420.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "OC Size Estimator",
        native_options,
        Box::new(move |_cc| Ok(Box::new(EstimatorApp::new(calculator)))),
    )
    .inspect_err(|err| tracing::error!(error = %err, "failed to start GUI"))
}

fn apply_wsl_winit_workaround() {
    let is_wsl = std::env::var("WSL_DISTRO_NAME").is_ok()
        || std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|content| content.to_lowercase().contains("microsoft"))
            .unwrap_or(false);

    if is_wsl && std::env::var("WINIT_UNIX_BACKEND").is_err() {
        // SAFETY: runs first thing in `main`, before tracing or eframe start,
        // while the process is still single-threaded.
        unsafe {
            std::env::set_var("WINIT_UNIX_BACKEND", "x11");
        }
    }
}
