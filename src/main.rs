use std::{path::Path, sync::mpsc};

use anyhow::Context;
use eframe::egui;

mod buffer;
mod builder;
mod export;
mod overlay;
mod parsablefloat;
mod recording;
mod sampler;
mod settings;
mod utils;

use buffer::SampleBuffer;
use builder::{GraphBuilder, Unit};
use overlay::{OverlaySet, LIVE_COLOR};
use parsablefloat::ParsableFloat;
use recording::Recording;
use sampler::{Sample, Simulator};
use settings::{Settings, INTERVAL_RANGE_MS};
use utils::{extension_of, human_readable_size};

const READOUT_COLOR: egui::Color32 = egui::Color32::from_rgb(0x00, 0xe6, 0x76);
const UNIT_COLOR: egui::Color32 = egui::Color32::from_rgb(0x9a, 0xa7, 0xb1);

struct FlowBench {
    settings: Settings,
    interval_ms: ParsableFloat,

    simulator: Option<Simulator>,
    samples_rx: Option<mpsc::Receiver<Sample>>,
    last_sample: Option<Sample>,

    live: SampleBuffer,
    show_live: bool,
    reset_plot: bool,
    recording: Recording,

    builder: GraphBuilder,
    selected_row: Option<usize>,
    overlays: OverlaySet,

    show_error_dialog: bool,
    error_title: String,
    error_message: String,
}

impl FlowBench {
    fn new(settings: Settings) -> FlowBench {
        let (min, max) = INTERVAL_RANGE_MS;

        FlowBench {
            interval_ms: ParsableFloat::bounded(settings.interval_ms, min..=max),
            live: SampleBuffer::new(settings.max_points),
            settings,
            simulator: None,
            samples_rx: None,
            last_sample: None,
            show_live: true,
            reset_plot: false,
            recording: Recording::new(),
            builder: GraphBuilder::new(),
            selected_row: None,
            overlays: OverlaySet::new(),
            show_error_dialog: false,
            error_title: "".into(),
            error_message: "".into(),
        }
    }

    fn show_error(&mut self, title: &str, err: anyhow::Error) {
        log::warn!("{}: {:?}", title, err);

        if self.show_error_dialog {
            log::warn!("error dialog already open, not showing \"{}\"", title);
            return;
        }

        self.error_title = title.into();
        self.error_message = format!("{:#}", err);
        self.show_error_dialog = true;
    }

    fn start(&mut self, ctx: &egui::Context) {
        if self.simulator.is_some() {
            return;
        }

        let (sampled_tx, sampled_rx) = mpsc::sync_channel(self.settings.sample_channel_size);
        let repaint_ctx = ctx.clone();

        let callback = move |timestamp, value| -> anyhow::Result<()> {
            sampled_tx
                .try_send(Sample { timestamp, value })
                .context("UI sample channel full or closed")?;
            repaint_ctx.request_repaint();
            Ok(())
        };

        self.settings.interval_ms = self.interval_ms.value();
        match Simulator::new(callback, self.settings.interval_secs()) {
            Ok(mut simulator) => {
                simulator.start();
                log::info!("simulator started, interval {:?}", simulator.interval());

                self.simulator = Some(simulator);
                self.samples_rx = Some(sampled_rx);
            }
            Err(err) => self.show_error("Cannot start simulator", err.into()),
        }
    }

    fn stop(&mut self) {
        if let Some(mut simulator) = self.simulator.take() {
            simulator.stop();
            log::info!("simulator stopped");
        }
    }

    fn handle_samples(&mut self) {
        let Some(samples_rx) = &self.samples_rx else {
            return;
        };

        while let Ok(sample) = samples_rx.try_recv() {
            self.last_sample = Some(sample);
            self.live.push(sample.timestamp, sample.value);
            self.recording.record(sample);
        }
    }

    fn toggle_record(&mut self) {
        let Some(samples) = self.recording.toggle() else {
            log::info!("recording started");
            return;
        };

        log::info!("recording finished with {} samples", samples.len());

        let maybe_filename = rfd::FileDialog::new()
            .add_filter("CSV file (*.csv)", &["csv"])
            .add_filter("Numpy data (*.npy)", &["npy"])
            .set_file_name("recording.csv")
            .save_file();

        if let Some(filename) = maybe_filename {
            if let Err(err) = save_recording(&filename, &samples) {
                self.show_error("Save recording failed", err);
            }
        }
    }

    fn current_value(&self) -> Option<f64> {
        self.last_sample.map(|sample| sample.value)
    }

    fn add_current_to_selected(&mut self) {
        let (Some(row), Some(value)) = (self.selected_row, self.current_value()) else {
            return;
        };
        self.builder.set_value(row, value);
    }

    fn add_current_to_next(&mut self) {
        let Some(value) = self.current_value() else {
            return;
        };
        if let Some(row) = self.builder.fill_next_empty(value) {
            self.selected_row = Some(row);
        }
    }

    fn build_graph(&mut self, clear: bool) {
        let series = self.builder.series();
        let label = if clear { Some("Manual Build") } else { None };

        if self.overlays.plot(series, clear, label) && clear {
            self.show_live = false;
        }
    }

    fn clear_builder(&mut self) {
        self.builder.clear();
        self.selected_row = None;
        self.overlays.clear();
        self.live.clear();
        self.show_live = true;
        self.reset_plot = true;
    }

    fn save_builder(&mut self) {
        let maybe_filename = rfd::FileDialog::new()
            .add_filter("CSV file (*.csv)", &["csv"])
            .set_file_name("builder.csv")
            .save_file();

        if let Some(filename) = maybe_filename {
            log::info!("saving builder to {:?}", filename);
            if let Err(err) = self.builder.save_csv(&filename) {
                self.show_error("Save builder failed", err.into());
            }
        }
    }

    fn load_builder(&mut self) {
        let maybe_filename = rfd::FileDialog::new()
            .add_filter("CSV file (*.csv)", &["csv"])
            .pick_file();

        if let Some(filename) = maybe_filename {
            log::info!("loading builder from {:?}", filename);
            match self.builder.load_csv(&filename) {
                Ok(()) => self.selected_row = None,
                Err(err) => self.show_error("Load builder failed", err.into()),
            }
        }
    }

    fn export_svg(&mut self) {
        let maybe_filename = rfd::FileDialog::new()
            .add_filter("SVG image (*.svg)", &["svg"])
            .set_file_name("plot.svg")
            .save_file();

        let Some(filename) = maybe_filename else {
            return;
        };

        log::info!("exporting plot to {:?}", filename);

        let live: Vec<[f64; 2]> = if self.show_live {
            self.live.points().map(|p| [p.x, p.y]).collect()
        } else {
            Vec::new()
        };

        if let Err(err) = export::write_svg(
            &filename,
            &live,
            self.overlays.overlays(),
            self.overlays.title(),
            self.settings.svg_size,
        ) {
            self.show_error("Export failed", err.into());
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.group(|ui| {
                ui.vertical(|ui| {
                    let readout = match self.last_sample {
                        Some(sample) => format!("{:0.3}", sample.value),
                        None => "---".into(),
                    };
                    ui.label(
                        egui::RichText::new(readout)
                            .size(36.0)
                            .strong()
                            .color(READOUT_COLOR),
                    );
                    ui.label(egui::RichText::new("L/min").color(UNIT_COLOR));
                });
            });

            ui.group(|ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        if ui.button("Start").clicked() {
                            self.start(ui.ctx());
                        }
                        if ui.button("Stop").clicked() {
                            self.stop();
                        }

                        let record_label = if self.recording.is_active() {
                            "Stop recording"
                        } else {
                            "Record"
                        };
                        if ui.button(record_label).clicked() {
                            self.toggle_record();
                        }
                    });

                    ui.horizontal(|ui| {
                        let status = status_label(self.simulator.as_ref(), self.last_sample);
                        ui.label(status);

                        if self.recording.is_active() {
                            ui.label(format!("recording {} samples", self.recording.len()));
                        }
                    });

                    ui.horizontal(|ui| {
                        ui.label("Interval ");
                        let edit_color = if self.interval_ms.is_parsed_ok() {
                            egui::Color32::GREEN
                        } else {
                            egui::Color32::LIGHT_RED
                        };
                        if egui::TextEdit::singleline(self.interval_ms.editable_string())
                            .desired_width(50.0)
                            .text_color(edit_color)
                            .show(ui)
                            .response
                            .lost_focus()
                        {
                            self.interval_ms.update();
                        }
                        ui.label("ms");
                    });
                });
            });

            ui.group(|ui| {
                ui.vertical(|ui| {
                    let (used, capacity) = self.live.memory_footprint();
                    ui.label(format!("Buffer: {}", human_readable_size(used)));
                    ui.label(format!("Capacity: {}", human_readable_size(capacity)));
                    self.reset_plot |= ui.button("Reset plot").clicked();
                });
            });
        });
    }

    fn builder_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Resolution:");
            let mut resolution = self.builder.resolution();
            let (min, max) = builder::RESOLUTION_RANGE;
            if ui
                .add(
                    egui::DragValue::new(&mut resolution)
                        .speed(0.01)
                        .clamp_range(min..=max)
                        .suffix(format!(" {}", self.builder.unit().symbol())),
                )
                .changed()
            {
                self.builder.set_resolution(resolution);
            }

            let mut unit = self.builder.unit();
            egui::ComboBox::from_id_source("resolution-unit")
                .selected_text(unit.symbol())
                .show_ui(ui, |ui| {
                    for option in Unit::ALL {
                        ui.selectable_value(&mut unit, option, option.symbol());
                    }
                });
            self.builder.set_unit(unit);

            ui.label("Slots:");
            let mut slots = self.builder.slots();
            let (min, max) = builder::SLOTS_RANGE;
            if ui
                .add(egui::DragValue::new(&mut slots).clamp_range(min..=max))
                .changed()
            {
                self.builder.set_slots(slots);
            }

            if ui.button("Setup Slots").clicked() {
                self.builder.setup_slots();
                self.selected_row = None;
            }
        });
    }

    fn builder_table(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .max_height(180.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("builder-table")
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(self.builder.x_header()).strong());
                        ui.label(egui::RichText::new("Value").strong());
                        ui.end_row();

                        for i in 0..self.builder.rows().len() {
                            let selected = self.selected_row == Some(i);
                            let x = self.builder.rows()[i].x.clone();
                            if ui.selectable_label(selected, x).clicked() {
                                self.selected_row = Some(i);
                            }

                            if let Some(value) = self.builder.value_mut(i) {
                                let response = egui::TextEdit::singleline(value)
                                    .id(egui::Id::new(("builder-value", i)))
                                    .desired_width(120.0)
                                    .show(ui)
                                    .response;
                                if response.gained_focus() {
                                    self.selected_row = Some(i);
                                }
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn builder_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let has_value = self.last_sample.is_some();

            if ui
                .add_enabled(
                    has_value && self.selected_row.is_some(),
                    egui::Button::new("Add Current to Selected"),
                )
                .clicked()
            {
                self.add_current_to_selected();
            }
            if ui
                .add_enabled(has_value, egui::Button::new("Add Current to Next"))
                .clicked()
            {
                self.add_current_to_next();
            }

            ui.separator();

            if ui.button("Save Builder").clicked() {
                self.save_builder();
            }
            if ui.button("Load Builder").clicked() {
                self.load_builder();
            }
            if ui.button("Build Graph").clicked() {
                self.build_graph(true);
                self.reset_plot = true;
            }
            if ui.button("Overlay").clicked() {
                self.build_graph(false);
            }
            if ui.button("Clear Builder").clicked() {
                self.clear_builder();
            }
            if ui.button("Export SVG").clicked() {
                self.export_svg();
            }
        });
    }

    fn plot(&mut self, ui: &mut egui::Ui) {
        use egui_plot::{Legend, Line, Plot, Points};

        if let Some(title) = self.overlays.title() {
            ui.vertical_centered(|ui| ui.label(egui::RichText::new(title).strong()));
        }

        let mut plot = Plot::new("main")
            .legend(Legend::default())
            .x_axis_label(if self.show_live { "Time (s)" } else { "X" })
            .y_axis_label("Flow");

        if self.show_live {
            if let (Some((x_min, x_max)), Some((y_min, y_max))) =
                (self.live.x_range(), self.live.y_range())
            {
                plot = plot
                    .include_x(x_min)
                    .include_x(x_max)
                    .include_y(y_min)
                    .include_y(y_max);
            }
        }

        if std::mem::take(&mut self.reset_plot) {
            plot = plot.reset();
        }

        plot.show(ui, |plot_ui| {
            if self.show_live && !self.live.is_empty() {
                plot_ui.line(
                    Line::new(self.live.plot_points())
                        .color(LIVE_COLOR)
                        .width(2.0)
                        .name("Flow"),
                );
            }

            for overlay in self.overlays.overlays() {
                let name = overlay.label.clone().unwrap_or_else(|| "Overlay".into());

                plot_ui.line(
                    Line::new(overlay.points.clone())
                        .color(overlay.color)
                        .width(2.0)
                        .name(&name),
                );
                plot_ui.points(
                    Points::new(overlay.points.clone())
                        .radius(3.5)
                        .color(overlay.marker_color)
                        .name(&name),
                );
            }
        });
    }
}

impl eframe::App for FlowBench {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_samples();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            if self.show_error_dialog {
                ui.set_enabled(false);
            }

            ui.heading("FlowBench");
            self.toolbar(ui);
        });

        egui::TopBottomPanel::bottom("builder")
            .resizable(true)
            .show(ctx, |ui| {
                if self.show_error_dialog {
                    ui.set_enabled(false);
                }

                ui.label(egui::RichText::new("Manual Graph Builder").strong());
                self.builder_controls(ui);
                ui.separator();
                self.builder_table(ui);
                ui.separator();
                self.builder_actions(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot(ui);
        });

        if self.show_error_dialog {
            egui::Window::new(&self.error_title)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.error_message);
                    if ui.button("Close").clicked() {
                        self.show_error_dialog = false;
                    }
                });
        }
    }
}

fn status_label(simulator: Option<&Simulator>, last_sample: Option<Sample>) -> String {
    let Some(simulator) = simulator else {
        return "Idle".into();
    };

    match (simulator.start_time(), last_sample) {
        (Some(start_time), Some(sample)) if simulator.is_running() => format!(
            "Running for {:.1} s",
            (sample.timestamp - start_time).max(0.0)
        ),
        _ => format!("{:?}", simulator.status()),
    }
}

fn save_recording(filename: &Path, samples: &[Sample]) -> anyhow::Result<()> {
    match extension_of(filename).as_deref() {
        Some("npy") => {
            log::info!("saving recording as Numpy file to {:?}", filename);
            export::write_recording_npy(filename, samples)
                .with_context(|| format!("failed to write {:?}", filename))
        }
        Some("csv") | None => {
            log::info!("saving recording as CSV file to {:?}", filename);
            export::write_recording_csv(filename, samples)
                .with_context(|| format!("failed to write {:?}", filename))
        }
        Some(other) => anyhow::bail!("unsupported recording format \".{}\"", other),
    }
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .context("failed to initialize logger")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("FlowBench")
            .with_inner_size([1000.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FlowBench",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(FlowBench::new(Settings::default()))
        }),
    )
    .map_err(|err| anyhow::anyhow!("eframe::run_native error: {}", err))
}
