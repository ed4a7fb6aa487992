use flow_loom::gui::{FlowEditor, FlowEditorOptions};
use flow_loom::persistence::effective_settings;
use flow_loom::persistence::settings::AppSettings;
use flow_loom::persistence::source::{DiagramSource, LocalStateSource, WorkspaceFileSource};
use flow_loom::threats::ThreatCatalog;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let settings = effective_settings();
    log::info!("settings directory: {}", AppSettings::settings_dir().display());

    let source: Box<dyn DiagramSource> =
        match WorkspaceFileSource::open(settings.storage_dir(), settings.workspace.clone()) {
            Ok(src) => {
                log::info!("diagram storage: {}", src.active_path().display());
                Box::new(src)
            }
            Err(e) => {
                // Still usable, just not persistent
                log::error!("cannot open diagram storage, keeping the diagram in memory: {:#}", e);
                Box::new(LocalStateSource::new(None))
            }
        };

    let catalog = match &settings.threats_path {
        Some(path) => ThreatCatalog::load_from_path(path).unwrap_or_else(|e| {
            log::warn!("cannot read threats from {}: {:#}", path.display(), e);
            ThreatCatalog::default()
        }),
        None => ThreatCatalog::default(),
    };
    log::info!("{} threat(s) available for linking", catalog.len());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 760.0])
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    let editor_options = FlowEditorOptions {
        app_mode: settings.workspace.clone(),
        on_threat_list_view: Some(Box::new(|| log::info!("threat list view requested"))),
    };
    eframe::run_native(
        "Flow-Loom",
        options,
        Box::new(move |_cc| Ok(Box::new(FlowEditor::new(source, catalog, settings, editor_options)) as Box<dyn eframe::App>)),
    )
}
