use super::download::DownloadPayload;
use super::state::{PgtViewerApp, ServiceEvent};
use crate::settings::ManagerSettings;
use crate::types::PhysicalGraphTemplate;
use eframe::egui;
use std::collections::HashMap;

/// In-memory stand-in for the platform key-value storage.
#[derive(Default)]
struct MemStorage(HashMap<String, String>);

impl eframe::Storage for MemStorage {
    fn get_string(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: String) {
        self.0.insert(key.to_owned(), value);
    }

    fn flush(&mut self) {}
}

#[test]
fn json_export_miss_is_logged_but_downloads_nothing() {
    let mut app = PgtViewerApp::default();

    let request = app.apply_service_event(ServiceEvent::JsonExportMissing {
        pgt_name: "missing.graph".to_owned(),
    });

    assert!(request.is_none());
    assert!(app.alert.is_none());
}

#[test]
fn archive_failure_raises_exactly_one_alert_with_the_server_message() {
    let mut app = PgtViewerApp::default();

    let request = app.apply_service_event(ServiceEvent::CwlExportFailed {
        message: "graph too large".to_owned(),
    });

    assert!(request.is_none());
    assert_eq!(app.alert.as_deref(), Some("graph too large"));
}

#[test]
fn no_failure_event_ever_produces_a_download() {
    let failures = [
        ServiceEvent::JsonExportMissing {
            pgt_name: "a.graph".to_owned(),
        },
        ServiceEvent::JsonExportFailed {
            detail: "status: 500, status text: Internal Server Error".to_owned(),
        },
        ServiceEvent::PngExportFailed {
            detail: "pixmap allocation failed".to_owned(),
        },
        ServiceEvent::CwlExportFailed {
            message: "boom".to_owned(),
        },
        ServiceEvent::TemplateLoadFailed {
            detail: "parse error".to_owned(),
        },
        ServiceEvent::GenerateFailed {
            message: "manager unreachable".to_owned(),
        },
        ServiceEvent::DownloadFailed {
            detail: "disk full".to_owned(),
        },
    ];

    let mut app = PgtViewerApp::default();
    for failure in failures {
        assert!(app.apply_service_event(failure).is_none());
    }
}

#[test]
fn successful_exports_map_to_the_documented_filenames() {
    let mut app = PgtViewerApp::default();

    let json = app
        .apply_service_event(ServiceEvent::JsonExportReady {
            pgt_name: "wf.graph".to_owned(),
            body: "{}".to_owned(),
        })
        .expect("json export should download");
    assert_eq!(json.filename, "wf.graph");
    assert!(matches!(json.payload, DownloadPayload::Text(ref t) if t == "{}"));

    let png = app
        .apply_service_event(ServiceEvent::PngExportReady {
            pgt_name: "wf.graph".to_owned(),
            bytes: vec![1, 2, 3],
        })
        .expect("png export should download");
    assert_eq!(png.filename, "wf.graph_Template.png");
    assert!(matches!(
        png.payload,
        DownloadPayload::Bytes { mime: "image/png", .. }
    ));

    let cwl = app
        .apply_service_event(ServiceEvent::CwlExportReady {
            pgt_name: "wf.graph".to_owned(),
            bytes: vec![4, 5],
        })
        .expect("archive export should download");
    assert_eq!(cwl.filename, "wf.zip");
    assert!(matches!(
        cwl.payload,
        DownloadPayload::Bytes { mime: "application/zip", .. }
    ));
}

#[test]
fn overlapping_json_exports_resolve_independently() {
    let mut app = PgtViewerApp::default();

    // Two completions arriving out of any particular order, as produced by
    // two rapid export clicks with a template switch in between.
    app.events
        .sender
        .send(ServiceEvent::JsonExportReady {
            pgt_name: "first.graph".to_owned(),
            body: "{\"a\":1}".to_owned(),
        })
        .unwrap();
    app.events
        .sender
        .send(ServiceEvent::JsonExportReady {
            pgt_name: "second.graph".to_owned(),
            body: "{\"b\":2}".to_owned(),
        })
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = app.events.receiver.try_recv() {
        events.push(event);
    }

    let mut filenames = Vec::new();
    for event in events {
        if let Some(request) = app.apply_service_event(event) {
            filenames.push(request.filename);
        }
    }

    assert_eq!(filenames, vec!["first.graph", "second.graph"]);
}

#[test]
fn loaded_template_replaces_the_current_one_and_requests_a_fit() {
    let mut app = PgtViewerApp::default();
    app.canvas.pending_zoom_to_fit = false;

    let mut template = PhysicalGraphTemplate::sample();
    template.name = "loaded.graph".to_owned();
    let request = app.apply_service_event(ServiceEvent::TemplateLoaded { template });

    assert!(request.is_none());
    assert_eq!(app.pgt_name().as_deref(), Some("loaded.graph"));
    assert!(app.canvas.pending_zoom_to_fit);
}

#[test]
fn zoom_to_fit_centers_the_template_in_the_canvas() {
    let mut app = PgtViewerApp::default();
    let rect = egui::Rect::from_min_size(egui::pos2(0.0, 24.0), egui::vec2(800.0, 600.0));
    app.canvas.rect = Some(rect);

    app.zoom_to_fit();

    let ((min_x, min_y), (max_x, max_y)) =
        app.template.as_ref().unwrap().bounds().unwrap();
    let content_center = egui::pos2((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let on_screen = app.world_to_screen(content_center);

    assert!(app.canvas.zoom_factor > 0.25 && app.canvas.zoom_factor <= 5.0);
    assert!((on_screen.x - rect.center().x).abs() < 0.5);
    assert!((on_screen.y - rect.center().y).abs() < 0.5);
    assert!(!app.canvas.pending_zoom_to_fit);
}

#[test]
fn settings_fields_resync_from_storage_when_the_panel_hides() {
    let mut storage = MemStorage::default();
    ManagerSettings {
        host: "stored-host".to_owned(),
        port: "4321".to_owned(),
        prefix: "dlg".to_owned(),
    }
    .save(&mut storage);

    let mut app = PgtViewerApp::default();
    app.settings_panel.open = true;
    app.settings_panel.was_open = true;
    app.settings_panel.host = "half-typed".to_owned();
    app.settings_panel.port = "99".to_owned();

    // Still open: edits stay.
    app.sync_settings_fields(&storage);
    assert_eq!(app.settings_panel.host, "half-typed");

    // Hidden without saving: fields snap back to the stored values.
    app.settings_panel.open = false;
    app.sync_settings_fields(&storage);
    assert_eq!(app.settings_panel.host, "stored-host");
    assert_eq!(app.settings_panel.port, "4321");
    assert_eq!(app.settings_panel.prefix, "dlg");
    assert!(!app.settings_panel.was_open);
}

#[test]
fn svg_snapshot_contains_every_drop_label() {
    let app = PgtViewerApp::default();
    let (svg, width, height) = app.build_template_svg();

    assert!(svg.starts_with("<svg"));
    assert!(width > 0 && height > 0);
    for drop in &app.template.as_ref().unwrap().drops {
        assert!(svg.contains(&drop.name), "missing label {}", drop.name);
    }
}

#[test]
fn svg_snapshot_escapes_markup_in_labels() {
    let mut app = PgtViewerApp::default();
    if let Some(template) = app.template.as_mut() {
        template.drops[0].name = "a<b&c".to_owned();
    }

    let (svg, _, _) = app.build_template_svg();
    assert!(svg.contains("a&lt;b&amp;c"));
    assert!(!svg.contains("a<b&c"));
}

#[test]
fn canvas_draws_headless_without_panicking() {
    let mut app = PgtViewerApp::default();

    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));

    let ctx = egui::Context::default();
    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });

    // The draw recorded the canvas rect and consumed the initial fit.
    assert!(app.canvas.rect.is_some());
    assert!(!app.canvas.pending_zoom_to_fit);
}
