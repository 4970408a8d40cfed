//! Application state structures.
//!
//! Holds the main [`PgtViewerApp`] struct plus the state of the canvas, the
//! settings panel and the channel on which background tasks (service
//! requests, downloads) report back to the UI thread.

use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui;

use crate::service;
use crate::settings::ManagerSettings;
use crate::types::PhysicalGraphTemplate;

/// State related to canvas navigation and display.
pub struct CanvasState {
    /// Current canvas pan offset in screen space.
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal).
    pub zoom_factor: f32,
    /// Whether the dot grid is drawn behind the template.
    pub show_grid: bool,
    /// Screen rectangle the canvas occupied last frame, if it was drawn yet.
    pub rect: Option<egui::Rect>,
    /// One-shot request to fit the view to the template on the next draw.
    pub pending_zoom_to_fit: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            show_grid: true,
            rect: None,
            pending_zoom_to_fit: true,
        }
    }
}

/// State of the settings modal and its three text fields.
///
/// The fields mirror the storage only at well-defined moments: they are
/// filled from [`ManagerSettings::load`] at startup and every time the panel
/// transitions to hidden, so edits that were never saved do not stick.
#[derive(Default)]
pub struct SettingsPanelState {
    /// Whether the modal is currently shown.
    pub open: bool,
    /// Whether the modal was shown last frame (hide-transition detection).
    pub was_open: bool,
    /// Host text field contents.
    pub host: String,
    /// Port text field contents.
    pub port: String,
    /// Prefix text field contents.
    pub prefix: String,
}

impl SettingsPanelState {
    /// Overwrites the text fields with the given stored settings.
    pub fn fill_from(&mut self, settings: &ManagerSettings) {
        self.host = settings.host.clone();
        self.port = settings.port.clone();
        self.prefix = settings.prefix.clone();
    }

    /// The settings triple as currently typed into the panel.
    pub fn as_settings(&self) -> ManagerSettings {
        ManagerSettings {
            host: self.host.clone(),
            port: self.port.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Messages sent from background tasks back to the UI thread.
///
/// Each export or service call is one-shot: it sends exactly one terminal
/// event and holds no other state. Overlapping operations produce
/// independent, unordered events.
#[derive(Debug)]
pub enum ServiceEvent {
    /// JSON export: the service returned the template body.
    JsonExportReady {
        /// Template name, used verbatim as the download filename.
        pgt_name: String,
        /// JSON text returned by the service.
        body: String,
    },
    /// JSON export: the service answered 404 (diagnostic only).
    JsonExportMissing {
        /// Template name that could not be located.
        pgt_name: String,
    },
    /// JSON export: any other failure (diagnostic only).
    JsonExportFailed {
        /// Formatted failure detail.
        detail: String,
    },
    /// PNG export: the canvas was rendered and encoded.
    PngExportReady {
        /// Template name the filename is derived from.
        pgt_name: String,
        /// Encoded PNG bytes.
        bytes: Vec<u8>,
    },
    /// PNG export: rendering or encoding failed (diagnostic only).
    PngExportFailed {
        /// Formatted failure detail.
        detail: String,
    },
    /// Archive export: the service returned the packaged zip.
    CwlExportReady {
        /// Template name the filename is derived from.
        pgt_name: String,
        /// Archive bytes.
        bytes: Vec<u8>,
    },
    /// Archive export: the service reported a human-readable error, shown in
    /// a blocking dialog.
    CwlExportFailed {
        /// Error message from the service (or transport error text).
        message: String,
    },
    /// Load action: a template was fetched and parsed.
    TemplateLoaded {
        /// The parsed template.
        template: PhysicalGraphTemplate,
    },
    /// Load action failed (diagnostic only).
    TemplateLoadFailed {
        /// Formatted failure detail.
        detail: String,
    },
    /// Generate/deploy action completed.
    GenerateFinished {
        /// Whether the graph was also deployed to the manager.
        deployed: bool,
    },
    /// Generate/deploy action failed, shown in a blocking dialog.
    GenerateFailed {
        /// Error message from the service (or transport error text).
        message: String,
    },
    /// A download was written (native) or handed to the browser (web).
    DownloadFinished {
        /// Filename that was delivered.
        filename: String,
    },
    /// A download could not be delivered (diagnostic only).
    DownloadFailed {
        /// Formatted failure detail.
        detail: String,
    },
}

/// The channel background tasks use to report [`ServiceEvent`]s.
pub struct EventChannel {
    /// Sending half, cloned into every spawned task.
    pub sender: Sender<ServiceEvent>,
    /// Receiving half, drained once per frame on the UI thread.
    pub receiver: Receiver<ServiceEvent>,
}

impl Default for EventChannel {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }
}

/// The main application: template display plus the export/settings control
/// layer around it.
pub struct PgtViewerApp {
    /// The currently displayed template, if any. Its `name` is the
    /// `pgt_name` threaded into every export call.
    pub template: Option<PhysicalGraphTemplate>,
    /// Base URL of the graph-translator service.
    pub service_url: String,
    /// Canvas navigation state.
    pub canvas: CanvasState,
    /// Settings modal state.
    pub settings_panel: SettingsPanelState,
    /// Channel for background task results.
    pub events: EventChannel,
    /// Blocking error dialog contents, if one is showing.
    pub alert: Option<String>,
    /// Whether the about dialog is showing.
    pub about_open: bool,
    /// Template name typed into the load field.
    pub load_name: String,
    /// Whether dark mode visuals are enabled.
    pub dark_mode: bool,
}

impl Default for PgtViewerApp {
    fn default() -> Self {
        Self {
            template: Some(PhysicalGraphTemplate::sample()),
            service_url: service::default_service_url(),
            canvas: CanvasState::default(),
            settings_panel: SettingsPanelState::default(),
            events: EventChannel::default(),
            alert: None,
            about_open: false,
            load_name: String::new(),
            dark_mode: true,
        }
    }
}

impl PgtViewerApp {
    /// Name of the currently loaded template, if one is loaded.
    pub fn pgt_name(&self) -> Option<String> {
        self.template.as_ref().map(|t| t.name.clone())
    }

    /// Re-fills the settings fields from storage whenever the panel has just
    /// transitioned to hidden, so the panel always reflects the last saved
    /// state even if the user edited fields without saving.
    pub fn sync_settings_fields(&mut self, storage: &dyn eframe::Storage) {
        if self.settings_panel.was_open && !self.settings_panel.open {
            self.settings_panel.fill_from(&ManagerSettings::load(storage));
        }
        self.settings_panel.was_open = self.settings_panel.open;
    }
}
