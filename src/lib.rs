//! # Physical Graph Viewer
//!
//! A viewer and export front-end for physical graph templates held by a
//! graph-translator service. The viewer displays a template on a pannable,
//! zoomable canvas and wires the surrounding controls:
//!
//! - **Exports**: the current template as raw JSON text, a rendered PNG
//!   image, or a packaged CWL zip archive, each handed to the platform's
//!   "save file" action
//! - **Settings**: manager host/port/prefix persisted in durable key-value
//!   storage across sessions
//! - **Service actions**: loading a named template and asking the
//!   translator to generate (and optionally deploy) a physical graph
//!
//! Builds for both native targets and the web; platform differences are
//! confined to the download primitive, the PNG rasterizer and the async
//! spawner.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod constants;
mod service;
mod settings;
mod types;
mod ui;

pub use service::{create_zip_filename, png_filename, ServiceError};
pub use settings::ManagerSettings;
pub use types::{DropCategory, DropLink, DropNode, PhysicalGraphTemplate};
pub use ui::PgtViewerApp;

/// Runs the viewer in a native window.
///
/// Brings up a tokio runtime for the background service requests, then
/// starts the eframe event loop.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     pgt_viewer::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let _enter = runtime.enter();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Physical Graph Viewer",
        options,
        Box::new(|cc| {
            let mut app = PgtViewerApp::default();
            if let Some(storage) = cc.storage {
                app.settings_panel
                    .fill_from(&ManagerSettings::load(storage));
            }
            Ok(Box::new(app))
        }),
    )?;
    Ok(())
}

/// Starts the viewer inside the canvas element with the given id (web
/// builds).
#[cfg(target_arch = "wasm32")]
pub fn start_web(canvas_id: String) {
    use eframe::wasm_bindgen::JsCast;

    wasm_bindgen_futures::spawn_local(async move {
        let Some(element) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&canvas_id))
        else {
            log::error!("canvas element '{canvas_id}' not found");
            return;
        };
        let Ok(canvas) = element.dyn_into::<web_sys::HtmlCanvasElement>() else {
            log::error!("element '{canvas_id}' is not a canvas");
            return;
        };

        let result = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|cc| {
                    let mut app = PgtViewerApp::default();
                    if let Some(storage) = cc.storage {
                        app.settings_panel
                            .fill_from(&ManagerSettings::load(storage));
                    }
                    Ok(Box::new(app))
                }),
            )
            .await;
        if let Err(err) = result {
            log::error!("failed to start viewer: {err:?}");
        }
    });
}
