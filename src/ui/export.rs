//! Export controller: obtain the current template as JSON text, a rendered
//! PNG, or a packaged CWL archive, and hand the result to the download
//! primitive.
//!
//! Every operation is one-shot and stateless. The work happens off the UI
//! thread (tokio on native, the browser microtask queue on the web) and
//! finishes by posting a single [`ServiceEvent`]; the mapping from events to
//! downloads, logs and dialogs lives in [`PgtViewerApp::apply_service_event`]
//! so it can be tested without any I/O. Failure branches never produce a
//! download.

use std::fmt::Write as _;

use eframe::egui;

use super::download::{self, DownloadRequest};
use super::state::{PgtViewerApp, ServiceEvent};
use crate::constants;
use crate::service;
use crate::settings::ManagerSettings;
use crate::types::{DropCategory, PhysicalGraphTemplate};

impl PgtViewerApp {
    /// Drains completed background tasks and applies their effects,
    /// triggering downloads for the successful ones.
    pub fn process_service_events(&mut self, ctx: &egui::Context) {
        let mut events = Vec::new();
        while let Ok(event) = self.events.receiver.try_recv() {
            events.push(event);
        }
        for event in events {
            if let Some(request) = self.apply_service_event(event) {
                download::deliver(request, self.events.sender.clone(), ctx);
            }
        }
    }

    /// Maps one terminal event to its visible side effect.
    ///
    /// Successful exports yield a download request; archive and deploy
    /// failures raise the blocking dialog; everything else is a log-only
    /// diagnostic. The dialog/log split intentionally mirrors the original
    /// UI's asymmetric error surfacing.
    pub(crate) fn apply_service_event(&mut self, event: ServiceEvent) -> Option<DownloadRequest> {
        match event {
            ServiceEvent::JsonExportReady { pgt_name, body } => {
                Some(DownloadRequest::text(pgt_name, body))
            }
            ServiceEvent::JsonExportMissing { pgt_name } => {
                log::error!("server cannot locate physical graph file {pgt_name}");
                None
            }
            ServiceEvent::JsonExportFailed { detail } => {
                log::error!("{detail}");
                None
            }
            ServiceEvent::PngExportReady { pgt_name, bytes } => Some(DownloadRequest::bytes(
                service::png_filename(&pgt_name),
                bytes,
                "image/png",
            )),
            ServiceEvent::PngExportFailed { detail } => {
                log::warn!("PNG export failed: {detail}");
                None
            }
            ServiceEvent::CwlExportReady { pgt_name, bytes } => Some(DownloadRequest::bytes(
                service::create_zip_filename(&pgt_name),
                bytes,
                "application/zip",
            )),
            ServiceEvent::CwlExportFailed { message } => {
                self.alert = Some(message);
                None
            }
            ServiceEvent::TemplateLoaded { template } => {
                self.template = Some(template);
                self.canvas.pending_zoom_to_fit = true;
                None
            }
            ServiceEvent::TemplateLoadFailed { detail } => {
                log::error!("{detail}");
                None
            }
            ServiceEvent::GenerateFinished { deployed } => {
                if deployed {
                    log::info!("physical graph generated and deployed");
                } else {
                    log::info!("physical graph generated");
                }
                None
            }
            ServiceEvent::GenerateFailed { message } => {
                self.alert = Some(message);
                None
            }
            ServiceEvent::DownloadFinished { filename } => {
                log::info!("downloaded {filename}");
                None
            }
            ServiceEvent::DownloadFailed { detail } => {
                log::error!("{detail}");
                None
            }
        }
    }

    /// Exports the named template as JSON text.
    pub fn export_json(&self, ctx: &egui::Context, pgt_name: &str) {
        let url = self.service_url.clone();
        let name = pgt_name.to_owned();
        let sender = self.events.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let event = match service::fetch_pgt_json(&url, &name).await {
                Ok(body) => ServiceEvent::JsonExportReady {
                    pgt_name: name,
                    body,
                },
                Err(service::ServiceError::NotFound(pgt_name)) => {
                    ServiceEvent::JsonExportMissing { pgt_name }
                }
                Err(err) => ServiceEvent::JsonExportFailed {
                    detail: err.to_string(),
                },
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }

    /// Exports the named template as a packaged CWL zip archive.
    pub fn export_cwl(&self, ctx: &egui::Context, pgt_name: &str) {
        let url = self.service_url.clone();
        let name = pgt_name.to_owned();
        let sender = self.events.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let event = match service::fetch_pgt_cwl(&url, &name).await {
                Ok(bytes) => ServiceEvent::CwlExportReady {
                    pgt_name: name,
                    bytes,
                },
                Err(err) => ServiceEvent::CwlExportFailed {
                    message: err.to_string(),
                },
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }

    /// Exports the current canvas contents as a PNG image.
    ///
    /// The template is rendered to an SVG snapshot and rasterized: directly
    /// through resvg on native builds, through an offscreen browser canvas
    /// on the web (where the encoded result comes back as a base64 data URL
    /// and is decoded to raw bytes before download).
    pub fn export_png(&self, ctx: &egui::Context, pgt_name: &str) {
        let (svg, width, height) = self.build_template_svg();
        let pgt_name = pgt_name.to_owned();
        let sender = self.events.sender.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let event = match rasterize_svg(&svg, width, height) {
                Ok(bytes) => ServiceEvent::PngExportReady { pgt_name, bytes },
                Err(detail) => ServiceEvent::PngExportFailed { detail },
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let ctx = ctx.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match rasterize_svg_on_canvas(svg, width, height).await {
                    Ok(bytes) => ServiceEvent::PngExportReady { pgt_name, bytes },
                    Err(detail) => ServiceEvent::PngExportFailed { detail },
                };
                let _ = sender.send(event);
                ctx.request_repaint();
            });
        }
    }

    /// Fetches the template named in the load field and displays it.
    pub fn load_template(&self, ctx: &egui::Context) {
        let name = self.load_name.trim().to_owned();
        if name.is_empty() {
            return;
        }
        let url = self.service_url.clone();
        let sender = self.events.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let event = match service::fetch_pgt_json(&url, &name).await {
                Ok(body) => match PhysicalGraphTemplate::from_json(&body) {
                    Ok(mut template) => {
                        if template.name.is_empty() {
                            template.name = name;
                        }
                        ServiceEvent::TemplateLoaded { template }
                    }
                    Err(err) => ServiceEvent::TemplateLoadFailed {
                        detail: format!("failed to parse template {name}: {err}"),
                    },
                },
                Err(err) => ServiceEvent::TemplateLoadFailed {
                    detail: err.to_string(),
                },
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }

    /// Asks the translator to generate a physical graph from the current
    /// template, optionally deploying it to the manager configured in the
    /// settings store.
    pub fn generate(
        &self,
        ctx: &egui::Context,
        storage: Option<&dyn eframe::Storage>,
        deploy: bool,
    ) {
        let Some(pgt_name) = self.pgt_name() else {
            return;
        };
        let settings = storage.map(ManagerSettings::load).unwrap_or_default();
        let url = self.service_url.clone();
        let sender = self.events.sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let event = match service::generate_pg(&url, &pgt_name, &settings, deploy).await {
                Ok(()) => ServiceEvent::GenerateFinished { deployed: deploy },
                Err(err) => ServiceEvent::GenerateFailed {
                    message: err.to_string(),
                },
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }

    /// Builds an SVG snapshot of the current template. Returns
    /// (svg, width, height).
    pub(crate) fn build_template_svg(&self) -> (String, u32, u32) {
        let margin = constants::CONTENT_MARGIN;
        let node_w = constants::NODE_WIDTH;
        let node_h = constants::NODE_HEIGHT;

        let template = self.template.as_ref();
        let bounds = template.and_then(|t| t.bounds());
        let ((min_x, min_y), (max_x, max_y)) =
            bounds.unwrap_or(((0.0, 0.0), (node_w, node_h)));

        let width = ((max_x - min_x) + node_w + 2.0 * margin).ceil().max(1.0) as u32;
        let height = ((max_y - min_y) + node_h + 2.0 * margin).ceil().max(1.0) as u32;

        // World -> svg coordinates (node centers).
        let map_x = |x: f32| x - min_x + node_w / 2.0 + margin;
        let map_y = |y: f32| y - min_y + node_h / 2.0 + margin;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = width,
            h = height
        );
        let _ = writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" />",
            width, height
        );

        let Some(template) = template else {
            let _ = writeln!(out, "</svg>");
            return (out, width, height);
        };

        // Links with a mid-point arrowhead, drawn under the nodes.
        let _ = writeln!(out, "<g stroke=\"#000000\" stroke-width=\"1.5\" fill=\"none\">");
        let mut arrow_polys: Vec<String> = Vec::new();
        for link in &template.links {
            let (Some(from), Some(to)) = (
                template.drop_by_oid(&link.from),
                template.drop_by_oid(&link.to),
            ) else {
                continue;
            };
            let (sx, sy) = (map_x(from.position.0), map_y(from.position.1));
            let (tx, ty) = (map_x(to.position.0), map_y(to.position.1));
            let _ = writeln!(
                out,
                "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" />",
                sx, sy, tx, ty
            );

            let dx = tx - sx;
            let dy = ty - sy;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
            let ux = dx / dist;
            let uy = dy / dist;
            let px = -uy;
            let py = ux;
            let arrow_len = 7.0;
            let arrow_half_w = arrow_len * 0.6;
            let cx = sx + dx * 0.5;
            let cy = sy + dy * 0.5;
            let tipx = cx + ux * arrow_len;
            let tipy = cy + uy * arrow_len;
            let leftx = cx - ux * arrow_len + px * arrow_half_w;
            let lefty = cy - uy * arrow_len + py * arrow_half_w;
            let rightx = cx - ux * arrow_len - px * arrow_half_w;
            let righty = cy - uy * arrow_len - py * arrow_half_w;
            arrow_polys.push(format!(
                "  <polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"#000000\" />",
                tipx, tipy, leftx, lefty, rightx, righty
            ));
        }
        let _ = writeln!(out, "</g>");

        for drop in &template.drops {
            let cx = map_x(drop.position.0);
            let cy = map_y(drop.position.1);
            let x = cx - node_w / 2.0;
            let y = cy - node_h / 2.0;
            let fill = match drop.category {
                DropCategory::Data => "#90ee90",
                DropCategory::Application => "#add8e6",
                DropCategory::Service => "#ffd78c",
            };
            let _ = writeln!(
                out,
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"#000000\" stroke-width=\"1.5\" />",
                x, y, node_w, node_h, fill
            );
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"#000\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
                cx,
                cy,
                escape_xml(&drop.name)
            );
        }

        // Arrowheads last so link direction stays visible over the fills.
        for poly in arrow_polys {
            let _ = writeln!(out, "{}", poly);
        }
        let _ = writeln!(out, "</svg>");

        (out, width, height)
    }
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_task<F>(future: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn_task<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Rasterizes the SVG snapshot and encodes it as PNG (native builds).
#[cfg(not(target_arch = "wasm32"))]
fn rasterize_svg(svg: &str, width: u32, height: u32) -> Result<Vec<u8>, String> {
    use std::sync::Arc;

    let mut opt = usvg::Options::default();
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| format!("failed to parse SVG for PNG export: {e}"))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| format!("failed to create pixmap {width}x{height}"))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let mut pmut = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pmut);

    pixmap
        .encode_png()
        .map_err(|e| format!("failed to encode PNG: {e}"))
}

/// Rasterizes the SVG snapshot through an offscreen browser canvas (web
/// builds).
///
/// The SVG goes into a blob-backed `<img>`; once its load event fires it is
/// drawn onto a canvas whose `toDataURL("image/png")` output is
/// base64-decoded back into raw bytes. The blob's object URL is revoked when
/// the guard drops, after the image has been consumed, on every exit path.
#[cfg(target_arch = "wasm32")]
async fn rasterize_svg_on_canvas(svg: String, width: u32, height: u32) -> Result<Vec<u8>, String> {
    use eframe::wasm_bindgen::{closure::Closure, JsCast, JsValue};

    use super::download::ObjectUrl;

    let window = web_sys::window().ok_or("No window found")?;
    let document = window.document().ok_or("No document found")?;

    let blob_parts = js_sys::Array::new();
    blob_parts.push(&JsValue::from_str(&svg));
    let mut blob_options = web_sys::BlobPropertyBag::new();
    blob_options.type_("image/svg+xml");
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
        .map_err(|_| "Failed to create SVG blob")?;
    let url = ObjectUrl::from_blob(&blob)?;

    let image =
        web_sys::HtmlImageElement::new().map_err(|_| "Failed to create image element")?;

    // Wait for the image load to complete before touching the canvas.
    let (sender, receiver) = futures::channel::oneshot::channel::<Result<(), String>>();
    let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));

    let on_load = {
        let sender = sender.clone();
        Closure::wrap(Box::new(move || {
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(Ok(()));
            }
        }) as Box<dyn FnMut()>)
    };
    image.set_onload(Some(on_load.as_ref().unchecked_ref()));
    on_load.forget();

    let on_error = Closure::wrap(Box::new(move || {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(Err("Failed to load SVG image".to_owned()));
        }
    }) as Box<dyn FnMut()>);
    image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();

    image.set_src(url.as_str());
    receiver
        .await
        .map_err(|_| "Rendering was abandoned".to_owned())??;

    let canvas = document
        .create_element("canvas")
        .map_err(|_| "Failed to create canvas")?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| "Failed to cast to canvas element")?;
    canvas.set_width(width);
    canvas.set_height(height);

    let context = canvas
        .get_context("2d")
        .map_err(|_| "Failed to get 2d context")?
        .ok_or("Canvas has no 2d context")?
        .dyn_into::<web_sys::CanvasRenderingContext2d>()
        .map_err(|_| "Failed to cast 2d context")?;
    context
        .draw_image_with_html_image_element(&image, 0.0, 0.0)
        .map_err(|_| "Failed to draw image")?;

    let data_url = canvas
        .to_data_url_with_type("image/png")
        .map_err(|_| "Failed to encode canvas as PNG")?;
    decode_png_data_url(&window, &data_url)
}

/// Decodes the base64 payload of a `data:image/png;base64,` URL into raw
/// bytes. `atob` yields a binary string with one byte per char.
#[cfg(target_arch = "wasm32")]
fn decode_png_data_url(window: &web_sys::Window, data_url: &str) -> Result<Vec<u8>, String> {
    const PREFIX: &str = "data:image/png;base64,";
    let encoded = data_url
        .strip_prefix(PREFIX)
        .ok_or("Unexpected data URL format")?;
    let binary = window
        .atob(encoded)
        .map_err(|_| "Failed to decode image data")?;
    Ok(binary.chars().map(|c| c as u8).collect())
}
