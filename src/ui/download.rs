//! The download primitive: hand an in-memory export result to the user as a
//! "save file" action.
//!
//! On the web this means a programmatically clicked anchor element — a data
//! URL for text, a blob object URL for binary data. The object URL is held
//! by a guard that revokes it exactly once when dropped, after the click,
//! on every exit path. On native builds the counterpart is an async save
//! dialog followed by a filesystem write.

use std::sync::mpsc::Sender;

use eframe::egui;

use super::state::ServiceEvent;

/// What to write into the downloaded file.
#[derive(Debug)]
pub enum DownloadPayload {
    /// Plain text, delivered with a `text/plain` content type.
    Text(String),
    /// Raw bytes with an explicit MIME type.
    Bytes {
        /// File contents.
        data: Vec<u8>,
        /// MIME type attached to the blob on web targets.
        mime: &'static str,
    },
}

/// A single download to hand to the platform.
#[derive(Debug)]
pub struct DownloadRequest {
    /// Target filename offered to the user.
    pub filename: String,
    /// File contents.
    pub payload: DownloadPayload,
}

impl DownloadRequest {
    /// A text download.
    pub fn text(filename: impl Into<String>, text: String) -> Self {
        Self {
            filename: filename.into(),
            payload: DownloadPayload::Text(text),
        }
    }

    /// A binary download.
    pub fn bytes(filename: impl Into<String>, data: Vec<u8>, mime: &'static str) -> Self {
        Self {
            filename: filename.into(),
            payload: DownloadPayload::Bytes { data, mime },
        }
    }
}

/// Delivers a download and reports the outcome on the event channel.
///
/// Never blocks the UI thread: the native path runs dialog and write on the
/// runtime, the web path only touches the DOM (which is immediate).
#[cfg(not(target_arch = "wasm32"))]
pub fn deliver(request: DownloadRequest, sender: Sender<ServiceEvent>, ctx: &egui::Context) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let DownloadRequest { filename, payload } = request;
        let mut dialog = rfd::AsyncFileDialog::new().set_file_name(&filename);
        if let Some((label, extensions)) = filter_for(&filename) {
            dialog = dialog.add_filter(label, extensions);
        }
        if let Some(handle) = dialog.save_file().await {
            let path = handle.path();
            let bytes = match payload {
                DownloadPayload::Text(text) => text.into_bytes(),
                DownloadPayload::Bytes { data, mime } => {
                    log::debug!("writing {} bytes of {mime}", data.len());
                    data
                }
            };
            let event = match std::fs::write(path, bytes) {
                Ok(()) => ServiceEvent::DownloadFinished { filename },
                Err(err) => ServiceEvent::DownloadFailed {
                    detail: format!("failed to save {}: {}", path.display(), err),
                },
            };
            let _ = sender.send(event);
        }
        ctx.request_repaint();
    });
}

/// Delivers a download and reports the outcome on the event channel.
#[cfg(target_arch = "wasm32")]
pub fn deliver(request: DownloadRequest, sender: Sender<ServiceEvent>, ctx: &egui::Context) {
    let DownloadRequest { filename, payload } = request;
    let result = match &payload {
        DownloadPayload::Text(text) => download_text(&filename, text),
        DownloadPayload::Bytes { data, mime } => download_blob(&filename, data, mime),
    };
    let event = match result {
        Ok(()) => ServiceEvent::DownloadFinished { filename },
        Err(detail) => ServiceEvent::DownloadFailed { detail },
    };
    let _ = sender.send(event);
    ctx.request_repaint();
}

#[cfg(not(target_arch = "wasm32"))]
fn filter_for(filename: &str) -> Option<(&'static str, &'static [&'static str])> {
    let extension = filename.rsplit('.').next()?;
    match extension {
        "json" | "graph" => Some(("JSON", &["json", "graph"])),
        "png" => Some(("PNG", &["png"])),
        "zip" => Some(("ZIP", &["zip"])),
        _ => None,
    }
}

/// Owned blob object URL, revoked exactly once on drop.
#[cfg(target_arch = "wasm32")]
pub(crate) struct ObjectUrl(String);

#[cfg(target_arch = "wasm32")]
impl ObjectUrl {
    /// Allocates an object URL for the blob.
    pub fn from_blob(blob: &web_sys::Blob) -> Result<Self, String> {
        web_sys::Url::create_object_url_with_blob(blob)
            .map(Self)
            .map_err(|_| "Failed to create object URL".to_owned())
    }

    /// The URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = web_sys::Url::revoke_object_url(&self.0);
    }
}

/// Downloads text through a data URL; no temporary object lifetime to
/// manage.
#[cfg(target_arch = "wasm32")]
fn download_text(filename: &str, text: &str) -> Result<(), String> {
    let encoded = String::from(js_sys::encode_uri_component(text));
    let href = format!("data:text/plain;charset=utf-8,{}", encoded);
    click_anchor(&href, filename)
}

/// Downloads bytes through a blob object URL. The URL outlives the click and
/// is revoked when `url` goes out of scope, on success and error paths
/// alike.
#[cfg(target_arch = "wasm32")]
fn download_blob(filename: &str, bytes: &[u8], mime: &str) -> Result<(), String> {
    let array = js_sys::Uint8Array::from(bytes);
    let blob_parts = js_sys::Array::new();
    blob_parts.push(&array.buffer());

    let mut blob_options = web_sys::BlobPropertyBag::new();
    blob_options.type_(mime);

    let blob =
        web_sys::Blob::new_with_buffer_source_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "Failed to create blob")?;

    let url = ObjectUrl::from_blob(&blob)?;
    click_anchor(url.as_str(), filename)
}

/// Creates a hidden anchor pointing at `href`, clicks it, and removes it
/// from the document again.
#[cfg(target_arch = "wasm32")]
fn click_anchor(href: &str, filename: &str) -> Result<(), String> {
    use eframe::wasm_bindgen::JsCast;

    let window = web_sys::window().ok_or("No window found")?;
    let document = window.document().ok_or("No document found")?;

    let anchor = document
        .create_element("a")
        .map_err(|_| "Failed to create anchor element")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| "Failed to cast to anchor element")?;

    anchor.set_href(href);
    anchor.set_download(filename);
    anchor.style().set_property("display", "none").ok();

    let body = document.body().ok_or("No body found")?;
    body.append_child(&anchor)
        .map_err(|_| "Failed to append anchor")?;

    anchor.click();

    body.remove_child(&anchor)
        .map_err(|_| "Failed to remove anchor")?;

    Ok(())
}
