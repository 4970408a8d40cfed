//! HTTP client for the graph-translator service, plus the pure filename
//! transforms used when handing results to the download layer.
//!
//! Every request is one-shot and stateless: no retries, no timeouts beyond
//! the transport's own, no de-duplication of concurrent calls. Errors carry
//! enough context for the UI layer to decide between logging and alerting.

use thiserror::Error;

use crate::constants;
use crate::settings::ManagerSettings;

/// Failures of a single graph-service request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered 404 for the named template.
    #[error("server cannot locate physical graph file {0}")]
    NotFound(String),
    /// Any other non-success status on a path without an error body contract.
    #[error("status: {status}, status text: {status_text}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },
    /// The response body carried a human-readable error message.
    #[error("{0}")]
    Remote(String),
    /// The request never completed.
    #[error("{0}")]
    Transport(String),
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

/// Base URL of the graph service.
///
/// Web builds talk to the page's own origin, like the original browser UI;
/// native builds read `PGT_SERVICE_URL` and fall back to the translator's
/// stock address.
pub fn default_service_url() -> String {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_else(|| constants::DEFAULT_SERVICE_URL.to_owned())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var(constants::SERVICE_URL_ENV)
            .unwrap_or_else(|_| constants::DEFAULT_SERVICE_URL.to_owned())
    }
}

/// Fetches the JSON body of the named template.
///
/// 404 maps to [`ServiceError::NotFound`], any other non-success status to
/// [`ServiceError::Status`]; both are diagnostic-only conditions for the
/// caller.
pub async fn fetch_pgt_json(service_url: &str, pgt_name: &str) -> Result<String, ServiceError> {
    let url = format!("{}{}", service_url, constants::PGT_JSON_ENDPOINT);
    let response = reqwest::Client::new()
        .get(&url)
        .query(&[("pgt_name", pgt_name)])
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound(pgt_name.to_owned()));
    }
    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("unknown").to_owned(),
        });
    }
    response.text().await.map_err(transport)
}

/// Fetches the packaged CWL zip archive for the named template.
///
/// Anything but 200 means the body is a human-readable error message and is
/// returned as [`ServiceError::Remote`] for the caller to surface.
pub async fn fetch_pgt_cwl(service_url: &str, pgt_name: &str) -> Result<Vec<u8>, ServiceError> {
    let url = format!("{}{}", service_url, constants::PGT_CWL_ENDPOINT);
    let response = reqwest::Client::new()
        .get(&url)
        .query(&[("pgt_name", pgt_name)])
        .send()
        .await
        .map_err(transport)?;

    if response.status() != reqwest::StatusCode::OK {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Remote(message));
    }
    let bytes = response.bytes().await.map_err(transport)?;
    Ok(bytes.to_vec())
}

/// Asks the translator to generate a physical graph from the named template,
/// optionally deploying it to the manager from the settings store.
///
/// Mirrors the original page's form submission; a non-success response body
/// is treated as a human-readable error message.
pub async fn generate_pg(
    service_url: &str,
    pgt_name: &str,
    settings: &ManagerSettings,
    deploy: bool,
) -> Result<(), ServiceError> {
    let url = format!("{}{}", service_url, constants::GEN_PG_ENDPOINT);
    if deploy {
        log::debug!("deploy target is {}", settings.manager_url());
    }
    let response = reqwest::Client::new()
        .post(&url)
        .form(&[
            ("pgt_id", pgt_name),
            ("dlg_mgr_host", &settings.host),
            ("dlg_mgr_port", &settings.port),
            ("dlg_mgr_prefix", &settings.prefix),
            ("dlg_mgr_deploy", if deploy { "on" } else { "off" }),
        ])
        .send()
        .await
        .map_err(transport)?;

    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Remote(message));
    }
    Ok(())
}

/// Derives the archive download filename from the template name: everything
/// up to the first occurrence of `.graph`, with `.zip` appended. A name
/// without the suffix gets `.zip` appended whole.
pub fn create_zip_filename(graph_name: &str) -> String {
    match graph_name.find(constants::GRAPH_FILE_SUFFIX) {
        Some(index) => format!("{}.zip", &graph_name[..index]),
        None => format!("{}.zip", graph_name),
    }
}

/// Derives the PNG download filename from the template name.
pub fn png_filename(pgt_name: &str) -> String {
    format!("{}{}", pgt_name, constants::PNG_EXPORT_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_filename_replaces_graph_suffix() {
        assert_eq!(create_zip_filename("workflow.graph"), "workflow.zip");
    }

    #[test]
    fn zip_filename_truncates_at_first_graph_occurrence() {
        assert_eq!(create_zip_filename("a.graph.graph"), "a.zip");
    }

    #[test]
    fn zip_filename_without_suffix_appends_zip() {
        assert_eq!(create_zip_filename("plain"), "plain.zip");
    }

    #[test]
    fn png_filename_appends_template_suffix() {
        assert_eq!(
            png_filename("workflow.graph"),
            "workflow.graph_Template.png"
        );
    }

    #[test]
    fn service_errors_format_like_the_diagnostics_they_feed() {
        let not_found = ServiceError::NotFound("x.graph".to_owned());
        assert_eq!(
            not_found.to_string(),
            "server cannot locate physical graph file x.graph"
        );

        let status = ServiceError::Status {
            status: 500,
            status_text: "Internal Server Error".to_owned(),
        };
        assert_eq!(
            status.to_string(),
            "status: 500, status text: Internal Server Error"
        );
    }
}
