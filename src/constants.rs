//! Shared application-wide constants.
//! Centralizes storage keys, service endpoints and canvas metrics.

// Durable storage keys for the manager connection settings.
/// Storage key holding the manager host name.
pub const STORAGE_KEY_HOST: &str = "manager_host";
/// Storage key holding the manager port.
pub const STORAGE_KEY_PORT: &str = "manager_port";
/// Storage key holding the manager URL path prefix.
pub const STORAGE_KEY_PREFIX: &str = "manager_prefix";

// Defaults used when a settings key has never been saved.
/// Default manager host.
pub const DEFAULT_MANAGER_HOST: &str = "localhost";
/// Default manager port.
pub const DEFAULT_MANAGER_PORT: &str = "8001";
/// Default manager URL path prefix (empty: mounted at the root).
pub const DEFAULT_MANAGER_PREFIX: &str = "";

// Graph service endpoints, relative to the service base URL.
/// Endpoint returning the JSON body of a named physical graph template.
pub const PGT_JSON_ENDPOINT: &str = "/pgt_jsonbody";
/// Endpoint returning a packaged CWL zip archive for a named template.
pub const PGT_CWL_ENDPOINT: &str = "/pgt_cwl";
/// Endpoint that generates (and optionally deploys) a physical graph.
pub const GEN_PG_ENDPOINT: &str = "/gen_pg";

/// Environment variable overriding the service base URL on native builds.
pub const SERVICE_URL_ENV: &str = "PGT_SERVICE_URL";
/// Fallback service base URL (the translator's stock port) on native builds.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8084";

/// Recognized file suffix of physical graph template names.
pub const GRAPH_FILE_SUFFIX: &str = ".graph";
/// Suffix appended to the template name for PNG exports.
pub const PNG_EXPORT_SUFFIX: &str = "_Template.png";

// Canvas metrics
/// Drop node width in world units.
pub const NODE_WIDTH: f32 = 110.0;
/// Drop node height in world units.
pub const NODE_HEIGHT: f32 = 48.0;
/// Corner radius for drop node rectangles (in screen pixels after transform).
pub const NODE_CORNER_RADIUS: f32 = 6.0;
/// Margin (in world units) added around the template bounds when exporting or fitting.
pub const CONTENT_MARGIN: f32 = 24.0;
/// Spacing between grid dots (in world units).
pub const DOT_SPACING: f32 = 24.0;
/// Radius of grid dots (in screen pixels).
pub const DOT_RADIUS: f32 = 1.5;
