//! Client bootstrap script.
//!
//! The browser launcher injects this script into the inspected page. It
//! publishes the client configuration and fires an init event the bundled
//! client listens for.
//!
//! # Connection Flow
//!
//! 1. Host binds its transport and builds the script with `ws_url()`
//! 2. Launcher injects the script (or loads the data URI)
//! 3. Script stores the config on `window.__INSPECTOR_LINK__`
//! 4. Client reads the config and dials the host

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::identifiers::SessionId;

// ============================================================================
// Public Functions
// ============================================================================

/// Builds the script the launcher injects.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if the options cannot be serialized.
pub fn build_injection_script(
    ws_url: &str,
    session_id: &SessionId,
    options: &ClientOptions,
) -> Result<String> {
    let config = build_config_json(ws_url, session_id, options)?;
    Ok(INJECTION_TEMPLATE.replace("$CONFIG_JSON", &config))
}

/// Builds the script as a `data:text/javascript,` URI.
///
/// # Errors
///
/// Same as [`build_injection_script`].
pub fn build_injection_data_uri(
    ws_url: &str,
    session_id: &SessionId,
    options: &ClientOptions,
) -> Result<String> {
    let script = build_injection_script(ws_url, session_id, options)?;
    Ok(format!(
        "data:text/javascript,{}",
        urlencoding::encode(&script)
    ))
}

// ============================================================================
// Internal Functions
// ============================================================================

fn build_config_json(
    ws_url: &str,
    session_id: &SessionId,
    options: &ClientOptions,
) -> Result<String> {
    let config = json!({
        "type": "INSPECTOR_LINK_INIT",
        "wsUrl": ws_url,
        "sessionId": session_id.to_string(),
        "options": serde_json::to_value(options)?,
    });
    Ok(config.to_string())
}

// ============================================================================
// Constants
// ============================================================================

/// Idempotent: a second injection into the same page is ignored.
const INJECTION_TEMPLATE: &str = r#"(function () {
  if (window.__INSPECTOR_LINK__) { return; }
  var config = $CONFIG_JSON;
  window.__INSPECTOR_LINK__ = { config: config };
  window.dispatchEvent(new CustomEvent("inspector-link:init", { detail: config }));
})();
"#;

// ============================================================================
// Tests
// ============================================================================
