//! Response rendering.
//!
//! Two surfaces for the same result: JSON for API/CLI callers, and an HTML
//! page for browser callers. The HTML success page shows only masked
//! commands; the real secret values are embedded solely in the
//! copy-to-clipboard attribute. API error responses carry no internal error
//! text, HTML error pages do; that asymmetry is deliberate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::secrets::CertBundle;

/// Directory the rendered shell commands write artifacts into.
const ARTIFACT_DIR: &str = "~/.credgate";

/// The unit returned to the caller: backend bearer token plus one material
/// set per configured common name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Certs")]
    pub certs: BTreeMap<String, CertMaterial>,
}

/// Transport form of one certificate bundle. The CA chain is newline-joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertMaterial {
    pub ca: String,
    pub cert: String,
    pub key: String,
}

impl GatewayResponse {
    pub fn new(token: String, bundles: BTreeMap<String, CertBundle>) -> Self {
        let certs = bundles
            .into_iter()
            .map(|(name, bundle)| {
                (
                    name,
                    CertMaterial {
                        ca: bundle.ca_chain.join("\n"),
                        cert: bundle.certificate,
                        key: bundle.private_key,
                    },
                )
            })
            .collect();
        Self { token, certs }
    }
}

/// The command listing for the HTML page: real commands for the clipboard,
/// masked commands for display. Both always have the same length and shape.
pub struct CommandSet {
    pub commands: Vec<String>,
    pub masked: Vec<String>,
}

impl CommandSet {
    pub fn build(response: &GatewayResponse) -> Self {
        let mut commands = vec![format!("mkdir -p {}", ARTIFACT_DIR)];
        let mut masked = commands.clone();

        let mut push = |content: &str, file: String| {
            commands.push(format!(r#"echo -e "{}" > {}/{}"#, shell_escape(content), ARTIFACT_DIR, file));
            masked.push(format!(r#"echo -e "*****" > {}/{}"#, ARTIFACT_DIR, file));
        };

        push(&response.token, "token".to_string());
        for (name, material) in &response.certs {
            push(&material.ca, format!("{}.ca", name));
            push(&material.cert, format!("{}.cert", name));
            push(&material.key, format!("{}.key", name));
        }

        Self { commands, masked }
    }
}

/// Escape a value for embedding inside a double-quoted `echo -e` argument.
/// Real newlines become `\n` sequences that `echo -e` expands back.
fn shell_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PAGE_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>credgate</title>
    <link rel="stylesheet" href="https://unpkg.com/bulma@0.9.0/css/bulma.min.css">
    <script src="https://cdn.jsdelivr.net/npm/clipboard@2.0.6/dist/clipboard.min.js"></script>
  </head>
  <body>
    <section class="hero is-info">
      <div class="hero-body"><h1 class="title">credgate</h1></div>
    </section>
"#;

const PAGE_FOOTER: &str = r#"    <script>new ClipboardJS(".copy-value");</script>
  </body>
</html>
"#;

/// Render the success page: masked commands visible, real commands only in
/// the clipboard attribute.
pub fn success_page(set: &CommandSet) -> String {
    let masked_listing = set
        .masked
        .iter()
        .map(|line| format!("$ {}", html_escape(line)))
        .collect::<Vec<_>>()
        .join("\n");
    let clipboard = html_escape(&set.commands.join(";\n"));

    format!(
        r#"{PAGE_HEADER}    <section class="section">
      <div class="container content">
        <h3 class="title is-3">Certificates issued.</h3>
        <p>Execute the following commands.</p>
        <button class="button is-primary is-outlined copy-value mb-5" data-clipboard-text="{clipboard}">
          Copy to clipboard
        </button>
        <pre><code class="language-bash">{masked_listing}</code></pre>
      </div>
    </section>
{PAGE_FOOTER}"#
    )
}

/// Render the error page with status code and error text.
pub fn error_page(status: u16, error: &str) -> String {
    let error = html_escape(error);
    format!(
        r#"{PAGE_HEADER}    <section class="section">
      <div class="container content">
        <h3 class="title is-3">Sorry...</h3>
        <h4 class="title is-4">Status Code: {status}</h4>
        <article class="message"><div class="message-body">{error}</div></article>
      </div>
    </section>
{PAGE_FOOTER}"#
    )
}
