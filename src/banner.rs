//! Banner rendering.
//!
//! Renders the header/footer comment text stamped into build artifacts.
//! Templates use `<%= path %>` placeholders resolved against a render
//! context built from package metadata and the environment/version/commit
//! identifiers. Optional `header.tpl` / `footer.tpl` files in the config
//! directory override the built-in defaults.
//!
//! An unresolvable placeholder is fatal: there is no partial-render
//! fallback, since a half-substituted banner would be stamped into every
//! output file.

use crate::error::{StartupError, StartupResult};
use crate::manifest::PackageMeta;
use regex_lite::Regex;
use serde_json::{Value, json};
use std::path::Path;

/// Built-in header template, used when `config/header.tpl` is absent.
const DEFAULT_HEADER_TPL: &str = r"
/*!
 * APP_HEAD:     <%= pkg.title %>
 * Package:      <%= pkg.name %>@<%= pkg.version %>
 * Built:        <%= pkg.built %>
 * Description:  <%= pkg.description %>
 * Purpose:      <%= env %>
 * Version:      <%= version %>
 * Created:      <<%= pkg.author.email %>>
 * License:      <%= pkg.license %>
 * Visit:        <%= pkg.homepage %>
 */
";

/// Built-in footer template, used when `config/footer.tpl` is absent.
const DEFAULT_FOOTER_TPL: &str = r"
/*!
 * Purpose:  <%= env %>
 * Version:  <%= version %>
 * Built:    <%= pkg.built %>
 * Commit:   <%= commit %>
 * APP_FOOT: <%= pkg.name %>@<%= pkg.version %> - <%= pkg.title %>
 * =========================================================================== *
 */
";

/// The two rendered banner strings, computed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub header: String,
    pub footer: String,
}

impl Banner {
    /// Render header and footer for the given metadata and identifiers.
    ///
    /// Template files are looked up under `config_dir`; built-in defaults
    /// are used for whichever file is absent.
    pub fn render(
        config_dir: &Path,
        pkg: &PackageMeta,
        env: &str,
        version: &str,
        commit: &str,
    ) -> StartupResult<Self> {
        let ctx = render_context(pkg, env, version, commit);

        let header_path = config_dir.join("header.tpl");
        let footer_path = config_dir.join("footer.tpl");

        let (header_tpl, header_origin) = load_template(&header_path, DEFAULT_HEADER_TPL);
        let (footer_tpl, footer_origin) = load_template(&footer_path, DEFAULT_FOOTER_TPL);

        Ok(Self {
            header: render_template(&header_tpl, &ctx, &header_origin)?,
            footer: render_template(&footer_tpl, &ctx, &footer_origin)?,
        })
    }
}

/// Read a template file, or fall back to the built-in default.
/// Returns the template text plus an origin label for error messages.
fn load_template(path: &Path, default: &str) -> (String, String) {
    match std::fs::read_to_string(path) {
        Ok(content) => (content, path.display().to_string()),
        Err(_) => (default.to_string(), "built-in template".to_string()),
    }
}

/// Build the render context from package metadata and identifiers.
fn render_context(pkg: &PackageMeta, env: &str, version: &str, commit: &str) -> Value {
    let m = &pkg.manifest;
    json!({
        "pkg": {
            "name": m.name,
            "version": m.version,
            "title": pkg.title(),
            "description": m.description.as_deref().unwrap_or(""),
            "license": m.license.as_deref().unwrap_or(""),
            "homepage": m.homepage.as_deref().unwrap_or(""),
            "built": pkg.built,
            "author": {
                "name": m.author.as_ref().and_then(|a| a.name()).unwrap_or(""),
                "email": m.author.as_ref().and_then(|a| a.email()).unwrap_or(""),
            },
        },
        "env": env,
        "version": version,
        "commit": commit,
        "year": pkg.year,
    })
}

/// Substitute every `<%= path %>` placeholder in `template` against `ctx`.
///
/// `path` is a dotted lookup (e.g. `pkg.author.email`). Any placeholder
/// that does not resolve to a scalar value fails the whole render.
fn render_template(template: &str, ctx: &Value, origin: &str) -> StartupResult<String> {
    // Pattern is fixed at compile time; construction cannot fail.
    let re = Regex::new(r"<%=\s*([A-Za-z0-9_.]+)\s*%>").unwrap();

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in re.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let path = caps.get(1).unwrap().as_str();

        let value = lookup(ctx, path).ok_or_else(|| StartupError::TemplateRender {
            origin: origin.to_string(),
            placeholder: path.to_string(),
        })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Resolve a dotted path against the render context, stringifying scalars.
fn lookup(ctx: &Value, path: &str) -> Option<String> {
    let mut current = ctx;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
