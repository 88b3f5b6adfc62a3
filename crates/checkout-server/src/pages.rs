//! Server-rendered pages
//!
//! Templates are compiled into the binary and rendered with minijinja.
//! Auto-escaping is on for every `.html` template.

use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::{Environment, Value, context};

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_loader(load_template);
    env
});

fn load_template(name: &str) -> Result<Option<String>, minijinja::Error> {
    let source = match name {
        "base.html" => include_str!("../templates/base.html"),
        "index.html" => include_str!("../templates/index.html"),
        "success.html" => include_str!("../templates/success.html"),
        "cancel.html" => include_str!("../templates/cancel.html"),
        "error.html" => include_str!("../templates/error.html"),
        _ => return Ok(None),
    };
    Ok(Some(source.to_owned()))
}

/// Render a template by name
pub fn render(name: &str, ctx: Value) -> Result<Html<String>, minijinja::Error> {
    TEMPLATES.get_template(name)?.render(ctx).map(Html)
}

/// Error page with the given status. Falls back to plain text if the
/// template itself fails.
pub fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    match render("error.html", context! { title, message, status => status.as_u16() }) {
        Ok(html) => (status, html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            (status, format!("{title}: {message}")).into_response()
        }
    }
}
