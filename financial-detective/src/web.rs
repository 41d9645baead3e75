//! Front page rendering and the page's client script.

use handlebars::Handlebars;
use serde::Serialize;

use crate::screener::TICKER_UNIVERSE;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.hbs");

/// Client script served at `/static/app.js`.
pub const APP_JS: &str = include_str!("../static/app.js");

#[derive(Debug, Serialize)]
struct IndexContext {
    title: &'static str,
    version: &'static str,
    tickers: &'static [&'static str],
    ai_enabled: bool,
}

/// Compiled page templates.
pub struct WebPages {
    registry: Handlebars<'static>,
}

impl WebPages {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_template_string("index", INDEX_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Render the front page.
    pub fn render_index(&self, ai_enabled: bool) -> anyhow::Result<String> {
        let context = IndexContext {
            title: "Financial Detective",
            version: env!("CARGO_PKG_VERSION"),
            tickers: &TICKER_UNIVERSE,
            ai_enabled,
        };
        Ok(self.registry.render("index", &context)?)
    }
}
