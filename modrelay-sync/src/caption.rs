//! Broadcast caption rendering.
//!
//! Captions are Telegram-flavoured HTML rendered through Tera. The built-in
//! template is embedded at compile time; a user template file replaces it
//! when `RunConfig::caption_template` is set. Template variables:
//! `title`, `file_name`, `date`, `source_url`.

use std::path::Path;

use tera::{Context, Tera};

use modrelay_core::ManifestEntry;

use crate::error::{io_err, SyncError};

const TEMPLATE_NAME: &str = "caption.html";
const BUILTIN_TEMPLATE: &str = include_str!("templates/caption.html.tera");

/// Renders captions for uploaded artifacts.
pub struct CaptionRenderer {
    tera: Tera,
}

impl CaptionRenderer {
    /// Renderer with the built-in template.
    pub fn new() -> Result<Self, SyncError> {
        Self::from_source(BUILTIN_TEMPLATE)
    }

    /// Renderer from an optional template file, falling back to the built-in.
    pub fn from_file(path: Option<&Path>) -> Result<Self, SyncError> {
        match path {
            Some(p) => {
                let source = std::fs::read_to_string(p).map_err(|e| io_err(p, e))?;
                Self::from_source(&source)
            }
            None => Self::new(),
        }
    }

    fn from_source(source: &str) -> Result<Self, SyncError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        tera.set_escape_fn(escape_telegram_html);
        Ok(Self { tera })
    }

    /// Caption for `entry`. `description` is the catalog's human-readable
    /// name; the file name is used when there is none.
    pub fn render(
        &self,
        description: Option<&str>,
        entry: &ManifestEntry,
    ) -> Result<String, SyncError> {
        let mut ctx = Context::new();
        ctx.insert("title", description.unwrap_or(entry.file_name.as_str()));
        ctx.insert("file_name", &entry.file_name);
        ctx.insert("date", &entry.date);
        ctx.insert("source_url", &entry.source_url);
        Ok(self.tera.render(TEMPLATE_NAME, &ctx)?.trim_end().to_string())
    }
}

/// Telegram's HTML mode only understands these four entities.
fn escape_telegram_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
