mod block;
mod classify;
mod config;
mod docx;
mod error;
pub mod fonts;
mod inline;
mod metadata;
mod normalize;
mod typst;

pub use block::{Block, BlockKind, Document, InlineSpan};
pub use classify::classify;
pub use config::{Config, CoverConfig, NamingConfig, PageConfig};
pub use error::{ConfigError, RenderError};
pub use metadata::{OutputFormat, ReportMetadata};
pub use normalize::normalize;

use std::fs;
use std::path::{Path, PathBuf};

/// Normalize and classify report markup into a document.
pub fn parse(markup: &str) -> Document {
    Document::parse(markup)
}

/// Convert report markup to the Typst source the paginated renderer compiles.
pub fn markup_to_typst(markup: &str, config: &Config) -> String {
    let fonts = fonts::shared();
    let cover = typst::Cover::new(&config.cover, fonts, None);
    typst::document_to_typst(&parse(markup), &cover, fonts, &config.page)
}

/// Render report markup to a PDF at `metadata.output_path` using the default config.
pub fn render_paginated(markup: &str, metadata: &ReportMetadata) -> Result<PathBuf, RenderError> {
    render_paginated_with_config(markup, metadata, &Config::compiled_default())
}

/// Render report markup to a PDF at `metadata.output_path`.
pub fn render_paginated_with_config(
    markup: &str,
    metadata: &ReportMetadata,
    config: &Config,
) -> Result<PathBuf, RenderError> {
    let document = parse(markup);
    tracing::info!(blocks = document.len(), path = %metadata.output_path.display(), "rendering PDF");

    let pdf = typst::document_to_pdf(&document, config)?;
    write_output(&metadata.output_path, &pdf)
}

/// Render report markup to a DOCX at `metadata.output_path` using the default config.
pub fn render_flow(markup: &str, metadata: &ReportMetadata) -> Result<PathBuf, RenderError> {
    render_flow_with_config(markup, metadata, &Config::compiled_default())
}

/// Render report markup to a DOCX at `metadata.output_path`.
pub fn render_flow_with_config(
    markup: &str,
    metadata: &ReportMetadata,
    config: &Config,
) -> Result<PathBuf, RenderError> {
    let document = parse(markup);
    tracing::info!(blocks = document.len(), path = %metadata.output_path.display(), "rendering DOCX");

    let package = docx::document_to_docx(&document, &config.cover)?;
    write_output(&metadata.output_path, &package)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<PathBuf, RenderError> {
    fs::write(path, bytes).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(path.to_path_buf())
}
