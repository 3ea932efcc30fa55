use std::path::PathBuf;

/// The two output back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Paginated PDF
    Paginated,
    /// Flow DOCX
    Flow,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Paginated => "pdf",
            OutputFormat::Flow => "docx",
        }
    }
}

/// Per-call render parameters. The names are only used for file naming;
/// they never appear inside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub names: Vec<String>,
    pub output_path: PathBuf,
}

impl ReportMetadata {
    pub fn new(names: Vec<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            names,
            output_path: output_path.into(),
        }
    }

    /// File name to show the recipient, e.g. `Совместимость_Иван_Мария.pdf`.
    pub fn delivery_file_name(&self, prefix: &str, format: OutputFormat) -> String {
        let mut stem = sanitize(prefix);
        for name in &self.names {
            let name = sanitize(name.trim());
            if !name.is_empty() {
                stem.push('_');
                stem.push_str(&name);
            }
        }
        format!("{stem}.{}", format.extension())
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
