use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use skrifa::instance::{LocationRef, Size};
use skrifa::string::StringId;
use skrifa::{FontRef, MetadataProvider};

/// Family used when no serif font is found on disk; ships with the Typst engine.
pub const FALLBACK_FAMILY: &str = "Libertinus Serif";

const DEFAULT_FAMILY: &str = "Times New Roman";

/// Average advance in em units, used to measure text without a font file.
const FALLBACK_ADVANCE_EM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FaceStyle {
    pub const ALL: [FaceStyle; 4] = [
        FaceStyle::Regular,
        FaceStyle::Bold,
        FaceStyle::Italic,
        FaceStyle::BoldItalic,
    ];

    /// Candidate file names, most common first.
    fn file_names(self) -> &'static [&'static str] {
        match self {
            FaceStyle::Regular => &["times.ttf", "Times_New_Roman.ttf"],
            FaceStyle::Bold => &["timesbd.ttf", "Times_New_Roman_Bold.ttf"],
            FaceStyle::Italic => &["timesi.ttf", "Times_New_Roman_Italic.ttf"],
            FaceStyle::BoldItalic => &["timesbi.ttf", "Times_New_Roman_Bold_Italic.ttf"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontFile {
    pub style: FaceStyle,
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// The serif family the renderers draw with.
#[derive(Debug, Clone)]
pub enum FontSet {
    /// A family found on disk; always contains the regular face.
    Family { name: String, faces: Vec<FontFile> },
    /// No regular face was found: one embedded face, no bold or italic.
    Fallback,
}

impl FontSet {
    /// Look for each face in `search_paths`, in order.
    pub fn discover(search_paths: &[PathBuf]) -> FontSet {
        let faces: Vec<FontFile> = FaceStyle::ALL
            .iter()
            .filter_map(|&style| find_face(style, search_paths))
            .collect();

        let Some(regular) = faces.iter().find(|f| f.style == FaceStyle::Regular) else {
            tracing::warn!(
                fallback = FALLBACK_FAMILY,
                "serif regular face not found, bold and italic will render as regular text"
            );
            return FontSet::Fallback;
        };

        let name = family_name(&regular.data).unwrap_or_else(|| DEFAULT_FAMILY.to_string());
        for face in &faces {
            tracing::info!(family = %name, style = ?face.style, path = %face.path.display(), "font loaded");
        }
        FontSet::Family { name, faces }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FontSet::Fallback)
    }

    pub fn family_name(&self) -> &str {
        match self {
            FontSet::Family { name, .. } => name,
            FontSet::Fallback => FALLBACK_FAMILY,
        }
    }

    pub fn face(&self, style: FaceStyle) -> Option<&FontFile> {
        match self {
            FontSet::Family { faces, .. } => faces.iter().find(|f| f.style == style),
            FontSet::Fallback => None,
        }
    }

    pub fn faces(&self) -> &[FontFile] {
        match self {
            FontSet::Family { faces, .. } => faces,
            FontSet::Fallback => &[],
        }
    }

    /// Width of `text` in points at `size`, using the bold face when asked and available.
    pub fn measure(&self, text: &str, size: f32, bold: bool) -> f32 {
        let face = if bold {
            self.face(FaceStyle::Bold)
                .or_else(|| self.face(FaceStyle::Regular))
        } else {
            self.face(FaceStyle::Regular)
        };
        face.and_then(|f| advance_width(&f.data, text, size))
            .unwrap_or_else(|| estimate_width(text, size))
    }
}

/// Well-known places to look for the serif family.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("fonts")];
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join("fonts"));
    }
    paths.extend(
        [
            "/usr/share/fonts/truetype/msttcorefonts",
            "/usr/share/fonts/TTF",
            r"C:\Windows\Fonts",
        ]
        .map(PathBuf::from),
    );
    paths
}

/// Process-wide font set, discovered on first use.
pub fn shared() -> &'static FontSet {
    static FONTS: OnceLock<FontSet> = OnceLock::new();
    FONTS.get_or_init(|| FontSet::discover(&default_search_paths()))
}

/// Shrink the font size one point at a time until `text` fits in `max_width`.
pub fn fit_font_size(
    text: &str,
    max_size: u32,
    min_size: u32,
    max_width: f32,
    measure: impl Fn(&str, f32) -> f32,
) -> u32 {
    let mut size = max_size.max(min_size);
    while size > min_size && measure(text, size as f32) > max_width {
        size -= 1;
    }
    size
}

fn find_face(style: FaceStyle, search_paths: &[PathBuf]) -> Option<FontFile> {
    for dir in search_paths {
        for name in style.file_names() {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            match fs::read(&path) {
                Ok(data) => return Some(FontFile { style, path, data }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable font file"),
            }
        }
    }
    None
}

fn family_name(data: &[u8]) -> Option<String> {
    let font = FontRef::new(data).ok()?;
    [StringId::TYPOGRAPHIC_FAMILY_NAME, StringId::FAMILY_NAME]
        .into_iter()
        .find_map(|id| font.localized_strings(id).english_or_first())
        .map(|name| name.chars().collect::<String>())
        .filter(|name| !name.trim().is_empty())
}

fn advance_width(data: &[u8], text: &str, size: f32) -> Option<f32> {
    let font = FontRef::new(data).ok()?;
    let charmap = font.charmap();
    let metrics = font.glyph_metrics(Size::new(size), LocationRef::default());
    let width = text
        .chars()
        .map(|c| {
            charmap
                .map(c)
                .and_then(|gid| metrics.advance_width(gid))
                .unwrap_or(size * FALLBACK_ADVANCE_EM)
        })
        .sum();
    Some(width)
}

fn estimate_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * FALLBACK_ADVANCE_EM
}
