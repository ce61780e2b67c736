//! Root `<svg>` geometry extraction.
//!
//! Sprite assembly needs three things from each source file: the viewBox,
//! the outer size, and the markup between `<svg ...>` and `</svg>`. The
//! root element is located with quick-xml so declarations, doctypes and
//! comments in front of it are skipped correctly.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

/// Root attributes that the sprite element re-creates itself.
const OWNED_ATTRS: [&str; 8] = [
    "xmlns", "version", "id", "width", "height", "viewBox", "x", "y",
];

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("malformed svg: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("no <svg> root element")]
    MissingRoot,

    #[error("unclosed <svg> root element")]
    Unclosed,
}

/// Geometry and payload of one source SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGeometry {
    /// Outer width in user units.
    pub width: f32,
    /// Outer height in user units.
    pub height: f32,
    /// `min-x min-y width height`
    pub view_box: [f32; 4],
    /// Root attributes carried over to the sprite element (fill, stroke, ...).
    pub attributes: Vec<(String, String)>,
    /// Markup between the root tags.
    pub inner: String,
}

impl ShapeGeometry {
    /// `viewBox` attribute value.
    pub fn view_box_attr(&self) -> String {
        let [x, y, w, h] = self.view_box;
        format!("{x} {y} {w} {h}")
    }

    /// Carried-over attributes rendered as ` key="value"` pairs.
    pub fn extra_attrs(&self) -> String {
        self.attributes
            .iter()
            .map(|(k, v)| format!(r#" {k}="{v}""#))
            .collect()
    }
}

/// Parse the root `<svg>` element of `content`.
pub fn parse_shape(content: &str) -> Result<ShapeGeometry, ShapeError> {
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"svg" => {
                let start = reader.buffer_position() as usize;
                let end = content.rfind("</svg>").ok_or(ShapeError::Unclosed)?;
                if end < start {
                    return Err(ShapeError::Unclosed);
                }
                return Ok(from_root(&e, content[start..end].trim().to_string()));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"svg" => {
                return Ok(from_root(&e, String::new()));
            }
            Event::Eof => return Err(ShapeError::MissingRoot),
            _ => {}
        }
    }
}

fn from_root(root: &BytesStart<'_>, inner: String) -> ShapeGeometry {
    let mut width = None;
    let mut height = None;
    let mut view_box = None;
    let mut attributes = Vec::new();

    for attr in root.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match key.as_str() {
            "width" => width = parse_length(&value),
            "height" => height = parse_length(&value),
            "viewBox" => view_box = parse_view_box(&value),
            k if OWNED_ATTRS.contains(&k) || k.starts_with("xmlns:") => {}
            _ => attributes.push((key, value)),
        }
    }

    let view_box = view_box.unwrap_or([0.0, 0.0, width.unwrap_or(0.0), height.unwrap_or(0.0)]);
    ShapeGeometry {
        width: width.unwrap_or(view_box[2]),
        height: height.unwrap_or(view_box[3]),
        view_box,
        attributes,
        inner,
    }
}

/// Parse a length like `24`, `24px` or `1.5`. Percentages are ignored.
fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    value.trim_end_matches("px").trim().parse().ok()
}

fn parse_view_box(value: &str) -> Option<[f32; 4]> {
    let mut parts = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f32>);
    let vb = [
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
    ];
    parts.next().is_none().then_some(vb)
}
