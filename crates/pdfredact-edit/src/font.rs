//! Font capability set consumed by the redaction engine.
//!
//! A [`Font`] answers the per-code questions redaction needs: glyph bounds
//! in integer font units, horizontal advance in thousandths, the per-font
//! vertical-writing flag, vertical advances for CIDs, encoded byte length
//! of a code, and how to append a code to a segment byte string.
//!
//! Glyph-program parsing is a collaborator, not part of this crate: per-code
//! bounds come from an explicit table populated by the caller, with the
//! `/FontBBox` as the fallback. Width information can be filled in
//! programmatically or extracted from a lopdf font dictionary with
//! [`Font::from_dict`].

use std::collections::HashMap;

use crate::error::EditError;

/// Default simple-font width when `/Widths` and `/MissingWidth` are absent
/// (600/1000 of text space).
const DEFAULT_WIDTH: f64 = 600.0;

/// Default ascent when not specified (750/1000 of text space).
const DEFAULT_ASCENT: f64 = 750.0;

/// Default descent when not specified (-250/1000 of text space).
const DEFAULT_DESCENT: f64 = -250.0;

/// Default CID font width when `/DW` is not specified (one em).
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Default CID vertical displacement when `/DW2` is not specified
/// (the second element of the `/DW2` default `[880 -1000]`).
const DEFAULT_CID_VERT_ADVANCE: f64 = -1000.0;

/// Default CID ascent/descent when no descriptor is present.
const DEFAULT_CID_ASCENT: f64 = 880.0;
const DEFAULT_CID_DESCENT: f64 = -120.0;

/// A glyph bounding box in integer font units (1000 units per em).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphBounds {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

impl GlyphBounds {
    pub fn new(left: i32, bottom: i32, right: i32, top: i32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
}

/// Width table of a simple (single-byte) font: `/Widths` indexed from
/// `/FirstChar`, with `/MissingWidth` outside the range.
#[derive(Debug, Clone)]
struct SimpleMetrics {
    widths: Vec<f64>,
    first_char: u32,
    missing_width: f64,
}

impl SimpleMetrics {
    fn width(&self, code: u32) -> f64 {
        if code >= self.first_char {
            let index = (code - self.first_char) as usize;
            if index < self.widths.len() {
                return self.widths[index];
            }
        }
        self.missing_width
    }
}

/// Width tables of a CID (composite) font: `/W`//`/DW` horizontal widths
/// and `/W2`//`/DW2` vertical displacements, plus the writing mode and the
/// encoded byte length of a character code.
#[derive(Debug, Clone)]
struct CidMetrics {
    widths: HashMap<u32, f64>,
    default_width: f64,
    vert_advances: HashMap<u32, f64>,
    default_vert_advance: f64,
    vertical: bool,
    code_bytes: usize,
}

#[derive(Debug, Clone)]
enum FontKind {
    Simple(SimpleMetrics),
    Cid(CidMetrics),
}

/// The font capability set.
#[derive(Debug, Clone)]
pub struct Font {
    name: String,
    kind: FontKind,
    glyph_bounds: HashMap<u32, GlyphBounds>,
    font_bounds: GlyphBounds,
}

impl Font {
    /// Create a simple single-byte font with a `/Widths`-style table.
    pub fn simple(name: &str, first_char: u32, widths: Vec<f64>, missing_width: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: FontKind::Simple(SimpleMetrics {
                widths,
                first_char,
                missing_width,
            }),
            glyph_bounds: HashMap::new(),
            font_bounds: GlyphBounds::new(0, DEFAULT_DESCENT as i32, 1000, DEFAULT_ASCENT as i32),
        }
    }

    /// Create a CID font with a default width and writing mode. Character
    /// codes are encoded as big-endian byte pairs (Identity-style CMaps).
    pub fn cid(name: &str, default_width: f64, vertical: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: FontKind::Cid(CidMetrics {
                widths: HashMap::new(),
                default_width,
                vert_advances: HashMap::new(),
                default_vert_advance: DEFAULT_CID_VERT_ADVANCE,
                vertical,
                code_bytes: 2,
            }),
            glyph_bounds: HashMap::new(),
            font_bounds: GlyphBounds::new(
                0,
                DEFAULT_CID_DESCENT as i32,
                1000,
                DEFAULT_CID_ASCENT as i32,
            ),
        }
    }

    /// Set the fallback font bounding box (font units).
    pub fn with_font_bounds(mut self, bounds: GlyphBounds) -> Self {
        self.font_bounds = bounds;
        self
    }

    /// Record the bounding box of one glyph (font units).
    pub fn with_glyph_bounds(mut self, code: u32, bounds: GlyphBounds) -> Self {
        self.glyph_bounds.insert(code, bounds);
        self
    }

    /// Override a CID width (no-op on simple fonts).
    pub fn with_cid_width(mut self, cid: u32, width: f64) -> Self {
        if let FontKind::Cid(cid_metrics) = &mut self.kind {
            cid_metrics.widths.insert(cid, width);
        }
        self
    }

    /// Override a CID vertical displacement (no-op on simple fonts).
    pub fn with_vert_advance(mut self, cid: u32, advance: f64) -> Self {
        if let FontKind::Cid(cid_metrics) = &mut self.kind {
            cid_metrics.vert_advances.insert(cid, advance);
        }
        self
    }

    /// Override the encoded byte length of CID character codes.
    pub fn with_code_bytes(mut self, code_bytes: usize) -> Self {
        if let FontKind::Cid(cid_metrics) = &mut self.kind {
            cid_metrics.code_bytes = code_bytes;
        }
        self
    }

    /// The font's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a CID (composite) font.
    pub fn is_cid(&self) -> bool {
        matches!(self.kind, FontKind::Cid(_))
    }

    /// Whether the font writes vertically. Always false for simple fonts.
    pub fn is_vertical(&self) -> bool {
        match &self.kind {
            FontKind::Simple(_) => false,
            FontKind::Cid(cid) => cid.vertical,
        }
    }

    /// Map a character code to a CID. Identity for the CMaps this model
    /// carries; simple fonts return the code unchanged.
    pub fn cid_from_char_code(&self, code: u32) -> u32 {
        code
    }

    /// Horizontal advance of a code in font-unit thousandths.
    pub fn char_width(&self, code: u32) -> f64 {
        match &self.kind {
            FontKind::Simple(simple) => simple.width(code),
            FontKind::Cid(cid) => cid
                .widths
                .get(&self.cid_from_char_code(code))
                .copied()
                .unwrap_or(cid.default_width),
        }
    }

    /// Vertical displacement of a CID in thousandths (negative for the
    /// usual downward writing direction).
    pub fn vert_advance(&self, cid: u32) -> f64 {
        match &self.kind {
            FontKind::Simple(_) => 0.0,
            FontKind::Cid(metrics) => metrics
                .vert_advances
                .get(&cid)
                .copied()
                .unwrap_or(metrics.default_vert_advance),
        }
    }

    /// Glyph bounding box of a code in font units, falling back to the
    /// font bounding box when the glyph has no recorded bounds.
    pub fn char_bounds(&self, code: u32) -> GlyphBounds {
        self.glyph_bounds
            .get(&code)
            .copied()
            .unwrap_or(self.font_bounds)
    }

    /// Encoded byte length of a character code.
    pub fn char_size(&self, _code: u32) -> usize {
        match &self.kind {
            FontKind::Simple(_) => 1,
            FontKind::Cid(cid) => cid.code_bytes,
        }
    }

    /// Append a character code to a segment byte string in the font's
    /// encoding: one byte for simple fonts and single-byte CID codes,
    /// big-endian pairs otherwise.
    pub fn append_char(&self, buf: &mut Vec<u8>, code: u32) {
        match self.char_size(code) {
            1 => buf.push(code as u8),
            _ => buf.extend_from_slice(&(code as u16).to_be_bytes()),
        }
    }

    /// Decode a segment byte string back into character codes.
    pub fn decode_codes(&self, bytes: &[u8]) -> Vec<u32> {
        match self.char_size(0) {
            1 => bytes.iter().map(|&b| u32::from(b)).collect(),
            _ => bytes
                .chunks_exact(2)
                .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
                .collect(),
        }
    }

    /// Extract a [`Font`] from a lopdf font dictionary.
    ///
    /// Simple fonts read `/Widths`, `/FirstChar`, and the `/FontDescriptor`
    /// (`/MissingWidth`, `/FontBBox`, `/Ascent`, `/Descent`). Type0 fonts
    /// read the descendant CIDFont's `/W`, `/DW`, `/W2`, `/DW2`, and
    /// descriptor; a `-V` `/Encoding` name selects vertical writing.
    pub fn from_dict(
        doc: &lopdf::Document,
        font_dict: &lopdf::Dictionary,
    ) -> Result<Font, EditError> {
        let name = font_dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name_str().ok())
            .unwrap_or("")
            .to_string();

        let subtype = font_dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name_str().ok())
            .unwrap_or("");

        if subtype == "Type0" {
            return Self::from_type0_dict(doc, font_dict, name);
        }

        let first_char = font_dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| object_to_f64(resolve_object(doc, o)))
            .map(|v| v as u32)
            .unwrap_or(0);

        let widths = match font_dict.get(b"Widths") {
            Ok(obj) => {
                let obj = resolve_object(doc, obj);
                match obj.as_array() {
                    Ok(arr) => arr
                        .iter()
                        .map(|o| object_to_f64(resolve_object(doc, o)).unwrap_or(0.0))
                        .collect(),
                    Err(_) => Vec::new(),
                }
            }
            Err(_) => Vec::new(),
        };

        let desc = font_descriptor(doc, font_dict);
        let missing_width = desc
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(object_to_f64)
            .unwrap_or(DEFAULT_WIDTH);
        let bounds = descriptor_bounds(doc, desc, DEFAULT_ASCENT, DEFAULT_DESCENT);

        Ok(Font::simple(&name, first_char, widths, missing_width).with_font_bounds(bounds))
    }

    fn from_type0_dict(
        doc: &lopdf::Document,
        font_dict: &lopdf::Dictionary,
        name: String,
    ) -> Result<Font, EditError> {
        let descendant = font_dict
            .get(b"DescendantFonts")
            .ok()
            .map(|o| resolve_object(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.first())
            .map(|o| resolve_object(doc, o))
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| EditError::Font(format!("Type0 font {name:?} has no descendant")))?;

        let vertical = font_dict
            .get(b"Encoding")
            .ok()
            .and_then(|o| o.as_name_str().ok())
            .is_some_and(|enc| enc.ends_with("-V"));

        let default_width = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| object_to_f64(resolve_object(doc, o)))
            .unwrap_or(DEFAULT_CID_WIDTH);

        let widths = descendant
            .get(b"W")
            .ok()
            .map(|o| resolve_object(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| parse_w_array(arr, doc))
            .unwrap_or_default();

        let default_vert_advance = descendant
            .get(b"DW2")
            .ok()
            .map(|o| resolve_object(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.get(1))
            .and_then(|o| object_to_f64(resolve_object(doc, o)))
            .unwrap_or(DEFAULT_CID_VERT_ADVANCE);

        let vert_advances = descendant
            .get(b"W2")
            .ok()
            .map(|o| resolve_object(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| parse_w2_array(arr, doc))
            .unwrap_or_default();

        let desc = font_descriptor(doc, descendant);
        let bounds = descriptor_bounds(doc, desc, DEFAULT_CID_ASCENT, DEFAULT_CID_DESCENT);

        let mut font = Font::cid(&name, default_width, vertical).with_font_bounds(bounds);
        if let FontKind::Cid(cid) = &mut font.kind {
            cid.widths = widths;
            cid.vert_advances = vert_advances;
            cid.default_vert_advance = default_vert_advance;
        }
        Ok(font)
    }
}

/// Parse a `/W` (width) array: `[ c [w1 w2 ...] c_first c_last w ... ]`.
fn parse_w_array(objects: &[lopdf::Object], doc: &lopdf::Document) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;

    while i < objects.len() {
        let Some(cid_start) = object_to_u32(resolve_object(doc, &objects[i])) else {
            i += 1;
            continue;
        };
        i += 1;
        if i >= objects.len() {
            break;
        }

        let next = resolve_object(doc, &objects[i]);
        if let Ok(arr) = next.as_array() {
            // Format: CID [w1 w2 w3 ...]
            for (j, obj) in arr.iter().enumerate() {
                if let Some(w) = object_to_f64(resolve_object(doc, obj)) {
                    widths.insert(cid_start + j as u32, w);
                }
            }
            i += 1;
        } else if let Some(cid_end) = object_to_u32(next) {
            // Format: CID_start CID_end w
            i += 1;
            if i < objects.len() {
                if let Some(w) = object_to_f64(resolve_object(doc, &objects[i])) {
                    for cid in cid_start..=cid_end {
                        widths.insert(cid, w);
                    }
                }
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    widths
}

/// Parse a `/W2` array, keeping only the vertical displacement `w1y` of
/// each `(w1y, v1x, v1y)` triplet:
/// `[ c [w1y v1x v1y ...] c_first c_last w1y v1x v1y ... ]`.
fn parse_w2_array(objects: &[lopdf::Object], doc: &lopdf::Document) -> HashMap<u32, f64> {
    let mut advances = HashMap::new();
    let mut i = 0;

    while i < objects.len() {
        let Some(cid_start) = object_to_u32(resolve_object(doc, &objects[i])) else {
            i += 1;
            continue;
        };
        i += 1;
        if i >= objects.len() {
            break;
        }

        let next = resolve_object(doc, &objects[i]);
        if let Ok(arr) = next.as_array() {
            for (j, chunk) in arr.chunks(3).enumerate() {
                if let Some(w1y) = chunk
                    .first()
                    .and_then(|o| object_to_f64(resolve_object(doc, o)))
                {
                    advances.insert(cid_start + j as u32, w1y);
                }
            }
            i += 1;
        } else if let Some(cid_end) = object_to_u32(next) {
            i += 1;
            if i < objects.len() {
                if let Some(w1y) = object_to_f64(resolve_object(doc, &objects[i])) {
                    for cid in cid_start..=cid_end {
                        advances.insert(cid, w1y);
                    }
                }
                i += 3; // skip v1x and v1y as well
            }
        } else {
            i += 1;
        }
    }

    advances
}

/// Look up the (possibly indirect) `/FontDescriptor` of a font dictionary.
fn font_descriptor<'a>(
    doc: &'a lopdf::Document,
    font_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    font_dict
        .get(b"FontDescriptor")
        .ok()
        .map(|o| resolve_object(doc, o))
        .and_then(|o| o.as_dict().ok())
}

/// Build the fallback glyph bounds from `/FontBBox`, or from ascent and
/// descent when no box is present.
fn descriptor_bounds(
    doc: &lopdf::Document,
    desc: Option<&lopdf::Dictionary>,
    default_ascent: f64,
    default_descent: f64,
) -> GlyphBounds {
    let bbox = desc
        .and_then(|d| d.get(b"FontBBox").ok())
        .map(|o| resolve_object(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| {
            let vals: Vec<f64> = arr
                .iter()
                .filter_map(|o| object_to_f64(resolve_object(doc, o)))
                .collect();
            (vals.len() == 4).then(|| [vals[0], vals[1], vals[2], vals[3]])
        });

    if let Some([left, bottom, right, top]) = bbox {
        return GlyphBounds::new(left as i32, bottom as i32, right as i32, top as i32);
    }

    let ascent = desc
        .and_then(|d| d.get(b"Ascent").ok())
        .and_then(object_to_f64)
        .unwrap_or(default_ascent);
    let descent = desc
        .and_then(|d| d.get(b"Descent").ok())
        .and_then(object_to_f64)
        .unwrap_or(default_descent);
    GlyphBounds::new(0, descent as i32, 1000, ascent as i32)
}

/// Resolve an indirect reference to the actual object.
fn resolve_object<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf object to f64, returning None if not a number.
fn object_to_f64(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Convert a lopdf object to u32, returning None if not a number.
fn object_to_u32(obj: &lopdf::Object) -> Option<u32> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as u32),
        lopdf::Object::Real(f) => Some(*f as u32),
        _ => None,
    }
}
