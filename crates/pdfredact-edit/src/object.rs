//! Page object variants: text, image, path, form.
//!
//! Every object carries an `active` flag and a `version` counter. The
//! counter replaces pointer-identity dirty flags: each committed mutation
//! bumps it, and downstream writers compare versions instead of values.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pdfredact_core::geometry::{Matrix, Point, Rect};

use crate::font::Font;
use crate::holder::Form;
use crate::image::Image;
use crate::path::PathData;

/// One entry of a text-showing sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextItem {
    /// A glyph: character code plus its origin in the text object's local
    /// (pre-text-matrix) space, vertical-origin shift already applied.
    Glyph {
        code: u32,
        origin: Point,
    },
    /// A TJ spacing adjustment in font-unit thousandths; positive values
    /// move the next glyph back along the writing axis.
    Separator(f64),
}

/// A text-showing object.
///
/// `items` is the display list the engine walks; `segments`/`kernings` is
/// the rewritten form installed by [`TextObject::set_segments`]. Stored
/// kernings are *forward* gaps in thousandths — positive widens the gap
/// between two segments — i.e. the negation of the raw TJ number.
#[derive(Debug, Clone)]
pub struct TextObject {
    items: Vec<TextItem>,
    text_matrix: Matrix,
    font: Option<Arc<Font>>,
    font_size: f64,
    char_space: f64,
    word_space: f64,
    segments: Vec<Vec<u8>>,
    kernings: Vec<f64>,
}

impl TextObject {
    pub fn new(font: Option<Arc<Font>>, font_size: f64) -> Self {
        Self {
            items: Vec::new(),
            text_matrix: Matrix::identity(),
            font,
            font_size,
            char_space: 0.0,
            word_space: 0.0,
            segments: Vec::new(),
            kernings: Vec::new(),
        }
    }

    pub fn font(&self) -> Option<Arc<Font>> {
        self.font.clone()
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn char_space(&self) -> f64 {
        self.char_space
    }

    pub fn set_char_space(&mut self, space: f64) {
        self.char_space = space;
    }

    pub fn word_space(&self) -> f64 {
        self.word_space
    }

    pub fn set_word_space(&mut self, space: f64) {
        self.word_space = space;
    }

    pub fn text_matrix(&self) -> Matrix {
        self.text_matrix
    }

    pub fn set_text_matrix(&mut self, matrix: Matrix) {
        self.text_matrix = matrix;
    }

    /// The display-list items in show order.
    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    /// Append a glyph item.
    pub fn push_glyph(&mut self, code: u32, origin: Point) {
        self.items.push(TextItem::Glyph { code, origin });
    }

    /// Append a separator item carrying a raw TJ adjustment (thousandths).
    pub fn push_separator(&mut self, adjustment: f64) {
        self.items.push(TextItem::Separator(adjustment));
    }

    /// The rewritten segment byte strings.
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// The inter-segment forward gaps in thousandths.
    pub fn kernings(&self) -> &[f64] {
        &self.kernings
    }

    /// Install a rewritten `(segments, kernings)` pair and rebuild the
    /// display-list items from it, so that the object's items always
    /// describe its current content.
    ///
    /// Requires `kernings.len() + 1 == segments.len()` and at least one
    /// segment.
    pub fn set_segments(&mut self, segments: Vec<Vec<u8>>, kernings: Vec<f64>) {
        assert!(!segments.is_empty());
        assert_eq!(kernings.len() + 1, segments.len());
        self.segments = segments;
        self.kernings = kernings;
        self.recalc_items();
    }

    /// Rebuild `items` from `segments`/`kernings`, recomputing glyph
    /// origins by the same advance math layout uses: glyph width (or
    /// vertical displacement), word space after a single-byte space, and
    /// char space after every glyph. Kernings advance the pen forward;
    /// the emitted separator carries the raw TJ value, hence the negation.
    fn recalc_items(&mut self) {
        let Some(font) = self.font.clone() else {
            self.items.clear();
            return;
        };
        let vertical = font.is_vertical();
        let mut items = Vec::new();
        let mut pen = 0.0f64;

        for (i, segment) in self.segments.iter().enumerate() {
            for code in font.decode_codes(segment) {
                let origin = if vertical {
                    Point::new(0.0, pen)
                } else {
                    Point::new(pen, 0.0)
                };
                items.push(TextItem::Glyph { code, origin });
                pen += self.advance_user(&font, code);
            }
            if i < self.kernings.len() {
                let kerning = self.kernings[i];
                items.push(TextItem::Separator(-kerning));
                pen += kerning * self.font_size / 1000.0;
            }
        }
        self.items = items;
    }

    /// Advance of one glyph in user units: scaled width plus word space
    /// (single-byte ASCII space only) plus char space.
    fn advance_user(&self, font: &Font, code: u32) -> f64 {
        let scale = self.font_size / 1000.0;
        let mut advance = if font.is_vertical() {
            font.vert_advance(font.cid_from_char_code(code)) * scale
        } else {
            font.char_width(code) * scale
        };
        if code == u32::from(b' ') && (!font.is_cid() || font.char_size(code) == 1) {
            advance += self.word_space;
        }
        advance + self.char_space
    }
}

/// Fill rule for painted paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillRule {
    /// Nonzero winding number rule (default).
    #[default]
    NonZeroWinding,
    /// Even-odd rule.
    EvenOdd,
}

/// A vector path object.
#[derive(Debug, Clone)]
pub struct PathObject {
    path: PathData,
    matrix: Matrix,
    bbox: Rect,
    stroke: bool,
    fill: bool,
    fill_rule: FillRule,
    overlay: bool,
}

impl PathObject {
    pub fn new(path: PathData, matrix: Matrix) -> Self {
        let bbox = path.bounding_box();
        Self {
            path,
            matrix,
            bbox,
            stroke: false,
            fill: false,
            fill_rule: FillRule::default(),
            overlay: false,
        }
    }

    /// Whether this path is an opaque cover appended over a redaction
    /// region. Covers paint on top and are never removal candidates on
    /// later passes.
    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    pub fn set_overlay(&mut self, overlay: bool) {
        self.overlay = overlay;
    }

    pub fn path(&self) -> &PathData {
        &self.path
    }

    pub fn matrix(&self) -> Matrix {
        self.matrix
    }

    pub fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    pub fn stroke(&self) -> bool {
        self.stroke
    }

    pub fn set_stroke(&mut self, stroke: bool) {
        self.stroke = stroke;
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.fill = fill;
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    /// The cached local-space bounding box.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Recompute the cached bounding box from the segments.
    pub fn calc_bounding_box(&mut self) {
        self.bbox = self.path.bounding_box();
    }
}

/// An image placement: unit square mapped into parent space.
#[derive(Debug, Clone)]
pub struct ImageObject {
    image: Rc<RefCell<Image>>,
    matrix: Matrix,
}

impl ImageObject {
    pub fn new(image: Rc<RefCell<Image>>, matrix: Matrix) -> Self {
        Self { image, matrix }
    }

    pub fn image(&self) -> &Rc<RefCell<Image>> {
        &self.image
    }

    pub fn matrix(&self) -> Matrix {
        self.matrix
    }
}

/// A form XObject placement. The inner form may be shared between
/// placements; a missing inner form is skipped by the traversal.
#[derive(Debug, Clone)]
pub struct FormObject {
    form: Option<Rc<RefCell<Form>>>,
    matrix: Matrix,
}

impl FormObject {
    pub fn new(form: Option<Rc<RefCell<Form>>>, matrix: Matrix) -> Self {
        Self { form, matrix }
    }

    pub fn form(&self) -> Option<Rc<RefCell<Form>>> {
        self.form.clone()
    }

    pub fn matrix(&self) -> Matrix {
        self.matrix
    }
}

/// The kind-specific payload of a page object.
#[derive(Debug, Clone)]
pub enum PageObjectKind {
    Text(TextObject),
    Image(ImageObject),
    Path(PathObject),
    Form(FormObject),
    /// Shading, marked content and other kinds redaction leaves untouched.
    Other,
}

/// A page object: one kind plus the holder-facing flags.
#[derive(Debug, Clone)]
pub struct PageObject {
    kind: PageObjectKind,
    active: bool,
    version: u64,
}

impl PageObject {
    pub fn new(kind: PageObjectKind) -> Self {
        Self {
            kind,
            active: true,
            version: 0,
        }
    }

    pub fn kind(&self) -> &PageObjectKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut PageObjectKind {
        &mut self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The change counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record a committed mutation.
    pub fn touch(&mut self) {
        self.version += 1;
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            PageObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathObject> {
        match &self.kind {
            PageObjectKind::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            PageObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }
}
