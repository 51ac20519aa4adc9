//! Rectangle redaction over a page's object list.
//!
//! Given one or more normalized page-space rectangles, the engine rewrites
//! text-showing sequences so glyphs inside a rectangle disappear while the
//! survivors keep their page-space origins, overwrites image samples under
//! the rectangles, removes fully covered vector paths, and recurses into
//! form XObjects. Optionally it appends opaque covers over the rectangles
//! as the last-painted objects.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use lopdf::{Document, Object, Stream, dictionary};
use pdfredact_core::geometry::{Matrix, Point, Rect, intersects_any};
use pdfredact_core::raster::{pixel_boxes, rects_to_image_grid, redact_bitmap};

use crate::font::Font;
use crate::holder::{Form, Page, PageObjectHolder};
use crate::image::stream_bytes;
use crate::object::{
    FillRule, ImageObject, PageObject, PageObjectKind, PathObject, TextItem, TextObject,
};
use crate::path::PathData;

/// Options for one redaction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactOptions {
    /// Descend into form XObject placements.
    pub recurse_forms: bool,
    /// Append an opaque black cover over each rectangle, painted last.
    /// Also selects black (instead of white) as the image fill value.
    pub draw_black_boxes: bool,
}

/// Outcome of rewriting one text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactOutcome {
    /// Nothing inside the rectangles; the object was left alone.
    Unchanged,
    /// Some glyphs were removed and the survivors reinstalled.
    Modified,
    /// Every glyph was removed; the object should leave the holder.
    RemovedAll,
}

/// Kernings smaller than this many thousandths collapse to zero; absorbs
/// float fuzz when synthesizing TJ values from glyph origins.
const KERNING_DEADBAND: f64 = 0.25;

/// Round to the nearest integer thousandth, halves away from zero.
fn round_thousandths(value: f64) -> i64 {
    if value >= 0.0 {
        (value + 0.5) as i64
    } else {
        (value - 0.5) as i64
    }
}

/// A glyph's bbox in page user space: font-unit bounds scaled by
/// `font_size / 1000`, translated to the item origin, then through the
/// text matrix and the accumulated parent transform.
fn glyph_bbox_in_page(
    text: &TextObject,
    font: &Font,
    code: u32,
    origin: Point,
    parent_to_page: &Matrix,
) -> Rect {
    let bounds = font.char_bounds(code);
    let scale = text.font_size() / 1000.0;
    let glyph = Rect::new(
        f64::from(bounds.left) * scale,
        f64::from(bounds.bottom) * scale,
        f64::from(bounds.right) * scale,
        f64::from(bounds.top) * scale,
    )
    .translate(origin.x, origin.y);
    let placed = text.text_matrix().transform_rect(glyph);
    parent_to_page.transform_rect(placed)
}

/// Advance of one code in font-unit thousandths: the vertical displacement
/// for vertical-writing CID fonts, else the horizontal width; plus word
/// space for a single-byte ASCII space and char space for every glyph.
fn advance_thousandths(text: &TextObject, font: &Font, code: u32) -> f64 {
    let mut advance = if font.is_vertical() {
        font.vert_advance(font.cid_from_char_code(code))
    } else {
        font.char_width(code)
    };

    let font_size = text.font_size();
    if code == u32::from(b' ') && (!font.is_cid() || font.char_size(code) == 1) {
        advance += text.word_space() * 1000.0 / font_size;
    }
    advance + text.char_space() * 1000.0 / font_size
}

/// State for building the rewritten `(segments, kernings)` pair.
struct SegmentBuilder {
    segments: Vec<Vec<u8>>,
    kernings: Vec<f64>,
    /// Accumulates raw TJ numbers and removal advances between kept runs.
    kerning_accumulator: f64,
    has_explicit_kerning: bool,
    /// For synthesizing kerning from origins when no explicit TJ exists.
    prev_origin: Point,
    prev_code: u32,
}

impl SegmentBuilder {
    fn new() -> Self {
        Self {
            segments: vec![Vec::new()],
            kernings: Vec::new(),
            kerning_accumulator: 0.0,
            has_explicit_kerning: false,
            prev_origin: Point::default(),
            prev_code: 0,
        }
    }

    /// Push a forward-gap kerning (integer thousandths) and open a new,
    /// initially empty run. Sub-deadband and zero kernings are dropped and
    /// the current run stays open.
    fn flush_kerning(&mut self, kerning: f64) {
        let damped = if kerning.abs() < KERNING_DEADBAND {
            0.0
        } else {
            kerning
        };
        let rounded = round_thousandths(damped);
        if rounded != 0 {
            self.kernings.push(rounded as f64);
            self.segments.push(Vec::new());
        }
    }

    fn append_kept(&mut self, font: &Font, code: u32, origin: Point) {
        if let Some(run) = self.segments.last_mut() {
            font.append_char(run, code);
        }
        self.prev_origin = origin;
        self.prev_code = code;
        self.kerning_accumulator = 0.0;
        self.has_explicit_kerning = false;
    }
}

/// Rewrite one text object against the redaction rectangles.
///
/// Kept glyphs keep their page-space origins: removed advance folds into
/// the next inter-run kerning, and spacing before the first kept glyph
/// folds into the text matrix (a TJ array cannot lead with a number).
pub fn redact_text_object(
    text: &mut TextObject,
    page_rects: &[Rect],
    parent_to_page: &Matrix,
) -> RedactOutcome {
    let Some(font) = text.font() else {
        return RedactOutcome::Unchanged;
    };
    let is_vertical = font.is_vertical();
    let font_size = text.font_size();

    let mut any_kept = false;
    let mut any_removed = false;
    let mut builder = SegmentBuilder::new();

    let items: Vec<TextItem> = text.items().to_vec();
    for item in items {
        match item {
            TextItem::Separator(adjustment) => {
                builder.kerning_accumulator += adjustment;
                builder.has_explicit_kerning = true;
            }
            TextItem::Glyph { code, origin } => {
                let glyph_box = glyph_bbox_in_page(text, &font, code, origin, parent_to_page);
                if intersects_any(&glyph_box, page_rects) {
                    builder.kerning_accumulator -= advance_thousandths(text, &font, code);
                    any_removed = true;
                    continue;
                }

                if !any_kept {
                    let leading_user = if builder.kerning_accumulator != 0.0 {
                        let leading = -builder.kerning_accumulator * font_size / 1000.0;
                        builder.kerning_accumulator = 0.0;
                        builder.has_explicit_kerning = false;
                        leading
                    } else if is_vertical {
                        // No pending spacing: align the run start to the
                        // first kept glyph so segment origins stay at zero.
                        origin.y
                    } else {
                        origin.x
                    };
                    if leading_user != 0.0 {
                        let mut tm = text.text_matrix();
                        if is_vertical {
                            tm.e += leading_user * tm.c;
                            tm.f += leading_user * tm.d;
                        } else {
                            tm.e += leading_user * tm.a;
                            tm.f += leading_user * tm.b;
                        }
                        text.set_text_matrix(tm);
                    }
                } else if builder.has_explicit_kerning {
                    let kerning = -builder.kerning_accumulator;
                    builder.flush_kerning(kerning);
                } else {
                    // Infer the gap from the origins of consecutive kept
                    // glyphs along the writing axis.
                    let delta_user = if is_vertical {
                        origin.y - builder.prev_origin.y
                    } else {
                        origin.x - builder.prev_origin.x
                    };
                    let delta_th = delta_user * 1000.0 / font_size;
                    let kerning = delta_th - advance_thousandths(text, &font, builder.prev_code);
                    builder.flush_kerning(kerning);
                }

                builder.append_kept(&font, code, origin);
                any_kept = true;
            }
        }
    }

    if !any_kept {
        return if any_removed {
            RedactOutcome::RemovedAll
        } else {
            RedactOutcome::Unchanged
        };
    }

    // A kerning flushed after the final kept glyph leaves a dangling empty
    // run; drop it together with its paired kerning.
    if builder.segments.len() > 1 && builder.segments.last().is_some_and(|run| run.is_empty()) {
        builder.segments.pop();
        builder.kernings.pop();
    }
    debug_assert_eq!(builder.kernings.len() + 1, builder.segments.len());

    text.set_segments(builder.segments, builder.kernings);
    // Re-assert the matrix so version-based consumers see a change even
    // when the value is numerically identical.
    let tm = text.text_matrix();
    text.set_text_matrix(tm);

    if any_removed {
        RedactOutcome::Modified
    } else {
        RedactOutcome::Unchanged
    }
}

/// Overwrite the samples of one placed image. Returns true when the image
/// stream was replaced.
fn redact_image_object(
    doc: &mut Document,
    image_object: &ImageObject,
    page_rects: &[Rect],
    parent_to_page: &Matrix,
    fill_black: bool,
) -> bool {
    let mut image = image_object.image().borrow_mut();
    let width = image.pixel_width();
    let height = image.pixel_height();
    if width == 0 || height == 0 {
        return false;
    }

    let img_to_page = image_object.matrix().concat(parent_to_page);

    // Quick reject on the placed unit square.
    let placed = img_to_page.transform_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
    if !intersects_any(&placed, page_rects) {
        return false;
    }

    let image_rects = rects_to_image_grid(&img_to_page, width, height, page_rects);
    if image_rects.is_empty() {
        return false;
    }
    let boxes = pixel_boxes(&image_rects, width, height);
    if boxes.is_empty() {
        return false;
    }

    let smask = image.smask_id().and_then(|id| stream_bytes(doc, id));
    let fill = if fill_black { 0x00 } else { 0xFF };

    let rewrite = {
        let Some(bitmap) = image.bitmap() else {
            return false;
        };
        redact_bitmap(bitmap, &image_rects, &boxes, smask.as_deref(), fill)
    };
    let Some(rewrite) = rewrite else {
        return false;
    };

    let mut new_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8i64,
    };

    if let Some(alpha) = rewrite.alpha {
        let smask_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8i64,
        };
        let smask_id = doc.add_object(Object::Stream(Stream::new(smask_dict, alpha)));
        new_dict.set("SMask", Object::Reference(smask_id));
    }

    image.overwrite_stream_in_place(rewrite.rgb, new_dict);
    true
}

/// True when the path's page-space bbox is closed-interval contained in
/// some redaction rect. Redaction covers appended by this engine are never
/// candidates.
fn path_fully_covered(
    path_object: &PathObject,
    page_rects: &[Rect],
    parent_to_page: &Matrix,
) -> bool {
    if path_object.is_overlay() {
        return false;
    }
    let total = path_object.matrix().concat(parent_to_page);
    let bbox_page = total
        .transform_rect(path_object.path().bounding_box())
        .normalized();
    page_rects.iter().any(|r| r.contains_rect(&bbox_page))
}

/// Redact all active objects inside a holder (page or form), recursing
/// through form placements when requested. `to_page` maps holder-local
/// space to page user space. Removal commits after the walk.
fn redact_holder(
    doc: &mut Document,
    holder: &mut PageObjectHolder,
    page_rects: &[Rect],
    to_page: &Matrix,
    options: &RedactOptions,
    visited: &mut HashSet<*const RefCell<Form>>,
) -> bool {
    let mut changed = false;
    let mut to_remove: Vec<usize> = Vec::new();

    for index in 0..holder.len() {
        let Some(object) = holder.object_mut(index) else {
            continue;
        };
        if !object.is_active() {
            continue;
        }

        let mutated = match object.kind_mut() {
            PageObjectKind::Text(text) => match redact_text_object(text, page_rects, to_page) {
                RedactOutcome::RemovedAll => {
                    to_remove.push(index);
                    changed = true;
                    false
                }
                RedactOutcome::Modified => {
                    changed = true;
                    true
                }
                RedactOutcome::Unchanged => false,
            },
            PageObjectKind::Image(image_object) => {
                let overwritten = redact_image_object(
                    doc,
                    image_object,
                    page_rects,
                    to_page,
                    options.draw_black_boxes,
                );
                changed |= overwritten;
                overwritten
            }
            PageObjectKind::Path(path_object) => {
                if path_fully_covered(path_object, page_rects, to_page) {
                    to_remove.push(index);
                    changed = true;
                }
                false
            }
            PageObjectKind::Form(form_object) => {
                if options.recurse_forms {
                    if let Some(form) = form_object.form() {
                        let next_to_page = form_object.matrix().concat(to_page);
                        // The visited set breaks (illegal) reference cycles
                        // and redacts shared forms once per call.
                        if visited.insert(Rc::as_ptr(&form)) {
                            let mut inner = form.borrow_mut();
                            if redact_holder(
                                doc,
                                &mut inner,
                                page_rects,
                                &next_to_page,
                                options,
                                visited,
                            ) {
                                // Forms do not share the page's deferred
                                // regeneration; rebuild their stream now.
                                inner.regenerate_content();
                                changed = true;
                            }
                        }
                    }
                }
                false
            }
            PageObjectKind::Other => false,
        };

        if mutated {
            object.touch();
        }
    }

    if !to_remove.is_empty() {
        holder.remove_objects(&to_remove);
    }

    changed
}

/// Append one opaque black cover per rectangle, painted last.
fn add_black_overlays(page: &mut Page, rects: &[Rect]) {
    for rect in rects {
        let mut path = PathObject::new(PathData::rect(*rect), Matrix::identity());
        path.set_stroke(false);
        path.set_fill(true);
        path.set_fill_rule(FillRule::NonZeroWinding);
        path.set_overlay(true);
        path.calc_bounding_box();
        let mut object = PageObject::new(PageObjectKind::Path(path));
        object.touch();
        page.append_object(object);
    }
}

/// Redact everything inside one page-space rectangle.
pub fn redact_text_in_rect(
    doc: &mut Document,
    page: &mut Page,
    rect: Rect,
    options: &RedactOptions,
) -> bool {
    redact_text_in_rects(doc, page, &[rect], options)
}

/// Redact everything inside a set of page-space rectangles. Returns true
/// when any page content changed, or when covers were requested (appending
/// a cover is itself a change).
pub fn redact_text_in_rects(
    doc: &mut Document,
    page: &mut Page,
    rects: &[Rect],
    options: &RedactOptions,
) -> bool {
    if rects.is_empty() {
        return false;
    }

    let rects: Vec<Rect> = rects.iter().map(|r| r.normalized()).collect();
    let mut visited: HashSet<*const RefCell<Form>> = HashSet::new();

    let changed = redact_holder(
        doc,
        page,
        &rects,
        &Matrix::identity(),
        options,
        &mut visited,
    );
    if changed {
        page.clear_render_cache();
    }

    if options.draw_black_boxes {
        add_black_overlays(page, &rects);
    }

    changed || options.draw_black_boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::GlyphBounds;
    use std::sync::Arc;

    // --- Rounding policy ---

    #[test]
    fn round_thousandths_half_away_from_zero() {
        assert_eq!(round_thousandths(0.5), 1);
        assert_eq!(round_thousandths(-0.5), -1);
        assert_eq!(round_thousandths(0.49), 0);
        assert_eq!(round_thousandths(-0.49), 0);
        assert_eq!(round_thousandths(600.2), 600);
        assert_eq!(round_thousandths(-599.7), -600);
    }

    #[test]
    fn flush_kerning_applies_deadband_then_rounds() {
        let mut builder = SegmentBuilder::new();
        builder.flush_kerning(0.2); // inside the deadband
        assert!(builder.kernings.is_empty());
        assert_eq!(builder.segments.len(), 1);

        builder.flush_kerning(0.4); // past the deadband, rounds to 0
        assert!(builder.kernings.is_empty());

        builder.flush_kerning(649.6);
        assert_eq!(builder.kernings, vec![650.0]);
        assert_eq!(builder.segments.len(), 2);
    }

    // --- Metric bridge ---

    fn test_font() -> Arc<Font> {
        Arc::new(
            Font::simple("TestSans", 0, vec![], 600.0)
                .with_font_bounds(GlyphBounds::new(0, 0, 600, 1000)),
        )
    }

    #[test]
    fn glyph_bbox_scales_translates_and_transforms() {
        let mut text = TextObject::new(Some(test_font()), 12.0);
        let mut tm = Matrix::identity();
        tm.e = 100.0;
        tm.f = 200.0;
        text.set_text_matrix(tm);

        let font = text.font().unwrap();
        let bbox = glyph_bbox_in_page(
            &text,
            &font,
            65,
            Point::new(7.2, 0.0),
            &Matrix::identity(),
        );
        // 600x1000 font units at 12pt = 7.2 x 12 user units at (107.2, 200).
        assert!((bbox.left - 107.2).abs() < 1e-9);
        assert!((bbox.bottom - 200.0).abs() < 1e-9);
        assert!((bbox.right - 114.4).abs() < 1e-9);
        assert!((bbox.top - 212.0).abs() < 1e-9);
    }

    #[test]
    fn glyph_bbox_applies_parent_transform() {
        let text = TextObject::new(Some(test_font()), 10.0);
        let font = text.font().unwrap();
        let parent = Matrix::translation(50.0, 50.0);
        let bbox = glyph_bbox_in_page(&text, &font, 65, Point::new(0.0, 0.0), &parent);
        assert!((bbox.left - 50.0).abs() < 1e-9);
        assert!((bbox.bottom - 50.0).abs() < 1e-9);
    }

    #[test]
    fn advance_adds_word_space_for_single_byte_space_only() {
        let mut text = TextObject::new(Some(test_font()), 10.0);
        text.set_word_space(2.0);
        let font = text.font().unwrap();

        // Space: 600 + 2.0 * 1000 / 10 = 800 thousandths.
        assert!((advance_thousandths(&text, &font, 32) - 800.0).abs() < 1e-9);
        // Non-space: no word spacing.
        assert!((advance_thousandths(&text, &font, 65) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn advance_always_adds_char_space() {
        let mut text = TextObject::new(Some(test_font()), 10.0);
        text.set_char_space(1.0);
        let font = text.font().unwrap();
        assert!((advance_thousandths(&text, &font, 65) - 700.0).abs() < 1e-9);
    }

    #[test]
    fn advance_uses_vertical_displacement_for_vertical_fonts() {
        let font = Arc::new(Font::cid("Mincho", 1000.0, true).with_vert_advance(7, -900.0));
        let text = TextObject::new(Some(font.clone()), 10.0);
        assert!((advance_thousandths(&text, &font, 7) - (-900.0)).abs() < 1e-9);
    }

    #[test]
    fn two_byte_cid_space_gets_no_word_space() {
        let font = Arc::new(Font::cid("Gothic", 1000.0, false));
        let mut text = TextObject::new(Some(font.clone()), 10.0);
        text.set_word_space(5.0);
        assert!((advance_thousandths(&text, &font, 32) - 1000.0).abs() < 1e-9);
    }

    // --- Missing font ---

    #[test]
    fn text_without_font_is_unchanged() {
        let mut text = TextObject::new(None, 12.0);
        text.push_glyph(65, Point::new(0.0, 0.0));
        let outcome = redact_text_object(
            &mut text,
            &[Rect::new(-100.0, -100.0, 100.0, 100.0)],
            &Matrix::identity(),
        );
        assert_eq!(outcome, RedactOutcome::Unchanged);
    }
}
