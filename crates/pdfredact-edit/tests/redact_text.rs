//! Text rewriting: glyph removal, kerning synthesis, matrix translation.
//!
//! Fixtures use a monospaced stand-in font: every glyph advances 600/1000
//! em and its ink covers 550x700 font units, so a 12pt glyph advances 7.2
//! user units and inks 6.6 x 8.4.

use std::sync::Arc;

use pdfredact_edit::pdfredact_core::geometry::{Matrix, Point, Rect};
use pdfredact_edit::{
    Font, GlyphBounds, RedactOutcome, TextItem, TextObject, redact_text_object,
};

/// 600-thousandth advance, 550x700 ink box.
fn mono_font() -> Arc<Font> {
    Arc::new(
        Font::simple("TestSans", 0, vec![], 600.0)
            .with_font_bounds(GlyphBounds::new(0, 0, 550, 700)),
    )
}

/// `"ABCDE"` at 12pt with its baseline origin at (100, 200).
fn line_abcde() -> TextObject {
    let mut text = TextObject::new(Some(mono_font()), 12.0);
    text.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
    for (i, code) in (b'A'..=b'E').enumerate() {
        text.push_glyph(u32::from(code), Point::new(i as f64 * 7.2, 0.0));
    }
    text
}

fn segments_as_bytes(text: &TextObject) -> Vec<&[u8]> {
    text.segments().iter().map(|s| s.as_slice()).collect()
}

/// Page-space origin of every glyph item, keyed by character code.
fn page_origins(text: &TextObject) -> Vec<(u32, Point)> {
    let tm = text.text_matrix();
    text.items()
        .iter()
        .filter_map(|item| match item {
            TextItem::Glyph { code, origin } => Some((*code, tm.transform_point(*origin))),
            TextItem::Separator(_) => None,
        })
        .collect()
}

fn assert_point_approx(p: Point, x: f64, y: f64) {
    assert!((p.x - x).abs() < 1e-6, "x: expected {x}, got {}", p.x);
    assert!((p.y - y).abs() < 1e-6, "y: expected {y}, got {}", p.y);
}

// ===== Scenario: middle glyph removed, explicit gap synthesized =====

#[test]
fn removing_middle_glyph_splits_into_two_segments() {
    let mut text = line_abcde();
    // Covers the ink of C only: page x in [114, 120], y in [200, 212].
    let rect = Rect::new(114.0, 200.0, 120.0, 212.0);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![b"AB".as_slice(), b"DE".as_slice()]);
    assert_eq!(text.kernings(), &[600.0]);
    // Text matrix unchanged: the removal is carried by the kerning.
    assert_eq!(text.text_matrix(), Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
}

#[test]
fn kept_glyphs_keep_their_page_origins_after_middle_removal() {
    let mut text = line_abcde();
    let before = page_origins(&text);
    let rect = Rect::new(114.0, 200.0, 120.0, 212.0);

    redact_text_object(&mut text, &[rect], &Matrix::identity());

    let after = page_origins(&text);
    assert_eq!(after.len(), 4);
    for (code, origin) in &after {
        let (_, original) = before
            .iter()
            .find(|(c, _)| c == code)
            .expect("kept glyph existed before");
        // Tolerance: half a thousandth of an em at 12pt.
        assert!((origin.x - original.x).abs() <= 0.5 / 1000.0 * 12.0);
        assert!((origin.y - original.y).abs() <= 0.5 / 1000.0 * 12.0);
    }
}

// ===== Scenario: every glyph removed =====

#[test]
fn covering_all_glyphs_removes_the_object() {
    let mut text = line_abcde();
    let rect = Rect::new(99.0, 199.0, 140.0, 213.0);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());
    assert_eq!(outcome, RedactOutcome::RemovedAll);
}

// ===== Scenario: leading glyph removed, matrix translated =====

#[test]
fn removing_first_glyph_translates_the_text_matrix() {
    let mut text = line_abcde();
    // Covers the ink of A only: page x in [99.5, 106.0].
    let rect = Rect::new(99.5, 200.0, 106.0, 212.0);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![b"BCDE".as_slice()]);
    assert!(text.kernings().is_empty());
    // The removed 600-thousandth advance becomes a 7.2-unit translation.
    let tm = text.text_matrix();
    assert!((tm.e - 107.2).abs() < 1e-6);
    assert!((tm.f - 200.0).abs() < 1e-6);

    // B now sits at segment origin zero but paints where it used to.
    let origins = page_origins(&text);
    assert_eq!(origins[0].0, u32::from(b'B'));
    assert_point_approx(origins[0].1, 107.2, 200.0);
}

#[test]
fn matrix_translation_follows_rotation() {
    // 90 degrees CCW: text runs up the page from (100, 200).
    let mut text = TextObject::new(Some(mono_font()), 12.0);
    text.set_text_matrix(Matrix::new(0.0, 1.0, -1.0, 0.0, 100.0, 200.0));
    for (i, code) in (b'A'..=b'C').enumerate() {
        text.push_glyph(u32::from(code), Point::new(i as f64 * 7.2, 0.0));
    }
    // A inks page x in [91.6, 100], y in [200, 206.6].
    let rect = Rect::new(90.0, 199.5, 101.0, 206.0);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![b"BC".as_slice()]);
    // The translation runs along the rotated text X axis: (0, +7.2).
    let tm = text.text_matrix();
    assert!((tm.e - 100.0).abs() < 1e-6);
    assert!((tm.f - 207.2).abs() < 1e-6);
}

// ===== Scenario: explicit separator pins the sign convention =====

#[test]
fn explicit_separator_folds_into_the_flushed_kerning() {
    let mut text = TextObject::new(Some(mono_font()), 12.0);
    text.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
    // "AB" -50 "CDE": the TJ -50 advances the pen 0.6 units.
    text.push_glyph(u32::from(b'A'), Point::new(0.0, 0.0));
    text.push_glyph(u32::from(b'B'), Point::new(7.2, 0.0));
    text.push_separator(-50.0);
    text.push_glyph(u32::from(b'C'), Point::new(15.0, 0.0));
    text.push_glyph(u32::from(b'D'), Point::new(22.2, 0.0));
    text.push_glyph(u32::from(b'E'), Point::new(29.4, 0.0));

    // Covers the ink of C only: page x in [115.0, 121.6].
    let rect = Rect::new(114.5, 200.0, 121.0, 212.0);
    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![b"AB".as_slice(), b"DE".as_slice()]);
    // Accumulator: -50 (separator) - 600 (removed C) = -650; the flushed
    // forward gap is its negation.
    assert_eq!(text.kernings(), &[650.0]);

    // D still paints at 122.2.
    let origins = page_origins(&text);
    let d = origins.iter().find(|(c, _)| *c == u32::from(b'D')).unwrap();
    assert_point_approx(d.1, 122.2, 200.0);
}

// ===== Invariants =====

#[test]
fn segments_kernings_invariant_holds_after_rewrite() {
    let mut text = line_abcde();
    let rect = Rect::new(114.0, 200.0, 120.0, 212.0);
    redact_text_object(&mut text, &[rect], &Matrix::identity());
    assert_eq!(text.kernings().len() + 1, text.segments().len());
}

#[test]
fn untouched_object_with_no_separator_round_trips() {
    let mut text = TextObject::new(Some(mono_font()), 12.0);
    text.set_segments(vec![b"ABCDE".to_vec()], vec![]);
    text.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
    let far_away = Rect::new(400.0, 400.0, 500.0, 500.0);

    let outcome = redact_text_object(&mut text, &[far_away], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Unchanged);
    assert_eq!(segments_as_bytes(&text), vec![b"ABCDE".as_slice()]);
    assert!(text.kernings().is_empty());
    assert_eq!(text.text_matrix(), Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
}

#[test]
fn char_space_is_preserved_in_the_synthesized_gap() {
    // Advance per glyph: 600 + 1.5 * 1000 / 12 = 725 thousandths = 8.7pt.
    let mut text = TextObject::new(Some(mono_font()), 12.0);
    text.set_char_space(1.5);
    text.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
    text.push_glyph(u32::from(b'A'), Point::new(0.0, 0.0));
    text.push_glyph(u32::from(b'X'), Point::new(8.7, 0.0));
    text.push_glyph(u32::from(b'B'), Point::new(17.4, 0.0));

    // Covers X's ink: page x in [108.7, 115.3].
    let rect = Rect::new(108.5, 200.0, 115.4, 212.0);
    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![b"A".as_slice(), b"B".as_slice()]);
    assert_eq!(text.kernings(), &[725.0]);

    let origins = page_origins(&text);
    let b = origins.iter().find(|(c, _)| *c == u32::from(b'B')).unwrap();
    assert_point_approx(b.1, 117.4, 200.0);
}

// ===== Vertical writing =====

fn vertical_font() -> Arc<Font> {
    // Default vertical displacement -1000 thousandths per glyph.
    Arc::new(Font::cid("TestMincho", 1000.0, true))
}

/// Three CID glyphs running down from (100, 500) at 10pt.
fn vertical_column() -> TextObject {
    let mut text = TextObject::new(Some(vertical_font()), 10.0);
    text.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 500.0));
    for (i, cid) in [1u32, 2, 3].into_iter().enumerate() {
        text.push_glyph(cid, Point::new(0.0, i as f64 * -10.0));
    }
    text
}

fn encode(font: &Font, cids: &[u32]) -> Vec<u8> {
    let mut buf = Vec::new();
    for &cid in cids {
        font.append_char(&mut buf, cid);
    }
    buf
}

#[test]
fn vertical_middle_removal_synthesizes_negative_kerning() {
    let mut text = vertical_column();
    let font = text.font().unwrap();
    // Middle glyph inks page y in [488.8, 498.8] (default CID bounds).
    let rect = Rect::new(99.0, 489.5, 111.0, 498.5);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(
        segments_as_bytes(&text),
        vec![encode(&font, &[1]).as_slice(), encode(&font, &[3]).as_slice()]
    );
    // Downward writing runs on negative advances; so does the gap.
    assert_eq!(text.kernings(), &[-1000.0]);

    // The last glyph still paints at y 480.
    let origins = page_origins(&text);
    let last = origins.iter().find(|(c, _)| *c == 3).unwrap();
    assert_point_approx(last.1, 100.0, 480.0);
}

#[test]
fn vertical_leading_removal_translates_along_the_y_axis() {
    let mut text = vertical_column();
    let font = text.font().unwrap();
    // Top glyph inks page y in [498.8, 508.8].
    let rect = Rect::new(99.0, 499.0, 111.0, 509.0);

    let outcome = redact_text_object(&mut text, &[rect], &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(segments_as_bytes(&text), vec![encode(&font, &[2, 3]).as_slice()]);
    assert!(text.kernings().is_empty());
    // The removed -1000-thousandth advance moves the start down 10 units.
    let tm = text.text_matrix();
    assert!((tm.e - 100.0).abs() < 1e-6);
    assert!((tm.f - 490.0).abs() < 1e-6);
}

// ===== Multiple rectangles =====

#[test]
fn disjoint_rects_remove_disjoint_glyphs() {
    let mut text = line_abcde();
    // One rect over B's ink, one over D's ink.
    let rects = [
        Rect::new(107.0, 200.0, 113.0, 212.0),
        Rect::new(121.4, 200.0, 127.5, 212.0),
    ];

    let outcome = redact_text_object(&mut text, &rects, &Matrix::identity());

    assert_eq!(outcome, RedactOutcome::Modified);
    assert_eq!(
        segments_as_bytes(&text),
        vec![b"A".as_slice(), b"C".as_slice(), b"E".as_slice()]
    );
    assert_eq!(text.kernings(), &[600.0, 600.0]);
}
