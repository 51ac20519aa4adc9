//! pdfredact-edit: page object model and the rectangle redaction engine.
//!
//! This crate provides the in-memory page model the engine operates on —
//! holders, text/image/path/form objects, the font capability set — and the
//! redaction entry points [`redact_text_in_rect`] / [`redact_text_in_rects`].
//! It depends on pdfredact-core for geometry and raster algorithms and on
//! lopdf for the COS object layer (dictionaries, streams, indirect objects).

pub mod error;
pub mod font;
pub mod holder;
pub mod image;
pub mod object;
pub mod path;
pub mod redactor;

pub use error::EditError;
pub use font::{Font, GlyphBounds};
pub use holder::{Form, Page, PageObjectHolder};
pub use image::{Image, stream_bytes};
pub use object::{
    FillRule, FormObject, ImageObject, PageObject, PageObjectKind, PathObject, TextItem,
    TextObject,
};
pub use path::{PathData, PathSegment};
pub use pdfredact_core;
pub use redactor::{
    RedactOptions, RedactOutcome, redact_text_in_rect, redact_text_in_rects, redact_text_object,
};
