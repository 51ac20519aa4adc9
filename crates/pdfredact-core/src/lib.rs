//! Backend-independent data types and algorithms for pdfredact-rs.
//!
//! This crate provides the geometric primitives ([`Point`], [`Matrix`],
//! [`Rect`]) and the raster half of image redaction ([`Bitmap`],
//! [`redact_bitmap`]) used by pdfredact-rs. It has no required external
//! dependencies — all functionality is pure Rust.
//!
//! # Modules
//!
//! - [`geometry`] — Geometric primitives: [`Point`], [`Matrix`], [`Rect`]
//! - [`raster`] — Decoded image planes and pixel rewriting: [`Bitmap`],
//!   [`PixelFormat`], [`PixelBox`], [`redact_bitmap`]

/// Geometric primitives: points, affine matrices, page-space rectangles.
pub mod geometry;
/// Decoded image planes and the pixel half of image redaction.
pub mod raster;

pub use geometry::{Matrix, Point, Rect, intersects_any};
pub use raster::{Bitmap, PixelBox, PixelFormat, RasterRewrite, pixel_boxes, rects_to_image_grid, redact_bitmap};
