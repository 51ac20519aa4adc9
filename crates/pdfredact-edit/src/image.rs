//! Image XObject model: stream dictionary, sample data, decoded plane.
//!
//! An [`Image`] owns its lopdf stream dictionary and raw stream bytes. The
//! decoded plane is attached by the codec layer (a collaborator); the
//! redaction engine only reads it and replaces the stream wholesale.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfredact_core::raster::Bitmap;

/// An image XObject shared between its placements.
#[derive(Debug, Clone)]
pub struct Image {
    dict: Dictionary,
    data: Vec<u8>,
    width: u32,
    height: u32,
    decoded: Option<Bitmap>,
}

impl Image {
    /// Create an image over its stream dictionary and raw bytes. Pixel
    /// dimensions are read from `/Width` and `/Height`.
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Self {
        let width = dict_dimension(&dict, b"Width");
        let height = dict_dimension(&dict, b"Height");
        Self {
            dict,
            data,
            width,
            height,
            decoded: None,
        }
    }

    /// Attach the decoded plane produced by the codec layer.
    pub fn with_decoded(mut self, bitmap: Bitmap) -> Self {
        self.decoded = Some(bitmap);
        self
    }

    /// Replace the decoded plane.
    pub fn set_decoded(&mut self, bitmap: Bitmap) {
        self.decoded = Some(bitmap);
    }

    /// The decoded plane, when one has been attached.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.decoded.as_ref()
    }

    pub fn pixel_width(&self) -> u32 {
        self.width
    }

    pub fn pixel_height(&self) -> u32 {
        self.height
    }

    /// The stream dictionary.
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// The raw stream bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The `/SMask` indirect reference, if the dictionary carries one.
    pub fn smask_id(&self) -> Option<ObjectId> {
        match self.dict.get(b"SMask") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    }

    /// Replace the stream dictionary and bytes in place and drop the
    /// decoded cache. Pixel dimensions follow the new dictionary.
    pub fn overwrite_stream_in_place(&mut self, data: Vec<u8>, dict: Dictionary) {
        self.width = dict_dimension(&dict, b"Width");
        self.height = dict_dimension(&dict, b"Height");
        self.dict = dict;
        self.data = data;
        self.reset_cache();
    }

    /// Drop the decoded plane; the next consumer must re-decode.
    pub fn reset_cache(&mut self) {
        self.decoded = None;
    }
}

fn dict_dimension(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Read a stream object's bytes, preferring decompressed content and
/// falling back to the raw bytes when no filter applies.
pub fn stream_bytes(doc: &Document, id: ObjectId) -> Option<Vec<u8>> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}
