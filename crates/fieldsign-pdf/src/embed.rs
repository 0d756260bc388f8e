//! Raster embedding and drawing
//!
//! JPEG data goes into the document untouched behind a DCTDecode filter.
//! PNG data is decoded to 8-bit channels; color goes into a FlateDecode
//! image XObject and any alpha channel becomes a DeviceGray SMask so
//! transparent signature backgrounds stay transparent.

use std::io::Write;

use fieldsign_core::{FittedRect, ImageFormat, SignError, SignatureImage};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Register a decoded signature image as an image XObject and return its id.
pub fn embed_raster(doc: &mut Document, image: &SignatureImage) -> Result<ObjectId, SignError> {
    match image.format {
        ImageFormat::Jpeg => {
            let stream = image_stream(
                "DeviceRGB",
                image.width,
                image.height,
                "DCTDecode",
                image.bytes.clone(),
                None,
            );
            Ok(doc.add_object(stream))
        }
        ImageFormat::Png => embed_png(doc, &image.bytes),
    }
}

fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, SignError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| SignError::UnsupportedImageFormat(format!("broken PNG: {}", e)))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| SignError::UnsupportedImageFormat(format!("broken PNG: {}", e)))?;
    let data = &buf[..info.buffer_size()];

    let (color_space, pixels, alpha) = match info.color_type {
        png::ColorType::Rgb => ("DeviceRGB", data.to_vec(), None),
        png::ColorType::Rgba => {
            let (rgb, a) = split_alpha(data, 4);
            ("DeviceRGB", rgb, Some(a))
        }
        png::ColorType::Grayscale => ("DeviceGray", data.to_vec(), None),
        png::ColorType::GrayscaleAlpha => {
            let (gray, a) = split_alpha(data, 2);
            ("DeviceGray", gray, Some(a))
        }
        // normalize_to_color8 expands palettes, so this cannot be reached
        // through the decoder; reject instead of guessing.
        png::ColorType::Indexed => {
            return Err(SignError::UnsupportedImageFormat(
                "unexpanded indexed PNG".into(),
            ))
        }
    };

    let smask_id = match alpha {
        Some(a) => Some(doc.add_object(image_stream(
            "DeviceGray",
            info.width,
            info.height,
            "FlateDecode",
            deflate(&a)?,
            None,
        ))),
        None => None,
    };

    let stream = image_stream(
        color_space,
        info.width,
        info.height,
        "FlateDecode",
        deflate(&pixels)?,
        smask_id,
    );
    Ok(doc.add_object(stream))
}

/// Split interleaved samples into color channels and the trailing alpha.
fn split_alpha(data: &[u8], stride: usize) -> (Vec<u8>, Vec<u8>) {
    let mut color = Vec::with_capacity(data.len() / stride * (stride - 1));
    let mut alpha = Vec::with_capacity(data.len() / stride);
    for px in data.chunks_exact(stride) {
        color.extend_from_slice(&px[..stride - 1]);
        alpha.push(px[stride - 1]);
    }
    (color, alpha)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SignError::Document(format!("zlib compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| SignError::Document(format!("zlib compression failed: {}", e)))
}

fn image_stream(
    color_space: &str,
    width: u32,
    height: u32,
    filter: &str,
    content: Vec<u8>,
    smask: Option<ObjectId>,
) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    };
    if let Some(id) = smask {
        dict.set("SMask", Object::Reference(id));
    }
    Stream::new(dict, content)
}

/// Draw an embedded image on a page at an absolute rectangle.
///
/// A fresh content stream with `q cm Do Q` is appended after the page's
/// existing content, and the XObject is registered under an unused name in
/// the page's resources. Only the given page is touched.
pub fn draw_image(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
    rect: &FittedRect,
) -> Result<(), SignError> {
    let name = fresh_xobject_name(doc, page_id)?;

    let ops = format!(
        "q\n{w} 0 0 {h} {x} {y} cm\n/{name} Do\nQ\n",
        w = rect.width,
        h = rect.height,
        x = rect.x,
        y = rect.y,
        name = name,
    );
    let content_id = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));

    register_xobject(doc, page_id, &name, image_id)?;
    append_content(doc, page_id, content_id)
}

/// Pick an `FsigN` name not already used by the page's XObject resources.
fn fresh_xobject_name(doc: &Document, page_id: ObjectId) -> Result<String, SignError> {
    let taken = existing_xobject_names(doc, page_id)?;
    for n in 0.. {
        let candidate = format!("Fsig{}", n);
        if !taken.iter().any(|t| t == candidate.as_bytes()) {
            return Ok(candidate);
        }
    }
    unreachable!()
}

fn existing_xobject_names(doc: &Document, page_id: ObjectId) -> Result<Vec<Vec<u8>>, SignError> {
    let page = page_dict(doc, page_id)?;

    let resources = match page.get(b"Resources") {
        Ok(Object::Dictionary(d)) => d,
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .map_err(|e| SignError::Document(format!("bad Resources reference: {}", e)))?,
        _ => return Ok(Vec::new()),
    };

    let xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(d)) => d,
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .map_err(|e| SignError::Document(format!("bad XObject reference: {}", e)))?,
        _ => return Ok(Vec::new()),
    };

    Ok(xobjects.iter().map(|(k, _)| k.clone()).collect())
}

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, SignError> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| SignError::Document(format!("bad page object: {}", e)))
}

fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    image_id: ObjectId,
) -> Result<(), SignError> {
    // Resources may live inline in the page dictionary or behind a
    // reference; the XObject map inside may do the same.
    let resources_ref = match page_dict(doc, page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let deferred = match resources_ref {
        Some(res_id) => {
            let resources = doc
                .get_object_mut(res_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| SignError::Document(format!("bad Resources reference: {}", e)))?;
            set_in_xobject_map(resources, name, image_id)
        }
        None => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| SignError::Document(format!("bad page object: {}", e)))?;
            if page.get(b"Resources").is_err() {
                page.set("Resources", Dictionary::new());
            }
            let resources = match page.get_mut(b"Resources") {
                Ok(Object::Dictionary(d)) => d,
                _ => return Err(SignError::Document("page Resources is not a dictionary".into())),
            };
            set_in_xobject_map(resources, name, image_id)
        }
    };

    // XObject map stored as its own object: mutate it there.
    if let Some(xobj_id) = deferred {
        doc.get_object_mut(xobj_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| SignError::Document(format!("bad XObject reference: {}", e)))?
            .set(name, Object::Reference(image_id));
    }

    Ok(())
}

/// Insert into an inline XObject map, or return the object id to mutate
/// when the map lives behind a reference.
fn set_in_xobject_map(
    resources: &mut Dictionary,
    name: &str,
    image_id: ObjectId,
) -> Option<ObjectId> {
    match resources.get_mut(b"XObject") {
        Ok(Object::Dictionary(d)) => {
            d.set(name, Object::Reference(image_id));
            None
        }
        Ok(Object::Reference(id)) => Some(*id),
        _ => {
            let mut map = Dictionary::new();
            map.set(name, Object::Reference(image_id));
            resources.set("XObject", Object::Dictionary(map));
            None
        }
    }
}

fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content_id: ObjectId,
) -> Result<(), SignError> {
    let old = page_dict(doc, page_id)?.get(b"Contents").ok().cloned();

    let new_contents = match old {
        None => Object::Reference(content_id),
        Some(Object::Reference(existing)) => Object::Array(vec![
            Object::Reference(existing),
            Object::Reference(content_id),
        ]),
        Some(Object::Array(mut items)) => {
            items.push(Object::Reference(content_id));
            Object::Array(items)
        }
        // Direct stream object: move it out into its own object first.
        Some(Object::Stream(stream)) => {
            let moved = doc.add_object(Object::Stream(stream));
            Object::Array(vec![Object::Reference(moved), Object::Reference(content_id)])
        }
        Some(other) => {
            return Err(SignError::Document(format!(
                "unsupported Contents object: {:?}",
                other
            )))
        }
    };

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| SignError::Document(format!("bad page object: {}", e)))?
        .set("Contents", new_contents);

    Ok(())
}
