// exif_meta.rs - EXIF tag extraction from uploaded images or image URLs

use colored::*;
use exif::{Context, Exif, In, Reader, Tag, Value as ExifValue};
use reqwest::Client;
use serde_json::{Map, Value};
use std::io::Cursor;

use crate::error::OsintError;

// Binary blobs (MakerNote, thumbnails) render as long hex dumps
const MAX_VALUE_CHARS: usize = 256;

/// Read every EXIF field from an image container.
/// Payloads without an EXIF block, including non-images, yield an empty map.
pub fn extract_exif(bytes: &[u8]) -> Result<Map<String, Value>, OsintError> {
    let mut reader = Reader::new();
    reader.continue_on_error(true);
    let outcome = reader
        .read_from_container(&mut Cursor::new(bytes))
        .or_else(|e| {
            e.distill_partial_result(|errors| {
                for err in errors {
                    eprintln!("{}", format!("[!] Skipping damaged EXIF field: {}", err).yellow());
                }
            })
        });

    let exif = match outcome {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) | Err(exif::Error::InvalidFormat(_)) => return Ok(Map::new()),
        Err(e) => return Err(OsintError::Lookup(format!("Unreadable EXIF data: {}", e))),
    };

    let mut tags = Map::new();
    for field in exif.fields() {
        if field.tag == Tag::MakerNote {
            continue;
        }
        let key = format!("{} {}", group_name(field.tag, field.ifd_num), field.tag);
        let mut value = match &field.value {
            ExifValue::Ascii(parts) => parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            _ => field.display_value().with_unit(&exif).to_string(),
        };
        if value.chars().count() > MAX_VALUE_CHARS {
            value = value.chars().take(MAX_VALUE_CHARS).collect::<String>() + "...";
        }
        tags.insert(key, Value::String(value));
    }

    if let Some((lat, lon)) = gps_coordinates(&exif) {
        tags.insert(
            "GPS Coordinates".to_string(),
            serde_json::json!({ "latitude": lat, "longitude": lon }),
        );
    }

    Ok(tags)
}

fn group_name(tag: Tag, ifd: In) -> &'static str {
    if ifd == In::THUMBNAIL {
        return "Thumbnail";
    }
    match tag.context() {
        Context::Tiff => "Image",
        Context::Exif => "EXIF",
        Context::Gps => "GPS",
        Context::Interop => "Interop",
        _ => "Other",
    }
}

fn gps_coordinates(exif: &Exif) -> Option<(f64, f64)> {
    let lat = dms_to_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let lon = dms_to_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some((lat, lon))
}

fn dms_to_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let ExifValue::Rational(parts) = &field.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }
    let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;

    let is_negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            ExifValue::Ascii(v) => v.first().and_then(|s| s.first()).copied(),
            _ => None,
        })
        .map(|c| c.to_ascii_uppercase() == negative)
        .unwrap_or(false);

    Some(if is_negative { -degrees } else { degrees })
}

/// Single GET; the body is treated as image bytes whatever its content type
pub async fn fetch_image(client: &Client, url: &str) -> Result<Vec<u8>, OsintError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| OsintError::Transport(format!("Failed to fetch image: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OsintError::Transport(format!(
            "Failed to fetch image: HTTP {}",
            status.as_u16()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OsintError::Transport(format!("Failed to read image body: {}", e)))?;
    Ok(bytes.to_vec())
}
