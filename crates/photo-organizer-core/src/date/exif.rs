use chrono::{NaiveDate, NaiveDateTime};
use exif::{DateTime, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the capture date from a photo's embedded EXIF block.
/// EXIF datetimes have no timezone info - they are local time as-is.
pub fn read_exif_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let reader = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    let tags = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

    for tag in &tags {
        if let Some(field) = reader.get_field(*tag, In::PRIMARY) {
            if let Value::Ascii(ref parts) = field.value {
                if let Some(dt) = parts.first().and_then(|raw| parse_exif_datetime(raw)) {
                    return Some(dt);
                }
            }
        }
    }

    None
}

/// `YYYY:MM:DD HH:MM:SS`, the only layout the tags allow. Blank and
/// zeroed-out values come back as None.
fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?.and_hms_opt(
        dt.hour.into(),
        dt.minute.into(),
        dt.second.into(),
    )
}

/// Minimal JPEG holding only an APP1 Exif segment with DateTimeOriginal.
#[cfg(test)]
pub(crate) fn jpeg_with_exif_date(date: &str) -> Vec<u8> {
    assert_eq!(date.len(), 19, "EXIF dates are 'YYYY:MM:DD HH:MM:SS'");

    let mut tiff: Vec<u8> = Vec::new();
    // Little-endian TIFF header, IFD0 at offset 8
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0: one entry pointing at the Exif IFD (offset 26)
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD: DateTimeOriginal, ASCII[20] at offset 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(date.as_bytes());
    tiff.push(0);
    assert_eq!(tiff.len(), 64);

    let segment_len = (2 + 6 + tiff.len()) as u16;
    let mut jpeg = vec![0xff, 0xd8, 0xff, 0xe1];
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    jpeg
}
