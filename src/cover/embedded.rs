//! Pick the cover image out of a tag's pictures.
//!
//! Works for every tag lofty reads pictures from:
//! - ID3v2 tags (MP3, WAV)
//! - Vorbis comments (FLAC, OGG)
//! - MP4 atoms (M4A/AAC)

use lofty::picture::{MimeType, PictureType};
use lofty::tag::Tag;

use super::CoverArt;

/// Prefer the front cover, fall back to the first picture.
pub fn select_picture(tag: &Tag) -> Option<CoverArt> {
    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;

    let mime_type = match picture.mime_type() {
        Some(MimeType::Png) => "image/png",
        Some(MimeType::Gif) => "image/gif",
        Some(MimeType::Bmp) => "image/bmp",
        Some(MimeType::Tiff) => "image/tiff",
        _ => "image/jpeg",
    };

    Some(CoverArt {
        data: picture.data().to_vec(),
        mime_type: mime_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::picture::Picture;
    use lofty::tag::TagType;

    fn picture(pic_type: PictureType, data: &[u8]) -> Picture {
        Picture::new_unchecked(pic_type, Some(MimeType::Png), None, data.to_vec())
    }

    #[test]
    fn test_no_pictures() {
        let tag = Tag::new(TagType::Id3v2);
        assert!(select_picture(&tag).is_none());
    }

    #[test]
    fn test_prefers_front_cover() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.push_picture(picture(PictureType::Artist, b"artist"));
        tag.push_picture(picture(PictureType::CoverFront, b"front"));

        let cover = select_picture(&tag).unwrap();
        assert_eq!(cover.data, b"front");
        assert_eq!(cover.mime_type, "image/png");
    }

    #[test]
    fn test_falls_back_to_first_picture() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.push_picture(picture(PictureType::Leaflet, b"leaflet"));
        tag.push_picture(picture(PictureType::Media, b"media"));

        assert_eq!(select_picture(&tag).unwrap().data, b"leaflet");
    }
}
