//! URL handling module for Pixel-Harvest
//!
//! This module provides href canonicalization against the site origin and
//! the filename derivation used when saving harvested images.

mod normalize;

pub use normalize::normalize;

use ::url::Url;

/// Derives a filename stem from the last path segment of a URL
///
/// The extension (everything after the final `.` of the segment) is dropped.
/// Returns None when the URL has no usable final segment.
///
/// # Examples
///
/// ```
/// use pixel_harvest::url::file_stem;
///
/// assert_eq!(
///     file_stem("https://www.wikihow.com/images/a/ab/Tie-Step-1.jpg"),
///     Some("Tie-Step-1".to_string())
/// );
/// assert_eq!(file_stem("https://www.wikihow.com/"), None);
/// ```
pub fn file_stem(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();

    let stem = match segment.rfind('.') {
        Some(0) | None => segment.as_str(),
        Some(idx) => &segment[..idx],
    };

    let cleaned: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_drops_extension() {
        assert_eq!(
            file_stem("https://example.com/images/thumb/v4-460px-Fold.jpg"),
            Some("v4-460px-Fold".to_string())
        );
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        assert_eq!(
            file_stem("https://example.com/a/Step.1.final.png"),
            Some("Step.1.final".to_string())
        );
    }

    #[test]
    fn test_stem_without_extension() {
        assert_eq!(
            file_stem("https://example.com/Image:Fold-Shirt"),
            Some("Image_Fold-Shirt".to_string())
        );
    }

    #[test]
    fn test_stem_ignores_trailing_slash() {
        assert_eq!(
            file_stem("https://example.com/images/photo.jpg/"),
            Some("photo".to_string())
        );
    }

    #[test]
    fn test_stem_of_root_is_none() {
        assert_eq!(file_stem("https://example.com/"), None);
    }

    #[test]
    fn test_stem_of_garbage_is_none() {
        assert_eq!(file_stem("not a url"), None);
    }

    #[test]
    fn test_hidden_file_keeps_name() {
        assert_eq!(
            file_stem("https://example.com/.hidden"),
            Some(".hidden".to_string())
        );
    }
}
