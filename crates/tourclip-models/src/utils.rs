//! URL helpers shared across crates.

use url::Url;

/// Derive a file name from an image URL.
///
/// Uses the last non-empty path segment. Falls back to the text after the
/// final `/` when the input is not an absolute URL.
pub fn file_name_from_url(image_url: &str) -> String {
    if let Ok(parsed) = Url::parse(image_url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }

    let without_query = image_url.split(['?', '#']).next().unwrap_or(image_url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_absolute_url() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/tours/123/colosseum.jpg?w=800"),
            "colosseum.jpg"
        );
    }

    #[test]
    fn test_file_name_trailing_slash() {
        assert_eq!(file_name_from_url("https://cdn.example.com/a/b/"), "b");
    }

    #[test]
    fn test_file_name_relative_path() {
        assert_eq!(file_name_from_url("path/to/review1.jpg"), "review1.jpg");
        assert_eq!(file_name_from_url("plain.png"), "plain.png");
    }
}
