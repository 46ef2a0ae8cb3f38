//! MIME type spellings that denote the same format.

/// Canonical spelling of `mimetype`.
///
/// Unknown types are returned unchanged.
pub fn normalize(mimetype: &str) -> &str {
    match mimetype {
        "image/tif" | "image/x-tiff" | "image/x-tif" => "image/tiff",
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        "image/x-png" => "image/png",
        "text/xml" => "application/xml",
        other => other,
    }
}

/// Whether `a` and `b` name the same format.
pub fn equivalent(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms() {
        assert!(equivalent("image/tiff", "image/tif"));
        assert!(equivalent("image/jpg", "image/jpeg"));
        assert!(!equivalent("image/png", "image/tiff"));
        assert_eq!(normalize("application/vnd.prima.page+xml"), "application/vnd.prima.page+xml");
    }
}
