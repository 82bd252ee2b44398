//! Speaker photo file naming

/// Extension guessed from the URL alone: `jpg` if the URL mentions it, else `png`.
pub fn extension_from_url(url: Option<&str>) -> &'static str {
    match url {
        Some(url) if url.contains("jpg") => "jpg",
        _ => "png",
    }
}

/// Extension for a declared `Content-Type`. Only JPEG and PNG are recognised,
/// since images are always published as `.jpg` or `.png`.
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Pick the extension for a photo: declared type first, URL heuristic second.
pub fn resolve_extension(url: Option<&str>, content_type: Option<&str>) -> &'static str {
    content_type
        .and_then(extension_from_content_type)
        .unwrap_or_else(|| extension_from_url(url))
}

pub fn file_name(slug: &str, extension: &str) -> String {
    format!("{slug}.{extension}")
}
