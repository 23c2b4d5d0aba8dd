//! Archive entry names for fetched images.

/// Extension used when nothing better is known.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// How an image's extension is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryNaming {
    /// Always `.jpg`, whatever the content.
    #[default]
    Fixed,
    /// Derived from the response content type, `.jpg` when unknown.
    ContentType,
}

impl EntryNaming {
    /// File name for the image at 0-based `index`: `image<index + 1>.<ext>`.
    pub fn file_name(self, index: usize, content_type: Option<&str>) -> String {
        let ext = match self {
            EntryNaming::Fixed => DEFAULT_EXTENSION,
            EntryNaming::ContentType => content_type
                .and_then(extension_for)
                .unwrap_or(DEFAULT_EXTENSION),
        };
        format!("image{}.{}", index + 1, ext)
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let ext = match content_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" | "image/apng" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "image/bmp" | "image/x-ms-bmp" => "bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/tiff" => "tiff",
        _ => return None,
    };
    Some(ext)
}
