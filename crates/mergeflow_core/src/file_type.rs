//! File type classification for the document type filter.

struct FormatGroup {
    tag: &'static str,
    extensions: &'static [&'static str],
}

const FORMAT_GROUPS: &[FormatGroup] = &[
    FormatGroup {
        tag: "txt",
        extensions: &["txt"],
    },
    FormatGroup {
        tag: "zip",
        extensions: &["zip", "rar", "iso"],
    },
    FormatGroup {
        tag: "audio",
        extensions: &["wav", "aif", "mp3", "aac"],
    },
    FormatGroup {
        tag: "image",
        extensions: &["jpg", "jpeg", "gif", "bmp", "png", "svg"],
    },
    FormatGroup {
        tag: "video",
        extensions: &["m4v", "avi", "mpg", "mp4", "webm"],
    },
    FormatGroup {
        tag: "word",
        extensions: &["doc", "docx"],
    },
    FormatGroup {
        tag: "excel",
        extensions: &["xls", "xlsx"],
    },
    FormatGroup {
        tag: "powerpoint",
        extensions: &["ppt", "pptx"],
    },
    FormatGroup {
        tag: "pdf",
        extensions: &["pdf"],
    },
    FormatGroup {
        tag: "photoshop",
        extensions: &["psd"],
    },
    FormatGroup {
        tag: "illustrator",
        extensions: &["ai", "esp"],
    },
];

/// Return the extension of `name` (text after the last `.`), or `""` when absent.
pub fn file_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Classify a stored document type (extension, URL, or `"folder"`) into a filter tag.
///
/// Known extensions collapse into their family tag (`docx` → `word`); anything
/// else maps to its own last `.`-separated segment, lowercased.
pub fn file_format(raw_type: &str) -> String {
    let last = raw_type
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    FORMAT_GROUPS
        .iter()
        .find(|group| group.extensions.contains(&last.as_str()))
        .map(|group| group.tag.to_string())
        .unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::{file_extension, file_format};

    #[test]
    fn file_extension_uses_last_segment() {
        assert_eq!(file_extension("report.final.pdf"), "pdf");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension("archive."), "");
    }

    #[test]
    fn file_format_groups_known_extensions() {
        assert_eq!(file_format("docx"), "word");
        assert_eq!(file_format("XLSX"), "excel");
        assert_eq!(file_format("https://cdn.example.com/a/photo.jpeg"), "image");
        assert_eq!(file_format("mp3"), "audio");
        assert_eq!(file_format("esp"), "illustrator");
    }

    #[test]
    fn file_format_passes_through_unknown_values() {
        assert_eq!(file_format("folder"), "folder");
        assert_eq!(file_format("rs"), "rs");
        assert_eq!(file_format(""), "");
    }
}
