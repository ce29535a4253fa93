/// Extensions rendered inline as image previews; anything else becomes a
/// download link.
pub const IMAGE_EXTS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttachmentKind {
    Image,
    Download,
}

pub fn attachment_kind(path: &str) -> AttachmentKind {
    let lower = path.to_lowercase();
    match IMAGE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
        true => AttachmentKind::Image,
        false => AttachmentKind::Download,
    }
}

/// Attachments are served as static files under the collaborator base URL.
pub fn attachment_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Display name for a download link: the last path segment.
pub fn attachment_file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_match_case_insensitively() {
        assert_eq!(attachment_kind("uploads/shot.PNG"), AttachmentKind::Image);
        assert_eq!(attachment_kind("uploads/pic.jpeg"), AttachmentKind::Image);
        assert_eq!(attachment_kind("uploads/anim.gif"), AttachmentKind::Image);
        assert_eq!(
            attachment_kind("uploads/report.pdf"),
            AttachmentKind::Download
        );
        assert_eq!(attachment_kind("uploads/no-ext"), AttachmentKind::Download);
        // suffix match only, not substring
        assert_eq!(
            attachment_kind("uploads/jpg.to.pdf"),
            AttachmentKind::Download
        );
    }

    #[test]
    fn urls_join_without_duplicate_slashes() {
        assert_eq!(
            attachment_url("http://localhost:5000/", "/uploads/a.png"),
            "http://localhost:5000/uploads/a.png"
        );
        assert_eq!(
            attachment_url("http://localhost:5000", "uploads/a.png"),
            "http://localhost:5000/uploads/a.png"
        );
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(attachment_file_name("uploads/2024/log.txt"), "log.txt");
        assert_eq!(attachment_file_name("log.txt"), "log.txt");
    }
}
