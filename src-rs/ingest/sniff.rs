use std::fmt;

/// What the content bytes say a file is, regardless of its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Jpeg2000,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Png => "png",
            FileKind::Jpeg => "jpeg",
            FileKind::Gif => "gif",
            FileKind::Bmp => "bmp",
            FileKind::Tiff => "tiff",
            FileKind::Webp => "webp",
            FileKind::Jpeg2000 => "jp2",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, FileKind::Pdf)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PDF_HEADER_WINDOW: usize = 1024;

pub fn sniff(bytes: &[u8]) -> Option<FileKind> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some(FileKind::Png);
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(FileKind::Jpeg);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(FileKind::Gif);
    }
    if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        return Some(FileKind::Tiff);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(FileKind::Webp);
    }
    if bytes.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
        return Some(FileKind::Jpeg2000);
    }
    if bytes.starts_with(b"BM") && bytes.len() >= 14 {
        return Some(FileKind::Bmp);
    }
    // Readers accept junk before the header, so look a little way in.
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        return Some(FileKind::Pdf);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pdf(b"%PDF-1.7\n%...".as_slice(), Some(FileKind::Pdf))]
    #[case::pdf_with_preamble(b"\r\n\r\n%PDF-1.4".as_slice(), Some(FileKind::Pdf))]
    #[case::png(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".as_slice(), Some(FileKind::Png))]
    #[case::jpeg(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00].as_slice(), Some(FileKind::Jpeg))]
    #[case::gif(b"GIF89a\x01\x00".as_slice(), Some(FileKind::Gif))]
    #[case::tiff(b"II*\0\x08\0\0\0".as_slice(), Some(FileKind::Tiff))]
    #[case::webp(b"RIFF\x24\0\0\0WEBPVP8 ".as_slice(), Some(FileKind::Webp))]
    #[case::text(b"hello, world".as_slice(), None)]
    #[case::empty(b"".as_slice(), None)]
    fn detects_kind_from_content(#[case] bytes: &[u8], #[case] expected: Option<FileKind>) {
        assert_eq!(sniff(bytes), expected);
    }

    #[test]
    fn extension_does_not_matter() {
        // A PNG payload is a PNG even if the client calls it "report.pdf".
        let png = b"\x89PNG\r\n\x1a\nrest";
        assert_eq!(sniff(png), Some(FileKind::Png));
        assert!(FileKind::Png.is_image());
        assert!(!FileKind::Pdf.is_image());
    }
}
