//! Wraps a single raster image into a one-page PDF so the parser only ever
//! sees PDF input. JPEG data is embedded as-is; PNG is decoded, flattened
//! onto white and re-compressed.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use super::sniff::FileKind;

/// PDF viewers refuse pages larger than this many units on a side.
const MAX_PAGE_UNITS: f64 = 14_400.0;

/// Hard ceiling on decoded PNG size regardless of the upload limit.
pub const MAX_PNG_PIXELS: u64 = 40_000_000;

/// Pixel budget for PNG decoding: one pixel per accepted upload byte, capped
/// at [`MAX_PNG_PIXELS`].
pub fn pixel_budget(max_upload_bytes: usize) -> u64 {
    (max_upload_bytes as u64).min(MAX_PNG_PIXELS)
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data is truncated")]
    Truncated,

    #[error("malformed image: {0}")]
    Malformed(String),

    #[error("unsupported image: {0}")]
    Unsupported(String),

    #[error("image decompression failed: {0}")]
    Decompress(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "/DeviceGray",
            ColorSpace::Rgb => "/DeviceRGB",
            ColorSpace::Cmyk => "/DeviceCMYK",
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorSpace,
    pub samples: Vec<u8>,
}

pub fn image_to_pdf(kind: FileKind, bytes: &[u8], max_pixels: u64) -> Result<Vec<u8>, ImageError> {
    match kind {
        FileKind::Jpeg => {
            let (width, height, color) = jpeg_dimensions(bytes)?;
            Ok(single_image_pdf(width, height, color, "/DCTDecode", bytes))
        }
        FileKind::Png => {
            let image = decode_png(bytes, max_pixels)?;
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&image.samples)?;
            let compressed = encoder.finish()?;
            Ok(single_image_pdf(
                image.width,
                image.height,
                image.color,
                "/FlateDecode",
                &compressed,
            ))
        }
        other => Err(ImageError::Unsupported(format!("{} images", other))),
    }
}

fn single_image_pdf(width: u32, height: u32, color: ColorSpace, filter: &str, data: &[u8]) -> Vec<u8> {
    let scale = (MAX_PAGE_UNITS / f64::from(width.max(height))).min(1.0);
    let page_w = (f64::from(width) * scale).max(1.0);
    let page_h = (f64::from(height) * scale).max(1.0);

    let mut pdf = PdfWriter::new();
    pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.object(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>",
            page_w, page_h
        )
        .as_bytes(),
    );
    pdf.stream(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} \
             /BitsPerComponent 8 /Filter {}",
            width,
            height,
            color.pdf_name(),
            filter
        ),
        data,
    );
    let contents = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q", page_w, page_h);
    pdf.stream("", contents.as_bytes());
    pdf.finish()
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin(&mut self) {
        self.offsets.push(self.buf.len());
        let header = format!("{} 0 obj\n", self.offsets.len());
        self.buf.extend_from_slice(header.as_bytes());
    }

    fn object(&mut self, body: &[u8]) {
        self.begin();
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, dict: &str, data: &[u8]) {
        self.begin();
        let head = if dict.is_empty() {
            format!("<< /Length {} >>\nstream\n", data.len())
        } else {
            format!("<< {} /Length {} >>\nstream\n", dict, data.len())
        };
        self.buf.extend_from_slice(head.as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            table.push_str(&format!("{:010} 00000 n \n", offset));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            xref_at
        ));
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Result<u16, ImageError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(ImageError::Truncated)
}

fn be_u32(bytes: &[u8], at: usize) -> Result<u32, ImageError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ImageError::Truncated)
}

/// Reads width, height and colour model from the first SOF segment.
pub fn jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32, ColorSpace), ImageError> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return Err(ImageError::Malformed("missing JPEG SOI marker".to_string()));
    }
    let mut pos = 2;
    loop {
        // Skip fill bytes up to the marker code.
        while bytes.get(pos) == Some(&0xFF) && bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&0xFF) {
            return Err(ImageError::Malformed(format!("expected marker at byte {}", pos)));
        }
        let marker = *bytes.get(pos + 1).ok_or(ImageError::Truncated)?;
        pos += 2;
        match marker {
            0xD8 | 0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => {
                return Err(ImageError::Malformed("no frame header before scan data".to_string()))
            }
            _ => {}
        }
        let len = usize::from(be_u16(bytes, pos)?);
        if len < 2 {
            return Err(ImageError::Malformed("bad JPEG segment length".to_string()));
        }
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let height = u32::from(be_u16(bytes, pos + 3)?);
            let width = u32::from(be_u16(bytes, pos + 5)?);
            let components = *bytes.get(pos + 7).ok_or(ImageError::Truncated)?;
            let color = match components {
                1 => ColorSpace::Gray,
                3 => ColorSpace::Rgb,
                4 => ColorSpace::Cmyk,
                n => return Err(ImageError::Unsupported(format!("JPEG with {} components", n))),
            };
            if width == 0 || height == 0 {
                return Err(ImageError::Malformed("JPEG has zero dimension".to_string()));
            }
            return Ok((width, height, color));
        }
        pos += len;
    }
}

/// Decodes a non-interlaced PNG into 8-bit gray or RGB samples. Alpha is
/// composited over white and palettes are expanded. Images with more than
/// `max_pixels` pixels are rejected before any data is inflated.
pub fn decode_png(bytes: &[u8], max_pixels: u64) -> Result<DecodedImage, ImageError> {
    if !bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Err(ImageError::Malformed("missing PNG signature".to_string()));
    }
    let mut pos = 8;
    let mut header = None;
    let mut palette: Vec<u8> = Vec::new();
    let mut idat = Vec::new();
    while pos + 8 <= bytes.len() {
        let len = be_u32(bytes, pos)? as usize;
        let kind = &bytes[pos + 4..pos + 8];
        let end = (pos + 8).checked_add(len).ok_or(ImageError::Truncated)?;
        let data = bytes.get(pos + 8..end).ok_or(ImageError::Truncated)?;
        match kind {
            b"IHDR" => {
                if data.len() < 13 {
                    return Err(ImageError::Malformed("short IHDR".to_string()));
                }
                header = Some(PngHeader {
                    width: be_u32(data, 0)?,
                    height: be_u32(data, 4)?,
                    bit_depth: data[8],
                    color_type: data[9],
                    interlace: data[12],
                });
            }
            b"PLTE" => palette = data.to_vec(),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }
        pos = end + 4;
    }
    let header = header.ok_or_else(|| ImageError::Malformed("missing IHDR".to_string()))?;
    header.check(max_pixels)?;
    if idat.is_empty() {
        return Err(ImageError::Malformed("no image data".to_string()));
    }

    // Inflate no further than the scanlines the header declares.
    let expected = header.raw_len()?;
    let mut raw = Vec::new();
    ZlibDecoder::new(idat.as_slice())
        .take(expected as u64)
        .read_to_end(&mut raw)?;
    let rows = unfilter(&header, &raw)?;
    Ok(header.to_samples(&rows, &palette))
}

struct PngHeader {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlace: u8,
}

impl PngHeader {
    fn channels(&self) -> usize {
        match self.color_type {
            2 => 3,
            4 => 2,
            6 => 4,
            _ => 1,
        }
    }

    fn check(&self, max_pixels: u64) -> Result<(), ImageError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImageError::Malformed("PNG has zero dimension".to_string()));
        }
        let pixels = u64::from(self.width) * u64::from(self.height);
        if pixels > max_pixels {
            return Err(ImageError::Unsupported(format!(
                "PNG of {}x{} exceeds the {} pixel limit",
                self.width, self.height, max_pixels
            )));
        }
        if self.interlace != 0 {
            return Err(ImageError::Unsupported("interlaced PNG".to_string()));
        }
        let ok = match self.color_type {
            0 | 3 => matches!(self.bit_depth, 1 | 2 | 4 | 8),
            2 | 4 | 6 => self.bit_depth == 8,
            _ => false,
        };
        if !ok {
            return Err(ImageError::Unsupported(format!(
                "PNG colour type {} at {} bits",
                self.color_type, self.bit_depth
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        (self.width as usize * self.channels() * self.bit_depth as usize).div_ceil(8)
    }

    /// Length of the filtered scanline data: one filter byte per row.
    fn raw_len(&self) -> Result<usize, ImageError> {
        let too_large = || ImageError::Unsupported("PNG dimensions overflow".to_string());
        let stride = (self.width as usize)
            .checked_mul(self.channels() * self.bit_depth as usize)
            .ok_or_else(too_large)?
            .div_ceil(8);
        (self.height as usize)
            .checked_mul(stride + 1)
            .ok_or_else(too_large)
    }

    fn bytes_per_pixel(&self) -> usize {
        (self.channels() * self.bit_depth as usize).div_ceil(8).max(1)
    }

    fn sample(&self, row: &[u8], index: usize) -> u8 {
        let depth = self.bit_depth as usize;
        if depth == 8 {
            return row[index];
        }
        let bit = index * depth;
        let shift = 8 - depth - (bit % 8);
        (row[bit / 8] >> shift) & ((1u8 << depth) - 1)
    }

    fn to_samples(&self, rows: &[Vec<u8>], palette: &[u8]) -> DecodedImage {
        let width = self.width as usize;
        let max = (1u16 << self.bit_depth) - 1;
        let over_white = |c: u8, a: u8| -> u8 {
            ((u16::from(c) * u16::from(a) + 255 * (255 - u16::from(a))) / 255) as u8
        };
        let (color, per_pixel) = match self.color_type {
            0 | 4 => (ColorSpace::Gray, 1),
            _ => (ColorSpace::Rgb, 3),
        };
        let mut samples = Vec::with_capacity(width * rows.len() * per_pixel);
        for row in rows {
            for x in 0..width {
                match self.color_type {
                    0 => {
                        let v = u16::from(self.sample(row, x));
                        samples.push((v * 255 / max) as u8);
                    }
                    2 => samples.extend_from_slice(&row[x * 3..x * 3 + 3]),
                    3 => {
                        let idx = usize::from(self.sample(row, x)) * 3;
                        match palette.get(idx..idx + 3) {
                            Some(rgb) => samples.extend_from_slice(rgb),
                            None => samples.extend_from_slice(&[0, 0, 0]),
                        }
                    }
                    4 => samples.push(over_white(row[x * 2], row[x * 2 + 1])),
                    _ => {
                        let px = &row[x * 4..x * 4 + 4];
                        for c in &px[..3] {
                            samples.push(over_white(*c, px[3]));
                        }
                    }
                }
            }
        }
        DecodedImage {
            width: self.width,
            height: self.height,
            color,
            samples,
        }
    }
}

fn unfilter(header: &PngHeader, raw: &[u8]) -> Result<Vec<Vec<u8>>, ImageError> {
    let stride = header.stride();
    let bpp = header.bytes_per_pixel();
    let height = header.height as usize;
    if raw.len() < header.raw_len()? {
        return Err(ImageError::Truncated);
    }
    let mut rows: Vec<Vec<u8>> = Vec::with_capacity(height);
    let mut prev = vec![0u8; stride];
    for y in 0..height {
        let start = y * (stride + 1);
        let filter = raw[start];
        let mut row = raw[start + 1..start + 1 + stride].to_vec();
        for i in 0..stride {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(ImageError::Malformed(format!("unknown PNG filter {}", other))),
            };
            row[i] = row[i].wrapping_add(predicted);
        }
        prev.clone_from(&row);
        rows.push(row);
    }
    Ok(rows)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let mut crc = flate2::Crc::new();
        crc.update(kind);
        crc.update(data);
        out.extend_from_slice(&crc.sum().to_be_bytes());
    }

    /// Builds a PNG from already-filtered scanlines.
    pub(crate) fn png(width: u32, height: u32, depth: u8, color: u8, scanlines: &[u8], plte: Option<&[u8]>) -> Vec<u8> {
        let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[depth, color, 0, 0, 0]);
        chunk(&mut out, b"IHDR", &ihdr);
        if let Some(plte) = plte {
            chunk(&mut out, b"PLTE", plte);
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(scanlines).unwrap();
        chunk(&mut out, b"IDAT", &encoder.finish().unwrap());
        chunk(&mut out, b"IEND", &[]);
        out
    }

    pub(crate) fn tiny_jpeg() -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        out.extend_from_slice(b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x20, 0x03]);
        out.extend_from_slice(&[1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    /// A blank PDF with `pages` pages and a valid cross-reference table.
    pub(crate) fn multi_page_pdf(pages: usize) -> Vec<u8> {
        let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
        let mut pdf = PdfWriter::new();
        pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>");
        pdf.object(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages).as_bytes());
        for _ in 0..pages {
            pdf.object(b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
        }
        pdf.finish()
    }

    #[test]
    fn reads_jpeg_frame_header() {
        let (w, h, color) = jpeg_dimensions(&tiny_jpeg()).unwrap();
        assert_eq!((w, h, color), (32, 16, ColorSpace::Rgb));
    }

    #[test]
    fn jpeg_without_frame_is_rejected() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(jpeg_dimensions(&bytes), Err(ImageError::Malformed(_))));
        assert!(matches!(jpeg_dimensions(&[0xFF, 0xD8, 0xFF]), Err(ImageError::Truncated)));
    }

    #[test]
    fn decodes_rgba_with_filters_over_white() {
        // Row 0 unfiltered, row 1 uses Sub.
        let scanlines = [
            0, 255, 0, 0, 255, 0, 0, 255, 0,
            1, 10, 20, 30, 255, 5, 5, 5, 0,
        ];
        let image = decode_png(&png(2, 2, 8, 6, &scanlines, None), MAX_PNG_PIXELS).unwrap();
        assert_eq!(image.color, ColorSpace::Rgb);
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(
            image.samples,
            vec![255, 0, 0, 255, 255, 255, 10, 20, 30, 15, 25, 35]
        );
    }

    #[test]
    fn decodes_palette_at_low_bit_depth() {
        // 4 pixels at 2 bits: indices 0,1,2,1 -> 0b00_01_10_01.
        let scanlines = [0, 0b0001_1001];
        let plte = [0, 0, 0, 255, 255, 255, 200, 100, 50];
        let image = decode_png(&png(4, 1, 2, 3, &scanlines, Some(&plte)), MAX_PNG_PIXELS).unwrap();
        assert_eq!(
            image.samples,
            vec![0, 0, 0, 255, 255, 255, 200, 100, 50, 255, 255, 255]
        );
    }

    #[test]
    fn decodes_gray_with_up_and_paeth() {
        let scanlines = [0, 100, 50, 2, 10, 10, 4, 1, 1];
        let image = decode_png(&png(2, 3, 8, 0, &scanlines, None), MAX_PNG_PIXELS).unwrap();
        assert_eq!(image.color, ColorSpace::Gray);
        assert_eq!(image.samples, vec![100, 50, 110, 60, 111, 61]);
    }

    #[test]
    fn rejects_sixteen_bit_and_interlaced() {
        let sixteen = png(1, 1, 16, 2, &[0, 0, 0, 0, 0, 0, 0], None);
        assert!(matches!(decode_png(&sixteen, MAX_PNG_PIXELS), Err(ImageError::Unsupported(_))));

        let mut interlaced = png(1, 1, 8, 0, &[0, 0], None);
        // IHDR data starts at 16; interlace flag is its 13th byte.
        interlaced[16 + 12] = 1;
        assert!(decode_png(&interlaced, MAX_PNG_PIXELS).is_err());
    }

    #[test]
    fn huge_dimensions_are_rejected_before_inflating() {
        let mut bytes = png(1, 1, 8, 6, &[0, 0, 0, 0, 0], None);
        // Width and height live at the start of the IHDR data (offset 16).
        bytes[16..20].copy_from_slice(&2_863_398_913u32.to_be_bytes());
        bytes[20..24].copy_from_slice(&2_147_418_113u32.to_be_bytes());
        let err = decode_png(&bytes, MAX_PNG_PIXELS).unwrap_err();
        assert!(matches!(err, ImageError::Unsupported(msg) if msg.contains("pixel limit")));
    }

    #[test]
    fn pixel_budget_follows_upload_limit() {
        assert_eq!(pixel_budget(1024), 1024);
        assert_eq!(pixel_budget(usize::MAX), MAX_PNG_PIXELS);

        let scanlines = [0, 1, 2, 3, 0, 4, 5, 6];
        let bytes = png(3, 2, 8, 0, &scanlines, None);
        assert!(decode_png(&bytes, 6).is_ok());
        assert!(matches!(decode_png(&bytes, 5), Err(ImageError::Unsupported(_))));
    }

    #[test]
    fn scanline_length_overflow_is_an_error() {
        let header = PngHeader {
            width: u32::MAX,
            height: u32::MAX,
            bit_depth: 8,
            color_type: 6,
            interlace: 0,
        };
        assert!(header.raw_len().is_err());
    }

    #[test]
    fn inflate_stops_at_declared_scanlines() {
        // Two declared gray pixels followed by a megabyte of trailing zeros.
        let mut scanlines = vec![0, 7, 9];
        scanlines.resize(1 << 20, 0);
        let image = decode_png(&png(2, 1, 8, 0, &scanlines, None), MAX_PNG_PIXELS).unwrap();
        assert_eq!(image.samples, vec![7, 9]);
    }

    #[test]
    fn short_image_data_is_truncated() {
        let bytes = png(4, 4, 8, 0, &[0, 1, 2, 3, 4], None);
        assert!(matches!(decode_png(&bytes, MAX_PNG_PIXELS), Err(ImageError::Truncated)));
    }

    fn check_xref(pdf: &[u8]) {
        let text = String::from_utf8_lossy(pdf);
        let start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.trim().parse().ok())
            .unwrap();
        assert!(pdf[start..].starts_with(b"xref"));
        let table = String::from_utf8_lossy(&pdf[start..]).into_owned();
        let entries: Vec<&str> = table.lines().skip(3).take(5).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(pdf[offset..].starts_with(expected.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn jpeg_becomes_single_page_pdf() {
        let jpeg = tiny_jpeg();
        let pdf = image_to_pdf(FileKind::Jpeg, &jpeg, MAX_PNG_PIXELS).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/Width 32 /Height 16"));
        assert!(text.contains("/DCTDecode"));
        assert!(pdf.windows(jpeg.len()).any(|w| w == jpeg.as_slice()));
        check_xref(&pdf);
    }

    #[test]
    fn png_becomes_single_page_pdf() {
        let bytes = png(1, 1, 8, 2, &[0, 1, 2, 3], None);
        let pdf = image_to_pdf(FileKind::Png, &bytes, MAX_PNG_PIXELS).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("/FlateDecode"));
        assert!(text.contains("/MediaBox [0 0 1.00 1.00]"));
        check_xref(&pdf);
    }

    #[test]
    fn other_formats_are_unsupported() {
        assert!(matches!(
            image_to_pdf(FileKind::Gif, b"GIF89a", MAX_PNG_PIXELS),
            Err(ImageError::Unsupported(_))
        ));
    }
}
