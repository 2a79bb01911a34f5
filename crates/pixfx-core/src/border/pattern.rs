//! Decorative texture borders and the tile loader.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbaImage};
use tracing::trace;

use super::frame::{compose_rows, frame_row};
use super::BorderPattern;
use crate::buffer::{PixelBuffer, Rgba8};
use crate::error::{FilterError, FilterResult};
use crate::task::Progress;

/// Supplies texture tiles for pattern borders.
pub trait PatternSource: Send + Sync {
    fn load(&self, pattern: BorderPattern) -> FilterResult<RgbaImage>;
}

/// Tiles stored as `<dir>/<name>-pattern.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDirectory {
    root: PathBuf,
}

impl PatternDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, pattern: BorderPattern) -> PathBuf {
        self.root.join(pattern.file_name())
    }
}

impl PatternSource for PatternDirectory {
    fn load(&self, pattern: BorderPattern) -> FilterResult<RgbaImage> {
        load_pattern_file(self.path_for(pattern))
    }
}

/// A single in-memory tile used for every pattern.
impl PatternSource for RgbaImage {
    fn load(&self, _pattern: BorderPattern) -> FilterResult<RgbaImage> {
        Ok(self.clone())
    }
}

/// Open and decode a tile image.
///
/// # Errors
/// `ResourceUnavailable` when the file is missing or cannot be decoded.
pub fn load_pattern_file(path: impl AsRef<Path>) -> FilterResult<RgbaImage> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|e| FilterError::ResourceUnavailable(format!("{}: {}", path.display(), e)))?;
    Ok(img.into_rgba8())
}

/// Decode a tile from encoded image bytes (PNG, JPEG).
pub fn decode_pattern(bytes: &[u8]) -> FilterResult<RgbaImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FilterError::ResourceUnavailable(e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| FilterError::ResourceUnavailable(e.to_string()))?;
    Ok(img.into_rgba8())
}

/// Surround `src` with a textured band.
///
/// # Arguments
/// * `tile` - Texture repeated over the whole canvas
/// * `width` - Border width on every side
/// * `first_color`, `first_width` - Line along the outer canvas edge
/// * `second_color`, `second_width` - Line directly around the image
///
/// Line widths are clamped to `width`. The result is
/// `(w + 2·width) × (h + 2·width)` with `src` at `(width, width)`.
///
/// # Errors
/// `ResourceUnavailable` when `tile` has no pixels.
#[allow(clippy::too_many_arguments)]
pub fn pattern(
    src: &PixelBuffer,
    tile: &RgbaImage,
    width: u32,
    first_color: Rgba8,
    first_width: u32,
    second_color: Rgba8,
    second_width: u32,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if tile.width() == 0 || tile.height() == 0 {
        return Err(FilterError::ResourceUnavailable("pattern tile is empty".to_string()));
    }

    let depth = src.depth();
    let canvas_w = src.width() + 2 * width;
    let canvas_h = src.height() + 2 * width;
    if canvas_w == 0 || canvas_h == 0 {
        return Ok(PixelBuffer::blank(canvas_w, canvas_h, depth, src.has_alpha()));
    }

    let texture = tiled_texture(tile, canvas_w, canvas_h);
    let first = first_width.min(width);
    let second = second_width.min(width);
    let (outer, inner) = (first_color.to_pixel(depth), second_color.to_pixel(depth));
    let inset = (width - second) as i64;

    compose_rows(src, width, progress, |out, y| {
        for x in 0..canvas_w {
            let p = texture.get_pixel(x, y as u32);
            out.set_pixel(x, y as u32, Rgba8::new(p[0], p[1], p[2], p[3]).to_pixel(depth));
        }
        frame_row(out, y, 0, 0, canvas_w, canvas_h, first, outer);
        frame_row(
            out,
            y,
            inset,
            inset,
            src.width() + 2 * second,
            src.height() + 2 * second,
            second,
            inner,
        );
    })
}

/// Repeat `tile` in whole copies until it covers the canvas, then scale
/// the result to exactly the canvas size.
fn tiled_texture(tile: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (tw, th) = tile.dimensions();
    let across = width.div_ceil(tw);
    let down = height.div_ceil(th);
    trace!(across, down, tile_width = tw, tile_height = th, "tiling pattern");

    let mut covered = RgbaImage::new(across * tw, down * th);
    for j in 0..down {
        for i in 0..across {
            imageops::replace(&mut covered, tile, (i * tw) as i64, (j * th) as i64);
        }
    }

    if covered.dimensions() == (width, height) {
        covered
    } else {
        imageops::resize(&covered, width, height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BitDepth, Pixel};
    use crate::task::CancelToken;
    use image::Rgba;

    fn checker_tile() -> RgbaImage {
        RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([100, 100, 100, 255])
            }
        })
    }

    fn gray(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, BitDepth::Eight, true, Pixel::new(50, 60, 70, 255))
    }

    fn quiet() -> Progress<'static> {
        Progress::unobserved()
    }

    #[test]
    fn test_pattern_layout() {
        let src = gray(4, 2);
        // 4 + 2*4 = 12 and 2 + 2*4 = 10 are whole multiples of the tile.
        let out = pattern(
            &src,
            &checker_tile(),
            4,
            Rgba8::opaque(255, 0, 0),
            1,
            Rgba8::opaque(0, 0, 255),
            2,
            &mut quiet(),
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (12, 10));

        // Outer line.
        assert_eq!(out.pixel(0, 0), Pixel::new(255, 0, 0, 255));
        assert_eq!(out.pixel(11, 5), Pixel::new(255, 0, 0, 255));
        // Texture between the two lines.
        assert_eq!(out.pixel(1, 1), Pixel::new(200, 200, 200, 255));
        assert_eq!(out.pixel(2, 1), Pixel::new(100, 100, 100, 255));
        // Inner line, two pixels wide, hugging the image.
        assert_eq!(out.pixel(2, 2), Pixel::new(0, 0, 255, 255));
        assert_eq!(out.pixel(3, 5), Pixel::new(0, 0, 255, 255));
        assert_eq!(out.pixel(9, 7), Pixel::new(0, 0, 255, 255));
        // Image untouched.
        assert_eq!(out.pixel(4, 4), Pixel::new(50, 60, 70, 255));
        assert_eq!(out.pixel(7, 5), Pixel::new(50, 60, 70, 255));
    }

    #[test]
    fn test_line_widths_clamp_to_border() {
        let src = gray(2, 2);
        let tile = checker_tile();
        let out = pattern(&src, &tile, 1, Rgba8::WHITE, 5, Rgba8::BLACK, 5, &mut quiet()).unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
        // The inner line is drawn last and covers the whole band.
        assert_eq!(out.pixel(0, 0), Pixel::new(0, 0, 0, 255));
        assert_eq!(out.pixel(1, 1), Pixel::new(50, 60, 70, 255));
    }

    #[test]
    fn test_texture_scaled_to_canvas() {
        let tile = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let src = PixelBuffer::filled(3, 2, BitDepth::Sixteen, false, Pixel::new(1, 2, 3, 0));
        let out = pattern(&src, &tile, 3, Rgba8::WHITE, 0, Rgba8::WHITE, 0, &mut quiet()).unwrap();
        assert_eq!((out.width(), out.height()), (9, 8));
        assert_eq!(out.depth(), BitDepth::Sixteen);
        assert_eq!(out.pixel(0, 0), Pixel::new(10 * 257, 20 * 257, 30 * 257, 65535));
        assert_eq!(out.pixel(4, 3), Pixel::new(1, 2, 3, 65535));
    }

    #[test]
    fn test_empty_tile_is_unavailable() {
        let err = pattern(
            &gray(2, 2),
            &RgbaImage::new(0, 0),
            2,
            Rgba8::WHITE,
            1,
            Rgba8::WHITE,
            1,
            &mut quiet(),
        );
        assert!(matches!(err, Err(FilterError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_pattern_stops_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut progress = Progress::with_cancel(cancel);
        let tile = checker_tile();
        let result = pattern(&gray(4, 4), &tile, 2, Rgba8::WHITE, 1, Rgba8::BLACK, 1, &mut progress);
        assert!(matches!(result, Err(FilterError::Cancelled)));
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = PatternDirectory::new(dir.path());

        assert!(matches!(
            patterns.load(BorderPattern::Wood),
            Err(FilterError::ResourceUnavailable(_))
        ));

        checker_tile().save(patterns.path_for(BorderPattern::Wood)).unwrap();
        let tile = patterns.load(BorderPattern::Wood).unwrap();
        assert_eq!(tile, checker_tile());
        assert!(patterns
            .path_for(BorderPattern::Granite)
            .ends_with("granit-pattern.png"));
    }

    #[test]
    fn test_decode_pattern_bytes() {
        let mut bytes = Vec::new();
        checker_tile()
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(decode_pattern(&bytes).unwrap(), checker_tile());
        assert!(matches!(
            decode_pattern(b"not an image"),
            Err(FilterError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG broken").unwrap();
        assert!(matches!(
            load_pattern_file(&path),
            Err(FilterError::ResourceUnavailable(_))
        ));
    }
}
