//! Composite stage
//!
//! **[APX-CMP-010]** Produces the printable hand-out: the reference
//! photo with the QR image overlaid at a fixed bottom-left anchor. The
//! source photo's actual dimensions are read before computing the
//! offset — no fixed photo height is assumed — and the inset from the
//! bottom edge never exceeds the QR's rendered height, so the QR stays
//! strictly inside the image bounds for any aspect ratio.
//!
//! Failure here is non-fatal to publication: the AR page can exist
//! without the hand-out, but the caller is told the result is
//! degraded.

use crate::error::PublishError;
use crate::models::{part_path, ArtifactRole};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::{debug, info};

/// Placement of the QR within the photo canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrPlacement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Compute the bottom-left QR placement for a photo of the given size
///
/// The QR is scaled down (never up) so it occupies at most half the
/// photo's short side; the inset is half the rendered QR height,
/// clamped so the overlay cannot bleed past either edge.
pub fn qr_placement(photo_w: u32, photo_h: u32, qr_w: u32, qr_h: u32) -> QrPlacement {
    let max_side = (photo_w.min(photo_h) / 2).max(1);

    let (mut width, mut height) = (qr_w.max(1), qr_h.max(1));
    if width.max(height) > max_side {
        if width >= height {
            height = (height * max_side / width).max(1);
            width = max_side;
        } else {
            width = (width * max_side / height).max(1);
            height = max_side;
        }
    }

    let inset = (height / 2)
        .min(photo_h.saturating_sub(height))
        .min(photo_w.saturating_sub(width));

    QrPlacement {
        width,
        height,
        x: inset,
        y: photo_h.saturating_sub(height + inset),
    }
}

/// Overlay the session's QR image onto its reference photo
///
/// `photo_file` and `qr_file` are filenames inside `dir`. Returns the
/// composited artifact's filename. The output keeps the photo's
/// extension and dimensions.
pub fn composite(dir: &Path, photo_file: &str, qr_file: &str) -> Result<String, PublishError> {
    let photo_ext = Path::new(photo_file)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .ok_or_else(|| {
            PublishError::Composite(format!("photo file {} has no extension", photo_file))
        })?;
    let output_name = ArtifactRole::CompositedImage.filename(&photo_ext);
    let output_path = dir.join(&output_name);
    let part = part_path(dir, &output_name);

    let format = ImageFormat::from_path(&output_path)
        .map_err(|e| PublishError::Composite(format!("unsupported photo format: {}", e)))?;

    let mut photo = image::open(dir.join(photo_file))
        .map_err(|e| PublishError::Composite(format!("failed to read {}: {}", photo_file, e)))?;
    let qr = image::open(dir.join(qr_file))
        .map_err(|e| PublishError::Composite(format!("failed to read {}: {}", qr_file, e)))?;

    let placement = qr_placement(photo.width(), photo.height(), qr.width(), qr.height());
    debug!(
        photo_w = photo.width(),
        photo_h = photo.height(),
        qr_w = placement.width,
        qr_h = placement.height,
        x = placement.x,
        y = placement.y,
        "Compositing QR onto photo"
    );

    let qr = if (qr.width(), qr.height()) != (placement.width, placement.height) {
        // Nearest keeps the QR modules crisp when downscaling
        qr.resize_exact(placement.width, placement.height, FilterType::Nearest)
    } else {
        qr
    };

    image::imageops::overlay(&mut photo, &qr, placement.x as i64, placement.y as i64);

    // JPEG has no alpha channel
    let out = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(photo.to_rgb8())
    } else {
        photo
    };

    out.save_with_format(&part, format)
        .map_err(|e| PublishError::Composite(format!("failed to write hand-out: {}", e)))?;
    std::fs::rename(&part, &output_path)
        .map_err(|e| PublishError::Composite(format!("rename failed: {}", e)))?;

    info!(artifact = %output_name, "Composite complete");
    Ok(output_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn assert_inside(photo_w: u32, photo_h: u32, p: QrPlacement) {
        assert!(p.x + p.width <= photo_w, "x overflow: {:?}", p);
        assert!(p.y + p.height <= photo_h, "y overflow: {:?}", p);
    }

    #[test]
    fn test_placement_stays_inside_square_photo() {
        assert_inside(1000, 1000, qr_placement(1000, 1000, 300, 300));
    }

    #[test]
    fn test_placement_stays_inside_landscape_photo() {
        assert_inside(1600, 1200, qr_placement(1600, 1200, 300, 300));
    }

    #[test]
    fn test_placement_stays_inside_tall_photo() {
        // 9:16 and extreme cases where the QR must be scaled down
        assert_inside(900, 1600, qr_placement(900, 1600, 300, 300));
        assert_inside(90, 160, qr_placement(90, 160, 300, 300));
        assert_inside(160, 90, qr_placement(160, 90, 300, 300));
    }

    #[test]
    fn test_inset_never_exceeds_qr_height() {
        let p = qr_placement(1200, 1600, 300, 300);
        let bottom_inset = 1600 - (p.y + p.height);
        assert!(bottom_inset <= p.height);
    }

    #[test]
    fn test_qr_is_never_upscaled() {
        let p = qr_placement(4000, 4000, 100, 100);
        assert_eq!((p.width, p.height), (100, 100));
    }

    fn write_png(path: &std::path::Path, w: u32, h: u32, rgba: [u8; 4]) {
        let img = RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        img.save(path).unwrap();
    }

    #[test]
    fn test_composite_preserves_photo_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("photo.png"), 1200, 1600, [10, 20, 30, 255]);
        write_png(&dir.path().join("qrcode.png"), 300, 300, [255, 255, 255, 255]);

        let name = composite(dir.path(), "photo.png", "qrcode.png").unwrap();
        assert_eq!(name, "photo_with_qr.png");

        let out = image::open(dir.path().join(&name)).unwrap();
        assert_eq!((out.width(), out.height()), (1200, 1600));
    }

    #[test]
    fn test_composite_rejects_unreadable_qr() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("photo.png"), 400, 400, [0, 0, 0, 255]);
        std::fs::write(dir.path().join("qrcode.png"), b"not an image").unwrap();

        let err = composite(dir.path(), "photo.png", "qrcode.png").unwrap_err();
        assert_eq!(err.stage(), "composite");
        assert!(!err.is_fatal());
        assert!(!dir.path().join("photo_with_qr.png").exists());
    }

    #[test]
    fn test_composite_leaves_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("photo.png"), 400, 300, [0, 0, 0, 255]);
        write_png(&dir.path().join("qrcode.png"), 100, 100, [255, 0, 0, 255]);

        composite(dir.path(), "photo.png", "qrcode.png").unwrap();
        assert!(!dir.path().join(".photo_with_qr.png.part").exists());
    }
}
