//! Local thumbnail generation with the `image` crate.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::{ArtifactPath, PreviewError, PreviewFormat};

/// JPEG quality of generated thumbnails.
const JPEG_QUALITY: u8 = 95;

/// Resize `source` to fill exactly `width x height` and store it as the
/// JPEG artifact.
///
/// The image is scaled with Lanczos3 until it covers the box, then
/// center-cropped, so the aspect ratio is kept. Decoding and resampling run
/// on the blocking pool.
pub async fn generate_thumbnail(
    source: &Path,
    width: u32,
    height: u32,
    target: &ArtifactPath,
) -> Result<PreviewFormat, PreviewError> {
    let format = PreviewFormat::Jpeg;
    let source = source.to_path_buf();
    let scratch = target.partial_path(format);

    let rendered =
        tokio::task::spawn_blocking(move || render_jpeg(&source, width, height, &scratch)).await?;

    match rendered {
        Ok(()) => {
            target.commit(format).await?;
            Ok(format)
        }
        Err(e) => {
            target.discard(format).await;
            Err(e)
        }
    }
}

fn render_jpeg(source: &Path, width: u32, height: u32, dest: &Path) -> Result<(), PreviewError> {
    let image = image::ImageReader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| PreviewError::Source(e.to_string()))?
        .decode()
        .map_err(PreviewError::Decode)?;

    let thumbnail = image
        .resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgb8();

    let mut writer = BufWriter::new(File::create(dest)?);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(&thumbnail)
        .map_err(PreviewError::Encode)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::ArtifactState;
    use image::{ImageBuffer, Rgb, Rgba};
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        });
        img.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_generates_exact_size_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("wide.png");
        write_png(&source, 400, 100);

        let artifact = ArtifactPath::new(&source, 100, 100);
        artifact.ensure_folder().await.unwrap();

        let format = generate_thumbnail(&source, 100, 100, &artifact)
            .await
            .unwrap();
        assert_eq!(format, PreviewFormat::Jpeg);

        let path = artifact.path(PreviewFormat::Jpeg);
        let thumb = image::open(&path).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 100));
        assert!(!artifact.partial_path(format).exists());
        assert!(matches!(artifact.probe().await, ArtifactState::Ready { .. }));
    }

    #[tokio::test]
    async fn test_reads_jpeg_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photo.jpg");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(64, 48, |x, _| Rgb([x as u8, 0, 0]));
        img.save(&source).unwrap();

        let artifact = ArtifactPath::new(&source, 32, 32);
        artifact.ensure_folder().await.unwrap();
        generate_thumbnail(&source, 32, 32, &artifact).await.unwrap();

        let thumb = image::open(artifact.path(PreviewFormat::Jpeg)).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (32, 32));
    }

    #[tokio::test]
    async fn test_undecodable_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.jpg");
        std::fs::write(&source, b"definitely not a jpeg").unwrap();

        let artifact = ArtifactPath::new(&source, 50, 50);
        artifact.ensure_folder().await.unwrap();

        let result = generate_thumbnail(&source, 50, 50, &artifact).await;
        assert!(matches!(result, Err(PreviewError::Decode(_))));
        assert_eq!(artifact.probe().await, ArtifactState::Missing);
        assert!(!artifact.partial_path(PreviewFormat::Jpeg).exists());
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("gone.png");
        let artifact = ArtifactPath::new(&source, 50, 50);
        artifact.ensure_folder().await.unwrap();

        let result = generate_thumbnail(&source, 50, 50, &artifact).await;
        assert!(matches!(result, Err(PreviewError::Source(_))));
    }
}
