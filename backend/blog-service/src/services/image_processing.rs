/// Profile picture storage
/// Accepts JPEG and PNG uploads, shrinks them to fit 200x200 and writes them
/// under a random file name into the profile picture directory.
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bounding box for stored profile pictures
pub const PROFILE_PICTURE_SIZE: u32 = 200;

/// Accepted picture file extensions
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "png"];

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    #[error("File size exceeds limit: {0} bytes (max: {1} bytes)")]
    FileSizeTooLarge(usize, usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

/// Lower-cased extension of `filename` when it is an accepted picture type
pub fn picture_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Resize image to fit within max_width x max_height while preserving aspect ratio
fn resize_image(img: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    let width_ratio = max_width as f32 / width as f32;
    let height_ratio = max_height as f32 / height as f32;
    let ratio = width_ratio.min(height_ratio);

    // If image is already smaller than target, don't upscale
    if ratio >= 1.0 {
        return img.clone();
    }

    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, FilterType::Lanczos3)
}

fn random_file_name(ext: &str) -> String {
    format!("{}.{}", hex::encode(rand::random::<[u8; 8]>()), ext)
}

fn store(bytes: &[u8], ext: &str, path: &Path) -> Result<(), ImageProcessingError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ImageProcessingError::InvalidFormat(e.to_string()))?;
    let thumbnail = resize_image(&img, PROFILE_PICTURE_SIZE, PROFILE_PICTURE_SIZE);

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    match ext {
        // JPEG doesn't support transparency
        "jpg" => DynamicImage::ImageRgb8(thumbnail.to_rgb8()).save_with_format(path, ImageFormat::Jpeg)?,
        _ => thumbnail.save_with_format(path, ImageFormat::Png)?,
    }

    Ok(())
}

/// Store an uploaded profile picture and return its new file name.
///
/// The name is 16 random hex characters plus the original extension.
pub async fn save_profile_picture(
    dir: &Path,
    original_filename: &str,
    bytes: Vec<u8>,
) -> Result<String, ImageProcessingError> {
    let ext = picture_extension(original_filename).ok_or_else(|| {
        ImageProcessingError::InvalidFormat(format!(
            "File does not have an approved extension: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    let file_name = random_file_name(&ext);
    let path: PathBuf = dir.join(&file_name);

    tokio::task::spawn_blocking(move || store(&bytes, &ext, &path))
        .await
        .map_err(|e| {
            ImageProcessingError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
        })??;

    tracing::debug!(file_name = %file_name, "profile picture stored");
    Ok(file_name)
}

/// Delete a stored picture that never made it onto a profile
pub async fn remove_profile_picture(dir: &Path, file_name: &str) {
    if let Err(e) = tokio::fs::remove_file(dir.join(file_name)).await {
        tracing::warn!(file_name = %file_name, error = %e, "failed to remove unused profile picture");
    }
}
