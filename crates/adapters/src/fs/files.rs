use std::fs;
use std::path::Path;

use image::ImageFormat;
use pixatools_application::{ApplicationError, SourceImage};
use pixatools_domain::DataUrl;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// Reads an image file into a data url, sniffing the MIME type from its
/// content first and its extension second.
pub fn read_source_image(path: &Path) -> Result<SourceImage, ApplicationError> {
    let bytes = fs::read(path)
        .map_err(|error| ApplicationError::Io(format!("{}: {error}", path.display())))?;
    if bytes.is_empty() {
        return Err(ApplicationError::InvalidInput(format!(
            "{} is empty",
            path.display()
        )));
    }

    let mime = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME);
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(SourceImage {
        data_url: DataUrl::from_bytes(mime, &bytes).to_string(),
        name,
    })
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ApplicationError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|error| ApplicationError::Io(error.to_string()))?;
        }
    }
    fs::write(path, bytes)
        .map_err(|error| ApplicationError::Io(format!("{}: {error}", path.display())))
}
