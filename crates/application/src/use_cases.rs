use pixatools_domain::{CropRatio, OutputFormat, PassportSize, Quality, Rgb, PASSPORT_DPI};

/// What a raster tool does when decoding or encoding fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    #[default]
    Fail,
    ReturnOriginal,
}

/// An input image as a data url (or bare base64 payload) plus a display name.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub data_url: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RemoveBackgroundCommand {
    pub source: SourceImage,
}

#[derive(Debug, Clone)]
pub struct EnhanceCommand {
    pub source: SourceImage,
}

#[derive(Debug, Clone)]
pub struct PassportCommand {
    pub source: SourceImage,
    pub size: PassportSize,
    pub background: Rgb,
    pub dpi: u32,
    /// When false the source is treated as an existing cutout and no AI call is made.
    pub remove_background: bool,
}

impl PassportCommand {
    pub fn new(source: SourceImage, size: PassportSize, background: Rgb) -> Self {
        Self {
            source,
            size,
            background,
            dpi: PASSPORT_DPI,
            remove_background: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResizeCommand {
    pub source: SourceImage,
    pub width: u32,
    /// `None` locks the aspect ratio of the source.
    pub height: Option<u32>,
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone)]
pub struct CompressCommand {
    pub source: SourceImage,
    pub quality: Quality,
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone)]
pub struct ConvertCommand {
    pub source: SourceImage,
    pub format: OutputFormat,
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone)]
pub struct CropCommand {
    pub source: SourceImage,
    pub ratio: CropRatio,
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct ListHistoryQuery;

#[derive(Debug, Clone, Default)]
pub struct ClearHistoryCommand;

#[derive(Debug, Clone)]
pub struct FindHistoryQuery {
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct UsageQuery;
