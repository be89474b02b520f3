mod data_url;
mod error;
mod history;
mod presets;
mod raster;
mod usage;

pub use data_url::DataUrl;
pub use error::DomainError;
pub use history::{
    estimate_encoded_size, push_newest, HistoryEntry, NewHistoryEntry, HISTORY_CAPACITY, UNTITLED,
};
pub use presets::{
    center_crop, passport_placement, BgColor, CropRatio, CropRect, PassportSize, Placement, Rgb,
    BG_COLORS, MAX_PASSPORT_DPI, PASSPORT_DPI, PASSPORT_SIZES,
};
pub use raster::{
    fit_height, surface_fits, EncodedImage, ImageInfo, OutputFormat, Quality, TransformSpec,
    DEFAULT_COMPRESS_QUALITY, DEFAULT_QUALITY, LOSSLESS_QUALITY, MAX_SURFACE_PIXELS,
};
pub use usage::{
    QuotaPolicy, QuotaStatus, UsageStats, DEFAULT_AI_CALL_LIMIT, DEFAULT_QUOTA_WINDOW_MS,
};
