pub mod fs;
pub mod gateway;
pub mod memory;
pub mod migrations;
pub mod presenters;
pub mod raster;
pub mod sqlite;

pub use fs::{read_source_image, write_output, SystemClock};
pub use gateway::{GatewayConfig, HttpImageEditGateway, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use memory::InMemoryStateStore;
pub use presenters::{present_history_row, present_tool_output, present_usage};
pub use raster::ImageCrateRaster;
pub use sqlite::SqliteStateStore;
