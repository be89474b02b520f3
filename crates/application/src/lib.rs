mod error;
mod ledger;
mod ports;
mod rate_gate;
mod service;
mod use_cases;

#[cfg(test)]
mod test_support;

pub use error::ApplicationError;
pub use ledger::{HistoryLedger, HISTORY_KEY};
pub use ports::{
    Clock, ImageEditGateway, PassportCanvas, RasterEngine, RemoteImage, StateStore, StoreWrite,
};
pub use rate_gate::{RateGate, USAGE_KEY};
pub use service::{
    ApplicationService, ToolOutput, TransformOutcome, ENHANCE_INSTRUCTION, REMOTE_FAILURE_MESSAGE,
    REMOVE_BACKGROUND_INSTRUCTION,
};
pub use use_cases::{
    ClearHistoryCommand, CompressCommand, ConvertCommand, CropCommand, EnhanceCommand,
    FallbackPolicy, FindHistoryQuery, ListHistoryQuery, PassportCommand, RemoveBackgroundCommand,
    ResizeCommand, SourceImage, UsageQuery,
};
