//! Data models for signals, positions, candles, portfolio stats and users.

mod candle;
mod enums;
mod position;
mod signal;
mod stats;
pub mod timestamp;
mod user;

pub use candle::{validate_series, Candle, DeleteResult, ImportResult};
pub use enums::{
    exit_reason_label, Direction, DirectionMetadata, ExitReason, ParseEnumError, PositionStatus,
    Timeframe, TradingMode,
};
pub use position::{
    ClosePositionRequest, ExecutePositionRequest, LegacyPosition, OpenPositionRequest, Position,
    PositionDto,
};
pub use signal::{LegacySignal, Signal, SignalDto, SignalRequest, TradeLevels};
pub use stats::{win_rate_tone, PortfolioStats};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, User, ROLE_ADMIN};
