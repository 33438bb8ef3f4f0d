use crate::core::{Price, Quantity};
use crate::instrument::{CurrencyCode, ExchangeId, Instrument, ProductType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One row of the instruments CSV (§6): the on-disk representation of an
/// [`Instrument`] before tick/lot sizes are converted to fixed-point.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentCsvRecord {
    pub id: i32,
    pub symbol: String,
    pub exchange: ExchangeId,
    pub product_type: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub denomination_currency: String,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
    pub multiplier: Decimal,
    pub min_order_size: Decimal,
}

impl InstrumentCsvRecord {
    /// Converts this record into an [`Instrument`], resolving the product
    /// type string and applying `quanto_exceptions`.
    pub fn into_instrument(
        self,
        quanto_exceptions: &std::collections::HashSet<(ExchangeId, CurrencyCode)>,
    ) -> Result<Instrument, InvalidProductType> {
        let product_type = match self.product_type.as_str() {
            "spot" => ProductType::Spot,
            "perpetual_future" => ProductType::PerpetualFuture,
            "future" => ProductType::Future,
            other => return Err(InvalidProductType(other.to_string())),
        };

        Ok(Instrument::new(
            self.id,
            self.symbol,
            self.exchange,
            product_type,
            CurrencyCode::new(&self.base_currency),
            CurrencyCode::new(&self.quote_currency),
            CurrencyCode::new(&self.denomination_currency),
            Price::from_decimal(self.tick_size),
            Quantity::from_decimal(self.lot_size),
            Price::from_decimal(self.multiplier),
            Quantity::from_decimal(self.min_order_size),
            quanto_exceptions,
        ))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized product type '{0}' (expected spot, perpetual_future, or future)")]
pub struct InvalidProductType(pub String);

/// Fair-value model selection for the quoting engine (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FvModel {
    Mid,
    MicroPrice,
    WeightedMid,
}

/// Which resting orders the quoting engine is willing to let trade against
/// an aggressive order on the source book (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitLogic {
    AllowAll,
    NoCross,
    MakerOnly,
}

/// Order type the hedger submits to the hedge exchange (§5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeOrderType {
    Market,
    Limit,
}

/// Per-instrument quoting configuration, loaded at startup and updatable
/// at runtime without a rebuild (§9 Open Question decision).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotingParameters {
    /// The instrument the ladder is quoted on.
    pub instrument_id: i32,
    /// The instrument whose book supplies the fair value.
    pub source_instrument_id: i32,
    /// Identifies this ladder's row in the book ledger.
    pub book_name: String,
    pub fv_model: FvModel,
    pub hit_logic: HitLogic,
    /// Half-spread in basis points of fair value.
    pub spread_bp: Decimal,
    /// Quote skew applied per unit of net position, in basis points.
    pub skew_bp_per_unit: Decimal,
    /// Price gap between adjacent ladder levels, in basis points: level `i`
    /// sits at `spread_bp + i * level_step_bp` from fair value. Distinct
    /// from `requote_threshold_bp`, which gates whether a resting order at
    /// a fixed level is replaced, not how far apart the levels themselves
    /// are.
    pub level_step_bp: Decimal,
    /// Number of price levels quoted per side.
    pub max_quote_levels: usize,
    /// Quantity quoted at every ladder level, before lot-size rounding.
    pub quote_size: Quantity,
    /// Fair-value move (in basis points) required before a resting quote
    /// is replaced rather than left in place.
    pub requote_threshold_bp: Decimal,
    /// Rolling window over which cumulative fills are tracked for
    /// throttling (§4.6).
    pub throttle_window: Duration,
    /// Maximum filled quantity allowed within `throttle_window` before
    /// quoting on that side pauses.
    pub max_fill_qty_per_window: Quantity,
    /// Expected interval between source-book updates, in milliseconds.
    /// Drives the `StaleSourceBreaker` timeout (§4.4.1): `2x` this value,
    /// falling back to a 500ms baseline when unset.
    pub expected_update_interval_ms: Option<u64>,
}

/// Per-instrument hedging configuration (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgingParameters {
    /// The quoting engine instrument whose fills this hedger offsets.
    pub quoting_instrument_id: i32,
    /// The instrument hedge orders are submitted on.
    pub hedge_instrument_id: i32,
    pub hedge_exchange: ExchangeId,
    pub hedge_order_type: HedgeOrderType,
    /// Largest single hedge order; larger net exposure is sliced (§5.3).
    pub max_order_size: Quantity,
    /// Acceptable slippage in basis points for a market hedge order.
    pub slippage_bp: Decimal,
}

/// Venue API credentials, resolved from environment variables rather than
/// committed to configuration files.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Reads `{PREFIX}_API_KEY` / `{PREFIX}_API_SECRET`, e.g.
    /// `Credentials::from_env("BINANCE")` reads `BINANCE_API_KEY`.
    pub fn from_env(prefix: &str) -> Result<Self, CredentialsError> {
        let key_var = format!("{prefix}_API_KEY");
        let secret_var = format!("{prefix}_API_SECRET");
        Ok(Self {
            api_key: std::env::var(&key_var).map_err(|_| CredentialsError::Missing(key_var))?,
            api_secret: std::env::var(&secret_var)
                .map_err(|_| CredentialsError::Missing(secret_var))?,
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialsError {
    #[error("missing required environment variable {0}")]
    Missing(String),
}
