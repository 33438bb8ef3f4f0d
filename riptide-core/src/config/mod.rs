//! Runtime configuration: the instruments table and per-instrument
//! quoting/hedging parameters.
//!
//! Everything here is plain, serde-deserializable data rather than
//! Cargo-feature flags: a multi-venue platform onboards a new instrument
//! by editing the instruments CSV and restarting the relevant quoting
//! engine, not by recompiling the binary.

pub mod types;

pub use types::{
    Credentials, CredentialsError, FvModel, HedgeOrderType, HedgingParameters, HitLogic,
    InstrumentCsvRecord, InvalidProductType, QuotingParameters,
};

use crate::instrument::{CurrencyCode, ExchangeId, InstrumentRepository};
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

/// Loads the instruments table from a CSV file (§6), rejecting duplicate
/// `(market, symbol, type)` triples as they are parsed.
pub fn load_instruments_csv<P: AsRef<Path>>(
    path: P,
    quanto_exceptions: &HashSet<(ExchangeId, CurrencyCode)>,
) -> anyhow::Result<InstrumentRepository> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening instruments CSV at {}", path.display()))?;
    let mut repository = InstrumentRepository::new();

    for result in reader.deserialize() {
        let record: InstrumentCsvRecord = result.context("parsing instrument CSV row")?;
        let instrument = record
            .into_instrument(quanto_exceptions)
            .context("resolving instrument product type")?;
        repository
            .insert(instrument)
            .context("inserting instrument into repository")?;
    }

    Ok(repository)
}
