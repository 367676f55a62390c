//! Diesel price table by Brazilian state (UF).
//!
//! The table is a CSV with one row per state. Header names are matched
//! case-insensitively against a small set of synonyms so files from
//! different price surveys load without editing.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Average pump price for a state pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieselPriceQuote {
    pub uf_origin: String,
    pub uf_destination: String,
    pub price_origin: Option<f64>,
    pub price_destination: Option<f64>,
    pub average_brl_l: f64,
    /// True when one side was missing and the other side's price was used.
    pub fallback_used: bool,
}

/// Diesel prices keyed by upper-case UF code.
#[derive(Debug, Clone, Default)]
pub struct DieselPriceTable {
    prices: HashMap<String, f64>,
    source: Option<PathBuf>,
}

impl DieselPriceTable {
    /// Load a CSV price table from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened, otherwise the
    /// errors of [`DieselPriceTable::from_reader`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut table = Self::from_reader(file)?;
        table.source = Some(path.to_path_buf());
        info!(path = %path.display(), states = table.len(), "loaded diesel price table");
        Ok(table)
    }

    /// Parse a CSV price table. The state column may be named `uf` or
    /// `state`; the price column `price_brl_l`, `price`, `diesel_price_brl_l`
    /// or `price_brl`. Decimal commas are accepted, unparsable rows are
    /// skipped with a warning and the first row for a state wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DieselPriceValidation`] when a required column is
    /// missing or a price is negative.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| Error::DieselPriceValidation {
                message: format!("failed to read diesel price headers: {err}"),
            })?
            .clone();

        let normalize = |s: &str| s.trim().to_ascii_lowercase();
        let normalized_headers: Vec<String> = headers.iter().map(normalize).collect();

        let synonyms: &[(&str, &[&str])] = &[
            ("uf", &["uf", "state"]),
            (
                "price",
                &["price_brl_l", "price", "diesel_price_brl_l", "price_brl"],
            ),
        ];

        let mut index_map: BTreeMap<&str, usize> = BTreeMap::new();
        for (canon, alts) in synonyms {
            if let Some(idx) = alts
                .iter()
                .find_map(|alt| normalized_headers.iter().position(|h| h == alt))
            {
                index_map.insert(*canon, idx);
            }
        }

        let (Some(&uf_idx), Some(&price_idx)) = (index_map.get("uf"), index_map.get("price"))
        else {
            return Err(Error::DieselPriceValidation {
                message: format!(
                    "diesel price table needs a state and a price column. Available: {}",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            });
        };

        let mut prices = HashMap::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let uf = record.get(uf_idx).unwrap_or_default().trim().to_uppercase();
            let raw_price = record.get(price_idx).unwrap_or_default().trim();
            if uf.is_empty() {
                continue;
            }
            let Ok(price) = raw_price.replace(',', ".").parse::<f64>() else {
                warn!(row = row + 2, uf = %uf, value = raw_price, "skipping unparsable diesel price");
                continue;
            };
            if !price.is_finite() || price < 0.0 {
                return Err(Error::DieselPriceValidation {
                    message: format!("price for {uf} must be finite and non-negative, got {price}"),
                });
            }
            prices.entry(uf).or_insert(price);
        }

        Ok(Self {
            prices,
            source: None,
        })
    }

    /// Price for a single state.
    pub fn price_for(&self, uf: &str) -> Option<f64> {
        self.prices.get(&uf.trim().to_uppercase()).copied()
    }

    /// Average of the two states' prices, falling back to whichever side exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DieselPriceUnavailable`] when neither state is listed.
    pub fn average_for(&self, uf_origin: &str, uf_destination: &str) -> Result<DieselPriceQuote> {
        let uf_origin = uf_origin.trim().to_uppercase();
        let uf_destination = uf_destination.trim().to_uppercase();
        let price_origin = self.price_for(&uf_origin);
        let price_destination = self.price_for(&uf_destination);

        let (average_brl_l, fallback_used) = match (price_origin, price_destination) {
            (Some(o), Some(d)) => ((o + d) / 2.0, false),
            (Some(p), None) | (None, Some(p)) => (p, true),
            (None, None) => {
                return Err(Error::DieselPriceUnavailable {
                    uf_origin,
                    uf_destination,
                })
            }
        };

        if fallback_used {
            warn!(
                uf_origin = %uf_origin,
                uf_destination = %uf_destination,
                average_brl_l,
                "diesel price missing for one state; using the other"
            );
        }

        Ok(DieselPriceQuote {
            uf_origin,
            uf_destination,
            price_origin,
            price_destination,
            average_brl_l,
            fallback_used,
        })
    }

    /// Number of states with a price.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// File the table was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
