//! Versioned rate storage and the single resolution algorithm.
//!
//! Lookup order for `base -> quote` as of a date:
//! 1. Identity (same currency, rate 1)
//! 2. Direct: latest active `base -> quote` version with `effective_from <= date`
//! 3. Inverse: latest active `quote -> base` version, inverted
//! 4. Cross rate through the home currency, each leg direct or inverse
//!
//! Derived rates are carried as a fraction until the end and rounded once.

use chrono::{DateTime, NaiveDate, Utc};
use kasa_shared::types::{Currency, RateId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::conversion::round_rate;
use super::exchange::{ExchangeRate, RateQuote, RateSource};

/// One leg of a resolution path, kept as `numerator / denominator`.
#[derive(Debug, Clone, Copy)]
struct Leg {
    numerator: Decimal,
    denominator: Decimal,
    effective_from: NaiveDate,
    source: RateSource,
}

/// All rate versions of one tenant.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    versions: BTreeMap<(Currency, Currency), Vec<ExchangeRate>>,
    next_sequence: u64,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a table from stored versions.
    #[must_use]
    pub fn from_versions(rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        let mut table = Self::new();
        for rate in rates {
            table.insert(rate);
        }
        table
    }

    /// Builds the next version without inserting it.
    #[must_use]
    pub fn stage(
        &self,
        base: Currency,
        quote: Currency,
        rate: Decimal,
        effective_from: NaiveDate,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> ExchangeRate {
        ExchangeRate {
            id: RateId::new(),
            base,
            quote,
            rate,
            effective_from,
            note,
            is_active: true,
            sequence: self.next_sequence,
            created_at: now,
        }
    }

    /// Inserts a version. Existing versions are never overwritten.
    pub fn insert(&mut self, rate: ExchangeRate) {
        self.next_sequence = self.next_sequence.max(rate.sequence + 1);
        self.versions
            .entry((rate.base, rate.quote))
            .or_default()
            .push(rate);
    }

    /// Finds a version by id.
    #[must_use]
    pub fn get(&self, id: RateId) -> Option<&ExchangeRate> {
        self.versions.values().flatten().find(|r| r.id == id)
    }

    /// Replaces a stored version in place (activation changes only).
    pub fn replace(&mut self, rate: ExchangeRate) -> bool {
        let Some(slot) = self
            .versions
            .get_mut(&(rate.base, rate.quote))
            .and_then(|list| list.iter_mut().find(|r| r.id == rate.id))
        else {
            return false;
        };
        *slot = rate;
        true
    }

    /// Iterates every stored version, active or not.
    pub fn versions(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.versions.values().flatten()
    }

    /// Number of stored versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    /// Returns true if no version is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latest active direct version valid on `as_of`.
    ///
    /// Versions sharing an `effective_from` are ordered by insertion.
    #[must_use]
    pub fn latest(&self, base: Currency, quote: Currency, as_of: NaiveDate) -> Option<&ExchangeRate> {
        self.versions
            .get(&(base, quote))?
            .iter()
            .filter(|r| r.is_active && r.effective_from <= as_of)
            .max_by_key(|r| (r.effective_from, r.sequence))
    }

    /// Versions of a pair, newest first.
    #[must_use]
    pub fn history(&self, base: Currency, quote: Currency) -> Vec<ExchangeRate> {
        let mut list = self.versions.get(&(base, quote)).cloned().unwrap_or_default();
        list.sort_by(|a, b| {
            b.effective_from
                .cmp(&a.effective_from)
                .then(b.sequence.cmp(&a.sequence))
        });
        list
    }

    fn leg(&self, base: Currency, quote: Currency, as_of: NaiveDate) -> Option<Leg> {
        if let Some(direct) = self.latest(base, quote, as_of) {
            return Some(Leg {
                numerator: direct.rate,
                denominator: Decimal::ONE,
                effective_from: direct.effective_from,
                source: RateSource::Direct,
            });
        }
        self.latest(quote, base, as_of).map(|inverse| Leg {
            numerator: Decimal::ONE,
            denominator: inverse.rate,
            effective_from: inverse.effective_from,
            source: RateSource::Inverse,
        })
    }

    /// Resolves `base -> quote` as of a date.
    ///
    /// Returns `None` when no path exists or the derived rate overflows.
    #[must_use]
    pub fn resolve(
        &self,
        base: Currency,
        quote: Currency,
        as_of: NaiveDate,
        home: Currency,
        scale: u32,
    ) -> Option<RateQuote> {
        if base == quote {
            return Some(RateQuote::identity(base, as_of));
        }

        if let Some(leg) = self.leg(base, quote, as_of) {
            let rate = match leg.source {
                RateSource::Direct => leg.numerator,
                _ => round_rate(leg.numerator.checked_div(leg.denominator)?, scale),
            };
            return Some(RateQuote {
                base,
                quote,
                rate,
                source: leg.source,
                effective_from: leg.effective_from,
            });
        }

        if base == home || quote == home {
            return None;
        }

        let to_home = self.leg(base, home, as_of)?;
        let from_home = self.leg(home, quote, as_of)?;
        let numerator = to_home.numerator.checked_mul(from_home.numerator)?;
        let denominator = to_home.denominator.checked_mul(from_home.denominator)?;
        let rate = round_rate(numerator.checked_div(denominator)?, scale);
        if rate <= Decimal::ZERO {
            return None;
        }

        Some(RateQuote {
            base,
            quote,
            rate,
            source: RateSource::CrossRate,
            effective_from: to_home.effective_from.min(from_home.effective_from),
        })
    }
}

/// A snapshot of a pair's versions, newest first, capped at `limit`.
///
/// Iteration is lazy and can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct RateHistory {
    versions: Vec<ExchangeRate>,
    limit: usize,
}

impl RateHistory {
    pub(crate) fn new(versions: Vec<ExchangeRate>, limit: usize) -> Self {
        Self { versions, limit }
    }

    /// Iterates the versions from the newest.
    pub fn iter(&self) -> std::iter::Take<std::slice::Iter<'_, ExchangeRate>> {
        self.versions.iter().take(self.limit)
    }

    /// Number of versions the iterator yields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len().min(self.limit)
    }

    /// Returns true if the iterator yields nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a RateHistory {
    type Item = &'a ExchangeRate;
    type IntoIter = std::iter::Take<std::slice::Iter<'a, ExchangeRate>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
