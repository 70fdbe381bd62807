//! Cross-series joins and derived metrics.
//!
//! Joins are strictly inner: a record is emitted only when both sides have
//! a value for the shared key. Missing years produce no output — never
//! interpolation or forward-filling.

use std::collections::BTreeMap;

use crate::ingest::{IndicatorRow, PriceRow};
use crate::rollup::EnergyMix;

/// Annualized volatility of one symbol in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityPoint {
    pub symbol: String,
    pub year: i32,
    /// Sample std-dev of daily log returns, scaled by √365.
    pub vol_ann: f64,
    /// Mean market cap over the year's observations (missing caps count 0).
    pub mcap: f64,
}

/// Per (symbol, year) volatility from daily closes. A year needs at least
/// three positive closes (two returns) to produce a point.
pub fn annual_volatility(prices: &[PriceRow]) -> Vec<VolatilityPoint> {
    let mut by_symbol: BTreeMap<&str, Vec<&PriceRow>> = BTreeMap::new();
    for price in prices {
        by_symbol.entry(price.symbol.as_str()).or_default().push(price);
    }

    let mut points = Vec::new();
    for (symbol, mut rows) in by_symbol {
        rows.sort_by_key(|r| r.date);
        let mut by_year: BTreeMap<i32, Vec<&PriceRow>> = BTreeMap::new();
        for row in rows {
            by_year.entry(row.year).or_default().push(row);
        }
        for (year, rows) in by_year {
            let closes: Vec<f64> = rows
                .iter()
                .map(|r| r.close)
                .filter(|c| c.is_finite() && *c > 0.0)
                .collect();
            if closes.len() < 3 {
                continue;
            }
            let returns: Vec<f64> = closes
                .windows(2)
                .map(|w| (w[1] / w[0]).ln())
                .filter(|r| r.is_finite())
                .collect();
            if returns.len() < 2 {
                continue;
            }
            let mean = returns.iter().sum::<f64>() / returns.len() as f64;
            let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
                / (returns.len() - 1) as f64;
            let vol_ann = variance.sqrt() * (365.0_f64).sqrt();
            let mcap =
                rows.iter().map(|r| r.marketcap.unwrap_or(0.0)).sum::<f64>() / rows.len() as f64;
            points.push(VolatilityPoint { symbol: symbol.to_string(), year, vol_ann, mcap });
        }
    }
    points
}

/// One joined (energy share, crypto volatility) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareVolPoint {
    pub year: i32,
    pub symbol: String,
    pub clean_share: f64,
    pub vol_ann: f64,
    pub mcap: f64,
}

/// Inner join of per-symbol annual volatility against the yearly clean-share
/// series. Years absent from either side are dropped; zero-volatility years
/// are too.
pub fn crypto_vs_clean_share(energy: &[EnergyMix], prices: &[PriceRow]) -> Vec<ShareVolPoint> {
    let share_by_year: BTreeMap<i32, f64> =
        energy.iter().map(|m| (m.year, m.clean_share)).collect();

    annual_volatility(prices)
        .into_iter()
        .filter(|p| p.vol_ann > 0.0)
        .filter_map(|p| {
            share_by_year.get(&p.year).map(|clean_share| ShareVolPoint {
                year: p.year,
                symbol: p.symbol,
                clean_share: *clean_share,
                vol_ann: p.vol_ann,
                mcap: p.mcap,
            })
        })
        .collect()
}

/// First-to-last growth of one symbol's market cap.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolGrowth {
    pub symbol: String,
    pub start_year: i32,
    pub end_year: i32,
    pub start_mcap: f64,
    pub end_mcap: f64,
    /// `(last - first) / first`, as a fraction.
    pub growth: f64,
}

/// Growth between the first and last observed year per symbol, ranked
/// descending. Symbols with fewer than two observations, or with a
/// non-positive starting value, are excluded rather than producing
/// infinities.
pub fn growth_by_symbol(points: &[ShareVolPoint]) -> Vec<SymbolGrowth> {
    let mut by_symbol: BTreeMap<&str, Vec<&ShareVolPoint>> = BTreeMap::new();
    for point in points {
        by_symbol.entry(point.symbol.as_str()).or_default().push(point);
    }

    let mut growth: Vec<SymbolGrowth> = by_symbol
        .into_iter()
        .filter_map(|(symbol, mut rows)| {
            rows.sort_by_key(|p| p.year);
            let (first, last) = (rows.first()?, rows.last()?);
            if rows.len() < 2 || first.mcap <= 0.0 {
                return None;
            }
            Some(SymbolGrowth {
                symbol: symbol.to_string(),
                start_year: first.year,
                end_year: last.year,
                start_mcap: first.mcap,
                end_mcap: last.mcap,
                growth: (last.mcap - first.mcap) / first.mcap,
            })
        })
        .collect();
    growth.sort_by(|a, b| b.growth.total_cmp(&a.growth));
    growth
}

/// One country-year with both indicator values present.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGdpPoint {
    pub year: i32,
    pub energy_per_capita: f64,
    pub gdp_per_capita: f64,
}

/// Inner join of a country's "Energy use" series against its "GDP per
/// capita" series on year, ascending. Years missing from either series
/// produce no point.
pub fn energy_vs_gdp(rows: &[IndicatorRow], country: &str) -> Vec<EnergyGdpPoint> {
    let pick = |needle: &str| -> BTreeMap<i32, f64> {
        rows.iter()
            .filter(|r| r.country == country && r.series.contains(needle))
            .map(|r| (r.year, r.value))
            .collect()
    };
    let energy_use = pick("Energy use");
    let gdp = pick("GDP per capita");

    energy_use
        .into_iter()
        .filter_map(|(year, energy_per_capita)| {
            let gdp_per_capita = *gdp.get(&year)?;
            (energy_per_capita > 0.0 && gdp_per_capita > 0.0).then_some(EnergyGdpPoint {
                year,
                energy_per_capita,
                gdp_per_capita,
            })
        })
        .collect()
}
