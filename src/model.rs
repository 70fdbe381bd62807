use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::Classifier;
use crate::error::DashError;
use crate::ingest::{
    self, EnergyRow, IndicatorRow, LoadSummary, MissionRow, OrderRow, PriceRow, ReadOptions,
};
use crate::join::{self, EnergyGdpPoint, ShareVolPoint, SymbolGrowth};
use crate::rollup::{
    self, AreaCleanShare, CompanyLaunches, ContinentLoad, ContinentShare, EnergyMix,
    MonthlyLaunches, MonthlySales, RegionSales, RetailTotals,
};

/// Application-state object owned by the composition root.
///
/// Holds one immutable row set per dataset. Each load replaces the whole
/// set; a failed load leaves the slot empty, so accessors keep returning
/// `NotLoaded` and dependent views render a "no data" state instead of
/// operating on stale aggregates. Aggregation methods are thin wrappers
/// over the pure functions in [`rollup`](crate::rollup) and
/// [`join`](crate::join).
pub struct DashModel {
    base_path: PathBuf,
    options: ReadOptions,
    classifier: Classifier,
    energy: Option<Vec<EnergyRow>>,
    prices: Option<Vec<PriceRow>>,
    indicators: Option<Vec<IndicatorRow>>,
    orders: Option<Vec<OrderRow>>,
    missions: Option<Vec<MissionRow>>,
}

impl DashModel {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            options: ReadOptions::default(),
            classifier: Classifier::default(),
            energy: None,
            prices: None,
            indicators: None,
            orders: None,
            missions: None,
        }
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    fn read_source(&self, filename: &str) -> Result<String, DashError> {
        let path = self.base_path.join(filename);
        debug!(path = %path.display(), "reading source file");
        Ok(std::fs::read_to_string(&path)?)
    }

    // ── Data loading ────────────────────────────────────────────────────────

    pub fn load_energy(&mut self, filename: &str) -> Result<LoadSummary, DashError> {
        self.energy = None;
        let text = self.read_source(filename)?;
        let (rows, summary) = ingest::energy_rows_from_str(&text, &self.options)?;
        self.energy = Some(rows);
        Ok(summary)
    }

    pub fn load_prices(&mut self, filename: &str) -> Result<LoadSummary, DashError> {
        self.prices = None;
        let text = self.read_source(filename)?;
        let (rows, summary) = ingest::price_rows_from_str(&text, &self.options)?;
        self.prices = Some(rows);
        Ok(summary)
    }

    pub fn load_indicators(&mut self, filename: &str) -> Result<LoadSummary, DashError> {
        self.indicators = None;
        let text = self.read_source(filename)?;
        let (rows, summary) = ingest::indicator_rows_from_str(&text, &self.options)?;
        self.indicators = Some(rows);
        Ok(summary)
    }

    pub fn load_missions(&mut self, filename: &str) -> Result<LoadSummary, DashError> {
        self.missions = None;
        let text = self.read_source(filename)?;
        let (rows, summary) = ingest::mission_rows_from_str(&text, &self.options)?;
        self.missions = Some(rows);
        Ok(summary)
    }

    /// Load the three retail files together: the returns and users lookups
    /// are joined into the order rows at ingestion.
    pub fn load_retail(
        &mut self,
        orders_file: &str,
        returns_file: &str,
        users_file: &str,
    ) -> Result<LoadSummary, DashError> {
        self.orders = None;
        let returns_text = self.read_source(returns_file)?;
        let users_text = self.read_source(users_file)?;
        let orders_text = self.read_source(orders_file)?;

        let returned = ingest::returned_ids_from_str(&returns_text, &self.options)?;
        let managers = ingest::region_managers_from_str(&users_text, &self.options)?;
        let (rows, summary) =
            ingest::order_rows_from_str(&orders_text, &self.options, &returned, &managers)?;
        self.orders = Some(rows);
        Ok(summary)
    }

    // ── Row access ──────────────────────────────────────────────────────────

    pub fn energy_rows(&self) -> Result<&[EnergyRow], DashError> {
        self.energy
            .as_deref()
            .ok_or_else(|| DashError::NotLoaded("energy".into()))
    }

    pub fn price_rows(&self) -> Result<&[PriceRow], DashError> {
        self.prices
            .as_deref()
            .ok_or_else(|| DashError::NotLoaded("prices".into()))
    }

    pub fn indicator_rows(&self) -> Result<&[IndicatorRow], DashError> {
        self.indicators
            .as_deref()
            .ok_or_else(|| DashError::NotLoaded("indicators".into()))
    }

    pub fn order_rows(&self) -> Result<&[OrderRow], DashError> {
        self.orders
            .as_deref()
            .ok_or_else(|| DashError::NotLoaded("orders".into()))
    }

    pub fn mission_rows(&self) -> Result<&[MissionRow], DashError> {
        self.missions
            .as_deref()
            .ok_or_else(|| DashError::NotLoaded("missions".into()))
    }

    // ── Energy aggregates ───────────────────────────────────────────────────

    pub fn energy_mix(&self) -> Result<Vec<EnergyMix>, DashError> {
        Ok(rollup::energy_mix_by_year(self.energy_rows()?, &self.classifier))
    }

    pub fn continent_shares(&self, year_min: i32) -> Result<Vec<ContinentShare>, DashError> {
        Ok(rollup::clean_share_by_continent(self.energy_rows()?, &self.classifier, year_min))
    }

    pub fn continent_load(&self, year_min: i32) -> Result<Vec<ContinentLoad>, DashError> {
        Ok(rollup::continent_production(self.energy_rows()?, &self.classifier, year_min))
    }

    pub fn top_areas(&self, n: usize, year_min: i32) -> Result<Vec<AreaCleanShare>, DashError> {
        Ok(rollup::top_areas_by_clean_share(self.energy_rows()?, &self.classifier, n, year_min))
    }

    // ── Cross-series aggregates ─────────────────────────────────────────────

    /// Crypto volatility joined against the yearly clean share; needs both
    /// the energy and prices datasets.
    pub fn crypto_share_points(&self) -> Result<Vec<ShareVolPoint>, DashError> {
        let mix = self.energy_mix()?;
        Ok(join::crypto_vs_clean_share(&mix, self.price_rows()?))
    }

    pub fn symbol_growth(&self) -> Result<Vec<SymbolGrowth>, DashError> {
        Ok(join::growth_by_symbol(&self.crypto_share_points()?))
    }

    pub fn energy_vs_gdp(&self, country: &str) -> Result<Vec<EnergyGdpPoint>, DashError> {
        Ok(join::energy_vs_gdp(self.indicator_rows()?, country))
    }

    // ── Mission aggregates ──────────────────────────────────────────────────

    pub fn monthly_launches(&self) -> Result<Vec<MonthlyLaunches>, DashError> {
        Ok(rollup::monthly_launches(self.mission_rows()?))
    }

    pub fn company_launches(&self) -> Result<Vec<CompanyLaunches>, DashError> {
        Ok(rollup::company_launches(self.mission_rows()?))
    }

    // ── Retail aggregates ───────────────────────────────────────────────────

    pub fn monthly_sales(&self) -> Result<Vec<MonthlySales>, DashError> {
        Ok(rollup::monthly_sales(self.order_rows()?))
    }

    pub fn region_sales(&self) -> Result<Vec<RegionSales>, DashError> {
        Ok(rollup::region_sales(self.order_rows()?))
    }

    pub fn retail_totals(&self) -> Result<RetailTotals, DashError> {
        Ok(rollup::retail_totals(self.order_rows()?))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
