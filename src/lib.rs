//! dashstat: tabular aggregation for dashboard datasets.
//!
//! Ingests delimited text (energy statistics, crypto prices, development
//! indicators, retail orders, space-mission launch logs), validates rows
//! once at the boundary, and reduces them to the chart-ready records a
//! presentation layer consumes: yearly energy mixes, clean-energy shares,
//! top-N rankings, volatility joins, launch counts, and retail rollups.
//!
//! The pipeline is pure and synchronous: loaders return fresh immutable row
//! sets, aggregation functions take rows and selections as explicit
//! arguments, and nothing here touches a renderer.

pub mod classify;
pub mod error;
pub mod ingest;
pub mod join;
pub mod model;
pub mod rollup;
pub mod schema;

pub use classify::{Classifier, EnergyKind};
pub use error::DashError;
pub use ingest::{
    EnergyRow, IndicatorRow, LoadSummary, MissionRow, NumberFormat, OrderRow, PriceRow,
    ReadOptions, Separator,
};
pub use join::{EnergyGdpPoint, ShareVolPoint, SymbolGrowth, VolatilityPoint};
pub use model::DashModel;
pub use rollup::{
    AreaCleanShare, CompanyLaunches, ContinentLoad, ContinentShare, EnergyMix, MonthlyLaunches,
    MonthlySales, RegionSales, RetailTotals,
};
