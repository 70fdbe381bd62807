//! Grouping and reduction: partition validated rows by group keys and
//! reduce each partition to sums and guarded ratios.
//!
//! Temporal keys are always emitted ascending (groups live in `BTreeMap`s),
//! categorical keys in stable alphabetical order unless an explicit sort is
//! part of the operation.

use std::collections::BTreeMap;

use crate::classify::{continent_of, Classifier, EnergyKind};
use crate::ingest::{EnergyRow, MissionRow, OrderRow};

/// `numerator / denominator`, clamped to 0 when the denominator is not
/// positive. Ratios never leave this crate as NaN or infinity.
pub fn share(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

/// Interpolated quantile of an ascending-sorted slice (the d3.quantile
/// rule). `None` on an empty slice.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if p <= 0.0 || n < 2 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[n - 1]);
    }
    let i = (n - 1) as f64 * p;
    let i0 = i.floor() as usize;
    let frac = i - i0 as f64;
    Some(sorted[i0] + (sorted[i0 + 1] - sorted[i0]) * frac)
}

#[derive(Debug, Clone, Copy, Default)]
struct MixAcc {
    renew: f64,
    fossil: f64,
}

impl MixAcc {
    fn add(&mut self, kind: Option<EnergyKind>, value: f64) {
        match kind {
            Some(EnergyKind::Renewable) => self.renew += value,
            Some(EnergyKind::Fossil) => self.fossil += value,
            None => {}
        }
    }

    fn mix(&self, year: i32) -> EnergyMix {
        let total = self.renew + self.fossil;
        EnergyMix {
            year,
            sum_renew: self.renew,
            sum_fossil: self.fossil,
            total,
            clean_share: share(self.renew, total),
        }
    }
}

/// One year of the renewable/fossil mix.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMix {
    pub year: i32,
    pub sum_renew: f64,
    pub sum_fossil: f64,
    pub total: f64,
    pub clean_share: f64,
}

/// Global mix per year, ascending. Rows without a category or variable are
/// left out (they carry no classifiable signal), and years whose classified
/// total is zero are omitted.
pub fn energy_mix_by_year(rows: &[EnergyRow], classifier: &Classifier) -> Vec<EnergyMix> {
    let mut by_year: BTreeMap<i32, MixAcc> = BTreeMap::new();
    for row in rows {
        if row.category.is_empty() || row.variable.is_empty() || row.value <= 0.0 {
            continue;
        }
        let kind = classifier.classify(&row.variable, &row.subcategory);
        by_year.entry(row.year).or_default().add(kind, row.value);
    }
    by_year
        .into_iter()
        .map(|(year, acc)| acc.mix(year))
        .filter(|m| m.total > 0.0)
        .collect()
}

/// Category-agnostic yearly sum over every validated row, ascending.
/// Unclassified rows count here even though they stay out of the mix.
pub fn value_by_year(rows: &[EnergyRow]) -> Vec<(i32, f64)> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for row in rows {
        *by_year.entry(row.year).or_default() += row.value;
    }
    by_year.into_iter().collect()
}

/// Clean share per continent and year.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentShare {
    pub continent: String,
    pub year: i32,
    pub clean_share: f64,
}

/// Mix reduction keyed by (continent, year), from `year_min` on. Areas
/// outside the continent table are skipped; zero-total cells are omitted.
pub fn clean_share_by_continent(
    rows: &[EnergyRow],
    classifier: &Classifier,
    year_min: i32,
) -> Vec<ContinentShare> {
    let mut groups: BTreeMap<(&'static str, i32), MixAcc> = BTreeMap::new();
    for row in rows {
        if row.year < year_min || row.value <= 0.0 {
            continue;
        }
        let Some(continent) = continent_of(&row.area) else { continue };
        let kind = classifier.classify(&row.variable, &row.subcategory);
        groups.entry((continent, row.year)).or_default().add(kind, row.value);
    }
    groups
        .into_iter()
        .filter_map(|((continent, year), acc)| {
            let total = acc.renew + acc.fossil;
            (total > 0.0).then(|| ContinentShare {
                continent: continent.to_string(),
                year,
                clean_share: share(acc.renew, total),
            })
        })
        .collect()
}

/// Classified generation vs demand per continent and year.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentLoad {
    pub continent: String,
    pub year: i32,
    pub production: f64,
    pub demand: f64,
}

/// Production (renewable + fossil generation) against demand rows per
/// continent, from `year_min` on.
pub fn continent_production(
    rows: &[EnergyRow],
    classifier: &Classifier,
    year_min: i32,
) -> Vec<ContinentLoad> {
    let mut groups: BTreeMap<(&'static str, i32), (f64, f64)> = BTreeMap::new();
    for row in rows {
        if row.year < year_min || row.value <= 0.0 {
            continue;
        }
        let Some(continent) = continent_of(&row.area) else { continue };
        let entry = groups.entry((continent, row.year)).or_default();
        let text = format!("{} {}", row.category, row.variable).to_lowercase();
        if text.contains("demand") {
            entry.1 += row.value;
        } else if classifier.classify(&row.variable, &row.subcategory).is_some() {
            entry.0 += row.value;
        }
    }
    groups
        .into_iter()
        .filter(|(_, (production, demand))| *production > 0.0 || *demand > 0.0)
        .map(|((continent, year), (production, demand))| ContinentLoad {
            continent: continent.to_string(),
            year,
            production,
            demand,
        })
        .collect()
}

/// One area's ranked clean-share summary with its full yearly series.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaCleanShare {
    pub area: String,
    /// Clean share at the most recent year the area reports.
    pub clean_share: f64,
    pub years: Vec<EnergyMix>,
}

/// Top-N areas by latest clean share, from `year_min` on.
///
/// Small producers are gated out first: an area qualifies only when its
/// latest-year classified total reaches the 0.85 quantile of latest-year
/// totals. Ranking is by clean share descending; ties keep the stable
/// (alphabetical) group order. Returns fewer than `n` when fewer qualify.
pub fn top_areas_by_clean_share(
    rows: &[EnergyRow],
    classifier: &Classifier,
    n: usize,
    year_min: i32,
) -> Vec<AreaCleanShare> {
    let mut by_area: BTreeMap<&str, BTreeMap<i32, MixAcc>> = BTreeMap::new();
    for row in rows {
        if row.year < year_min || row.value <= 0.0 {
            continue;
        }
        let kind = classifier.classify(&row.variable, &row.subcategory);
        by_area
            .entry(row.area.as_str())
            .or_default()
            .entry(row.year)
            .or_default()
            .add(kind, row.value);
    }

    // Latest mix per area: the globally latest year when present, otherwise
    // the area's own latest.
    let last_year = by_area
        .values()
        .flat_map(|years| years.keys().copied())
        .max();
    let Some(last_year) = last_year else { return Vec::new() };

    let mut candidates: Vec<(&str, EnergyMix, &BTreeMap<i32, MixAcc>)> = Vec::new();
    for (area, years) in &by_area {
        let (year, acc) = match years.get_key_value(&last_year) {
            Some(hit) => hit,
            None => match years.iter().next_back() {
                Some(hit) => hit,
                None => continue,
            },
        };
        let latest = acc.mix(*year);
        if latest.total > 0.0 {
            candidates.push((*area, latest, years));
        }
    }

    let mut totals: Vec<f64> = candidates.iter().map(|(_, m, _)| m.total).collect();
    totals.sort_by(|a, b| a.total_cmp(b));
    let threshold = quantile(&totals, 0.85).unwrap_or(0.0);

    let mut ranked: Vec<AreaCleanShare> = candidates
        .into_iter()
        .filter(|(_, latest, _)| latest.total >= threshold)
        .map(|(area, latest, years)| AreaCleanShare {
            area: area.to_string(),
            clean_share: latest.clean_share,
            years: years.iter().map(|(y, acc)| acc.mix(*y)).collect(),
        })
        .collect();

    ranked.sort_by(|a, b| b.clean_share.total_cmp(&a.clean_share));
    ranked.truncate(n);
    ranked
}

// ── Mission rollups ─────────────────────────────────────────────────────────

/// Launch counts for one calendar month, broken down by mission status.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyLaunches {
    pub year: i32,
    pub month: u32,
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

/// Launch counts per (year, month, status), months ascending. Rows without
/// a parseable launch date carry no temporal key and are skipped here.
pub fn monthly_launches(rows: &[MissionRow]) -> Vec<MonthlyLaunches> {
    let mut by_month: BTreeMap<(i32, u32), BTreeMap<String, usize>> = BTreeMap::new();
    for row in rows {
        let (Some(year), Some(month)) = (row.year, row.month) else { continue };
        *by_month
            .entry((year, month))
            .or_default()
            .entry(row.status_mission.clone())
            .or_default() += 1;
    }
    by_month
        .into_iter()
        .map(|((year, month), by_status)| MonthlyLaunches {
            year,
            month,
            total: by_status.values().sum(),
            by_status,
        })
        .collect()
}

/// One company's launch counts broken down by mission status.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyLaunches {
    pub company: String,
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

/// Launch counts per (company, status), companies in stable alphabetical
/// order. Dateless rows still count: company and status are always present
/// on a validated row.
pub fn company_launches(rows: &[MissionRow]) -> Vec<CompanyLaunches> {
    let mut by_company: BTreeMap<&str, BTreeMap<String, usize>> = BTreeMap::new();
    for row in rows {
        *by_company
            .entry(row.company.as_str())
            .or_default()
            .entry(row.status_mission.clone())
            .or_default() += 1;
    }
    by_company
        .into_iter()
        .map(|(company, by_status)| CompanyLaunches {
            company: company.to_string(),
            total: by_status.values().sum(),
            by_status,
        })
        .collect()
}

// ── Retail rollups ──────────────────────────────────────────────────────────

/// One calendar month of retail activity.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub sales: f64,
    pub profit: f64,
    pub by_category: BTreeMap<String, f64>,
}

/// Sales and profit summed per (year, month), ascending, with a per-category
/// sales breakdown. Empty categories land under "Unknown".
pub fn monthly_sales(orders: &[OrderRow]) -> Vec<MonthlySales> {
    use chrono::Datelike;

    let mut by_month: BTreeMap<(i32, u32), (f64, f64, BTreeMap<String, f64>)> = BTreeMap::new();
    for order in orders {
        let key = (order.order_date.year(), order.order_date.month());
        let entry = by_month.entry(key).or_default();
        entry.0 += order.sales;
        entry.1 += order.profit;
        let category = if order.category.is_empty() {
            "Unknown".to_string()
        } else {
            order.category.clone()
        };
        *entry.2.entry(category).or_default() += order.sales;
    }
    by_month
        .into_iter()
        .map(|((year, month), (sales, profit, by_category))| MonthlySales {
            year,
            month,
            sales,
            profit,
            by_category,
        })
        .collect()
}

/// One region's summed sales and guarded margin.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSales {
    pub region: String,
    pub sales: f64,
    pub margin: f64,
}

/// Sales per region, margin = profit / sales (0 when sales is 0), sorted by
/// sales descending.
pub fn region_sales(orders: &[OrderRow]) -> Vec<RegionSales> {
    let mut by_region: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for order in orders {
        let region = if order.region.is_empty() { "Unknown" } else { &order.region };
        let entry = by_region.entry(region.to_string()).or_default();
        entry.0 += order.sales;
        entry.1 += order.profit;
    }
    let mut regions: Vec<RegionSales> = by_region
        .into_iter()
        .map(|(region, (sales, profit))| RegionSales { region, sales, margin: share(profit, sales) })
        .collect();
    regions.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    regions
}

/// Whole-dataset retail summary. The return rate is order-level: the share
/// of distinct order ids with at least one returned line.
#[derive(Debug, Clone, PartialEq)]
pub struct RetailTotals {
    pub sales: f64,
    pub profit: f64,
    pub margin: f64,
    pub return_rate: f64,
}

pub fn retail_totals(orders: &[OrderRow]) -> RetailTotals {
    let sales: f64 = orders.iter().map(|o| o.sales).sum();
    let profit: f64 = orders.iter().map(|o| o.profit).sum();

    let mut by_order: BTreeMap<&str, bool> = BTreeMap::new();
    for order in orders {
        let returned = by_order.entry(order.order_id.as_str()).or_insert(false);
        *returned |= order.returned;
    }
    let distinct = by_order.len();
    let returned = by_order.values().filter(|r| **r).count();

    RetailTotals {
        sales,
        profit,
        margin: share(profit, sales),
        return_rate: share(returned as f64, distinct as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn energy(area: &str, year: i32, variable: &str, value: f64) -> EnergyRow {
        EnergyRow {
            area: area.to_string(),
            year,
            category: "Electricity generation".to_string(),
            subcategory: String::new(),
            variable: variable.to_string(),
            unit: "TWh".to_string(),
            value,
        }
    }

    fn order(id: &str, ymd: (i32, u32, u32), region: &str, sales: f64, profit: f64) -> OrderRow {
        OrderRow {
            order_id: id.to_string(),
            order_date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
            ship_date: None,
            sales,
            profit,
            discount: 0.0,
            quantity: 1.0,
            region: region.to_string(),
            category: "Furniture".to_string(),
            sub_category: String::new(),
            returned: false,
            manager: None,
            lead_time_days: None,
            margin: if sales != 0.0 { profit / sales } else { 0.0 },
        }
    }

    #[test]
    fn worked_example_solar_vs_coal() {
        let rows = vec![energy("X", 2020, "Solar", 10.0), energy("X", 2020, "Coal", 30.0)];
        let mix = energy_mix_by_year(&rows, &Classifier::default());
        assert_eq!(mix.len(), 1);
        assert_eq!(mix[0].sum_renew, 10.0);
        assert_eq!(mix[0].sum_fossil, 30.0);
        assert_eq!(mix[0].total, 40.0);
        assert_eq!(mix[0].clean_share, 0.25);
    }

    #[test]
    fn grouped_sums_reconcile_with_ungrouped() {
        let rows = vec![
            energy("X", 2020, "Solar", 10.0),
            energy("Y", 2020, "Coal", 30.0),
            energy("X", 2021, "Wind", 7.5),
            energy("Z", 2021, "Gas", 2.5),
            energy("Z", 2021, "Nuclear", 4.0), // unclassified, still counted
        ];
        let ungrouped: f64 = rows.iter().map(|r| r.value).sum();
        let grouped: f64 = value_by_year(&rows).iter().map(|(_, v)| v).sum();
        assert!((grouped - ungrouped).abs() < 1e-9);

        // The classified mix excludes the nuclear row but not more.
        let mix_total: f64 = energy_mix_by_year(&rows, &Classifier::default())
            .iter()
            .map(|m| m.total)
            .sum();
        assert!((mix_total - (ungrouped - 4.0)).abs() < 1e-9);
    }

    #[test]
    fn years_are_ascending_and_zero_totals_omitted() {
        let rows = vec![
            energy("X", 2022, "Coal", 3.0),
            energy("X", 2019, "Solar", 1.0),
            energy("X", 2021, "Nuclear", 9.0), // classifies to nothing
            energy("X", 2020, "Wind", 2.0),
        ];
        let mix = energy_mix_by_year(&rows, &Classifier::default());
        let years: Vec<i32> = mix.iter().map(|m| m.year).collect();
        assert_eq!(years, vec![2019, 2020, 2022]);
    }

    #[test]
    fn zero_denominator_share_is_exactly_zero() {
        assert_eq!(share(0.0, 0.0), 0.0);
        assert_eq!(share(5.0, 0.0), 0.0);
        assert_eq!(share(1.0, 4.0), 0.25);
    }

    #[test]
    fn quantile_matches_d3() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.85), Some(7.0));
    }

    #[test]
    fn continent_shares_skip_unmapped_areas() {
        let rows = vec![
            energy("Germany", 2020, "Wind", 6.0),
            energy("Germany", 2020, "Coal", 2.0),
            energy("Atlantis", 2020, "Wind", 100.0),
        ];
        let shares = clean_share_by_continent(&rows, &Classifier::default(), 2000);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].continent, "Europe");
        assert_eq!(shares[0].clean_share, 0.75);
    }

    #[test]
    fn continent_production_separates_demand() {
        let mut demand = energy("China", 2020, "Demand", 50.0);
        demand.category = "Electricity demand".to_string();
        let rows = vec![
            energy("China", 2020, "Solar", 30.0),
            energy("China", 2020, "Coal", 10.0),
            demand,
        ];
        let load = continent_production(&rows, &Classifier::default(), 2000);
        assert_eq!(load.len(), 1);
        assert_eq!(load[0].production, 40.0);
        assert_eq!(load[0].demand, 50.0);
    }

    #[test]
    fn top_n_is_bounded_and_ranked() {
        // Four areas with equal totals so the quantile gate keeps them all
        // comparable; shares 0.9, 0.6, 0.3, 0.1.
        let mut rows = Vec::new();
        for (area, renew) in [("A", 90.0), ("B", 60.0), ("C", 30.0), ("D", 10.0)] {
            rows.push(energy(area, 2020, "Solar", renew));
            rows.push(energy(area, 2020, "Coal", 100.0 - renew));
        }
        let top = top_areas_by_clean_share(&rows, &Classifier::default(), 2, 2000);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].area, "A");
        assert_eq!(top[1].area, "B");
        assert!(top[1].clean_share >= 0.3);

        let all = top_areas_by_clean_share(&rows, &Classifier::default(), 10, 2000);
        assert!(all.len() <= 4);
        for excluded in &all[2..] {
            assert!(all[1].clean_share >= excluded.clean_share);
        }
    }

    #[test]
    fn top_n_quantile_gate_drops_small_producers() {
        let mut rows = Vec::new();
        // Nine large producers, one tiny area with a perfect share.
        for i in 0..9 {
            let area = format!("Big{i}");
            rows.push(energy(&area, 2020, "Solar", 50.0));
            rows.push(energy(&area, 2020, "Coal", 50.0));
        }
        rows.push(energy("Tiny", 2020, "Solar", 0.1));
        let top = top_areas_by_clean_share(&rows, &Classifier::default(), 10, 2000);
        assert!(top.iter().all(|a| a.area != "Tiny"));
    }

    #[test]
    fn top_n_falls_back_to_an_areas_latest_year() {
        let rows = vec![
            energy("A", 2021, "Solar", 80.0),
            energy("A", 2021, "Coal", 20.0),
            energy("B", 2020, "Solar", 10.0),
            energy("B", 2020, "Coal", 90.0),
        ];
        let top = top_areas_by_clean_share(&rows, &Classifier::default(), 5, 2000);
        // B has no 2021 data; its 2020 mix is used instead of being dropped.
        let b = top.iter().find(|a| a.area == "B").unwrap();
        assert_eq!(b.clean_share, 0.1);
        assert_eq!(b.years.len(), 1);
    }

    fn mission(company: &str, ymd: Option<(i32, u32, u32)>, status: &str) -> MissionRow {
        let date = ymd.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        MissionRow {
            company: company.to_string(),
            location: String::new(),
            date,
            year: date.map(|d| d.year()),
            month: date.map(|d| d.month()),
            status_rocket: String::new(),
            cost: None,
            status_mission: status.to_string(),
        }
    }

    #[test]
    fn monthly_launches_skip_dateless_rows() {
        let rows = vec![
            mission("SpaceX", Some((2020, 8, 7)), "Success"),
            mission("SpaceX", Some((2020, 8, 18)), "Success"),
            mission("CASC", Some((2020, 8, 6)), "Failure"),
            mission("CASC", Some((2020, 9, 1)), "Success"),
            mission("CASC", None, "Success"),
        ];
        let months = monthly_launches(&rows);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2020, 8));
        assert_eq!(months[0].total, 3);
        assert_eq!(months[0].by_status["Success"], 2);
        assert_eq!(months[0].by_status["Failure"], 1);
        assert_eq!((months[1].year, months[1].month), (2020, 9));
    }

    #[test]
    fn company_launches_count_dateless_rows_too() {
        let rows = vec![
            mission("SpaceX", Some((2020, 8, 7)), "Success"),
            mission("CASC", Some((2020, 8, 6)), "Failure"),
            mission("CASC", None, "Success"),
        ];
        let companies = company_launches(&rows);
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].company, "CASC");
        assert_eq!(companies[0].total, 2);
        assert_eq!(companies[0].by_status["Failure"], 1);
        assert_eq!(companies[1].company, "SpaceX");
        assert_eq!(companies[1].total, 1);
    }

    #[test]
    fn monthly_sales_group_ascending() {
        let orders = vec![
            order("o3", (2021, 2, 10), "West", 50.0, 5.0),
            order("o1", (2021, 1, 5), "West", 100.0, 10.0),
            order("o2", (2021, 1, 20), "East", 40.0, -4.0),
        ];
        let months = monthly_sales(&orders);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2021, 1));
        assert_eq!(months[0].sales, 140.0);
        assert_eq!(months[0].profit, 6.0);
        assert_eq!(months[0].by_category["Furniture"], 140.0);
        assert_eq!((months[1].year, months[1].month), (2021, 2));
    }

    #[test]
    fn region_sales_sorted_descending_with_guarded_margin() {
        let orders = vec![
            order("o1", (2021, 1, 1), "East", 10.0, 5.0),
            order("o2", (2021, 1, 2), "West", 100.0, 20.0),
            order("o3", (2021, 1, 3), "Void", 0.0, 7.0),
        ];
        let regions = region_sales(&orders);
        assert_eq!(regions[0].region, "West");
        assert_eq!(regions[0].margin, 0.2);
        let void = regions.iter().find(|r| r.region == "Void").unwrap();
        assert_eq!(void.margin, 0.0);
    }

    #[test]
    fn return_rate_is_order_level() {
        let mut o1a = order("o1", (2021, 1, 1), "East", 10.0, 1.0);
        o1a.returned = true;
        let o1b = order("o1", (2021, 1, 1), "East", 20.0, 2.0);
        let o2 = order("o2", (2021, 1, 2), "West", 30.0, 3.0);
        let totals = retail_totals(&[o1a, o1b, o2]);
        assert_eq!(totals.return_rate, 0.5);
        assert_eq!(totals.sales, 60.0);
    }
}
