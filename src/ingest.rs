//! Row ingestion and validation.
//!
//! Every CSV is read with all columns as strings; typed coercion happens
//! afterwards, row by row, under this module's control. A row is kept only
//! if every required field coerces (finite numbers, parseable dates,
//! non-empty trimmed identifiers). Rows failing any check are silently
//! dropped and show up only in the returned [`LoadSummary`].

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::DashError;
use crate::schema::{self, FieldSpec};

// ── Read configuration ──────────────────────────────────────────────────────

/// Field separator of the source text. `Auto` sniffs the header line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Separator {
    #[default]
    Auto,
    Comma,
    Semicolon,
}

impl Separator {
    fn resolve(self, text: &str) -> u8 {
        match self {
            Separator::Comma => b',',
            Separator::Semicolon => b';',
            Separator::Auto => {
                let header = text.lines().next().unwrap_or("");
                let commas = header.matches(',').count();
                let semis = header.matches(';').count();
                if semis > commas { b';' } else { b',' }
            }
        }
    }
}

/// Numeric locale of the source text.
///
/// `DotDecimal` tolerates `,` and space as thousands separators;
/// `CommaDecimal` tolerates `.` and space, with `,` as the decimal mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberFormat {
    #[default]
    DotDecimal,
    CommaDecimal,
}

impl NumberFormat {
    /// Coerce a raw field to a finite number; `None` on anything else.
    pub fn parse(self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let cleaned: String = match self {
            NumberFormat::DotDecimal => trimmed
                .chars()
                .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
                .collect(),
            NumberFormat::CommaDecimal => trimmed
                .chars()
                .filter(|c| !matches!(c, '.' | ' ' | '\u{a0}'))
                .map(|c| if c == ',' { '.' } else { c })
                .collect(),
        };
        let n: f64 = cleaned.parse().ok()?;
        n.is_finite().then_some(n)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    pub separator: Separator,
    pub numbers: NumberFormat,
}

/// Row counts of one load. `dropped` rows failed validation and never reach
/// aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub read: usize,
    pub kept: usize,
    pub dropped: usize,
}

impl LoadSummary {
    fn finish(dataset: &str, read: usize, kept: usize) -> Self {
        let dropped = read - kept;
        if kept == 0 && read > 0 {
            warn!(dataset, read, "every row failed validation");
        } else {
            debug!(dataset, read, kept, dropped, "loaded rows");
        }
        Self { read, kept, dropped }
    }
}

// ── Typed rows ──────────────────────────────────────────────────────────────

/// One validated line of the energy statistics file (long format).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRow {
    pub area: String,
    pub year: i32,
    pub category: String,
    pub subcategory: String,
    pub variable: String,
    pub unit: String,
    pub value: f64,
}

/// One validated daily price record.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub year: i32,
    pub close: f64,
    pub marketcap: Option<f64>,
    pub volume: Option<f64>,
}

/// One validated development-indicator observation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub country: String,
    pub country_code: String,
    pub series: String,
    pub series_code: String,
    pub year: i32,
    pub value: f64,
}

/// One validated space-mission launch record. The launch date is optional:
/// dateless rows keep contributing to company- and status-keyed counts, they
/// only drop out of temporal rollups.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionRow {
    pub company: String,
    pub location: String,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status_rocket: String,
    /// Launch cost with currency text stripped.
    pub cost: Option<f64>,
    pub status_mission: String,
}

/// One validated retail order line, with the returns / managers lookups
/// already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub sales: f64,
    pub profit: f64,
    pub discount: f64,
    pub quantity: f64,
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub returned: bool,
    pub manager: Option<String>,
    pub lead_time_days: Option<i64>,
    /// profit / sales, 0 when sales is 0.
    pub margin: f64,
}

// ── Frame reading and header resolution ─────────────────────────────────────

/// Read delimited text into a DataFrame with every column as String.
/// Column names are trimmed; a UTF-8 BOM is stripped.
pub fn read_frame(text: &str, separator: Separator) -> Result<DataFrame, DashError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let parse_options = CsvParseOptions::default().with_separator(separator.resolve(text));
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

/// Rename raw headers to canonical field names via the alias tables,
/// case-insensitively. Fails with `MissingColumn` when a required field has
/// no matching header. Only the first header matching a field is renamed.
fn resolve_headers(
    df: &mut DataFrame,
    fields: &[FieldSpec],
    dataset: &str,
) -> Result<(), DashError> {
    let mut taken: HashSet<&'static str> = HashSet::new();
    let resolved: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|raw| {
            let key = raw.trim().to_lowercase();
            match fields.iter().find(|f| f.matches(&key)) {
                Some(f) if !taken.contains(f.name) => {
                    taken.insert(f.name);
                    f.name.to_string()
                }
                _ => raw.trim().to_string(),
            }
        })
        .collect();
    df.set_column_names(resolved.as_slice())?;

    for field in fields.iter().filter(|f| f.required) {
        if !taken.contains(field.name) {
            return Err(DashError::MissingColumn(format!("{dataset}: {}", field.name)));
        }
    }
    Ok(())
}

fn str_col<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, DashError> {
    df.column(name)
        .map_err(|_| DashError::MissingColumn(name.to_string()))?
        .str()
        .map_err(DashError::from)
}

fn opt_str_col<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    df.column(name).ok().and_then(|c| c.str().ok())
}

// ── Coercion helpers ────────────────────────────────────────────────────────

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(|s| s.to_string())
}

fn text_or_empty(col: Option<&StringChunked>, idx: usize) -> String {
    col.and_then(|c| c.get(idx))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(y) = trimmed.parse::<i32>() {
        return Some(y);
    }
    // Some exports carry years as "2020.0".
    let f: f64 = trimmed.parse().ok()?;
    (f.is_finite() && f.fract() == 0.0).then(|| f as i32)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    // launch-log datum form, e.g. "Fri Aug 07, 2020 05:12 UTC"
    "%a %b %d, %Y %H:%M UTC",
];

/// Parse a date field, trying ISO first, then US month/day variants, then
/// datetime forms truncated to their date.
pub fn parse_date_flexible(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(d);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Coerce a cost field that may carry currency symbols or grouping marks:
/// everything but digits, `.` and `-` is stripped before parsing. `None`
/// when nothing numeric remains.
fn scrub_cost(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let n: f64 = cleaned.parse().ok()?;
    n.is_finite().then_some(n)
}

// ── Dataset loaders ─────────────────────────────────────────────────────────

/// Parse energy statistics. Kept rows have a non-empty area, a positive
/// year, and a finite non-zero value.
pub fn energy_rows_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<(Vec<EnergyRow>, LoadSummary), DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::energy::FIELDS, "energy")?;

    let area = str_col(&df, schema::energy::AREA)?;
    let year = str_col(&df, schema::energy::YEAR)?;
    let variable = str_col(&df, schema::energy::VARIABLE)?;
    let value = str_col(&df, schema::energy::VALUE)?;
    let category = opt_str_col(&df, schema::energy::CATEGORY);
    let subcategory = opt_str_col(&df, schema::energy::SUBCATEGORY);
    let unit = opt_str_col(&df, schema::energy::UNIT);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(area) = non_empty(area.get(i)) else { continue };
        let Some(year) = year.get(i).and_then(parse_year).filter(|y| *y > 0) else {
            continue;
        };
        let Some(value) = value
            .get(i)
            .and_then(|v| opts.numbers.parse(v))
            .filter(|v| *v != 0.0)
        else {
            continue;
        };
        rows.push(EnergyRow {
            area,
            year,
            category: text_or_empty(category, i),
            subcategory: text_or_empty(subcategory, i),
            variable: variable.get(i).map(|s| s.trim().to_string()).unwrap_or_default(),
            unit: text_or_empty(unit, i),
            value,
        });
    }

    let summary = LoadSummary::finish("energy", df.height(), rows.len());
    Ok((rows, summary))
}

/// Parse daily prices. Kept rows have a non-empty symbol (uppercased), a
/// valid date, and a finite positive close. Market cap and volume stay
/// optional: an unparseable cell becomes `None`, not a dropped row.
/// The result is sorted by date ascending.
pub fn price_rows_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<(Vec<PriceRow>, LoadSummary), DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::prices::FIELDS, "prices")?;

    let symbol = str_col(&df, schema::prices::SYMBOL)?;
    let date = str_col(&df, schema::prices::DATE)?;
    let close = str_col(&df, schema::prices::CLOSE)?;
    let marketcap = opt_str_col(&df, schema::prices::MARKETCAP);
    let volume = opt_str_col(&df, schema::prices::VOLUME);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(symbol) = non_empty(symbol.get(i)).map(|s| s.to_uppercase()) else {
            continue;
        };
        let Some(date) = date.get(i).and_then(parse_date_flexible) else { continue };
        let Some(close) = close
            .get(i)
            .and_then(|v| opts.numbers.parse(v))
            .filter(|c| *c > 0.0)
        else {
            continue;
        };
        rows.push(PriceRow {
            symbol,
            date,
            year: date.year(),
            close,
            marketcap: marketcap.and_then(|c| c.get(i)).and_then(|v| opts.numbers.parse(v)),
            volume: volume.and_then(|c| c.get(i)).and_then(|v| opts.numbers.parse(v)),
        });
    }
    rows.sort_by_key(|r| r.date);

    let summary = LoadSummary::finish("prices", df.height(), rows.len());
    Ok((rows, summary))
}

/// Parse tidy development indicators. Falls back to positional headers
/// (country, code, series, code, year, value) when the alias tables resolve
/// nothing, which matches how these exports are usually shaped.
pub fn indicator_rows_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<(Vec<IndicatorRow>, LoadSummary), DashError> {
    let mut df = read_frame(text, opts.separator)?;
    if resolve_headers(&mut df, schema::indicators::FIELDS, "indicators").is_err() {
        if df.width() < 6 {
            return Err(DashError::InvalidData(
                "indicators: expected at least 6 columns".to_string(),
            ));
        }
        let canonical = [
            schema::indicators::COUNTRY,
            schema::indicators::COUNTRY_CODE,
            schema::indicators::SERIES,
            schema::indicators::SERIES_CODE,
            schema::indicators::YEAR,
            schema::indicators::VALUE,
        ];
        let mut names: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for (i, name) in canonical.iter().enumerate() {
            names[i] = (*name).to_string();
        }
        df.set_column_names(names.as_slice())?;
    }

    let country = str_col(&df, schema::indicators::COUNTRY)?;
    let series = str_col(&df, schema::indicators::SERIES)?;
    let year = str_col(&df, schema::indicators::YEAR)?;
    let value = str_col(&df, schema::indicators::VALUE)?;
    let country_code = opt_str_col(&df, schema::indicators::COUNTRY_CODE);
    let series_code = opt_str_col(&df, schema::indicators::SERIES_CODE);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(country) = non_empty(country.get(i)) else { continue };
        let Some(series) = non_empty(series.get(i)) else { continue };
        let Some(year) = year.get(i).and_then(parse_year).filter(|y| *y > 0) else {
            continue;
        };
        let Some(value) = value
            .get(i)
            .and_then(|v| opts.numbers.parse(v))
            .filter(|v| *v > 0.0)
        else {
            continue;
        };
        rows.push(IndicatorRow {
            country,
            country_code: text_or_empty(country_code, i),
            series,
            series_code: text_or_empty(series_code, i),
            year,
            value,
        });
    }

    let summary = LoadSummary::finish("indicators", df.height(), rows.len());
    Ok((rows, summary))
}

/// Parse space-mission launch records. Kept rows have a non-empty company
/// and mission status; the launch date, cost, location, and rocket status
/// stay optional.
pub fn mission_rows_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<(Vec<MissionRow>, LoadSummary), DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::missions::FIELDS, "missions")?;

    let company = str_col(&df, schema::missions::COMPANY)?;
    let status = str_col(&df, schema::missions::STATUS_MISSION)?;
    let datum = opt_str_col(&df, schema::missions::DATE);
    let location = opt_str_col(&df, schema::missions::LOCATION);
    let status_rocket = opt_str_col(&df, schema::missions::STATUS_ROCKET);
    let cost = opt_str_col(&df, schema::missions::COST);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(company) = non_empty(company.get(i)) else { continue };
        let Some(status_mission) = non_empty(status.get(i)) else { continue };

        let date = datum.and_then(|c| c.get(i)).and_then(parse_date_flexible);
        rows.push(MissionRow {
            company,
            location: text_or_empty(location, i),
            date,
            year: date.map(|d| d.year()),
            month: date.map(|d| d.month()),
            status_rocket: text_or_empty(status_rocket, i),
            cost: cost.and_then(|c| c.get(i)).and_then(scrub_cost),
            status_mission,
        });
    }

    let summary = LoadSummary::finish("missions", df.height(), rows.len());
    Ok((rows, summary))
}

/// Parse the returns lookup file into the set of returned order ids.
pub fn returned_ids_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<HashSet<String>, DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::returns::FIELDS, "returns")?;
    let order_id = str_col(&df, schema::returns::ORDER_ID)?;

    let mut ids = HashSet::new();
    for i in 0..df.height() {
        if let Some(id) = non_empty(order_id.get(i)) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Parse the users lookup file into a region → manager map.
pub fn region_managers_from_str(
    text: &str,
    opts: &ReadOptions,
) -> Result<HashMap<String, String>, DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::users::FIELDS, "users")?;
    let region = str_col(&df, schema::users::REGION)?;
    let manager = str_col(&df, schema::users::MANAGER)?;

    let mut managers = HashMap::new();
    for i in 0..df.height() {
        if let Some(region) = non_empty(region.get(i)) {
            managers.insert(region, text_or_empty(Some(manager), i));
        }
    }
    Ok(managers)
}

/// Parse retail orders, tagging each row with whether its order id appears
/// in `returned_ids` and the manager of its region. Kept rows have a
/// non-empty order id, a valid order date, and coercible sales and profit.
pub fn order_rows_from_str(
    text: &str,
    opts: &ReadOptions,
    returned_ids: &HashSet<String>,
    managers: &HashMap<String, String>,
) -> Result<(Vec<OrderRow>, LoadSummary), DashError> {
    let mut df = read_frame(text, opts.separator)?;
    resolve_headers(&mut df, schema::orders::FIELDS, "orders")?;

    let order_id = str_col(&df, schema::orders::ORDER_ID)?;
    let order_date = str_col(&df, schema::orders::ORDER_DATE)?;
    let sales = str_col(&df, schema::orders::SALES)?;
    let profit = str_col(&df, schema::orders::PROFIT)?;
    let ship_date = opt_str_col(&df, schema::orders::SHIP_DATE);
    let discount = opt_str_col(&df, schema::orders::DISCOUNT);
    let quantity = opt_str_col(&df, schema::orders::QUANTITY);
    let region = opt_str_col(&df, schema::orders::REGION);
    let category = opt_str_col(&df, schema::orders::CATEGORY);
    let sub_category = opt_str_col(&df, schema::orders::SUB_CATEGORY);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(order_id) = non_empty(order_id.get(i)) else { continue };
        let Some(order_date) = order_date.get(i).and_then(parse_date_flexible) else {
            continue;
        };
        let Some(sales) = sales.get(i).and_then(|v| opts.numbers.parse(v)) else {
            continue;
        };
        let Some(profit) = profit.get(i).and_then(|v| opts.numbers.parse(v)) else {
            continue;
        };

        let ship_date = ship_date.and_then(|c| c.get(i)).and_then(parse_date_flexible);
        let region = text_or_empty(region, i);
        let returned = returned_ids.contains(&order_id);
        let manager = managers.get(&region).cloned();
        let lead_time_days = ship_date.map(|s| s.signed_duration_since(order_date).num_days());
        let margin = if sales != 0.0 { profit / sales } else { 0.0 };

        rows.push(OrderRow {
            order_id,
            order_date,
            ship_date,
            sales,
            profit,
            discount: discount
                .and_then(|c| c.get(i))
                .and_then(|v| opts.numbers.parse(v))
                .unwrap_or(0.0),
            quantity: quantity
                .and_then(|c| c.get(i))
                .and_then(|v| opts.numbers.parse(v))
                .unwrap_or(0.0),
            region,
            category: text_or_empty(category, i),
            sub_category: text_or_empty(sub_category, i),
            returned,
            manager,
            lead_time_days,
            margin,
        });
    }

    let summary = LoadSummary::finish("orders", df.height(), rows.len());
    Ok((rows, summary))
}
