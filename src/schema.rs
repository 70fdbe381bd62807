//! Column-name constants and header alias tables for dashstat datasets.
//! Single source of truth - every loader resolves raw headers against these
//! once, at ingestion, instead of scattering fallback lookups through
//! consuming code.

/// One logical field of a dataset: its canonical column name, the header
/// spellings accepted for it (matched case-insensitively after trimming),
/// and whether ingestion fails outright when no header resolves to it.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

impl FieldSpec {
    /// Does a raw header (already trimmed and lowercased) refer to this field?
    pub fn matches(&self, header: &str) -> bool {
        header == self.name || self.aliases.iter().any(|a| *a == header)
    }
}

// ── Energy statistics (Ember long format) ───────────────────────────────────
pub mod energy {
    use super::FieldSpec;

    pub const AREA: &str = "area";
    pub const YEAR: &str = "year";
    pub const CATEGORY: &str = "category";
    pub const SUBCATEGORY: &str = "subcategory";
    pub const VARIABLE: &str = "variable";
    pub const UNIT: &str = "unit";
    pub const VALUE: &str = "value";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: AREA, aliases: &["country"], required: true },
        FieldSpec { name: YEAR, aliases: &[], required: true },
        FieldSpec { name: CATEGORY, aliases: &[], required: false },
        FieldSpec { name: SUBCATEGORY, aliases: &["sub-category", "sub_category"], required: false },
        FieldSpec { name: VARIABLE, aliases: &[], required: true },
        FieldSpec { name: UNIT, aliases: &[], required: false },
        FieldSpec { name: VALUE, aliases: &[], required: true },
    ];
}

// ── Cryptocurrency daily prices ─────────────────────────────────────────────
pub mod prices {
    use super::FieldSpec;

    pub const SYMBOL: &str = "symbol";
    pub const DATE: &str = "date";
    pub const CLOSE: &str = "close";
    pub const MARKETCAP: &str = "marketcap";
    pub const VOLUME: &str = "volume";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: SYMBOL, aliases: &["ticker"], required: true },
        FieldSpec { name: DATE, aliases: &["datum"], required: true },
        FieldSpec { name: CLOSE, aliases: &["close_price"], required: true },
        FieldSpec { name: MARKETCAP, aliases: &["market cap", "market_cap"], required: false },
        FieldSpec { name: VOLUME, aliases: &[], required: false },
    ];
}

// ── World Bank development indicators (tidy format) ─────────────────────────
pub mod indicators {
    use super::FieldSpec;

    pub const COUNTRY: &str = "country_name";
    pub const COUNTRY_CODE: &str = "country_code";
    pub const SERIES: &str = "series_name";
    pub const SERIES_CODE: &str = "series_code";
    pub const YEAR: &str = "year";
    pub const VALUE: &str = "value";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: COUNTRY, aliases: &["country name", "country"], required: true },
        FieldSpec { name: COUNTRY_CODE, aliases: &["country code"], required: false },
        FieldSpec { name: SERIES, aliases: &["series name", "series"], required: true },
        FieldSpec { name: SERIES_CODE, aliases: &["series code"], required: false },
        FieldSpec { name: YEAR, aliases: &[], required: true },
        FieldSpec { name: VALUE, aliases: &[], required: true },
    ];
}

// ── Space-mission launch records ────────────────────────────────────────────
pub mod missions {
    use super::FieldSpec;

    pub const COMPANY: &str = "company";
    pub const LOCATION: &str = "location";
    pub const DATE: &str = "datum";
    pub const COST: &str = "cost";
    pub const STATUS_ROCKET: &str = "status_rocket";
    pub const STATUS_MISSION: &str = "status_mission";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: COMPANY, aliases: &["company name", "company_name"], required: true },
        FieldSpec { name: LOCATION, aliases: &[], required: false },
        FieldSpec { name: DATE, aliases: &["date"], required: false },
        FieldSpec { name: COST, aliases: &["rocket", "rocket cost"], required: false },
        FieldSpec {
            name: STATUS_ROCKET,
            aliases: &["status rocket"],
            required: false,
        },
        FieldSpec {
            name: STATUS_MISSION,
            aliases: &["status mission"],
            required: true,
        },
    ];
}

// ── Retail orders (Superstore format) ───────────────────────────────────────
pub mod orders {
    use super::FieldSpec;

    pub const ORDER_ID: &str = "order_id";
    pub const ORDER_DATE: &str = "order_date";
    pub const SHIP_DATE: &str = "ship_date";
    pub const SALES: &str = "sales";
    pub const PROFIT: &str = "profit";
    pub const DISCOUNT: &str = "discount";
    pub const QUANTITY: &str = "quantity";
    pub const REGION: &str = "region";
    pub const CATEGORY: &str = "category";
    pub const SUB_CATEGORY: &str = "sub_category";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: ORDER_ID, aliases: &["order id", "orderid"], required: true },
        FieldSpec { name: ORDER_DATE, aliases: &["order date"], required: true },
        FieldSpec { name: SHIP_DATE, aliases: &["ship date"], required: false },
        FieldSpec { name: SALES, aliases: &[], required: true },
        FieldSpec { name: PROFIT, aliases: &[], required: true },
        FieldSpec { name: DISCOUNT, aliases: &[], required: false },
        FieldSpec {
            name: QUANTITY,
            aliases: &["order quantity", "order_quantity"],
            required: false,
        },
        FieldSpec { name: REGION, aliases: &[], required: false },
        FieldSpec {
            name: CATEGORY,
            aliases: &["product category"],
            required: false,
        },
        FieldSpec {
            name: SUB_CATEGORY,
            aliases: &["product sub-category", "sub-category", "subcategory"],
            required: false,
        },
    ];
}

// ── Retail lookup files ─────────────────────────────────────────────────────
pub mod returns {
    use super::FieldSpec;

    pub const ORDER_ID: &str = "order_id";

    pub const FIELDS: &[FieldSpec] =
        &[FieldSpec { name: ORDER_ID, aliases: &["order id", "orderid"], required: true }];
}

pub mod users {
    use super::FieldSpec;

    pub const REGION: &str = "region";
    pub const MANAGER: &str = "manager";

    pub const FIELDS: &[FieldSpec] = &[
        FieldSpec { name: REGION, aliases: &[], required: true },
        FieldSpec { name: MANAGER, aliases: &[], required: true },
    ];
}
