use std::fs;
use std::path::Path;

use dashstat::{DashError, DashModel};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

const ORDERS_CSV: &str = "\
Order ID,Order Date,Ship Date,Sales,Profit,Discount,Order Quantity,Region,Product Category,Product Sub-Category
o1,1/5/2021,1/8/2021,\"1,000\",100,0.1,2,West,Furniture,Chairs
o1,1/5/2021,1/8/2021,500,-50,0,1,West,Technology,Phones
o2,1/20/2021,1/22/2021,200,40,0,3,East,Furniture,Tables
o3,2/2/2021,,300,30,0,1,East,,Binders
bad,not a date,,100,10,0,1,West,Furniture,Chairs
o4,2/10/2021,2/11/2021,garbage,10,0,1,West,Furniture,Chairs
";

const RETURNS_CSV: &str = "Order ID\no2\n";

const USERS_CSV: &str = "Region,Manager\nWest,Anna\nEast,Erin\n";

fn loaded_model(dir: &TempDir) -> DashModel {
    write_file(dir.path(), "orders.csv", ORDERS_CSV);
    write_file(dir.path(), "returns.csv", RETURNS_CSV);
    write_file(dir.path(), "users.csv", USERS_CSV);

    let mut model = DashModel::new(dir.path());
    let summary = model.load_retail("orders.csv", "returns.csv", "users.csv").unwrap();
    assert_eq!(summary.read, 6);
    assert_eq!(summary.kept, 4);
    model
}

#[test]
fn lookups_are_joined_at_load_time() {
    let dir = TempDir::new().unwrap();
    let model = loaded_model(&dir);
    let rows = model.order_rows().unwrap();

    let o1 = &rows[0];
    assert_eq!(o1.sales, 1000.0);
    assert_eq!(o1.manager.as_deref(), Some("Anna"));
    assert_eq!(o1.lead_time_days, Some(3));
    assert!(!o1.returned);

    let o2 = rows.iter().find(|r| r.order_id == "o2").unwrap();
    assert!(o2.returned);
    assert_eq!(o2.manager.as_deref(), Some("Erin"));

    let o3 = rows.iter().find(|r| r.order_id == "o3").unwrap();
    assert_eq!(o3.ship_date, None);
    assert_eq!(o3.lead_time_days, None);
}

#[test]
fn monthly_rollup_is_ascending_with_category_breakdown() {
    let dir = TempDir::new().unwrap();
    let model = loaded_model(&dir);

    let months = model.monthly_sales().unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!((months[0].year, months[0].month), (2021, 1));
    assert_eq!(months[0].sales, 1700.0);
    assert_eq!(months[0].by_category["Furniture"], 1200.0);
    assert_eq!(months[0].by_category["Technology"], 500.0);
    assert_eq!((months[1].year, months[1].month), (2021, 2));
    assert_eq!(months[1].by_category["Unknown"], 300.0);
}

#[test]
fn region_rollup_sorts_by_sales() {
    let dir = TempDir::new().unwrap();
    let model = loaded_model(&dir);

    let regions = model.region_sales().unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].region, "West");
    assert_eq!(regions[0].sales, 1500.0);
    assert!((regions[0].margin - 50.0 / 1500.0).abs() < 1e-12);
    assert_eq!(regions[1].region, "East");
}

#[test]
fn totals_count_returns_per_order() {
    let dir = TempDir::new().unwrap();
    let model = loaded_model(&dir);

    let totals = model.retail_totals().unwrap();
    assert_eq!(totals.sales, 2000.0);
    assert_eq!(totals.profit, 120.0);
    // Three distinct orders, one returned.
    assert!((totals.return_rate - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn retail_load_requires_all_three_files() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "orders.csv", ORDERS_CSV);
    write_file(dir.path(), "returns.csv", RETURNS_CSV);

    let mut model = DashModel::new(dir.path());
    let err = model.load_retail("orders.csv", "returns.csv", "users.csv").unwrap_err();
    assert!(matches!(err, DashError::Io(_)));
    assert!(matches!(model.order_rows(), Err(DashError::NotLoaded(_))));
}
