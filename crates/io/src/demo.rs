//! The demo workbook written by `gridtalk seed`.

use gridtalk_engine::{Cell, CellValue, EngineError, Sheet, Workbook};

fn text(s: &str) -> Cell {
    Cell::literal(CellValue::String(s.to_string()))
}

fn num(n: f64) -> Cell {
    Cell::literal(CellValue::Number(n))
}

fn users() -> Sheet {
    let header = ["ID", "Name", "Email", "Department", "Salary"];
    let people = [
        ("Firdavs", "Engineering", 5000.0),
        ("Jasur", "Marketing", 4500.0),
        ("Nodira", "HR", 4000.0),
        ("Bekzod", "Engineering", 5500.0),
        ("Dilnoza", "Finance", 4800.0),
    ];

    let mut rows = vec![header.iter().map(|h| text(h)).collect::<Vec<_>>()];
    for (i, (name, dept, salary)) in people.iter().enumerate() {
        rows.push(vec![
            num(i as f64 + 1.0),
            text(name),
            text(&format!("{}@example.com", name.to_lowercase())),
            text(dept),
            num(*salary),
        ]);
    }
    Sheet::from_rows("Users", rows)
}

fn sales() -> Sheet {
    let header = ["Month", "Product", "Quantity", "Price", "Total"];
    let lines = [
        ("January", "Laptop", 10.0, 1200.0),
        ("January", "Phone", 25.0, 800.0),
        ("February", "Laptop", 15.0, 1200.0),
        ("February", "Phone", 30.0, 800.0),
        ("March", "Laptop", 20.0, 1200.0),
        ("March", "Phone", 40.0, 800.0),
    ];

    let mut rows = vec![header.iter().map(|h| text(h)).collect::<Vec<_>>()];
    let mut grand_total = 0.0;
    for (i, (month, product, qty, price)) in lines.iter().enumerate() {
        let row = i + 2;
        let total = qty * price;
        grand_total += total;
        rows.push(vec![
            text(month),
            text(product),
            num(*qty),
            num(*price),
            Cell::formula(format!("C{row}*D{row}"), CellValue::Number(total)),
        ]);
    }
    rows.push(vec![
        Cell::default(),
        Cell::default(),
        Cell::default(),
        text("Grand Total:"),
        Cell::formula("SUM(E2:E7)", CellValue::Number(grand_total)),
    ]);
    Sheet::from_rows("Sales", rows)
}

fn inventory() -> Sheet {
    let header = ["Item", "Category", "Stock", "Min Stock", "Status"];
    let items = [
        ("Laptop", "Electronics", 50.0, 10.0),
        ("Phone", "Electronics", 5.0, 10.0),
        ("Desk", "Furniture", 30.0, 5.0),
        ("Chair", "Furniture", 100.0, 20.0),
        ("Monitor", "Electronics", 8.0, 15.0),
    ];

    let mut rows = vec![header.iter().map(|h| text(h)).collect::<Vec<_>>()];
    for (i, (item, category, stock, min)) in items.iter().enumerate() {
        let row = i + 2;
        let status = if stock > min { "OK" } else { "Low" };
        rows.push(vec![
            text(item),
            text(category),
            num(*stock),
            num(*min),
            Cell::formula(
                format!("IF(C{row}>D{row},\"OK\",\"Low\")"),
                CellValue::String(status.to_string()),
            ),
        ]);
    }
    Sheet::from_rows("Inventory", rows)
}

/// Users, Sales (with per-line and grand-total formulas) and Inventory.
pub fn demo_workbook() -> Result<Workbook, EngineError> {
    Workbook::from_sheets(vec![users(), sales(), inventory()])
}
