//! Unit spellings for `UnitQty` and `UnitOfMeasure`.
//!
//! Both tables reproduce the mapping the catalogue was first built with,
//! including its odd rows (`יחידה` → `ליטר`, `ליטרים` → `מטר` for unit
//! quantity). Changing them would split existing items across two spellings.

/// Canonical `UnitQty`. Unmapped values pass through.
#[must_use]
pub fn normalize_unit_qty(raw: &str) -> String {
    match raw {
        "100 יח" | "יח" | "יח'" | "יח`" => "יחידה",
        "100 מל" | "מיליליטרים" | "מטרים" => "מ\"ל",
        "גרמים" => "גרם",
        "יחידה" => "ליטר",
        "ליטרים" => "מטר",
        "ק\"\"ג" | "קילוגרמים" => "ק\"ג",
        other => other,
    }
    .to_owned()
}

/// Canonical `UnitOfMeasure`. Unmapped values pass through.
#[must_use]
pub fn normalize_unit_of_measure(raw: &str) -> String {
    match raw {
        "יח'" | "יחידה" | "יח" => "יחידה",
        "100 ק\"\"ג" => "100 ק\"ג",
        "100 יח" => "100 יחידות",
        "מ'ל" => "מ\"ל",
        "לק\"ג" | "ק\"ג" => "ק\"ג",
        "100 מ'ל" | "100 מ\"ל" | "100 מל" => "100 מ\"ל",
        other => other,
    }
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_qty_table() {
        assert_eq!(normalize_unit_qty("יח'"), "יחידה");
        assert_eq!(normalize_unit_qty("100 יח"), "יחידה");
        assert_eq!(normalize_unit_qty("מיליליטרים"), "מ\"ל");
        assert_eq!(normalize_unit_qty("גרמים"), "גרם");
        assert_eq!(normalize_unit_qty("יחידה"), "ליטר");
        assert_eq!(normalize_unit_qty("ליטרים"), "מטר");
        assert_eq!(normalize_unit_qty("ק\"\"ג"), "ק\"ג");
        assert_eq!(normalize_unit_qty("קילוגרמים"), "ק\"ג");
        assert_eq!(normalize_unit_qty("ארגז"), "ארגז");
    }

    #[test]
    fn unit_of_measure_table() {
        assert_eq!(normalize_unit_of_measure("יח"), "יחידה");
        assert_eq!(normalize_unit_of_measure("100 ק\"\"ג"), "100 ק\"ג");
        assert_eq!(normalize_unit_of_measure("100 יח"), "100 יחידות");
        assert_eq!(normalize_unit_of_measure("מ'ל"), "מ\"ל");
        assert_eq!(normalize_unit_of_measure("לק\"ג"), "ק\"ג");
        assert_eq!(normalize_unit_of_measure("100 מל"), "100 מ\"ל");
        assert_eq!(normalize_unit_of_measure("100 גרם"), "100 גרם");
        assert_eq!(normalize_unit_of_measure("ליטר"), "ליטר");
    }
}
