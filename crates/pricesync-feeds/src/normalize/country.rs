//! Canonical Hebrew country names for `ManufactureCountry`.

use std::collections::HashMap;
use std::sync::LazyLock;

/// `(canonical, aliases)`; aliases are ISO-2 codes or alternate spellings.
const COUNTRIES: &[(&str, &[&str])] = &[
    ("רוסיה", &["RU"]),
    ("פרו", &["PE"]),
    ("דנמרק", &["DK"]),
    ("פרגוואי", &["PY"]),
    ("צ'כיה", &["CZ", "צכיה"]),
    ("ארצות הברית", &["US"]),
    ("דרום קוריאה", &["KR"]),
    ("ניו זילנד", &["NZ"]),
    ("ישראל", &["IL"]),
    ("אורוגוואי", &["UY"]),
    ("איחוד האמירויות", &["AE"]),
    ("אוסטרליה", &["AU"]),
    ("צ'ילה", &["CL", "צילה"]),
    ("הולנד", &["NL"]),
    ("הודו", &["IN"]),
    ("סין", &["CN"]),
    ("אוסטריה", &["AT"]),
    ("חוף השנהב", &["CI"]),
    ("וייטנאם", &["VN"]),
    ("ארגנטינה", &["AR"]),
    ("פולין", &["PL"]),
    ("ברזיל", &["BR"]),
    ("מקסיקו", &["MX"]),
    ("בריטניה", &["GB", "אנגליה"]),
    ("בלארוס", &["BY"]),
    ("לא ידוע", &["XX"]),
    ("מצרים", &["EG"]),
    ("הונגריה", &["HU"]),
    ("גאנה", &["GH"]),
    ("שווייץ", &["CH"]),
    ("קנדה", &["CA"]),
    ("סרי לנקה", &["LK"]),
    ("גרמניה", &["DE"]),
    ("ספרד", &["ES"]),
    ("טאיוואן", &["TW"]),
    ("לטביה", &["LV"]),
    ("רומניה", &["RO"]),
    ("פינלנד", &["FI"]),
    ("הפיליפינים", &["PH"]),
    ("סרביה", &["RS"]),
    ("אקוודור", &["EC"]),
    ("סלובקיה", &["SK"]),
    ("ליטא", &["LT"]),
    ("צרפת", &["FR"]),
    ("איטליה", &["IT"]),
    ("אירלנד", &["IE"]),
    ("אינדונזיה", &["ID"]),
    ("דרום אפריקה", &["ZA"]),
    ("אוקראינה", &["UA"]),
    ("פורטוגל", &["PT"]),
    ("נורווגיה", &["NO"]),
    ("תאילנד", &["TH"]),
    ("בולגריה", &["BG"]),
    ("טורקיה", &["TR"]),
    ("קוסטה ריקה", &["CR"]),
    ("בלגיה", &["BE"]),
    ("מקדוניה", &["MK"]),
    ("יוון", &["GR"]),
    ("קולומביה", &["CO"]),
    ("אזרבייג'ן", &["AZ"]),
];

static ALIAS_INDEX: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    COUNTRIES
        .iter()
        .flat_map(|(canonical, aliases)| aliases.iter().map(move |a| (*a, *canonical)))
        .collect()
});

/// Canonical country for a raw feed value; unknown values pass through.
/// Matching is exact, so `il` is not `IL`.
#[must_use]
pub fn normalize_country(raw: &str) -> String {
    ALIAS_INDEX.get(raw).copied().unwrap_or(raw).to_owned()
}
