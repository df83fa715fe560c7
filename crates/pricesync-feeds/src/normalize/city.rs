//! Canonical city names for store records.
//!
//! Store feeds spell cities many ways (abbreviations, hyphens, `קרית` vs
//! `קריית`), and some chains publish numeric locality codes instead.

use std::collections::HashMap;
use std::sync::LazyLock;

/// `(canonical, spellings)`. Each canonical name is also listed among its
/// spellings where the feeds use it verbatim.
const CITY_SPELLINGS: &[(&str, &[&str])] = &[
    (
        "תל אביב",
        &[
            "תל אביב",
            "תל-אביב",
            "תל אביב-יפו",
            "תל-אביב-יפו",
            "תל אביב יפו",
            "רמת אביב א",
            "ת\"א",
            "תא",
            "תל אבית יפה",
            "תל-אביב יפה",
            "תל אביב יפה",
        ],
    ),
    ("ירושלים", &["ירושלים", "י-ם", "י\"ם"]),
    ("חיפה", &["חיפה"]),
    ("באר שבע", &["באר שבע", "באר-שבע", "ב\"ש", "בש", "ב.ש"]),
    ("ראשון לציון", &["ראשון לציון", "ראשל\"צ", "ראשלצ", "ראשון"]),
    (
        "פתח תקווה",
        &["פתח תקווה", "פתח תקוה", "פתח-תקווה", "פתח-תקוה", "פ\"ת", "פת"],
    ),
    ("אשדוד", &["אשדוד"]),
    ("נתניה", &["נתניה"]),
    ("רמת גן", &["רמת גן", "רמת-גן", "ר\"ג", "רג"]),
    ("חולון", &["חולון"]),
    ("רעננה", &["רעננה"]),
    ("רמלה", &["רמלה"]),
    ("אשקלון", &["אשקלון"]),
    ("כפר סבא", &["כפר סבא", "כפר-סבא", "כ\"ס", "כס"]),
    ("בת ים", &["בת ים", "בת-ים"]),
    ("הרצליה", &["הרצליה", "הרצלייה"]),
    ("הוד השרון", &["הוד השרון", "הוד-השרון"]),
    (
        "קרית אתא",
        &["קרית אתא", "קרית-אתא", "קריית אתא", "קריית-אתא"],
    ),
    ("קרית מוצקין", &["קרית מוצקין", "קריית מוצקין", "מוצקין"]),
    ("רמת השרון", &["רמת השרון", "רמת-השרון"]),
    ("גבעתיים", &["גבעתיים"]),
    ("ראש העין", &["ראש העין", "ראש-העין"]),
    ("קרית ביאליק", &["קרית ביאליק", "קריית ביאליק"]),
    ("מודיעין", &["מודיעין", "מודעין", "מודיעין-מכבים-רעות"]),
    ("בני ברק", &["בני ברק", "בני-ברק", "ב\"ב"]),
    ("רחובות", &["רחובות"]),
    ("קרית גת", &["קרית גת", "קריית גת"]),
    ("עכו", &["עכו"]),
    ("אילת", &["אילת"]),
    ("חדרה", &["חדרה"]),
    ("נהריה", &["נהריה", "נהרייה"]),
    ("כרמיאל", &["כרמיאל"]),
    ("עפולה", &["עפולה"]),
    ("טבריה", &["טבריה"]),
    ("נס ציונה", &["נס ציונה"]),
    ("יבנה", &["יבנה"]),
    ("אור יהודה", &["אור יהודה", "אור-יהודה"]),
    ("צפת", &["צפת"]),
    ("קרית שמונה", &["קרית שמונה", "קריית שמונה"]),
    ("טירת הכרמל", &["טירת הכרמל", "טירת-הכרמל"]),
    ("לוד", &["לוד"]),
    ("דימונה", &["דימונה"]),
    ("שדרות", &["שדרות"]),
    ("בית שמש", &["בית שמש", "בית-שמש"]),
    ("אור עקיבא", &["אור עקיבא", "אור-עקיבא"]),
    ("מעלות", &["מעלות", "מעלות-תרשיחא"]),
    ("טבעון", &["טבעון", "קרית טבעון", "קריית טבעון"]),
    ("מבשרת ציון", &["מבשרת ציון"]),
    (
        "קרית אונו",
        &["קרית אונו", "קריית אונו", "קריית-אונו", "קרית-אונו"],
    ),
    ("מגדל העמק", &["מגדל העמק"]),
    ("ערד", &["ערד"]),
    ("בית שאן", &["בית שאן"]),
    ("תל מונד", &["תל מונד", "תל נונד", "תל-מונד"]),
    ("נתיבות", &["נתיבות"]),
    ("יהוד", &["יהוד", "יהוד-מונוסון"]),
    ("קרית ים", &["קרית ים", "קריית ים"]),
    (
        "זכרון יעקב",
        &["זכרון יעקב", "זכרון-יעקב", "זיכרון יעקב"],
    ),
    ("גני תקווה", &["גני תקווה", "גני-תקוה", "גני-תקווה"]),
    ("עומר", &["עומר"]),
    ("קצרין", &["קצרין"]),
    (
        "פרדס חנה",
        &["פרדס חנה", "פרדס חנה-כרכור", "כרכור", "פרדס חנה כרכור"],
    ),
    ("דליית אל כרמל", &["דליית אל כרמל"]),
    ("צור יצחק", &["צור יצחק"]),
    ("מתן", &["מתן"]),
    ("אלעד", &["אלעד"]),
    ("שוהם", &["שוהם"]),
    ("אופקים", &["אופקים"]),
    ("כפר יונה", &["כפר יונה", "כפר-יונה"]),
    ("רעות", &["רעות"]),
    ("מכבים", &["מכבים"]),
    ("מזכרת בתיה", &["מזכרת בתיה"]),
    ("גבעת שמואל", &["גבעת שמואל", "גבעת-שמואל"]),
    ("קרית מלאכי", &["קרית מלאכי", "קריית מלאכי"]),
    ("גדרה", &["גדרה"]),
    ("עתלית", &["עתלית"]),
    ("ירוחם", &["ירוחם"]),
    ("קרית עקרון", &["קרית עקרון"]),
    ("מצפה רמון", &["מצפה רמון", "מצפה-רמון"]),
    ("גן יבנה", &["גן יבנה"]),
    ("חריש", &["חריש"]),
    ("בית חשמונאי", &["בית חשמונאי"]),
    ("צורן", &["צורן", "קדימה צורן", "קדימה-צורן"]),
    ("אבן יהודה", &["אבן יהודה", "אבן-יהודה"]),
    ("רמת ישי", &["רמת ישי"]),
    ("גבעת אולגה", &["גבעת אולגה"]),
    ("חצור הגלילית", &["חצור הגלילית", "חצור-הגלילית"]),
    ("כפר תבור", &["כפר תבור"]),
    ("אריאל", &["אריאל"]),
    ("מעלה אדומים", &["מעלה אדומים"]),
    ("באר יעקב", &["באר יעקב"]),
    ("בת חפר", &["בת חפר"]),
    ("רהט", &["רהט"]),
    ("שילת", &["שילת"]),
    ("אורנית", &["אורנית"]),
    ("אלקנה", &["אלקנה"]),
    (
        "יקנעם",
        &["יקנעם", "יוקנעם", "יקנעם עילית", "יוקנעם עילית"],
    ),
    ("צור משה", &["צור משה"]),
    ("פרדסיה", &["פרדסיה"]),
    ("כפר ורדים", &["כפר ורדים"]),
    ("ביתר עלית", &["ביתר עילית", "ביתר עלית"]),
    ("קרית חיים", &["קרית חיים"]),
    ("קדימה", &["קדימה"]),
    ("טייבה", &["טייבה"]),
    ("שפרעם", &["שפרעם"]),
    ("מיתר", &["מיתר"]),
    ("להבים", &["להבים"]),
    ("בנימינה", &["בנימינה", "בנימינה-גבעת עדה"]),
    ("גבעת עדה", &["גבעת עדה"]),
];

/// Locality codes used by chains instead of names.
const CITY_CODES: &[(&str, &str)] = &[
    ("3000", "ירושלים"),
    ("5000", "תל אביב"),
    ("4000", "חיפה"),
    ("7100", "אשקלון"),
    ("70", "אשדוד"),
    ("8700", "רעננה"),
    ("8500", "רמלה"),
    ("6900", "כפר סבא"),
    ("9000", "באר שבע"),
    ("8300", "ראשון לציון"),
    ("7000", "לוד"),
    ("8400", "רחובות"),
    ("6100", "רמת גן"),
    ("6200", "בת ים"),
    ("6600", "חולון"),
    ("7400", "נתניה"),
    ("7900", "פתח תקווה"),
    ("6500", "חדרה"),
    ("2630", "קרית גת"),
    ("2610", "בית שמש"),
    ("2600", "אילת"),
    ("7800", "פרדס חנה"),
    ("9100", "נהריה"),
    ("874", "מגדל העמק"),
    ("1031", "שדרות"),
    ("7600", "עכו"),
    ("1139", "כרמיאל"),
    ("7700", "עפולה"),
    ("6700", "טבריה"),
    ("1165", "מודיעין"),
    ("2500", "נשר"),
    ("1015", "מבשרת ציון"),
    ("2640", "ראש העין"),
    ("2660", "יבנה"),
    ("246", "נתיבות"),
    ("2800", "קרית שמונה"),
    ("195", "קדימה"),
    ("1034", "קרית מלאכי"),
    ("1200", "מודיעין"),
    ("3570", "אריאל"),
    ("3616", "מעלה אדומים"),
    ("9300", "זכרון יעקב"),
    ("3780", "ביתר עלית"),
];

static SPELLING_INDEX: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    CITY_SPELLINGS
        .iter()
        .flat_map(|(canonical, spellings)| spellings.iter().map(move |s| (*s, *canonical)))
        .collect()
});

static CODE_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| CITY_CODES.iter().copied().collect());

/// Canonical city for a raw feed value.
///
/// - blank or `NULL` → `None`;
/// - all digits → the city for that locality code, or the code itself when
///   unknown;
/// - a known spelling → its canonical name;
/// - anything else → `None`, meaning "leave the stored value alone".
#[must_use]
pub fn normalize_city(raw: &str) -> Option<String> {
    let city = raw.trim();
    if city.is_empty() || city.eq_ignore_ascii_case("NULL") {
        return None;
    }

    if city.bytes().all(|b| b.is_ascii_digit()) {
        return Some(CODE_INDEX.get(city).copied().unwrap_or(city).to_owned());
    }

    SPELLING_INDEX.get(city).map(|canonical| (*canonical).to_owned())
}
