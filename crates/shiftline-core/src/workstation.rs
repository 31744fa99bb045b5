//! Static workstation code → display label table.

/// Known workstation codes. Codes are matched case-insensitively.
const WORKSTATIONS: &[(&str, &str)] = &[
    ("BAR", "Barista"),
    ("BARISTA", "Barista"),
    ("REG", "Register"),
    ("CSH", "Register"),
    ("POS", "Register"),
    ("DT", "Drive-Thru"),
    ("DTW", "Drive-Thru Window"),
    ("KIT", "Kitchen"),
    ("PREP", "Food Prep"),
    ("BAK", "Bakery"),
    ("LOB", "Lobby"),
    ("CLN", "Cleaning"),
    ("SUP", "Shift Supervisor"),
    ("SS", "Shift Supervisor"),
    ("MGR", "Manager"),
    ("TRN", "Training"),
    ("OPN", "Opening"),
    ("CLS", "Closing"),
];

/// Look up the display label for a workstation code.
pub fn lookup(code: &str) -> Option<&'static str> {
    let code = code.trim();
    WORKSTATIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

/// Resolve the label shown for a workstation: table entry for the code,
/// else the name sent by the API, else the raw code.
pub fn resolve_label(code: &str, name: Option<&str>) -> String {
    if let Some(label) = lookup(code) {
        return label.to_string();
    }
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => code.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_wins_over_api_name() {
        assert_eq!(resolve_label("bar", Some("Espresso")), "Barista");
    }

    #[test]
    fn falls_back_to_name_then_code() {
        assert_eq!(resolve_label("ZZ9", Some(" Patio ")), "Patio");
        assert_eq!(resolve_label("ZZ9", Some("  ")), "ZZ9");
        assert_eq!(resolve_label(" ZZ9 ", None), "ZZ9");
    }
}
