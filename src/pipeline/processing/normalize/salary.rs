use crate::types::CellValue;

const DEFAULT_CURRENCY: &str = "EUR";

/// Fixed conversion rate to EUR. Unknown currencies convert at par.
pub fn exchange_rate(currency: &str) -> f64 {
    match currency {
        "EUR" => 1.0,
        "USD" => 0.92,
        "GBP" => 1.17,
        "CHF" => 1.05,
        "SEK" => 0.085,
        "NOK" => 0.09,
        "DKK" => 0.13,
        _ => 1.0,
    }
}

/// Salary converted to EUR.
///
/// Null, zero and non-numeric amounts give `None`; a missing currency means EUR.
pub fn normalize_salary(value: &CellValue, currency: Option<&str>) -> Option<f64> {
    let amount = value.as_f64()?;
    if amount == 0.0 {
        return None;
    }
    let currency = currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    Some(amount * exchange_rate(&currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_conversion() {
        let eur = normalize_salary(&CellValue::Int(50000), Some("USD")).unwrap();
        assert!((eur - 46000.0).abs() < 1e-9);
    }

    #[test]
    fn test_currency_is_case_insensitive() {
        let eur = normalize_salary(&CellValue::Float(1000.0), Some(" gbp ")).unwrap();
        assert!((eur - 1170.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_currency_defaults_to_eur() {
        assert_eq!(normalize_salary(&CellValue::Int(42000), None), Some(42000.0));
        assert_eq!(normalize_salary(&CellValue::Int(42000), Some("")), Some(42000.0));
    }

    #[test]
    fn test_unknown_currency_converts_at_par() {
        assert_eq!(normalize_salary(&CellValue::Int(100), Some("XYZ")), Some(100.0));
    }

    #[test]
    fn test_unusable_amounts_are_null() {
        assert_eq!(normalize_salary(&CellValue::Null, Some("EUR")), None);
        assert_eq!(normalize_salary(&CellValue::Int(0), Some("EUR")), None);
        assert_eq!(normalize_salary(&CellValue::Text("competitive".into()), None), None);
        assert_eq!(normalize_salary(&CellValue::Float(f64::NAN), None), None);
        assert_eq!(normalize_salary(&CellValue::List(vec![]), None), None);
    }

    #[test]
    fn test_numeric_text_is_accepted() {
        assert_eq!(normalize_salary(&CellValue::Text("55000".into()), Some("EUR")), Some(55000.0));
    }
}
