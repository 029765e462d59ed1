// services/pricing.rs
use tracing::info;

use crate::errors::{AppError, Result};

/// Smallest charge Stripe accepts for USD, in major units.
pub const MIN_CHARGE: f64 = 0.50;

/// Price applied to any code not in the table.
pub const DEFAULT_PRICE: f64 = 10.00;

const PRICE_TABLE: &[(&str, f64)] = &[
    ("basic", 5.00),
    ("premium", 15.00),
    ("pro", 25.00),
    ("enterprise", 50.00),
];

/// Maps a code to its fixed price, case-insensitively. Total: unknown
/// codes get the default price, never an error.
pub fn resolve_price(code: &str) -> f64 {
    let code = code.to_lowercase();
    PRICE_TABLE
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_PRICE)
}

/// Parameters accepted by the charge-intent endpoint. Exactly one of
/// amount/code must resolve to a chargeable value.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChargeRequest {
    pub amount: Option<f64>,
    pub code: Option<String>,
    pub email: Option<String>,
}

/// Resolves the amount to charge, in major units. An explicit amount wins
/// over a code-derived price; the discarded code price is an observability
/// signal, not an error. Rejects anything below the Stripe minimum before
/// any provider call is made.
pub fn resolve_charge_amount(request: &ChargeRequest) -> Result<f64> {
    let amount = match (request.amount, request.code.as_deref()) {
        (Some(amount), Some(code)) => {
            info!(
                code,
                code_price = resolve_price(code),
                amount, "explicit amount overrides code price"
            );
            amount
        }
        (Some(amount), None) => amount,
        (None, Some(code)) => resolve_price(code),
        (None, None) => {
            return Err(AppError::invalid_data(
                "Either amount or code must be provided",
            ))
        }
    };

    if amount < MIN_CHARGE {
        return Err(AppError::invalid_data(format!(
            "amount must be at least ${:.2}",
            MIN_CHARGE
        )));
    }

    Ok(amount)
}

/// Major units to cents, rounding half-up.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_table_prices() {
        assert_eq!(resolve_price("basic"), 5.00);
        assert_eq!(resolve_price("premium"), 15.00);
        assert_eq!(resolve_price("pro"), 25.00);
        assert_eq!(resolve_price("enterprise"), 50.00);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(resolve_price("PREMIUM"), 15.00);
        assert_eq!(resolve_price("premium"), 15.00);
        assert_eq!(resolve_price("PrEmIuM"), 15.00);
    }

    #[test]
    fn unknown_codes_get_the_default() {
        assert_eq!(resolve_price("gold"), DEFAULT_PRICE);
        assert_eq!(resolve_price(""), DEFAULT_PRICE);
    }

    #[test]
    fn explicit_amount_wins_over_code() {
        let request = ChargeRequest {
            amount: Some(12.34),
            code: Some("enterprise".into()),
            email: None,
        };
        assert_eq!(resolve_charge_amount(&request).unwrap(), 12.34);
    }

    #[test]
    fn code_alone_resolves_via_table() {
        let request = ChargeRequest {
            amount: None,
            code: Some("pro".into()),
            email: None,
        };
        assert_eq!(resolve_charge_amount(&request).unwrap(), 25.00);
    }

    #[test]
    fn rejects_amount_below_minimum() {
        let request = ChargeRequest {
            amount: Some(0.49),
            code: None,
            email: None,
        };
        assert!(resolve_charge_amount(&request).is_err());
    }

    #[test]
    fn rejects_empty_request() {
        let request = ChargeRequest {
            amount: None,
            code: None,
            email: None,
        };
        assert!(resolve_charge_amount(&request).is_err());
    }

    #[test]
    fn minor_units_round_to_nearest_cent() {
        assert_eq!(to_minor_units(12.34), 1234);
        assert_eq!(to_minor_units(0.50), 50);
        assert_eq!(to_minor_units(12.999), 1300);
        assert_eq!(to_minor_units(10.001), 1000);
    }
}
