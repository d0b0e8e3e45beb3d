//! Normalisation of SerpAPI eBay results before they reach the widget.
//!
//! SerpAPI has shipped several shapes for `price` over time; the widget only
//! ever wants a display string. `shipping` is dropped entirely since its shape
//! varies just as much and the widget does not render it.

use serde_json::{Map, Value};

pub const PRICE_FALLBACK: &str = "Price not available";

/// Shapes the upstream `price` field is known to take.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceField {
    Text(String),
    Structured(PriceObject),
    Unrecognized,
}

/// Candidate sub-fields of an object price, probed in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceObject {
    pub raw: Option<String>,
    pub formatted: Option<String>,
    pub extracted_value: Option<f64>,
    pub extracted: Option<f64>,
    pub value: Option<f64>,
    pub amount: Option<f64>,
    pub price: Option<f64>,
}

impl From<&Value> for PriceField {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => PriceField::Text(s.clone()),
            Value::Object(map) => PriceField::Structured(PriceObject::from_map(map)),
            _ => PriceField::Unrecognized,
        }
    }
}

impl PriceObject {
    // Fields of the wrong type count as absent
    fn from_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| map.get(key).and_then(Value::as_f64);

        Self {
            raw: text("raw"),
            formatted: text("formatted"),
            extracted_value: number("extracted_value"),
            extracted: number("extracted"),
            value: number("value"),
            amount: number("amount"),
            price: number("price"),
        }
    }

    fn display(&self) -> Option<String> {
        let verbatim = [&self.raw, &self.formatted]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned();

        verbatim.or_else(|| {
            [
                self.extracted_value,
                self.extracted,
                self.value,
                self.amount,
                self.price,
            ]
            .into_iter()
            .flatten()
            .next()
            .map(format_dollars)
        })
    }
}

impl PriceField {
    pub fn display(&self) -> Option<String> {
        match self {
            PriceField::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            PriceField::Structured(obj) => obj.display(),
            PriceField::Unrecognized => None,
        }
    }
}

// Half-cent ties round away from zero; `{:.2}` alone would round them to even.
// An f64 sits exactly on a tie only when it is an odd number of eighths,
// and there `amount * 100.0` is exact.
fn format_dollars(amount: f64) -> String {
    let eighths = amount * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        let cents = (amount * 100.0).round();
        format!("${:.2}", cents / 100.0)
    } else {
        format!("${amount:.2}")
    }
}

/// Turns any upstream price value into a display string. Never fails.
pub fn clean_price_field(price: Option<&Value>) -> String {
    let field = price.map(PriceField::from).unwrap_or(PriceField::Unrecognized);

    match field.display() {
        Some(display) => display,
        None => {
            tracing::debug!(price = ?price, "No usable price shape, using fallback");
            PRICE_FALLBACK.to_string()
        }
    }
}

/// Strips `shipping` and normalises `price` on every organic result.
pub fn sanitize_response(mut body: Value) -> Value {
    if let Some(Value::Array(results)) = body.get_mut("organic_results") {
        for item in results.iter_mut() {
            if let Value::Object(product) = item {
                product.remove("shipping");
                let price = clean_price_field(product.get("price"));
                product.insert("price".to_string(), Value::String(price));
            }
        }
    }
    body
}
