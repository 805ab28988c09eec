pub mod routes {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    /// Round to cents on the binary value of `value * 100`, halves away from zero.
    ///
    /// This is not decimal rounding: a price whose decimal half is not exactly representable
    /// rounds by its nearest `f64`, so `1.005` gives `1.0` while `120.555` gives `120.56`. The
    /// results match JavaScript's `Math.round(x * 100) / 100`.
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    /// Known direct connection between two airports, as stored by the route collection
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Edge {
        pub origin: String,
        pub destination: String,
        pub price: f64,
    }

    impl Edge {
        pub fn new(origin: impl Into<String>, destination: impl Into<String>, price: f64) -> Self {
            Edge {
                origin: origin.into(),
                destination: destination.into(),
                price,
            }
        }
    }

    /// Price field as it may appear in a stored document, either numeric or a numeric string
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum RawPrice {
        Number(f64),
        Text(String),
    }

    /// Route document before any validation. Nothing here is guaranteed to be present.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RawRoute {
        pub origin: Option<String>,
        pub destination: Option<String>,
        pub price: Option<RawPrice>,
    }

    #[derive(Debug, Error, PartialEq)]
    pub enum EdgeError {
        #[error("Route record is missing the {0} field.")]
        MissingField(&'static str),
        #[error("Route price {0} is not a non-negative number.")]
        InvalidPrice(String),
    }

    fn required_code(value: Option<String>, field: &'static str) -> Result<String, EdgeError> {
        match value {
            Some(code) if !code.trim().is_empty() => Ok(code.trim().to_string()),
            _ => Err(EdgeError::MissingField(field)),
        }
    }

    impl TryFrom<RawRoute> for Edge {
        type Error = EdgeError;

        fn try_from(raw: RawRoute) -> Result<Self, Self::Error> {
            let origin = required_code(raw.origin, "origin")?;
            let destination = required_code(raw.destination, "destination")?;

            let price = match raw.price {
                Some(RawPrice::Number(n)) => n,
                Some(RawPrice::Text(s)) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| EdgeError::InvalidPrice(s.clone()))?,
                None => return Err(EdgeError::MissingField("price")),
            };

            if !price.is_finite() || price < 0.0 {
                return Err(EdgeError::InvalidPrice(price.to_string()));
            }

            Ok(Edge {
                origin,
                destination,
                price,
            })
        }
    }

    /// One leg of an itinerary with its rounded price
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Segment {
        pub from: String,
        pub to: String,
        pub price: f64,
    }

    /// Itinerary returned by the cheapest routes search
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CheapestRoute {
        pub route: Vec<String>,
        pub total_cost: f64,
        pub segment_costs: Vec<Segment>,
    }
}
