use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A symbol with a non-negative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSymbol {
    pub symbol: String,
    pub weight: f64,
}

impl WeightedSymbol {
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.is_empty() {
            return Err(ValidationError::empty("terms.symbol"));
        }
        ValidationError::check_range("terms.weight", self.weight, 0.0, f64::MAX)
    }
}

/// Tokenize `text` into lowercase alphanumeric symbols weighted by occurrence
/// count, in first-seen order.
pub fn symbols_from_text(text: &str) -> Vec<WeightedSymbol> {
    let mut out: Vec<WeightedSymbol> = Vec::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        match out.iter_mut().find(|s| s.symbol == token) {
            Some(existing) => existing.weight += 1.0,
            None => out.push(WeightedSymbol::new(token, 1.0)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeats_and_keeps_order() {
        let s = symbols_from_text("Cats chase mice; cats sleep.");
        let names: Vec<&str> = s.iter().map(|w| w.symbol.as_str()).collect();
        assert_eq!(names, vec!["cats", "chase", "mice", "sleep"]);
        assert_eq!(s[0].weight, 2.0);
    }
}
