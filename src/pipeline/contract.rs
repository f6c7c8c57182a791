// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Data contracts checked at step boundaries
//!
//! Step outputs and generation replies are concrete serde types. Crossing a
//! boundary (step output → run context, context → step input, service reply
//! → step) always goes through [`encode`] or [`decode`], which apply both the
//! structural check (serde) and the semantic check ([`Contract::validate`]).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{HypoflowError, HypoflowResult};

/// A typed payload exchanged between steps or returned by a service
pub trait Contract: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Contract name, used in error messages and as the schema name
    const NAME: &'static str;

    /// JSON schema advertised to structured-generation services
    fn schema() -> Value {
        serde_json::json!({ "type": "object" })
    }

    /// Semantic checks beyond what deserialization enforces
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Deserialize and validate a value against a contract
pub fn decode<T: Contract>(value: Value) -> HypoflowResult<T> {
    let decoded: T =
        serde_json::from_value(value).map_err(|e| HypoflowError::contract(T::NAME, e))?;
    decoded
        .validate()
        .map_err(|reason| HypoflowError::contract(T::NAME, reason))?;
    Ok(decoded)
}

/// Validate and serialize a value for storage in the run context
pub fn encode<T: Contract>(value: &T) -> HypoflowResult<Value> {
    value
        .validate()
        .map_err(|reason| HypoflowError::contract(T::NAME, reason))?;
    serde_json::to_value(value).map_err(|e| HypoflowError::contract(T::NAME, e))
}

/// Check that a score lies in the closed unit interval
pub fn unit_interval(field: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be within [0, 1], got {}", field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Probability {
        value: f64,
    }

    impl Contract for Probability {
        const NAME: &'static str = "probability";

        fn validate(&self) -> Result<(), String> {
            unit_interval("value", self.value)
        }
    }

    #[test]
    fn test_decode_accepts_valid_value() {
        let decoded: Probability = decode(serde_json::json!({ "value": 0.5 })).unwrap();
        assert_eq!(decoded, Probability { value: 0.5 });
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode::<Probability>(serde_json::json!({ "other": 1 })).unwrap_err();
        assert!(matches!(
            err,
            HypoflowError::ContractViolation { ref contract, .. } if contract == "probability"
        ));
    }

    #[test]
    fn test_encode_runs_semantic_checks() {
        let err = encode(&Probability { value: 1.5 }).unwrap_err();
        assert!(err.to_string().contains("within [0, 1]"));
    }

    #[test]
    fn test_unit_interval_rejects_nan() {
        assert!(unit_interval("confidence", f64::NAN).is_err());
        assert!(unit_interval("confidence", 0.0).is_ok());
        assert!(unit_interval("confidence", 1.0).is_ok());
    }
}
