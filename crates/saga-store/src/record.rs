use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{OrderId, Result};

/// Version number of a stored saga instance, used for optimistic
/// concurrency control.
///
/// A saga that has never been saved is at version 0; every save bumps
/// the version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of an unsaved saga.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted saga instance.
///
/// The store does not interpret the instance itself; it keeps the
/// serialized payload together with the state name so operators can
/// inspect sagas without knowing their concrete type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaRecord {
    /// Correlation key.
    pub order_id: OrderId,

    /// The type of saga (e.g. "OrderSaga").
    pub saga_type: String,

    /// The version this record was saved at.
    pub version: Version,

    /// Name of the state the saga was in when saved.
    pub state: String,

    /// The saga instance as JSON.
    pub payload: serde_json::Value,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl SagaRecord {
    /// Serializes a saga instance into a record.
    ///
    /// The version is assigned by the store on save.
    pub fn encode<T: Serialize>(
        order_id: OrderId,
        saga_type: impl Into<String>,
        state: impl Into<String>,
        instance: &T,
    ) -> Result<Self> {
        Ok(Self {
            order_id,
            saga_type: saga_type.into(),
            version: Version::initial(),
            state: state.into(),
            payload: serde_json::to_value(instance)?,
            updated_at: Utc::now(),
        })
    }

    /// Deserializes the saga instance held by this record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Instance {
        step: u32,
    }

    #[test]
    fn test_version_progression() {
        let v = Version::initial();
        assert_eq!(v.as_i64(), 0);
        assert_eq!(v.next().as_i64(), 1);
        assert!(v < v.next());
    }

    #[test]
    fn test_encode_and_decode_instance() {
        let order_id = OrderId::new();
        let record =
            SagaRecord::encode(order_id, "OrderSaga", "AwaitingPayment", &Instance { step: 2 })
                .unwrap();

        assert_eq!(record.order_id, order_id);
        assert_eq!(record.state, "AwaitingPayment");
        assert_eq!(record.version, Version::initial());
        assert_eq!(record.decode::<Instance>().unwrap(), Instance { step: 2 });
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let record = SagaRecord::encode(OrderId::new(), "OrderSaga", "Started", &"text").unwrap();
        assert!(record.decode::<Instance>().is_err());
    }
}
