//! Ingress adapter: feature-collection wire messages to partial updates.
//!
//! A feature that fails to decode is skipped and counted. Only a message that
//! is not a feature collection at all is rejected as a whole.

use crate::models::{LngLat, PartialUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const COLLECTION_TYPE: &str = "FeatureCollection";

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected message type `{0}`")]
    UnexpectedType(String),
}

/// Why a single feature was skipped.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("missing or invalid field: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("expected [lng, lat], got {0} coordinates")]
    Coordinates(usize),
    #[error("empty serial")]
    EmptySerial,
}

/// Telemetry message as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    /// `[lng, lat]`, an optional third element is ignored
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub serial: String,
    pub registration: String,
    pub altitude: f64,
    pub yaw: f64,
}

fn collection_type() -> String {
    COLLECTION_TYPE.to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn point_type() -> String {
    "Point".to_string()
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }
}

impl Feature {
    pub fn point(serial: &str, registration: &str, position: LngLat, altitude: f64, yaw: f64) -> Self {
        Self {
            kind: feature_type(),
            geometry: Geometry {
                kind: point_type(),
                coordinates: vec![position.lng, position.lat],
            },
            properties: FeatureProperties {
                serial: serial.to_string(),
                registration: registration.to_string(),
                altitude,
                yaw,
            },
        }
    }

    fn into_update(self) -> Result<PartialUpdate, FeatureError> {
        let (lng, lat) = match self.geometry.coordinates.as_slice() {
            [lng, lat, ..] => (*lng, *lat),
            other => return Err(FeatureError::Coordinates(other.len())),
        };
        if self.properties.serial.is_empty() {
            return Err(FeatureError::EmptySerial);
        }

        Ok(PartialUpdate {
            track_id: self.properties.serial,
            registration: self.properties.registration,
            position: LngLat::new(lng, lat),
            altitude: self.properties.altitude,
            heading: self.properties.yaw,
        })
    }
}

/// Updates decoded from one message, in feature order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub updates: Vec<PartialUpdate>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: Option<String>,
    features: Vec<Value>,
}

/// Decode a text message.
pub fn decode_message(raw: &str) -> Result<DecodedBatch, IngressError> {
    decode_value(serde_json::from_str(raw)?)
}

/// Decode an already parsed message.
pub fn decode_value(value: Value) -> Result<DecodedBatch, IngressError> {
    let collection: RawCollection = serde_json::from_value(value)?;
    if let Some(kind) = collection.kind.filter(|kind| kind != COLLECTION_TYPE) {
        return Err(IngressError::UnexpectedType(kind));
    }

    let mut batch = DecodedBatch::default();
    for (index, feature) in collection.features.into_iter().enumerate() {
        match decode_feature(feature) {
            Ok(update) => batch.updates.push(update),
            Err(err) => {
                tracing::warn!(index, "skipping malformed feature: {}", err);
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

fn decode_feature(value: Value) -> Result<PartialUpdate, FeatureError> {
    serde_json::from_value::<Feature>(value)?.into_update()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_single_feature() {
        let message = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [35.0, 32.0] },
                "properties": { "serial": "S1", "registration": "DR-B001", "altitude": 120, "yaw": 45 }
            }]
        });

        let batch = decode_value(message).unwrap();
        assert_eq!(batch.skipped, 0);
        assert_eq!(
            batch.updates,
            vec![PartialUpdate {
                track_id: "S1".to_string(),
                registration: "DR-B001".to_string(),
                position: LngLat::new(35.0, 32.0),
                altitude: 120.0,
                heading: 45.0,
            }]
        );
    }

    #[test]
    fn test_malformed_features_are_skipped() {
        let message = json!({
            "features": [
                { "geometry": { "coordinates": [35.0] },
                  "properties": { "serial": "BAD1", "registration": "DR-B001", "altitude": 1, "yaw": 0 } },
                { "geometry": { "coordinates": [35.0, 32.0] },
                  "properties": { "registration": "DR-B002", "altitude": 1, "yaw": 0 } },
                { "geometry": { "coordinates": [35.0, 32.0] },
                  "properties": { "serial": "BAD3", "registration": "DR-B003", "altitude": "high", "yaw": 0 } },
                { "geometry": { "coordinates": [35.0, 32.0] },
                  "properties": { "serial": "", "registration": "DR-B004", "altitude": 1, "yaw": 0 } },
                { "geometry": { "coordinates": [35.1, 32.1, 500.0] },
                  "properties": { "serial": "OK", "registration": "DR-R005", "altitude": 80.5, "yaw": 270 } }
            ]
        });

        let batch = decode_value(message).unwrap();
        assert_eq!(batch.skipped, 4);
        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].track_id, "OK");
        assert_eq!(batch.updates[0].position, LngLat::new(35.1, 32.1));
    }

    #[test]
    fn test_rejects_other_message_types() {
        let err = decode_message(r#"{"type": "Feature", "features": []}"#).unwrap_err();
        assert!(matches!(err, IngressError::UnexpectedType(kind) if kind == "Feature"));

        let err = decode_message("not json").unwrap_err();
        assert!(matches!(err, IngressError::Json(_)));

        assert!(decode_message(r#"{"type": "FeatureCollection"}"#).is_err());
    }

    #[test]
    fn test_encoded_collection_decodes() {
        let collection = FeatureCollection::new(vec![Feature::point(
            "S9",
            "DR-R009",
            LngLat::new(35.85, 32.55),
            60.0,
            180.0,
        )]);
        let text = serde_json::to_string(&collection).unwrap();
        assert!(text.contains(r#""type":"FeatureCollection""#));

        let batch = decode_message(&text).unwrap();
        assert_eq!(batch.updates[0].track_id, "S9");
        assert_eq!(batch.updates[0].heading, 180.0);
    }
}
