//! Photo records and search response decoding
//!
//! Flickr's `flickr.photos.search` answers with
//! `{ "photos": { "page": .., "photo": [ {..}, .. ] }, "stat": "ok" }`.
//! With `extras=url_m,geo` each entry may carry `url_m`, `latitude` and
//! `longitude`. Coordinates come back as strings or numbers depending on the
//! API version, and un-geotagged photos report `0`/`0`.

use crate::error::{FetchError, FetchResult};
use geolens_common::GeoLocation;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// One decoded search result entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoRecord {
    /// Opaque photo identifier (empty when the entry has none)
    pub id: String,
    /// Photo title (empty when the entry has none)
    pub title: String,
    /// Direct URL of the medium-size image
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PhotoRecord {
    /// Geo-anchor of the photo, if both coordinates are present and in range
    pub fn location(&self) -> Option<GeoLocation> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoLocation::try_new(lat, lon).ok(),
            _ => None,
        }
    }

    /// URL and anchor, or the reason the record cannot become an annotation
    pub fn anchor_parts(&self) -> FetchResult<(&str, GeoLocation)> {
        let url = self
            .image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::MissingData(format!("photo '{}' has no URL", self.id)))?;
        let location = self.location().ok_or_else(|| {
            FetchError::MissingData(format!("photo '{}' has no coordinates", self.id))
        })?;
        Ok((url, location))
    }

    /// Decode one search result entry
    ///
    /// Returns `None` for entries that are not objects or carry no image URL;
    /// such entries are discarded rather than failing the whole response.
    pub fn from_json(entry: &Value) -> Option<Self> {
        match FlickrPhoto::deserialize(entry) {
            Ok(photo) => photo.into_record(),
            Err(e) => {
                debug!(error = %e, "Discarding undecodable search entry");
                None
            }
        }
    }
}

// ============================================================================
// Flickr API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct FlickrSearchResponse {
    stat: Option<String>,
    code: Option<i64>,
    message: Option<String>,
    photos: Option<FlickrPhotoPage>,
}

#[derive(Debug, Deserialize)]
struct FlickrPhotoPage {
    /// Kept as raw values so one bad entry does not fail the page
    photo: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FlickrPhoto {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url_m: Option<String>,
    // Decoded leniently in `into_record`
    #[serde(default)]
    latitude: Option<Value>,
    #[serde(default)]
    longitude: Option<Value>,
}

impl FlickrPhoto {
    fn into_record(self) -> Option<PhotoRecord> {
        let image_url = match self.url_m {
            Some(url) if !url.is_empty() => url,
            _ => {
                debug!(photo_id = %self.id, "Discarding search entry without url_m");
                return None;
            }
        };

        let mut latitude = coordinate(&self.id, "latitude", 90.0, self.latitude.as_ref());
        let mut longitude = coordinate(&self.id, "longitude", 180.0, self.longitude.as_ref());

        // Flickr's placeholder for "no geotag"
        if latitude == Some(0.0) && longitude == Some(0.0) {
            debug!(photo_id = %self.id, "Entry reports 0,0 coordinates, treating as not geotagged");
            latitude = None;
            longitude = None;
        }

        Some(PhotoRecord {
            id: self.id,
            title: self.title.unwrap_or_default(),
            image_url: Some(image_url),
            latitude,
            longitude,
        })
    }
}

/// Photo ids are strings in the REST API but numbers in some mirrors
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Decode a coordinate field given as a JSON number or numeric string
///
/// Values outside `-limit..=limit` are treated as absent.
fn coordinate(photo_id: &str, field: &str, limit: f64, value: Option<&Value>) -> Option<f64> {
    let parsed = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() && v.abs() <= limit => Some(v),
        Some(v) if v.is_finite() => {
            debug!(
                photo_id = %photo_id,
                field = field,
                value = v,
                "Out-of-range coordinate in search entry"
            );
            None
        }
        _ => {
            debug!(
                photo_id = %photo_id,
                field = field,
                raw = ?value,
                "Malformed coordinate in search entry"
            );
            None
        }
    }
}

/// Decode a full search response body into records
///
/// Entries that fail to decode are dropped. A body that is not JSON, reports
/// `stat: fail`, or lacks the `photos.photo` list is an error.
pub fn decode_search_response(body: &[u8]) -> FetchResult<Vec<PhotoRecord>> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::Parse(format!("Search response is not JSON: {}", e)))?;

    if !json.is_object() {
        return Err(FetchError::Parse("Search response is not an object".to_string()));
    }

    let response: FlickrSearchResponse = serde_json::from_value(json)
        .map_err(|e| FetchError::Parse(format!("Unexpected search response shape: {}", e)))?;

    if response.stat.as_deref() == Some("fail") {
        return Err(FetchError::Api {
            code: response.code.unwrap_or(-1),
            message: response
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    let entries = response
        .photos
        .and_then(|photos| photos.photo)
        .ok_or_else(|| FetchError::Parse("Search response has no photos.photo list".to_string()))?;

    let records: Vec<PhotoRecord> = entries.iter().filter_map(PhotoRecord::from_json).collect();

    debug!(
        entries = entries.len(),
        decoded = records.len(),
        "Decoded search response"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_without_url_is_dropped() {
        let body = br#"{"photos":{"photo":[{"url_m":"http://x/1.jpg","latitude":"1.0","longitude":"2.0"},{"latitude":"3.0","longitude":"4.0"}]}}"#;

        let records = decode_search_response(body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_url.as_deref(), Some("http://x/1.jpg"));
        assert_eq!(records[0].latitude, Some(1.0));
        assert_eq!(records[0].longitude, Some(2.0));
        assert_eq!(records[0].id, "");
    }

    #[test]
    fn test_numeric_coordinates_and_ids() {
        let entry = json!({
            "id": 5150,
            "title": "Harbour",
            "url_m": "https://live.staticflickr.com/1/5150_m.jpg",
            "latitude": 47.6062,
            "longitude": -122.3321
        });

        let record = PhotoRecord::from_json(&entry).unwrap();

        assert_eq!(record.id, "5150");
        assert_eq!(record.title, "Harbour");
        assert_eq!(record.location(), Some(GeoLocation::new(47.6062, -122.3321)));
    }

    #[test]
    fn test_malformed_coordinate_decodes_as_absent() {
        let entry = json!({
            "id": "9",
            "url_m": "http://x/9.jpg",
            "latitude": "north-ish",
            "longitude": "2.0"
        });

        let record = PhotoRecord::from_json(&entry).unwrap();

        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, Some(2.0));
        assert!(matches!(
            record.anchor_parts(),
            Err(FetchError::MissingData(_))
        ));
    }

    #[test]
    fn test_zero_zero_is_not_a_geotag() {
        let entry = json!({"id": "1", "url_m": "http://x/1.jpg", "latitude": 0, "longitude": "0"});
        let record = PhotoRecord::from_json(&entry).unwrap();
        assert!(record.location().is_none());
    }

    #[test]
    fn test_zero_on_one_axis_is_kept() {
        let entry = json!({"id": "1", "url_m": "http://x/1.jpg", "latitude": "0", "longitude": "-0.1278"});
        let record = PhotoRecord::from_json(&entry).unwrap();
        assert_eq!(record.location(), Some(GeoLocation::new(0.0, -0.1278)));
    }

    #[test]
    fn test_out_of_range_coordinates_are_not_a_geotag() {
        let entry = json!({
            "id": "66",
            "url_m": "http://x/66.jpg",
            "latitude": "512.0",
            "longitude": "-999"
        });

        let record = PhotoRecord::from_json(&entry).unwrap();

        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
        assert!(record.location().is_none());
        assert!(matches!(
            record.anchor_parts(),
            Err(FetchError::MissingData(_))
        ));
    }

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        let entry = json!({"id": "1", "url_m": "http://x/1.jpg", "latitude": "-90", "longitude": 180.0});
        let record = PhotoRecord::from_json(&entry).unwrap();
        assert_eq!(record.location(), Some(GeoLocation::new(-90.0, 180.0)));

        let entry = json!({"id": "2", "url_m": "http://x/2.jpg", "latitude": "45", "longitude": 180.5});
        let record = PhotoRecord::from_json(&entry).unwrap();
        assert_eq!(record.latitude, Some(45.0));
        assert_eq!(record.longitude, None);
    }

    #[test]
    fn test_location_rejects_out_of_range_fields() {
        let record = PhotoRecord {
            id: "8".to_string(),
            title: String::new(),
            image_url: Some("http://x/8.jpg".to_string()),
            latitude: Some(512.0),
            longitude: Some(10.0),
        };
        assert!(record.location().is_none());
        assert!(record.anchor_parts().is_err());
    }

    #[test]
    fn test_non_string_id_and_null_title() {
        let entry = json!({"id": true, "title": null, "url_m": "http://x/3.jpg"});
        let record = PhotoRecord::from_json(&entry).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_non_object_entries_are_dropped() {
        let body = br#"{"photos":{"photo":[42, "x", null, {"url_m":"http://x/2.jpg"}]}}"#;
        let records = decode_search_response(body).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].location().is_none());
    }

    #[test]
    fn test_api_failure_payload() {
        let body = br#"{"stat":"fail","code":100,"message":"Invalid API Key (Key has invalid format)"}"#;
        match decode_search_response(body) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 100);
                assert!(message.starts_with("Invalid API Key"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_photo_list_is_parse_error() {
        assert!(matches!(
            decode_search_response(br#"{"photos":{"page":1}}"#),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            decode_search_response(b"jsonFlickrApi({})"),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            decode_search_response(b"[]"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_anchor_parts_for_complete_record() {
        let record = PhotoRecord {
            id: "7".to_string(),
            title: String::new(),
            image_url: Some("http://x/7.jpg".to_string()),
            latitude: Some(3.0),
            longitude: Some(4.0),
        };
        let (url, location) = record.anchor_parts().unwrap();
        assert_eq!(url, "http://x/7.jpg");
        assert_eq!(location, GeoLocation::new(3.0, 4.0));
    }
}
