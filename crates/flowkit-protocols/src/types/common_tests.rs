use super::*;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct Stamped {
    #[serde(with = "rfc3339_nanos")]
    at: DateTime<Utc>,
}

#[test]
fn test_rfc3339_nanos_keeps_all_digits() {
    let at = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
    let json = serde_json::to_string(&Stamped { at }).unwrap();
    assert!(json.contains("2023-11-14T22:13:20.000000005Z"));
}

#[test]
fn test_rfc3339_nanos_parses_offsets() {
    let parsed: Stamped =
        serde_json::from_str(r#"{"at":"2024-01-01T02:00:00.000000001+02:00"}"#).unwrap();
    assert_eq!(parsed.at, Utc.timestamp_opt(1_704_067_200, 1).unwrap());
}

#[test]
fn test_rfc3339_nanos_rejects_garbage() {
    let result = serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#);
    assert!(result.is_err());
}

#[test]
fn test_well_known_keys() {
    assert_eq!(keys::SESSION_ID, "session_id");
    assert_eq!(keys::ROUTE_TO, "route_to");
    assert_eq!(keys::LOOP_COMPLETED, "loop_completed");
}
