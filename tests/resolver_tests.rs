//! Device resolution against a mock FHEM installation

mod common;

use common::fixtures::{installation, mock_client, ROOM};
use fhem_voice_rust::client::{DeviceClassFilter, FhemEntity};
use fhem_voice_rust::mock::MockFhemClient;
use fhem_voice_rust::services::normalizer::normalize;
use fhem_voice_rust::services::resolver::{self, comparison_name, GENERAL_FLOOR};
use fhem_voice_rust::FhemError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[case("ceiling light", "WZ_DeckenLicht")]
#[case("kitchen lamp", "lamp")]
#[case("lamp kitchen", "lamp")]
#[case("bedroom lamp", "lamp2")]
#[case("coffee outlet", "coffee_outlet")]
#[tokio::test]
async fn test_resolves_switchables(
    mock_client: Arc<MockFhemClient>,
    #[case] fragment: &str,
    #[case] expected: &str,
) {
    let resolved = resolver::resolve(
        mock_client.as_ref(),
        fragment,
        ROOM,
        &DeviceClassFilter::switchable(),
        &[],
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(resolved.entity_id, expected);
    assert!(resolved.match_score > GENERAL_FLOOR);
}

#[rstest]
#[tokio::test]
async fn test_devices_outside_active_room_never_win(mock_client: Arc<MockFhemClient>) {
    let resolved = resolver::resolve(
        mock_client.as_ref(),
        "cellar light",
        ROOM,
        &DeviceClassFilter::switchable(),
        &[],
    )
    .await
    .unwrap();

    assert!(resolved.map_or(true, |r| r.entity_id != "cellar_light"));
}

#[rstest]
#[tokio::test]
async fn test_class_filter_limits_candidates(mock_client: Arc<MockFhemClient>) {
    let resolved = resolver::resolve(
        mock_client.as_ref(),
        "kitchen lamp",
        ROOM,
        &DeviceClassFilter::sensors(),
        &[],
    )
    .await
    .unwrap();
    assert_eq!(resolved, None);
}

#[rstest]
#[tokio::test]
async fn test_resolution_is_idempotent(mock_client: Arc<MockFhemClient>) {
    let filter = DeviceClassFilter::switchable();
    let first = resolver::resolve(mock_client.as_ref(), "bedroom lamp", ROOM, &filter, &[])
        .await
        .unwrap();
    let second = resolver::resolve(mock_client.as_ref(), "bedroom lamp", ROOM, &filter, &[])
        .await
        .unwrap();

    assert_eq!(first, second);
    // Every resolution goes back to the backend
    assert_eq!(mock_client.query_count(), 2);
}

#[rstest]
fn test_normalize_is_idempotent_over_installation(installation: Vec<FhemEntity>) {
    for entity in installation {
        let once = normalize(&entity.name);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_room_augmentation_excludes_active_room() {
    let lamp = FhemEntity::new("Lamp")
        .with_attribute("room", "livingroom,kitchen")
        .with_reading("state", "off");

    assert_eq!(comparison_name(&lamp, "livingroom", &[]), "lamp kitchen");
    assert_eq!(comparison_name(&lamp, "livingroom", &["kitchen".to_string()]), "lamp");
}

#[tokio::test]
async fn test_livingroom_lamp_scores_against_augmented_name() {
    let client = MockFhemClient::new().with_entity(
        FhemEntity::new("Lamp")
            .with_attribute("room", "livingroom,kitchen")
            .with_attribute("genericDeviceType", "light")
            .with_reading("state", "off"),
    );

    let resolved = resolver::resolve(
        &client,
        "kitchen lamp",
        "livingroom",
        &DeviceClassFilter::switchable(),
        &[],
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(resolved.entity_id, "Lamp");
    assert_eq!(resolved.match_score, 100);

    // "livingroom lamp" is compared with "lamp kitchen", not "lamp livingroom"
    let resolved = resolver::resolve(
        &client,
        "livingroom lamp",
        "livingroom",
        &DeviceClassFilter::switchable(),
        &[],
    )
    .await
    .unwrap();
    assert!(resolved.map_or(true, |r| r.match_score < 100));
}

#[tokio::test]
async fn test_malformed_candidates_are_skipped() {
    let client = MockFhemClient::new().with_entities([
        FhemEntity::new("hall_light")
            .with_attribute("room", ROOM)
            .with_attribute("genericDeviceType", "light"),
        FhemEntity::new("hall_lights")
            .with_attribute("room", ROOM)
            .with_attribute("genericDeviceType", "light")
            .with_reading("state", "on"),
    ]);

    let resolved = resolver::resolve(&client, "hall light", ROOM, &DeviceClassFilter::switchable(), &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.entity_id, "hall_lights");
    assert_eq!(resolved.current_state, "on");
}

#[tokio::test]
async fn test_backend_failure_propagates() {
    let client = MockFhemClient::new().offline();
    let result = resolver::resolve(&client, "lamp", ROOM, &DeviceClassFilter::switchable(), &[]).await;
    assert!(matches!(result, Err(FhemError::BackendUnavailable(_))));
}

#[rstest]
#[tokio::test]
async fn test_roommate_resolution(mock_client: Arc<MockFhemClient>) {
    let found = resolver::resolve_roommate(mock_client.as_ref(), "anna", ROOM)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.entity_id, "rr_anna");
    assert_eq!(found.presence, "present");

    let missing = resolver::resolve_roommate(mock_client.as_ref(), "bob", ROOM).await.unwrap();
    assert_eq!(missing, None);
}
