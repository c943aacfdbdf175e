//! Candidate fetching
//!
//! One backend query per resolution request. Results are never cached, and
//! connectivity failures propagate to the caller untouched.

use crate::client::{DeviceClassFilter, EntityQuery, FhemClient, FhemEntity};
use crate::error::Result;
use tracing::debug;

/// All entities in `room` whose device class matches `filter`, in backend order
pub async fn fetch_candidates(
    client: &dyn FhemClient,
    room: &str,
    filter: &DeviceClassFilter,
) -> Result<Vec<FhemEntity>> {
    let query = EntityQuery::new().in_room(room).with_class(filter);
    let candidates = client.query(&query).await?;
    debug!(
        room,
        filter = %filter,
        count = candidates.len(),
        "Fetched resolution candidates"
    );
    Ok(candidates)
}

/// All entities of an FHEM module type in `room`, in backend order
pub async fn fetch_by_type(
    client: &dyn FhemClient,
    room: &str,
    device_type: &str,
) -> Result<Vec<FhemEntity>> {
    let query = EntityQuery::new().in_room(room).of_type(device_type);
    let candidates = client.query(&query).await?;
    debug!(
        room,
        device_type,
        count = candidates.len(),
        "Fetched typed candidates"
    );
    Ok(candidates)
}
