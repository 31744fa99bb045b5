use chrono::NaiveDateTime;

/// First-fit lane packing of intervals already sorted by start.
///
/// Returns the input positions placed in each lane. An interval goes into
/// the first lane whose last end is at or before its start, so
/// back-to-back intervals share a lane. Zero-length intervals cover no time
/// and join the first lane. With start-sorted input the lane count equals the
/// largest number of intervals overlapping at one instant (at least one when
/// the input is not empty).
pub fn pack_lanes(sorted: &[(NaiveDateTime, NaiveDateTime)]) -> Vec<Vec<usize>> {
    let mut lane_ends: Vec<NaiveDateTime> = Vec::new();
    let mut lanes: Vec<Vec<usize>> = Vec::new();

    for (pos, &(start, end)) in sorted.iter().enumerate() {
        match lane_ends
            .iter()
            .position(|&last| last <= start || start == end)
        {
            Some(lane) => {
                lane_ends[lane] = lane_ends[lane].max(end);
                lanes[lane].push(pos);
            }
            None => {
                lane_ends.push(end);
                lanes.push(vec![pos]);
            }
        }
    }
    lanes
}
