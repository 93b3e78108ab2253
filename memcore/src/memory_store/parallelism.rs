/// Number of segments to split the keyspace into. An explicitly configured
/// value is rounded up to a power of two, otherwise the count is derived
/// from the available parallelism.
pub fn segment_count(configured: Option<usize>) -> usize {
    match configured {
        Some(segments) => segments.clamp(1, MAX_SEGMENTS).next_power_of_two(),
        None => {
            let parallelism = std::thread::available_parallelism().map_or(1, usize::from);
            get_number_of_segments(parallelism)
        }
    }
}

const MAX_SEGMENTS: usize = 1 << 16;

// Square of the parallelism divided by 4, rounded down to the closest power of 2.
pub fn get_number_of_segments(parallelism: usize) -> usize {
    let parallelism = parallelism.clamp(2, 192);

    let optimal_number_segments = parallelism.pow(2) / 4;
    if optimal_number_segments < 2 {
        return 2;
    }

    let closest_power_of_2 = optimal_number_segments.ilog2();
    let segments = 2usize.pow(closest_power_of_2);
    debug!(
        "Available parallelism: {}, optimal number of segments: {}, using: {}",
        parallelism, optimal_number_segments, segments
    );
    segments.max(2)
}
