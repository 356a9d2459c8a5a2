use crate::data::bar::Bar;
use crate::error::ValidationError;

//computes relative return strength (asset close / benchmark close) for each asset bar
//each asset bar is matched to the latest benchmark bar at or before its timestamp
//asset bars that precede the whole benchmark series are dropped
//benchmark timestamps must be strictly increasing; asset order is checked by the simulator
pub fn attach_relative_strength(
    asset: &[Bar],
    benchmark: &[Bar],
) -> Result<Vec<Bar>, ValidationError> {
    if asset.is_empty() {
        return Err(ValidationError::EmptySeries { series: "asset" });
    }
    if benchmark.is_empty() {
        return Err(ValidationError::EmptySeries {
            series: "benchmark",
        });
    }

    if let Some(offset) = benchmark
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(ValidationError::NonMonotonic { index: offset + 1 });
    }

    let mut merged = Vec::with_capacity(asset.len());
    let mut cursor = 0;
    let mut matched: Option<usize> = None;

    for bar in asset {
        //advance to the last benchmark bar not after this asset bar
        while cursor < benchmark.len() && benchmark[cursor].timestamp <= bar.timestamp {
            matched = Some(cursor);
            cursor += 1;
        }

        let Some(index) = matched else {
            continue;
        };

        let reference = benchmark[index].close;
        if !(reference.is_finite() && reference > 0.0) {
            return Err(ValidationError::InvalidField {
                field: "close",
                index,
                reason: format!("benchmark close must be positive, got {}", reference),
            });
        }

        merged.push(bar.clone().with_indicator(bar.close / reference));
    }

    let dropped = asset.len() - merged.len();
    if dropped > 0 {
        tracing::debug!(dropped, "asset bars without a benchmark match were dropped");
    }

    Ok(merged)
}
