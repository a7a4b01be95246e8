//! Video and audio filter planning for speed changes.
//!
//! Video speed is a timestamp rewrite (`setpts`). Audio uses `atempo`,
//! whose factor is only valid inside `[0.5, 2.0]`, so larger changes are
//! expressed as a chain of stages whose product is the requested speed.

/// Largest factor a single tempo stage accepts
pub const MAX_TEMPO_STAGE: f64 = 2.0;

/// Smallest factor a single tempo stage accepts
pub const MIN_TEMPO_STAGE: f64 = 0.5;

/// Filter expressions for one speed multiplier
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    pub video: String,
    pub audio_stages: Vec<f64>,
}

impl FilterPlan {
    /// Audio filter graph, e.g. `atempo=2.0,atempo=1.5`
    pub fn audio_filter(&self) -> String {
        self.audio_stages
            .iter()
            .map(|stage| format!("atempo={}", format_number(*stage)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Format a float with the shortest exact representation, keeping one
/// decimal for whole numbers (`2.0`, `0.5`, `0.3333333333333333`)
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Timestamp scale filter for the video stream
pub fn video_filter(speed: f64) -> String {
    format!("setpts={}*PTS", format_number(1.0 / speed))
}

/// Split a tempo factor into stages that are each within the `atempo` range
///
/// Callers must pass a positive speed.
pub fn tempo_stages(speed: f64) -> Vec<f64> {
    if speed < MIN_TEMPO_STAGE {
        return slow_down_stages(speed);
    }

    let mut stages = vec![speed.min(MAX_TEMPO_STAGE)];

    if speed > MAX_TEMPO_STAGE {
        let mut remaining = speed / MAX_TEMPO_STAGE;
        while remaining > MAX_TEMPO_STAGE {
            stages.push(MAX_TEMPO_STAGE);
            remaining /= MAX_TEMPO_STAGE;
        }
        if remaining > 1.0 {
            stages.push(remaining);
        }
    }

    stages
}

fn slow_down_stages(speed: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    let mut remaining = speed;

    while remaining < MIN_TEMPO_STAGE {
        stages.push(MIN_TEMPO_STAGE);
        remaining /= MIN_TEMPO_STAGE;
    }
    if remaining < 1.0 {
        stages.push(remaining);
    }

    stages
}

/// Plan both filter graphs for a speed multiplier
pub fn plan_filters(speed: f64) -> FilterPlan {
    FilterPlan {
        video: video_filter(speed),
        audio_stages: tempo_stages(speed),
    }
}
