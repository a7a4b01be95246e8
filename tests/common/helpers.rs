#![allow(dead_code)]

use ffspeed::engine::{CommandPlan, FrameRate, JobSpec, QualityTier};
use std::sync::{Arc, Mutex};

/// Build a job with the usual defaults (30 fps, High)
pub fn job(source: &str, speed: f64) -> JobSpec {
    JobSpec::new(source, speed, FrameRate::Fps(30), QualityTier::High)
}

pub fn jobs(sources: &[&str]) -> Vec<JobSpec> {
    sources.iter().map(|source| job(source, 2.0)).collect()
}

/// Last value following `flag` in an argument list
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .rev()
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Position of `flag` in an argument list
pub fn flag_index(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|arg| arg == flag)
}

/// Shared log of plans seen by a scripted transcoder
#[derive(Clone, Default)]
pub struct PlanLog(Arc<Mutex<Vec<Vec<String>>>>);

impl PlanLog {
    pub fn record(&self, plan: &CommandPlan) {
        self.0.lock().unwrap().push(plan.args_lossy());
    }

    pub fn plans(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}
