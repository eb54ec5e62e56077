//! Single-pass fold of a wave stream into classified collections and
//! rolling period statistics.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::stats::{MovingAverage, MovingMax, MovingMin, PeriodComputer};
use crate::wave::{Wave, WaveType};

/// A period extremum and the absolute time of the beat that set it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    /// Beat period in milliseconds.
    pub period: f64,
    pub time: NaiveDateTime,
}

/// Snapshot of the period statistics over all QRS waves fed so far.
///
/// `min`/`max` are absent until a first period has been observed;
/// `average` floors to 0.0 in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub average: f64,
    pub min: Option<Extremum>,
    pub max: Option<Extremum>,
}

fn ms_offset(ms: f64) -> Duration {
    Duration::microseconds((ms * 1_000.0).round() as i64)
}

/// Aggregates one full record pass.
///
/// Waves are classified by type into insertion-ordered collections;
/// QRS onsets additionally drive the period accumulators. Nothing is
/// removed or reordered for the lifetime of the run.
pub struct Measurements {
    period: PeriodComputer,
    average: MovingAverage,
    min: MovingMin,
    max: MovingMax,

    start_time: NaiveDateTime,
    time_last_sampling: NaiveDateTime,
    time_min: Option<NaiveDateTime>,
    time_max: Option<NaiveDateTime>,

    p: Vec<Wave>,
    qrs: Vec<Wave>,
    t: Vec<Wave>,
    inv: Vec<Wave>,
    heartbeat_periods: Vec<(f64, f64)>,
}

impl Measurements {
    /// `start_time` is the wall-clock time of record offset 0; it also
    /// seeds the time of last sampling until the first QRS arrives.
    pub fn new(start_time: NaiveDateTime) -> Self {
        Self {
            period: PeriodComputer::new(),
            average: MovingAverage::new(),
            min: MovingMin::new(),
            max: MovingMax::new(),
            start_time,
            time_last_sampling: start_time,
            time_min: None,
            time_max: None,
            p: Vec::new(),
            qrs: Vec::new(),
            t: Vec::new(),
            inv: Vec::new(),
            heartbeat_periods: Vec::new(),
        }
    }

    /// Fold one wave into the run.
    pub fn update(&mut self, wave: Wave) {
        if wave.kind == WaveType::Qrs {
            let sampled_at = self.start_time + ms_offset(wave.timing.onset);
            self.time_last_sampling = sampled_at;

            if let Some(period) = self.period.push(wave.timing.onset) {
                self.average.push(period);
                if self.min.push(period) {
                    self.time_min = Some(sampled_at);
                }
                if self.max.push(period) {
                    self.time_max = Some(sampled_at);
                }
                self.heartbeat_periods.push((period, wave.timing.onset));
            }
        }

        match wave.kind {
            WaveType::P => self.p.push(wave),
            WaveType::Qrs => self.qrs.push(wave),
            WaveType::T => self.t.push(wave),
            WaveType::Inv => self.inv.push(wave),
        }
    }

    /// Current period statistics; reflects every QRS fed so far.
    pub fn summary(&self) -> Summary {
        Summary {
            average: self.average.value(),
            min: self
                .min
                .value()
                .zip(self.time_min)
                .map(|(period, time)| Extremum { period, time }),
            max: self
                .max
                .value()
                .zip(self.time_max)
                .map(|(period, time)| Extremum { period, time }),
        }
    }

    pub fn p(&self) -> &[Wave] {
        &self.p
    }

    pub fn qrs(&self) -> &[Wave] {
        &self.qrs
    }

    pub fn t(&self) -> &[Wave] {
        &self.t
    }

    pub fn inv(&self) -> &[Wave] {
        &self.inv
    }

    /// Absolute time of the latest QRS onset, or the record start before
    /// any QRS has been seen.
    pub fn time_last_sampling(&self) -> NaiveDateTime {
        self.time_last_sampling
    }

    /// `(period ms, onset ms)` for every QRS after the first, in order.
    pub fn heartbeat_periods(&self) -> &[(f64, f64)] {
        &self.heartbeat_periods
    }
}
