use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::AbortHandle;

use crate::config::AnimationTiming;
use crate::models::{KpiKey, KpiSet};

/// Text currently shown for each KPI, plus the number behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiDisplays {
    values: [f64; 5],
    texts: [String; 5],
}

impl Default for KpiDisplays {
    fn default() -> Self {
        Self {
            values: [0.0; 5],
            texts: std::array::from_fn(|_| "0".to_string()),
        }
    }
}

impl KpiDisplays {
    pub fn text(&self, key: KpiKey) -> &str {
        &self.texts[key.index()]
    }

    pub fn value(&self, key: KpiKey) -> f64 {
        self.values[key.index()]
    }

    fn set(&mut self, key: KpiKey, value: f64, text: String) {
        self.values[key.index()] = value;
        self.texts[key.index()] = text;
    }
}

enum Frame {
    Partial(f64),
    Done(f64),
}

/// Count-up from zero in steps of `target / frames`.
struct CountUp {
    target: f64,
    step: f64,
    running: f64,
}

impl CountUp {
    fn new(target: f64, timing: &AnimationTiming) -> Self {
        Self {
            target,
            step: target / timing.frames(),
            running: 0.0,
        }
    }

    fn advance(&mut self) -> Frame {
        let next = self.running + self.step;
        // A step too small to move `running` would never reach the target.
        if next >= self.target || next <= self.running {
            self.running = self.target;
            return Frame::Done(self.target);
        }
        self.running = next;
        Frame::Partial(next)
    }
}

fn apply(displays: &Mutex<KpiDisplays>, key: KpiKey, frame: &Frame) {
    let mut displays = displays.lock();
    match *frame {
        Frame::Partial(running) => displays.set(key, running, format_kpi(running.floor())),
        Frame::Done(target) => displays.set(key, target, format_kpi(target)),
    }
}

pub struct KpiAnimator {
    displays: Arc<Mutex<KpiDisplays>>,
    running: [Option<AbortHandle>; 5],
    timing: AnimationTiming,
}

impl KpiAnimator {
    pub fn new(timing: AnimationTiming) -> Self {
        Self {
            displays: Arc::new(Mutex::new(KpiDisplays::default())),
            running: Default::default(),
            timing,
        }
    }

    /// Animates every KPI toward its value in `kpis`. Must be called inside a tokio runtime.
    pub fn show(&mut self, kpis: &KpiSet) {
        for key in KpiKey::ALL {
            self.animate(key, kpis.get(key));
        }
    }

    pub fn reset(&mut self) {
        self.show(&KpiSet::default());
    }

    pub fn displays(&self) -> KpiDisplays {
        self.displays.lock().clone()
    }

    pub fn is_animating(&self) -> bool {
        self.running
            .iter()
            .flatten()
            .any(|handle| !handle.is_finished())
    }

    fn animate(&mut self, key: KpiKey, target: f64) {
        if let Some(previous) = self.running[key.index()].take() {
            previous.abort();
        }

        // First frame runs synchronously, the rest on the frame clock.
        let mut count = CountUp::new(target, &self.timing);
        let frame = count.advance();
        apply(&self.displays, key, &frame);
        if matches!(frame, Frame::Done(_)) {
            return;
        }

        let displays = Arc::clone(&self.displays);
        let interval = self.timing.frame_interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let frame = count.advance();
                apply(&displays, key, &frame);
                if matches!(frame, Frame::Done(_)) {
                    break;
                }
            }
        });
        tracing::debug!("Animating KPI {} toward {}", key.as_str(), target);
        self.running[key.index()] = Some(handle.abort_handle());
    }
}

impl Drop for KpiAnimator {
    fn drop(&mut self) {
        for handle in self.running.iter_mut().filter_map(Option::take) {
            handle.abort();
        }
    }
}

/// Grouped thousands, at most three fraction digits: `1234.5` -> `1,234.5`.
pub fn format_kpi(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let scaled = value * 1000.0;
    let rounded = if scaled.is_finite() {
        scaled.round() / 1000.0
    } else {
        value
    };
    let negative = rounded < 0.0;
    let abs = rounded.abs();
    let whole = abs.trunc();

    let digits = format!("{:.0}", whole);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let fraction = format!("{:.3}", abs - whole);
    let fraction = fraction
        .split_once('.')
        .map(|(_, digits)| digits.trim_end_matches('0'))
        .unwrap_or("");

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}
