//! Replays calculation steps as a marker moving along the number line.
//!
//! The driver is a plain state machine: the front-end feeds it the current
//! [`Instant`] from its event loop and asks for the next deadline to decide
//! how long it may block waiting for input. Only one timer (a tick schedule
//! or a pause) exists at any moment, and replacing the steps cancels it.

use crate::calc_engine::CalculationStep;
use log::trace;
use std::time::{Duration, Instant};

/// Wait before leaving a step whose start and target coincide.
pub const SETTLE_PAUSE: Duration = Duration::from_millis(500);
/// Wait after the marker snaps onto a step's target.
pub const ARRIVAL_PAUSE: Duration = Duration::from_millis(1000);

const TOTAL_MOTION_MS: f64 = 5000.0;
const MAX_TICK_MS: f64 = 400.0;

pub fn increment_for(distance: f64) -> f64 {
    if distance > 100.0 {
        10.0
    } else if distance > 20.0 {
        2.0
    } else {
        1.0
    }
}

/// Tick schedule for moving between two distinct finite positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub start: f64,
    pub target: f64,
    pub increment: f64,
    pub tick_count: f64,
    pub tick_delay: Duration,
}

impl Motion {
    pub fn plan(start: f64, target: f64) -> Option<Motion> {
        let distance = (target - start).abs();
        // концы у самого f64::MAX дают бесконечную дистанцию
        if start == target || !distance.is_finite() {
            return None;
        }
        let increment = increment_for(distance);
        let tick_count = (distance / increment).ceil();
        let delay_ms = (TOTAL_MOTION_MS / tick_count.max(1.0)).min(MAX_TICK_MS);

        Some(Motion {
            start,
            target,
            increment,
            tick_count,
            tick_delay: Duration::from_secs_f64(delay_ms / 1000.0),
        })
    }

    pub fn direction(&self) -> f64 {
        if self.target > self.start { 1.0 } else { -1.0 }
    }

    pub fn position_at(&self, tick: f64) -> f64 {
        self.start + self.direction() * self.increment * tick
    }

    pub fn reached(&self, position: f64) -> bool {
        if self.direction() > 0.0 {
            position >= self.target
        } else {
            position <= self.target
        }
    }

    fn elapsed_for(&self, tick: f64) -> Duration {
        if tick <= u32::MAX as f64 {
            self.tick_delay * tick as u32
        } else {
            self.tick_delay.mul_f64(tick)
        }
    }

    fn tick_time(&self, origin: Instant, tick: f64) -> Instant {
        origin + self.elapsed_for(tick)
    }

    fn ticks_due(&self, origin: Instant, now: Instant) -> f64 {
        let delay = self.tick_delay.as_nanos();
        if delay == 0 {
            return self.tick_count;
        }
        (now.saturating_duration_since(origin).as_nanos() / delay) as f64
    }

    pub fn total_duration(&self) -> Duration {
        self.elapsed_for(self.tick_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub current_position: f64,
    pub animation_step_index: usize,
    pub is_animating: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        AnimationState {
            current_position: 0.0,
            animation_step_index: 0,
            is_animating: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Stepping(usize),
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    None,
    Pause { until: Instant },
    Ticking { motion: Motion, origin: Instant, ticks_done: f64 },
}

#[derive(Debug)]
pub struct Animator {
    steps: Vec<CalculationStep>,
    state: AnimationState,
    phase: Phase,
    timer: Timer,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    pub fn new() -> Self {
        Animator {
            steps: Vec::new(),
            state: AnimationState::default(),
            phase: Phase::Idle,
            timer: Timer::None,
        }
    }

    /// Installs a new step sequence and enters `Stepping(0)`, dropping any
    /// timer left over from the previous sequence.
    pub fn start(&mut self, steps: Vec<CalculationStep>, now: Instant) {
        self.cancel();
        self.state = AnimationState {
            current_position: steps.first().map_or(0.0, |s| s.position),
            animation_step_index: 0,
            is_animating: true,
        };
        self.steps = steps;
        trace!("animation started with {} steps", self.steps.len());
        self.enter_step(0, now);
    }

    /// Stops the outstanding timer. The marker stays where it is.
    pub fn cancel(&mut self) {
        if !matches!(self.timer, Timer::None) {
            trace!("animation cancelled in {:?}", self.phase);
        }
        self.timer = Timer::None;
        self.phase = Phase::Idle;
        self.state.is_animating = false;
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    /// Step whose description accompanies the marker: the one finished last.
    pub fn last_completed_step(&self) -> Option<&CalculationStep> {
        let index = self.state.animation_step_index;
        if index == 0 {
            return None;
        }
        self.steps.get(index - 1)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.timer {
            Timer::None => None,
            Timer::Pause { until } => Some(until),
            Timer::Ticking { motion, origin, ticks_done } => {
                Some(motion.tick_time(origin, ticks_done + 1.0))
            }
        }
    }

    /// Fires every timer event due at `now`. Returns whether anything changed.
    pub fn update(&mut self, now: Instant) -> bool {
        let mut changed = false;

        loop {
            match self.timer {
                Timer::None => break,
                Timer::Pause { until } => {
                    if now < until {
                        break;
                    }
                    let next = self.state.animation_step_index + 1;
                    self.enter_step(next, until);
                    changed = true;
                }
                Timer::Ticking { motion, origin, ticks_done } => {
                    let due = motion.ticks_due(origin, now);
                    if due <= ticks_done {
                        break;
                    }
                    let tick = due.min(motion.tick_count);
                    let position = motion.position_at(tick);
                    if tick >= motion.tick_count || motion.reached(position) {
                        // snap
                        self.state.current_position = motion.target;
                        let arrived = motion.tick_time(origin, tick);
                        trace!("arrived at {} after {} ticks", motion.target, tick);
                        self.timer = Timer::Pause { until: arrived + ARRIVAL_PAUSE };
                    } else {
                        self.state.current_position = position;
                        self.timer = Timer::Ticking { motion, origin, ticks_done: tick };
                    }
                    changed = true;
                }
            }
        }
        changed
    }

    fn enter_step(&mut self, index: usize, at: Instant) {
        self.state.animation_step_index = index;

        if index >= self.steps.len() {
            trace!("animation finished");
            self.phase = Phase::Idle;
            self.timer = Timer::None;
            self.state.is_animating = false;
            return;
        }

        self.phase = Phase::Stepping(index);
        let target = self.steps[index].position;
        let start = if index == 0 { target } else { self.steps[index - 1].position };

        self.timer = if start == target {
            Timer::Pause { until: at + SETTLE_PAUSE }
        } else {
            match Motion::plan(start, target) {
                Some(motion) => {
                    trace!(
                        "step {}: {} -> {} by {} every {:?}, {:?} in total",
                        index, start, target, motion.increment, motion.tick_delay, motion.total_duration()
                    );
                    Timer::Ticking { motion, origin: at, ticks_done: 0.0 }
                }
                None => {
                    // бесконечность или NaN: сразу на цель
                    self.state.current_position = target;
                    Timer::Pause { until: at + ARRIVAL_PAUSE }
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc_engine::{derive_steps, solve, tokenize};
    use crate::i18n::Language;
    use pretty_assertions::assert_eq;

    fn steps(expr: &str) -> Vec<CalculationStep> {
        derive_steps(&tokenize(expr), Language::En)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn increments_depend_on_distance() {
        assert_eq!(increment_for(150.0), 10.0);
        assert_eq!(increment_for(100.0), 2.0);
        assert_eq!(increment_for(21.0), 2.0);
        assert_eq!(increment_for(20.0), 1.0);
        assert_eq!(increment_for(0.5), 1.0);
    }

    #[test]
    fn plan_long_motion() {
        let motion = Motion::plan(0.0, 150.0).unwrap();
        assert_eq!(motion.increment, 10.0);
        assert_eq!(motion.tick_count, 15.0);
        assert_eq!(motion.tick_delay.as_millis(), 333);
        assert!(motion.total_duration() <= Duration::from_secs(5));
    }

    #[test]
    fn plan_short_motion_is_capped() {
        let motion = Motion::plan(5.0, 8.0).unwrap();
        assert_eq!(motion.increment, 1.0);
        assert_eq!(motion.tick_count, 3.0);
        assert_eq!(motion.tick_delay, ms(400));
    }

    #[test]
    fn plan_rejects_degenerate_motion() {
        assert_eq!(Motion::plan(3.0, 3.0), None);
        assert_eq!(Motion::plan(3.0, f64::INFINITY), None);
        assert_eq!(Motion::plan(f64::NAN, 1.0), None);
        assert_eq!(Motion::plan(f64::MAX, -f64::MAX), None);
    }

    #[test]
    fn overflowing_distance_snaps_and_finishes() {
        let expr = format!("17{}*-1*-1", "0".repeat(307));
        let solution = solve(&expr, Language::En);
        let positions: Vec<f64> = solution.steps.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1.7e308, -1.7e308, 1.7e308]);

        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(solution.steps, t0);
        animator.update(t0 + SETTLE_PAUSE);
        assert_eq!(animator.phase(), Phase::Stepping(1));
        assert_eq!(animator.state().current_position, -1.7e308);
        assert_eq!(animator.next_deadline(), Some(t0 + SETTLE_PAUSE + ARRIVAL_PAUSE));

        animator.update(t0 + Duration::from_secs(10));
        assert_eq!(animator.phase(), Phase::Idle);
        assert_eq!(animator.state().current_position, 1.7e308);
    }

    #[test]
    fn motion_from_zero_to_150_snaps_on_the_last_tick() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("0+150"), t0);
        assert_eq!(animator.phase(), Phase::Stepping(0));
        assert_eq!(animator.state().current_position, 0.0);

        let motion_start = t0 + SETTLE_PAUSE;
        assert!(animator.update(motion_start));
        assert_eq!(animator.phase(), Phase::Stepping(1));

        let motion = Motion::plan(0.0, 150.0).unwrap();
        for k in 1..15u32 {
            animator.update(motion_start + motion.tick_delay * k);
            assert_eq!(animator.state().current_position, 10.0 * k as f64);
        }
        let last = motion_start + motion.tick_delay * 15;
        assert_eq!(animator.next_deadline(), Some(last));
        animator.update(last);
        assert_eq!(animator.state().current_position, 150.0);
        assert!(animator.is_animating());

        assert_eq!(animator.next_deadline(), Some(last + ARRIVAL_PAUSE));
        animator.update(last + ARRIVAL_PAUSE);
        assert_eq!(animator.phase(), Phase::Idle);
        assert!(!animator.is_animating());
        assert_eq!(animator.state().animation_step_index, 2);
        assert_eq!(animator.next_deadline(), None);
    }

    #[test]
    fn nothing_happens_before_the_first_deadline() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("5+3"), t0);
        assert!(!animator.update(t0 + ms(499)));
        assert_eq!(animator.phase(), Phase::Stepping(0));
        assert_eq!(animator.last_completed_step(), None);
    }

    #[test]
    fn walks_down_one_unit_per_tick() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("10-4"), t0);
        let motion_start = t0 + SETTLE_PAUSE;
        animator.update(motion_start);
        assert_eq!(animator.last_completed_step().map(|s| s.position), Some(10.0));

        let mut seen = Vec::new();
        for k in 1..=4u32 {
            animator.update(motion_start + ms(400) * k);
            seen.push(animator.state().current_position);
        }
        assert_eq!(seen, vec![9.0, 8.0, 7.0, 6.0]);
    }

    #[test]
    fn overshooting_tick_snaps_to_target() {
        // 0 -> 25: increment 2, 13 ticks, 13th tick would land on 26
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("0+25"), t0);
        let motion = Motion::plan(0.0, 25.0).unwrap();
        assert_eq!(motion.tick_count, 13.0);

        let motion_start = t0 + SETTLE_PAUSE;
        animator.update(motion_start);
        animator.update(motion_start + motion.tick_delay * 12);
        assert_eq!(animator.state().current_position, 24.0);
        animator.update(motion_start + motion.tick_delay * 13);
        assert_eq!(animator.state().current_position, 25.0);
    }

    #[test]
    fn late_poll_catches_up_without_replaying_ticks() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("5+3-2"), t0);
        // 500 + 3*400 + 1000 + 2*400 + 1000
        assert!(animator.update(t0 + ms(4500)));
        assert_eq!(animator.phase(), Phase::Idle);
        assert_eq!(animator.state().current_position, 6.0);
        assert_eq!(animator.last_completed_step().map(|s| s.position), Some(6.0));
    }

    #[test]
    fn equal_positions_only_pause() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("4*1"), t0);
        animator.update(t0 + SETTLE_PAUSE);
        assert_eq!(animator.phase(), Phase::Stepping(1));
        assert_eq!(animator.next_deadline(), Some(t0 + SETTLE_PAUSE * 2));
        animator.update(t0 + SETTLE_PAUSE * 2);
        assert_eq!(animator.phase(), Phase::Idle);
        assert_eq!(animator.state().current_position, 4.0);
    }

    #[test]
    fn infinite_target_jumps_straight_there() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("5/0"), t0);
        animator.update(t0 + SETTLE_PAUSE);
        assert_eq!(animator.state().current_position, f64::INFINITY);
        assert_eq!(animator.next_deadline(), Some(t0 + SETTLE_PAUSE + ARRIVAL_PAUSE));
    }

    #[test]
    fn empty_steps_finish_immediately() {
        let mut animator = Animator::new();
        animator.start(Vec::new(), Instant::now());
        assert_eq!(animator.phase(), Phase::Idle);
        assert!(!animator.is_animating());
        assert_eq!(animator.state().current_position, 0.0);
    }

    #[test]
    fn restarting_cancels_the_running_timer() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("0+150"), t0);
        animator.update(t0 + ms(2000));
        assert!(animator.state().current_position > 0.0);

        let t1 = t0 + ms(2100);
        animator.start(steps("10-4"), t1);
        assert_eq!(animator.phase(), Phase::Stepping(0));
        assert_eq!(animator.state().current_position, 10.0);
        assert_eq!(animator.next_deadline(), Some(t1 + SETTLE_PAUSE));
    }

    #[test]
    fn resubmission_after_completion_is_identical() {
        let first = solve("15 - 7", Language::En);
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(first.steps.clone(), t0);
        animator.update(t0 + Duration::from_secs(60));
        assert_eq!(animator.phase(), Phase::Idle);

        let second = solve("15 - 7", Language::En);
        assert_eq!(first, second);
        let t1 = t0 + Duration::from_secs(61);
        animator.start(second.steps, t1);
        assert_eq!(animator.phase(), Phase::Stepping(0));
        assert_eq!(
            animator.state(),
            AnimationState { current_position: 15.0, animation_step_index: 0, is_animating: true }
        );
        assert_eq!(animator.steps(), first.steps.as_slice());
    }

    #[test]
    fn cancel_stops_at_current_position() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.start(steps("0+10"), t0);
        animator.update(t0 + SETTLE_PAUSE + ms(400) * 3);
        animator.cancel();
        assert_eq!(animator.state().current_position, 3.0);
        assert!(!animator.is_animating());
        assert!(!animator.update(t0 + Duration::from_secs(30)));
    }
}
