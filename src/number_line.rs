/// Ticks shown on each side of the centre of the number line.
pub const HALF_SPAN: i64 = 4;

// за пределами этого диапазона f64 уже не различает соседние целые
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub points: Vec<i64>,
    pub result_tick: Option<i64>,
    pub marker: Option<i64>,
}

impl Window {
    /// Horizontal placement of a tick as a fraction of the line's width,
    /// leaving a 5% margin at each end.
    pub fn fraction(&self, point: i64) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(&first), Some(&last)) if last > first => {
                (point - first) as f64 / (last - first) as f64 * 0.9 + 0.05
            }
            _ => 0.5,
        }
    }
}

/// Rounds half-way values up, the way the tick labels are chosen.
pub fn round_to_tick(value: f64) -> Option<i64> {
    let rounded = (value + 0.5).floor();
    if rounded.is_finite() && rounded.abs() < MAX_EXACT_INT {
        Some(rounded as i64)
    } else {
        None
    }
}

pub fn window(result: Option<f64>, current: f64, is_animating: bool) -> Option<Window> {
    let result = result?;
    let centre = if is_animating { current } else { result };

    let Some(centre) = round_to_tick(centre) else {
        return Some(Window { points: Vec::new(), result_tick: None, marker: None });
    };

    let points: Vec<i64> = (centre - HALF_SPAN..=centre + HALF_SPAN).collect();
    let result_tick = round_to_tick(result).filter(|r| points.contains(r));
    let marker = if is_animating {
        points.iter().copied().find(|&p| (p as f64 - current).abs() < 0.5)
    } else {
        None
    };

    Some(Window { points, result_tick, marker })
}
