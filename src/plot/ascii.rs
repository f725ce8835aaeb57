//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - measured points: `o`
//! - fitted theory curve: `-` line

use crate::fit::GroupFit;

/// Render one group's measurements and fitted curve as a text grid.
pub fn render_group_plot(group: &GroupFit, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (k_min, k_max) = k_range(group);
    let (y_min, y_max) = y_range(group).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so measured points can overlay it.
    draw_curve(&mut grid, group, k_min, k_max, y_min, y_max);

    for (&k, &t) in group.k.iter().zip(group.measured_ns.iter()) {
        let x = map_x(k, k_min, k_max, width);
        let y = map_y(t, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot {} [{}]: k=[{k_min:.0}, {k_max:.0}] | t=[{y_min:.1}, {y_max:.1}]ns\n",
        group.key,
        group.feature.label(),
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn k_range(group: &GroupFit) -> (f64, f64) {
    // The projected curve spans the observed sizes exactly.
    let k_min = group.curve.k.first().copied().unwrap_or(0.0);
    let k_max = group.curve.k.last().copied().unwrap_or(1.0);
    if k_max > k_min {
        (k_min, k_max)
    } else {
        (k_min - 0.5, k_min + 0.5)
    }
}

fn y_range(group: &GroupFit) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &t in &group.measured_ns {
        min_y = min_y.min(t);
        max_y = max_y.max(t);
    }
    for &p in &group.curve.predicted {
        min_y = min_y.min(p);
        max_y = max_y.max(p);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(k: f64, k_min: f64, k_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((k - k_min) / (k_max - k_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    group: &GroupFit,
    k_min: f64,
    k_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if group.curve.k.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for (&k, &p) in group.curve.k.iter().zip(group.curve.predicted.iter()) {
        let x = map_x(k, k_min, k_max, width);
        let y = map_y(p, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, y, '-');
        } else {
            grid[y][x] = '-';
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
