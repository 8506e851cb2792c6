use crate::types::{BarPlan, ProblemInstance, SolvedResult};

const MAX_WIDTH: f64 = 80.0;

/// Draws one bar as a three-row strip, pieces in assignment order followed by
/// the leftover. `scale` is characters per length unit.
pub fn render_bar(plan: &BarPlan, instance: &ProblemInstance, scale: f64) -> String {
    let grid_w = (plan.length as f64 * scale).round() as usize;
    if grid_w == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; 3];
    draw_segment(&mut grid, 0, grid_w);

    let mut offset = 0u64;
    for &order in &plan.orders {
        let length = instance.orders()[order];
        let sx = (offset as f64 * scale).round() as usize;
        let sw = ((offset + length as u64) as f64 * scale).round() as usize - sx;
        offset += length as u64;
        if sw == 0 {
            continue;
        }
        draw_segment(&mut grid, sx, sw);
        put_label(&mut grid, sx, sw, &length.to_string());
    }

    if !plan.is_perfect_fit() && plan.used {
        let sx = (offset as f64 * scale).round() as usize;
        let fill = if plan.retail == Some(true) || plan.reusable == Some(true) {
            '='
        } else {
            '.'
        };
        for x in sx + 1..grid_w {
            if grid[1][x] == ' ' {
                grid[1][x] = fill;
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn draw_segment(grid: &mut [Vec<char>], x: usize, w: usize) {
    let cols = grid[0].len();
    for i in x..=(x + w).min(cols - 1) {
        for row in [0, 2] {
            if grid[row][i] != '+' {
                grid[row][i] = '-';
            }
        }
    }
    for edge in [x, x + w] {
        if edge < cols {
            grid[0][edge] = '+';
            grid[1][edge] = '|';
            grid[2][edge] = '+';
        }
    }
}

fn put_label(grid: &mut [Vec<char>], x: usize, w: usize, label: &str) {
    let chars: Vec<char> = label.chars().collect();
    if w <= chars.len() {
        return;
    }
    let start = x + (w - chars.len()) / 2 + 1;
    for (i, &ch) in chars.iter().enumerate() {
        if start + i < x + w {
            grid[1][start + i] = ch;
        }
    }
}

/// Text description of a solved plan, with an ASCII strip per used bar.
pub fn render_plan(result: &SolvedResult, instance: &ProblemInstance) -> String {
    let longest = instance.max_bar().max(1) as f64;
    let scale = MAX_WIDTH / longest;
    let mut out = String::new();

    out.push_str(&format!(
        "CUTTING PLAN ({}, run {})\n",
        result.variant, result.run_id
    ));
    for bar in result.plan.iter().filter(|b| b.used) {
        let pieces: Vec<String> = bar
            .orders
            .iter()
            .map(|&i| format!("#{} ({})", i + 1, instance.orders()[i]))
            .collect();
        let pieces = if pieces.is_empty() {
            "-".to_string()
        } else {
            pieces.join(", ")
        };
        let leftover = if bar.is_perfect_fit() {
            "no leftover".to_string()
        } else if bar.retail == Some(true) || bar.reusable == Some(true) {
            format!("retail {:.0}", bar.leftover)
        } else {
            format!("waste {:.0}", bar.waste)
        };
        out.push_str(&format!(
            "Bar {} ({}): {}, {}\n",
            bar.bar + 1,
            bar.length,
            pieces,
            leftover
        ));
        out.push_str(&render_bar(bar, instance, scale));
    }
    out.push_str(&format!(
        "Cuts: {} | Waste: {:.0} | Bars used: {} | Total cost: {:.2}\n",
        result.cut_count, result.waste_total, result.used_bar_count, result.total_cost
    ));
    out
}
