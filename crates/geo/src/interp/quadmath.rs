//! The (u, v) quadratic solve shared by both bilinear kernels (§4.6.3,
//! §4.6.4): given four ground positions `p, q, r, s` forming a quadrilateral
//! (`p`-`q` the "top" edge, `r`-`s` the "bottom" edge), find the bilinear
//! parameters of `target` inside it.

use crate::Point;

/// `None` when the quadrilateral is degenerate (parallel diagonals, zero
/// denominators) or the quadratic has no real root.
pub fn solve_uv(p: Point, q: Point, r: Point, s: Point, target: Point) -> Option<(f64, f64)> {
    let pq = (q.x() - p.x(), q.y() - p.y());
    let rs = (s.x() - r.x(), s.y() - r.y());
    let pr = (r.x() - p.x(), r.y() - p.y());
    let px = (target.x() - p.x(), target.y() - p.y());

    let qa = pq.1 * (rs.0 - pq.0) - pq.0 * (rs.1 - pq.1);
    let qb = pr.0 * pq.1 - pr.1 * pq.0 + px.0 * (rs.1 - pq.1) - px.1 * (rs.0 - pq.0);
    let qc = pr.1 * px.0 - pr.0 * px.1;

    let u = if qa.abs() < 1e-12 {
        if qb.abs() < 1e-12 {
            return None;
        }
        -qc / qb
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let u1 = (-qb + sqrt_disc) / (2.0 * qa);
        let u2 = (-qb - sqrt_disc) / (2.0 * qa);
        pick_root_in_unit_interval(u1, u2)?
    };

    let denom_x = pr.0 + u * (rs.0 - pq.0);
    let v = if denom_x.abs() > 1e-9 {
        (px.0 - u * pq.0) / denom_x
    } else {
        let denom_y = pr.1 + u * (rs.1 - pq.1);
        if denom_y.abs() < 1e-9 {
            return None;
        }
        (px.1 - u * pq.1) / denom_y
    };

    if !u.is_finite() || !v.is_finite() {
        return None;
    }
    Some((u, v))
}

fn pick_root_in_unit_interval(a: f64, b: f64) -> Option<f64> {
    let a_in = (-1e-6..=1.0 + 1e-6).contains(&a);
    let b_in = (-1e-6..=1.0 + 1e-6).contains(&b);
    match (a_in, b_in) {
        (true, true) => Some(if (a - 0.5).abs() <= (b - 0.5).abs() { a } else { b }),
        (true, false) => Some(a),
        (false, true) => Some(b),
        (false, false) => None,
    }
}

/// Bilinear blend of the four corner values, `d00` at `p`, `d01` at `q`,
/// `d10` at `r`, `d11` at `s`.
pub fn bilinear_value(d00: f64, d01: f64, d10: f64, d11: f64, u: f64, v: f64) -> f64 {
    d00 * (1.0 - v) * (1.0 - u) + d01 * (1.0 - v) * u + d10 * v * (1.0 - u) + d11 * v * u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_centre_solves_to_half_half() {
        let p = Point::new(0.0, 1.0);
        let q = Point::new(1.0, 1.0);
        let r = Point::new(0.0, 0.0);
        let s = Point::new(1.0, 0.0);
        let (u, v) = solve_uv(p, q, r, s, Point::new(0.5, 0.5)).unwrap();
        assert!((u - 0.5).abs() < 1e-9);
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bilinear_value_interpolates_corners() {
        assert!((bilinear_value(0.0, 10.0, 0.0, 10.0, 1.0, 0.0) - 10.0).abs() < 1e-9);
        assert!((bilinear_value(0.0, 0.0, 20.0, 20.0, 0.0, 1.0) - 20.0).abs() < 1e-9);
    }
}
