use crate::error::SentinelError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Interior angle at `vertex` between the rays towards `start` and `end`, in
/// degrees within [0, 180].
pub fn angle(start: Point2D, vertex: Point2D, end: Point2D) -> Result<f64, SentinelError> {
    if !(start.is_finite() && vertex.is_finite() && end.is_finite()) {
        return Err(SentinelError::InvalidInput(format!(
            "non-finite point in angle({start:?}, {vertex:?}, {end:?})"
        )));
    }

    let radians = (end.y - vertex.y).atan2(end.x - vertex.x)
        - (start.y - vertex.y).atan2(start.x - vertex.x);
    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }

    Ok(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn collinear_points_straddling_the_vertex_give_a_straight_angle() {
        let straight = angle(p(0.0, -100.0), p(0.0, 0.0), p(0.0, 100.0)).expect("angle");
        assert_eq!(straight, 180.0);

        let horizontal = angle(p(-3.0, 5.0), p(1.0, 5.0), p(9.0, 5.0)).expect("angle");
        assert_eq!(horizontal, 180.0);
    }

    #[test]
    fn coincident_outer_points_give_zero() {
        let folded = angle(p(10.0, 10.0), p(0.0, 0.0), p(10.0, 10.0)).expect("angle");
        assert!(folded.abs() < 1e-9, "got {folded}");

        let same_ray = angle(p(5.0, 0.0), p(0.0, 0.0), p(20.0, 0.0)).expect("angle");
        assert!(same_ray.abs() < 1e-9, "got {same_ray}");
    }

    #[test]
    fn right_angle_in_pixel_space() {
        let knee = angle(p(300.0, 300.0), p(300.0, 400.0), p(400.0, 400.0)).expect("angle");
        assert!((knee - 90.0).abs() < 1e-9, "got {knee}");
    }

    #[test]
    fn swapping_outer_points_keeps_the_angle() {
        let cases = [
            (p(0.0, -100.0), p(0.0, 0.0), p(98.48, -17.36)),
            (p(12.5, 3.0), p(-4.0, 7.5), p(-20.0, -30.0)),
            (p(-1.0, 0.0), p(0.0, 0.0), p(0.0, -1.0)),
            (p(640.0, 10.0), p(320.0, 240.0), p(0.0, 10.0)),
        ];
        for (a, b, c) in cases {
            let forward = angle(a, b, c).expect("angle");
            let reversed = angle(c, b, a).expect("angle");
            assert!((forward - reversed).abs() < 1e-9, "{forward} vs {reversed}");
        }
    }

    #[test]
    fn output_stays_within_half_turn_for_every_direction() {
        let vertex = p(0.0, 0.0);
        for i in 0..36 {
            for j in 0..36 {
                let a = (i as f64 * 10.0).to_radians();
                let b = (j as f64 * 10.0 + 5.0).to_radians();
                let start = p(a.cos() * 50.0, a.sin() * 50.0);
                let end = p(b.cos() * 80.0, b.sin() * 80.0);
                let value = angle(start, vertex, end).expect("angle");
                assert!((0.0..=180.0).contains(&value), "{value} out of range");
            }
        }
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err = angle(p(f64::NAN, 0.0), p(0.0, 0.0), p(1.0, 1.0)).expect_err("must reject");
        assert!(matches!(err, SentinelError::InvalidInput(_)));

        let err = angle(p(0.0, 0.0), p(f64::INFINITY, 0.0), p(1.0, 1.0)).expect_err("must reject");
        assert!(matches!(err, SentinelError::InvalidInput(_)));
    }
}
