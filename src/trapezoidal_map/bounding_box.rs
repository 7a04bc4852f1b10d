use crate::geometry::Point;

/// Axis-aligned box strictly containing every vertex of the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// The smallest box containing `points`, grown by `margin` on every side.
    ///
    /// Returns the unit box around the origin, grown by `margin`, when there are no points.
    pub(crate) fn around<I>(points: I, margin: f64) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut xmin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymin = f64::INFINITY;
        let mut ymax = f64::NEG_INFINITY;
        for Point { x, y } in points {
            xmin = xmin.min(x);
            xmax = xmax.max(x);
            ymin = ymin.min(y);
            ymax = ymax.max(y);
        }
        if xmin > xmax {
            (xmin, xmax, ymin, ymax) = (0., 0., 0., 0.);
        }
        Self {
            xmin: xmin - margin,
            xmax: xmax + margin,
            ymin: ymin - margin,
            ymax: ymax + margin,
        }
    }

    /// The four corners: bottom-left, bottom-right, top-left and top-right.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.xmin, self.ymin),
            Point::new(self.xmax, self.ymin),
            Point::new(self.xmin, self.ymax),
            Point::new(self.xmax, self.ymax),
        ]
    }

    /// Returns `true` if `point` is in the closed box.
    pub fn contains(&self, point: &Point) -> bool {
        (self.xmin..=self.xmax).contains(&point.x) && (self.ymin..=self.ymax).contains(&point.y)
    }

    /// Returns `true` if `point` is in the closed box and within `eps` of its boundary.
    pub fn on_boundary(&self, point: &Point, eps: f64) -> bool {
        self.contains(point) && self.distance_to_boundary(point) < eps
    }

    /// Distance from a point of the box to the closest side.
    fn distance_to_boundary(&self, point: &Point) -> f64 {
        (point.x - self.xmin)
            .min(self.xmax - point.x)
            .min(point.y - self.ymin)
            .min(self.ymax - point.y)
    }
}
