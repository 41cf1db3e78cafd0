use super::*;
use approx::AbsDiffEq;
use get_size::GetSize;
use itertools::Itertools;
use std::{cmp::Ordering, fmt};

type FloatSize = f64;

/// A position on the lon/lat plane, `x` is the longitude and `y` the latitude, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, GetSize)]
pub struct Point {
    pub x: FloatSize,
    pub y: FloatSize,
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let x_res = self.x.partial_cmp(&other.x)?;
        let y_res = self.y.partial_cmp(&other.y)?;
        if x_res == y_res {
            Some(x_res)
        } else {
            match (x_res, y_res) {
                (Ordering::Equal, y) => Some(y),
                (x, Ordering::Equal) => Some(x),
                _ => None,
            }
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "・({},{})", self.x, self.y)
    }
}

impl AbsDiffEq for Point {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, GetSize)]
pub struct Rectangle {
    pub low_corner: Point,
    pub high_corner: Point,
}

impl Rectangle {
    /// The whole lon/lat plane.
    pub const WORLD: Rectangle = Rectangle {
        low_corner: Point {
            x: -180.0,
            y: -90.0,
        },
        high_corner: Point { x: 180.0, y: 90.0 },
    };

    /// Contains nothing, and is the identity of [union](Rectangle::union).
    pub const EMPTY: Rectangle = Rectangle {
        low_corner: Point {
            x: f64::INFINITY,
            y: f64::INFINITY,
        },
        high_corner: Point {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        },
    };

    pub fn new(low_x: f64, low_y: f64, high_x: f64, high_y: f64) -> Self {
        let r = Rectangle {
            low_corner: Point { x: low_x, y: low_y },
            high_corner: Point {
                x: high_x,
                y: high_y,
            },
        };
        if cfg!(test) {
            r.assert_legal();
        }
        r
    }

    /// A zero-sized rectangle at `point`.
    pub fn around(point: Point) -> Self {
        Rectangle {
            low_corner: point,
            high_corner: point,
        }
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            low_corner: Point {
                x: self.low_corner.x.min(other.low_corner.x),
                y: self.low_corner.y.min(other.low_corner.y),
            },
            high_corner: Point {
                x: self.high_corner.x.max(other.high_corner.x),
                y: self.high_corner.y.max(other.high_corner.y),
            },
        }
    }

    /// Half the perimeter.
    pub fn margin_length(&self) -> f64 {
        (self.high_corner.x - self.low_corner.x).abs() + (self.high_corner.y - self.low_corner.y).abs()
    }

    /// Calculate a rectangle that contains all `entries`
    ///
    /// Produces [EMPTY](Rectangle::EMPTY) if there are none.
    pub fn bound_all<'a>(entries: impl Iterator<Item = &'a Rectangle>) -> Rectangle {
        entries.fold(Rectangle::EMPTY, |acc, r| acc.union(r))
    }

    pub fn assert_legal(&self) {
        assert!(
            self.low_corner <= self.high_corner,
            "Rectangle {} is illegal!",
            self
        );
    }
}

impl AsRef<Rectangle> for Rectangle {
    fn as_ref(&self) -> &Rectangle {
        self
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.low_corner, self.high_corner)
    }
}

impl Intersecting<Point> for Rectangle {
    type IntersectionShape = Point;

    fn intersects(&self, other: &Point) -> bool {
        &self.low_corner <= other && other <= &self.high_corner
    }

    fn intersection(&self, other: &Point) -> Option<Self::IntersectionShape> {
        if self.intersects(other) {
            Some(*other)
        } else {
            None
        }
    }

    fn contains(&self, other: &Point) -> bool {
        self.intersects(other)
    }
}

impl Intersecting for Rectangle {
    type IntersectionShape = Rectangle;

    fn intersects(&self, other: &Rectangle) -> bool {
        self.low_corner.x <= other.high_corner.x
            && other.low_corner.x <= self.high_corner.x
            && self.low_corner.y <= other.high_corner.y
            && other.low_corner.y <= self.high_corner.y
    }

    fn intersection(&self, other: &Rectangle) -> Option<Self::IntersectionShape> {
        let low_x = (self.low_corner.x).max(other.low_corner.x);
        let high_x = (self.high_corner.x).min(other.high_corner.x);
        let low_y = (self.low_corner.y).max(other.low_corner.y);
        let high_y = (self.high_corner.y).min(other.high_corner.y);

        if (low_x < high_x) && (low_y < high_y) {
            Some(Rectangle::new(low_x, low_y, high_x, high_y))
        } else {
            // Rectangles do not overlap, or overlap has an area of zero (edge/corner overlap)
            None
        }
    }

    fn contains(&self, other: &Rectangle) -> bool {
        self.low_corner <= other.low_corner && other.high_corner <= self.high_corner
    }
}

impl HasArea for Rectangle {
    fn area(&self) -> f64 {
        (self.high_corner.x - self.low_corner.x).abs()
            * (self.high_corner.y - self.low_corner.y).abs()
    }
}

impl Extending for Rectangle {
    fn extend(&self, geometry: Rectangle) -> Rectangle {
        geometry.union(self)
    }
}

/// Produce a geometrically "good" split of an overflowing node
///
/// `min_fill` is the minimum number of entries in each node after split
/// `max_fill` is the maximum number of entries that fit into a node,
/// and `entries` must hold exactly one more than that.
pub fn find_split<T>(entries: Vec<T>, min_fill: usize, max_fill: usize) -> (Vec<T>, Vec<T>)
where
    T: AsRef<Rectangle>,
{
    debug_assert_eq!(max_fill + 1, entries.len());
    // From R*-tree paper
    //
    // Algorithm Split
    // S1 Invoke ChooseSplitAxis to determine the axis,
    //  perpendicular to which the split is performed
    // S2 Invoke ChooseSplitIndex to determine the best
    //  distribution into two groups along that axis
    // S3 Distribute the entries into two groups
    //
    // Algorithm ChooseSplitAxis
    // CSA1 For each axis
    //          Sort the entries by the lower then by the upper
    //          value of their rectangles and determine all
    //          distributions as described above. Compute S, the
    //          sum of all margin-values of the different
    //          distributions
    //      end
    let (chosen_order, chosen_distributions) = {
        let rectangles: Vec<&Rectangle> = entries.iter().map(|e| e.as_ref()).collect();
        let x_sorted = sorted_along(&rectangles, |r| (r.low_corner.x, r.high_corner.x));
        let y_sorted = sorted_along(&rectangles, |r| (r.low_corner.y, r.high_corner.y));
        choose_split_axis(&rectangles, x_sorted, y_sorted, min_fill, max_fill)
    };
    let split_index = choose_split_index(&chosen_distributions, min_fill);
    split_at_index(entries, &chosen_order, split_index)
}

fn sorted_along<F>(rectangles: &[&Rectangle], key: F) -> Vec<usize>
where
    F: Fn(&Rectangle) -> (f64, f64),
{
    (0..rectangles.len())
        .sorted_by(|l, r| {
            let (l_low, l_high) = key(rectangles[*l]);
            let (r_low, r_high) = key(rectangles[*r]);
            l_low.total_cmp(&r_low).then(l_high.total_cmp(&r_high))
        })
        .collect()
}

fn bounding_distributions(
    rectangles: &[&Rectangle],
    order: &[usize],
    min_fill: usize,
    max_fill: usize,
) -> Vec<(Rectangle, Rectangle)> {
    let num_distributions = max_fill - 2 * min_fill + 2;
    (1..=num_distributions)
        .map(|k| {
            let split_index = min_fill - 1 + k;
            let left = Rectangle::bound_all(order[..split_index].iter().map(|i| rectangles[*i]));
            let right = Rectangle::bound_all(order[split_index..].iter().map(|i| rectangles[*i]));
            (left, right)
        })
        .collect()
}

fn choose_split_axis(
    rectangles: &[&Rectangle],
    x_sorted: Vec<usize>,
    y_sorted: Vec<usize>,
    min_fill: usize,
    max_fill: usize,
) -> (Vec<usize>, Vec<(Rectangle, Rectangle)>) {
    let x_distributions = bounding_distributions(rectangles, &x_sorted, min_fill, max_fill);
    let y_distributions = bounding_distributions(rectangles, &y_sorted, min_fill, max_fill);
    let margin_sum = |distributions: &[(Rectangle, Rectangle)]| -> f64 {
        distributions
            .iter()
            .map(|(l, r)| l.margin_length() + r.margin_length())
            .sum()
    };
    // CSA2 Choose the axis with the minimum S as split axis
    if margin_sum(&x_distributions) < margin_sum(&y_distributions) {
        (x_sorted, x_distributions)
    } else {
        (y_sorted, y_distributions)
    }
}

fn choose_split_index(chosen_distributions: &[(Rectangle, Rectangle)], min_fill: usize) -> usize {
    // Algorithm ChooseSplitIndex
    // CSI1 Along the chosen split axis, choose the
    //  distribution with the minimum overlap-value
    //  Resolve ties by choosing the distribution with
    //  minimum area-value
    let overlap = |(l, r): &(Rectangle, Rectangle)| l.intersection(r).map(|i| i.area()).unwrap_or(0.0);
    let area = |(l, r): &(Rectangle, Rectangle)| l.area() + r.area();
    let min_index = chosen_distributions
        .iter()
        .position_min_by(|a, b| {
            overlap(a)
                .total_cmp(&overlap(b))
                .then_with(|| area(a).total_cmp(&area(b)))
        })
        .unwrap_or(0);
    let k = min_index + 1;
    // split index
    min_fill - 1 + k
}

fn split_at_index<T>(entries: Vec<T>, order: &[usize], split_index: usize) -> (Vec<T>, Vec<T>) {
    let mut pickable_entries: Vec<Option<T>> = entries.into_iter().map(Some).collect();
    let mut ordered = order.iter().filter_map(|index| pickable_entries[*index].take());
    let left: Vec<T> = ordered.by_ref().take(split_index).collect();
    let right: Vec<T> = ordered.collect();
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_comparison() {
        let p1 = Point { x: 0.0, y: 0.0 };
        #[allow(clippy::eq_op)]
        let same = p1 == p1;
        assert!(same);
        let p2 = Point { x: -1.0, y: -1.0 };
        assert_ne!(p1, p2);
        assert!(p2 < p1);
        let p3 = Point { x: 1.0, y: 1.0 };
        assert!(p1 < p3);
        let p4 = Point { x: 1.0, y: 0.0 };
        assert!(p2 <= p4);
        assert!(p4 <= p3);
        let p5 = Point { x: 2.0, y: -2.0 };
        assert!(p5.partial_cmp(&p1).is_none());
    }

    #[test]
    fn test_rectangle_rectangle_intersection() {
        let r1 = Rectangle::new(-1.0, -1.0, 1.0, 1.0);
        let r2 = Rectangle::new(-2.0, -2.0, 2.0, 2.0);
        assert!(r1.intersects(&r2));
        assert!(r2.intersects(&r1));
        assert!(r2.contains(&r1));
        assert!(!r1.contains(&r2));
        let r3 = Rectangle::new(2.0, 2.0, 3.0, 3.0);
        assert!(!r1.intersects(&r3));
        assert!(!r3.intersects(&r1));
        assert_eq!(None, r1.intersection(&r3));
        let r4 = Rectangle::new(0.0, 0.0, 3.0, 3.0);
        assert!(r1.intersects(&r4));
        assert_eq!(Some(Rectangle::new(0.0, 0.0, 1.0, 1.0)), r1.intersection(&r4));
        let r6 = Rectangle::new(-3.0, -0.5, 3.0, 0.5);
        assert!(r1.intersects(&r6));
        assert!(r6.intersects(&r1));
        // touching edges
        let r8 = Rectangle::new(1.0, -3.0, 3.0, 3.0);
        assert!(r1.intersects(&r8));
        assert!(r8.intersects(&r1));
        assert_eq!(None, r1.intersection(&r8));
    }

    #[test]
    fn test_rectangle_point_intersection() {
        let r = Rectangle::new(-1.0, -1.0, 1.0, 1.0);
        assert!(r.intersects(&Point { x: 0.0, y: 0.0 }));
        assert!(!r.intersects(&Point { x: 3.0, y: 3.0 }));
        assert!(!r.intersects(&Point { x: -3.0, y: 3.0 }));
        assert!(!r.intersects(&Point { x: 3.0, y: -3.0 }));
        assert!(r.intersects(&Point { x: 1.0, y: 0.0 }));
        assert!(r.intersects(&Point { x: -1.0, y: -1.0 }));
    }

    #[test]
    fn test_bounding_and_extending() {
        let mut rectangles: Vec<Rectangle> = vec![Rectangle::new(0.0, 0.0, 1.0, 1.0)];
        rectangles.push(Rectangle::new(-1.0, -1.0, 0.0, 0.0));
        rectangles.push(Rectangle::around(Point { x: 3.0, y: -2.0 }));
        let bbox = Rectangle::bound_all(rectangles.iter());
        for rectangle in rectangles.iter() {
            assert!(bbox.contains(rectangle), "bound {} does not contain {}", bbox, rectangle);
        }
        assert_eq!(Rectangle::new(-1.0, -2.0, 3.0, 1.0), bbox);
        assert_eq!(Rectangle::EMPTY, Rectangle::bound_all(std::iter::empty()));

        let small = Rectangle::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(0.0, small.extend_area(Rectangle::new(-1.0, -1.0, 2.0, 2.0)));
        assert_eq!(2.0, Rectangle::new(1.0, 0.0, 2.0, 1.0).extend_area(Rectangle::new(-1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_find_split() {
        // two clusters along the x axis
        let entries: Vec<Rectangle> = (0..9)
            .map(|i| {
                let x = if i % 2 == 0 { i as f64 } else { 100.0 + i as f64 };
                Rectangle::new(x, 0.0, x + 0.5, 0.5)
            })
            .collect();
        let (left, right) = find_split(entries, 3, 8);
        assert_eq!(9, left.len() + right.len());
        assert!(left.len() >= 3 && right.len() >= 3);
        let left_box = Rectangle::bound_all(left.iter());
        let right_box = Rectangle::bound_all(right.iter());
        assert!(!left_box.intersects(&right_box));
    }
}
