// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in 2D.
///
/// Boxes whose maximum is below their minimum on either axis are *inverted*.
/// They are representable, but contain nothing, are contained by nothing, and
/// overlap nothing. Zero-area boxes (points and segments) are regular boxes and
/// follow the boundary-inclusive rules below.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point. Edges are part of the box.
    #[inline]
    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.min_x <= x && self.min_y <= y && x <= self.max_x && y <= self.max_y
    }

    /// Whether `other` lies entirely within this AABB.
    ///
    /// Containment is boundary-inclusive: a box contains itself, and a box that
    /// shares an edge with this one is still contained as long as it does not
    /// cross it.
    ///
    /// # Examples
    ///
    /// ```
    /// use understory_quadtree::Aabb2D;
    ///
    /// let world = Aabb2D::new(0.0, 0.0, 100.0, 100.0);
    /// assert!(world.contains(&Aabb2D::new(0.0, 0.0, 10.0, 10.0)));
    /// assert!(world.contains(&world));
    /// assert!(!world.contains(&Aabb2D::new(90.0, 90.0, 110.0, 100.0)));
    /// ```
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        !self.is_inverted()
            && !other.is_inverted()
            && self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Whether `other` lies within this AABB without touching any of its edges.
    #[inline]
    pub(crate) fn contains_strictly(&self, other: &Self) -> bool {
        !self.is_inverted()
            && !other.is_inverted()
            && self.min_x < other.min_x
            && self.min_y < other.min_y
            && other.max_x < self.max_x
            && other.max_y < self.max_y
    }

    /// The intersection of two AABBs.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        let min_x = max_t(self.min_x, other.min_x);
        let min_y = max_t(self.min_y, other.min_y);
        let max_x = min_t(self.max_x, other.max_x);
        let max_y = min_t(self.max_y, other.max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Note that the edge of the AABB is considered to be part of itself, meaning
    /// that two AABBs that share an edge are considered to overlap.
    ///
    /// Returns `true` if the AABBs overlap, `false` otherwise. Inverted AABBs
    /// never overlap anything.
    ///
    /// If you want to compute the *intersection* of two AABBs, use the
    /// [`intersect`][Self::intersect] method instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use understory_quadtree::Aabb2D;
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(5.0, 5.0, 15.0, 15.0);
    /// assert!(aabb1.overlaps(&aabb2));
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(10.0, 0.0, 20.0, 10.0);
    /// assert!(aabb1.overlaps(&aabb2));
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(11.0, 0.0, 20.0, 10.0);
    /// assert!(!aabb1.overlaps(&aabb2));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_inverted()
            && !other.is_inverted()
            && self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// The smallest AABB enclosing two AABBs.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: min_t(self.min_x, other.min_x),
            min_y: min_t(self.min_y, other.min_y),
            max_x: max_t(self.max_x, other.max_x),
            max_y: max_t(self.max_y, other.max_y),
        }
    }

    /// Return true if the AABB is empty or inverted (no area). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Return true if the maximum lies below the minimum on either axis.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from origin and size.
    #[inline]
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: T::add(x, w),
            max_y: T::add(y, h),
        }
    }

    /// Create an AABB centered on `(cx, cy)` with the given width and height.
    ///
    /// For integer scalars the minimum corner is rounded down so the width and
    /// height are preserved exactly.
    #[inline]
    pub fn from_center_size(cx: T, cy: T, w: T, h: T) -> Self {
        let min_x = T::sub(cx, T::half(w));
        let min_y = T::sub(cy, T::half(h));
        Self::from_xywh(min_x, min_y, w, h)
    }

    /// Width of the AABB (may be negative for inverted boxes).
    #[inline]
    pub fn width(&self) -> T {
        T::sub(self.max_x, self.min_x)
    }

    /// Height of the AABB (may be negative for inverted boxes).
    #[inline]
    pub fn height(&self) -> T {
        T::sub(self.max_y, self.min_y)
    }

    /// Center point of the AABB.
    #[inline]
    pub fn center(&self) -> (T, T) {
        (
            T::mid(self.min_x, self.max_x),
            T::mid(self.min_y, self.max_y),
        )
    }

    /// Compute the area of an AABB using the scalar's widened accumulator type.
    #[inline]
    pub fn area(&self) -> T::Acc {
        let w = T::max(T::sub(self.max_x, self.min_x), T::zero());
        let h = T::max(T::sub(self.max_y, self.min_y), T::zero());
        T::widen(w) * T::widen(h)
    }

    /// Split into four equal quadrants around the center.
    ///
    /// The order is top-left, top-right, bottom-left, bottom-right (y grows
    /// downward). Adjacent quadrants share their split edges.
    pub(crate) fn quadrants(&self) -> [Self; 4] {
        let (mx, my) = self.center();
        [
            Self::new(self.min_x, self.min_y, mx, my),
            Self::new(mx, self.min_y, self.max_x, my),
            Self::new(self.min_x, my, mx, self.max_y),
            Self::new(mx, my, self.max_x, self.max_y),
        ]
    }

    /// Grow this AABB until it contains `other`, doubling away from the origin.
    ///
    /// Each corner of the union of both boxes is pushed outward by its own
    /// distance to the origin. When the union straddles the origin this doubles
    /// the corner coordinates; otherwise the near corner is pulled to the
    /// origin. Returns `None` if the grown box still does not contain `other`
    /// (inverted or non-finite input).
    pub(crate) fn grown_to_fit(&self, other: &Self) -> Option<Self> {
        let u = self.union(other);
        let grown = Self::new(
            T::sub(u.min_x, T::abs(u.min_x)),
            T::sub(u.min_y, T::abs(u.min_y)),
            T::add(u.max_x, T::abs(u.max_x)),
            T::add(u.max_y, T::abs(u.max_y)),
        );
        (grown.contains(self) && grown.contains(other)).then_some(grown)
    }
}

/// Numeric scalar abstraction for 2D AABBs used by the quadtree.
///
/// This trait provides the handful of operations required for quadrant
/// splitting, world growth and area metrics, and an associated widened
/// accumulator type for area (e.g., f32→f64, i64→i128).
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for area computations.
    type Acc: Copy
        + PartialOrd
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + core::ops::Mul<Output = Self::Acc>
        + Debug;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// One unit of the scalar type.
    fn one() -> Self;

    /// Max of the two scalar values.
    fn max(a: Self, b: Self) -> Self;

    /// Min of the two scalar values.
    fn min(a: Self, b: Self) -> Self;

    /// Absolute value.
    fn abs(v: Self) -> Self;

    /// Half of the value (rounded toward -∞ for integers).
    fn half(v: Self) -> Self;

    /// Midpoint between a and b (used for quadrant splits).
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline]
    fn abs(v: Self) -> Self {
        if v < 0.0 { -v } else { v }
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as f64
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline]
    fn abs(v: Self) -> Self {
        if v < 0.0 { -v } else { v }
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline(always)]
    fn widen(v: Self) -> Self::Acc {
        v
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline(always)]
    fn one() -> Self {
        1
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        core::cmp::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        core::cmp::min(a, b)
    }

    #[inline]
    fn abs(v: Self) -> Self {
        v.saturating_abs()
    }

    #[inline]
    fn half(v: Self) -> Self {
        v >> 1
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        // Average without overflow: (a & b) + ((a ^ b) >> 1)
        (a & b) + ((a ^ b) >> 1)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as i128
    }
}

/// Helper alias for the widened accumulator type `Scalar::Acc` associated with a `T: Scalar`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2D;

    #[test]
    fn aabb_area_and_empty() {
        const EPSILON: f64 = 1e-10;

        let mut aabb = Aabb2D::<f64>::new(5., 7., 10., 9.);
        assert!((aabb.area() - 5. * 2.).abs() < EPSILON);
        assert!(!aabb.is_empty());

        // "negative" AABBs are considered empty (and get zero area)
        aabb.max_x = -aabb.max_x;
        assert!(aabb.area() < EPSILON);
        assert!(aabb.is_empty());
        assert!(aabb.is_inverted());

        // zero-area AABBs are considered empty, but not inverted
        aabb.max_x = aabb.min_x;
        assert!(aabb.area() < EPSILON);
        assert!(aabb.is_empty());
        assert!(!aabb.is_inverted());
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let outer = Aabb2D::new(0, 0, 10, 10);
        assert!(outer.contains(&Aabb2D::new(0, 0, 10, 10)));
        assert!(outer.contains(&Aabb2D::new(10, 10, 10, 10)));
        assert!(!outer.contains(&Aabb2D::new(5, 5, 11, 6)));
        assert!(!outer.contains_strictly(&Aabb2D::new(0, 2, 4, 4)));
        assert!(outer.contains_strictly(&Aabb2D::new(1, 2, 4, 4)));
    }

    #[test]
    fn inverted_boxes_neither_contain_nor_overlap() {
        let inverted = Aabb2D::new(10, 0, 0, 10);
        let regular = Aabb2D::new(0, 0, 20, 20);
        assert!(!regular.contains(&inverted));
        assert!(!inverted.contains(&inverted));
        assert!(!inverted.overlaps(&regular));
        assert!(!regular.overlaps(&inverted));
    }

    #[test]
    fn union_covers_both() {
        let a = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb2D::new(-3.0, 2.0, -1.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, Aabb2D::new(-3.0, 0.0, 1.0, 5.0));
        assert!(u.contains(&a) && u.contains(&b));
    }

    #[test]
    fn quadrants_tile_the_box() {
        let q = Aabb2D::new(0.0, 0.0, 100.0, 50.0).quadrants();
        assert_eq!(q[0], Aabb2D::new(0.0, 0.0, 50.0, 25.0));
        assert_eq!(q[1], Aabb2D::new(50.0, 0.0, 100.0, 25.0));
        assert_eq!(q[2], Aabb2D::new(0.0, 25.0, 50.0, 50.0));
        assert_eq!(q[3], Aabb2D::new(50.0, 25.0, 100.0, 50.0));
    }

    #[test]
    fn center_size_roundtrip() {
        let a = Aabb2D::<f64>::from_center_size(5.0, 5.0, 2.0, 2.0);
        assert_eq!(a, Aabb2D::new(4.0, 4.0, 6.0, 6.0));
        assert_eq!(a.center(), (5.0, 5.0));

        // Odd integer sizes keep their exact extent.
        let b = Aabb2D::<i64>::from_center_size(5, 5, 3, 3);
        assert_eq!(b, Aabb2D::new(4, 4, 7, 7));
    }

    #[test]
    fn growth_doubles_away_from_origin() {
        let world = Aabb2D::new(0.0, 0.0, 100.0, 100.0);
        let grown = world
            .grown_to_fit(&Aabb2D::new(140.0, 140.0, 150.0, 150.0))
            .unwrap();
        assert_eq!(grown, Aabb2D::new(0.0, 0.0, 300.0, 300.0));

        let grown = world
            .grown_to_fit(&Aabb2D::new(-20.0, 10.0, -10.0, 20.0))
            .unwrap();
        assert_eq!(grown, Aabb2D::new(-40.0, 0.0, 200.0, 200.0));

        // A world away from the origin reaches back to it rather than shrinking.
        let offset = Aabb2D::new(10.0, 10.0, 20.0, 20.0);
        let grown = offset
            .grown_to_fit(&Aabb2D::new(5.0, 12.0, 8.0, 14.0))
            .unwrap();
        assert!(grown.contains(&offset));
        assert_eq!(grown.min_x, 0.0);

        assert!(world.grown_to_fit(&Aabb2D::new(5.0, 0.0, 1.0, 1.0)).is_none());
        assert!(
            world
                .grown_to_fit(&Aabb2D::new(f64::NAN, 0.0, 1.0, 1.0))
                .is_none()
        );
    }
}
