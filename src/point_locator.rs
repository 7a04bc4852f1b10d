/// A trait to locate one or several query points within a planar subdivision.
pub trait PointLocator {
    /// Locates one query point within a subdivision.
    ///
    /// Returns the index of the bounded face containing the point, or [`None`] if the query
    /// point does not lie in any bounded face.
    fn locate_one(&self, point: &[f64; 2]) -> Option<usize>;

    /// Locates several query points within a subdivision.
    fn locate_many(&self, points: &[[f64; 2]]) -> Vec<Option<usize>> {
        points.iter().map(|point| self.locate_one(point)).collect()
    }
}
