use sightline_error::SpatialError;

use super::{boundary::Extent, Boundary, DuplicatePolicy, Point};
use crate::{config::SpatialConfig, database::ValidationError, validate};

/// Узел квадродерева.
///
/// Лист хранит точки напрямую; внутренний узел хранит ровно четырёх
/// потомков и ни одной точки. Потомки упорядочены как
/// [`Extent::quadrants`].
#[derive(Debug, Clone)]
struct QuadNode<T> {
    extent: Extent,
    depth: usize,
    points: Vec<Point<T>>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

/// Квадродерево для запросов по прямоугольнику и радиусу.
///
/// **ИНВАРИАНТЫ:**
///
/// - каждая точка лежит внутри границы корня (включая края);
/// - лист хранит не больше `node_capacity` точек, кроме листьев на
///   глубине `max_depth`;
/// - у внутреннего узла ровно четыре потомка, их границы без зазоров
///   разбивают границу родителя;
/// - каждая точка находится в том потомке, которому её относят линии
///   деления родителя, и лежит внутри его границ.
///
/// Удаление не схлопывает опустевших потомков. Чтобы вернуть дерево к
/// компактной форме после массовых удалений, есть [`SpatialIndex::rebuild`].
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    boundary: Boundary,
    root: QuadNode<T>,
    node_capacity: usize,
    max_depth: usize,
    duplicates: DuplicatePolicy,
    len: usize,
}

/// Статистика формы дерева.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadTreeStats {
    /// Наибольшая глубина листа (корень на глубине 0).
    pub depth: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub point_count: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T> QuadNode<T> {
    fn leaf(
        extent: Extent,
        depth: usize,
    ) -> Self {
        Self {
            extent,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    /// Вставка без проверок: точка уже лежит внутри `self.extent`.
    fn insert(
        &mut self,
        point: Point<T>,
        capacity: usize,
        max_depth: usize,
    ) {
        if let Some(children) = self.children.as_mut() {
            let q = self.extent.quadrant_of(point.x, point.y);
            children[q].insert(point, capacity, max_depth);
            return;
        }

        if self.points.len() < capacity || self.depth >= max_depth {
            self.points.push(point);
            return;
        }

        self.subdivide(capacity, max_depth);
        self.insert(point, capacity, max_depth);
    }

    /// Превращает лист в внутренний узел и раздаёт его точки потомкам.
    ///
    /// Точки раздаются через `insert`, поэтому потомок, в который попали
    /// все точки сразу, делится дальше.
    fn subdivide(
        &mut self,
        capacity: usize,
        max_depth: usize,
    ) {
        let depth = self.depth + 1;
        let children = self
            .extent
            .quadrants()
            .map(|extent| QuadNode::leaf(extent, depth));
        self.children = Some(Box::new(children));

        tracing::trace!(
            depth = self.depth,
            points = self.points.len(),
            "Quadtree node subdivided"
        );

        for point in std::mem::take(&mut self.points) {
            self.insert(point, capacity, max_depth);
        }
    }

    fn query<'a>(
        &'a self,
        range: &Boundary,
        out: &mut Vec<&'a Point<T>>,
    ) {
        if !self.extent.intersects(range) {
            return;
        }

        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.query(range, out);
                }
            }
            None => out.extend(self.points.iter().filter(|p| range.contains(p.x, p.y))),
        }
    }

    fn query_radius<'a>(
        &'a self,
        x: f64,
        y: f64,
        radius: f64,
        out: &mut Vec<&'a Point<T>>,
    ) {
        if self.extent.min_distance_to(x, y) > radius {
            return;
        }

        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.query_radius(x, y, radius, out);
                }
            }
            None => out.extend(
                self.points
                    .iter()
                    .filter(|p| p.distance_to(x, y) <= radius),
            ),
        }
    }

    /// Лист, которому принадлежат координаты.
    fn leaf_for(
        &self,
        x: f64,
        y: f64,
    ) -> &QuadNode<T> {
        let mut node = self;
        while let Some(children) = &node.children {
            node = &children[node.extent.quadrant_of(x, y)];
        }
        node
    }

    fn leaf_for_mut(
        &mut self,
        x: f64,
        y: f64,
    ) -> &mut QuadNode<T> {
        let q = self.extent.quadrant_of(x, y);
        match self.children {
            Some(ref mut children) => children[q].leaf_for_mut(x, y),
            None => self,
        }
    }

    fn drain_into(
        &mut self,
        out: &mut Vec<Point<T>>,
    ) {
        out.append(&mut self.points);
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.drain_into(out);
            }
        }
    }

    fn collect_stats(
        &self,
        stats: &mut QuadTreeStats,
    ) {
        stats.node_count += 1;
        match &self.children {
            Some(children) => children.iter().for_each(|c| c.collect_stats(stats)),
            None => {
                stats.leaf_count += 1;
                stats.point_count += self.points.len();
                stats.depth = stats.depth.max(self.depth);
            }
        }
    }

    fn validate(
        &self,
        capacity: usize,
        max_depth: usize,
    ) -> Result<usize, ValidationError> {
        for p in &self.points {
            validate!(
                self.extent.contains(p.x, p.y),
                ValidationError::Containment {
                    message: format!(
                        "point ({}, {}) outside node {:?}",
                        p.x, p.y, self.extent
                    ),
                }
            );
        }

        let Some(children) = &self.children else {
            validate!(
                self.points.len() <= capacity || self.depth >= max_depth,
                ValidationError::NodeShape {
                    message: format!(
                        "leaf at depth {} holds {} points, capacity {capacity}",
                        self.depth,
                        self.points.len()
                    ),
                }
            );
            return Ok(self.points.len());
        };

        validate!(
            self.points.is_empty(),
            ValidationError::NodeShape {
                message: format!(
                    "internal node at depth {} holds {} points",
                    self.depth,
                    self.points.len()
                ),
            }
        );

        let expected = self.extent.quadrants();
        let mut total = 0;
        for (q, child) in children.iter().enumerate() {
            validate!(
                child.extent == expected[q] && child.depth == self.depth + 1,
                ValidationError::Partition {
                    message: format!("child {q} of {:?} is {:?}", self.extent, child.extent),
                }
            );

            let misplaced = child
                .leaf_points()
                .find(|p| self.extent.quadrant_of(p.x, p.y) != q);
            if let Some(p) = misplaced {
                return Err(ValidationError::Containment {
                    message: format!("point ({}, {}) stored in quadrant {q}", p.x, p.y),
                });
            }

            total += child.validate(capacity, max_depth)?;
        }

        Ok(total)
    }

    fn leaf_points(&self) -> Box<dyn Iterator<Item = &Point<T>> + '_> {
        match &self.children {
            Some(children) => Box::new(children.iter().flat_map(QuadNode::leaf_points)),
            None => Box::new(self.points.iter()),
        }
    }
}

impl<T> SpatialIndex<T> {
    /// Создаёт пустое дерево из одного листа.
    pub fn new(config: &SpatialConfig) -> Result<Self, SpatialError> {
        config.validate()?;

        Ok(Self {
            boundary: config.root_boundary,
            root: QuadNode::leaf(Extent::from_boundary(&config.root_boundary), 0),
            node_capacity: config.node_capacity,
            max_depth: config.max_depth,
            duplicates: config.duplicates,
            len: 0,
        })
    }

    /// Все точки внутри `range`, включая лежащие на его краях.
    ///
    /// Поддеревья, чья граница не пересекает `range`, не посещаются.
    pub fn query(
        &self,
        range: &Boundary,
    ) -> Vec<&Point<T>> {
        let mut out = Vec::new();
        self.root.query(range, &mut out);
        out
    }

    /// Все точки на евклидовом расстоянии не больше `radius` от `(x, y)`.
    pub fn query_radius(
        &self,
        x: f64,
        y: f64,
        radius: f64,
    ) -> Vec<&Point<T>> {
        let mut out = Vec::new();
        if radius >= 0.0 {
            self.root.query_radius(x, y, radius, &mut out);
        }
        out
    }

    /// Итератор по всем точкам в порядке обхода дерева.
    pub fn iter(&self) -> impl Iterator<Item = &Point<T>> + '_ {
        self.root.leaf_points()
    }

    /// Количество точек.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Граница корня.
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Удаляет все точки и потомков корня.
    pub fn clear(&mut self) {
        self.root = QuadNode::leaf(Extent::from_boundary(&self.boundary), 0);
        self.len = 0;
    }

    /// Перестраивает дерево из текущих точек.
    ///
    /// Результат совпадает с деревом, в которое те же точки вставлены
    /// заново: пустые после удалений поддеревья исчезают.
    pub fn rebuild(&mut self) {
        let mut points = Vec::with_capacity(self.len);
        self.root.drain_into(&mut points);
        self.root = QuadNode::leaf(Extent::from_boundary(&self.boundary), 0);

        let (capacity, max_depth) = (self.node_capacity, self.max_depth);
        for point in points {
            self.root.insert(point, capacity, max_depth);
        }

        tracing::debug!(points = self.len, "Quadtree rebuilt");
    }

    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats {
            depth: 0,
            node_count: 0,
            leaf_count: 0,
            point_count: 0,
        };
        self.root.collect_stats(&mut stats);
        stats
    }

    /// Полная проверка структурных инвариантов. Стоит O(N · depth).
    pub fn validate_invariants(&self) -> Result<(), ValidationError> {
        let actual = self.root.validate(self.node_capacity, self.max_depth)?;
        validate!(
            actual == self.len,
            ValidationError::LengthMismatch {
                expected: self.len,
                actual,
            }
        );
        Ok(())
    }
}

impl<T: PartialEq> SpatialIndex<T> {
    /// Вставляет точку. Точки вне границы корня отвергаются, дерево не
    /// меняется.
    pub fn insert(
        &mut self,
        point: Point<T>,
    ) -> Result<(), SpatialError> {
        if !self.root.extent.contains(point.x, point.y) {
            return Err(SpatialError::OutOfBounds {
                x: point.x,
                y: point.y,
            });
        }

        if self.duplicates == DuplicatePolicy::RejectSamePayload && self.contains(&point) {
            return Err(SpatialError::DuplicatePoint {
                x: point.x,
                y: point.y,
            });
        }

        let (capacity, max_depth) = (self.node_capacity, self.max_depth);
        self.root.insert(point, capacity, max_depth);
        self.len += 1;

        Ok(())
    }

    /// Есть ли в дереве точка, равная `point` по координатам и нагрузке.
    pub fn contains(
        &self,
        point: &Point<T>,
    ) -> bool {
        self.root.extent.contains(point.x, point.y)
            && self
                .root
                .leaf_for(point.x, point.y)
                .points
                .iter()
                .any(|p| p == point)
    }

    /// Удаляет одну точку, равную `point`. Потомки не схлопываются.
    pub fn remove(
        &mut self,
        point: &Point<T>,
    ) -> bool {
        if !self.root.extent.contains(point.x, point.y) {
            return false;
        }

        let leaf = self.root.leaf_for_mut(point.x, point.y);
        let Some(pos) = leaf.points.iter().position(|p| p == point) else {
            return false;
        };

        leaf.points.swap_remove(pos);
        self.len -= 1;
        true
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        node_capacity: usize,
        max_depth: usize,
    ) -> SpatialConfig {
        SpatialConfig {
            root_boundary: Boundary::new(0.0, 0.0, 100.0, 100.0),
            node_capacity,
            max_depth,
            duplicates: DuplicatePolicy::Retain,
        }
    }

    fn coords<T>(points: &[&Point<T>]) -> Vec<(f64, f64)> {
        let mut out: Vec<_> = points.iter().map(|p| (p.x, p.y)).collect();
        out.sort_by(|a, b| a.partial_cmp(b).unwrap());
        out
    }

    #[test]
    fn test_query_lower_left_quadrant() {
        let mut index = SpatialIndex::new(&config(1, 16)).unwrap();
        index.insert(Point::new(10.0, 10.0, "a")).unwrap();
        index.insert(Point::new(20.0, 20.0, "b")).unwrap();
        index.insert(Point::new(90.0, 90.0, "c")).unwrap();

        let found = index.query(&Boundary::new(0.0, 0.0, 50.0, 50.0));

        assert_eq!(coords(&found), vec![(10.0, 10.0), (20.0, 20.0)]);
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut index = SpatialIndex::new(&config(4, 8)).unwrap();

        let err = index.insert(Point::new(100.5, 3.0, ())).unwrap_err();

        assert_eq!(err, SpatialError::OutOfBounds { x: 100.5, y: 3.0 });
        assert!(index.is_empty());
        assert!(index.insert(Point::new(f64::NAN, 3.0, ())).is_err());
    }

    #[test]
    fn test_root_edges_are_inside() {
        let mut index = SpatialIndex::new(&config(1, 8)).unwrap();
        for (x, y) in [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0), (50.0, 50.0)] {
            index.insert(Point::new(x, y, ())).unwrap();
        }

        assert_eq!(index.len(), 5);
        assert_eq!(index.query(index.boundary()).len(), 5);
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_far_corner_found_with_unround_boundary() {
        let root = Boundary::new(
            -77.605_350_307_992_98,
            -40.236_335_617_091_83,
            453.704_673_509_192_56,
            540.346_501_233_715_3,
        );
        let mut index = SpatialIndex::new(&SpatialConfig {
            root_boundary: root,
            node_capacity: 1,
            max_depth: 12,
            duplicates: DuplicatePolicy::Retain,
        })
        .unwrap();

        let corners = [
            (root.max_x(), root.max_y()),
            (root.x, root.max_y()),
            (root.max_x(), root.y),
            (root.x, root.y),
            (376.099_323_201_199_6, 500.110_165_616_623_53),
        ];
        for (i, &(x, y)) in corners.iter().enumerate() {
            index.insert(Point::new(x, y, i)).unwrap();
        }

        index.validate_invariants().unwrap();
        for (i, &(x, y)) in corners.iter().enumerate() {
            let found = index.query(&Boundary::new(x, y, 0.0, 0.0));
            assert!(found.iter().any(|p| p.payload == i), "corner {i} at ({x}, {y}) lost");
            assert!(index.contains(&Point::new(x, y, i)));
            assert!(!index.query_radius(x, y, 0.0).is_empty());
        }
        assert_eq!(index.query(&root).len(), corners.len());
    }

    #[test]
    fn test_query_includes_range_edges() {
        let mut index = SpatialIndex::new(&config(2, 8)).unwrap();
        index.insert(Point::new(25.0, 25.0, 1)).unwrap();
        index.insert(Point::new(75.0, 75.0, 2)).unwrap();
        index.insert(Point::new(25.1, 25.0, 3)).unwrap();

        let found = index.query(&Boundary::new(0.0, 0.0, 25.0, 25.0));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload, 1);
    }

    #[test]
    fn test_subdivision_respects_capacity() {
        let mut index = SpatialIndex::new(&config(2, 16)).unwrap();
        for i in 0..50 {
            let v = f64::from(i) * 2.0;
            index.insert(Point::new(v, 100.0 - v, i)).unwrap();
        }

        let stats = index.stats();
        assert!(stats.depth > 0);
        assert_eq!(stats.point_count, 50);
        assert_eq!(stats.node_count, stats.leaf_count + (stats.node_count - 1) / 4);
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_max_depth_stops_subdivision() {
        let mut index = SpatialIndex::new(&config(1, 3)).unwrap();
        for i in 0..10 {
            index.insert(Point::new(1.0, 1.0, i)).unwrap();
        }

        let stats = index.stats();
        assert_eq!(stats.depth, 3);
        assert_eq!(index.len(), 10);
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_duplicates_retained_by_default() {
        let mut index = SpatialIndex::new(&config(4, 8)).unwrap();
        index.insert(Point::new(5.0, 5.0, "x")).unwrap();
        index.insert(Point::new(5.0, 5.0, "x")).unwrap();

        assert_eq!(index.len(), 2);
        assert!(index.remove(&Point::new(5.0, 5.0, "x")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_duplicates_rejected_by_policy() {
        let mut index = SpatialIndex::new(&SpatialConfig {
            duplicates: DuplicatePolicy::RejectSamePayload,
            ..config(4, 8)
        })
        .unwrap();
        index.insert(Point::new(5.0, 5.0, "x")).unwrap();

        assert_eq!(
            index.insert(Point::new(5.0, 5.0, "x")),
            Err(SpatialError::DuplicatePoint { x: 5.0, y: 5.0 })
        );
        assert!(index.insert(Point::new(5.0, 5.0, "y")).is_ok());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_remove_keeps_children() {
        let mut index = SpatialIndex::new(&config(1, 8)).unwrap();
        let points: Vec<_> = [(10.0, 10.0), (60.0, 10.0), (10.0, 60.0)]
            .into_iter()
            .map(|(x, y)| Point::new(x, y, ()))
            .collect();
        for p in &points {
            index.insert(p.clone()).unwrap();
        }
        let before = index.stats().node_count;

        for p in &points {
            assert!(index.remove(p));
        }

        assert!(!index.remove(&points[0]));
        assert!(index.is_empty());
        assert_eq!(index.stats().node_count, before);
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_rebuild_compacts() {
        let mut index = SpatialIndex::new(&config(1, 8)).unwrap();
        for i in 0..8 {
            index
                .insert(Point::new(f64::from(i) * 12.0, 5.0, i))
                .unwrap();
        }
        for i in 1..8 {
            assert!(index.remove(&Point::new(f64::from(i) * 12.0, 5.0, i)));
        }

        index.rebuild();

        assert_eq!(index.stats().node_count, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().map(|p| p.payload), Some(0));
        index.validate_invariants().unwrap();
    }

    #[test]
    fn test_query_radius() {
        let mut index = SpatialIndex::new(&config(2, 8)).unwrap();
        index.insert(Point::new(50.0, 50.0, 'a')).unwrap();
        index.insert(Point::new(53.0, 54.0, 'b')).unwrap();
        index.insert(Point::new(60.0, 60.0, 'c')).unwrap();

        let mut found: Vec<char> = index
            .query_radius(50.0, 50.0, 5.0)
            .into_iter()
            .map(|p| p.payload)
            .collect();
        found.sort();

        assert_eq!(found, vec!['a', 'b']);
        assert!(index.query_radius(50.0, 50.0, -1.0).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut index = SpatialIndex::new(&config(1, 8)).unwrap();
        index.insert(Point::new(1.0, 1.0, ())).unwrap();
        index.insert(Point::new(99.0, 99.0, ())).unwrap();

        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.stats().node_count, 1);
        assert_eq!(*index.boundary(), Boundary::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_invalid_config() {
        assert!(SpatialIndex::<()>::new(&config(0, 8)).is_err());
        assert!(SpatialIndex::<()>::new(&SpatialConfig {
            root_boundary: Boundary::new(0.0, 0.0, -1.0, 1.0),
            ..config(4, 8)
        })
        .is_err());
    }
}
