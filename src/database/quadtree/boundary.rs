use serde::{Deserialize, Serialize};
use sightline_error::SpatialError;

/// Прямоугольная область, выровненная по осям.
///
/// `(x, y)` задаёт минимальный угол, `width` и `height` откладываются в
/// сторону роста координат. Все проверки принадлежности включают края.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Точка с произвольной полезной нагрузкой.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: f64,
    pub y: f64,
    pub payload: T,
}

/// Что делать со второй точкой с теми же координатами.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Хранить обе точки, даже если совпадает и нагрузка.
    #[default]
    Retain,
    /// Отвергать точку, если уже есть равная ей по координатам и нагрузке.
    RejectSamePayload,
}

/// Границы узла квадродерева, заданные углами.
///
/// В отличие от [`Boundary`], края хранятся готовыми числами: края
/// потомков берутся из тех же `mid` и `max`, что и у родителя, без
/// повторного сложения. Поэтому потомки разбивают родителя точно, и точка,
/// отнесённая к потомку, всегда лежит в его границах.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub(crate) min_x: f64,
    pub(crate) min_y: f64,
    pub(crate) max_x: f64,
    pub(crate) max_y: f64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Boundary {
    pub fn new(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Граница корня должна иметь конечные координаты и положительную
    /// площадь. Для диапазонов запросов проверка не нужна.
    pub fn validate(&self) -> Result<(), SpatialError> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SpatialError::InvalidBoundary {
                reason: format!("non-finite boundary {self:?}"),
            });
        }

        if !self.max_x().is_finite() || !self.max_y().is_finite() {
            return Err(SpatialError::InvalidBoundary {
                reason: format!("far corner of {self:?} overflows"),
            });
        }

        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SpatialError::InvalidBoundary {
                reason: format!(
                    "width {} and height {} must be positive",
                    self.width, self.height
                ),
            });
        }

        Ok(())
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Лежат ли координаты внутри прямоугольника, включая края.
    pub fn contains(
        &self,
        x: f64,
        y: f64,
    ) -> bool {
        x >= self.x && x <= self.max_x() && y >= self.y && y <= self.max_y()
    }

    /// Пересекаются ли прямоугольники. Касание краем считается
    /// пересечением.
    pub fn intersects(
        &self,
        other: &Boundary,
    ) -> bool {
        self.x <= other.max_x()
            && self.max_x() >= other.x
            && self.y <= other.max_y()
            && self.max_y() >= other.y
    }

    /// Минимальное евклидово расстояние от точки до прямоугольника.
    pub fn min_distance_to(
        &self,
        x: f64,
        y: f64,
    ) -> f64 {
        let dx = (self.x - x).max(0.0).max(x - self.max_x());
        let dy = (self.y - y).max(0.0).max(y - self.max_y());
        (dx * dx + dy * dy).sqrt()
    }
}

impl Extent {
    pub(crate) fn from_boundary(boundary: &Boundary) -> Self {
        Self {
            min_x: boundary.x,
            min_y: boundary.y,
            max_x: boundary.max_x(),
            max_y: boundary.max_y(),
        }
    }

    /// Линии деления на квадранты.
    pub(crate) fn center(&self) -> (f64, f64) {
        (
            midpoint(self.min_x, self.max_x),
            midpoint(self.min_y, self.max_y),
        )
    }

    pub(crate) fn contains(
        &self,
        x: f64,
        y: f64,
    ) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Пересекается ли узел с диапазоном запроса. Края диапазона считаются
    /// так же, как в [`Boundary::contains`].
    pub(crate) fn intersects(
        &self,
        range: &Boundary,
    ) -> bool {
        self.min_x <= range.max_x()
            && self.max_x >= range.x
            && self.min_y <= range.max_y()
            && self.max_y >= range.y
    }

    pub(crate) fn min_distance_to(
        &self,
        x: f64,
        y: f64,
    ) -> f64 {
        let dx = (self.min_x - x).max(0.0).max(x - self.max_x);
        let dy = (self.min_y - y).max(0.0).max(y - self.max_y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Четыре квадранта в порядке `[нижний левый, нижний правый,
    /// верхний левый, верхний правый]`.
    pub(crate) fn quadrants(&self) -> [Extent; 4] {
        let (mid_x, mid_y) = self.center();
        let quadrant = |min_x, min_y, max_x, max_y| Extent {
            min_x,
            min_y,
            max_x,
            max_y,
        };

        [
            quadrant(self.min_x, self.min_y, mid_x, mid_y),
            quadrant(mid_x, self.min_y, self.max_x, mid_y),
            quadrant(self.min_x, mid_y, mid_x, self.max_y),
            quadrant(mid_x, mid_y, self.max_x, self.max_y),
        ]
    }

    /// Индекс квадранта (см. [`Extent::quadrants`]), которому принадлежит
    /// точка.
    ///
    /// Линии деления принадлежат правому и верхнему квадрантам, поэтому
    /// каждая точка узла попадает ровно в один квадрант и лежит внутри
    /// его границ.
    pub(crate) fn quadrant_of(
        &self,
        x: f64,
        y: f64,
    ) -> usize {
        let (mid_x, mid_y) = self.center();
        usize::from(x >= mid_x) + 2 * usize::from(y >= mid_y)
    }
}

/// Середина отрезка `[a, b]`, не выходящая за его концы.
///
/// Половины считаются до сложения, так что сумма не переполняется; на
/// субнормальных числах округление половин может увести результат за
/// край, отсюда зажим.
fn midpoint(
    a: f64,
    b: f64,
) -> f64 {
    (a * 0.5 + b * 0.5).max(a).min(b)
}

impl<T> Point<T> {
    pub fn new(
        x: f64,
        y: f64,
        payload: T,
    ) -> Self {
        Self { x, y, payload }
    }

    pub fn distance_to(
        &self,
        x: f64,
        y: f64,
    ) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
