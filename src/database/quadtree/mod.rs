//! Квадродерево для пространственных запросов.
//!
//! # Модули
//!
//! - `boundary`: прямоугольники, точки и политика дубликатов.
//! - `quadtree_base`: `SpatialIndex`, деление узлов, запросы по
//!   прямоугольнику и радиусу.

pub mod boundary;
pub mod quadtree_base;

pub use boundary::*;
pub use quadtree_base::*;
