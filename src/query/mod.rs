//! Координатор запросов поверх индексов.
//!
//! Принимает поток запросов (текст или область), гасит дребезг ввода,
//! отбрасывает повторы и вытесненные запросы и доставляет результаты в
//! порядке выдачи идентификаторов.
//!
//! # Модули
//!
//! - `request`: запросы, полосы и доставляемые результаты.
//! - `cancel`: кооперативный токен отмены.
//! - `backend`: трейт `QueryBackend` и `IndexBackend` поверх индексов.
//! - `coordinator`: `QueryCoordinator` и его счётчики.

pub mod backend;
pub mod cancel;
pub mod coordinator;
pub mod request;

pub use backend::*;
pub use cancel::*;
pub use coordinator::*;
pub use request::*;
