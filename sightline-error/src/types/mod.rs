pub mod cache;
pub mod prefix;
pub mod query;
pub mod spatial;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы
// упростить доступ к ним из внешнего кода.
pub use cache::*;
pub use prefix::*;
pub use query::*;
pub use spatial::*;
