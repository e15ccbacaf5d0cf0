use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Кооперативный токен отмены.
///
/// Координатор взводит токен, когда запрос вытеснен более новым. Бэкенд
/// может проверять его и завершаться раньше, но не обязан: результат
/// отменённого запроса всё равно не будет доставлен.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Взводит токен. Повторные вызовы ничего не меняют.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
