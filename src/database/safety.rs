/// Макрос для debug-time проверки инвариантов.
///
/// В release-сборках компилируется в no-op.
#[macro_export]
macro_rules! debug_assert_invariant {
    ($cond:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            if !$cond {
                panic!("Invariant violation: {}", format!($($arg)*));
            }
        }
    };
}

/// Макрос для валидации условий с возвратом ошибки.
#[macro_export]
macro_rules! validate {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Нарушение структурного инварианта одного из индексов.
///
/// Возвращается методами `validate_invariants`; в корректно работающем
/// индексе не возникает никогда.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Число живых элементов превышает ёмкость
    CapacityExceeded { capacity: usize, actual: usize },
    /// Счётчик длины не соответствует реальному количеству элементов
    LengthMismatch { expected: usize, actual: usize },
    /// Список давности и хеш-таблица расходятся
    OrderMismatch { message: String },
    /// Узел одновременно хранит точки и имеет потомков, либо переполнен
    NodeShape { message: String },
    /// Точка лежит вне границы узла, которому принадлежит
    Containment { message: String },
    /// Границы потомков не разбивают границу родителя
    Partition { message: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ValidationError::CapacityExceeded { capacity, actual } => {
                write!(f, "Capacity exceeded: {actual} entries, capacity {capacity}")
            }
            ValidationError::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {expected}, got {actual}")
            }
            ValidationError::OrderMismatch { message } => {
                write!(f, "Recency order mismatch: {message}")
            }
            ValidationError::NodeShape { message } => write!(f, "Invalid node shape: {message}"),
            ValidationError::Containment { message } => {
                write!(f, "Containment violation: {message}")
            }
            ValidationError::Partition { message } => {
                write!(f, "Partition violation: {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
