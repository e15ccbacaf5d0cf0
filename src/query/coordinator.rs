use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use sightline_error::{QueryError, SightlineResult};
use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
    time::Instant,
};

use super::{
    CancelToken, Lane, QueryBackend, QueryKind, QueryOutput, QueryResult, Request, RequestId,
};
use crate::config::QueryConfig;

/// Счётчики координатора.
///
/// Обновляются с `Ordering::Relaxed`: это статистика, а не синхронизация.
#[derive(Debug, Default)]
pub struct CoordinatorStats {
    /// Принятые `submit` с новым идентификатором.
    pub submitted: AtomicU64,
    /// `submit`, совпавшие с последним живым запросом полосы.
    pub deduplicated: AtomicU64,
    /// Вызовы бэкенда.
    pub dispatched: AtomicU64,
    /// Запросы, вытесненные до срабатывания таймера или в полёте.
    pub superseded: AtomicU64,
    /// Доставленные успешные результаты.
    pub delivered: AtomicU64,
    /// Доставленные ошибки бэкенда.
    pub failed: AtomicU64,
    /// Ответы бэкенда, пришедшие после вытеснения и отброшенные.
    pub discarded: AtomicU64,
}

/// Координатор запросов: debounce, отсев повторов, отмена и доставка по
/// порядку.
///
/// Каждая [`Lane`] живёт по схеме `Idle → Pending → InFlight → Idle`:
///
/// - `submit` взводит таймер debounce; новый запрос той же полосы снимает
///   старый таймер и взводит свой, так что таймер у полосы всегда один;
/// - по истечении таймера запрос уходит в бэкенд с [`CancelToken`];
/// - новый запрос, пришедший во время вызова, взводит токен старого, и его
///   ответ, когда бы он ни пришёл, отбрасывается.
///
/// Результаты приходят в канал, возвращённый [`QueryCoordinator::new`].
/// Внутри одной полосы идентификаторы доставленных результатов строго
/// возрастают.
///
/// `submit` не блокируется и не ждёт бэкенд. Таймеры запускаются в
/// текущем runtime tokio; вне runtime `submit` возвращает
/// [`QueryError::RuntimeUnavailable`].
pub struct QueryCoordinator<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Send + 'static> {
    backend: Arc<dyn QueryBackend<T>>,
    debounce: Duration,
    autocomplete_limit: usize,
    distinct: bool,
    next_id: AtomicU64,
    closed: AtomicBool,
    text: Mutex<LaneState>,
    range: Mutex<LaneState>,
    results: mpsc::UnboundedSender<QueryResult<T>>,
    stats: CoordinatorStats,
}

#[derive(Default)]
struct LaneState {
    /// Последний принятый запрос полосы; сравнивается при отсеве повторов.
    latest: Option<Request>,
    /// Таймер debounce последнего запроса, пока он не сработал.
    timer: Option<JoinHandle<()>>,
    in_flight: Option<(RequestId, CancelToken)>,
    last_delivered: RequestId,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T: Send + 'static> QueryCoordinator<T> {
    /// Создаёт координатор и канал, в который будут приходить результаты.
    pub fn new(
        backend: Arc<dyn QueryBackend<T>>,
        config: &QueryConfig,
    ) -> (Self, mpsc::UnboundedReceiver<QueryResult<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let inner = Inner {
            backend,
            debounce: Duration::from_millis(u64::from(config.debounce_ms)),
            autocomplete_limit: config.autocomplete_limit,
            distinct: config.distinct,
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            text: Mutex::new(LaneState::default()),
            range: Mutex::new(LaneState::default()),
            results: tx,
            stats: CoordinatorStats::default(),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Принимает запрос и возвращает его идентификатор.
    ///
    /// Если включён отсев повторов и запрос совпадает с последним живым
    /// запросом своей полосы, новый идентификатор не выдаётся: возвращается
    /// идентификатор того запроса.
    pub fn submit(
        &self,
        kind: impl Into<QueryKind>,
    ) -> Result<RequestId, QueryError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(QueryError::CoordinatorClosed);
        }

        let runtime = Handle::try_current().map_err(|_| QueryError::RuntimeUnavailable)?;

        let kind = kind.into();
        let lane = kind.lane();
        let mut state = inner.lane(lane).lock();

        if inner.distinct {
            if let Some(latest) = state.latest.as_ref().filter(|r| r.kind == kind) {
                inner.stats.deduplicated.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(id = latest.id, %lane, "Duplicate query folded");
                return Ok(latest.id);
            }
        }

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        inner.stats.submitted.fetch_add(1, Ordering::Relaxed);

        if let Some(timer) = state.timer.take() {
            timer.abort();
            inner.stats.superseded.fetch_add(1, Ordering::Relaxed);
        }
        if let Some((old, token)) = state.in_flight.take() {
            token.cancel();
            inner.stats.superseded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(id = old, by = id, %lane, "In-flight query cancelled");
        }

        let request = Request {
            id,
            kind,
            issued_at: Instant::now(),
        };
        state.latest = Some(request.clone());
        state.timer = Some(runtime.spawn(Arc::clone(inner).fire(request)));

        Ok(id)
    }

    /// Останавливает координатор: снимает таймеры, отменяет вызовы в
    /// полёте. Дальнейшие `submit` возвращают
    /// [`QueryError::CoordinatorClosed`], поздние ответы отбрасываются.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        for lane in [Lane::Text, Lane::Range] {
            let mut state = self.inner.lane(lane).lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            if let Some((_, token)) = state.in_flight.take() {
                token.cancel();
            }
            state.latest = None;
        }

        tracing::debug!("Query coordinator shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &CoordinatorStats {
        &self.inner.stats
    }

    /// Последний принятый запрос полосы.
    pub fn latest(
        &self,
        lane: Lane,
    ) -> Option<Request> {
        self.inner.lane(lane).lock().latest.clone()
    }

    /// Ждёт ли полоса срабатывания таймера или ответа бэкенда.
    pub fn is_busy(
        &self,
        lane: Lane,
    ) -> bool {
        let state = self.inner.lane(lane).lock();
        state.timer.is_some() || state.in_flight.is_some()
    }
}

impl<T: Send + 'static> Inner<T> {
    fn lane(
        &self,
        lane: Lane,
    ) -> &Mutex<LaneState> {
        match lane {
            Lane::Text => &self.text,
            Lane::Range => &self.range,
        }
    }

    /// Тело таймера: ждёт окно debounce и, если запрос всё ещё последний,
    /// вызывает бэкенд.
    async fn fire(
        self: Arc<Self>,
        request: Request,
    ) {
        tokio::time::sleep(self.debounce).await;

        let lane = request.lane();
        let token = CancelToken::new();
        {
            let mut state = self.lane(lane).lock();
            let is_latest = state.latest.as_ref().map(|r| r.id) == Some(request.id);
            if !is_latest || self.closed.load(Ordering::Acquire) {
                return;
            }
            // С этого момента вытеснение идёт через токен, а не через abort.
            state.timer = None;
            state.in_flight = Some((request.id, token.clone()));
        }

        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            id = request.id,
            %lane,
            waited_ms = request.issued_at.elapsed().as_millis() as u64,
            "Dispatching query"
        );

        let outcome = match &request.kind {
            QueryKind::Text(prefix) => self
                .backend
                .autocomplete(prefix, self.autocomplete_limit, &token)
                .await
                .map(QueryOutput::Words),
            QueryKind::Range(range) => self
                .backend
                .range(range, &token)
                .await
                .map(QueryOutput::Points),
        };

        self.complete(request, &token, outcome);
    }

    /// Доставляет ответ, если запрос не вытеснен и не устарел.
    ///
    /// Отправка идёт под мьютексом полосы, поэтому порядок доставки
    /// совпадает с порядком проверки `last_delivered`.
    fn complete(
        &self,
        request: Request,
        token: &CancelToken,
        outcome: SightlineResult<QueryOutput<T>>,
    ) {
        let lane = request.lane();
        let id = request.id;
        let mut state = self.lane(lane).lock();

        if state.in_flight.as_ref().is_some_and(|(cur, _)| *cur == id) {
            state.in_flight = None;
        }

        let is_latest = state.latest.as_ref().map(|r| r.id) == Some(id);
        let stale = !is_latest
            || token.is_cancelled()
            || id <= state.last_delivered
            || self.closed.load(Ordering::Acquire);
        if stale {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(id, %lane, "Stale query result discarded");
            return;
        }

        state.last_delivered = id;

        let outcome = match outcome {
            Ok(output) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(output)
            }
            Err(source) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(id, %lane, error = %source, "Backend call failed");
                // Тот же запрос после ошибки должен уйти в бэкенд заново.
                state.latest = None;
                Err(QueryError::BackendFailure { id, source })
            }
        };

        let result = QueryResult {
            id,
            kind: request.kind,
            outcome,
        };
        if self.results.send(result).is_err() {
            tracing::trace!(id, "Result receiver dropped");
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для QueryCoordinator
////////////////////////////////////////////////////////////////////////////////

impl<T: Send + 'static> Drop for QueryCoordinator<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use sightline_error::{PrefixError, StackError, StatusCode};
    use tokio::time::timeout;

    use super::*;
    use crate::database::{Boundary, Point};

    /// Бэкенд с управляемой задержкой: запоминает вызовы и отвечает эхом.
    #[derive(Default)]
    struct Echo {
        calls: parking_lot::Mutex<Vec<String>>,
    }

    impl Echo {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl QueryBackend<u32> for Echo {
        async fn autocomplete(
            &self,
            prefix: &str,
            _limit: usize,
            _cancel: &CancelToken,
        ) -> SightlineResult<Vec<String>> {
            self.calls.lock().push(prefix.to_string());

            if prefix.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            if prefix == "fail" {
                return Err(StackError::new(PrefixError::InvalidCharacter {
                    ch: '!',
                    word: prefix.to_string(),
                }));
            }

            Ok(vec![prefix.to_uppercase()])
        }

        async fn range(
            &self,
            range: &Boundary,
            _cancel: &CancelToken,
        ) -> SightlineResult<Vec<Point<u32>>> {
            self.calls.lock().push(format!("range:{}", range.width));
            Ok(vec![Point::new(range.x, range.y, 1)])
        }
    }

    type Setup = (
        Arc<Echo>,
        QueryCoordinator<u32>,
        mpsc::UnboundedReceiver<QueryResult<u32>>,
    );

    fn setup(debounce_ms: u32) -> Setup {
        let backend = Arc::new(Echo::default());
        let config = QueryConfig {
            debounce_ms,
            ..QueryConfig::default()
        };
        let (coordinator, rx) = QueryCoordinator::<u32>::new(backend.clone(), &config);
        (backend, coordinator, rx)
    }

    async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<QueryResult<u32>>) {
        let next = timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(next.is_err(), "unexpected result: {next:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_burst() {
        let (backend, coordinator, mut rx) = setup(300);

        coordinator.submit("K").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        coordinator.submit("Ko").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let id = coordinator.submit("Kot").unwrap();

        let result = rx.recv().await.unwrap();

        assert_eq!(result.id, id);
        assert_eq!(
            result.outcome.unwrap(),
            QueryOutput::Words(vec!["KOT".to_string()])
        );
        assert_eq!(backend.calls(), vec!["Kot"]);
        assert_eq!(coordinator.stats().superseded.load(Ordering::Relaxed), 2);
        assert_silent(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_after_quiet_window() {
        let (backend, coordinator, _rx) = setup(300);

        coordinator.submit("K").unwrap();
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(backend.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(backend.calls(), vec!["K"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_when_superseded() {
        let (backend, coordinator, mut rx) = setup(50);

        let slow = coordinator.submit("slow").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(coordinator.is_busy(Lane::Text));

        let fast = coordinator.submit("fast").unwrap();
        assert!(fast > slow);

        let result = rx.recv().await.unwrap();
        assert_eq!(result.id, fast);

        assert_silent(&mut rx).await;
        assert_eq!(backend.calls(), vec!["slow", "fast"]);
        assert_eq!(coordinator.stats().discarded.load(Ordering::Relaxed), 1);
        assert!(!coordinator.is_busy(Lane::Text));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_folds_repeats() {
        let (backend, coordinator, mut rx) = setup(100);

        let first = coordinator.submit("Kot").unwrap();
        let second = coordinator.submit("Kot").unwrap();
        assert_eq!(first, second);

        rx.recv().await.unwrap();
        assert_eq!(coordinator.submit("Kot").unwrap(), first);
        assert_silent(&mut rx).await;

        assert_eq!(backend.calls(), vec!["Kot"]);
        assert_eq!(coordinator.stats().deduplicated.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_disabled() {
        let backend = Arc::new(Echo::default());
        let (coordinator, mut rx) = QueryCoordinator::<u32>::new(
            backend.clone(),
            &QueryConfig {
                debounce_ms: 10,
                distinct: false,
                ..QueryConfig::default()
            },
        );

        let first = coordinator.submit("Kot").unwrap();
        rx.recv().await.unwrap();
        let second = coordinator.submit("Kot").unwrap();
        rx.recv().await.unwrap();

        assert!(second > first);
        assert_eq!(backend.calls(), vec!["Kot", "Kot"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lanes_are_independent() {
        let (backend, coordinator, mut rx) = setup(100);

        let text = coordinator.submit("Kot").unwrap();
        let range = coordinator
            .submit(Boundary::new(1.0, 2.0, 10.0, 10.0))
            .unwrap();

        let mut ids = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        ids.sort_by_key(|r| r.id);

        assert_eq!(ids[0].id, text);
        assert_eq!(ids[0].lane(), Lane::Text);
        assert_eq!(ids[1].id, range);
        assert_eq!(
            ids[1].outcome.as_ref().unwrap().points().map(|p| p.len()),
            Some(1)
        );
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_tagged_with_request_id() {
        let (backend, coordinator, mut rx) = setup(100);

        let id = coordinator.submit("fail").unwrap();
        let result = rx.recv().await.unwrap();

        let err = result.outcome.unwrap_err();
        assert_eq!(err.request_id(), Some(id));
        assert_eq!(err.backend_status(), Some(StatusCode::InvalidCharacter));
        assert_eq!(coordinator.stats().failed.load(Ordering::Relaxed), 1);

        // После ошибки тот же запрос снова доходит до бэкенда.
        let retry = coordinator.submit("fail").unwrap();
        assert!(retry > id);
        rx.recv().await.unwrap();
        assert_eq!(backend.calls(), vec!["fail", "fail"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown() {
        let (backend, coordinator, mut rx) = setup(100);

        coordinator.submit("Kot").unwrap();
        coordinator.shutdown();

        assert!(coordinator.is_closed());
        assert!(matches!(
            coordinator.submit("Kit"),
            Err(QueryError::CoordinatorClosed)
        ));
        assert_silent(&mut rx).await;
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_in_flight() {
        let (backend, coordinator, mut rx) = setup(10);

        coordinator.submit("slow").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.shutdown();

        assert_silent(&mut rx).await;
        assert_eq!(backend.calls(), vec!["slow"]);
    }

    #[test]
    fn test_submit_outside_runtime() {
        let (backend, coordinator, _rx) = setup(100);

        assert!(matches!(
            coordinator.submit("Kot"),
            Err(QueryError::RuntimeUnavailable)
        ));
        assert!(coordinator.latest(Lane::Text).is_none());
        assert_eq!(coordinator.stats().submitted.load(Ordering::Relaxed), 0);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request() {
        let (_backend, coordinator, _rx) = setup(100);

        assert!(coordinator.latest(Lane::Text).is_none());
        let id = coordinator.submit("Ko").unwrap();

        let latest = coordinator.latest(Lane::Text).unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.kind, QueryKind::Text("Ko".into()));
    }
}
