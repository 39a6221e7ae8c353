//! Selection Controller
//!
//! Owns the dashboard state on a single task. Every change (user commands
//! and fetch completions alike) goes through one command queue, so updates
//! are applied strictly one after another even when several fetches are in
//! flight.
//!
//! Each fetch is tagged with a generation. A completion is only merged when
//! the generation still matches the one recorded for that country; removing
//! a country (or starting a newer fetch for it) makes older completions
//! stale, and they are dropped.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::series::{Aggregator, ChartStyle, Thresholds};
use crate::source::{CountryDetail, CountrySource, CountrySummary, SourceError};

use super::directory::{CountryDirectory, DEFAULT_FLAG_URL_TEMPLATE};
use super::state::DashboardState;
use super::DashboardError;

/// Receiver for the outcome of one fetch
pub type FetchReply = oneshot::Receiver<Result<FetchOutcome, DashboardError>>;

type Reply<T> = oneshot::Sender<Result<T, DashboardError>>;

/// What happened to a requested fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Timeline was merged into the series
    Merged,
    /// Result arrived after the country was deselected or refetched
    Discarded,
    /// Nothing to fetch (country already selected)
    Unchanged,
}

/// Events published after state changes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    DirectoryLoaded {
        countries: usize,
    },
    SelectionChanged {
        countries: Vec<String>,
    },
    SeriesUpdated {
        version: u64,
        country: String,
        case_dates: usize,
        death_dates: usize,
    },
    FetchFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        country: Option<String>,
        message: String,
    },
    ChartStyleChanged {
        style: ChartStyle,
    },
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub thresholds: Thresholds,
    pub flag_url_template: String,
    pub default_style: ChartStyle,
    /// Capacity of the command queue
    pub queue_capacity: usize,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            flag_url_template: DEFAULT_FLAG_URL_TEMPLATE.to_string(),
            default_style: ChartStyle::default(),
            queue_capacity: 64,
            event_capacity: 256,
        }
    }
}

enum Command {
    LoadDirectory {
        reply: Reply<usize>,
    },
    DirectoryFetched {
        result: Result<Vec<CountrySummary>, SourceError>,
        reply: Reply<usize>,
    },
    SelectByCode {
        code: String,
        reply: Reply<FetchReply>,
    },
    AddCountry {
        name: String,
        reply: Reply<Option<FetchReply>>,
    },
    ReplaceSelection {
        names: Vec<String>,
        reply: Reply<Vec<FetchReply>>,
    },
    RemoveCountry {
        name: String,
        reply: Reply<()>,
    },
    SetChartStyle {
        style: ChartStyle,
    },
    DetailFetched {
        name: String,
        generation: u64,
        result: Result<CountryDetail, SourceError>,
        reply: Reply<FetchOutcome>,
    },
}

/// Handle to the controller task
///
/// Cheap to clone; all clones talk to the same state.
#[derive(Clone)]
pub struct SelectionController {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
}

impl SelectionController {
    /// Start the controller task
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(source: Arc<dyn CountrySource>, config: ControllerConfig) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(config.queue_capacity);
        let initial = DashboardState::default().with_chart_style(config.default_style);
        let (state_tx, snapshots) = watch::channel(Arc::new(initial.clone()));
        let (events, _) = broadcast::channel(config.event_capacity);

        let worker = Worker {
            source,
            aggregator: Aggregator::new(config.thresholds),
            flag_url_template: config.flag_url_template,
            state: Arc::new(initial),
            state_tx,
            events: events.clone(),
            loopback: commands.downgrade(),
            generation: 0,
        };
        let handle = tokio::spawn(worker.run(rx));

        (
            Self {
                commands,
                snapshots,
                events,
            },
            handle,
        )
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DashboardState> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver that sees every published snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.snapshots.clone()
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, DashboardError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| DashboardError::Closed)?;
        rx.await.map_err(|_| DashboardError::Closed)?
    }

    /// Fetch the country directory; returns the number of countries
    pub async fn load_directory(&self) -> Result<usize, DashboardError> {
        self.request(|reply| Command::LoadDirectory { reply }).await
    }

    /// Fetch a country by ISO code and select it once its data arrives
    pub async fn select_by_code(&self, code: &str) -> Result<FetchOutcome, DashboardError> {
        let code = code.to_string();
        let pending = self
            .request(|reply| Command::SelectByCode { code, reply })
            .await?;
        await_fetch(pending).await
    }

    /// Add a country to the selection and wait for its data
    pub async fn add_country(&self, name: &str) -> Result<FetchOutcome, DashboardError> {
        let name = name.to_string();
        let pending = self
            .request(|reply| Command::AddCountry { name, reply })
            .await?;
        match pending {
            Some(rx) => await_fetch(rx).await,
            None => Ok(FetchOutcome::Unchanged),
        }
    }

    /// Replace the whole selection; fetches every newly added country and
    /// waits for all of them
    pub async fn replace_selection(
        &self,
        names: Vec<String>,
    ) -> Result<Vec<FetchOutcome>, DashboardError> {
        let pending = self
            .request(|reply| Command::ReplaceSelection { names, reply })
            .await?;

        let mut outcomes = Vec::with_capacity(pending.len());
        let mut first_error = None;
        for rx in pending {
            match await_fetch(rx).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }

    /// Drop a country from the selection
    pub async fn remove_country(&self, name: &str) -> Result<(), DashboardError> {
        let name = name.to_string();
        self.request(|reply| Command::RemoveCountry { name, reply })
            .await
    }

    pub async fn set_chart_style(&self, style: ChartStyle) -> Result<(), DashboardError> {
        self.commands
            .send(Command::SetChartStyle { style })
            .await
            .map_err(|_| DashboardError::Closed)
    }
}

async fn await_fetch(rx: FetchReply) -> Result<FetchOutcome, DashboardError> {
    rx.await.map_err(|_| DashboardError::Closed)?
}

/// State owner running on the controller task
struct Worker {
    source: Arc<dyn CountrySource>,
    aggregator: Aggregator,
    flag_url_template: String,
    state: Arc<DashboardState>,
    state_tx: watch::Sender<Arc<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
    /// Weak so the queue closes once all handles are gone
    loopback: mpsc::WeakSender<Command>,
    generation: u64,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!("Selection controller started");

        while let Some(command) = rx.recv().await {
            self.handle(command);
        }

        tracing::info!("Selection controller stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::LoadDirectory { reply } => self.spawn_directory_fetch(reply),
            Command::DirectoryFetched { result, reply } => self.on_directory(result, reply),
            Command::SelectByCode { code, reply } => {
                let found = self
                    .state
                    .directory
                    .by_code(&code)
                    .map(|c| (c.name.clone(), c.code.clone()));
                let result = match found {
                    Some((name, code)) => Ok(self.start_fetch(name, code)),
                    None => Err(DashboardError::UnknownCountry(code)),
                };
                let _ = reply.send(result);
            }
            Command::AddCountry { name, reply } => {
                let result = if self.state.is_selected(&name) {
                    Ok(None)
                } else {
                    let mut names = self.state.selected.clone();
                    names.push(name);
                    self.apply_selection(names)
                        .map(|mut pending| pending.pop())
                };
                let _ = reply.send(result);
            }
            Command::ReplaceSelection { names, reply } => {
                let _ = reply.send(self.apply_selection(names));
            }
            Command::RemoveCountry { name, reply } => {
                let (next, diff) = self.state.without_country(&name);
                if !diff.is_empty() {
                    self.publish(next);
                    self.emit(DashboardEvent::SelectionChanged {
                        countries: self.state.selected.clone(),
                    });
                }
                let _ = reply.send(Ok(()));
            }
            Command::SetChartStyle { style } => {
                let next = self.state.with_chart_style(style);
                self.publish(next);
                self.emit(DashboardEvent::ChartStyleChanged { style });
            }
            Command::DetailFetched {
                name,
                generation,
                result,
                reply,
            } => {
                let _ = reply.send(self.on_detail(name, generation, result));
            }
        }
    }

    fn publish(&mut self, next: DashboardState) {
        self.state = Arc::new(next);
        self.state_tx.send_replace(Arc::clone(&self.state));
    }

    fn emit(&self, event: DashboardEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn spawn_directory_fetch(&self, reply: Reply<usize>) {
        let source = Arc::clone(&self.source);
        let loopback = self.loopback.clone();

        tokio::spawn(async move {
            let result = source.list_countries().await;
            if let Some(tx) = loopback.upgrade() {
                let _ = tx.send(Command::DirectoryFetched { result, reply }).await;
            }
        });
    }

    fn on_directory(
        &mut self,
        result: Result<Vec<CountrySummary>, SourceError>,
        reply: Reply<usize>,
    ) {
        match result {
            Ok(summaries) => {
                let directory =
                    CountryDirectory::from_summaries(summaries, &self.flag_url_template);
                let count = directory.len();
                let next = self.state.with_directory(directory);
                self.publish(next);

                tracing::info!(countries = count, "Country directory loaded");
                self.emit(DashboardEvent::DirectoryLoaded { countries: count });
                let _ = reply.send(Ok(count));
            }
            Err(e) => {
                let message = format!("Failed to load countries: {}", e);
                tracing::warn!(error = %e, "Country directory fetch failed");
                let next = self.state.with_error(message.clone());
                self.publish(next);
                self.emit(DashboardEvent::FetchFailed {
                    country: None,
                    message,
                });
                let _ = reply.send(Err(e.into()));
            }
        }
    }

    /// Validate names, apply the selection, and start fetches for additions
    fn apply_selection(&mut self, names: Vec<String>) -> Result<Vec<FetchReply>, DashboardError> {
        if let Some(unknown) = names.iter().find(|n| !self.state.directory.contains(n)) {
            return Err(DashboardError::UnknownCountry(unknown.clone()));
        }

        let (next, diff) = self.state.with_selection(names);
        if next.selected == self.state.selected {
            return Ok(Vec::new());
        }
        self.publish(next);

        tracing::debug!(
            added = ?diff.added,
            removed = ?diff.removed,
            "Selection changed"
        );
        self.emit(DashboardEvent::SelectionChanged {
            countries: self.state.selected.clone(),
        });

        let mut pending = Vec::with_capacity(diff.added.len());
        for name in diff.added {
            let code = self
                .state
                .directory
                .get(&name)
                .map(|c| c.code.clone())
                .ok_or_else(|| DashboardError::UnknownCountry(name.clone()))?;
            pending.push(self.start_fetch(name, code));
        }
        Ok(pending)
    }

    fn start_fetch(&mut self, name: String, code: String) -> FetchReply {
        self.generation += 1;
        let generation = self.generation;
        let next = self.state.with_pending(&name, generation);
        self.publish(next);

        let (reply, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let loopback = self.loopback.clone();

        tracing::debug!(country = %name, code = %code, generation, "Fetching country detail");

        tokio::spawn(async move {
            let result = source.country_detail(&code).await;
            if let Some(tx) = loopback.upgrade() {
                let _ = tx
                    .send(Command::DetailFetched {
                        name,
                        generation,
                        result,
                        reply,
                    })
                    .await;
            }
        });

        rx
    }

    fn on_detail(
        &mut self,
        name: String,
        generation: u64,
        result: Result<CountryDetail, SourceError>,
    ) -> Result<FetchOutcome, DashboardError> {
        if !self.state.accepts(&name, generation) {
            tracing::debug!(country = %name, generation, "Discarding stale fetch result");
            return Ok(FetchOutcome::Discarded);
        }

        match result {
            Ok(mut detail) => {
                // Directory name is the series key, whatever the detail says
                detail.name = name.clone();
                let newly_selected = !self.state.is_selected(&name);

                let next = self.state.with_detail(&detail, &self.aggregator);
                self.publish(next);

                if newly_selected {
                    self.emit(DashboardEvent::SelectionChanged {
                        countries: self.state.selected.clone(),
                    });
                }
                self.emit(DashboardEvent::SeriesUpdated {
                    version: self.state.version,
                    country: name,
                    case_dates: self.state.cases.len(),
                    death_dates: self.state.deaths.len(),
                });
                Ok(FetchOutcome::Merged)
            }
            Err(e) => {
                let message = format!("Failed to fetch {}: {}", name, e);
                tracing::warn!(country = %name, error = %e, "Country fetch failed");
                let was_selected = self.state.is_selected(&name);
                let next = self.state.with_failure(&name, message.clone());
                self.publish(next);
                if was_selected {
                    self.emit(DashboardEvent::SelectionChanged {
                        countries: self.state.selected.clone(),
                    });
                }
                self.emit(DashboardEvent::FetchFailed {
                    country: Some(name),
                    message,
                });
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DailyRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// In-memory source with optional per-code gates
    #[derive(Default)]
    struct FakeSource {
        countries: Vec<CountrySummary>,
        details: HashMap<String, CountryDetail>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        calls: Mutex<HashMap<String, usize>>,
        list_calls: AtomicUsize,
        fail_list: AtomicBool,
    }

    impl FakeSource {
        fn with_country(mut self, name: &str, code: &str, timeline: Vec<DailyRecord>) -> Self {
            self.countries.push(CountrySummary {
                name: name.to_string(),
                code: code.to_string(),
            });
            self.details.insert(
                code.to_string(),
                CountryDetail {
                    name: name.to_string(),
                    code: code.to_string(),
                    timeline,
                },
            );
            self
        }

        /// Listed in the directory but the detail endpoint fails
        fn with_broken_country(mut self, name: &str, code: &str) -> Self {
            self.countries.push(CountrySummary {
                name: name.to_string(),
                code: code.to_string(),
            });
            self
        }

        fn gate(&self, code: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(code.to_string(), Arc::clone(&notify));
            notify
        }

        fn calls(&self, code: &str) -> usize {
            self.calls.lock().unwrap().get(code).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl CountrySource for FakeSource {
        async fn list_countries(&self) -> Result<Vec<CountrySummary>, SourceError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable);
            }
            Ok(self.countries.clone())
        }

        async fn country_detail(&self, code: &str) -> Result<CountryDetail, SourceError> {
            *self.calls.lock().unwrap().entry(code.to_string()).or_insert(0) += 1;

            let gate = self.gates.lock().unwrap().remove(code);
            if let Some(gate) = gate {
                gate.notified().await;
            }

            self.details
                .get(code)
                .cloned()
                .ok_or_else(|| SourceError::MissingData {
                    endpoint: format!("/countries/{}", code),
                })
        }
    }

    fn sample_source() -> FakeSource {
        FakeSource::default()
            .with_country(
                "A",
                "AA",
                vec![
                    DailyRecord::new("2020-01-01", 25, 0),
                    DailyRecord::new("2020-01-02", 30, 2),
                ],
            )
            .with_country("B", "BB", vec![DailyRecord::new("2020-01-02", 45, 3)])
            .with_broken_country("Broken", "XX")
    }

    async fn start(source: Arc<FakeSource>) -> SelectionController {
        let (controller, _task) = SelectionController::spawn(source, ControllerConfig::default());
        controller.load_directory().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn test_load_directory() {
        let source = Arc::new(sample_source());
        let controller = start(Arc::clone(&source)).await;

        let state = controller.snapshot();
        assert_eq!(state.directory.len(), 3);
        assert!(state.directory.get("A").unwrap().flag_url.contains("AA"));
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_directory_failure_is_visible() {
        let source = Arc::new(FakeSource {
            fail_list: AtomicBool::new(true),
            ..FakeSource::default()
        });
        let (controller, _task) = SelectionController::spawn(source, ControllerConfig::default());

        let err = controller.load_directory().await.unwrap_err();
        assert!(matches!(err, DashboardError::Source(SourceError::Unavailable)));
        assert!(controller.snapshot().last_error.is_some());
    }

    #[tokio::test]
    async fn test_directory_reload_after_failure() {
        let source = Arc::new(sample_source());
        source.fail_list.store(true, Ordering::SeqCst);
        let (controller, _task) =
            SelectionController::spawn(Arc::clone(&source) as Arc<dyn CountrySource>, ControllerConfig::default());

        assert!(controller.load_directory().await.is_err());
        assert!(controller.snapshot().directory.is_empty());
        assert!(matches!(
            controller.add_country("A").await,
            Err(DashboardError::UnknownCountry(_))
        ));

        source.fail_list.store(false, Ordering::SeqCst);
        assert_eq!(controller.load_directory().await.unwrap(), 3);
        assert_eq!(controller.add_country("A").await.unwrap(), FetchOutcome::Merged);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_add_country_merges_series() {
        let controller = start(Arc::new(sample_source())).await;

        let outcome = controller.add_country("A").await.unwrap();
        assert_eq!(outcome, FetchOutcome::Merged);

        let state = controller.snapshot();
        assert_eq!(state.selected, vec!["A".to_string()]);

        let charts = state.charts();
        assert_eq!(charts[0].data.len(), 2);
        assert_eq!(charts[1].data.len(), 1);
        assert!(state.pending.is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_is_unchanged() {
        let source = Arc::new(sample_source());
        let controller = start(Arc::clone(&source)).await;

        controller.add_country("A").await.unwrap();
        let outcome = controller.add_country("A").await.unwrap();

        assert_eq!(outcome, FetchOutcome::Unchanged);
        assert_eq!(source.calls("AA"), 1);
    }

    #[tokio::test]
    async fn test_unknown_country_rejected() {
        let controller = start(Arc::new(sample_source())).await;

        let err = controller.add_country("Atlantis").await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownCountry(ref n) if n == "Atlantis"));

        let err = controller.select_by_code("ZZ").await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownCountry(_)));
        assert!(controller.snapshot().selected.is_empty());
    }

    #[tokio::test]
    async fn test_select_by_code() {
        let controller = start(Arc::new(sample_source())).await;

        let outcome = controller.select_by_code("bb").await.unwrap();

        assert_eq!(outcome, FetchOutcome::Merged);
        assert_eq!(controller.snapshot().selected, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_two_countries_only_shared_dates() {
        let controller = start(Arc::new(sample_source())).await;

        let outcomes = controller
            .replace_selection(vec!["A".to_string(), "B".to_string()])
            .await
            .unwrap();
        assert_eq!(outcomes, vec![FetchOutcome::Merged, FetchOutcome::Merged]);

        let cases = controller.snapshot().charts().remove(0);
        assert_eq!(cases.data.len(), 1);
        assert_eq!(cases.data[0].label, "Jan-02");
        assert_eq!(cases.data[0].get("A"), Some(30));
        assert_eq!(cases.data[0].get("B"), Some(45));
    }

    #[tokio::test]
    async fn test_readding_refetches() {
        let source = Arc::new(sample_source());
        let controller = start(Arc::clone(&source)).await;

        controller.add_country("A").await.unwrap();
        controller.remove_country("A").await.unwrap();
        assert!(controller.snapshot().selected.is_empty());

        let outcome = controller.add_country("A").await.unwrap();
        assert_eq!(outcome, FetchOutcome::Merged);
        assert_eq!(source.calls("AA"), 2);
    }

    #[tokio::test]
    async fn test_late_result_after_removal_is_discarded() {
        let source = Arc::new(sample_source());
        let gate = source.gate("AA");
        let controller = start(Arc::clone(&source)).await;

        let adder = controller.clone();
        let pending = tokio::spawn(async move { adder.add_country("A").await });

        let mut snapshots = controller.watch();
        snapshots
            .wait_for(|s| s.pending.contains_key("A"))
            .await
            .unwrap();

        controller.remove_country("A").await.unwrap();
        gate.notify_one();

        let outcome = pending.await.unwrap().unwrap();
        assert_eq!(outcome, FetchOutcome::Discarded);

        let state = controller.snapshot();
        assert!(state.cases.is_empty());
        assert!(state.deaths.is_empty());
        assert!(state.selected.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_error() {
        let controller = start(Arc::new(sample_source())).await;
        controller.add_country("A").await.unwrap();
        let before = controller.snapshot();

        let mut events = controller.subscribe();
        let err = controller.add_country("Broken").await.unwrap_err();
        assert!(matches!(err, DashboardError::Source(_)));

        let after = controller.snapshot();
        assert!(after.last_error.as_deref().unwrap().contains("Broken"));
        assert_eq!(after.cases, before.cases);
        assert_eq!(after.deaths, before.deaths);

        // The failed country leaves the selection, so the charts look as before
        assert_eq!(after.selected, vec!["A".to_string()]);
        assert_eq!(after.charts()[0].data, before.charts()[0].data);
        assert_eq!(after.charts()[0].data.len(), 2);

        let mut selections = Vec::new();
        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            match event {
                DashboardEvent::SelectionChanged { countries } => selections.push(countries),
                DashboardEvent::FetchFailed { country, .. } => {
                    assert_eq!(country.as_deref(), Some("Broken"));
                    saw_failure = true;
                }
                _ => {}
            }
        }
        assert!(saw_failure);
        assert_eq!(selections.last(), Some(&vec!["A".to_string()]));
    }

    #[tokio::test]
    async fn test_failed_country_can_be_retried() {
        let source = Arc::new(sample_source());
        let controller = start(Arc::clone(&source)).await;

        assert!(controller.add_country("Broken").await.is_err());
        assert!(controller.add_country("Broken").await.is_err());

        assert_eq!(source.calls("XX"), 2);
        assert!(controller.snapshot().selected.is_empty());
    }

    #[tokio::test]
    async fn test_reorder_is_published() {
        let controller = start(Arc::new(sample_source())).await;
        controller
            .replace_selection(vec!["A".to_string(), "B".to_string()])
            .await
            .unwrap();

        let mut events = controller.subscribe();
        let outcomes = controller
            .replace_selection(vec!["B".to_string(), "A".to_string()])
            .await
            .unwrap();

        assert!(outcomes.is_empty());
        let state = controller.snapshot();
        assert_eq!(state.selected, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(state.charts()[0].names, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(
            events.try_recv().unwrap(),
            DashboardEvent::SelectionChanged {
                countries: vec!["B".to_string(), "A".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_chart_style_and_events() {
        let controller = start(Arc::new(sample_source())).await;
        let mut events = controller.subscribe();

        controller.set_chart_style(ChartStyle::Line).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            DashboardEvent::ChartStyleChanged {
                style: ChartStyle::Line
            }
        );
        assert_eq!(controller.snapshot().chart_style, ChartStyle::Line);
    }

    #[tokio::test]
    async fn test_stops_when_handles_dropped() {
        let (controller, task) =
            SelectionController::spawn(Arc::new(sample_source()), ControllerConfig::default());
        drop(controller);

        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
