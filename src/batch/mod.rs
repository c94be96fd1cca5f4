//! Batch resolution over workbook sheets: sequential, resumable-safe,
//! crash-safe persistence via a single atomic replace.

use crate::error::StoreError;
use crate::identity::{normalize, SkinIdentity};
use crate::market::{Outcome, PriceResult, SourceAdapter};
use crate::page::RemotePage;
use crate::store::TabularStore;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cell value for rows whose price could not be resolved. Distinguishable
/// from any real price; never zero, never blank.
pub const UNMATCHED_SENTINEL: &str = "-";

/// Which sheets a run operates on; everything else is copied through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    All,
    /// 1-based sheet positions, matching the interactive listing.
    Indices(Vec<usize>),
    Names(Vec<String>),
}

impl SheetSelection {
    /// Resolves the selection against the store's sheet order.
    pub fn resolve(&self, names: &[String]) -> Vec<String> {
        match self {
            SheetSelection::All => names.to_vec(),
            SheetSelection::Indices(indices) => indices
                .iter()
                .filter_map(|i| i.checked_sub(1).and_then(|i| names.get(i)))
                .cloned()
                .collect(),
            SheetSelection::Names(selected) => {
                names.iter().filter(|n| selected.contains(n)).cloned().collect()
            }
        }
    }
}

impl FromStr for SheetSelection {
    type Err = String;

    /// `all` (or `0`) selects everything; otherwise a comma-separated list
    /// of 1-based sheet numbers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "0" {
            return Ok(SheetSelection::All);
        }
        let indices = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|i| *i >= 1)
                    .ok_or_else(|| format!("Invalid sheet number: {:?}", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SheetSelection::Indices(indices))
    }
}

/// Bounded retry with a fixed delay, applied uniformly by the controller.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts: attempts.max(1), delay }
    }
}

/// Cooperative cancellation flag, set from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observable progress; a side channel only, never persisted.
pub enum Progress<'a> {
    SheetStarted { name: &'a str, index: usize, total: usize },
    RowResolved { sheet: &'a str, row: usize, total: usize, result: &'a PriceResult },
    SheetFinished { name: &'a str, matched: usize, total: usize },
}

type ProgressFn = Box<dyn Fn(Progress<'_>) + Send>;

/// What a finished (or aborted) run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sheets_processed: usize,
    pub rows_processed: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub aborted: bool,
    /// True once the backing store was durably replaced.
    pub replaced: bool,
}

/// Run options; the price column is derived from the adapter.
pub struct BatchOptions {
    pub selection: SheetSelection,
    pub item_column: String,
    pub resolve_retry: RetryPolicy,
    pub replace_retry: RetryPolicy,
}

/// Drives one run: store order in, store order out, one writer.
pub struct BatchController<'a> {
    store: &'a mut dyn TabularStore,
    adapter: &'a dyn SourceAdapter,
    page: &'a dyn RemotePage,
    options: BatchOptions,
    cancel: CancelFlag,
    progress: ProgressFn,
}

impl<'a> BatchController<'a> {
    pub fn new(
        store: &'a mut dyn TabularStore,
        adapter: &'a dyn SourceAdapter,
        page: &'a dyn RemotePage,
        options: BatchOptions,
    ) -> Self {
        Self { store, adapter, page, options, cancel: CancelFlag::new(), progress: Box::new(|_| {}) }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(Progress<'_>) + Send + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Processes the selected sheets and atomically replaces the store.
    ///
    /// Per-row failures fold into the sentinel and never abort the run. An
    /// interruption aborts without touching the store; only a missing store
    /// or a replace failure past the retry budget surfaces as an error.
    pub async fn run(mut self) -> Result<RunSummary, StoreError> {
        let names = self.store.sheet_names();
        let selected = self.options.selection.resolve(&names);
        let price_column = self.adapter.id().price_column();

        let mut summary = RunSummary::default();
        let total_selected = selected.len();

        for name in &names {
            if self.cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            let mut sheet = self.store.read_sheet(name)?;
            let item_idx =
                if selected.contains(name) { sheet.column_index(&self.options.item_column) } else { None };

            if let Some(item_idx) = item_idx {
                summary.sheets_processed += 1;
                (self.progress)(Progress::SheetStarted {
                    name,
                    index: summary.sheets_processed,
                    total: total_selected,
                });

                let price_idx = sheet.ensure_column(&price_column);
                let total_rows = sheet.rows.len();
                let mut matched_in_sheet = 0;

                for row in 0..total_rows {
                    if self.cancel.is_cancelled() {
                        summary.aborted = true;
                        break;
                    }

                    let raw = sheet.cell(row, item_idx).unwrap_or_default().to_string();
                    let identity = normalize(&raw);
                    let result = self.resolve_with_retry(&identity).await;

                    let cell = match result.outcome {
                        Outcome::Matched(price) => {
                            summary.matched += 1;
                            matched_in_sheet += 1;
                            price.to_string()
                        }
                        _ => {
                            summary.unmatched += 1;
                            UNMATCHED_SENTINEL.to_string()
                        }
                    };
                    sheet.set_cell(row, price_idx, cell);
                    summary.rows_processed += 1;

                    (self.progress)(Progress::RowResolved {
                        sheet: name,
                        row: row + 1,
                        total: total_rows,
                        result: &result,
                    });
                }

                (self.progress)(Progress::SheetFinished {
                    name,
                    matched: matched_in_sheet,
                    total: total_rows,
                });
            }

            self.store.stage_sheet(sheet)?;

            if summary.aborted {
                break;
            }
        }

        // Finalize only with every sheet buffered; otherwise the original
        // store stays untouched.
        if summary.aborted || self.store.staged_len() != names.len() {
            summary.aborted = true;
            info!("run aborted; store left untouched");
            return Ok(summary);
        }

        let mut attempt = 1;
        loop {
            match self.store.atomic_replace() {
                Ok(()) => {
                    summary.replaced = true;
                    debug!("store replaced after {} attempt(s)", attempt);
                    return Ok(summary);
                }
                Err(StoreError::Locked) if attempt < self.options.replace_retry.attempts => {
                    warn!(
                        "destination locked, retry {}/{}",
                        attempt, self.options.replace_retry.attempts
                    );
                    attempt += 1;
                    tokio::time::sleep(self.options.replace_retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn resolve_with_retry(&self, identity: &SkinIdentity) -> PriceResult {
        let mut attempt = 1;
        loop {
            let result = self.adapter.resolve_price(self.page, identity).await;
            match &result.outcome {
                Outcome::Error(e)
                    if e.is_transient() && attempt < self.options.resolve_retry.attempts =>
                {
                    debug!(
                        "transient failure for {:?} (attempt {}/{}): {}",
                        identity.display(),
                        attempt,
                        self.options.resolve_retry.attempts,
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.options.resolve_retry.delay).await;
                }
                _ => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::identity::SkinIdentity;
    use crate::market::{PriceResult, SourceId};
    use crate::page::{PageError, PageState, RemotePage};
    use crate::store::Sheet;
    use async_trait::async_trait;
    use scraper::Selector;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    struct MemoryStore {
        sheets: Vec<Sheet>,
        staged: Vec<Sheet>,
        replaced: Vec<Sheet>,
        locked_failures: u32,
        replace_calls: u32,
    }

    impl MemoryStore {
        fn new(sheets: Vec<Sheet>) -> Self {
            Self {
                sheets,
                staged: Vec::new(),
                replaced: Vec::new(),
                locked_failures: 0,
                replace_calls: 0,
            }
        }
    }

    impl TabularStore for MemoryStore {
        fn sheet_names(&self) -> Vec<String> {
            self.sheets.iter().map(|s| s.name.clone()).collect()
        }

        fn read_sheet(&self, name: &str) -> Result<Sheet, StoreError> {
            self.sheets
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .ok_or_else(|| StoreError::UnknownSheet(name.to_string()))
        }

        fn stage_sheet(&mut self, sheet: Sheet) -> Result<(), StoreError> {
            self.staged.push(sheet);
            Ok(())
        }

        fn atomic_replace(&mut self) -> Result<(), StoreError> {
            self.replace_calls += 1;
            if self.locked_failures > 0 {
                self.locked_failures -= 1;
                return Err(StoreError::Locked);
            }
            self.replaced = std::mem::take(&mut self.staged);
            Ok(())
        }

        fn staged_len(&self) -> usize {
            self.staged.len()
        }
    }

    struct StubPage;

    #[async_trait]
    impl RemotePage for StubPage {
        async fn navigate(&self, url: &str) -> Result<PageState, PageError> {
            Ok(PageState::new(url, ""))
        }

        async fn submit_query(&self, endpoint: &str, query: &str) -> Result<PageState, PageError> {
            Ok(PageState::new(format!("{}{}", endpoint, query), ""))
        }

        async fn wait_for(&self, state: &mut PageState, css: &Selector, _: Duration) -> bool {
            state.has_match(css)
        }
    }

    /// Adapter scripted by display name.
    struct ScriptedAdapter {
        outcomes: Mutex<HashMap<String, Vec<Outcome>>>,
        calls: AtomicU32,
    }

    impl ScriptedAdapter {
        fn new(outcomes: &[(&str, Outcome)]) -> Self {
            let mut map: HashMap<String, Vec<Outcome>> = HashMap::new();
            for (name, outcome) in outcomes {
                map.entry(name.to_string()).or_default().push(outcome.clone());
            }
            Self { outcomes: Mutex::new(map), calls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        fn id(&self) -> SourceId {
            SourceId::Keydrop
        }

        fn base_url(&self) -> &str {
            "https://scripted.test"
        }

        async fn resolve_price(
            &self,
            _page: &dyn RemotePage,
            identity: &SkinIdentity,
        ) -> PriceResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            let outcome = match outcomes.get_mut(identity.display()) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue[0].clone(),
                None => Outcome::NotFound,
            };
            PriceResult { identity: identity.clone(), source: SourceId::Keydrop, outcome }
        }
    }

    fn item_sheet(name: &str, items: &[&str]) -> Sheet {
        let mut sheet = Sheet::new(name, vec!["steam_market_hash_name".to_string()]);
        for item in items {
            sheet.push_row(vec![item.to_string()]);
        }
        sheet
    }

    fn options(selection: SheetSelection) -> BatchOptions {
        BatchOptions {
            selection,
            item_column: "steam_market_hash_name".to_string(),
            resolve_retry: RetryPolicy::new(2, Duration::from_millis(0)),
            replace_retry: RetryPolicy::new(3, Duration::from_millis(0)),
        }
    }

    #[test]
    fn test_sheet_selection_parsing() {
        assert_eq!("all".parse::<SheetSelection>().unwrap(), SheetSelection::All);
        assert_eq!("0".parse::<SheetSelection>().unwrap(), SheetSelection::All);
        assert_eq!(
            "1,3".parse::<SheetSelection>().unwrap(),
            SheetSelection::Indices(vec![1, 3])
        );
        assert!("x".parse::<SheetSelection>().is_err());
        assert!("1,-2".parse::<SheetSelection>().is_err());
    }

    #[test]
    fn test_sheet_selection_resolve() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(SheetSelection::All.resolve(&names), names);
        assert_eq!(SheetSelection::Indices(vec![2]).resolve(&names), vec!["B"]);
        // Out-of-range indices are ignored.
        assert_eq!(SheetSelection::Indices(vec![9]).resolve(&names), Vec::<String>::new());
        assert_eq!(
            SheetSelection::Names(vec!["C".to_string()]).resolve(&names),
            vec!["C"]
        );
    }

    #[tokio::test]
    async fn test_run_writes_prices_and_sentinels() {
        let mut store = MemoryStore::new(vec![item_sheet(
            "Main",
            &["AK-47 | Redline (Field-Tested)", "Unknown Widget"],
        )]);
        let adapter = ScriptedAdapter::new(&[(
            "AK-47 | Redline (Field-Tested)",
            Outcome::Matched(12.34),
        )]);
        let page = StubPage;

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched, 1);
        assert!(summary.replaced);
        assert!(!summary.aborted);
        assert_eq!(store.replace_calls, 1);

        let sheet = &store.replaced[0];
        assert_eq!(sheet.columns[1], "keydrop_price");
        assert_eq!(sheet.cell(0, 1), Some("12.34"));
        assert_eq!(sheet.cell(1, 1), Some(UNMATCHED_SENTINEL));
    }

    #[tokio::test]
    async fn test_unselected_sheets_pass_through() {
        let mut store = MemoryStore::new(vec![
            item_sheet("First", &["AK-47 | Redline (Field-Tested)"]),
            item_sheet("Second", &["AK-47 | Redline (Field-Tested)"]),
        ]);
        let adapter = ScriptedAdapter::new(&[(
            "AK-47 | Redline (Field-Tested)",
            Outcome::Matched(12.34),
        )]);
        let page = StubPage;

        let summary = BatchController::new(
            &mut store,
            &adapter,
            &page,
            options(SheetSelection::Indices(vec![1])),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(summary.sheets_processed, 1);
        // Unselected sheet keeps its original column set.
        assert_eq!(store.replaced[1].columns.len(), 1);
        assert_eq!(store.replaced[0].columns.len(), 2);
    }

    #[tokio::test]
    async fn test_sheet_without_item_column_passes_through() {
        let mut sheet = Sheet::new("NoCol", vec!["other".to_string()]);
        sheet.push_row(vec!["x".to_string()]);
        let mut store = MemoryStore::new(vec![sheet]);
        let adapter = ScriptedAdapter::new(&[]);
        let page = StubPage;

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.sheets_processed, 0);
        assert_eq!(summary.rows_processed, 0);
        assert!(summary.replaced);
        assert_eq!(store.replaced[0].columns, vec!["other"]);
    }

    #[tokio::test]
    async fn test_cancelled_run_never_replaces() {
        let mut store = MemoryStore::new(vec![item_sheet(
            "Main",
            &["AK-47 | Redline (Field-Tested)"],
        )]);
        let adapter = ScriptedAdapter::new(&[]);
        let page = StubPage;
        let cancel = CancelFlag::new();
        cancel.cancel();

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .with_cancel_flag(cancel)
            .run()
            .await
            .unwrap();

        assert!(summary.aborted);
        assert!(!summary.replaced);
        assert_eq!(store.replace_calls, 0);
        assert!(store.replaced.is_empty());
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mut store = MemoryStore::new(vec![item_sheet(
            "Main",
            &["AK-47 | Redline (Field-Tested)"],
        )]);
        let adapter = ScriptedAdapter::new(&[
            (
                "AK-47 | Redline (Field-Tested)",
                Outcome::Error(ResolveError::Remote("503".to_string())),
            ),
            ("AK-47 | Redline (Field-Tested)", Outcome::Matched(12.34)),
        ]);
        let page = StubPage;

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_definitive_outcomes_are_not_retried() {
        let mut store = MemoryStore::new(vec![item_sheet(
            "Main",
            &["AK-47 | Redline (Field-Tested)"],
        )]);
        let adapter =
            ScriptedAdapter::new(&[("AK-47 | Redline (Field-Tested)", Outcome::NotFound)]);
        let page = StubPage;

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.unmatched, 1);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replace_retried_while_locked() {
        let mut store = MemoryStore::new(vec![item_sheet("Main", &[])]);
        store.locked_failures = 2;
        let adapter = ScriptedAdapter::new(&[]);
        let page = StubPage;

        let summary = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await
            .unwrap();

        assert!(summary.replaced);
        assert_eq!(store.replace_calls, 3);
    }

    #[tokio::test]
    async fn test_replace_fails_past_retry_budget() {
        let mut store = MemoryStore::new(vec![item_sheet("Main", &[])]);
        store.locked_failures = 10;
        let adapter = ScriptedAdapter::new(&[]);
        let page = StubPage;

        let result = BatchController::new(&mut store, &adapter, &page, options(SheetSelection::All))
            .run()
            .await;

        assert!(matches!(result, Err(StoreError::Locked)));
        assert_eq!(store.replace_calls, 3);
    }
}
