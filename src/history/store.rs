//! History persistence.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bytecode::ClassName;
use crate::core::{Error, Result};
use crate::mutation::{MutationIdentifier, MutationResult, MutationStatusTestPair, OperatorId};

use super::output::{FileOutput, HistoryOutput, NullOutput};
use super::{ClassHistory, ClassIdentity, CoverageDatabase};

/// Version written into, and required from, history documents.
pub const HISTORY_VERSION: u32 = 1;

/// Incremental history of mutation runs.
///
/// `historic_*` accessors serve the snapshot read by
/// [`initialize`](Self::initialize); `record_*` calls build the snapshot for
/// this run, which [`close`](Self::close) persists.
pub trait HistoryStore {
    /// Load the previous run's snapshot. A missing document is an empty
    /// history; an unreadable one is [`Error::MalformedHistory`].
    fn initialize(&mut self) -> Result<()>;

    /// Record the classes under test, fingerprinting their coverage.
    /// Replaces any earlier entry for the same class.
    fn record_class_path(&mut self, classes: &[ClassIdentity], coverage: &dyn CoverageDatabase);

    /// Record the operators this run uses.
    fn record_operators(&mut self, operators: &[OperatorId]);

    /// Record one result, replacing any earlier result for its identifier.
    fn record_result(&mut self, result: &MutationResult);

    fn historic_class_path(&self) -> &HashMap<ClassName, ClassHistory>;

    fn historic_results(&self) -> &HashMap<MutationIdentifier, MutationStatusTestPair>;

    /// Operator ids of the previous run, sorted.
    fn historic_operators(&self) -> &[OperatorId];

    /// Persist this run's snapshot.
    fn close(&mut self) -> Result<()>;
}

/// One stored result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricResult {
    pub id: MutationIdentifier,
    #[serde(flatten)]
    pub status: MutationStatusTestPair,
}

/// The persisted form of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub operators: Vec<OperatorId>,
    #[serde(default)]
    pub classes: Vec<ClassHistory>,
    #[serde(default)]
    pub results: Vec<HistoricResult>,
}

impl HistoryDocument {
    /// Parse and version-check a document.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Self =
            serde_json::from_str(text).map_err(|e| Error::malformed_history(e.to_string()))?;
        if document.version != HISTORY_VERSION {
            return Err(Error::malformed_history(format!(
                "unsupported history version {} (expected {})",
                document.version, HISTORY_VERSION
            )));
        }
        Ok(document)
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    classes: HashMap<ClassName, ClassHistory>,
    results: HashMap<MutationIdentifier, MutationStatusTestPair>,
    operators: Vec<OperatorId>,
}

impl Snapshot {
    fn from_document(document: HistoryDocument) -> Self {
        let mut operators = document.operators;
        operators.sort();
        operators.dedup();
        Self {
            classes: document
                .classes
                .into_iter()
                .map(|class| (class.name().clone(), class))
                .collect(),
            results: document
                .results
                .into_iter()
                .map(|result| (result.id, result.status))
                .collect(),
            operators,
        }
    }
}

/// History store that reads and writes one pretty-printed JSON document.
pub struct JsonHistoryStore<O: HistoryOutput> {
    input: Option<Box<dyn Read + Send>>,
    output: O,
    historic: Snapshot,
    classes: HashMap<ClassName, ClassHistory>,
    results: HashMap<MutationIdentifier, MutationStatusTestPair>,
    operators: BTreeSet<OperatorId>,
    closed: bool,
}

impl<O: HistoryOutput> JsonHistoryStore<O> {
    /// Create a store reading the previous document from `input`, if any.
    pub fn new(input: Option<Box<dyn Read + Send>>, output: O) -> Self {
        Self {
            input,
            output,
            historic: Snapshot::default(),
            classes: HashMap::new(),
            results: HashMap::new(),
            operators: BTreeSet::new(),
            closed: false,
        }
    }

    /// Store reading from an in-memory document.
    pub fn from_text(text: impl Into<String>, output: O) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(std::io::Cursor::new(text.into().into_bytes()));
        Self::new(Some(reader), output)
    }

    /// The document this run would persist.
    pub fn document(&self) -> HistoryDocument {
        let mut classes: Vec<ClassHistory> = self.classes.values().cloned().collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));

        let mut results: Vec<HistoricResult> = self
            .results
            .iter()
            .map(|(id, status)| HistoricResult {
                id: id.clone(),
                status: status.clone(),
            })
            .collect();
        results.sort_by(|a, b| a.id.cmp(&b.id));

        HistoryDocument {
            version: HISTORY_VERSION,
            created_at: Utc::now(),
            operators: self.operators.iter().cloned().collect(),
            classes,
            results,
        }
    }
}

impl JsonHistoryStore<Box<dyn HistoryOutput>> {
    /// Store backed by files. A missing `input` file is a first run; a
    /// missing `output` path discards the new document.
    pub fn from_paths(input: Option<&Path>, output: Option<&Path>) -> Result<Self> {
        let reader = match input {
            Some(path) if path.exists() => Some(Box::new(File::open(path)?) as Box<dyn Read + Send>),
            Some(path) => {
                debug!("No history at {}; starting fresh", path.display());
                None
            }
            None => None,
        };
        let output: Box<dyn HistoryOutput> = match output {
            Some(path) => Box::new(FileOutput::new(path)),
            None => Box::new(NullOutput),
        };
        Ok(Self::new(reader, output))
    }
}

impl<O: HistoryOutput> HistoryStore for JsonHistoryStore<O> {
    fn initialize(&mut self) -> Result<()> {
        let Some(mut input) = self.input.take() else {
            return Ok(());
        };
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|e| Error::malformed_history(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(());
        }

        let document = HistoryDocument::parse(&text)?;
        self.historic = Snapshot::from_document(document);
        info!(
            "Loaded history: {} classes, {} results, {} operators",
            self.historic.classes.len(),
            self.historic.results.len(),
            self.historic.operators.len()
        );
        Ok(())
    }

    fn record_class_path(&mut self, classes: &[ClassIdentity], coverage: &dyn CoverageDatabase) {
        for id in classes {
            let history = ClassHistory::new(id.clone(), coverage.coverage_id(&id.name));
            self.classes.insert(id.name.clone(), history);
        }
    }

    fn record_operators(&mut self, operators: &[OperatorId]) {
        self.operators.extend(operators.iter().cloned());
    }

    fn record_result(&mut self, result: &MutationResult) {
        self.results
            .insert(result.id().clone(), result.status.clone());
    }

    fn historic_class_path(&self) -> &HashMap<ClassName, ClassHistory> {
        &self.historic.classes
    }

    fn historic_results(&self) -> &HashMap<MutationIdentifier, MutationStatusTestPair> {
        &self.historic.results
    }

    fn historic_operators(&self) -> &[OperatorId] {
        &self.historic.operators
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            debug!("History store already closed");
            return Ok(());
        }

        let document = self.document();
        let bytes = serde_json::to_vec_pretty(&document)?;
        self.output.write_document(&bytes)?;
        self.closed = true;
        info!(
            "Persisted history: {} classes, {} results",
            document.classes.len(),
            document.results.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Fingerprint, SharedBuffer};
    use crate::mutation::{DetectionStatus, MethodLocation, MutationDetails};
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Every class fingerprints as ten.
    struct FixedCoverage;

    impl CoverageDatabase for FixedCoverage {
        fn coverage_id(&self, _class: &ClassName) -> Fingerprint {
            Fingerprint(10)
        }
    }

    fn identity(name: &str) -> ClassIdentity {
        ClassIdentity::new(name, Fingerprint(1), Fingerprint(2))
    }

    fn result(class: &str, status: MutationStatusTestPair) -> MutationResult {
        let id = MutationIdentifier::new(
            MethodLocation::new(class, "f", "()I"),
            OperatorId::from_static("bytemut.math.v1"),
            0,
            0,
            "Replaced integer addition with subtraction",
        );
        MutationResult::new(MutationDetails::new(id, 1, Some(3)), status)
    }

    fn reload(buffer: &SharedBuffer) -> JsonHistoryStore<NullOutput> {
        let text = String::from_utf8(buffer.contents()).unwrap();
        let mut store = JsonHistoryStore::from_text(text, NullOutput);
        store.initialize().unwrap();
        store
    }

    #[test]
    fn test_records_and_retrieves_class_path() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.initialize().unwrap();
        store.record_class_path(&[identity("foo"), identity("bar")], &FixedCoverage);
        store.close().unwrap();

        let reloaded = reload(&buffer);
        let expected: HashMap<ClassName, ClassHistory> = ["foo", "bar"]
            .into_iter()
            .map(|name| {
                (
                    ClassName::new(name),
                    ClassHistory::new(identity(name), Fingerprint(10)),
                )
            })
            .collect();
        assert_eq!(reloaded.historic_class_path(), &expected);
    }

    #[test]
    fn test_records_and_retrieves_results() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.record_class_path(&[identity("foo")], &FixedCoverage);
        let killed = result("foo", MutationStatusTestPair::killed_by(1, "testName"));
        store.record_result(&killed);
        store.close().unwrap();

        let reloaded = reload(&buffer);
        let expected = HashMap::from([(killed.id().clone(), killed.status.clone())]);
        assert_eq!(reloaded.historic_results(), &expected);
    }

    #[test]
    fn test_later_result_overwrites() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.record_result(&result("foo", MutationStatusTestPair::new(2, DetectionStatus::Survived)));
        store.record_result(&result("foo", MutationStatusTestPair::killed_by(2, "t")));
        store.close().unwrap();

        let reloaded = reload(&buffer);
        assert_eq!(reloaded.historic_results().len(), 1);
        let status = reloaded.historic_results().values().next().unwrap();
        assert_eq!(status.status, DetectionStatus::Killed);
    }

    #[test]
    fn test_class_path_overwrites_not_merges() {
        let mut store = JsonHistoryStore::new(None, NullOutput);
        store.record_class_path(&[identity("foo")], &FixedCoverage);
        let changed = ClassIdentity::new("foo", Fingerprint(7), Fingerprint(8));
        store.record_class_path(&[changed.clone()], &FixedCoverage);
        let document = store.document();
        assert_eq!(document.classes, vec![ClassHistory::new(changed, Fingerprint(10))]);
    }

    #[test]
    fn test_operators_roundtrip_sorted() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.record_operators(&[
            OperatorId::from_static("bytemut.ror.1.v1"),
            OperatorId::from_static("bytemut.math.v1"),
        ]);
        store.record_operators(&[OperatorId::from_static("bytemut.math.v1")]);
        store.close().unwrap();

        let reloaded = reload(&buffer);
        let ids: Vec<&str> = reloaded
            .historic_operators()
            .iter()
            .map(OperatorId::as_str)
            .collect();
        assert_eq!(ids, vec!["bytemut.math.v1", "bytemut.ror.1.v1"]);
    }

    #[test]
    fn test_no_input_is_empty_history() {
        let mut store = JsonHistoryStore::new(None, NullOutput);
        store.initialize().unwrap();
        assert!(store.historic_class_path().is_empty());
        assert!(store.historic_results().is_empty());
        assert!(store.historic_operators().is_empty());
    }

    #[test]
    fn test_blank_input_is_empty_history() {
        let mut store = JsonHistoryStore::from_text("  \n", NullOutput);
        store.initialize().unwrap();
        assert!(store.historic_results().is_empty());
    }

    #[test]
    fn test_malformed_input_fails() {
        let mut store = JsonHistoryStore::from_text("{ not json", NullOutput);
        assert!(matches!(
            store.initialize(),
            Err(Error::MalformedHistory { .. })
        ));
        assert!(store.historic_class_path().is_empty());
    }

    #[test]
    fn test_unsupported_version_fails() {
        let text = r#"{"version": 99, "created_at": "2024-01-01T00:00:00Z"}"#;
        let mut store = JsonHistoryStore::from_text(text, NullOutput);
        let err = store.initialize().unwrap_err();
        assert!(err.to_string().contains("unsupported history version 99"));
    }

    #[test]
    fn test_document_is_pretty_and_versioned() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.close().unwrap();
        let text = String::from_utf8(buffer.contents()).unwrap();
        assert!(text.contains("\n  \"version\": 1"));
        assert!(text.contains("created_at"));
    }

    #[test]
    fn test_close_writes_once() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.close().unwrap();
        let first = buffer.contents();
        store.record_class_path(&[identity("late")], &FixedCoverage);
        store.close().unwrap();
        assert_eq!(buffer.contents(), first);
    }

    /// Fails the first write, then forwards to a buffer.
    struct FailsOnce {
        failed: bool,
        buffer: SharedBuffer,
    }

    impl HistoryOutput for FailsOnce {
        fn write_document(&mut self, bytes: &[u8]) -> Result<()> {
            if !self.failed {
                self.failed = true;
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.buffer.write_document(bytes)
        }
    }

    #[test]
    fn test_close_retries_after_failed_write() {
        let buffer = SharedBuffer::new();
        let output = FailsOnce {
            failed: false,
            buffer: buffer.clone(),
        };
        let mut store = JsonHistoryStore::new(None, output);
        store.record_class_path(&[identity("foo")], &FixedCoverage);
        store.record_result(&result("foo", MutationStatusTestPair::killed_by(1, "t")));

        assert!(store.close().is_err());
        assert!(buffer.is_empty());

        store.close().unwrap();
        let reloaded = reload(&buffer);
        assert_eq!(reloaded.historic_class_path().len(), 1);
        assert_eq!(reloaded.historic_results().len(), 1);
    }

    #[test]
    fn test_historic_snapshot_is_not_current_run() {
        let buffer = SharedBuffer::new();
        let mut first = JsonHistoryStore::new(None, buffer.clone());
        first.record_class_path(&[identity("foo")], &FixedCoverage);
        first.close().unwrap();

        let mut second = reload(&buffer);
        second.record_class_path(&[identity("bar")], &FixedCoverage);
        assert!(second.historic_class_path().contains_key(&ClassName::new("foo")));
        assert!(!second.historic_class_path().contains_key(&ClassName::new("bar")));
        assert_eq!(second.document().classes.len(), 1);
    }

    #[test]
    fn test_reader_input() {
        let buffer = SharedBuffer::new();
        let mut store = JsonHistoryStore::new(None, buffer.clone());
        store.record_class_path(&[identity("foo")], &FixedCoverage);
        store.close().unwrap();

        let reader: Box<dyn Read + Send> = Box::new(Cursor::new(buffer.contents()));
        let mut reloaded = JsonHistoryStore::new(Some(reader), NullOutput);
        reloaded.initialize().unwrap();
        assert_eq!(reloaded.historic_class_path().len(), 1);
    }

    #[test]
    fn test_file_roundtrip_and_missing_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut store = JsonHistoryStore::from_paths(Some(path.as_path()), Some(path.as_path())).unwrap();
        store.initialize().unwrap();
        store.record_class_path(&[identity("foo")], &FixedCoverage);
        store.close().unwrap();

        let mut reloaded = JsonHistoryStore::from_paths(Some(path.as_path()), None).unwrap();
        reloaded.initialize().unwrap();
        assert_eq!(reloaded.historic_class_path().len(), 1);
    }
}
