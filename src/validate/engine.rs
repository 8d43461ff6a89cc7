//! Validation engine
//!
//! Every stored schema is expanded over the dataset's subjects and
//! sessions. Each expansion claims the sidecars it matches; sidecars in
//! scope that no expansion claimed are unexpected. A sidecar is claimed at
//! most once.

use std::collections::HashSet;

use crate::dataset::{Dataset, EntityFilter, EntityQuery, EntitySet, FileRef};
use crate::generate::{series_query, SIDECAR_EXTENSION};
use crate::observability::{log_event, Event, Logger};
use crate::schema::{
    prepare_metadata, SchemaResult, SchemaStore, SeriesValidator, StoredSchema,
};

use super::findings::{Finding, ValidationReport};

/// Subjects and sessions to validate; `None` means all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFilter {
    pub subjects: Option<Vec<String>>,
    pub sessions: Option<Vec<String>>,
}

/// Running claim bookkeeping over the sidecars in scope
struct Claims {
    scope: Vec<FileRef>,
    claimed: HashSet<FileRef>,
}

impl Claims {
    fn new(scope: Vec<FileRef>) -> Self {
        Self {
            scope,
            claimed: HashSet::new(),
        }
    }

    /// Records a claim; false if the file was already claimed
    fn claim(&mut self, file: &FileRef) -> bool {
        self.claimed.insert(file.clone())
    }

    /// Files in scope never claimed, in dataset order
    fn unclaimed(&self) -> impl Iterator<Item = &FileRef> + '_ {
        self.scope.iter().filter(|f| !self.claimed.contains(*f))
    }
}

/// Validates the dataset against every stored schema.
///
/// Findings come in schema path order, then subject, session and file
/// order, followed by unexpected files.
///
/// # Errors
///
/// Fatal store and dataset errors only; findings are never errors.
pub fn validate(
    dataset: &dyn Dataset,
    store: &SchemaStore,
    filter: &ValidationFilter,
) -> SchemaResult<ValidationReport> {
    let schemas = store.load_all()?;
    log_event(Event::SchemasLoaded, &[("count", &schemas.len().to_string())]);

    let subjects = dataset.subjects(filter.subjects.as_deref());

    let mut scope_query = EntityQuery::new();
    scope_query.insert("extension".into(), EntityFilter::Is(SIDECAR_EXTENSION.to_string()));
    scope_query.insert("subject".into(), EntityFilter::AnyOf(subjects.clone()));
    if let Some(sessions) = &filter.sessions {
        scope_query.insert("session".into(), EntityFilter::AnyOf(sessions.clone()));
    }
    let mut claims = Claims::new(dataset.query(&scope_query));

    log_event(
        Event::ValidationBegin,
        &[
            ("subjects", &subjects.join(",")),
            ("sidecars", &claims.scope.len().to_string()),
        ],
    );

    let mut report = ValidationReport::new();

    for stored in &schemas {
        if let (Some(pinned), Some(sessions)) = (stored.expectation.session(), &filter.sessions) {
            if !sessions.iter().any(|s| s == pinned) {
                continue;
            }
        }
        log_event(Event::ExpectationBegin, &[("schema", &stored.relpath)]);
        let validator = SeriesValidator::compile(&stored.relpath, &stored.document)?;

        for subject in &subjects {
            for session in candidate_sessions(dataset, stored, subject, filter) {
                check_expectation(
                    dataset,
                    stored,
                    &validator,
                    subject,
                    session.as_deref(),
                    &mut claims,
                    &mut report,
                )?;
            }
        }
    }

    for file in claims.unclaimed() {
        report.push(Finding::UnexpectedFile { file: file.clone() });
    }

    log_event(
        Event::ValidationComplete,
        &[
            ("findings", &report.findings.len().to_string()),
            ("claimed", &report.claimed.len().to_string()),
        ],
    );
    Ok(report)
}

/// Sessions to check for one subject; `None` stands for "no session"
fn candidate_sessions(
    dataset: &dyn Dataset,
    stored: &StoredSchema,
    subject: &str,
    filter: &ValidationFilter,
) -> Vec<Option<String>> {
    if let Some(pinned) = stored.expectation.session() {
        return vec![Some(pinned.to_string())];
    }
    let sessions = dataset.sessions(subject, filter.sessions.as_deref());
    if sessions.is_empty() {
        vec![None]
    } else {
        sessions.into_iter().map(Some).collect()
    }
}

fn check_expectation(
    dataset: &dyn Dataset,
    stored: &StoredSchema,
    validator: &SeriesValidator,
    subject: &str,
    session: Option<&str>,
    claims: &mut Claims,
    report: &mut ValidationReport,
) -> SchemaResult<()> {
    let expectation = &stored.expectation;

    let mut expected: EntitySet = expectation.entities.clone();
    expected.insert("subject".into(), subject.to_string());
    let query = match session {
        Some(session) => {
            expected.insert("session".into(), session.to_string());
            series_query(&expected)
        }
        None => {
            expected.remove("session");
            let mut query = series_query(&expected);
            query.insert("session".into(), EntityFilter::Absent);
            query
        }
    };

    let expected_path = dataset.path_for(&expected);
    log_event(
        Event::SubjectSessionBegin,
        &[
            ("subject", subject),
            ("session", session.unwrap_or("")),
            ("expected", &expected_path),
        ],
    );

    let files = dataset.query(&query);
    if files.is_empty() {
        if !expectation.optional {
            report.push(Finding::MissingFile {
                expected: expected_path,
                message: "no match".to_string(),
            });
        }
        return Ok(());
    }

    let count = files.len();
    if count < expectation.min_runs as usize {
        report.push(Finding::MissingFile {
            expected: expected_path.clone(),
            message: format!(
                "expected at least {} runs, found {}",
                expectation.min_runs, count
            ),
        });
    } else if count > expectation.max_runs as usize {
        report.push(Finding::CardinalityExceeded {
            expected: expected_path.clone(),
            found: count,
            max_runs: expectation.max_runs,
        });
    }

    for file in files {
        if !claims.claim(&file) {
            log_event(
                Event::DoubleClaim,
                &[("file", file.relpath()), ("schema", &stored.relpath)],
            );
            continue;
        }
        report.claimed.push(file.clone());

        let metadata = dataset.read_json(&file)?;
        let prepared = prepare_metadata(&metadata, &expectation.instrument_tags);
        log_event(
            Event::SidecarValidated,
            &[("file", file.relpath()), ("schema", validator.name())],
        );

        for violation in validator.violations(&prepared) {
            report.push(Finding::SchemaViolation {
                file: file.clone(),
                location: violation.field_path(),
                message: violation.message.clone(),
                value: violation.value,
            });
        }
    }
    Ok(())
}

/// Validates the dataset and logs one line per finding.
///
/// Returns whether the dataset complies with its stored schemas.
pub fn process_validation(
    dataset: &dyn Dataset,
    store: &SchemaStore,
    filter: &ValidationFilter,
) -> SchemaResult<bool> {
    let report = validate(dataset, store, filter)?;

    for finding in &report.findings {
        log_event(
            Event::Finding,
            &[
                ("kind", finding.kind()),
                ("path", finding.path()),
                ("detail", &finding.to_string()),
            ],
        );
    }

    let compliant = report.is_compliant();
    if compliant {
        Logger::info(
            "VERDICT",
            &[("result", "The dataset was successfully checked as compliant to the protocol.")],
        );
    } else {
        Logger::error(
            "VERDICT",
            &[
                ("result", "The dataset failed to comply to the protocol."),
                ("findings", &report.findings.len().to_string()),
            ],
        );
    }
    Ok(compliant)
}
