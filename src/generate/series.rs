//! Series enumeration
//!
//! A series is the set of sidecars sharing every entity except subject and
//! run (and session when sessions are uniform). Each series gets one schema,
//! committed to the side folder as soon as it is built.

use crate::config::ConfigCache;
use crate::dataset::{exact_query, Dataset, EntityFilter, EntityQuery, EntitySet};
use crate::observability::{log_event, Event};
use crate::schema::{to_wire_schema, SchemaResult, SchemaStore, SeriesExpectation, REFERENCE_SUBJECT};

use super::grouping::build_series_schema;

/// Entities that may be omitted by some files of otherwise equal series
pub const ALT_ENTITIES: &[&str] = &["reconstruction", "acquisition"];

/// Extension of sidecar files
pub const SIDECAR_EXTENSION: &str = ".json";

/// Generation switches.
///
/// The default keeps sessions apart; the command line factors them out
/// unless `--varying-sessions` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Never group by unique instrument tags
    pub uniform_instruments: bool,
    /// Factor sessions out of series
    pub uniform_sessions: bool,
    /// Allow grouping by software version tags
    pub version_specific: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            uniform_instruments: true,
            uniform_sessions: false,
            version_specific: false,
        }
    }
}

/// Returns the entities not used to tell series apart
pub fn excluded_entities(uniform_sessions: bool) -> Vec<&'static str> {
    let mut excluded = vec!["subject", "run"];
    if uniform_sessions {
        excluded.push("session");
    }
    excluded
}

/// Lists the distinct series of a datatype, in first-seen order.
pub fn enumerate_series(
    dataset: &dyn Dataset,
    datatype: &str,
    uniform_sessions: bool,
) -> Vec<EntitySet> {
    let excluded = excluded_entities(uniform_sessions);

    let mut query = EntityQuery::new();
    query.insert("datatype".into(), EntityFilter::Is(datatype.to_string()));
    query.insert("extension".into(), EntityFilter::Is(SIDECAR_EXTENSION.to_string()));

    let mut series: Vec<EntitySet> = Vec::new();
    for file in dataset.query(&query) {
        let mut entities = dataset.entities_of(&file);
        entities.retain(|name, _| !excluded.contains(&name.as_str()));
        if !series.contains(&entities) {
            series.push(entities);
        }
    }
    series
}

/// Builds the query selecting the files of a series, with alternate
/// entities it lacks pinned as absent.
pub fn series_query(entities: &EntitySet) -> EntityQuery {
    let mut query = exact_query(entities);
    for alt in ALT_ENTITIES {
        query.entry(alt.to_string()).or_insert(EntityFilter::Absent);
    }
    query
}

/// Generates and stores a schema for every series of the dataset.
///
/// Returns whether every series succeeded. Series that exhaust their
/// grouping levels are logged and skipped; fatal errors abort the run,
/// leaving already written series in place.
pub fn initialize(
    dataset: &dyn Dataset,
    store: &SchemaStore,
    configs: &mut ConfigCache,
    options: &GenerationOptions,
) -> SchemaResult<bool> {
    log_event(
        Event::GenerationBegin,
        &[
            ("uniform_instruments", &options.uniform_instruments.to_string()),
            ("uniform_sessions", &options.uniform_sessions.to_string()),
            ("version_specific", &options.version_specific.to_string()),
        ],
    );

    let mut all_succeeded = true;
    let mut written = 0usize;
    let mut failed = 0usize;

    for datatype in dataset.datatypes() {
        let config = configs.for_datatype(&datatype)?.clone();
        log_event(
            Event::DatatypeBegin,
            &[("datatype", &datatype), ("modality", &config.modality)],
        );

        let grouping_tags = config
            .instrument
            .grouping_levels(options.uniform_instruments, options.version_specific);

        for entities in enumerate_series(dataset, &datatype, options.uniform_sessions) {
            let sidecars = dataset.query(&series_query(&entities));
            let series_path = dataset.path_for(&entities);
            log_event(
                Event::SeriesBegin,
                &[("series", &series_path), ("sidecars", &sidecars.len().to_string())],
            );

            let grouped =
                match build_series_schema(dataset, &sidecars, &grouping_tags, &config, &entities) {
                    Ok(grouped) => grouped,
                    Err(e) if !e.is_fatal() => {
                        log_event(
                            Event::SeriesFailed,
                            &[("series", &series_path), ("error", &e.to_string())],
                        );
                        all_succeeded = false;
                        failed += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

            let mut path_entities = entities.clone();
            path_entities.insert("subject".into(), REFERENCE_SUBJECT.to_string());
            let relpath = dataset.path_for(&path_entities);

            let expectation = SeriesExpectation::single(entities, grouped.instrument_tags);
            store.write(&relpath, &to_wire_schema(&grouped.schema), &expectation)?;
            log_event(
                Event::SchemaWritten,
                &[
                    ("path", &relpath),
                    ("instrument_tags", &expectation.instrument_tags.join(",")),
                ],
            );
            written += 1;
        }
    }

    log_event(
        Event::GenerationComplete,
        &[
            ("written", &written.to_string()),
            ("failed", &failed.to_string()),
            ("success", &all_succeeded.to_string()),
        ],
    );
    Ok(all_succeeded)
}
