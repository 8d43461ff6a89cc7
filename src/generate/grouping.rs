//! Instrument grouping and union building
//!
//! Partitions the sidecars of one series by increasingly fine instrument
//! tags. At each level every partition yields a schema synthesized from its
//! first sidecar, and the other members must validate against it. The first
//! level where all partitions agree wins; several partitions become a union
//! discriminated by `__instrument__`.

use serde_json::Value;

use crate::config::ModalityConfig;
use crate::dataset::{Dataset, EntitySet, FileRef};
use crate::observability::{log_event, Event};
use crate::schema::{
    prepare_metadata, synthesize, to_wire_schema, SchemaError, SchemaErrorCode, SchemaNode,
    SchemaResult, WireValidator, DISCRIMINATOR_FIELD,
};

/// Partition key value for sidecars lacking a grouping tag
pub const UNKNOWN_TAG_VALUE: &str = "unknown";

/// Result of grouping one series
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSchema {
    /// Record, or union over the per-instrument records
    pub schema: SchemaNode,
    /// Grouping tags of the level that succeeded
    pub instrument_tags: Vec<String>,
}

/// One partition: its tag values and members in dataset order
struct Partition<'a> {
    values: Vec<String>,
    members: Vec<&'a (FileRef, Value)>,
}

/// Why a grouping level was abandoned
struct Rejection {
    file: String,
    field: String,
    message: String,
}

/// Builds the schema of one series from its sidecars.
///
/// `grouping_tags` are tried as prefixes, shortest first.
///
/// # Errors
///
/// - `SG_GROUPING_EXHAUSTED` (recoverable) if no level works
/// - fatal configuration and dataset errors are propagated as is
pub fn build_series_schema(
    dataset: &dyn Dataset,
    sidecars: &[FileRef],
    grouping_tags: &[String],
    config: &ModalityConfig,
    series_entities: &EntitySet,
) -> SchemaResult<GroupedSchema> {
    let schema_name = dataset.path_for(series_entities);

    let mut documents = Vec::with_capacity(sidecars.len());
    for file in sidecars {
        documents.push((file.clone(), dataset.read_json(file)?));
    }

    if !documents.is_empty() {
        for k in 1..=grouping_tags.len() {
            let tags = &grouping_tags[..k];
            match try_level(&documents, tags, config, &schema_name)? {
                Ok(schema) => {
                    log_event(
                        Event::GroupingAccepted,
                        &[("series", &schema_name), ("tags", &tags.join(","))],
                    );
                    return Ok(GroupedSchema {
                        schema,
                        instrument_tags: tags.to_vec(),
                    });
                }
                Err(rejection) => {
                    log_event(
                        Event::GroupingRejected,
                        &[
                            ("series", &schema_name),
                            ("tags", &tags.join(",")),
                            ("file", &rejection.file),
                            ("field", &rejection.field),
                            ("message", &rejection.message),
                        ],
                    );
                }
            }
        }
    }

    Err(SchemaError::grouping_exhausted(schema_name, grouping_tags))
}

/// Splits documents by their values for `tags`, in first-seen order
fn partition<'a>(documents: &'a [(FileRef, Value)], tags: &[String]) -> Vec<Partition<'a>> {
    let mut partitions: Vec<Partition<'a>> = Vec::new();
    for doc in documents {
        let values: Vec<String> = tags.iter().map(|tag| tag_value(&doc.1, tag)).collect();
        match partitions.iter_mut().find(|p| p.values == values) {
            Some(existing) => existing.members.push(doc),
            None => partitions.push(Partition {
                values,
                members: vec![doc],
            }),
        }
    }
    partitions
}

fn tag_value(metadata: &Value, tag: &str) -> String {
    match metadata.get(tag) {
        None | Some(Value::Null) => UNKNOWN_TAG_VALUE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Attempts one grouping level. The outer result carries fatal errors, the
/// inner one whether the level worked.
fn try_level(
    documents: &[(FileRef, Value)],
    tags: &[String],
    config: &ModalityConfig,
    schema_name: &str,
) -> SchemaResult<Result<SchemaNode, Rejection>> {
    let mut variants = Vec::new();

    for part in partition(documents, tags) {
        let name = format!(
            "{}{}",
            schema_name,
            part.values
                .iter()
                .map(|v| v.replace('.', "_"))
                .collect::<Vec<_>>()
                .join("-")
        );

        let (exemplar_file, exemplar) = part.members[0];
        let prepared = prepare_metadata(exemplar, tags);
        let schema = match synthesize(&prepared, &config.properties, &name, &config.modality) {
            Ok(schema) => schema,
            Err(e) if e.code() == SchemaErrorCode::ExemplarMismatch => {
                return Ok(Err(Rejection {
                    file: exemplar_file.to_string(),
                    field: e.field().unwrap_or_default().to_string(),
                    message: e.message().to_string(),
                }));
            }
            Err(e) => return Err(e),
        };
        log_event(
            Event::ExemplarSynthesized,
            &[("file", exemplar_file.relpath()), ("schema", &name)],
        );

        let validator = WireValidator::compile(&name, &to_wire_schema(&schema))?;
        for (file, metadata) in part.members.iter().skip(1).map(|m| (&m.0, &m.1)) {
            let violations = validator.violations(&prepare_metadata(metadata, tags));
            if let Some(first) = violations.into_iter().next() {
                return Ok(Err(Rejection {
                    file: file.to_string(),
                    field: first.field_path(),
                    message: first.message,
                }));
            }
        }

        variants.push((name, schema));
    }

    if variants.len() == 1 {
        let (_, schema) = variants.remove(0);
        return Ok(Ok(schema));
    }
    Ok(Ok(SchemaNode::Union {
        discriminator: DISCRIMINATOR_FIELD.to_string(),
        variants,
    }))
}
