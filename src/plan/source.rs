//! Decoded pipeline source definitions
//!
//! These types carry the minimal shape of a GitHub Actions workflow that
//! the [`Normalizer`](super::Normalizer) needs: jobs in declaration order,
//! steps with an optional `run` command or `uses` reference, and `env`
//! maps at workflow, job and step level.

use super::{Environment, PlanError};
use serde_yaml::{Mapping, Value};

/// One pipeline source (usually one workflow file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSource {
    /// Discovery name, used for cross-source ordering (e.g. `ci.yml`).
    pub source_name: String,
    /// Declared `name:` of the workflow.
    pub workflow_name: Option<String>,
    /// Workflow-level environment.
    pub env: Environment,
    /// Jobs in declaration order.
    pub jobs: Vec<JobSource>,
}

/// A job as declared in a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSource {
    /// Job id (mapping key).
    pub id: String,
    /// Job-level environment.
    pub env: Environment,
    /// Steps in declaration order.
    pub steps: Vec<StepSource>,
}

/// A step as declared in a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSource {
    /// Optional display name.
    pub name: Option<String>,
    /// Shell command (`run:`).
    pub run: Option<String>,
    /// External action reference (`uses:`).
    pub uses: Option<String>,
    /// Step-level environment.
    pub env: Environment,
}

impl WorkflowSource {
    /// Display name of the workflow, falling back to the source name
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.workflow_name.as_deref().unwrap_or(&self.source_name)
    }

    /// Parses YAML text and decodes it
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Yaml`] for unparsable text and
    /// [`PlanError::Malformed`] when the document has the wrong shape.
    pub fn from_yaml_str(source_name: &str, text: &str) -> Result<Self, PlanError> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| PlanError::Yaml {
            path: source_name.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_value(source_name, &value)
    }

    /// Decodes an already-parsed YAML document
    ///
    /// An empty document decodes to a workflow without jobs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Malformed`] when the document, a job or a step
    /// is not a mapping, or when `jobs`/`steps`/`env` have the wrong type.
    pub fn from_yaml_value(source_name: &str, value: &Value) -> Result<Self, PlanError> {
        let malformed = |reason: String| PlanError::Malformed {
            source_name: source_name.to_string(),
            reason,
        };

        let root = match value {
            Value::Null => return Ok(Self::named(source_name)),
            Value::Mapping(map) => map,
            other => {
                return Err(malformed(format!(
                    "expected a mapping at top level, found {}",
                    kind_of(other)
                )));
            }
        };

        let env = decode_env(root.get("env")).map_err(|r| malformed(format!("env: {r}")))?;

        let jobs = match root.get("jobs") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(jobs)) => jobs
                .iter()
                .map(|(key, body)| decode_job(key, body))
                .collect::<Result<Vec<_>, _>>()
                .map_err(malformed)?,
            Some(other) => {
                return Err(malformed(format!(
                    "jobs must be a mapping, found {}",
                    kind_of(other)
                )));
            }
        };

        Ok(Self {
            source_name: source_name.to_string(),
            workflow_name: root.get("name").and_then(scalar_to_string),
            env,
            jobs,
        })
    }

    fn named(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            ..Self::default()
        }
    }
}

fn decode_job(key: &Value, body: &Value) -> Result<JobSource, String> {
    let id = scalar_to_string(key).ok_or_else(|| "job id must be a scalar".to_string())?;

    let body = match body {
        Value::Null => {
            return Ok(JobSource {
                id,
                ..JobSource::default()
            });
        }
        Value::Mapping(map) => map,
        other => return Err(format!("job '{id}' must be a mapping, found {}", kind_of(other))),
    };

    let env = decode_env(body.get("env")).map_err(|r| format!("job '{id}' env: {r}"))?;

    let steps = match body.get("steps") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(seq)) => seq
            .iter()
            .enumerate()
            .map(|(idx, step)| decode_step(&id, idx, step))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(format!(
                "job '{id}' steps must be a list, found {}",
                kind_of(other)
            ));
        }
    };

    Ok(JobSource { id, env, steps })
}

fn decode_step(job_id: &str, idx: usize, value: &Value) -> Result<StepSource, String> {
    let Value::Mapping(map) = value else {
        return Err(format!(
            "job '{job_id}' step {idx} must be a mapping, found {}",
            kind_of(value)
        ));
    };

    Ok(StepSource {
        name: field(map, "name"),
        run: field(map, "run"),
        uses: field(map, "uses"),
        env: decode_env(map.get("env"))
            .map_err(|r| format!("job '{job_id}' step {idx} env: {r}"))?,
    })
}

fn field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_to_string)
}

fn decode_env(value: Option<&Value>) -> Result<Environment, String> {
    match value {
        None | Some(Value::Null) => Ok(Environment::new()),
        Some(Value::Mapping(map)) => Ok(map
            .iter()
            .filter_map(|(k, v)| {
                let key = scalar_to_string(k)?;
                // `FOO: ~` is an explicit empty value
                let value = if v.is_null() {
                    String::new()
                } else {
                    scalar_to_string(v)?
                };
                Some((key, value))
            })
            .collect()),
        Some(other) => Err(format!("expected a mapping, found {}", kind_of(other))),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
