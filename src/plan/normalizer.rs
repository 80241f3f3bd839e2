//! Workflow-to-plan normalization
//!
//! Turns decoded pipeline sources into a single flat [`Plan`]:
//!
//! - steps with neither a command nor an action reference are dropped
//! - steps referencing a local no-op action (checkout, setup, cache) are dropped
//! - steps whose command contains a package-manager install are tagged `install`
//! - step environment is layered workflow < job < step
//! - jobs left without steps are dropped
//! - sources are merged in lexicographic order of their names

use super::source::{JobSource, StepSource, WorkflowSource};
use super::{Environment, Job, Plan, Step, StepOrigin};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Classification rules used while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerRules {
    /// Action references that add nothing when running locally.
    pub skip_actions: Vec<String>,
    /// Substrings that mark a command as a dependency install.
    pub install_hints: Vec<String>,
}

impl Default for NormalizerRules {
    fn default() -> Self {
        Self {
            skip_actions: [
                "actions/checkout",
                "actions/setup-python",
                "actions/setup-node",
                "actions/cache",
            ]
            .map(String::from)
            .to_vec(),
            install_hints: [
                "pip install",
                "pip3 install",
                "npm ci",
                "npm install",
                "pnpm install",
                "yarn install",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Builds plans from pipeline sources.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: NormalizerRules,
}

impl Normalizer {
    /// Creates a normalizer with custom rules
    #[must_use]
    pub fn new(rules: NormalizerRules) -> Self {
        Self { rules }
    }

    /// Returns the active rules
    #[must_use]
    pub fn rules(&self) -> &NormalizerRules {
        &self.rules
    }

    /// Normalizes decoded sources into one plan
    #[must_use]
    pub fn normalize(&self, sources: &[WorkflowSource]) -> Plan {
        let mut ordered: Vec<&WorkflowSource> = sources.iter().collect();
        ordered.sort_by(|a, b| a.source_name.cmp(&b.source_name));

        let jobs = ordered
            .into_iter()
            .flat_map(|source| {
                source
                    .jobs
                    .iter()
                    .filter_map(move |job| self.normalize_job(source, job))
            })
            .collect();

        Plan::new(jobs)
    }

    /// Decodes and normalizes raw YAML documents keyed by source name
    ///
    /// A document that cannot be decoded contributes nothing; the other
    /// sources are still normalized.
    #[must_use]
    pub fn normalize_documents<I>(&self, documents: I) -> Plan
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let sources: Vec<WorkflowSource> = documents
            .into_iter()
            .filter_map(|(name, doc)| match WorkflowSource::from_yaml_value(&name, &doc) {
                Ok(source) => Some(source),
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "Ignoring malformed pipeline source");
                    None
                }
            })
            .collect();

        self.normalize(&sources)
    }

    fn normalize_job(&self, source: &WorkflowSource, job: &JobSource) -> Option<Job> {
        let workflow = source.display_name();

        let steps: Vec<Step> = job
            .steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| self.normalize_step(source, job, index, step))
            .collect();

        if steps.is_empty() {
            tracing::debug!(workflow = %workflow, job = %job.id, "Dropping job without runnable steps");
            return None;
        }

        Some(Job {
            name: job.id.clone(),
            workflow: workflow.to_string(),
            steps,
        })
    }

    fn normalize_step(
        &self,
        source: &WorkflowSource,
        job: &JobSource,
        index: usize,
        step: &StepSource,
    ) -> Option<Step> {
        let command = step
            .run
            .as_deref()
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty());
        let action = step
            .uses
            .as_deref()
            .map(str::trim)
            .filter(|uses| !uses.is_empty());

        if command.is_none() && action.is_none() {
            return None;
        }
        if action.is_some_and(|uses| self.is_noop_action(uses)) {
            return None;
        }

        let mut environment: Environment = source.env.clone();
        environment.extend(job.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        environment.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        Some(Step {
            name: step
                .name
                .clone()
                .unwrap_or_else(|| format!("step-{index}")),
            command: command.map(str::to_string),
            install: command.is_some_and(|cmd| self.is_install(cmd)),
            environment,
            origin: StepOrigin {
                workflow: source.display_name().to_string(),
                job: job.id.clone(),
                index,
                action: action.map(str::to_string),
            },
        })
    }

    fn is_noop_action(&self, uses: &str) -> bool {
        self.rules
            .skip_actions
            .iter()
            .any(|noop| uses.contains(noop.as_str()))
    }

    fn is_install(&self, command: &str) -> bool {
        self.rules
            .install_hints
            .iter()
            .any(|hint| command.contains(hint.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn run_step(name: &str, run: &str) -> StepSource {
        StepSource {
            name: Some(name.to_string()),
            run: Some(run.to_string()),
            ..StepSource::default()
        }
    }

    fn uses_step(uses: &str) -> StepSource {
        StepSource {
            uses: Some(uses.to_string()),
            ..StepSource::default()
        }
    }

    fn source(name: &str, jobs: Vec<JobSource>) -> WorkflowSource {
        WorkflowSource {
            source_name: name.to_string(),
            jobs,
            ..WorkflowSource::default()
        }
    }

    fn job(id: &str, steps: Vec<StepSource>) -> JobSource {
        JobSource {
            id: id.to_string(),
            steps,
            ..JobSource::default()
        }
    }

    #[test]
    fn test_noop_actions_dropped() {
        let sources = vec![source(
            "ci.yml",
            vec![job(
                "qa",
                vec![
                    uses_step("actions/checkout@v4"),
                    uses_step("actions/setup-python@v5"),
                    run_step("Lint", "ruff check ."),
                ],
            )],
        )];

        let plan = Normalizer::default().normalize(&sources);
        assert_eq!(plan.total_steps(), 1);
        assert_eq!(plan.jobs[0].steps[0].name, "Lint");
        assert_eq!(plan.jobs[0].steps[0].origin.index, 2);
    }

    #[test]
    fn test_job_emptied_by_exclusion_is_dropped() {
        let sources = vec![source(
            "ci.yml",
            vec![
                job("setup", vec![uses_step("actions/checkout@v4"), uses_step("actions/cache@v3")]),
                job("qa", vec![run_step("Tests", "pytest -q")]),
            ],
        )];

        let plan = Normalizer::default().normalize(&sources);
        assert_eq!(plan.total_jobs(), 1);
        assert_eq!(plan.jobs[0].name, "qa");
    }

    #[test]
    fn test_step_without_command_or_action_dropped() {
        let sources = vec![source(
            "ci.yml",
            vec![job(
                "qa",
                vec![
                    StepSource {
                        name: Some("empty".to_string()),
                        run: Some("   ".to_string()),
                        ..StepSource::default()
                    },
                    run_step("real", "make"),
                ],
            )],
        )];

        let plan = Normalizer::default().normalize(&sources);
        assert_eq!(plan.total_steps(), 1);
        assert_eq!(plan.jobs[0].steps[0].name, "real");
    }

    #[test]
    fn test_custom_action_kept_without_command() {
        let sources = vec![source("ci.yml", vec![job("qa", vec![uses_step("acme/deploy@v1")])])];

        let plan = Normalizer::default().normalize(&sources);
        let step = &plan.jobs[0].steps[0];
        assert_eq!(step.command, None);
        assert_eq!(step.name, "step-0");
        assert_eq!(step.origin.action.as_deref(), Some("acme/deploy@v1"));
        assert!(!step.install);
    }

    #[test]
    fn test_install_classification() {
        let sources = vec![source(
            "ci.yml",
            vec![job(
                "qa",
                vec![
                    run_step("deps", "python -m pip install -r requirements.txt"),
                    run_step("node", "npm ci"),
                    run_step("test", "pytest"),
                ],
            )],
        )];

        let plan = Normalizer::default().normalize(&sources);
        let flags: Vec<bool> = plan.jobs[0].steps.iter().map(|s| s.install).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_environment_layering() {
        let mut wf = source(
            "ci.yml",
            vec![JobSource {
                id: "qa".to_string(),
                env: env(&[("MODE", "job"), ("JOB_ONLY", "1")]),
                steps: vec![StepSource {
                    name: Some("t".to_string()),
                    run: Some("pytest".to_string()),
                    uses: None,
                    env: env(&[("MODE", "step")]),
                }],
            }],
        );
        wf.env = env(&[("MODE", "workflow"), ("GLOBAL", "yes")]);

        let plan = Normalizer::default().normalize(&[wf]);
        assert_eq!(
            plan.jobs[0].steps[0].environment,
            env(&[("GLOBAL", "yes"), ("JOB_ONLY", "1"), ("MODE", "step")])
        );
    }

    #[test]
    fn test_sources_merged_in_name_order() {
        let sources = vec![
            source("release.yml", vec![job("publish", vec![run_step("p", "make release")])]),
            source("ci.yml", vec![job("qa", vec![run_step("t", "pytest")])]),
        ];

        let plan = Normalizer::default().normalize(&sources);
        let names: Vec<_> = plan.jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["qa", "publish"]);
        assert_eq!(plan.jobs[0].workflow, "ci.yml");
    }

    #[test]
    fn test_malformed_document_contributes_nothing() {
        let good: Value =
            serde_yaml::from_str("name: CI\njobs:\n  qa:\n    steps:\n      - run: pytest\n")
                .unwrap();
        let bad: Value = serde_yaml::from_str("jobs: 42\n").unwrap();

        let plan = Normalizer::default().normalize_documents(vec![
            ("a.yml".to_string(), bad),
            ("b.yml".to_string(), good),
        ]);

        assert_eq!(plan.total_jobs(), 1);
        assert_eq!(plan.jobs[0].workflow, "CI");
    }

    #[test]
    fn test_custom_rules() {
        let rules = NormalizerRules {
            skip_actions: vec!["acme/noop".to_string()],
            install_hints: vec!["cargo fetch".to_string()],
        };
        let sources = vec![source(
            "ci.yml",
            vec![job(
                "qa",
                vec![
                    uses_step("acme/noop@v1"),
                    uses_step("actions/checkout@v4"),
                    run_step("fetch", "cargo fetch"),
                ],
            )],
        )];

        let plan = Normalizer::new(rules).normalize(&sources);
        assert_eq!(plan.total_steps(), 2);
        assert_eq!(plan.jobs[0].steps[0].origin.action.as_deref(), Some("actions/checkout@v4"));
        assert!(plan.jobs[0].steps[1].install);
    }

    fn arb_step() -> impl Strategy<Value = StepSource> {
        (
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of(prop_oneof![
                Just("pytest -q".to_string()),
                Just("pip install -e .".to_string()),
                Just(String::new()),
                "[a-z ]{1,12}",
            ]),
            proptest::option::of(prop_oneof![
                Just("actions/checkout@v4".to_string()),
                Just("acme/deploy@v1".to_string()),
            ]),
        )
            .prop_map(|(name, run, uses)| StepSource {
                name,
                run,
                uses,
                env: Environment::new(),
            })
    }

    fn arb_sources() -> impl Strategy<Value = Vec<WorkflowSource>> {
        proptest::collection::vec(
            (
                "[a-z]{1,6}\\.yml",
                proptest::collection::vec(
                    ("[a-z]{1,6}", proptest::collection::vec(arb_step(), 0..4)),
                    0..3,
                ),
            ),
            0..4,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(name, jobs)| WorkflowSource {
                    source_name: name,
                    workflow_name: None,
                    env: Environment::new(),
                    jobs: jobs
                        .into_iter()
                        .map(|(id, steps)| JobSource {
                            id,
                            env: Environment::new(),
                            steps,
                        })
                        .collect(),
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(sources in arb_sources()) {
            let normalizer = Normalizer::default();
            let first = normalizer.normalize(&sources);
            let second = normalizer.normalize(&sources);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn normalized_jobs_are_never_empty(sources in arb_sources()) {
            let plan = Normalizer::default().normalize(&sources);
            prop_assert!(plan.jobs.iter().all(|job| !job.steps.is_empty()));
        }
    }
}
