//! Process classification logic

use crate::config::check_pattern;
use crate::{GatekeeperError, PolicyConfig};
use glob::{MatchOptions, Pattern};
use reclaim_domain::{ClassificationVerdict, DecisionRule, ProcessInfo};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Which way a matching rule decides
#[derive(Debug, Clone, Copy)]
enum Disposition {
    Preserve,
    Candidate,
}

/// One entry of the ordered decision list
struct Rule {
    rule: DecisionRule,
    disposition: Disposition,
    applies: fn(&Classifier, &ProcessInfo) -> bool,
}

impl Rule {
    fn verdict(&self) -> ClassificationVerdict {
        match self.disposition {
            Disposition::Preserve => ClassificationVerdict::Preserve(self.rule),
            Disposition::Candidate => ClassificationVerdict::Candidate(self.rule),
        }
    }
}

/// First match wins. Every Preserve signal sits above every Candidate rule.
const RULES: [Rule; 7] = [
    Rule {
        rule: DecisionRule::VisibleWindow,
        disposition: Disposition::Preserve,
        applies: has_visible_window,
    },
    Rule {
        rule: DecisionRule::RecentlyStarted,
        disposition: Disposition::Preserve,
        applies: is_recently_started,
    },
    Rule {
        rule: DecisionRule::CriticalProcess,
        disposition: Disposition::Preserve,
        applies: is_critical,
    },
    Rule {
        rule: DecisionRule::ActiveCpu,
        disposition: Disposition::Preserve,
        applies: is_cpu_active,
    },
    Rule {
        rule: DecisionRule::LowMemoryNoWindow,
        disposition: Disposition::Candidate,
        applies: is_low_memory_windowless,
    },
    Rule {
        rule: DecisionRule::IdleLargeFootprint,
        disposition: Disposition::Candidate,
        applies: is_idle_large_footprint,
    },
    Rule {
        rule: DecisionRule::LongLivedIdle,
        disposition: Disposition::Candidate,
        applies: is_long_lived_idle,
    },
];

/// The fallthrough verdict when no rule matches
const DEFAULT_VERDICT: ClassificationVerdict =
    ClassificationVerdict::Preserve(DecisionRule::InsufficientEvidence);

/// Rules in evaluation order, ending with the fallthrough
///
/// ```
/// use reclaim_domain::DecisionRule;
///
/// let order: Vec<_> = reclaim_gatekeeper::rule_order().collect();
/// assert_eq!(order.first(), Some(&DecisionRule::VisibleWindow));
/// assert_eq!(order.last(), Some(&DecisionRule::InsufficientEvidence));
/// ```
pub fn rule_order() -> impl Iterator<Item = DecisionRule> {
    RULES
        .iter()
        .map(|r| r.rule)
        .chain(std::iter::once(DEFAULT_VERDICT.rule()))
}

/// Pure decision function over snapshot rows
///
/// Patterns are compiled once here; classification itself cannot fail and
/// reads no clock, so identical input always produces the identical verdict.
pub struct Classifier {
    config: PolicyConfig,
    name_patterns: Vec<Pattern>,
    title_patterns: Vec<Pattern>,
}

impl Classifier {
    /// Validate `config` and build a classifier
    pub fn new(config: PolicyConfig) -> Result<Self, GatekeeperError> {
        config.validate()?;

        let name_patterns = compile(&config.critical_name_patterns)?;
        let title_patterns = compile(&config.critical_title_patterns)?;

        Ok(Self {
            config,
            name_patterns,
            title_patterns,
        })
    }

    /// The policy this classifier was built from
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Classify one process
    pub fn classify(&self, process: &ProcessInfo) -> ClassificationVerdict {
        RULES
            .iter()
            .find(|rule| (rule.applies)(self, process))
            .map(Rule::verdict)
            .unwrap_or(DEFAULT_VERDICT)
    }

    /// Whether CPU use counts as effectively zero
    fn is_idle(&self, process: &ProcessInfo) -> bool {
        process.cpu_seconds <= self.config.idle_cpu_epsilon
    }

    /// Name and title patterns both match the process name, the whole
    /// command line, or the file name of any command-line argument (so
    /// `python3 /opt/agent.py` is caught by `agent.py`). Title patterns also
    /// match the window title when the table supplies one.
    fn matches_critical_pattern(&self, process: &ProcessInfo) -> bool {
        self.name_patterns
            .iter()
            .chain(&self.title_patterns)
            .any(|pattern| matches_identity(pattern, process))
            || self.matches_title_pattern(process)
    }

    fn matches_title_pattern(&self, process: &ProcessInfo) -> bool {
        let Some(title) = process.window_title.as_deref() else {
            return false;
        };
        self.title_patterns
            .iter()
            .any(|pattern| pattern.matches_with(title, MATCH_OPTIONS))
    }
}

fn matches_identity(pattern: &Pattern, process: &ProcessInfo) -> bool {
    pattern.matches_with(&process.name, MATCH_OPTIONS)
        || pattern.matches_with(&process.command_line, MATCH_OPTIONS)
        || process.command_line.split_whitespace().any(|arg| {
            Path::new(arg)
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.matches_with(n, MATCH_OPTIONS))
        })
}

fn compile<'a>(patterns: impl IntoIterator<Item = &'a String>) -> Result<Vec<Pattern>, GatekeeperError> {
    patterns.into_iter().map(|p| check_pattern(p)).collect()
}

fn has_visible_window(_: &Classifier, p: &ProcessInfo) -> bool {
    p.has_window
}

fn is_recently_started(c: &Classifier, p: &ProcessInfo) -> bool {
    p.age_seconds() < c.config.min_age_seconds
}

fn is_critical(c: &Classifier, p: &ProcessInfo) -> bool {
    c.matches_critical_pattern(p)
}

#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn is_cpu_active(c: &Classifier, p: &ProcessInfo) -> bool {
    // Written as a negation so a NaN sample reads as active.
    !(p.cpu_seconds <= c.config.cpu_activity_threshold)
}

fn is_low_memory_windowless(c: &Classifier, p: &ProcessInfo) -> bool {
    p.working_set_bytes < c.config.idle_memory_floor_bytes && !p.has_window
}

fn is_idle_large_footprint(c: &Classifier, p: &ProcessInfo) -> bool {
    p.working_set_bytes >= c.config.idle_memory_floor_bytes && c.is_idle(p)
}

fn is_long_lived_idle(c: &Classifier, p: &ProcessInfo) -> bool {
    p.age_seconds() >= c.config.idle_age_seconds() && c.is_idle(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const MB: u64 = 1024 * 1024;

    fn test_policy() -> PolicyConfig {
        PolicyConfig {
            min_age_seconds: 30,
            cpu_activity_threshold: 10.0,
            idle_memory_floor_bytes: 10 * MB,
            idle_memory_age_minutes: 60,
            idle_cpu_epsilon: 0.01,
            critical_name_patterns: ["sshd", "backup-agent*", "critical_job.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            critical_title_patterns: ["*Installer*"].iter().map(|s| s.to_string()).collect(),
        }
    }

    fn process(age: u64, cpu_seconds: f64, working_set_bytes: u64) -> ProcessInfo {
        ProcessInfo {
            pid: 100,
            name: "helper".to_string(),
            start_time: 10_000,
            captured_at: 10_000 + age,
            cpu_seconds,
            working_set_bytes,
            has_window: false,
            window_title: None,
            command_line: "/usr/bin/helper --daemon".to_string(),
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(test_policy()).unwrap()
    }

    #[test]
    fn test_low_memory_candidate() {
        let verdict = classifier().classify(&process(120, 0.0, 5 * MB));
        assert_eq!(verdict, ClassificationVerdict::Candidate(DecisionRule::LowMemoryNoWindow));
        assert_eq!(verdict.reason(), "low memory, no window");
    }

    #[test]
    fn test_idle_large_footprint_candidate() {
        let verdict = classifier().classify(&process(120, 0.0, 80 * MB));
        assert_eq!(verdict, ClassificationVerdict::Candidate(DecisionRule::IdleLargeFootprint));
        assert_eq!(verdict.reason(), "idle despite large footprint");
    }

    #[test]
    fn test_window_vetoes_everything() {
        let mut p = process(100_000, 0.0, 1);
        p.has_window = true;
        assert_eq!(
            classifier().classify(&p),
            ClassificationVerdict::Preserve(DecisionRule::VisibleWindow)
        );
    }

    #[test]
    fn test_recently_started_beats_idle_rules() {
        assert_eq!(
            classifier().classify(&process(29, 0.0, MB)),
            ClassificationVerdict::Preserve(DecisionRule::RecentlyStarted)
        );
        assert!(classifier().classify(&process(30, 0.0, MB)).is_candidate());
    }

    #[test]
    fn test_critical_name_and_command_line() {
        let mut p = process(120, 0.0, MB);
        p.name = "SSHD".to_string();
        assert_eq!(
            classifier().classify(&p),
            ClassificationVerdict::Preserve(DecisionRule::CriticalProcess)
        );

        let mut p = process(120, 0.0, MB);
        p.name = "python3".to_string();
        p.command_line = "/usr/bin/python3 /opt/jobs/critical_job.py --loop".to_string();
        assert_eq!(
            classifier().classify(&p),
            ClassificationVerdict::Preserve(DecisionRule::CriticalProcess)
        );

        let mut p = process(120, 0.0, MB);
        p.name = "backup-agent-v2".to_string();
        assert_eq!(classifier().classify(&p).rule(), DecisionRule::CriticalProcess);
    }

    #[test]
    fn test_critical_title() {
        let mut p = process(120, 0.0, MB);
        p.window_title = Some("Product installer - step 2".to_string());
        assert_eq!(classifier().classify(&p).rule(), DecisionRule::CriticalProcess);
    }

    #[test]
    fn test_title_pattern_matches_command_line() {
        let mut policy = test_policy();
        policy.critical_name_patterns.clear();
        let classifier = Classifier::new(policy).unwrap();

        let mut p = process(100_000, 0.0, 1024);
        p.name = "run".to_string();
        p.command_line = "/opt/Vendor Installer/run --quiet".to_string();
        assert_eq!(
            classifier.classify(&p),
            ClassificationVerdict::Preserve(DecisionRule::CriticalProcess)
        );

        let mut p = process(100_000, 0.0, 1024);
        p.name = "SoftwareInstaller".to_string();
        assert_eq!(classifier.classify(&p).rule(), DecisionRule::CriticalProcess);

        // Unrelated process is still a candidate
        assert!(classifier.classify(&process(100_000, 0.0, 1024)).is_candidate());
    }

    #[test]
    fn test_active_cpu_preserved() {
        assert_eq!(
            classifier().classify(&process(120, 10.5, MB)),
            ClassificationVerdict::Preserve(DecisionRule::ActiveCpu)
        );
    }

    #[test]
    fn test_low_memory_does_not_require_idle() {
        // Below the activity threshold but above epsilon: still a candidate
        // when the footprint is small.
        assert_eq!(
            classifier().classify(&process(120, 5.0, MB)).rule(),
            DecisionRule::LowMemoryNoWindow
        );
    }

    #[test]
    fn test_insufficient_evidence_default() {
        // Large footprint, some CPU below the activity threshold
        assert_eq!(
            classifier().classify(&process(7_200, 5.0, 80 * MB)),
            ClassificationVerdict::Preserve(DecisionRule::InsufficientEvidence)
        );
    }

    #[test]
    fn test_nan_cpu_counts_as_active() {
        assert_eq!(
            classifier().classify(&process(7_200, f64::NAN, MB)).rule(),
            DecisionRule::ActiveCpu
        );
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let mut policy = test_policy();
        policy.critical_name_patterns = BTreeSet::from(["[".to_string()]);
        assert!(Classifier::new(policy).is_err());
    }

    #[test]
    fn test_rule_order_is_complete() {
        let order: Vec<_> = rule_order().collect();
        assert_eq!(order.len(), 8);
        assert_eq!(order[2], DecisionRule::CriticalProcess);
        assert_eq!(order[6], DecisionRule::LongLivedIdle);
    }

    #[test]
    fn test_default_policy_builds() {
        let c = Classifier::new(PolicyConfig::default()).unwrap();
        assert_eq!(c.config().min_age_seconds, 300);
    }
}
