//! Calculator project fixture, scripted agents and a counting snapshot store

use anyhow::Result;
use relearn::config::{AgentConfig, TestConfig};
use relearn::git::{CommitOutcome, GitSnapshots, SnapshotStore};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

use super::git::create_temp_git_repo;

pub const INITIAL_CALCULATOR: &str = "def safe_divide(a, b):\n    return a / b\n";

pub const TEST_CALCULATOR: &str = "from calculator import safe_divide\n\n\
def test_safe_divide_by_zero():\n    assert safe_divide(10, 0) is None\n";

/// Stand-in for the test suite: passes once `safe_divide` returns None on a
/// zero divisor, otherwise prints a pytest-style failure.
pub const CALCULATOR_TEST_COMMAND: &str = "if grep -q 'return None' calculator.py; then \
echo '1 passed'; else \
echo 'FAILED tests/test_calculator.py::test_safe_divide_by_zero'; \
echo 'E   AssertionError: assert 0 is None'; \
echo '1 failed'; exit 1; fi";

pub fn calculator_repo() -> TempDir {
    create_temp_git_repo(&[
        ("calculator.py", INITIAL_CALCULATOR),
        ("test_calculator.py", TEST_CALCULATOR),
    ])
    .unwrap()
}

/// A shell script agent plus the scratch directory holding its call counter.
pub struct ScriptedAgent {
    pub path: PathBuf,
    state: TempDir,
}

impl ScriptedAgent {
    /// `body` runs after the counter is bumped; `$n` holds the 1-based call number.
    pub fn new(body: &str) -> Self {
        let state = TempDir::new().unwrap();
        let counter = state.path().join("count");
        let script = format!(
            "#!/bin/sh\n\
             n=$(cat '{counter}' 2>/dev/null || echo 0)\n\
             n=$((n + 1))\n\
             echo \"$n\" > '{counter}'\n\
             {body}\n",
            counter = counter.display(),
        );
        let path = state.path().join("agent.sh");
        write_executable(&path, &script).unwrap();
        Self { path, state }
    }

    /// Writes `return 0` on the first call and `return None` afterwards.
    pub fn fixes_on_second_try() -> Self {
        Self::new(
            "if [ \"$n\" -eq 1 ]; then ret=0; else ret=None; fi\n\
             printf 'def safe_divide(a, b):\\n    if b == 0:\\n        return %s\\n    return a / b\\n' \"$ret\" > calculator.py\n\
             echo '{\"result\":\"edited calculator.py\"}'",
        )
    }

    /// Always writes the buggy `return 0` version.
    pub fn always_wrong() -> Self {
        Self::new(
            "printf 'def safe_divide(a, b):\\n    if b == 0:\\n        return 0\\n    return a / b\\n' > calculator.py\n\
             echo '{\"result\":\"edited calculator.py\"}'",
        )
    }

    /// Touches nothing.
    pub fn no_op() -> Self {
        Self::new("echo '{\"result\":\"nothing to do\"}'")
    }

    pub fn calls(&self) -> u32 {
        std::fs::read_to_string(self.state.path().join("count"))
            .map(|s| s.trim().parse().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn config(&self) -> AgentConfig {
        AgentConfig {
            program: self.path.display().to_string(),
            timeout_secs: 30,
            ..AgentConfig::default()
        }
    }
}

pub fn calculator_tests() -> TestConfig {
    TestConfig {
        command: CALCULATOR_TEST_COMMAND.to_string(),
        timeout_secs: 30,
        ..TestConfig::default()
    }
}

pub fn write_executable(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Snapshot calls observed by [`CountingSnapshots`].
#[derive(Debug, Default)]
pub struct SnapshotCounts {
    pub commits: u32,
    pub empty_commits: u32,
    pub diffs: u32,
    pub rollbacks: u32,
}

/// Real git snapshots that also count how often each primitive ran.
pub struct CountingSnapshots {
    inner: GitSnapshots,
    counts: Rc<RefCell<SnapshotCounts>>,
}

impl CountingSnapshots {
    pub fn new(repo_root: &Path) -> (Self, Rc<RefCell<SnapshotCounts>>) {
        let counts = Rc::new(RefCell::new(SnapshotCounts::default()));
        (
            Self {
                inner: GitSnapshots::new(repo_root),
                counts: counts.clone(),
            },
            counts,
        )
    }
}

impl SnapshotStore for CountingSnapshots {
    fn commit(&self, label: &str) -> Result<CommitOutcome> {
        let outcome = self.inner.commit(label)?;
        let mut counts = self.counts.borrow_mut();
        if outcome.committed {
            counts.commits += 1;
        } else {
            counts.empty_commits += 1;
        }
        Ok(outcome)
    }

    fn diff_since_previous(&self) -> String {
        self.counts.borrow_mut().diffs += 1;
        self.inner.diff_since_previous()
    }

    fn rollback_last_commit(&self) -> Result<()> {
        self.counts.borrow_mut().rollbacks += 1;
        self.inner.rollback_last_commit()
    }
}
