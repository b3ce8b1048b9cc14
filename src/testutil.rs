//! Shared test doubles for the binary crate

use crate::config::{Declarations, Settings};
use crate::host::Host;
use crate::spawn::{UserJob, UserSpawner};
use crate::systemd::{InitSystem, Scope, UnitFile, UnitKind};
use crate::users::{Account, IdentityStore};
use anyhow::{Result, bail};
use declarative::Executor;
use declarative::testing::{FixedPrivilege, ScriptedRunner};
use pacmankit::testing::{MockBackend, MockBuilder};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Init system
// ============================================================================

fn scope_name(scope: Scope) -> &'static str {
    match scope {
        Scope::System => "system",
        Scope::User => "user",
    }
}

#[derive(Default)]
struct Units {
    /// (scope, full unit name) -> (state, preset)
    files: BTreeMap<(&'static str, String), (String, String)>,
    calls: Vec<String>,
}

/// In-memory unit table that records enable/disable calls
#[derive(Default)]
pub struct MockInit {
    units: Mutex<Units>,
}

impl MockInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unit(&self, scope: Scope, unit: &str, state: &str, preset: &str) {
        self.units.lock().unwrap().files.insert(
            (scope_name(scope), unit.to_string()),
            (state.to_string(), preset.to_string()),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.units.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.units.lock().unwrap().calls.clear();
    }
}

impl InitSystem for MockInit {
    fn enabled_units(&self, scope: Scope, kind: UnitKind) -> Result<Vec<UnitFile>> {
        let units = self.units.lock().unwrap();
        Ok(units
            .files
            .iter()
            .filter(|((s, unit), (state, _))| {
                *s == scope_name(scope) && unit.ends_with(kind.suffix()) && state == "enabled"
            })
            .map(|((_, unit), (state, preset))| UnitFile {
                name: unit.trim_end_matches(kind.suffix()).to_string(),
                state: state.clone(),
                preset: Some(preset.clone()),
            })
            .collect())
    }

    fn enable(&self, scope: Scope, units: &[String]) -> Result<()> {
        let mut table = self.units.lock().unwrap();
        for unit in units {
            table
                .files
                .insert((scope_name(scope), unit.clone()), ("enabled".into(), "disabled".into()));
        }
        table
            .calls
            .push(format!("{} enable {}", scope_name(scope), units.join(" ")));
        Ok(())
    }

    fn disable(&self, scope: Scope, units: &[String]) -> Result<()> {
        let mut table = self.units.lock().unwrap();
        for unit in units {
            table.files.remove(&(scope_name(scope), unit.clone()));
        }
        table
            .calls
            .push(format!("{} disable {}", scope_name(scope), units.join(" ")));
        Ok(())
    }
}

// ============================================================================
// Identity store
// ============================================================================

#[derive(Default)]
struct Accounts {
    accounts: BTreeMap<String, Account>,
    next_uid: u32,
    calls: Vec<String>,
}

/// In-memory passwd database
#[derive(Default)]
pub struct MockIdentity {
    db: Mutex<Accounts>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: &str, uid: u32) {
        self.db.lock().unwrap().accounts.insert(
            name.to_string(),
            Account {
                name: name.to_string(),
                uid,
                gid: uid,
                home: PathBuf::from("/home").join(name),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.db.lock().unwrap().calls.clone()
    }
}

impl IdentityStore for MockIdentity {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        Ok(self.db.lock().unwrap().accounts.get(name).cloned())
    }

    fn create(&self, name: &str) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        db.next_uid = db.next_uid.max(1000) + 1;
        let uid = db.next_uid;
        db.accounts.insert(
            name.to_string(),
            Account {
                name: name.to_string(),
                uid,
                gid: uid,
                home: PathBuf::from("/home").join(name),
            },
        );
        db.calls.push(format!("create {name}"));
        Ok(())
    }

    fn set_groups(&self, name: &str, groups: &[String]) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        if !db.accounts.contains_key(name) {
            bail!("no such user {name}");
        }
        db.calls.push(format!("groups {name} {}", groups.join(",")));
        Ok(())
    }
}

// ============================================================================
// Spawner
// ============================================================================

/// Records each job instead of starting a child
#[derive(Default)]
pub struct RecordingSpawner {
    jobs: Mutex<Vec<(String, Declarations)>>,
    fail: Mutex<bool>,
}

impl RecordingSpawner {
    pub fn jobs(&self) -> Vec<(String, Declarations)> {
        self.jobs.lock().unwrap().clone()
    }

    /// Make every following child exit unsuccessfully
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

impl UserSpawner for RecordingSpawner {
    fn run_as(&self, account: &Account, job: &UserJob) -> Result<()> {
        self.jobs
            .lock()
            .unwrap()
            .push((account.name.clone(), job.declarations.clone()));
        if *self.fail.lock().unwrap() {
            bail!("Convergence for user '{}' failed", account.name);
        }
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A [`Host`] built entirely from doubles, plus handles to inspect them
pub struct Fixture {
    pub host: Host,
    pub runner: Arc<ScriptedRunner>,
    pub privilege: Arc<FixedPrivilege>,
    pub packages: Arc<MockBackend>,
    pub builder: Arc<MockBuilder>,
    pub init: Arc<MockInit>,
    pub identity: Arc<MockIdentity>,
    pub spawner: Arc<RecordingSpawner>,
    /// Scratch directory; also the getty drop-in root
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(root: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let privilege = Arc::new(FixedPrivilege::new(root));
        let packages = Arc::new(MockBackend::new());
        let builder = Arc::new(MockBuilder::new(packages.clone()));
        let init = Arc::new(MockInit::new());
        let identity = Arc::new(MockIdentity::new());
        let spawner = Arc::new(RecordingSpawner::default());

        let settings = Settings {
            unit_dropin_root: dir.path().join("systemd"),
            ..Settings::default()
        };

        let host = Host {
            exec: Executor::new(runner.clone(), privilege.clone()),
            packages: packages.clone(),
            foreign: builder.clone(),
            init: init.clone(),
            identity: identity.clone(),
            spawner: spawner.clone(),
            settings,
        };

        Self {
            host,
            runner,
            privilege,
            packages,
            builder,
            init,
            identity,
            spawner,
            dir,
        }
    }

    /// Path inside the scratch directory
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}
