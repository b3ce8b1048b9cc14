//! The live system, as seen by steps
//!
//! Every external surface sits behind a trait object so tests can build a
//! [`Host`] from mocks.

use crate::config::Settings;
use crate::spawn::{ChildSpawner, UserSpawner};
use crate::systemd::{InitSystem, Systemctl};
use crate::users::{IdentityStore, PasswdStore};
use anyhow::Result;
use declarative::Executor;
use pacmankit::{AurBuilder, Backend, ForeignBuilder, PacmanBackend};
use std::sync::Arc;

pub struct Host {
    pub exec: Executor,
    pub packages: Arc<dyn Backend>,
    pub foreign: Arc<dyn ForeignBuilder>,
    pub init: Arc<dyn InitSystem>,
    pub identity: Arc<dyn IdentityStore>,
    pub spawner: Arc<dyn UserSpawner>,
    pub settings: Settings,
}

impl Host {
    /// Host backed by the real commands of this machine
    pub fn system(settings: Settings, spawner: ChildSpawner) -> Result<Self> {
        let exec = Executor::system().with_escalation(settings.escalation.clone());
        let foreign = AurBuilder::new(exec.clone(), settings.aur_cache_dir()?)
            .with_base_url(settings.aur_url.clone());

        Ok(Self {
            packages: Arc::new(PacmanBackend::new(exec.clone())),
            foreign: Arc::new(foreign),
            init: Arc::new(Systemctl::new(exec.clone())),
            identity: Arc::new(PasswdStore::new(exec.clone())),
            spawner: Arc::new(spawner),
            exec,
            settings,
        })
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("exec", &self.exec)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
