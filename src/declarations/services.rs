//! `service` and `timer`

use super::names;
use crate::state::State;
use crate::systemd::{Scope, converge_services, converge_timers};
use crate::ui;
use declarative::DeclarationError;

impl State {
    /// Declare services to enable; hand-enabled undeclared services are disabled
    pub fn service<I, S>(&mut self, items: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names("service", items)?;
        self.desired_mut().services.extend(items);

        self.on_finalize("service", |desired, host| {
            let scope = Scope::for_root(host.exec.is_root());
            let changes = converge_services(host.init.as_ref(), scope, &desired.services)?;
            if !changes.enabled.is_empty() {
                ui::announce("Enabled services", &[("services", (&changes.enabled).into())]);
            }
            if !changes.disabled.is_empty() {
                ui::announce("Disabled services", &[("services", (&changes.disabled).into())]);
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare timers to enable
    pub fn timer<I, S>(&mut self, items: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names("timer", items)?;
        self.desired_mut().timers.extend(items);

        self.on_finalize("timer", |desired, host| {
            let scope = Scope::for_root(host.exec.is_root());
            let changes = converge_timers(host.init.as_ref(), scope, &desired.timers)?;
            if !changes.enabled.is_empty() {
                ui::announce("Enabled timers", &[("timers", (&changes.enabled).into())]);
            }
            Ok(())
        });
        Ok(())
    }
}
