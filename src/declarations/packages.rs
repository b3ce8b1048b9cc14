//! `package` and `aur`

use super::names;
use crate::state::State;
use crate::ui::{self, UiCallback};
use declarative::DeclarationError;
use pacmankit::{converge_foreign, converge_packages};

impl State {
    /// Declare native packages (or package groups) that must be installed
    ///
    /// Explicitly installed native packages outside the union of all
    /// declared names and their group members are removed.
    pub fn package<I, S>(&mut self, items: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names("package", items)?;
        self.desired_mut().packages.extend(items);

        self.on_install("package", |desired, host| {
            ui::announce(
                "Converging packages",
                &[("packages", (&desired.packages).into())],
            );
            let plan = converge_packages(host.packages.as_ref(), &desired.packages, &mut UiCallback)?;
            if plan.is_empty() {
                log::info!("Packages up to date");
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare foreign (AUR) packages; undeclared foreign packages are removed
    pub fn aur<I, S>(&mut self, items: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names("aur", items)?;
        let aur = &mut self.desired_mut().aur;
        for name in items {
            if !aur.contains(&name) {
                aur.push(name);
            }
        }

        self.on_install("aur", |desired, host| {
            ui::announce(
                "Converging AUR packages",
                &[("packages", desired.aur.as_slice().into())],
            );
            converge_foreign(
                host.packages.as_ref(),
                host.foreign.as_ref(),
                &desired.aur,
                &mut UiCallback,
            )?;
            Ok(())
        });
        Ok(())
    }
}
