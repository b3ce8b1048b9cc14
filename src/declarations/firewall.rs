//! `firewall`

use crate::state::State;
use crate::ui;
use declarative::{CommandSpec, DeclarationError};

impl State {
    /// Declare rules passed to `ufw allow`; implies the `ufw` package and service
    ///
    /// A rule may span several words (`proto tcp from any to any port 80`).
    pub fn firewall<I, S>(&mut self, rules: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules: Vec<String> = rules.into_iter().map(Into::into).collect();
        if rules.is_empty() {
            return Err(DeclarationError::Empty { kind: "firewall" });
        }
        if let Some(bad) = rules.iter().find(|r| r.trim().is_empty()) {
            return Err(DeclarationError::InvalidName {
                kind: "firewall",
                name: bad.clone(),
            });
        }
        let firewall = &mut self.desired_mut().firewall;
        for rule in rules {
            if !firewall.contains(&rule) {
                firewall.push(rule);
            }
        }

        self.package(["ufw"])?;
        self.service(["ufw"])?;

        self.on_configure("firewall", |desired, host| {
            ui::announce("Allowing", &[("rules", desired.firewall.as_slice().into())]);
            for rule in &desired.firewall {
                host.exec.sudo(
                    CommandSpec::new("ufw")
                        .arg("allow")
                        .args(rule.split_whitespace()),
                )?;
            }
            Ok(())
        });
        Ok(())
    }
}
