//! `keyboard`, `locale`, `timedate` and `hostname`

use super::name_ok;
use crate::config::KeyboardDecl;
use crate::state::{State, Timedate};
use crate::ui;
use declarative::{CommandSpec, DeclarationError};

impl State {
    /// Declare keyboard settings; fields given here override earlier ones
    pub fn keyboard(&mut self, decl: &KeyboardDecl) {
        let keyboard = &mut self.desired_mut().keyboard;
        for (slot, value) in [
            (&mut keyboard.keymap, &decl.keymap),
            (&mut keyboard.layout, &decl.layout),
            (&mut keyboard.model, &decl.model),
            (&mut keyboard.variant, &decl.variant),
            (&mut keyboard.options, &decl.options),
        ] {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        self.on_prepare("keyboard", |desired, host| {
            let keyboard = &desired.keyboard;
            let Some(keymap) = &keyboard.keymap else {
                log::debug!("No keymap declared; keyboard left alone");
                return Ok(());
            };

            ui::announce("Setting keyboard", &[("keymap", keymap.into())]);
            host.exec
                .sudo(CommandSpec::new("localectl").args(["set-keymap", keymap.as_str()]))?;

            let field = |v: &Option<String>| v.clone().unwrap_or_default();
            host.exec.sudo(
                CommandSpec::new("localectl")
                    .arg("set-x11-keymap")
                    .arg(field(&keyboard.layout))
                    .arg(field(&keyboard.model))
                    .arg(field(&keyboard.variant))
                    .arg(field(&keyboard.options)),
            )?;
            Ok(())
        });
    }

    /// Declare the system locale (e.g. `LANG=en_US.UTF-8`)
    pub fn locale(&mut self, value: &str) -> Result<(), DeclarationError> {
        name_ok("locale", value)?;
        self.desired_mut().locale = Some(value.to_string());

        self.on_prepare("locale", |desired, host| {
            if let Some(locale) = &desired.locale {
                ui::announce("Setting locale", &[("locale", locale.into())]);
                host.exec
                    .sudo(CommandSpec::new("localectl").args(["set-locale", locale.as_str()]))?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare the timezone and whether NTP is on
    pub fn timedate(&mut self, timezone: &str, ntp: bool) -> Result<(), DeclarationError> {
        name_ok("timedate", timezone)?;
        self.desired_mut().timedate = Some(Timedate {
            timezone: timezone.to_string(),
            ntp,
        });

        self.on_configure("timedate", |desired, host| {
            if let Some(timedate) = &desired.timedate {
                let ntp = timedate.ntp.to_string();
                ui::announce(
                    "Setting timedate",
                    &[("timezone", (&timedate.timezone).into()), ("ntp", (&ntp).into())],
                );
                host.exec.sudo(
                    CommandSpec::new("timedatectl")
                        .args(["set-timezone", timedate.timezone.as_str()]),
                )?;
                host.exec
                    .sudo(CommandSpec::new("timedatectl").args(["set-ntp", ntp.as_str()]))?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare the hostname; also declares `/etc/hostname`
    pub fn hostname(&mut self, name: &str) -> Result<(), DeclarationError> {
        name_ok("hostname", name)?;
        self.desired_mut().hostname = Some(name.to_string());
        self.file("/etc/hostname", &format!("{name}\n"))?;

        self.on_configure("hostname", |desired, host| {
            if let Some(hostname) = &desired.hostname {
                ui::announce("Setting hostname", &[("hostname", hostname.into())]);
                host.exec
                    .sudo(CommandSpec::new("hostnamectl").args(["set-hostname", hostname.as_str()]))?;
            }
            Ok(())
        });
        Ok(())
    }
}
