//! `user`

use super::name_ok;
use crate::config::Declarations;
use crate::spawn::UserJob;
use crate::state::{State, UserDeclaration};
use crate::ui;
use crate::users::{ensure_account, write_autologin};
use declarative::DeclarationError;

impl State {
    /// Declare an account, its groups and the state converged as that account
    ///
    /// Repeated declarations of the same user accumulate groups; the nested
    /// declarations of the latest call replace earlier ones.
    pub fn user<I, S>(
        &mut self,
        name: &str,
        groups: I,
        autologin: bool,
        nested: &Declarations,
    ) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        name_ok("user", name)?;
        let groups: Vec<String> = groups.into_iter().map(Into::into).collect();
        for group in &groups {
            name_ok("user", group)?;
        }

        // Rejected here so a bad nested declaration fails before any effect
        State::from_declarations(nested).map_err(|e| DeclarationError::nested(name, e))?;

        let users = &mut self.desired_mut().users;
        match users.iter_mut().find(|u| u.name == name) {
            Some(existing) => {
                for group in groups {
                    if !existing.groups.contains(&group) {
                        existing.groups.push(group);
                    }
                }
                existing.autologin |= autologin;
                existing.nested = nested.clone();
            }
            None => users.push(UserDeclaration {
                name: name.to_string(),
                groups,
                autologin,
                nested: nested.clone(),
            }),
        }

        self.on_configure("users", |desired, host| {
            for user in &desired.users {
                ui::announce(
                    "Ensuring user",
                    &[("user", (&user.name).into()), ("groups", user.groups.as_slice().into())],
                );
                let account = ensure_account(host.identity.as_ref(), user)?;

                if user.autologin {
                    let root = &host.settings.unit_dropin_root;
                    let tty = &host.settings.autologin_tty;
                    if write_autologin(root, tty, &user.name)? {
                        ui::announce("Autologin", &[("user", (&user.name).into()), ("tty", tty.into())]);
                    }
                }

                if user.nested.is_empty() {
                    log::debug!("No declarations for user {}", user.name);
                    continue;
                }

                let job = UserJob {
                    settings: host.settings.clone(),
                    declarations: user.nested.clone(),
                };
                host.spawner.run_as(&account, &job)?;
            }
            Ok(())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Declarations;
    use crate::state::State;
    use crate::testutil::Fixture;
    use declarative::{DeclarationError, NoProgress};

    fn nested_timers() -> Declarations {
        Declarations {
            timers: Some(vec!["backup".into()]),
            ..Declarations::default()
        }
    }

    #[test]
    fn test_groups_accumulate_across_declarations() {
        let mut state = State::new();
        state.user("alice", ["wheel"], false, &Declarations::default()).unwrap();
        state
            .user("alice", ["video", "wheel"], true, &nested_timers())
            .unwrap();

        let users = &state.desired().users;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].groups, vec!["wheel", "video"]);
        assert!(users[0].autologin);
        assert_eq!(users[0].nested, nested_timers());
    }

    #[test]
    fn test_users_realized_then_spawned_in_order() {
        let fixture = Fixture::new(true);
        fixture.identity.add("alice", 1000);

        let mut state = State::new();
        state.user("alice", ["wheel"], false, &nested_timers()).unwrap();
        state.user("bob", Vec::<String>::new(), false, &nested_timers()).unwrap();
        state.user("carol", Vec::<String>::new(), false, &Declarations::default()).unwrap();

        state.converge(&fixture.host, &mut NoProgress).unwrap();

        assert_eq!(
            fixture.identity.calls(),
            vec!["groups alice wheel", "create bob", "create carol"]
        );
        let jobs = fixture.spawner.jobs();
        let names: Vec<&str> = jobs.iter().map(|(n, _)| n.as_str()).collect();
        // carol has nothing to converge, so no child is started
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(jobs[0].1, nested_timers());
    }

    #[test]
    fn test_failing_child_aborts_run() {
        let fixture = Fixture::new(true);
        fixture.spawner.fail();

        let mut state = State::new();
        state.user("alice", Vec::<String>::new(), false, &nested_timers()).unwrap();
        state.user("bob", Vec::<String>::new(), false, &nested_timers()).unwrap();

        let err = state.converge(&fixture.host, &mut NoProgress).unwrap_err();
        assert!(format!("{err:#}").contains("alice"));
        assert_eq!(fixture.spawner.jobs().len(), 1);
    }

    #[test]
    fn test_autologin_dropin_written() {
        let fixture = Fixture::new(true);
        let mut state = State::new();
        state.user("alice", Vec::<String>::new(), true, &Declarations::default()).unwrap();

        state.converge(&fixture.host, &mut NoProgress).unwrap();
        let dropin = fixture.path("systemd/getty@tty1.service.d/autologin.conf");
        let content = std::fs::read_to_string(dropin).unwrap();
        assert!(content.contains("--autologin alice"));
    }

    #[test]
    fn test_invalid_user_name_rejected() {
        let mut state = State::new();
        let err = state
            .user("bad name", Vec::<String>::new(), false, &Declarations::default())
            .unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidName { kind: "user", .. }));
    }
}
