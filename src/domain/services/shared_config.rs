//! Shared-config detection
//!
//! Instances that all `%include` one common file can be configured with a
//! single write to that file instead of one write per instance.

use std::path::{Path, PathBuf};

use crate::domain::entities::HostSnapshot;

use super::mutator::INCLUDE_KEYWORD;

/// `%include` targets a config declares, in file order
pub fn include_targets(config: &str) -> Vec<PathBuf> {
    config
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let keyword = trimmed.split_whitespace().next()?;
            if !keyword.eq_ignore_ascii_case(INCLUDE_KEYWORD) {
                return None;
            }
            let value = trimmed[keyword.len()..].trim().trim_matches('"');
            if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        })
        .collect()
}

/// The file every instance delegates to, if there is exactly one.
///
/// `None` when there are no instances, when any instance declares no
/// `%include` or more than one, when two instances disagree, or when the
/// common file was not readable.
pub fn detect_shared_config(snapshot: &HostSnapshot) -> Option<PathBuf> {
    let mut shared: Option<PathBuf> = None;

    for instance in &snapshot.instances {
        let config = instance.config.as_deref()?;
        let mut targets = include_targets(config);
        if targets.len() != 1 {
            return None;
        }
        let target = targets.remove(0);
        match &shared {
            None => shared = Some(target),
            Some(existing) if *existing == target => {}
            Some(_) => return None,
        }
    }

    shared.filter(|path| is_readable(snapshot, path))
}

/// The file some instances delegate to while the others stand alone.
///
/// Every instance either declares no `%include` or the same single readable
/// file, and at least two declare it. Two groups on different files, or an
/// instance with several includes, give `None`.
pub fn partially_shared_config(snapshot: &HostSnapshot) -> Option<PathBuf> {
    let mut shared: Option<PathBuf> = None;
    let mut delegating = 0;

    for instance in &snapshot.instances {
        let config = instance.config.as_deref()?;
        let mut targets = include_targets(config);
        match targets.len() {
            0 => continue,
            1 => {}
            _ => return None,
        }
        let target = targets.remove(0);
        match &shared {
            None => shared = Some(target),
            Some(existing) if *existing == target => {}
            Some(_) => return None,
        }
        delegating += 1;
    }

    shared.filter(|path| delegating > 1 && is_readable(snapshot, path))
}

fn is_readable(snapshot: &HostSnapshot, path: &Path) -> bool {
    snapshot.included_content(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Instance, InstanceSnapshot};

    fn instance(name: &str, config: Option<&str>) -> InstanceSnapshot {
        InstanceSnapshot {
            instance: Instance {
                name: name.to_string(),
                config_path: PathBuf::from(format!("/etc/tor/instances/{}/torrc", name)),
                key_dir: PathBuf::from(format!("/var/lib/tor-instances/{}/keys", name)),
                unit: format!("tor@{}.service", name),
                running: true,
            },
            config: config.map(str::to_string),
            fingerprint: None,
            keys: Vec::new(),
        }
    }

    fn snapshot(instances: Vec<InstanceSnapshot>, readable: &[&str]) -> HostSnapshot {
        HostSnapshot {
            instances,
            included: readable
                .iter()
                .map(|p| (PathBuf::from(p), Some(String::new())))
                .collect(),
        }
    }

    #[test]
    fn all_instances_sharing_one_readable_file() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /etc/tor/shared\n")),
                instance("b", Some("Nickname b\n%include /etc/tor/shared\n")),
            ],
            &["/etc/tor/shared"],
        );
        assert_eq!(
            detect_shared_config(&snap),
            Some(PathBuf::from("/etc/tor/shared"))
        );
    }

    #[test]
    fn one_standalone_instance_disables_sharing() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /etc/tor/shared\n")),
                instance("b", Some("%include /etc/tor/shared\n")),
                instance("c", Some("Nickname c\n")),
            ],
            &["/etc/tor/shared"],
        );
        assert_eq!(detect_shared_config(&snap), None);
    }

    #[test]
    fn disagreeing_targets_disable_sharing() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /etc/tor/one\n")),
                instance("b", Some("%include /etc/tor/two\n")),
            ],
            &["/etc/tor/one", "/etc/tor/two"],
        );
        assert_eq!(detect_shared_config(&snap), None);
    }

    #[test]
    fn multiple_includes_or_unreadable_target_disable_sharing() {
        let snap = snapshot(
            vec![instance("a", Some("%include /x\n%include /y\n"))],
            &["/x", "/y"],
        );
        assert_eq!(detect_shared_config(&snap), None);

        let snap = snapshot(vec![instance("a", Some("%include /x\n"))], &[]);
        assert_eq!(detect_shared_config(&snap), None);
    }

    #[test]
    fn unreadable_instance_config_disables_sharing() {
        let snap = snapshot(
            vec![instance("a", Some("%include /x\n")), instance("b", None)],
            &["/x"],
        );
        assert_eq!(detect_shared_config(&snap), None);
    }

    #[test]
    fn partial_sharing_next_to_standalone_instances() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /s\n")),
                instance("b", Some("%include /s\n")),
                instance("c", Some("Nickname c\n")),
            ],
            &["/s"],
        );
        assert_eq!(partially_shared_config(&snap), Some(PathBuf::from("/s")));
    }

    #[test]
    fn two_shared_groups_are_not_a_partial_share() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /s1\n")),
                instance("b", Some("%include /s1\n")),
                instance("c", Some("%include /s2\n")),
                instance("d", Some("%include /s2\n")),
            ],
            &["/s1", "/s2"],
        );
        assert_eq!(detect_shared_config(&snap), None);
        assert_eq!(partially_shared_config(&snap), None);
    }

    #[test]
    fn a_single_delegating_instance_is_not_a_partial_share() {
        let snap = snapshot(
            vec![
                instance("a", Some("%include /s\n")),
                instance("b", Some("Nickname b\n")),
            ],
            &["/s"],
        );
        assert_eq!(partially_shared_config(&snap), None);
    }

    #[test]
    fn empty_fleet_has_no_shared_config() {
        assert_eq!(detect_shared_config(&HostSnapshot::default()), None);
    }

    #[test]
    fn include_targets_ignores_comments() {
        let targets = include_targets("# %include /nope\n  %include \"/etc/tor/x\"\n");
        assert_eq!(targets, vec![PathBuf::from("/etc/tor/x")]);
    }
}
