//! Reconciliation: shape SIS data into per-subgroup UID sets and apply
//! them to the directory.
//!
//! A run is a single linear pass: resolve the term, ensure the
//! folder/group hierarchy, fetch each needed data source once, shape
//! memberships, then either print a dry-run report or replace each
//! group's membership. Any failure aborts the run; folder and group
//! creation are idempotent so a re-run is safe.

use crate::directory::{DirectoryAuth, DirectoryClient};
use crate::error::SyncError;
use crate::groups::{child_id, course_name};
use crate::sis::{filter_enrollment_status, ClassSection, Enrollment, SisClient, TermSelector};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A course subgroup, keyed either to an enrollment status or to an
/// instructor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subgroup {
    Enrolled,
    Waitlisted,
    Dropped,
    Instructors,
    Gsis,
}

/// The subgroups synced when no allowlist is given. `dropped` is
/// addressable but off by default.
pub const DEFAULT_SUBGROUPS: [Subgroup; 4] = [
    Subgroup::Enrolled,
    Subgroup::Waitlisted,
    Subgroup::Instructors,
    Subgroup::Gsis,
];

impl Subgroup {
    /// The subgroup's name as used in group paths and on the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Subgroup::Enrolled => "enrolled",
            Subgroup::Waitlisted => "waitlisted",
            Subgroup::Dropped => "dropped",
            Subgroup::Instructors => "instructors",
            Subgroup::Gsis => "gsis",
        }
    }

    /// The enrollment status code this subgroup filters on, if it is a
    /// student subgroup.
    pub fn status_code(self) -> Option<&'static str> {
        match self {
            Subgroup::Enrolled => Some("E"),
            Subgroup::Waitlisted => Some("W"),
            Subgroup::Dropped => Some("D"),
            Subgroup::Instructors | Subgroup::Gsis => None,
        }
    }

    /// True if this subgroup is filled from enrollment data.
    pub fn is_student(self) -> bool {
        self.status_code().is_some()
    }

    /// True if this subgroup is filled from section/instructor data.
    pub fn is_staff(self) -> bool {
        !self.is_student()
    }

    /// Parses a subgroup name.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "enrolled" => Ok(Subgroup::Enrolled),
            "waitlisted" => Ok(Subgroup::Waitlisted),
            "dropped" => Ok(Subgroup::Dropped),
            "instructors" => Ok(Subgroup::Instructors),
            "gsis" => Ok(Subgroup::Gsis),
            _ => Err(format!(
                "{s:?} is not one of enrolled, waitlisted, dropped, instructors, gsis"
            )),
        }
    }
}

impl std::fmt::Display for Subgroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How instructor UIDs are combined when multiple sections share a
/// role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolePolicy {
    /// Union across all sections sharing the role
    #[default]
    Union,
    /// Each section overwrites the role's set; kept for compatibility
    /// with the historical behavior
    LastSectionWins,
}

/// Deduplicated UID sets keyed by subgroup.
pub type Memberships = BTreeMap<Subgroup, BTreeSet<String>>;

/// Filters enrollments into UID sets for the requested student
/// subgroups. Every requested student subgroup gets an entry, possibly
/// empty.
pub fn student_memberships(enrollments: &[Enrollment], requested: &[Subgroup]) -> Memberships {
    requested
        .iter()
        .filter(|sg| sg.is_student())
        .map(|sg| {
            let code = sg.status_code().unwrap_or_default();
            let uids = filter_enrollment_status(enrollments, code)
                .into_iter()
                .filter_map(|e| e.campus_uid())
                .map(str::to_string)
                .collect();
            (*sg, uids)
        })
        .collect()
}

/// Assigns each section's instructor UIDs to the `instructors` or
/// `gsis` subgroup by its primary flag. Only requested staff subgroups
/// are populated; every requested staff subgroup gets an entry.
pub fn staff_memberships(
    sections: &[ClassSection],
    requested: &[Subgroup],
    policy: RolePolicy,
) -> Memberships {
    let mut memberships: Memberships = requested
        .iter()
        .filter(|sg| sg.is_staff())
        .map(|sg| (*sg, BTreeSet::new()))
        .collect();
    for section in sections {
        let role = if section.is_primary() {
            Subgroup::Instructors
        } else {
            Subgroup::Gsis
        };
        let Some(uids) = memberships.get_mut(&role) else {
            continue;
        };
        match policy {
            RolePolicy::Union => uids.extend(section.instructor_uids()),
            RolePolicy::LastSectionWins => *uids = section.instructor_uids(),
        }
    }
    memberships
}

/// Renders the dry-run report: each subgroup name prefixed with `_`,
/// followed by one UID per line.
pub fn render_dry_run(subgroups: &[Subgroup], memberships: &Memberships) -> String {
    let mut out = String::new();
    for subgroup in subgroups {
        out.push('_');
        out.push_str(subgroup.name());
        out.push('\n');
        if let Some(uids) = memberships.get(subgroup) {
            for uid in uids {
                out.push_str(uid);
                out.push('\n');
            }
        }
    }
    out
}

/// Parameters for one course-sync run.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Base directory path, e.g. `edu:college:dept:classes`
    pub base_group: String,
    /// Term id or temporal position
    pub term: TermSelector,
    /// SIS subject area, e.g. `ASTRON`
    pub subject_area: String,
    /// SIS catalog number, e.g. `128`
    pub catalog_number: String,
    /// Subgroups to sync, in reporting/write order
    pub subgroups: Vec<Subgroup>,
    /// Print memberships instead of writing them
    pub dry_run: bool,
    /// Instructor-role merge policy
    pub role_policy: RolePolicy,
}

/// Orchestrates a single course-sync run.
pub struct Reconciler {
    sis: SisClient,
    directory: DirectoryClient,
    auth: DirectoryAuth,
}

impl Reconciler {
    pub fn new(sis: SisClient, directory: DirectoryClient, auth: DirectoryAuth) -> Self {
        Self {
            sis,
            directory,
            auth,
        }
    }

    /// Runs the sync described by `request`.
    pub async fn run(&self, request: &SyncRequest) -> Result<(), SyncError> {
        let subject_area = request.subject_area.to_lowercase();
        let course = course_name(&subject_area, &request.catalog_number);
        let term_id = self.sis.resolve_term(&request.term).await?;

        let term_group = child_id(&request.base_group, &term_id);
        let course_group = child_id(&term_group, &course);
        info!(course_group = %course_group, "Syncing course");

        if !request.dry_run {
            self.directory
                .create_folder(&self.auth, &term_group, &term_id)
                .await?;
            self.directory
                .create_folder(&self.auth, &course_group, &course)
                .await?;
            for subgroup in &request.subgroups {
                let group = child_id(&course_group, subgroup.name());
                self.directory
                    .create_group(&self.auth, &group, subgroup.name())
                    .await?;
            }
        }

        let mut memberships = Memberships::new();
        if request.subgroups.iter().any(|sg| sg.is_student()) {
            let enrollments = self
                .sis
                .fetch_enrollments(&term_id, &subject_area, &request.catalog_number)
                .await?;
            memberships.extend(student_memberships(&enrollments, &request.subgroups));
        }
        if request.subgroups.iter().any(|sg| sg.is_staff()) {
            let sections = self
                .sis
                .fetch_sections(&term_id, &subject_area, &request.catalog_number)
                .await?;
            memberships.extend(staff_memberships(
                &sections,
                &request.subgroups,
                request.role_policy,
            ));
        }

        if request.dry_run {
            debug!("Dry run, skipping directory writes");
            print!("{}", render_dry_run(&request.subgroups, &memberships));
            return Ok(());
        }

        for subgroup in &request.subgroups {
            let uids = memberships.get(subgroup).cloned().unwrap_or_default();
            let group = child_id(&course_group, subgroup.name());
            self.directory
                .replace_members(&self.auth, &group, uids)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enrollment(uid: &str, status: &str) -> Enrollment {
        serde_json::from_value(json!({
            "student": {"identifiers": [{"id": uid, "type": "campus-uid"}]},
            "enrollmentStatus": {"status": {"code": status}}
        }))
        .unwrap()
    }

    fn section(primary: bool, uids: &[&str]) -> ClassSection {
        let identifiers: Vec<_> = uids
            .iter()
            .map(|uid| json!({"disclose": true, "id": uid, "type": "campus-uid"}))
            .collect();
        serde_json::from_value(json!({
            "association": {"primary": primary},
            "meetings": [{"assignedInstructors": [{"instructor": {"identifiers": identifiers}}]}]
        }))
        .unwrap()
    }

    fn uid_set(uids: &[&str]) -> BTreeSet<String> {
        uids.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn subgroup_parse_round_trips() {
        for sg in [
            Subgroup::Enrolled,
            Subgroup::Waitlisted,
            Subgroup::Dropped,
            Subgroup::Instructors,
            Subgroup::Gsis,
        ] {
            assert_eq!(Subgroup::parse(sg.name()), Ok(sg));
        }
        assert!(Subgroup::parse("admins").is_err());
    }

    #[test]
    fn student_memberships_filter_and_dedup() {
        let enrollments = vec![
            enrollment("111", "E"),
            enrollment("222", "E"),
            enrollment("111", "E"),
            enrollment("333", "W"),
            enrollment("444", "D"),
        ];
        let memberships = student_memberships(
            &enrollments,
            &[Subgroup::Enrolled, Subgroup::Waitlisted, Subgroup::Gsis],
        );
        assert_eq!(memberships[&Subgroup::Enrolled], uid_set(&["111", "222"]));
        assert_eq!(memberships[&Subgroup::Waitlisted], uid_set(&["333"]));
        assert!(!memberships.contains_key(&Subgroup::Gsis));
        assert!(!memberships.contains_key(&Subgroup::Dropped));
    }

    #[test]
    fn requested_student_subgroup_with_no_matches_is_empty() {
        let memberships = student_memberships(&[], &[Subgroup::Dropped]);
        assert!(memberships[&Subgroup::Dropped].is_empty());
    }

    #[test]
    fn primary_sections_feed_instructors_and_others_feed_gsis() {
        let sections = vec![section(true, &["A"]), section(false, &["B"])];
        let memberships = staff_memberships(
            &sections,
            &[Subgroup::Instructors, Subgroup::Gsis],
            RolePolicy::Union,
        );
        assert_eq!(memberships[&Subgroup::Instructors], uid_set(&["A"]));
        assert_eq!(memberships[&Subgroup::Gsis], uid_set(&["B"]));
    }

    #[test]
    fn union_policy_merges_across_sections_sharing_a_role() {
        let sections = vec![
            section(false, &["B1"]),
            section(false, &["B2"]),
            section(false, &[]),
        ];
        let memberships = staff_memberships(&sections, &[Subgroup::Gsis], RolePolicy::Union);
        assert_eq!(memberships[&Subgroup::Gsis], uid_set(&["B1", "B2"]));
    }

    #[test]
    fn last_section_wins_policy_keeps_only_the_final_section() {
        let sections = vec![section(false, &["B1"]), section(false, &["B2"])];
        let memberships =
            staff_memberships(&sections, &[Subgroup::Gsis], RolePolicy::LastSectionWins);
        assert_eq!(memberships[&Subgroup::Gsis], uid_set(&["B2"]));
    }

    #[test]
    fn unrequested_roles_are_ignored() {
        let sections = vec![section(true, &["A"]), section(false, &["B"])];
        let memberships = staff_memberships(&sections, &[Subgroup::Instructors], RolePolicy::Union);
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[&Subgroup::Instructors], uid_set(&["A"]));
    }

    #[test]
    fn dry_run_report_lists_each_subgroup_and_uid() {
        let mut memberships = Memberships::new();
        memberships.insert(Subgroup::Enrolled, uid_set(&["111", "222"]));
        memberships.insert(Subgroup::Instructors, uid_set(&["333"]));
        let report = render_dry_run(&[Subgroup::Enrolled, Subgroup::Instructors], &memberships);
        assert_eq!(report, "_enrolled\n111\n222\n_instructors\n333\n");
    }

    #[test]
    fn dry_run_report_handles_missing_subgroup_data() {
        let report = render_dry_run(&[Subgroup::Gsis], &Memberships::new());
        assert_eq!(report, "_gsis\n");
    }
}
