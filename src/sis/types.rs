//! Typed SIS payloads and identifier extraction.
//!
//! The SIS data model is irregular: nested fields are frequently absent
//! (unconfirmed instructors have no identifiers, some meetings have no
//! assigned instructors at all). Every optional level decodes to an
//! empty default so extraction short-circuits to "no contribution"
//! instead of failing.

use serde::Deserialize;
use std::collections::BTreeSet;

/// Identifier type carrying the campus UID.
const CAMPUS_UID: &str = "campus-uid";

/// Email type code for the campus email address.
const CAMPUS_EMAIL: &str = "CAMP";

/// Section-description keywords that mark a section as a lecture-like
/// section whose roster is a superset of the course's other sections.
pub const LECTURE_KEYWORDS: [&str; 4] = ["LEC", "SES", "WBL", "LAB"];

/// A term as requested on the command line: either a concrete SIS term
/// id or a temporal position to be resolved against the terms API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermSelector {
    /// A concrete term id, e.g. "2192"
    Id(String),
    /// A position relative to today: "Current", "Next", or "Previous"
    Position(String),
}

impl TermSelector {
    /// Parses a term argument. Digits are a term id; the three temporal
    /// position keywords resolve via the terms API; anything else is
    /// rejected.
    pub fn parse(s: &str) -> Result<Self, String> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return Ok(TermSelector::Id(s.to_string()));
        }
        match s {
            "Current" | "Next" | "Previous" => Ok(TermSelector::Position(s.to_string())),
            _ => Err(format!(
                "{s:?} is not a term id or one of Current, Next, Previous"
            )),
        }
    }
}

/// A term record from the terms API. The id is a string in practice
/// but tolerated as a number.
#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    id: serde_json::Value,
}

impl Term {
    /// The term id, normalized to a string.
    pub fn id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A section descriptor: a code plus descriptive text such as
/// "2019 Spring ASTRON 128 001 LAB 001".
#[derive(Debug, Clone, Deserialize)]
pub struct SectionDescriptor {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl SectionDescriptor {
    /// True if any whitespace-separated word of the description is a
    /// lecture-section keyword.
    pub fn is_lecture(&self) -> bool {
        self.description
            .split_whitespace()
            .any(|word| LECTURE_KEYWORDS.contains(&word))
    }
}

/// Returns the codes of lecture-like sections among the descriptors.
pub fn lecture_codes(descriptors: &[SectionDescriptor]) -> Vec<String> {
    descriptors
        .iter()
        .filter(|d| d.is_lecture())
        .map(|d| d.code.clone())
        .collect()
}

/// A class section with its meetings and primary/secondary association.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassSection {
    #[serde(default)]
    association: Option<SectionAssociation>,
    #[serde(default)]
    meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, Deserialize)]
struct SectionAssociation {
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct Meeting {
    #[serde(rename = "assignedInstructors", default)]
    assigned_instructors: Vec<AssignedInstructor>,
}

#[derive(Debug, Clone, Deserialize)]
struct AssignedInstructor {
    #[serde(default)]
    instructor: Option<Instructor>,
}

#[derive(Debug, Clone, Deserialize)]
struct Instructor {
    #[serde(default)]
    identifiers: Vec<Identifier>,
}

/// An identifier attached to a person, e.g.
/// `{"disclose": true, "id": "1234", "type": "campus-uid"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Identifier {
    #[serde(default)]
    pub disclose: Option<bool>,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub id_type: String,
}

impl ClassSection {
    /// Whether this is a primary section (usually the lecture).
    /// Instructors of primary sections are the course instructors;
    /// instructors of other sections are the GSIs.
    pub fn is_primary(&self) -> bool {
        self.association.as_ref().map(|a| a.primary).unwrap_or(false)
    }

    /// Walks meetings → assigned instructors → identifiers and collects
    /// campus UIDs. An identifier contributes only if its type is
    /// `campus-uid` and its disclosure flag is present and true.
    pub fn instructor_uids(&self) -> BTreeSet<String> {
        let mut uids = BTreeSet::new();
        for meeting in &self.meetings {
            for assigned in &meeting.assigned_instructors {
                let Some(instructor) = &assigned.instructor else {
                    continue;
                };
                for identifier in &instructor.identifiers {
                    if identifier.disclose != Some(true) {
                        continue;
                    }
                    if identifier.id_type != CAMPUS_UID {
                        continue;
                    }
                    uids.insert(identifier.id.clone());
                }
            }
        }
        uids
    }
}

/// An enrollment record tying a student to a section with a status.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
    #[serde(default)]
    student: Student,
    #[serde(rename = "enrollmentStatus", default)]
    enrollment_status: EnrollmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Student {
    #[serde(default)]
    identifiers: Vec<Identifier>,
    #[serde(default)]
    emails: Vec<Email>,
}

#[derive(Debug, Clone, Deserialize)]
struct Email {
    #[serde(rename = "type", default)]
    email_type: EmailType,
    #[serde(rename = "emailAddress", default)]
    email_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmailType {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EnrollmentStatus {
    #[serde(default)]
    status: StatusCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StatusCode {
    #[serde(default)]
    code: String,
}

impl Enrollment {
    /// The student's campus UID, if one is on record.
    pub fn campus_uid(&self) -> Option<&str> {
        self.student
            .identifiers
            .iter()
            .find(|i| i.id_type == CAMPUS_UID)
            .map(|i| i.id.as_str())
    }

    /// The student's campus email address, if one is on record.
    pub fn campus_email(&self) -> Option<&str> {
        self.student
            .emails
            .iter()
            .find(|e| e.email_type.code == CAMPUS_EMAIL)
            .map(|e| e.email_address.as_str())
    }

    /// The enrollment status code: "E", "W", or "D".
    pub fn status_code(&self) -> &str {
        &self.enrollment_status.status.code
    }
}

/// Filters enrollments to those whose status code matches exactly,
/// preserving relative order.
pub fn filter_enrollment_status<'a>(
    enrollments: &'a [Enrollment],
    status: &str,
) -> Vec<&'a Enrollment> {
    enrollments
        .iter()
        .filter(|e| e.status_code() == status)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: serde_json::Value) -> ClassSection {
        serde_json::from_value(value).unwrap()
    }

    fn enrollment(value: serde_json::Value) -> Enrollment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn term_selector_accepts_ids_and_positions() {
        assert_eq!(TermSelector::parse("2192"), Ok(TermSelector::Id("2192".into())));
        assert_eq!(
            TermSelector::parse("Next"),
            Ok(TermSelector::Position("Next".into()))
        );
        assert!(TermSelector::parse("Spring").is_err());
        assert!(TermSelector::parse("").is_err());
    }

    #[test]
    fn term_id_normalizes_numbers() {
        let term: Term = serde_json::from_value(json!({"id": 2192})).unwrap();
        assert_eq!(term.id(), "2192");
        let term: Term = serde_json::from_value(json!({"id": "2195"})).unwrap();
        assert_eq!(term.id(), "2195");
    }

    #[test]
    fn lecture_filter_matches_keywords() {
        let descriptors: Vec<SectionDescriptor> = serde_json::from_value(json!([
            {"code": "32227", "description": "2019 Spring ASTRON 128 001 LAB 001"},
            {"code": "32228", "description": "2019 Spring ASTRON 128 001 DIS 101"},
            {"code": "32229", "description": "2019 Spring ASTRON 128 001 LEC 001"},
        ]))
        .unwrap();
        assert_eq!(lecture_codes(&descriptors), vec!["32227", "32229"]);
    }

    #[test]
    fn instructor_uids_require_disclosure_and_type() {
        let section = section(json!({
            "association": {"primary": true},
            "meetings": [{
                "assignedInstructors": [{
                    "instructor": {"identifiers": [
                        {"disclose": true, "id": "100", "type": "campus-uid"},
                        {"disclose": false, "id": "200", "type": "campus-uid"},
                        {"disclose": true, "id": "300", "type": "student-id"},
                        {"id": "400", "type": "campus-uid"},
                    ]}
                }]
            }]
        }));
        let uids = section.instructor_uids();
        assert_eq!(uids, BTreeSet::from(["100".to_string()]));
    }

    #[test]
    fn instructor_without_identifiers_contributes_nothing() {
        let section = section(json!({
            "meetings": [{"assignedInstructors": [{"instructor": {}}, {}]}]
        }));
        assert!(section.instructor_uids().is_empty());
    }

    #[test]
    fn section_without_meetings_is_empty_and_secondary() {
        let section = section(json!({}));
        assert!(section.instructor_uids().is_empty());
        assert!(!section.is_primary());
    }

    #[test]
    fn enrollment_uid_and_email_extraction() {
        let e = enrollment(json!({
            "student": {
                "identifiers": [
                    {"id": "S123", "type": "student-id"},
                    {"id": "111", "type": "campus-uid"},
                ],
                "emails": [
                    {"type": {"code": "OTHR"}, "emailAddress": "alt@example.com"},
                    {"type": {"code": "CAMP"}, "emailAddress": "oski@berkeley.edu"},
                ]
            },
            "enrollmentStatus": {"status": {"code": "E"}}
        }));
        assert_eq!(e.campus_uid(), Some("111"));
        assert_eq!(e.campus_email(), Some("oski@berkeley.edu"));
        assert_eq!(e.status_code(), "E");
    }

    #[test]
    fn enrollment_with_no_identifiers_has_no_uid() {
        let e = enrollment(json!({"enrollmentStatus": {"status": {"code": "W"}}}));
        assert_eq!(e.campus_uid(), None);
        assert_eq!(e.campus_email(), None);
    }

    #[test]
    fn status_filter_is_exact_and_order_preserving() {
        let enrollments: Vec<Enrollment> = ["E", "W", "E", "D", "E"]
            .iter()
            .map(|code| {
                enrollment(json!({
                    "student": {"identifiers": [{"id": code.to_string(), "type": "campus-uid"}]},
                    "enrollmentStatus": {"status": {"code": code.to_string()}}
                }))
            })
            .collect();
        let enrolled = filter_enrollment_status(&enrollments, "E");
        assert_eq!(enrolled.len(), 3);
        assert!(enrolled.iter().all(|e| e.status_code() == "E"));
        let dropped = filter_enrollment_status(&enrollments, "D");
        assert_eq!(dropped.len(), 1);
    }
}
