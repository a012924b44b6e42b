//! Request and response shapes for the Grouper web-services REST API.
//!
//! Writes are upserts: the only result codes accepted for stem/group
//! saves are `SUCCESS_INSERTED` and `SUCCESS_NO_CHANGES_NEEDED`, so a
//! repeated save of identical data is a no-op. Anything else, including
//! a response with no recognized result envelope, is a failure.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};

/// Result codes accepted for stem and group saves.
const SAVE_SUCCESS_CODES: [&str; 2] = ["SUCCESS_INSERTED", "SUCCESS_NO_CHANGES_NEEDED"];

/// Result codes accepted for member replacement.
const MEMBER_SUCCESS_CODES: [&str; 2] = ["SUCCESS", "SUCCESS_INSERTED"];

#[derive(Debug, Serialize)]
pub struct StemSaveRequest {
    #[serde(rename = "WsRestStemSaveLiteRequest")]
    pub request: StemSaveBody,
}

#[derive(Debug, Serialize)]
pub struct StemSaveBody {
    pub description: String,
    #[serde(rename = "displayExtension")]
    pub display_extension: String,
    #[serde(rename = "stemName")]
    pub stem_name: String,
}

impl StemSaveRequest {
    pub fn new(stem: &str, name: &str) -> Self {
        Self {
            request: StemSaveBody {
                description: name.to_string(),
                display_extension: name.to_string(),
                stem_name: stem.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupSaveRequest {
    #[serde(rename = "WsRestGroupSaveLiteRequest")]
    pub request: GroupSaveBody,
}

#[derive(Debug, Serialize)]
pub struct GroupSaveBody {
    pub description: String,
    #[serde(rename = "displayExtension")]
    pub display_extension: String,
    #[serde(rename = "groupName")]
    pub group_name: String,
}

impl GroupSaveRequest {
    pub fn new(group: &str, name: &str) -> Self {
        Self {
            request: GroupSaveBody {
                description: name.to_string(),
                display_extension: name.to_string(),
                group_name: group.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddMemberRequest {
    #[serde(rename = "WsRestAddMemberRequest")]
    pub request: AddMemberBody,
}

#[derive(Debug, Serialize)]
pub struct AddMemberBody {
    /// "T" makes the write a full replacement of the membership
    #[serde(rename = "replaceAllExisting")]
    pub replace_all_existing: String,
    #[serde(rename = "subjectLookups")]
    pub subject_lookups: Vec<SubjectLookup>,
}

#[derive(Debug, Serialize)]
pub struct SubjectLookup {
    #[serde(rename = "subjectId")]
    pub subject_id: String,
}

impl AddMemberRequest {
    /// Builds a replace-all-existing membership write for the given
    /// subject ids.
    pub fn replace_all<I, S>(subject_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            request: AddMemberBody {
                replace_all_existing: "T".to_string(),
                subject_lookups: subject_ids
                    .into_iter()
                    .map(|id| SubjectLookup {
                        subject_id: id.into(),
                    })
                    .collect(),
            },
        }
    }
}

/// A directory response, keyed by which result envelope it carries.
#[derive(Debug, Default, Deserialize)]
pub struct WsResponse {
    #[serde(rename = "WsRestResultProblem", default)]
    pub problem: Option<ResultEnvelope>,
    #[serde(rename = "WsStemSaveLiteResult", default)]
    pub stem_result: Option<ResultEnvelope>,
    #[serde(rename = "WsGroupSaveLiteResult", default)]
    pub group_result: Option<ResultEnvelope>,
    #[serde(rename = "WsAddMemberResults", default)]
    pub add_member_result: Option<ResultEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "resultMetadata", default)]
    pub result_metadata: ResultMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultMetadata {
    #[serde(rename = "resultCode", default)]
    pub result_code: Option<String>,
    #[serde(rename = "resultMessage", default)]
    pub result_message: Option<String>,
}

impl ResultMetadata {
    fn code(&self) -> &str {
        self.result_code.as_deref().unwrap_or("UNKNOWN")
    }

    fn message(&self) -> &str {
        self.result_message.as_deref().unwrap_or("no message")
    }
}

/// The kind of write a response is interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    StemSave,
    GroupSave,
    MemberReplace,
}

impl WriteKind {
    fn accepted_codes(&self) -> &'static [&'static str] {
        match self {
            WriteKind::StemSave | WriteKind::GroupSave => &SAVE_SUCCESS_CODES,
            WriteKind::MemberReplace => &MEMBER_SUCCESS_CODES,
        }
    }
}

/// Interprets a directory write response, failing closed.
///
/// A problem envelope is always an error. Otherwise the result envelope
/// matching the write kind must be present and carry an accepted result
/// code; a response with neither is an error.
pub fn interpret_write(kind: WriteKind, response: &WsResponse) -> Result<(), SyncError> {
    if let Some(problem) = &response.problem {
        let meta = &problem.result_metadata;
        return Err(SyncError::Directory {
            code: meta.code().to_string(),
            message: meta.message().to_string(),
        });
    }
    let result = match kind {
        WriteKind::StemSave => &response.stem_result,
        WriteKind::GroupSave => &response.group_result,
        WriteKind::MemberReplace => &response.add_member_result,
    };
    let Some(result) = result else {
        return Err(SyncError::Directory {
            code: "MISSING_RESULT".to_string(),
            message: format!("{kind:?} response carried no recognized result envelope"),
        });
    };
    let meta = &result.result_metadata;
    if kind.accepted_codes().contains(&meta.code()) {
        Ok(())
    } else {
        Err(SyncError::Directory {
            code: meta.code().to_string(),
            message: meta.message().to_string(),
        })
    }
}
