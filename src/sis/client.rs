//! HTTP client for the SIS APIs.
//!
//! All responses share the envelope
//! `{"apiResponse": {"response": {<item_type>: [...]}}}`. A 404 status,
//! a missing `response` key, or a missing item-type key all mean "no
//! items", not an error. Paginated endpoints are walked page by page
//! until an empty page is returned; each page request uses its own
//! parameter snapshot.

use crate::config::{SisConfig, SisKey};
use crate::error::SyncError;
use crate::sis::types::{
    lecture_codes, ClassSection, Enrollment, SectionDescriptor, Term, TermSelector,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, info};
use url::Url;

/// Page size for enrollment fetches.
const ENROLLMENT_PAGE_SIZE: u32 = 100;
/// Page size for class-section fetches.
const SECTION_PAGE_SIZE: u32 = 400;

/// Pagination mode for a SIS query.
#[derive(Debug, Clone, Copy)]
enum Paging {
    /// Single request, no page-number parameter
    None,
    /// Walk pages starting at `first_page` until an empty page
    Paged { first_page: u32 },
}

/// API credentials for the three SIS API families.
#[derive(Debug, Clone)]
pub struct SisCredentials {
    pub enrollments: SisKey,
    pub classes: SisKey,
    pub terms: SisKey,
}

/// Client for fetching terms, sections, and enrollments from the SIS.
pub struct SisClient {
    client: Client,
    config: SisConfig,
    credentials: SisCredentials,
}

impl SisClient {
    /// Creates a new SIS client.
    pub fn new(config: SisConfig, credentials: SisCredentials) -> Result<Self, SyncError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Resolves a term selector to a concrete term id.
    ///
    /// Concrete ids pass through unchanged; temporal positions are
    /// looked up against the terms API and the first returned term
    /// wins.
    pub async fn resolve_term(&self, selector: &TermSelector) -> Result<String, SyncError> {
        let position = match selector {
            TermSelector::Id(id) => return Ok(id.clone()),
            TermSelector::Position(position) => position,
        };
        let url = Url::parse(&self.config.terms_url)?;
        let params = vec![("temporal-position".to_string(), position.clone())];
        let terms: Vec<Term> = self
            .get_items(url, &self.credentials.terms, &params, Paging::None, "terms")
            .await?;
        let term = terms.first().ok_or_else(|| SyncError::TermResolution {
            position: position.clone(),
        })?;
        let term_id = term.id();
        info!(position = %position, term_id = %term_id, "Resolved term");
        Ok(term_id)
    }

    /// Fetches the section codes of the course's lecture-like sections.
    ///
    /// Only lecture rosters need to be fetched for enrollments: they
    /// are a superset of the rosters of the other section types.
    pub async fn fetch_lecture_section_codes(
        &self,
        term_id: &str,
        subject_area: &str,
        catalog_number: &str,
    ) -> Result<Vec<String>, SyncError> {
        let url = Url::parse(&format!(
            "{}/terms/{}/classes/sections/descriptors",
            self.config.enrollments_url, term_id
        ))?;
        let params = vec![
            ("subject-area-code".to_string(), subject_area.to_string()),
            ("catalog-number".to_string(), catalog_number.to_string()),
        ];
        let descriptors: Vec<SectionDescriptor> = self
            .get_items(
                url,
                &self.credentials.enrollments,
                &params,
                Paging::Paged { first_page: 1 },
                "fieldValues",
            )
            .await?;
        Ok(lecture_codes(&descriptors))
    }

    /// Fetches all enrollments for a course, concatenated across its
    /// lecture sections.
    pub async fn fetch_enrollments(
        &self,
        term_id: &str,
        subject_area: &str,
        catalog_number: &str,
    ) -> Result<Vec<Enrollment>, SyncError> {
        let codes = self
            .fetch_lecture_section_codes(term_id, subject_area, catalog_number)
            .await?;
        debug!(term_id = %term_id, sections = codes.len(), "Fetching lecture enrollments");
        let mut enrollments = Vec::new();
        for code in &codes {
            let url = Url::parse(&format!(
                "{}/terms/{}/classes/sections/{}",
                self.config.enrollments_url, term_id, code
            ))?;
            let params = vec![(
                "page-size".to_string(),
                ENROLLMENT_PAGE_SIZE.to_string(),
            )];
            let batch: Vec<Enrollment> = self
                .get_items(
                    url,
                    &self.credentials.enrollments,
                    &params,
                    Paging::Paged { first_page: 1 },
                    "classSectionEnrollments",
                )
                .await?;
            enrollments.extend(batch);
        }
        info!(
            catalog_number = %catalog_number,
            enrollments = enrollments.len(),
            "Fetched enrollments"
        );
        Ok(enrollments)
    }

    /// Fetches all class sections for a course, primary and secondary
    /// alike, for instructor/GSI extraction.
    pub async fn fetch_sections(
        &self,
        term_id: &str,
        subject_area: &str,
        catalog_number: &str,
    ) -> Result<Vec<ClassSection>, SyncError> {
        let url = Url::parse(&self.config.classes_url)?;
        let params = vec![
            (
                "subject-area-code".to_string(),
                subject_area.to_uppercase(),
            ),
            (
                "catalog-number".to_string(),
                catalog_number.to_uppercase(),
            ),
            ("term-id".to_string(), term_id.to_string()),
            ("page-size".to_string(), SECTION_PAGE_SIZE.to_string()),
        ];
        self.get_items(
            url,
            &self.credentials.classes,
            &params,
            Paging::Paged { first_page: 1 },
            "classSections",
        )
        .await
    }

    /// Fetches items from a SIS endpoint, walking pages if requested.
    async fn get_items<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &SisKey,
        params: &[(String, String)],
        paging: Paging,
        item_type: &str,
    ) -> Result<Vec<T>, SyncError> {
        match paging {
            Paging::None => self.get_page(url, key, params, item_type).await,
            Paging::Paged { first_page } => {
                paginate(first_page, |page| {
                    let mut page_params = params.to_vec();
                    page_params.push(("page-number".to_string(), page.to_string()));
                    let url = url.clone();
                    async move { self.get_page(url, key, &page_params, item_type).await }
                })
                .await
            }
        }
    }

    /// Performs one GET and extracts the item array from the envelope.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &SisKey,
        params: &[(String, String)],
        item_type: &str,
    ) -> Result<Vec<T>, SyncError> {
        debug!(url = %url, item_type = %item_type, "SIS GET");
        let response = self
            .client
            .get(url)
            .query(params)
            .header("Accept", "application/json")
            .header("app_id", &key.app_id)
            .header("app_key", &key.app_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(item_type = %item_type, "No more items (404)");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(SyncError::SisApi {
                message: format!("{} returned status {}", item_type, response.status()),
            });
        }
        let body: serde_json::Value = response.json().await?;
        extract_items(&body, item_type)
    }
}

/// Extracts `apiResponse.response.<item_type>` from an envelope.
///
/// Missing envelope levels mean an empty result; an item array that
/// fails to decode is a protocol error.
fn extract_items<T: DeserializeOwned>(
    body: &serde_json::Value,
    item_type: &str,
) -> Result<Vec<T>, SyncError> {
    let Some(response) = body.get("apiResponse").and_then(|v| v.get("response")) else {
        debug!(item_type = %item_type, "Envelope has no response");
        return Ok(Vec::new());
    };
    let Some(items) = response.get(item_type) else {
        debug!(item_type = %item_type, "Response has no items");
        return Ok(Vec::new());
    };
    serde_json::from_value(items.clone()).map_err(|e| SyncError::Decode {
        message: format!("{item_type}: {e}"),
    })
}

/// Fetches consecutive pages starting at `first_page` until a page
/// comes back empty, concatenating the results.
async fn paginate<T, F, Fut>(first_page: u32, mut fetch: F) -> Result<Vec<T>, SyncError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SyncError>>,
{
    let mut items = Vec::new();
    let mut page = first_page;
    loop {
        let batch = fetch(page).await?;
        if batch.is_empty() {
            return Ok(items);
        }
        items.extend(batch);
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn pagination_concatenates_until_empty_page() {
        let calls = AtomicUsize::new(0);
        let pages = vec![vec![1, 2], vec![3], vec![]];
        let items = paginate(1, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            let batch = pages.get((page - 1) as usize).cloned().unwrap_or_default();
            async move { Ok::<_, SyncError>(batch) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn pagination_stops_on_immediately_empty_page() {
        let calls = AtomicUsize::new(0);
        let items: Vec<u32> = paginate(1, |_page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<Vec<u32>, SyncError>(Vec::new()) }
        })
        .await
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pagination_propagates_errors() {
        let result: Result<Vec<u32>, _> = paginate(1, |_page| async move {
            Err(SyncError::SisApi {
                message: "boom".to_string(),
            })
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn extract_items_missing_response_is_empty() {
        let body = json!({"apiResponse": {}});
        let items: Vec<SectionDescriptor> = extract_items(&body, "fieldValues").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn extract_items_missing_item_type_is_empty() {
        let body = json!({"apiResponse": {"response": {"somethingElse": []}}});
        let items: Vec<SectionDescriptor> = extract_items(&body, "fieldValues").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn extract_items_decodes_present_items() {
        let body = json!({"apiResponse": {"response": {"fieldValues": [
            {"code": "32229", "description": "2019 Spring ASTRON 128 001 LEC 001"}
        ]}}});
        let items: Vec<SectionDescriptor> = extract_items(&body, "fieldValues").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "32229");
    }

    #[test]
    fn extract_items_rejects_malformed_item_array() {
        let body = json!({"apiResponse": {"response": {"fieldValues": "not-an-array"}}});
        let result: Result<Vec<SectionDescriptor>, _> = extract_items(&body, "fieldValues");
        assert!(matches!(result, Err(SyncError::Decode { .. })));
    }
}
