// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Datacite Registrar Adapter
//!
//! Implements [`IdentifierRegistrar`] against the Datacite REST API
//! (JSON:API flavoured).
//!
//! # API Endpoints
//!
//! - `POST /dois` - create; Datacite mints the suffix under `prefix`
//! - `PUT /dois/{doi}` - idempotent upsert of an existing registration
//!
//! Both answer `{"data": {"id": "<bare doi>", ...}}`.
//!
//! The lifecycle transition is requested through the `event` attribute
//! (`publish`, `register`); a metadata-only refresh omits it.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::doi::{bare_doi, DoiFormat};
use crate::domain::registrar::{IdentifierRegistrar, RegistrarError, RegistrationRequest};
use crate::domain::sync_config::RegistrarConfig;
use crate::domain::work::{ContributorData, EtdWork, OaWork, Work};
use crate::infrastructure::http::{HttpTransport, OutboundRequest, TransportError};

const UVA_NAME: &str = "University of Virginia";
const UVA_ROR: &str = "https://ror.org/0153tk833";
const ROR_SCHEME_URI: &str = "https://ror.org";
const ORCID_SCHEME_URI: &str = "https://orcid.org";

// ============================================================================
// Payload
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationData {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme_uri: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub affiliation_identifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub affiliation_identifier_scheme: String,
}

impl AffiliationData {
    pub fn uva() -> Self {
        Self {
            name: UVA_NAME.to_string(),
            scheme_uri: ROR_SCHEME_URI.to_string(),
            affiliation_identifier: UVA_ROR.to_string(),
            affiliation_identifier_scheme: "ROR".to_string(),
        }
    }

    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scheme_uri: String::new(),
            affiliation_identifier: String::new(),
            affiliation_identifier_scheme: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdentifierData {
    pub scheme_uri: String,
    pub name_identifier: String,
    pub name_identifier_scheme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub name_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub contributor_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affiliation: Vec<AffiliationData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name_identifiers: Vec<NameIdentifierData>,
}

impl PersonData {
    fn from_contributor(person: &ContributorData, contributor_type: &str) -> Self {
        let name = if !person.first_name.is_empty() && !person.last_name.is_empty() {
            format!("{}, {}", person.last_name, person.first_name)
        } else {
            String::new()
        };
        let affiliation = if !person.compute_id.is_empty() {
            AffiliationData::uva()
        } else {
            AffiliationData::named(&person.institution)
        };
        let name_identifiers = match person.orcid.trim() {
            "" => Vec::new(),
            orcid => vec![NameIdentifierData {
                scheme_uri: ORCID_SCHEME_URI.to_string(),
                name_identifier: if orcid.starts_with("http") {
                    orcid.to_string()
                } else {
                    format!("{}/{}", ORCID_SCHEME_URI, orcid)
                },
                name_identifier_scheme: "ORCID".to_string(),
            }],
        };

        Self {
            name,
            given_name: person.first_name.clone(),
            family_name: person.last_name.clone(),
            name_type: "Personal".to_string(),
            contributor_type: contributor_type.to_string(),
            affiliation: vec![affiliation],
            name_identifiers,
        }
    }
}

/// People without any name are dropped
fn person_list(people: &[ContributorData], contributor_type: &str) -> Vec<PersonData> {
    people
        .iter()
        .filter(|p| !p.first_name.is_empty() || !p.last_name.is_empty())
        .map(|p| PersonData::from_contributor(p, contributor_type))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleData {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionData {
    pub description: String,
    pub description_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectData {
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RightsData {
    pub rights: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingData {
    pub funder_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_type_general: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateData {
    pub date: String,
    pub date_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherData {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme_uri: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publisher_identifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publisher_identifier_scheme: String,
}

impl PublisherData {
    pub fn uva() -> Self {
        Self {
            name: UVA_NAME.to_string(),
            scheme_uri: ROR_SCHEME_URI.to_string(),
            publisher_identifier: UVA_ROR.to_string(),
            publisher_identifier_scheme: "ROR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Empty on create; Datacite generates the suffix
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doi: String,
    pub prefix: String,
    pub url: String,
    pub titles: Vec<TitleData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<DescriptionData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<PersonData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<PersonData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<SubjectData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rights_list: Vec<RightsData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub funding_references: Vec<FundingData>,
    pub types: TypeData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<DateData>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publication_year: String,
    pub publisher: PublisherData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataciteResource {
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: AttributesData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatacitePayload {
    pub data: DataciteResource,
}

#[derive(Debug, Deserialize)]
struct DataciteResponse {
    data: DataciteResponseData,
}

#[derive(Debug, Deserialize)]
struct DataciteResponseData {
    #[serde(default)]
    id: String,
}

/// Datacite general type for an open access resource type
pub fn general_resource_type(resource_type: &str) -> &'static str {
    match resource_type {
        "Article" | "Book" | "Part of Book" | "Conference Paper" | "Conference Proceedings" | "Journal"
        | "Report" | "Poster" | "Thesis" | "Educational Resource" => "Text",
        "Dataset" => "Dataset",
        "Image" | "Map or Cartographic Material" => "Image",
        "Audio" | "Sound" => "Sound",
        "Video" | "Presentation" => "Audiovisual",
        "Software or Program Code" | "Software" => "Software",
        "Model" => "Model",
        _ => "Other",
    }
}

/// Builds the registrar payload for one request
pub fn build_payload(request: &RegistrationRequest, shoulder: &str, landing_url: String) -> DatacitePayload {
    let mut attributes = match &request.work {
        Work::Etd(work) => etd_attributes(work),
        Work::Open(work) => oa_attributes(work),
    };
    attributes.event = request.action.event_tag().map(str::to_string);
    attributes.doi = request.existing_doi.as_deref().map(bare_doi).unwrap_or_default().to_string();
    attributes.prefix = shoulder.to_string();
    attributes.url = landing_url;
    add_dates(&mut attributes, request.publish_date.as_deref().unwrap_or_default());

    DatacitePayload {
        data: DataciteResource {
            type_name: "dois".to_string(),
            attributes,
        },
    }
}

fn base_attributes(title: &str, abstract_text: &str, keywords: &[String], license: &str, sponsors: &[String]) -> AttributesData {
    AttributesData {
        event: None,
        doi: String::new(),
        prefix: String::new(),
        url: String::new(),
        titles: vec![TitleData { title: title.to_string() }],
        descriptions: if abstract_text.is_empty() {
            Vec::new()
        } else {
            vec![DescriptionData {
                description: abstract_text.to_string(),
                description_type: "Abstract".to_string(),
            }]
        },
        creators: Vec::new(),
        contributors: Vec::new(),
        subjects: keywords.iter().map(|k| SubjectData { subject: k.clone() }).collect(),
        rights_list: if license.is_empty() {
            Vec::new()
        } else {
            vec![RightsData { rights: license.to_string() }]
        },
        funding_references: sponsors.iter().map(|s| FundingData { funder_name: s.clone() }).collect(),
        types: TypeData::default(),
        dates: Vec::new(),
        publication_year: String::new(),
        publisher: PublisherData::uva(),
    }
}

fn etd_attributes(work: &EtdWork) -> AttributesData {
    let mut attributes = base_attributes(&work.title, &work.abstract_text, &work.keywords, &work.license, &work.sponsors);
    attributes.creators = vec![PersonData::from_contributor(&ContributorData::from(&work.author), "")];
    attributes.contributors = person_list(&work.advisors, "RelatedPerson");
    attributes.types = TypeData {
        resource_type: "Dissertation".to_string(),
        resource_type_general: "Text".to_string(),
    };
    attributes
}

fn oa_attributes(work: &OaWork) -> AttributesData {
    let mut attributes = base_attributes(&work.title, &work.abstract_text, &work.keywords, &work.license, &work.sponsors);
    attributes.creators = person_list(&work.authors, "");
    attributes.contributors = person_list(&work.contributors, "Other");
    attributes.types = TypeData {
        resource_type: work.resource_type.clone(),
        resource_type_general: general_resource_type(&work.resource_type).to_string(),
    };
    if !work.publisher.is_empty() && work.publisher != UVA_NAME {
        attributes.publisher = PublisherData {
            name: work.publisher.clone(),
            scheme_uri: String::new(),
            publisher_identifier: String::new(),
            publisher_identifier_scheme: String::new(),
        };
    }
    attributes
}

fn add_dates(attributes: &mut AttributesData, publish_date: &str) {
    if publish_date.is_empty() {
        let year = Utc::now().year();
        info!(year, "empty publish date, using current year as publication year");
        attributes.publication_year = year.to_string();
        return;
    }

    match DateTime::parse_from_rfc3339(publish_date) {
        Ok(parsed) => {
            attributes.dates = vec![DateData {
                date: parsed.format("%Y-%m-%d").to_string(),
                date_type: "Issued".to_string(),
            }];
            attributes.publication_year = parsed.format("%Y").to_string();
        }
        Err(e) => warn!(publish_date, error = %e, "unable to parse publish date"),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct DataciteRegistrar {
    transport: Arc<HttpTransport>,
    config: RegistrarConfig,
    format: DoiFormat,
}

impl DataciteRegistrar {
    pub fn new(transport: Arc<HttpTransport>, config: RegistrarConfig) -> Self {
        let format = config.doi_format();
        Self { transport, config, format }
    }

    fn landing_url(&self, request: &RegistrationRequest) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_work_url.trim_end_matches('/'),
            request.namespace.url_path(),
            request.object_id
        )
    }
}

#[async_trait]
impl IdentifierRegistrar for DataciteRegistrar {
    async fn submit(&self, request: &RegistrationRequest) -> Result<String, RegistrarError> {
        let payload = build_payload(request, self.format.shoulder(), self.landing_url(request));
        let base = self.config.base_url.trim_end_matches('/');
        let outbound = match request.existing_doi.as_deref() {
            None => OutboundRequest::post(format!("{}/dois", base)),
            Some(doi) => OutboundRequest::put(format!("{}/dois/{}", base, bare_doi(doi))),
        };

        let body = serde_json::to_vec(&payload).map_err(|e| RegistrarError::Payload(e.to_string()))?;
        debug!(payload = %String::from_utf8_lossy(&body), "datacite payload");
        let outbound = outbound
            .with_body(body, "application/vnd.api+json")
            .with_header("accept", "application/json")
            .with_basic_auth(&self.config.user, &self.config.password);

        let response = self.transport.send(&outbound).await.map_err(|e| match e {
            TransportError::Status { status, body } => RegistrarError::Rejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            },
            TransportError::Network { message, .. } => RegistrarError::Unavailable(message),
            TransportError::Request(message) => RegistrarError::Payload(message),
        })?;

        let decoded: DataciteResponse =
            serde_json::from_slice(&response).map_err(|e| RegistrarError::InvalidResponse(e.to_string()))?;
        if decoded.data.id.is_empty() {
            return Err(RegistrarError::InvalidResponse("response carries no DOI".to_string()));
        }
        Ok(decoded.data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::DoiAction;
    use crate::domain::sync_config::TransportConfig;
    use crate::domain::work::{StudentData, WorkNamespace};
    use mockito::Matcher;
    use serde_json::json;

    fn etd_work() -> EtdWork {
        EtdWork {
            title: "On Rivers".into(),
            abstract_text: "Water flows.".into(),
            author: StudentData {
                compute_id: "abc1x".into(),
                first_name: "Ada".into(),
                last_name: "Byron".into(),
                orcid: "0000-0002-1825-0097".into(),
                ..Default::default()
            },
            advisors: vec![
                ContributorData {
                    first_name: "Grace".into(),
                    last_name: "Hopper".into(),
                    institution: "Yale".into(),
                    ..Default::default()
                },
                ContributorData::default(),
            ],
            keywords: vec!["hydrology".into()],
            license: "CC BY".into(),
            sponsors: vec!["NSF".into()],
            ..Default::default()
        }
    }

    fn request(action: DoiAction, existing_doi: Option<&str>, publish_date: Option<&str>) -> RegistrationRequest {
        RegistrationRequest {
            action,
            namespace: WorkNamespace::Etd,
            object_id: "oid:1".into(),
            existing_doi: existing_doi.map(str::to_string),
            work: Work::Etd(etd_work()),
            publish_date: publish_date.map(str::to_string),
        }
    }

    #[test]
    fn test_etd_payload() {
        let payload = build_payload(
            &request(DoiAction::Publish, None, Some("2025-05-17T14:00:00Z")),
            "10.18130",
            "https://libra/etd/oid:1".into(),
        );
        let json = serde_json::to_value(&payload).unwrap();
        let attrs = &json["data"]["attributes"];

        assert_eq!(json["data"]["type"], "dois");
        assert_eq!(attrs["event"], "publish");
        assert!(attrs.get("doi").is_none());
        assert_eq!(attrs["prefix"], "10.18130");
        assert_eq!(attrs["url"], "https://libra/etd/oid:1");
        assert_eq!(attrs["descriptions"][0]["descriptionType"], "Abstract");
        assert_eq!(attrs["creators"][0]["name"], "Byron, Ada");
        assert_eq!(attrs["creators"][0]["affiliation"][0]["affiliationIdentifier"], UVA_ROR);
        assert_eq!(
            attrs["creators"][0]["nameIdentifiers"][0]["nameIdentifier"],
            "https://orcid.org/0000-0002-1825-0097"
        );
        // the nameless advisor is dropped
        assert_eq!(attrs["contributors"].as_array().unwrap().len(), 1);
        assert_eq!(attrs["contributors"][0]["contributorType"], "RelatedPerson");
        assert_eq!(attrs["contributors"][0]["affiliation"][0]["name"], "Yale");
        assert_eq!(attrs["types"], json!({"resourceType": "Dissertation", "resourceTypeGeneral": "Text"}));
        assert_eq!(attrs["dates"][0], json!({"date": "2025-05-17", "dateType": "Issued"}));
        assert_eq!(attrs["publicationYear"], "2025");
        assert_eq!(attrs["publisher"]["publisherIdentifierScheme"], "ROR");
        assert_eq!(attrs["fundingReferences"][0]["funderName"], "NSF");
    }

    #[test]
    fn test_update_has_no_event_and_bare_doi() {
        let payload = build_payload(
            &request(DoiAction::Update, Some("https://doi.org/10.18130/xyz"), None),
            "10.18130",
            String::new(),
        );
        assert_eq!(payload.data.attributes.event, None);
        assert_eq!(payload.data.attributes.doi, "10.18130/xyz");
        assert_eq!(payload.data.attributes.publication_year, Utc::now().year().to_string());
        assert!(payload.data.attributes.dates.is_empty());
    }

    #[test]
    fn test_unparsable_date_is_omitted() {
        let payload = build_payload(&request(DoiAction::Register, None, Some("May 2025")), "10.18130", String::new());
        assert!(payload.data.attributes.dates.is_empty());
        assert!(payload.data.attributes.publication_year.is_empty());
    }

    #[test]
    fn test_open_access_resource_types() {
        assert_eq!(general_resource_type("Article"), "Text");
        assert_eq!(general_resource_type("Dataset"), "Dataset");
        assert_eq!(general_resource_type("Something New"), "Other");

        let work = OaWork {
            title: "Field Notes".into(),
            resource_type: "Dataset".into(),
            publisher: "Elsewhere Press".into(),
            authors: vec![ContributorData {
                first_name: "Jo".into(),
                last_name: "March".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let request = RegistrationRequest {
            action: DoiAction::Register,
            namespace: WorkNamespace::Open,
            object_id: "oid:3".into(),
            existing_doi: None,
            work: Work::Open(work),
            publish_date: None,
        };
        let payload = build_payload(&request, "10.18130", String::new());
        assert_eq!(payload.data.attributes.types.resource_type_general, "Dataset");
        assert_eq!(payload.data.attributes.publisher.name, "Elsewhere Press");
        assert!(payload.data.attributes.publisher.publisher_identifier.is_empty());
        assert_eq!(payload.data.attributes.creators.len(), 1);
    }

    fn registrar(server: &mockito::Server) -> DataciteRegistrar {
        let transport = Arc::new(HttpTransport::new(&TransportConfig::default()).unwrap());
        DataciteRegistrar::new(
            transport,
            RegistrarConfig {
                base_url: server.url(),
                shoulder: "doi:10.18130".into(),
                user: "uva".into(),
                password: "secret".into(),
                doi_base_url: "https://doi.org".into(),
                public_work_url: "https://libra.example.edu/".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_posts() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/dois")
            .match_header("content-type", "application/vnd.api+json")
            .match_header("authorization", "Basic dXZhOnNlY3JldA==")
            .match_body(Matcher::PartialJson(json!({
                "data": { "attributes": {
                    "event": "register",
                    "prefix": "10.18130",
                    "url": "https://libra.example.edu/etd/oid:1"
                }}
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":"10.18130/new1","type":"dois"}}"#)
            .create_async()
            .await;

        let doi = registrar(&server).submit(&request(DoiAction::Register, None, None)).await.unwrap();
        assert_eq!(doi, "10.18130/new1");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_existing_doi_puts() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/dois/10.18130/abc")
            .match_body(Matcher::PartialJson(json!({ "data": { "attributes": { "doi": "10.18130/abc" }}})))
            .with_status(200)
            .with_body(r#"{"data":{"id":"10.18130/abc"}}"#)
            .create_async()
            .await;

        let doi = registrar(&server)
            .submit(&request(DoiAction::Publish, Some("https://doi.org/10.18130/abc"), None))
            .await
            .unwrap();
        assert_eq!(doi, "10.18130/abc");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/dois")
            .with_status(422)
            .with_body(r#"{"errors":[{"title":"Url can't be blank"}]}"#)
            .create_async()
            .await;

        let err = registrar(&server).submit(&request(DoiAction::Register, None, None)).await.unwrap_err();
        match err {
            RegistrarError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("Url can't be blank"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_without_id() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/dois")
            .with_status(201)
            .with_body(r#"{"data":{}}"#)
            .create_async()
            .await;

        let err = registrar(&server).submit(&request(DoiAction::Register, None, None)).await.unwrap_err();
        assert!(matches!(err, RegistrarError::InvalidResponse(_)));
    }
}
