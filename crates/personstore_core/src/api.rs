//! Transport-free request handlers for the `/persons` resource.
//!
//! # Responsibility
//! - Turn raw request inputs (JSON body text, query strings, path ids) into
//!   service calls.
//! - Shape results into a status code plus JSON body, ready for any HTTP
//!   server or CLI to emit as-is.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes an envelope.
//! - `NotFound` maps to 404; every other error maps to 400.
//!
//! | route | success | failure |
//! |---|---|---|
//! | `POST /persons` | 200 `{person}` | 400 `{error}` |
//! | `GET /persons?page=&size=` | 200 `{persons}` | 400 `{error}` |
//! | `GET /persons/:id` | 200 `{person}` | 404 `{message}` |
//! | `PUT /persons/:id` | 200 `{person}` | 400 `{error}` |
//! | `DELETE /persons/:id` | 200 `{message}` | 404 `{error}` |

use crate::model::person::{PageRequest, PersonDraft, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::repo::person_repo::{PersonRepository, RepoError};
use crate::service::person_service::PersonService;
use serde_json::{json, Value};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;

const PERSON_NOT_FOUND_MESSAGE: &str = "person not found";
const PERSON_DELETED_MESSAGE: &str = "person deleted successfully";

/// Status code and JSON body of one handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: STATUS_OK,
            body,
        }
    }

    fn error(status: u16, message: impl ToString) -> Self {
        Self {
            status,
            body: json!({ "error": message.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// `POST /persons`
pub fn create_person<R: PersonRepository>(
    service: &PersonService<R>,
    body: &str,
) -> ApiResponse {
    let draft = match parse_draft(body) {
        Ok(draft) => draft,
        Err(err) => return ApiResponse::error(STATUS_BAD_REQUEST, err),
    };
    match service.create_person(&draft) {
        Ok(person) => ApiResponse::ok(json!({ "person": person })),
        Err(err) => ApiResponse::error(status_for(&err), err),
    }
}

/// `GET /persons?page=&size=`
///
/// Absent or blank query values fall back to page 1 and size 10.
pub fn list_persons<R: PersonRepository>(
    service: &PersonService<R>,
    page: Option<&str>,
    size: Option<&str>,
) -> ApiResponse {
    let request = match parse_page_request(page, size) {
        Ok(request) => request,
        Err(message) => return ApiResponse::error(STATUS_BAD_REQUEST, message),
    };
    match service.list_persons(request) {
        Ok(persons) => ApiResponse::ok(json!({ "persons": persons })),
        Err(err) => ApiResponse::error(STATUS_BAD_REQUEST, err),
    }
}

/// `GET /persons/:id`
pub fn get_person<R: PersonRepository>(service: &PersonService<R>, id: &str) -> ApiResponse {
    match service.get_person(id) {
        Ok(person) => ApiResponse::ok(json!({ "person": person })),
        Err(err) if err.is_not_found() => ApiResponse {
            status: STATUS_NOT_FOUND,
            body: json!({ "message": PERSON_NOT_FOUND_MESSAGE }),
        },
        Err(err) => ApiResponse::error(STATUS_BAD_REQUEST, err),
    }
}

/// `PUT /persons/:id`
///
/// Missing ids are reported as 400, like any other failed update.
pub fn update_person<R: PersonRepository>(
    service: &PersonService<R>,
    id: &str,
    body: &str,
) -> ApiResponse {
    let draft = match parse_draft(body) {
        Ok(draft) => draft,
        Err(err) => return ApiResponse::error(STATUS_BAD_REQUEST, err),
    };
    match service.update_person(id, draft) {
        Ok(person) => ApiResponse::ok(json!({ "person": person })),
        Err(err) => ApiResponse::error(STATUS_BAD_REQUEST, err),
    }
}

/// `DELETE /persons/:id`
pub fn delete_person<R: PersonRepository>(service: &PersonService<R>, id: &str) -> ApiResponse {
    match service.delete_person(id) {
        Ok(()) => ApiResponse::ok(json!({ "message": PERSON_DELETED_MESSAGE })),
        Err(err) => ApiResponse::error(status_for(&err), err),
    }
}

fn status_for(err: &RepoError) -> u16 {
    if err.is_not_found() {
        STATUS_NOT_FOUND
    } else {
        STATUS_BAD_REQUEST
    }
}

fn parse_draft(body: &str) -> Result<PersonDraft, RepoError> {
    Ok(serde_json::from_str(body)?)
}

fn parse_page_request(page: Option<&str>, size: Option<&str>) -> Result<PageRequest, String> {
    Ok(PageRequest::new(
        parse_query_number("page", page, DEFAULT_PAGE)?,
        parse_query_number("size", size, DEFAULT_PAGE_SIZE)?,
    ))
}

fn parse_query_number(name: &str, raw: Option<&str>, default: u32) -> Result<u32, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| format!("invalid `{name}` value `{value}`: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        create_person, delete_person, get_person, list_persons, parse_query_number,
        update_person, STATUS_BAD_REQUEST, STATUS_NOT_FOUND, STATUS_OK,
    };
    use crate::backend::{BackendError, BackendResult, HashBackend, HashEntry, MemoryHashBackend};
    use crate::repo::person_repo::HashPersonRepository;
    use crate::service::person_service::PersonService;

    fn service() -> PersonService<HashPersonRepository<MemoryHashBackend>> {
        PersonService::new(HashPersonRepository::new(MemoryHashBackend::new()))
    }

    fn created_id(service: &PersonService<HashPersonRepository<MemoryHashBackend>>) -> String {
        let response = create_person(service, r#"{"name":"Ann","age":30}"#);
        assert_eq!(response.status, STATUS_OK);
        response.body["person"]["id"]
            .as_str()
            .expect("created person should carry an id")
            .to_string()
    }

    #[test]
    fn create_returns_person_envelope() {
        let service = service();
        let response = create_person(&service, r#"{"id":"ignored","name":"Ann","age":30}"#);
        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["person"]["name"], "Ann");
        assert_eq!(response.body["person"]["age"], 30);
        assert_ne!(response.body["person"]["id"], "ignored");
    }

    #[test]
    fn create_rejects_malformed_body() {
        let service = service();
        let response = create_person(&service, r#"{"name":"Ann"}"#);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(response.body["error"].is_string());
    }

    #[test]
    fn get_missing_returns_not_found_message() {
        let service = service();
        let response = get_person(&service, "missing");
        assert_eq!(response.status, STATUS_NOT_FOUND);
        assert_eq!(response.body["message"], "person not found");
    }

    #[test]
    fn update_replaces_fields() {
        let service = service();
        let id = created_id(&service);

        let response = update_person(&service, &id, r#"{"name":"Ann","age":31}"#);
        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["person"]["id"], id.as_str());
        assert_eq!(response.body["person"]["age"], 31);
    }

    #[test]
    fn update_missing_is_bad_request() {
        let service = service();
        let response = update_person(&service, "missing", r#"{"name":"Ann","age":31}"#);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(!response.is_success());
    }

    #[test]
    fn delete_then_delete_again() {
        let service = service();
        let id = created_id(&service);

        let first = delete_person(&service, &id);
        assert_eq!(first.status, STATUS_OK);
        assert_eq!(first.body["message"], "person deleted successfully");

        let second = delete_person(&service, &id);
        assert_eq!(second.status, STATUS_NOT_FOUND);
        assert!(second.body["error"].is_string());
    }

    /// Backend that fails every command.
    struct DownBackend;

    impl HashBackend for DownBackend {
        fn hash_set(&self, _: &str, _: &str, _: &str) -> BackendResult<()> {
            Err(BackendError::LockPoisoned("down"))
        }

        fn hash_get(&self, _: &str, _: &str) -> BackendResult<Option<String>> {
            Err(BackendError::LockPoisoned("down"))
        }

        fn hash_get_all(&self, _: &str) -> BackendResult<Vec<HashEntry>> {
            Err(BackendError::LockPoisoned("down"))
        }

        fn hash_delete(&self, _: &str, _: &str) -> BackendResult<u64> {
            Err(BackendError::LockPoisoned("down"))
        }
    }

    #[test]
    fn backend_failures_are_bad_requests_not_not_found() {
        let service = PersonService::new(HashPersonRepository::new(DownBackend));

        let deleted = delete_person(&service, "any");
        assert_eq!(deleted.status, STATUS_BAD_REQUEST);
        assert!(deleted.body["error"]
            .as_str()
            .expect("delete failure should carry an error string")
            .contains("lock poisoned"));

        let fetched = get_person(&service, "any");
        assert_eq!(fetched.status, STATUS_BAD_REQUEST);
        assert!(fetched.body["error"].is_string());
        assert!(fetched.body.get("message").is_none());

        let listed = list_persons(&service, None, None);
        assert_eq!(listed.status, STATUS_BAD_REQUEST);
        assert!(listed.body["error"].is_string());
    }

    #[test]
    fn list_defaults_and_validation() {
        let service = service();
        for _ in 0..12 {
            created_id(&service);
        }

        let defaults = list_persons(&service, None, Some(" "));
        assert_eq!(defaults.status, STATUS_OK);
        assert_eq!(defaults.body["persons"].as_array().unwrap().len(), 10);

        let second = list_persons(&service, Some("2"), None);
        assert_eq!(second.body["persons"].as_array().unwrap().len(), 2);

        assert_eq!(
            list_persons(&service, Some("abc"), None).status,
            STATUS_BAD_REQUEST
        );
        assert_eq!(
            list_persons(&service, Some("0"), None).status,
            STATUS_BAD_REQUEST
        );
        assert_eq!(
            list_persons(&service, None, Some("-1")).status,
            STATUS_BAD_REQUEST
        );
    }

    #[test]
    fn query_number_defaults_when_absent() {
        assert_eq!(parse_query_number("page", None, 1), Ok(1));
        assert_eq!(parse_query_number("size", Some(" 7 "), 10), Ok(7));
        assert!(parse_query_number("size", Some("x"), 10)
            .unwrap_err()
            .contains("`size`"));
    }
}
