//! Transport-agnostic JSON responses.
//!
//! Every operation answers `{"success": true, ...}` or
//! `{"success": false, "error": "...", "code": "..."}` together with a
//! suggested HTTP status, so an HTTP handler only has to copy both out.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::family::{FamilyError, FamilyGraph, FamilyResult};
use crate::models::{AccessLevel, NewFamilyRequest};

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// 200 with `success: true` merged into `fields`.
    pub fn ok(fields: Value) -> Self {
        let mut body = json!({ "success": true });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), fields) {
            target.extend(extra);
        }
        Self { status: 200, body }
    }

    /// Failure envelope for an error.
    pub fn error(error: &FamilyError) -> Self {
        Self {
            status: error.http_status(),
            body: json!({
                "success": false,
                "error": error.to_string(),
                "code": error.code(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.body["success"] == Value::Bool(true)
    }
}

fn respond<T>(result: FamilyResult<T>, render: impl FnOnce(T) -> Value) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::ok(render(value)),
        Err(e) => {
            if matches!(e, FamilyError::Dependency(_)) {
                tracing::error!(error = %e, "Family operation failed");
            }
            ApiResponse::error(&e)
        }
    }
}

/// Parse a JSON body. A missing field is reported by name, anything else
/// as an invalid body.
fn parse_body<T: for<'de> Deserialize<'de>>(body: &Value) -> FamilyResult<T> {
    serde_json::from_value(body.clone()).map_err(|e| {
        let message = e.to_string();
        match missing_field(&message) {
            Some(field) => FamilyError::Validation(field.to_string()),
            None => FamilyError::InvalidBody(message),
        }
    })
}

/// Field name from serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

#[derive(Debug, Deserialize)]
struct IdBody {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelabelBody {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    new_relationship: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessBody {
    #[serde(default)]
    user_uid: String,
    #[serde(default)]
    member_email: String,
    #[serde(default)]
    access_level: AccessLevel,
    #[serde(default)]
    is_emergency_contact: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveMemberBody {
    #[serde(default)]
    user_uid: String,
    #[serde(default)]
    member_uid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationBody {
    #[serde(default)]
    notification_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdBody {
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct UidBody {
    #[serde(default)]
    uid: String,
}

/// JSON entry points over a [`FamilyGraph`].
pub struct FamilyApi<'a> {
    graph: FamilyGraph<'a>,
}

impl<'a> FamilyApi<'a> {
    pub fn new(graph: FamilyGraph<'a>) -> Self {
        Self { graph }
    }

    /// Body: `{fromUid, fromEmail, toUid?, toEmail?, toName?, relationship}`.
    pub fn send_request(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<NewFamilyRequest>(body)
            .and_then(|input| self.graph.create_request(input));
        respond(result, |request| json!({ "request": request }))
    }

    /// Body: `{id}`.
    pub fn accept_request(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<IdBody>(body).and_then(|b| self.graph.accept_request(&b.id));
        respond(result, |_| json!({ "message": "Request accepted" }))
    }

    /// Body: `{id}`.
    pub fn reject_request(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<IdBody>(body).and_then(|b| self.graph.reject_request(&b.id));
        respond(result, |_| json!({ "message": "Request rejected" }))
    }

    pub fn get_network(&self, uid: &str) -> ApiResponse {
        respond(self.graph.get_network(uid), |network| {
            json!({
                "network": {
                    "userUid": network.user_uid,
                    "members": network.members,
                }
            })
        })
    }

    pub fn get_requests(&self, email: &str) -> ApiResponse {
        respond(self.graph.get_requests(email), |lists| {
            json!({ "sent": lists.sent, "received": lists.received })
        })
    }

    /// Body: `{requestId, newRelationship}`.
    pub fn update_relationship(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<RelabelBody>(body)
            .and_then(|b| self.graph.update_relationship(&b.request_id, &b.new_relationship));
        respond(result, |_| {
            json!({ "message": "Relationship updated successfully" })
        })
    }

    /// Body: `{userUid, memberEmail, accessLevel, isEmergencyContact}`.
    pub fn update_member_access(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<AccessBody>(body).and_then(|b| {
            self.graph.update_member_access(
                &b.user_uid,
                &b.member_email,
                b.access_level,
                b.is_emergency_contact,
            )
        });
        respond(result, |updated| json!({ "updated": updated }))
    }

    /// Body: `{uid}`.
    pub fn cleanup_duplicates(&self, body: &Value) -> ApiResponse {
        let result =
            parse_body::<UidBody>(body).and_then(|b| self.graph.cleanup_duplicates(&b.uid));
        respond(result, |removed| json!({ "removed": removed }))
    }

    /// Body: `{userUid, memberUid}`. `memberUid` may also be the member's email.
    pub fn remove_member(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<RemoveMemberBody>(body)
            .and_then(|b| self.graph.remove_member(&b.user_uid, &b.member_uid));
        respond(result, |_| {
            json!({ "message": "Family member disabled", "softDelete": true })
        })
    }

    /// Body: `{notificationId}`.
    pub fn mark_notification_read(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<NotificationBody>(body)
            .and_then(|b| self.graph.mark_notification_read(&b.notification_id));
        respond(result, |_| json!({ "message": "Notification marked as read" }))
    }

    /// Body: `{userId}`.
    pub fn mark_all_notifications_read(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<UserIdBody>(body)
            .and_then(|b| self.graph.mark_all_notifications_read(&b.user_id));
        respond(result, |updated| {
            json!({
                "message": format!("Marked {} notifications as read", updated),
                "updated": updated,
            })
        })
    }

    /// Body: `{notificationId}`.
    pub fn delete_notification(&self, body: &Value) -> ApiResponse {
        let result = parse_body::<NotificationBody>(body)
            .and_then(|b| self.graph.delete_notification(&b.notification_id));
        respond(result, |_| json!({ "message": "Notification disabled" }))
    }

    pub fn get_notifications(&self, user_id: &str, limit: usize) -> ApiResponse {
        respond(
            self.graph.list_notifications(user_id, limit),
            |notifications| {
                let total = notifications.len();
                json!({ "notifications": notifications, "total": total })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_send_request_envelope() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.send_request(&json!({
            "fromUid": "u1",
            "fromEmail": "alice@x.com",
            "toEmail": "bob@x.com",
            "relationship": "Friend"
        }));
        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.body["request"]["status"], "pending");
        assert_eq!(response.body["request"]["toEmail"], "bob@x.com");
    }

    #[test]
    fn test_missing_fields_are_400() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.send_request(&json!({ "fromUid": "u1" }));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["code"], "validation");

        let response = api.accept_request(&json!({}));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_body_errors_read_cleanly() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.send_request(&json!({ "fromUid": "u1", "relationship": "Friend" }));
        assert_eq!(response.body["error"], "Missing required field: fromEmail");

        let response = api.send_request(&json!({
            "fromUid": "u1",
            "fromEmail": "alice@x.com",
            "toEmail": "bob@x.com",
            "relationship": 7
        }));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["code"], "validation");
        let error = response.body["error"].as_str().unwrap();
        assert!(error.starts_with("Invalid request body: invalid type"), "{}", error);
    }

    #[test]
    fn test_storage_failure_is_500() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("DROP TABLE notifications;").unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.get_notifications("bob@x.com", 10);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["code"], "dependency");
    }

    #[test]
    fn test_notification_envelopes() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));
        for from in ["alice@x.com", "carol@x.com"] {
            api.send_request(&json!({
                "fromUid": from,
                "fromEmail": from,
                "toEmail": "bob@x.com",
                "relationship": "Friend"
            }));
        }

        let listed = api.get_notifications("bob@x.com", 0);
        let first_id = listed.body["notifications"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let read = api.mark_notification_read(&json!({ "notificationId": &first_id }));
        assert_eq!(read.body["message"], "Notification marked as read");

        let all = api.mark_all_notifications_read(&json!({ "userId": "bob@x.com" }));
        assert_eq!(all.body["message"], "Marked 1 notifications as read");
        assert_eq!(all.body["updated"], 1);

        let deleted = api.delete_notification(&json!({ "notificationId": &first_id }));
        assert_eq!(deleted.body["message"], "Notification disabled");
        assert_eq!(api.get_notifications("bob@x.com", 0).body["total"], 1);

        let missing = api.mark_notification_read(&json!({}));
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["error"], "Missing required field: notificationId");
    }

    #[test]
    fn test_conflict_is_409() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));
        let body = json!({
            "fromUid": "u1",
            "fromEmail": "alice@x.com",
            "toEmail": "bob@x.com",
            "relationship": "Friend"
        });

        assert!(api.send_request(&body).is_success());
        let response = api.send_request(&body);
        assert_eq!(response.status, 409);
        assert_eq!(response.body["error"], "Request already pending");
        assert_eq!(response.body["code"], "conflict");
    }

    #[test]
    fn test_empty_network_envelope() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.get_network("u42");
        assert_eq!(
            response.body,
            json!({ "success": true, "network": { "userUid": "u42", "members": [] } })
        );
    }

    #[test]
    fn test_accept_unknown_request_is_404() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let response = api.accept_request(&json!({ "id": "nope" }));
        assert_eq!(response.status, 404);
        assert_eq!(response.body["code"], "not_found");
    }

    #[test]
    fn test_full_flow_through_api() {
        let db = Database::open_in_memory().unwrap();
        let api = FamilyApi::new(FamilyGraph::new(&db));

        let created = api.send_request(&json!({
            "fromUid": "u1",
            "fromEmail": "alice@x.com",
            "toUid": "u2",
            "toEmail": "bob@x.com",
            "relationship": "Aunt"
        }));
        let id = created.body["request"]["id"].as_str().unwrap().to_string();

        let received = api.get_requests("bob@x.com");
        assert_eq!(received.body["received"].as_array().unwrap().len(), 1);

        let accepted = api.accept_request(&json!({ "id": id }));
        assert_eq!(accepted.body["message"], "Request accepted");

        let network = api.get_network("u1");
        assert_eq!(
            network.body["network"]["members"][0]["relationship"],
            "Nephew/Niece"
        );

        let access = api.update_member_access(&json!({
            "userUid": "u1",
            "memberEmail": "bob@x.com",
            "accessLevel": "emergency",
            "isEmergencyContact": true
        }));
        assert_eq!(access.body["updated"], 1);

        let cleanup = api.cleanup_duplicates(&json!({ "uid": "u1" }));
        assert_eq!(cleanup.body["removed"], 0);

        let removed = api.remove_member(&json!({ "userUid": "u1", "memberUid": "u2" }));
        assert_eq!(removed.body["softDelete"], true);
        assert_eq!(
            api.get_network("u1").body["network"]["members"],
            json!([])
        );

        let notifications = api.get_notifications("bob@x.com", 10);
        assert_eq!(notifications.body["total"], 1);

        let relabel = api.update_relationship(&json!({
            "requestId": id,
            "newRelationship": "Uncle"
        }));
        assert!(relabel.is_success());
    }
}
