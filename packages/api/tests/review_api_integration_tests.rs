// ABOUTME: Integration tests for the requirement review HTTP API
// ABOUTME: Drives the full router over real HTTP against a temp SQLite database

mod common;

use common::{data, error_code, setup_test_server, TestContext};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Team {
    tester: String,
    qa: String,
    pm: String,
    dev: String,
}

async fn team(ctx: &TestContext) -> Team {
    Team {
        tester: ctx.create_user("Tess", "tess@example.com", "TESTER").await,
        qa: ctx.create_user("Quinn", "quinn@example.com", "QA_LEAD").await,
        pm: ctx.create_user("Pat", "pat@example.com", "PM").await,
        dev: ctx.create_user("Dana", "dana@example.com", "DEVELOPER").await,
    }
}

#[tokio::test]
async fn test_health() {
    let ctx = setup_test_server().await;

    let response = ctx.get_anonymous("/api/health").await;
    assert_eq!(response.status(), 200);

    let body = data(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_missing_user_header_is_401() {
    let ctx = setup_test_server().await;

    let response = ctx
        .client
        .post(format!("{}/api/projects/proj-1/requirements", ctx.base_url))
        .json(&json!({ "title": "Login" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(error_code(response).await, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_full_lifecycle() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Password login").await;

    let submitted = data(ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await).await;
    assert_eq!(submitted["requirement"]["status"], "PENDING_REVIEW");
    assert_eq!(submitted["action"]["action"], "SUBMIT");

    let approved = data(
        ctx.post(
            &format!("/api/requirements/{}/approve", id),
            &t.qa,
            Some(json!({ "comment": "  looks good  " })),
        )
        .await,
    )
    .await;
    assert_eq!(approved["requirement"]["status"], "APPROVED");
    assert_eq!(approved["action"]["reviewerId"], t.qa.as_str());
    assert!(approved["requirement"]["reviewedAt"].is_string());
    assert_eq!(approved["action"]["comment"], "looks good");

    let started = ctx.post(&format!("/api/requirements/{}/start", id), &t.dev, None).await;
    assert_eq!(started.status(), 200);
    let completed = ctx.post(&format!("/api/requirements/{}/complete", id), &t.dev, None).await;
    assert_eq!(completed.status(), 200);

    let accepted = data(
        ctx.post(
            &format!("/api/requirements/{}/accept", id),
            &t.pm,
            Some(json!({ "notes": "ship it" })),
        )
        .await,
    )
    .await;
    assert_eq!(accepted["status"], "COMPLETED");
    assert_eq!(accepted["acceptanceStatus"], "ACCEPTED");
    assert_eq!(accepted["acceptanceNotes"], "ship it");

    let history = data(ctx.get(&format!("/api/requirements/{}/history", id), &t.pm).await).await;
    let kinds: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["SUBMIT", "APPROVE", "START", "COMPLETE"]);
}

#[tokio::test]
async fn test_rule_violations_map_to_status_codes() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Export CSV").await;

    // Approving a draft
    let response = ctx.post(&format!("/api/requirements/{}/approve", id), &t.qa, None).await;
    assert_eq!(response.status(), 409);
    assert_eq!(error_code(response).await, "INVALID_TRANSITION");

    // Someone other than the author submitting
    let response = ctx.post(&format!("/api/requirements/{}/submit", id), &t.dev, None).await;
    assert_eq!(response.status(), 403);
    assert_eq!(error_code(response).await, "UNAUTHORIZED");

    ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;

    // A developer cannot review
    let response = ctx.post(&format!("/api/requirements/{}/approve", id), &t.dev, None).await;
    assert_eq!(response.status(), 403);

    // Rejection needs a reason
    let response = ctx
        .post(
            &format!("/api/requirements/{}/reject", id),
            &t.qa,
            Some(json!({ "comment": "   " })),
        )
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(error_code(response).await, "COMMENT_REQUIRED");

    // Nothing was applied by the failed calls
    let current = data(ctx.get(&format!("/api/requirements/{}", id), &t.qa).await).await;
    assert_eq!(current["status"], "PENDING_REVIEW");
    assert_eq!(current["version"], 2);
}

#[tokio::test]
async fn test_unknown_requirement_is_404() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;

    let response = ctx.post("/api/requirements/req-missing/submit", &t.tester, None).await;
    assert_eq!(response.status(), 404);
    assert_eq!(error_code(response).await, "NOT_FOUND");

    let history = data(ctx.get("/api/requirements/req-missing/history", &t.tester).await).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_reject_then_resubmit_with_assigned_reviewer() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Audit log").await;

    let assigned = data(
        ctx.put(
            &format!("/api/requirements/{}/reviewer", id),
            &t.tester,
            json!({ "reviewerId": t.qa }),
        )
        .await,
    )
    .await;
    assert_eq!(assigned["reviewerId"], t.qa.as_str());

    ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;

    // Only the assigned reviewer (or an admin) may decide
    let response = ctx.post(&format!("/api/requirements/{}/approve", id), &t.pm, None).await;
    assert_eq!(response.status(), 403);

    let rejected = data(
        ctx.post(
            &format!("/api/requirements/{}/reject", id),
            &t.qa,
            Some(json!({ "comment": "missing retention rules" })),
        )
        .await,
    )
    .await;
    assert_eq!(rejected["requirement"]["status"], "DRAFT");

    // Back in draft the author can edit again
    let edited = ctx
        .put(
            &format!("/api/requirements/{}", id),
            &t.tester,
            json!({ "description": "Keep entries for 90 days" }),
        )
        .await;
    assert_eq!(edited.status(), 200);

    let resubmitted = ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;
    assert_eq!(resubmitted.status(), 200);
}

#[tokio::test]
async fn test_edit_outside_draft_is_409() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Dark mode").await;
    ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;

    let response = ctx
        .put(&format!("/api/requirements/{}", id), &t.tester, json!({ "title": "Dark theme" }))
        .await;
    assert_eq!(response.status(), 409);
    assert_eq!(error_code(response).await, "INVALID_STATE");

    let response = ctx.delete(&format!("/api/requirements/{}", id), &t.tester).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_delete_draft_hides_it_from_listing() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let keep = ctx.create_requirement("proj-1", &t.tester, "Keep me").await;
    let drop = ctx.create_requirement("proj-1", &t.tester, "Drop me").await;

    let response = ctx.delete(&format!("/api/requirements/{}", drop), &t.tester).await;
    assert_eq!(response.status(), 200);

    let response = ctx.get(&format!("/api/requirements/{}", drop), &t.tester).await;
    assert_eq!(response.status(), 404);

    let listed = data(ctx.get("/api/projects/proj-1/requirements", &t.tester).await).await;
    assert_eq!(listed["pagination"]["totalItems"], 1);
    assert_eq!(listed["data"][0]["id"], keep.as_str());
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    for n in 0..3 {
        ctx.create_requirement("proj-1", &t.tester, &format!("Draft {}", n)).await;
    }
    let pending = ctx.create_requirement("proj-1", &t.tester, "Pending").await;
    ctx.post(&format!("/api/requirements/{}/submit", pending), &t.tester, None).await;
    ctx.create_requirement("proj-2", &t.tester, "Elsewhere").await;

    let page = data(ctx.get("/api/projects/proj-1/requirements?page=2&limit=3", &t.tester).await).await;
    assert_eq!(page["pagination"]["totalItems"], 4);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    let filtered = data(
        ctx.get("/api/projects/proj-1/requirements?status=PENDING_REVIEW", &t.tester)
            .await,
    )
    .await;
    assert_eq!(filtered["pagination"]["totalItems"], 1);
    assert_eq!(filtered["data"][0]["id"], pending.as_str());
}

#[tokio::test]
async fn test_out_of_range_page_returns_empty_page() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    ctx.create_requirement("proj-1", &t.tester, "Only one").await;

    let response = ctx
        .get(
            "/api/projects/proj-1/requirements?page=9223372036854775807&limit=100",
            &t.tester,
        )
        .await;
    assert_eq!(response.status(), 200);

    let page = data(response).await;
    assert_eq!(page["data"], json!([]));
    assert_eq!(page["pagination"]["totalItems"], 1);
    assert_eq!(page["pagination"]["hasNextPage"], false);

    let inbox = ctx
        .get(
            &format!("/api/users/{}/notifications?page=9223372036854775807", t.qa),
            &t.qa,
        )
        .await;
    assert_eq!(inbox.status(), 200);
}

#[tokio::test]
async fn test_allowed_actions_depend_on_caller() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Bulk import").await;
    ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;

    let for_qa = data(ctx.get(&format!("/api/requirements/{}/actions", id), &t.qa).await).await;
    assert_eq!(for_qa["actions"], json!(["APPROVE", "REJECT", "REQUEST_CHANGES"]));
    assert_eq!(for_qa["canDecideAcceptance"], true);

    let for_dev = data(ctx.get(&format!("/api/requirements/{}/actions", id), &t.dev).await).await;
    assert_eq!(for_dev["actions"], json!([]));
    assert_eq!(for_dev["canEdit"], false);
}

#[tokio::test]
async fn test_acceptance_rules() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let id = ctx.create_requirement("proj-1", &t.tester, "Reports").await;

    // A draft cannot be accepted
    let response = ctx.post(&format!("/api/requirements/{}/accept", id), &t.pm, None).await;
    assert_eq!(response.status(), 409);

    ctx.post(&format!("/api/requirements/{}/submit", id), &t.tester, None).await;

    let response = ctx.post(&format!("/api/requirements/{}/accept", id), &t.dev, None).await;
    assert_eq!(response.status(), 403);

    let response = ctx
        .post(&format!("/api/requirements/{}/reject-acceptance", id), &t.pm, None)
        .await;
    assert_eq!(response.status(), 422);

    let rejected = data(
        ctx.post(
            &format!("/api/requirements/{}/reject-acceptance", id),
            &t.pm,
            Some(json!({ "notes": "does not cover exports" })),
        )
        .await,
    )
    .await;
    assert_eq!(rejected["acceptanceStatus"], "REJECTED");
    assert_eq!(rejected["status"], "PENDING_REVIEW");

    // The verdict is final
    let response = ctx.post(&format!("/api/requirements/{}/accept", id), &t.pm, None).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_role_changes_are_admin_only() {
    let ctx = setup_test_server().await;
    let t = team(&ctx).await;
    let admin = ctx.create_user("Ada", "ada@example.com", "ADMIN").await;

    let response = ctx
        .put(&format!("/api/users/{}/role", t.dev), &t.pm, json!({ "role": "QA_LEAD" }))
        .await;
    assert_eq!(response.status(), 403);

    let updated = data(
        ctx.put(&format!("/api/users/{}/role", t.dev), &admin, json!({ "role": "QA_LEAD" }))
            .await,
    )
    .await;
    assert_eq!(updated["role"], "QA_LEAD");

    let reviewers = data(ctx.get("/api/users?roles=QA_LEAD", &admin).await).await;
    assert_eq!(reviewers.as_array().unwrap().len(), 2);

    let response = ctx.get("/api/users?roles=WIZARD", &admin).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_duplicate_email_is_409() {
    let ctx = setup_test_server().await;
    ctx.create_user("Tess", "tess@example.com", "TESTER").await;

    let response = ctx
        .client
        .post(format!("{}/api/users", ctx.base_url))
        .json(&json!({ "name": "Other", "email": "TESS@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    assert_eq!(error_code(response).await, "DUPLICATE");
}
