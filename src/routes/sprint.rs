//! HTTP routes for the Sprint onboarding flow
//!
//! - GET  /api/sprint/steps               - Questionnaire step catalog
//! - POST /api/sprint/profile             - Submit answers, generate tasks
//! - GET  /api/sprint/tasks               - The member's generated tasks
//! - PUT  /api/sprint/tasks/{task}/progress - Upsert progress on one task
//! - GET  /api/sprint/status              - Completion summary

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::Role;
use crate::db::schemas::{
    FounderProfileDoc, SprintTaskDoc, TaskKey, TaskProgressDoc, PROFILE_COLLECTION,
    TASK_COLLECTION, TASK_PROGRESS_COLLECTION,
};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::sprint::{
    build_profile, ensure_tasks_generated, progress_filter, progress_update_doc, signup_steps,
    Answer, AnswerSheet, ProgressUpdate, StepInput,
};

#[derive(Debug, Serialize)]
struct StepView {
    id: crate::sprint::StepId,
    prompt: &'static str,
    input: StepInput,
}

#[derive(Debug, Deserialize)]
struct ProfileSubmission {
    answers: Vec<Answer>,
}

#[derive(Debug, Serialize)]
struct TaskView {
    task: String,
    title: String,
    description: String,
    order: i32,
    requires_upload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<crate::db::schemas::ChoiceQuestion>,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_link: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusView {
    total_tasks: usize,
    completed_tasks: usize,
    percent_complete: u32,
    profile_submitted: bool,
}

/// Dispatch /api/sprint/* requests
pub async fn handle_sprint_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/sprint/steps") => Some(handle_steps()),
        (Method::POST, "/api/sprint/profile") => Some(handle_submit_profile(req, state).await),
        (Method::GET, "/api/sprint/tasks") => Some(handle_list_tasks(req, state).await),
        (Method::GET, "/api/sprint/status") => Some(handle_status(req, state).await),
        (Method::PUT, p) => {
            let task = p
                .strip_prefix("/api/sprint/tasks/")
                .and_then(|rest| rest.strip_suffix("/progress"))?
                .to_string();
            Some(handle_progress(req, state, &task).await)
        }
        _ => None,
    }
}

/// GET /api/sprint/steps
///
/// The catalog is public so the signup form can render before login.
/// Branch rules stay server-side; clients submit the full answer list
/// and the server replays it.
fn handle_steps() -> Response<BoxBody> {
    let steps: Vec<StepView> = signup_steps()
        .into_iter()
        .map(|s| StepView {
            id: s.id,
            prompt: s.prompt,
            input: s.input,
        })
        .collect();

    json_response(StatusCode::OK, &steps)
}

/// POST /api/sprint/profile
async fn handle_submit_profile(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: ProfileSubmission = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    // Replay the submitted answers against the branch rules; a sheet that
    // doesn't walk cleanly to the end is rejected as a whole.
    let steps = signup_steps();
    let sheet = match AnswerSheet::replay(&steps, &body.answers) {
        Ok(s) => s,
        Err(reason) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid questionnaire walk: {}", reason),
                "INVALID_ANSWERS",
            )
        }
    };

    let profile = match build_profile(&sheet, &claims.sub) {
        Ok(p) => p,
        Err(e) => return internal_error(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let profiles = match mongo
        .collection::<FounderProfileDoc>(PROFILE_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    // The profile is write-once: tasks derive from it, so later edits
    // would desynchronize the generated task list.
    match profiles.find_one(doc! { "member_id": &claims.sub }).await {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::CONFLICT,
                "Sprint profile already submitted",
                "PROFILE_EXISTS",
            )
        }
        Ok(None) => {}
        Err(e) => return internal_error(&e),
    }

    if let Err(e) = profiles.insert_one(profile.clone()).await {
        if e.is_duplicate_key() {
            return error_response(
                StatusCode::CONFLICT,
                "Sprint profile already submitted",
                "PROFILE_EXISTS",
            );
        }
        return internal_error(&e);
    }

    let tasks_collection = match mongo.collection::<SprintTaskDoc>(TASK_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let tasks = match ensure_tasks_generated(&tasks_collection, &profile).await {
        Ok(t) => t,
        Err(e) => return internal_error(&e),
    };

    info!(
        member_id = %claims.sub,
        tasks = tasks.len(),
        "Sprint profile submitted and tasks generated"
    );

    let views: Vec<TaskView> = tasks.into_iter().map(|t| task_view(t, None)).collect();
    json_response(StatusCode::CREATED, &views)
}

fn task_view(task: SprintTaskDoc, progress: Option<&TaskProgressDoc>) -> TaskView {
    TaskView {
        task: task.task,
        title: task.title,
        description: task.description,
        order: task.order,
        requires_upload: task.requires_upload,
        question: task.question,
        completed: progress.map(|p| p.completed).unwrap_or(false),
        answer: progress.and_then(|p| p.answer.clone()),
        file_link: progress.and_then(|p| p.file_link.clone()),
    }
}

async fn load_tasks_with_progress(
    state: &Arc<AppState>,
    member_id: &str,
) -> Result<(Vec<SprintTaskDoc>, Vec<TaskProgressDoc>), Response<BoxBody>> {
    let mongo = require_mongo(state)?;

    let tasks_collection = mongo
        .collection::<SprintTaskDoc>(TASK_COLLECTION)
        .await
        .map_err(|e| internal_error(&e))?;

    let options = FindOptions::builder().sort(doc! { "order": 1 }).build();
    let mut tasks = tasks_collection
        .find_many_with(doc! { "member_id": member_id }, Some(options))
        .await
        .map_err(|e| internal_error(&e))?;

    // Generation normally runs at profile submission. If that step
    // failed after the profile landed, re-fire it here so the member
    // isn't stuck with an empty sprint.
    if tasks.is_empty() {
        let profiles = mongo
            .collection::<FounderProfileDoc>(PROFILE_COLLECTION)
            .await
            .map_err(|e| internal_error(&e))?;
        if let Some(profile) = profiles
            .find_one(doc! { "member_id": member_id })
            .await
            .map_err(|e| internal_error(&e))?
        {
            tasks = ensure_tasks_generated(&tasks_collection, &profile)
                .await
                .map_err(|e| internal_error(&e))?;
            tasks.sort_by_key(|t| t.order);
        }
    }

    let progress_collection = mongo
        .collection::<TaskProgressDoc>(TASK_PROGRESS_COLLECTION)
        .await
        .map_err(|e| internal_error(&e))?;

    let progress = progress_collection
        .find_many(doc! { "member_id": member_id })
        .await
        .map_err(|e| internal_error(&e))?;

    Ok((tasks, progress))
}

/// GET /api/sprint/tasks
async fn handle_list_tasks(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let (tasks, progress) = match load_tasks_with_progress(&state, &claims.sub).await {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    let views: Vec<TaskView> = tasks
        .into_iter()
        .map(|t| {
            let p = progress.iter().find(|p| p.task == t.task);
            task_view(t, p)
        })
        .collect();

    json_response(StatusCode::OK, &views)
}

/// GET /api/sprint/status
async fn handle_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let (tasks, progress) = match load_tasks_with_progress(&state, &claims.sub).await {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    let total = tasks.len();
    let completed = tasks
        .iter()
        .filter(|t| {
            progress
                .iter()
                .any(|p| p.task == t.task && p.completed)
        })
        .count();
    let percent = if total == 0 {
        0
    } else {
        ((completed * 100) / total) as u32
    };

    json_response(
        StatusCode::OK,
        &StatusView {
            total_tasks: total,
            completed_tasks: completed,
            percent_complete: percent,
            profile_submitted: total > 0,
        },
    )
}

/// PUT /api/sprint/tasks/{task}/progress
async fn handle_progress(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let Some(task_key) = TaskKey::parse(task) else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown task: {}", task),
            "UNKNOWN_TASK",
        );
    };

    let update: ProgressUpdate = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    // Progress only attaches to tasks that were actually generated for
    // this member.
    let tasks_collection = match mongo.collection::<SprintTaskDoc>(TASK_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };
    match tasks_collection
        .find_one(doc! { "member_id": &claims.sub, "task": task_key.to_string() })
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Task {} is not part of your sprint", task),
                "TASK_NOT_ASSIGNED",
            )
        }
        Err(e) => return internal_error(&e),
    }

    let progress_collection = match mongo
        .collection::<TaskProgressDoc>(TASK_PROGRESS_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let task_name = task_key.to_string();
    let filter = progress_filter(&claims.sub, &task_name);
    let update_doc = progress_update_doc(&claims.sub, &task_name, &update);

    if let Err(e) = progress_collection.upsert_one(filter.clone(), update_doc).await {
        return internal_error(&e);
    }

    match progress_collection.find_one(filter).await {
        Ok(Some(row)) => {
            info!(
                member_id = %claims.sub,
                task = %task_name,
                completed = row.completed,
                "Task progress updated"
            );
            json_response(StatusCode::OK, &row)
        }
        Ok(None) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Progress row missing after upsert",
            "INTERNAL_ERROR",
        ),
        Err(e) => internal_error(&e),
    }
}
