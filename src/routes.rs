//! HTTP routes.
//!
//! | Method/Path            | Handler        |
//! |------------------------|----------------|
//! | GET  `/`               | `list_todos`   |
//! | POST `/`               | `create_todo`  |
//! | GET  `/update/:id`     | `edit_todo`    |
//! | POST `/update/:id`     | `update_todo`  |
//! | GET  `/delete/:id`     | `delete_todo`  |
//!
//! Every failure ends here: it is logged and turned into a plain text
//! message, never into an error status. That includes ids that are not
//! integers. Store access and rendering run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tower_http::trace::TraceLayer;

use crate::error::LogFailure;
use crate::service::{TodoForm, TodoService};
use crate::views::Views;

const LIST_FAILED: &str = "An error occurred while fetching todos.";
const EDIT_FAILED: &str = "An error occurred while fetching todo for update.";
const DELETE_FAILED: &str = "An error occurred while deleting todo.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
    pub views: Arc<Views>,
}

/// Build the complete router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/update/:id", get(edit_todo).post(update_todo))
        .route("/delete/:id", get(delete_todo))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn list_todos(State(state): State<AppState>) -> Response {
    blocking(LIST_FAILED, move || render_list(&state)).await
}

/// POST /
///
/// A failed creation is only logged; the list is rendered either way.
async fn create_todo(State(state): State<AppState>, form: Option<Form<TodoForm>>) -> Response {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    blocking(LIST_FAILED, move || {
        state.service.create(&form).log_failure("adding new todo");
        render_list(&state)
    })
    .await
}

/// GET /update/:id
async fn edit_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Some(Path(id)) = id.log_failure("reading todo id") else {
        return EDIT_FAILED.into_response();
    };
    blocking(EDIT_FAILED, move || render_edit(&state, id)).await
}

/// POST /update/:id
///
/// Redirects to the list on success, otherwise falls back to the edit form.
async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    form: Option<Form<TodoForm>>,
) -> Response {
    let Some(Path(id)) = id.log_failure("reading todo id") else {
        return EDIT_FAILED.into_response();
    };
    let form = form.map(|Form(form)| form).unwrap_or_default();
    blocking(EDIT_FAILED, move || {
        match state.service.update(id, &form).log_failure("updating todo") {
            Some(_) => Redirect::to("/").into_response(),
            None => render_edit(&state, id),
        }
    })
    .await
}

/// GET /delete/:id
async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Some(Path(id)) = id.log_failure("reading todo id") else {
        return DELETE_FAILED.into_response();
    };
    blocking(DELETE_FAILED, move || {
        match state.service.delete(id).log_failure("deleting todo") {
            Some(()) => Redirect::to("/").into_response(),
            None => DELETE_FAILED.into_response(),
        }
    })
    .await
}

/// Run store access and rendering off the async workers. A task that never
/// returns a response answers with `failed`.
async fn blocking<F>(failed: &'static str, work: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .log_failure("handling request")
        .unwrap_or_else(|| failed.into_response())
}

fn render_list(state: &AppState) -> Response {
    let page = state
        .service
        .list()
        .and_then(|todos| state.views.index(&todos))
        .log_failure("fetching todos");
    match page {
        Some(html) => Html(html).into_response(),
        None => LIST_FAILED.into_response(),
    }
}

fn render_edit(state: &AppState, id: i64) -> Response {
    let page = state
        .service
        .get(id)
        .and_then(|todo| state.views.update(&todo))
        .log_failure("fetching todo for update");
    match page {
        Some(html) => Html(html).into_response(),
        None => EDIT_FAILED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Store;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> (Router, TodoService) {
        let service = TodoService::new(Arc::new(Store::open_in_memory().unwrap()));
        let state = AppState {
            service: service.clone(),
            views: Arc::new(Views::new().unwrap()),
        };
        (create_router(state), service)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("GET")
            .body(Body::empty())
            .unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn list_page_renders() {
        let (router, service) = app();
        service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Buy milk"));
    }

    #[tokio::test]
    async fn post_root_creates_and_renders_list() {
        let (router, service) = app();

        let response = router
            .oneshot(post_form("/", "title=Buy+milk&desc=2%25"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Buy milk"));

        let todos = service.list().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].description, "2%");
    }

    #[tokio::test]
    async fn post_root_without_title_still_renders_list() {
        let (router, service) = app();

        let response = router.oneshot(post_form("/", "desc=2%25")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No todos yet"));
        assert!(service.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn post_root_without_form_body_still_renders_list() {
        let (router, service) = app();

        let request = Request::builder()
            .uri("/")
            .method("POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No todos yet"));
        assert!(service.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_page_is_prefilled() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router
            .oneshot(get(&format!("/update/{}", todo.id)))
            .await
            .unwrap();
        let body = body_text(response).await;
        assert!(body.contains("value=\"Buy milk\""));
        assert!(body.contains(&format!("action=\"/update/{}\"", todo.id)));
    }

    #[tokio::test]
    async fn edit_page_for_missing_todo_is_generic_error() {
        let (router, _) = app();

        let response = router.oneshot(get("/update/404")).await.unwrap();
        assert_eq!(body_text(response).await, EDIT_FAILED);
    }

    #[tokio::test]
    async fn update_redirects_to_list() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router
            .oneshot(post_form(
                &format!("/update/{}", todo.id),
                "title=Buy+milk&desc=whole",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let updated = service.get(todo.id).unwrap();
        assert_eq!(updated.description, "whole");
        assert_eq!(updated.created_at, todo.created_at);
    }

    #[tokio::test]
    async fn invalid_update_falls_back_to_edit_form() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router
            .oneshot(post_form(&format!("/update/{}", todo.id), "title=&desc=whole"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("value=\"2%\""));
        assert_eq!(service.get(todo.id).unwrap(), todo);
    }

    #[tokio::test]
    async fn update_of_missing_todo_is_generic_error() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router
            .oneshot(post_form("/update/999", "title=x&desc=y"))
            .await
            .unwrap();
        assert_eq!(body_text(response).await, EDIT_FAILED);
        assert_eq!(service.list().unwrap(), vec![todo]);
    }

    #[tokio::test]
    async fn delete_redirects_to_list() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router
            .oneshot(get(&format!("/delete/{}", todo.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(service.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_todo_is_generic_error() {
        let (router, service) = app();
        let todo = service.create(&TodoForm::new("Buy milk", "2%")).unwrap();

        let response = router.oneshot(get("/delete/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, DELETE_FAILED);
        assert_eq!(service.list().unwrap(), vec![todo]);
    }

    #[tokio::test]
    async fn create_update_delete_through_http() {
        let (router, service) = app();

        router
            .clone()
            .oneshot(post_form("/", "title=Buy+milk&desc=2%25"))
            .await
            .unwrap();
        let id = service.list().unwrap()[0].id;

        router
            .clone()
            .oneshot(post_form(&format!("/update/{}", id), "title=Buy+milk&desc=whole"))
            .await
            .unwrap();
        assert_eq!(service.get(id).unwrap().description, "whole");

        router
            .clone()
            .oneshot(get(&format!("/delete/{}", id)))
            .await
            .unwrap();
        let response = router.oneshot(get("/")).await.unwrap();
        assert!(body_text(response).await.contains("No todos yet"));
    }

    #[tokio::test]
    async fn ids_that_are_not_integers_get_generic_errors() {
        let (router, _) = app();

        let response = router
            .clone()
            .oneshot(get("/delete/99999999999999999999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, DELETE_FAILED);

        let response = router.clone().oneshot(get("/update/milk")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, EDIT_FAILED);

        let response = router
            .oneshot(post_form("/update/milk", "title=x&desc=y"))
            .await
            .unwrap();
        assert_eq!(body_text(response).await, EDIT_FAILED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_all_land() {
        let (router, service) = app();

        let requests: Vec<_> = (0..50)
            .map(|i| {
                let router = router.clone();
                tokio::spawn(async move {
                    router
                        .oneshot(post_form("/", &format!("title=todo+{}&desc=x", i)))
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();
        for request in requests {
            assert_eq!(request.await.unwrap(), StatusCode::OK);
        }

        let todos = service.list().unwrap();
        assert_eq!(todos.len(), 50);
        let mut ids: Vec<_> = todos.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
