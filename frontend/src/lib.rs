use sauron::{html::attributes::*, html::*, prelude::*};
use serde::de::DeserializeOwned;
use todo_shared::sync::{self, ApiError, Change, Mirror, SyncError, TodoApi};
use todo_shared::{CreateTaskRequest, Task, TaskId, UpdateTaskRequest};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, window, Request, RequestInit, Response};

#[derive(Debug, Clone)]
pub enum Msg {
    LoadTodos,
    Settled(Result<Option<Change>, SyncError>),
    SetNewTodoText(String),
    NewTodoKeyDown(String),
    AddTodo,
    TodoAdded(Result<Option<Change>, SyncError>),
    ToggleTodo(TaskId),
    DeleteTodo(TaskId),
    StartEdit(TaskId),
    SetEditText(String),
    EditKeyDown(TaskId, String),
    FinishEdit(TaskId),
    CancelEdit,
    ClearCompleted,
    ToggleAll,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    todos: Mirror,
    new_todo_text: String,
    editing: Option<TaskId>,
    edit_text: String,
    loading: bool,
}

fn report(error: &SyncError) {
    console::error_1(&format!("Todo sync failed: {}", error).into());
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        Cmd::new(async { Msg::LoadTodos })
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::LoadTodos => {
                self.loading = true;
                Cmd::new(async { Msg::Settled(sync::load(&FetchApi).await.map(Some)) })
            }
            Msg::Settled(outcome) => {
                self.loading = false;
                if let Err(error) = self.todos.settle(outcome) {
                    report(&error);
                }
                Cmd::none()
            }
            Msg::SetNewTodoText(text) => {
                self.new_todo_text = text;
                Cmd::none()
            }
            Msg::NewTodoKeyDown(key) => {
                if key == "Enter" {
                    self.update(Msg::AddTodo)
                } else {
                    Cmd::none()
                }
            }
            Msg::AddTodo => {
                let text = self.new_todo_text.trim().to_string();
                if text.is_empty() {
                    return Cmd::none();
                }
                Cmd::new(async move { Msg::TodoAdded(sync::add(&FetchApi, &text).await) })
            }
            Msg::TodoAdded(outcome) => match self.todos.settle(outcome) {
                // Input is only cleared once the server has accepted the todo.
                Ok(()) => {
                    self.new_todo_text.clear();
                    Cmd::none()
                }
                Err(error) => {
                    report(&error);
                    Cmd::none()
                }
            },
            Msg::ToggleTodo(id) => {
                let Some(current) = self.todos.completed(id) else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    Msg::Settled(sync::toggle(&FetchApi, id, current).await.map(Some))
                })
            }
            Msg::DeleteTodo(id) => {
                Cmd::new(async move { Msg::Settled(sync::delete(&FetchApi, id).await.map(Some)) })
            }
            Msg::StartEdit(id) => {
                if let Some(task) = self.todos.get(id) {
                    self.editing = Some(id);
                    self.edit_text = task.text.clone();
                }
                Cmd::none()
            }
            Msg::SetEditText(text) => {
                self.edit_text = text;
                Cmd::none()
            }
            Msg::EditKeyDown(id, key) => match key.as_str() {
                "Enter" => self.update(Msg::FinishEdit(id)),
                "Escape" => self.update(Msg::CancelEdit),
                _ => Cmd::none(),
            },
            Msg::FinishEdit(id) => {
                // Enter and the blur that follows both land here; only the first one counts.
                if self.editing != Some(id) {
                    return Cmd::none();
                }
                self.editing = None;
                let Some(text) = self.todos.pending_edit(id, &self.edit_text) else {
                    return Cmd::none();
                };
                Cmd::new(async move { Msg::Settled(sync::edit(&FetchApi, id, &text).await) })
            }
            Msg::CancelEdit => {
                self.editing = None;
                Cmd::none()
            }
            Msg::ClearCompleted => {
                let ids = self.todos.completed_ids();
                Cmd::new(async move {
                    Msg::Settled(sync::clear_completed(&FetchApi, &ids).await.map(Some))
                })
            }
            Msg::ToggleAll => {
                let target = self.todos.toggle_all_target();
                let ids = self.todos.ids();
                Cmd::new(async move {
                    Msg::Settled(sync::toggle_all(&FetchApi, &ids, target).await.map(Some))
                })
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [div(
                [class("max-w-2xl mx-auto px-6 py-8")],
                [
                    h1([class("text-3xl font-bold text-ctp-text mb-6")], [text("Todo List")]),
                    self.view_add_form(),
                    self.view_controls(),
                    if self.loading {
                        div([class("text-center py-10 text-ctp-subtext0 italic")], [text("Loading...")])
                    } else {
                        self.view_list()
                    },
                    self.view_stats(),
                ],
            )],
        )
    }
}

impl Model {
    fn view_add_form(&self) -> Node<Msg> {
        div([class("flex gap-2 mb-6")], [
            input([
                r#type("text"),
                placeholder("What needs to be done?"),
                value(&self.new_todo_text),
                on_input(|event| Msg::SetNewTodoText(event.value())),
                on_keydown(|event| Msg::NewTodoKeyDown(event.key())),
                class("flex-1 px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
            ], []),
            button([
                on_click(|_| Msg::AddTodo),
                class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
            ], [text("Add")]),
        ])
    }

    fn view_controls(&self) -> Node<Msg> {
        let stats = self.todos.stats();
        div([class("flex justify-between mb-4")], [
            button([
                on_click(|_| Msg::ToggleAll),
                class("bg-ctp-surface1 hover:bg-ctp-surface2 text-ctp-text px-3 py-1 rounded-md text-sm"),
                disabled(stats.total == 0),
            ], [text("Toggle All")]),
            button([
                on_click(|_| Msg::ClearCompleted),
                class("bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 px-3 py-1 rounded-md text-sm"),
                disabled(stats.completed == 0),
            ], [text("Clear Completed")]),
        ])
    }

    fn view_list(&self) -> Node<Msg> {
        if self.todos.is_empty() {
            return div([class("text-center py-12")], [
                h3([class("text-lg font-medium text-ctp-text mb-2")], [text("No todos yet!")]),
                p([class("text-ctp-subtext0")], [text("Add your first task above to get started.")]),
            ]);
        }
        ul(
            [class("space-y-2")],
            self.todos.tasks().iter().map(|task| self.view_todo(task)).collect::<Vec<_>>(),
        )
    }

    fn view_todo(&self, task: &Task) -> Node<Msg> {
        let task_id = task.id;
        let body = if self.editing == Some(task_id) {
            vec![
                input([
                    r#type("text"),
                    value(&self.edit_text),
                    on_input(|event| Msg::SetEditText(event.value())),
                    on_keydown(move |event| Msg::EditKeyDown(task_id, event.key())),
                    on_blur(move |_| Msg::FinishEdit(task_id)),
                    class("flex-1 px-2 py-1 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-ctp-text"),
                ], []),
                button([
                    on_click(move |_| Msg::FinishEdit(task_id)),
                    class("bg-ctp-green text-ctp-base px-3 py-1 rounded-md text-sm"),
                ], [text("Save")]),
            ]
        } else {
            vec![
                input([
                    r#type("checkbox"),
                    checked(task.completed),
                    // The box only changes once the server confirms and the mirror re-renders it.
                    on_click(move |event| {
                        event.prevent_default();
                        Msg::ToggleTodo(task_id)
                    }),
                ], []),
                span([
                    on_dblclick(move |_| Msg::StartEdit(task_id)),
                    class(&format!(
                        "flex-1 cursor-text {}",
                        if task.completed { "line-through text-ctp-overlay1" } else { "text-ctp-text" }
                    )),
                ], [text(&task.text)]),
                button([
                    on_click(move |_| Msg::StartEdit(task_id)),
                    class("bg-ctp-blue/20 text-ctp-blue px-3 py-1 rounded-md text-sm"),
                ], [text("Edit")]),
                button([
                    on_click(move |_| Msg::DeleteTodo(task_id)),
                    class("bg-ctp-red/20 text-ctp-red px-3 py-1 rounded-md text-sm"),
                ], [text("Delete")]),
            ]
        };
        li(
            [
                key(task_id.to_string()),
                class(&format!(
                    "flex items-center gap-3 p-3 rounded-lg border {}",
                    if task.completed { "border-ctp-green bg-ctp-green/10" } else { "border-ctp-surface1" }
                )),
            ],
            body,
        )
    }

    fn view_stats(&self) -> Node<Msg> {
        let stats = self.todos.stats();
        div([class("flex gap-4 mt-6 text-sm text-ctp-subtext0")], [
            span([], [text(&format!("{} total", stats.total))]),
            span([], [text(&format!("{} pending", stats.pending))]),
            span([], [text(&format!("{} completed", stats.completed))]),
        ])
    }
}

/// `TodoApi` over the browser's `fetch`. Any non-2xx status counts as a failure.
#[derive(Debug, Clone, Copy, Default)]
struct FetchApi;

async fn send(method: &str, url: &str, body: Option<String>) -> Result<Response, ApiError> {
    let window = window().ok_or_else(|| ApiError::Transport("no window".to_string()))?;

    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|_| ApiError::Transport("failed to create request".to_string()))?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| ApiError::Transport("failed to set header".to_string()))?;
    }

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| ApiError::Transport(format!("{} {} failed", method, url)))?
        .into();

    if !response.ok() {
        return Err(ApiError::Status(response.status()));
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text_promise = response
        .text()
        .map_err(|_| ApiError::Decode("failed to read response".to_string()))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| ApiError::Decode("failed to get text".to_string()))?
        .as_string()
        .ok_or_else(|| ApiError::Decode("response is not text".to_string()))?;

    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode<T: serde::Serialize>(body: &T) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))
}

impl TodoApi for FetchApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        read_json(send("GET", "/api/todos", None).await?).await
    }

    async fn create(&self, text: &str) -> Result<Task, ApiError> {
        let body = encode(&CreateTaskRequest::new(text))?;
        read_json(send("POST", "/api/todos", Some(body)).await?).await
    }

    async fn update(&self, id: TaskId, patch: &UpdateTaskRequest) -> Result<Task, ApiError> {
        let body = encode(patch)?;
        let url = format!("/api/todos/{}", id);
        read_json(send("PUT", &url, Some(body)).await?).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        let url = format!("/api/todos/{}", id);
        send("DELETE", &url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_one_todo() -> Model {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"text":"A","completed":false,"createdAt":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        let mut model = Model::default();
        model.todos.apply(Change::Replace(vec![task]));
        model
    }

    #[test]
    fn double_click_opens_the_editor_with_current_text() {
        let mut model = model_with_one_todo();

        let _ = model.update(Msg::StartEdit(1));

        assert_eq!(model.editing, Some(1));
        assert_eq!(model.edit_text, "A");
    }

    #[test]
    fn escape_cancels_the_edit_and_the_following_blur_is_ignored() {
        let mut model = model_with_one_todo();
        let _ = model.update(Msg::StartEdit(1));
        let _ = model.update(Msg::SetEditText("B".to_string()));

        let _ = model.update(Msg::EditKeyDown(1, "Escape".to_string()));
        let _ = model.update(Msg::FinishEdit(1));

        assert_eq!(model.editing, None);
        assert_eq!(model.todos.get(1).unwrap().text, "A");
    }

    #[test]
    fn enter_with_unchanged_text_just_closes_the_editor() {
        let mut model = model_with_one_todo();
        let _ = model.update(Msg::StartEdit(1));
        let _ = model.update(Msg::SetEditText("  A ".to_string()));

        let _ = model.update(Msg::EditKeyDown(1, "Enter".to_string()));

        assert_eq!(model.editing, None);
        assert_eq!(model.todos.get(1).unwrap().text, "A");
    }

    #[test]
    fn other_keys_keep_the_editor_open() {
        let mut model = model_with_one_todo();
        let _ = model.update(Msg::StartEdit(1));

        let _ = model.update(Msg::EditKeyDown(1, "b".to_string()));

        assert_eq!(model.editing, Some(1));
    }

    #[test]
    fn enter_on_blank_new_todo_does_nothing() {
        let mut model = model_with_one_todo();
        let _ = model.update(Msg::SetNewTodoText("   ".to_string()));

        let _ = model.update(Msg::NewTodoKeyDown("Enter".to_string()));

        assert_eq!(model.new_todo_text, "   ");
        assert_eq!(model.todos.tasks().len(), 1);
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
