use askama::Template;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;

use crate::auth::ownership;
use crate::characters::{repository, Character};
use crate::db::models::SpellList;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::{Flash, IncomingFlash};
use crate::forms::{CharacterForm, CharacterInput, FieldErrors, FormData};
use crate::reference;
use crate::routes::home::{Html, Layout};
use crate::spell_lists;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "pages/character_form.html")]
pub struct CharacterFormTemplate {
    pub layout: Layout,
    pub title: String,
    pub action: String,
    pub form: CharacterForm,
    pub errors: FieldErrors,
    pub classes: Vec<SelectOption>,
    pub subclasses: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "pages/character_details.html")]
pub struct CharacterDetailsTemplate {
    pub layout: Layout,
    pub character: Character,
    pub spell_lists: Vec<SpellList>,
    pub is_owner: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/characters/new", get(new_page).post(new_submit))
        .route("/char/{id}", get(details))
        .route("/char/{id}/edit", get(edit_page).post(edit_submit))
        .route("/char/{id}/delete", post(delete))
}

/// Select options for classes and subclasses, marking the form's choices.
fn options(conn: &Connection, form: &CharacterForm) -> AppResult<(Vec<SelectOption>, Vec<SelectOption>)> {
    let classes = reference::list_classes(conn)?;

    let subclasses = reference::list_subclasses(conn)?
        .into_iter()
        .map(|sub| {
            let parent = classes
                .iter()
                .find(|c| c.index == sub.parent_class)
                .map(|c| c.name.as_str())
                .unwrap_or(sub.parent_class.as_str());
            SelectOption {
                value: sub.id,
                label: format!("{} ({})", sub.name, parent),
                selected: form.subclass_id == sub.id.to_string(),
            }
        })
        .collect();

    let classes = classes
        .into_iter()
        .map(|class| SelectOption {
            value: class.id,
            selected: form.class_id == class.id.to_string(),
            label: class.name,
        })
        .collect();

    Ok((classes, subclasses))
}

/// Field checks that need the database: the class must exist, the subclass
/// must belong to it, and the name must be free for this user.
fn check_references(
    conn: &Connection,
    user_id: i64,
    input: &CharacterInput,
    editing: Option<i64>,
) -> AppResult<FieldErrors> {
    let mut errors = FieldErrors::default();

    if reference::find_class(conn, input.class_id)?.is_none() {
        errors.add("class_id", "Not a valid choice.");
    } else if let Some(subclass_id) = input.subclass_id {
        if !reference::subclass_belongs_to(conn, subclass_id, input.class_id)? {
            errors.add("subclass_id", "Subclass does not belong to that class.");
        }
    }

    if repository::name_taken(conn, user_id, &input.name, editing)? {
        errors.add(
            "name",
            format!("You already have a character named {}", input.name),
        );
    }

    Ok(errors)
}

fn render_form(
    conn: &Connection,
    layout: Layout,
    title: &str,
    action: String,
    form: CharacterForm,
    errors: FieldErrors,
) -> AppResult<Response> {
    let (classes, subclasses) = options(conn, &form)?;
    Ok(Html(CharacterFormTemplate {
        layout,
        title: title.to_string(),
        action,
        form,
        errors,
        classes,
        subclasses,
    })
    .into_response())
}

fn find_character(conn: &Connection, id: i64) -> AppResult<Character> {
    repository::find(conn, id)?.ok_or(AppError::NotFound)
}

/// Validates a submitted character form. `Err` carries the form and its
/// errors for re-rendering.
fn validate(
    conn: &Connection,
    user_id: i64,
    form: CharacterForm,
    editing: Option<i64>,
) -> AppResult<Result<CharacterInput, (CharacterForm, FieldErrors)>> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(Err((form, errors))),
    };

    let errors = check_references(conn, user_id, &input, editing)?;
    if errors.is_empty() {
        Ok(Ok(input))
    } else {
        Ok(Err((form, errors)))
    }
}

async fn new_page(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    render_form(
        &conn,
        Layout::new(Some(user), flash),
        "New Character",
        "/characters/new".to_string(),
        CharacterForm::default(),
        FieldErrors::default(),
    )
}

async fn new_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    body: Bytes,
) -> AppResult<Response> {
    let form = CharacterForm::from_data(&FormData::parse(&body));
    let conn = state.db.get()?;

    let input = match validate(&conn, user.id, form, None)? {
        Ok(input) => input,
        Err((form, errors)) => {
            return render_form(
                &conn,
                Layout::new(Some(user), flash),
                "New Character",
                "/characters/new".to_string(),
                form,
                errors,
            );
        }
    };

    let id = repository::create(&conn, user.id, &input)?;
    Ok(Flash::success(format!("Successfully created {}!", input.name))
        .redirect(&format!("/char/{}", id)))
}

async fn details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    maybe_user: MaybeUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let character = find_character(&conn, id)?;
    let spell_lists = spell_lists::list_for_character(&conn, id)?;
    let is_owner = maybe_user
        .0
        .as_ref()
        .is_some_and(|user| ownership::owns(user, character.user_id));

    Ok(Html(CharacterDetailsTemplate {
        layout: Layout::new(maybe_user.0, flash),
        character,
        spell_lists,
        is_owner,
    })
    .into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let character = find_character(&conn, id)?;

    if !ownership::owns(&user, character.user_id) {
        return Ok(ownership::reject(
            &user,
            &format!("edit character {}", id),
            "You can not edit another users characters",
            &format!("/char/{}", id),
        ));
    }

    render_form(
        &conn,
        Layout::new(Some(user), flash),
        &format!("Edit {}", character.name),
        format!("/char/{}/edit", id),
        CharacterForm::from_character(&character),
        FieldErrors::default(),
    )
}

async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
    body: Bytes,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let character = find_character(&conn, id)?;

    if !ownership::owns(&user, character.user_id) {
        return Ok(ownership::reject(
            &user,
            &format!("edit character {}", id),
            "You can not edit another users characters",
            &format!("/char/{}", id),
        ));
    }

    let form = CharacterForm::from_data(&FormData::parse(&body));
    let input = match validate(&conn, user.id, form, Some(id))? {
        Ok(input) => input,
        Err((form, errors)) => {
            return render_form(
                &conn,
                Layout::new(Some(user), flash),
                &format!("Edit {}", character.name),
                format!("/char/{}/edit", id),
                form,
                errors,
            );
        }
    };

    repository::update(&conn, &character, &input)?;
    Ok(Flash::success(format!("Successfully updated {}", input.name))
        .redirect(&format!("/char/{}", id)))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let character = find_character(&conn, id)?;

    if !ownership::owns(&user, character.user_id) {
        return Ok(ownership::reject(
            &user,
            &format!("delete character {}", id),
            "You can not delete another users characters",
            &format!("/char/{}", id),
        ));
    }

    repository::delete(&conn, id)?;
    Ok(Flash::success(format!("Successfully deleted {}", character.name))
        .redirect(&format!("/user/{}", character.user_id)))
}
