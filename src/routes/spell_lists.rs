use askama::Template;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::auth::ownership;
use crate::characters::{repository, Character, SpellOptions};
use crate::db::models::{Spell, SpellList};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::{Flash, IncomingFlash};
use crate::forms::{FieldErrors, FormData, SpellListForm};
use crate::routes::home::{Html, Layout};
use crate::spell_lists;
use crate::spells::{self, catalog, SlotSummary};
use crate::state::AppState;

/// A selectable spell card and whether the submitted form picked it.
pub struct SpellChoice {
    pub spell: Spell,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "pages/spell_list_new.html")]
pub struct SpellListNewTemplate {
    pub layout: Layout,
    pub character: Character,
    pub highest_level: u8,
    pub slots: Vec<SlotSummary>,
    pub choices: Vec<SpellChoice>,
    pub form: SpellListForm,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "pages/spell_list_details.html")]
pub struct SpellListDetailsTemplate {
    pub layout: Layout,
    pub character: Character,
    pub list: SpellList,
    pub spells: Vec<Spell>,
    pub is_owner: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/char/{id}/spell_list/new",
            get(new_page).post(new_submit),
        )
        .route("/char/{id}/spell_list/{list_id}", get(details))
        .route("/spell_list/{id}/delete", post(delete))
}

/// What the new-list form works from once the rules service has answered.
struct Selection {
    character: Character,
    highest_level: u8,
    slots: Vec<SlotSummary>,
    spells: Vec<Spell>,
}

/// Loads the character, checks ownership and runs the availability
/// pipeline. `Err` is the response to send instead: a rejection or the
/// "no spells" redirect.
async fn selection(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> AppResult<Result<Selection, Response>> {
    let character = {
        let conn = state.db.get()?;
        repository::find(&conn, id)?.ok_or(AppError::NotFound)?
    };

    if !ownership::owns(user, character.user_id) {
        return Ok(Err(ownership::reject(
            user,
            &format!("create spell list for character {}", id),
            "You can not create a new spell list for another users character",
            &format!("/char/{}", id),
        )));
    }

    let (slots, legal) = match character.spell_options(state.rules.as_ref()).await? {
        SpellOptions::Available { slots, legal } => (slots, legal),
        SpellOptions::Unavailable => {
            tracing::info!("No spells available for character {}", id);
            return Ok(Err(Flash::error(format!(
                "No spells available for {}",
                character.name
            ))
            .redirect(&format!("/char/{}", id))));
        }
    };

    let availability = spells::reduce(&slots);
    let conn = state.db.get()?;
    let spells = Character::spells_from_db(&conn, &slots, &legal)?;

    Ok(Ok(Selection {
        character,
        highest_level: availability.highest_level,
        slots: availability.classes,
        spells,
    }))
}

fn render_new(
    selection: Selection,
    layout: Layout,
    form: SpellListForm,
    errors: FieldErrors,
) -> Response {
    let choices = selection
        .spells
        .into_iter()
        .map(|spell| SpellChoice {
            selected: form.spells.contains(&spell.id),
            spell,
        })
        .collect();

    Html(SpellListNewTemplate {
        layout,
        character: selection.character,
        highest_level: selection.highest_level,
        slots: selection.slots,
        choices,
        form,
        errors,
    })
    .into_response()
}

async fn new_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let selection = match selection(&state, &user, id).await? {
        Ok(selection) => selection,
        Err(response) => return Ok(response),
    };

    Ok(render_new(
        selection,
        Layout::new(Some(user), flash),
        SpellListForm::default(),
        FieldErrors::default(),
    ))
}

async fn new_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
    body: Bytes,
) -> AppResult<Response> {
    let selection = match selection(&state, &user, id).await? {
        Ok(selection) => selection,
        Err(response) => return Ok(response),
    };

    let form = SpellListForm::from_data(&FormData::parse(&body));
    let mut errors = form.validate();

    let conn = state.db.get()?;
    if errors.is_empty() && spell_lists::name_taken(&conn, id, &form.name)? {
        errors.add(
            "name",
            format!("{} already has a list named {}", selection.character.name, form.name),
        );
    }
    if !errors.is_empty() {
        return Ok(render_new(
            selection,
            Layout::new(Some(user), flash),
            form,
            errors,
        ));
    }

    let selectable: Vec<i64> = selection.spells.iter().map(|spell| spell.id).collect();
    let list_id = spell_lists::create(&conn, id, &form.name, &form.spells, &selectable)?;

    Ok(Flash::success(format!(
        "Successfully created {} for {}",
        form.name, selection.character.name
    ))
    .redirect(&format!("/char/{}/spell_list/{}", id, list_id)))
}

async fn details(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(i64, i64)>,
    maybe_user: MaybeUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let character = repository::find(&conn, id)?.ok_or(AppError::NotFound)?;
    let list = spell_lists::find(&conn, list_id)?
        .filter(|list| list.character_id == character.id)
        .ok_or(AppError::NotFound)?;
    let spells = catalog::spells_in_list(&conn, list.id)?;
    let is_owner = maybe_user
        .0
        .as_ref()
        .is_some_and(|user| ownership::owns(user, character.user_id));

    Ok(Html(SpellListDetailsTemplate {
        layout: Layout::new(maybe_user.0, flash),
        character,
        list,
        spells,
        is_owner,
    })
    .into_response())
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let list = spell_lists::find(&conn, id)?.ok_or(AppError::NotFound)?;
    let character = repository::find(&conn, list.character_id)?.ok_or(AppError::NotFound)?;

    if !ownership::owns(&user, character.user_id) {
        return Ok(ownership::reject(
            &user,
            &format!("delete spell list {}", id),
            "You can not delete another users spell list",
            &format!("/char/{}", character.id),
        ));
    }

    spell_lists::delete(&conn, id)?;
    Ok(Flash::success(format!("Successfully deleted {}", list.name))
        .redirect(&format!("/char/{}", character.id)))
}
