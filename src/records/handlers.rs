use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{error, info, instrument};

use crate::{
    csrf,
    error::AppError,
    extract::{Form, Path},
    records::{
        dto::{DeleteForm, RecordForm},
        repo::Record,
    },
    render, session,
    state::AppState,
};

/// Render the list-and-create page. A failed list query degrades to an empty
/// list with a flash rather than an error page.
async fn render_index(
    state: &AppState,
    session: &Session,
    fname: &str,
    lname: &str,
    email: &str,
) -> Result<Response, AppError> {
    let records = match Record::list_all(&state.db).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "record list query failed");
            session::flash(session, "Error loading records from database.", "error").await?;
            Vec::new()
        }
    };
    let mut ctx = render::base_context(session).await?;
    ctx.insert(
        "csrf_token",
        &csrf::issue(session, state.config.csrf_token_ttl_secs).await?,
    );
    ctx.insert("records", &records);
    ctx.insert("form_fname", fname);
    ctx.insert("form_lname", lname);
    ctx.insert("form_email", email);
    Ok(render::page("index.html", &ctx)?.into_response())
}

async fn render_update(
    state: &AppState,
    session: &Session,
    sno: i32,
    fname: &str,
    lname: &str,
    email: &str,
) -> Result<Response, AppError> {
    let mut ctx = render::base_context(session).await?;
    ctx.insert(
        "csrf_token",
        &csrf::issue(session, state.config.csrf_token_ttl_secs).await?,
    );
    ctx.insert("sno", &sno);
    ctx.insert("form_fname", fname);
    ctx.insert("form_lname", lname);
    ctx.insert("form_email", email);
    Ok(render::page("update.html", &ctx)?.into_response())
}

#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    render_index(&state, &session, "", "", "").await
}

#[instrument(skip(state, session, headers, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RecordForm>,
) -> Result<Response, AppError> {
    if !csrf::verify(&session, &form.csrf_token, state.config.csrf_token_ttl_secs).await? {
        return Ok(csrf::failure_redirect(&session, &headers).await);
    }

    let (fname, lname, email) = match form.validated() {
        Ok(values) => values,
        Err(errors) => {
            for reason in &errors {
                session::flash(&session, reason, "error").await?;
            }
            return render_index(&state, &session, &form.fname, &form.lname, &form.email).await;
        }
    };

    match Record::create(&state.db, &fname, &lname, &email).await {
        Ok(record) => {
            info!(sno = record.sno, "record added");
            session::flash(&session, "Record added successfully!", "success").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            error!(error = %e, "record insert failed");
            session::flash(
                &session,
                "An error occurred while adding the record. Please try again.",
                "error",
            )
            .await?;
            render_index(&state, &session, &form.fname, &form.lname, &form.email).await
        }
    }
}

#[instrument]
pub async fn home() -> &'static str {
    "Welcome to the Home Page"
}

#[instrument(skip(state, session))]
pub async fn update_page(
    State(state): State<AppState>,
    session: Session,
    Path(sno): Path<i32>,
) -> Result<Response, AppError> {
    match Record::find(&state.db, sno).await {
        Ok(Some(record)) => {
            render_update(&state, &session, sno, &record.fname, &record.lname, &record.email).await
        }
        Ok(None) => {
            session::flash(&session, "Record not found.", "error").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            error!(error = %e, sno, "record load failed");
            session::flash(&session, "Error accessing record.", "error").await?;
            Ok(Redirect::to("/").into_response())
        }
    }
}

#[instrument(skip(state, session, headers, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(sno): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<RecordForm>,
) -> Result<Response, AppError> {
    if !csrf::verify(&session, &form.csrf_token, state.config.csrf_token_ttl_secs).await? {
        return Ok(csrf::failure_redirect(&session, &headers).await);
    }

    let (fname, lname, email) = match form.validated() {
        Ok(values) => values,
        Err(errors) => {
            for reason in &errors {
                session::flash(&session, reason, "error").await?;
            }
            return render_update(&state, &session, sno, &form.fname, &form.lname, &form.email)
                .await;
        }
    };

    match Record::update(&state.db, sno, &fname, &lname, &email).await {
        Ok(0) => {
            session::flash(&session, "Record not found.", "error").await?;
            Ok(Redirect::to("/").into_response())
        }
        Ok(_) => {
            info!(sno, "record updated");
            session::flash(&session, "Record updated successfully!", "success").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            error!(error = %e, sno, "record update failed");
            session::flash(
                &session,
                "An error occurred while updating the record.",
                "error",
            )
            .await?;
            render_update(&state, &session, sno, &form.fname, &form.lname, &form.email).await
        }
    }
}

/// Idempotent from the caller's side: deleting a missing record reports
/// "not found" and changes nothing.
#[instrument(skip(state, session, headers, form))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(sno): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    if !csrf::verify(&session, &form.csrf_token, state.config.csrf_token_ttl_secs).await? {
        return Ok(csrf::failure_redirect(&session, &headers).await);
    }

    match Record::delete(&state.db, sno).await {
        Ok(0) => {
            session::flash(&session, "Record not found.", "error").await?;
        }
        Ok(_) => {
            info!(sno, "record deleted");
            session::flash(&session, "Record deleted successfully!", "success").await?;
        }
        Err(e) => {
            error!(error = %e, sno, "record delete failed");
            session::flash(
                &session,
                "An error occurred while deleting the record.",
                "error",
            )
            .await?;
        }
    }
    Ok(Redirect::to("/").into_response())
}
