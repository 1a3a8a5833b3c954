use axum::response::Html;
use lazy_static::lazy_static;
use tera::{Context, Tera};
use tower_sessions::Session;

use crate::error::AppError;
use crate::session;

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("index.html", include_str!("../templates/index.html")),
            ("update.html", include_str!("../templates/update.html")),
            ("welcome.html", include_str!("../templates/welcome.html")),
            ("auth/login.html", include_str!("../templates/auth/login.html")),
            ("auth/register.html", include_str!("../templates/auth/register.html")),
            ("errors/400.html", include_str!("../templates/errors/400.html")),
            ("errors/403.html", include_str!("../templates/errors/403.html")),
            ("errors/404.html", include_str!("../templates/errors/404.html")),
            ("errors/500.html", include_str!("../templates/errors/500.html")),
        ])
        .expect("embedded templates parse");
        tera
    };
}

pub fn page(name: &str, ctx: &Context) -> Result<Html<String>, AppError> {
    let body = TEMPLATES
        .render(name, ctx)
        .map_err(anyhow::Error::from)?;
    Ok(Html(body))
}

/// Render an error page with no session-derived state. Error templates must
/// stay renderable from an empty context so error responses cannot fail into
/// themselves.
pub fn error_page(name: &str) -> Result<Html<String>, tera::Error> {
    Ok(Html(TEMPLATES.render(name, &Context::new())?))
}

/// Context shared by every page: queued flash messages (consumed here) and
/// the logged-in username, if any.
pub async fn base_context(session: &Session) -> Result<Context, AppError> {
    let mut ctx = Context::new();
    ctx.insert("flashes", &session::take_flashes(session).await?);
    let username = session::current_user(session)
        .await?
        .map(|u| u.username);
    ctx.insert("username", &username);
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse() {
        // Force lazy init; a syntax error in any embedded template panics here.
        assert!(TEMPLATES.get_template_names().count() >= 10);
    }

    #[test]
    fn error_pages_render_from_empty_context() {
        for name in [
            "errors/400.html",
            "errors/403.html",
            "errors/404.html",
            "errors/500.html",
        ] {
            error_page(name).expect(name);
        }
    }

    #[test]
    fn welcome_renders_with_base_fields() {
        let mut ctx = Context::new();
        ctx.insert("flashes", &Vec::<crate::session::Flash>::new());
        ctx.insert("username", &None::<String>);
        page("welcome.html", &ctx).expect("welcome renders");
    }
}
