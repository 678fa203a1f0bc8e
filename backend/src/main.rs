mod config;
mod error;
mod identity;
mod listing;
mod object_store;
mod pagination;
mod services;
mod state;
mod storage;
mod timestamps;
mod validation;

use crate::config::Config;
use crate::state::{AppState, StartupError};
use actix_files::NamedFile;
use actix_web::http::Method;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use crm_common::responses::ErrorBody;
use env_logger::Env;
use log::{error, info};
use std::path::{Component, Path, PathBuf};

/// Serves the single-page app for any path no API scope claimed.
///
/// Existing files are served as-is; every other GET gets `index.html` so that
/// client-side routes survive a reload.
async fn serve_spa(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(root) = state.config.server.static_dir.as_deref() else {
        return not_found();
    };
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return not_found();
    }

    let requested = spa_path(root, req.path());
    let file = match requested.filter(|path| path.is_file()) {
        Some(path) => path,
        None => root.join("index.html"),
    };
    match NamedFile::open_async(&file).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            error!("Cannot serve {}: {}", file.display(), e);
            not_found()
        }
    }
}

/// Maps a request path below `root`, refusing anything that would leave it.
fn spa_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| root.join(relative))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        message: "Not found".to_string(),
        errors: None,
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let state = Config::load()
        .map_err(StartupError::from)
        .and_then(AppState::new)
        .map_err(|e| {
            error!("Startup failed: {}", e);
            std::io::Error::other(e.to_string())
        })?;
    let host = state.config.server.host.clone();
    let port = state.config.server.port;

    info!(
        "Tables: leads={} documents={} calls={} ({})",
        state.config.tables.leads,
        state.config.tables.documents,
        state.config.tables.calls,
        state.config.tables.database_path
    );
    if let Some(dir) = &state.config.server.static_dir {
        info!("Serving the web app from {}", dir.display());
    }
    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(services::envelope_headers())
            .wrap(Logger::default())
            .configure(|cfg| services::configure(cfg, state))
            .default_service(web::route().to(serve_spa))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spa_paths_stay_below_the_root() {
        let root = Path::new("/srv/app");
        assert_eq!(spa_path(root, "/assets/app.js"), Some(root.join("assets/app.js")));
        assert_eq!(spa_path(root, "/"), None);
        assert_eq!(spa_path(root, "/../etc/passwd"), None);
        assert_eq!(spa_path(root, "/assets/../../x"), None);
    }
}
