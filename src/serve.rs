//! Serving compiled stylesheets from an actix-web application.
//!
//! ```no_run
//! use actix_web::{web, App, HttpServer};
//! use sass_finder::{ScssFinder, Settings};
//!
//! # async fn run() -> std::io::Result<()> {
//! let finder = web::Data::new(ScssFinder::new(Settings::new("scss")));
//! HttpServer::new(move || {
//!     App::new()
//!         .app_data(finder.clone())
//!         .service(web::scope("/static").configure(sass_finder::serve::configure))
//! })
//! .bind(("127.0.0.1", 8080))?
//! .run()
//! .await
//! # }
//! ```

use actix_files::NamedFile;
use actix_web::{error, web};

use crate::finder::ScssFinder;

/// Registers the compiled-stylesheet route. Expects a
/// `web::Data<ScssFinder>` in the application data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/{path:.*}").route(web::get().to(compiled_file)));
}

async fn compiled_file(
    path: web::Path<String>,
    finder: web::Data<ScssFinder>,
) -> actix_web::Result<NamedFile> {
    let requested = path.into_inner();
    let finder = finder.into_inner();
    let found = web::block(move || finder.find(&requested)).await??;
    match found {
        Some(file) => Ok(NamedFile::open(file)?),
        None => Err(error::ErrorNotFound("no such static file")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileError, CompiledStylesheet, StylesheetCompiler};
    use crate::settings::{OutputStyle, Settings};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::path::{Path, PathBuf};

    struct UpperCompiler;

    impl StylesheetCompiler for UpperCompiler {
        fn compile(
            &self,
            source: &Path,
            _include_paths: &[PathBuf],
            _style: OutputStyle,
            _source_map: bool,
        ) -> Result<CompiledStylesheet, CompileError> {
            let text = std::fs::read_to_string(source).map_err(|e| CompileError::from(e.to_string()))?;
            if text.contains("broken") {
                return Err(CompileError::from("Invalid CSS after \"broken\"".to_string()));
            }
            Ok(CompiledStylesheet {
                css: text.to_uppercase(),
                source_map: None,
            })
        }
    }

    fn finder(root: &Path) -> web::Data<ScssFinder> {
        web::Data::new(ScssFinder::with_compiler(Settings::new(root), UpperCompiler))
    }

    #[actix_web::test]
    async fn serves_freshly_compiled_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("admin")).unwrap();
        std::fs::write(dir.path().join("admin/admin.scss"), "a { color: red; }").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(finder(dir.path()))
                .service(web::scope("/static").configure(configure)),
        )
        .await;

        let req = test::TestRequest::get().uri("/static/admin/admin.css").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/css"), "{content_type}");
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), b"A { COLOR: RED; }");
    }

    #[actix_web::test]
    async fn unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.scss"), "a {}").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(finder(dir.path()))
                .service(web::scope("/static").configure(configure)),
        )
        .await;

        let req = test::TestRequest::get().uri("/static/other.css").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn sources_are_not_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.scss"), "@import 'partial';").unwrap();
        std::fs::write(dir.path().join("_partial.scss"), "$x: 1;").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(finder(dir.path()))
                .service(web::scope("/static").configure(configure)),
        )
        .await;

        for uri in ["/static/site.scss", "/static/_partial.scss"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }
        let req = test::TestRequest::get().uri("/static/site.css").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn compile_error_is_shown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.scss"), "broken").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(finder(dir.path()))
                .service(web::scope("/static").configure(configure)),
        )
        .await;

        let req = test::TestRequest::get().uri("/static/site.css").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("failed to compile"), "{body}");
        assert!(body.contains("Invalid CSS"), "{body}");
        assert!(!dir.path().join("site.css").exists());
    }
}
