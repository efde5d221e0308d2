//! HTTP front end.
//!
//! `Dashboard::handle` maps a request line to a response without touching a
//! socket; `serve` is the accept loop around it. Connections are handled one
//! at a time on the current-thread runtime.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use url::Url;

use crate::config::DashboardConfig;
use crate::data::{load_dataset, DataSet};
use crate::error::DashboardError;
use crate::logging::{log, log_request, obj, v_str, Domain, Level};
use crate::nav::{render_page, Navigator, PageId};
use crate::pages::{PageContext, PageQuery};
use crate::render::{self, LinkMode};

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_HEADER_LINES: usize = 100;

/// Outcome of the one startup load.
#[derive(Debug)]
pub enum DashboardState {
    Ready(DataSet),
    Failed(DashboardError),
}

impl DashboardState {
    pub fn load(dir: &Path) -> Self {
        match load_dataset(dir) {
            Ok(data) => DashboardState::Ready(data),
            Err(e) => DashboardState::Failed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value)
            .unwrap_or_else(|e| json!({"status": "error", "error": e.to_string()}).to_string());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            503 => "Service Unavailable",
            _ => "Internal Server Error",
        }
    }

    pub fn to_http(&self) -> String {
        let allow = if self.status == 405 { "Allow: GET\r\n" } else { "" };
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             {}Connection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            allow,
            self.body
        )
    }
}

enum Route {
    Page(String),
    ApiPage(String),
    ApiPages,
    ApiManifest,
    ApiHealth,
    NotFound,
}

fn route(path: &str) -> Route {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Route::Page(PageId::Executive.slug().to_string());
    }
    let parts: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
    match parts.as_slice() {
        ["page", slug] => Route::Page(slug.to_string()),
        ["api", "page", slug] => Route::ApiPage(slug.to_string()),
        ["api", "pages"] => Route::ApiPages,
        ["api", "manifest"] => Route::ApiManifest,
        ["api", "health"] => Route::ApiHealth,
        _ => Route::NotFound,
    }
}

fn error_json(err: &DashboardError) -> Value {
    json!({
        "status": "error",
        "kind": err.kind(),
        "error": err.to_string(),
        "missing_file": err.missing_file(),
    })
}

/// Loaded state plus the navigation controller.
pub struct Dashboard {
    state: DashboardState,
    config: DashboardConfig,
    nav: Navigator,
}

impl Dashboard {
    pub fn new(state: DashboardState, config: DashboardConfig) -> Self {
        Self {
            state,
            config,
            nav: Navigator::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn handle(&mut self, method: &str, target: &str) -> Response {
        let response = self.dispatch(method, target);
        log_request(method, target, response.status, response.body.len());
        response
    }

    fn dispatch(&mut self, method: &str, target: &str) -> Response {
        if method != "GET" {
            return Response::text(405, "method not allowed");
        }
        let parsed = Url::parse("http://dashboard.local/").and_then(|base| base.join(target));
        let url = match parsed {
            Ok(u) => u,
            Err(e) => return Response::text(400, &format!("bad request target: {}", e)),
        };
        let query = PageQuery::parse(url.query().unwrap_or(""));

        match route(url.path()) {
            Route::Page(slug) => {
                let data = match &self.state {
                    DashboardState::Ready(data) => data,
                    DashboardState::Failed(err) => {
                        return Response::html(503, render::render_error_panel(err))
                    }
                };
                let id = match PageId::from_slug(&slug) {
                    Ok(id) => id,
                    Err(e) => return Response::text(404, &e.to_string()),
                };
                self.nav.select(id);
                let ctx = PageContext {
                    data,
                    query: &query,
                    config: &self.config,
                };
                let page = render_page(id, &ctx);
                Response::html(200, render::render_page(&page, &self.config, LinkMode::Server))
            }
            Route::ApiPage(slug) => {
                let data = match &self.state {
                    DashboardState::Ready(data) => data,
                    DashboardState::Failed(err) => return Response::json(503, &error_json(err)),
                };
                let id = match PageId::from_slug(&slug) {
                    Ok(id) => id,
                    Err(e) => {
                        let body = json!({"status": "error", "error": e.to_string()});
                        return Response::json(404, &body);
                    }
                };
                let ctx = PageContext {
                    data,
                    query: &query,
                    config: &self.config,
                };
                Response::json(200, &render_page(id, &ctx))
            }
            Route::ApiPages => match &self.state {
                DashboardState::Ready(_) => {
                    let pages: Vec<Value> = PageId::ALL
                        .iter()
                        .map(|p| {
                            json!({
                                "id": p,
                                "slug": p.slug(),
                                "label": p.label(),
                                "href": LinkMode::Server.href(*p),
                                "active": *p == self.nav.active(),
                            })
                        })
                        .collect();
                    Response::json(200, &pages)
                }
                DashboardState::Failed(err) => Response::json(503, &error_json(err)),
            },
            Route::ApiManifest => match &self.state {
                DashboardState::Ready(data) => Response::json(200, &data.manifest),
                DashboardState::Failed(err) => Response::json(503, &error_json(err)),
            },
            Route::ApiHealth => match &self.state {
                DashboardState::Ready(data) => Response::json(
                    200,
                    &json!({
                        "status": "ok",
                        "tables": data.manifest.tables.len(),
                        "degraded_tables": data.manifest.degraded().count(),
                    }),
                ),
                DashboardState::Failed(err) => Response::json(503, &error_json(err)),
            },
            Route::NotFound => Response::text(404, "not found"),
        }
    }
}

/// Accept loop. Each connection is read, answered and closed before the
/// next one is accepted.
pub async fn serve(listener: TcpListener, mut dashboard: Dashboard) -> std::io::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                log(
                    Level::Warn,
                    Domain::Server,
                    "accept_failed",
                    obj(&[("msg", v_str(&e.to_string()))]),
                );
                continue;
            }
        };
        if let Err(e) = handle_connection(stream, &mut dashboard).await {
            log(
                Level::Warn,
                Domain::Server,
                "connection_failed",
                obj(&[("peer", v_str(&peer.to_string())), ("msg", v_str(&e.to_string()))]),
            );
        }
    }
}

async fn handle_connection(stream: TcpStream, dashboard: &mut Dashboard) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    match timeout(READ_TIMEOUT, reader.read_line(&mut request_line)).await {
        Ok(read) => {
            read?;
        }
        Err(_) => return Ok(()),
    }

    // Drain headers; the dashboard only looks at the request line.
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        match timeout(READ_TIMEOUT, reader.read_line(&mut line)).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(_)) if line.trim().is_empty() => break,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e),
        }
    }

    let mut parts = request_line.split_whitespace();
    let response = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => dashboard.handle(method, target),
        _ => Response::text(400, "malformed request line"),
    };

    let mut stream = reader.into_inner();
    stream.write_all(response.to_http().as_bytes()).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> Dashboard {
        Dashboard::new(
            DashboardState::Failed(DashboardError::MissingDataFile {
                file: "campaign_performance.csv".to_string(),
            }),
            DashboardConfig::default(),
        )
    }

    fn empty() -> Dashboard {
        Dashboard::new(DashboardState::Ready(DataSet::default()), DashboardConfig::default())
    }

    #[test]
    fn test_route_table() {
        assert!(matches!(route("/"), Route::Page(ref s) if s == "executive"));
        assert!(matches!(route("/page/model"), Route::Page(ref s) if s == "model"));
        assert!(matches!(route("/page/model/"), Route::Page(ref s) if s == "model"));
        assert!(matches!(route("/api/page/products"), Route::ApiPage(ref s) if s == "products"));
        assert!(matches!(route("/api/health"), Route::ApiHealth));
        assert!(matches!(route("/page"), Route::NotFound));
        assert!(matches!(route("/page/a/b"), Route::NotFound));
    }

    #[test]
    fn test_failed_load_blocks_every_page() {
        let mut d = failed();
        for target in ["/", "/page/campaigns", "/page/nonexistent"] {
            let r = d.handle("GET", target);
            assert_eq!(r.status, 503, "{}", target);
            assert!(r.body.contains("Data file not found: campaign_performance.csv"));
        }
        let health = d.handle("GET", "/api/health");
        assert_eq!(health.status, 503);
        let v: Value = serde_json::from_str(&health.body).unwrap();
        assert_eq!(v["missing_file"], "campaign_performance.csv");
    }

    #[test]
    fn test_non_get_is_rejected() {
        let r = empty().handle("POST", "/");
        assert_eq!(r.status, 405);
        assert!(r.to_http().contains("Allow: GET"));
    }

    #[test]
    fn test_unknown_page_is_not_found() {
        assert_eq!(empty().handle("GET", "/page/pricing").status, 404);
        assert_eq!(empty().handle("GET", "/api/page/pricing").status, 404);
        assert_eq!(empty().handle("GET", "/favicon.ico").status, 404);
    }

    #[test]
    fn test_page_request_selects_active_page() {
        let mut d = empty();
        let r = d.handle("GET", "/page/geography");
        assert_eq!(r.status, 200);
        assert_eq!(d.navigator().active(), PageId::Geography);
        let pages: Value = serde_json::from_str(&d.handle("GET", "/api/pages").body).unwrap();
        assert_eq!(pages.as_array().unwrap().len(), 7);
        assert_eq!(pages[4]["active"], true);
    }

    #[test]
    fn test_empty_dataset_renders_every_page() {
        let mut d = empty();
        for id in PageId::ALL {
            let r = d.handle("GET", &format!("/page/{}", id.slug()));
            assert_eq!(r.status, 200, "{:?}", id);
        }
    }

    #[test]
    fn test_http_framing() {
        let r = Response::text(200, "ok");
        let http = r.to_http();
        assert!(http.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(http.contains("Content-Length: 2\r\n"));
        assert!(http.ends_with("\r\n\r\nok"));
    }
}
