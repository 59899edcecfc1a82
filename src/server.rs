use crate::auth::{Authenticator, bearer_token};
use crate::middleware::PalmAuth;
use crate::proxy_state::ProxyState;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, web};
use reqwest::Method;
use std::io::Write;
use std::sync::Arc;

#[get("/health")]
pub async fn health(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

/// Relays `/api/palm/{path}` to the upstream API using whatever credential
/// the `Authorization` header holds once authentication has run.
pub async fn palm_proxy(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<ProxyState>,
) -> Result<HttpResponse, actix_web::Error> {
    let path = req.match_info().get("path").unwrap_or("");
    let method = Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(actix_web::error::ErrorBadRequest)?;
    let key = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(bearer_token)
        .unwrap_or_default();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    app_state
        .forward(method, path, req.query_string(), &key, content_type, body)
        .await?
        .into()
}

pub fn configure(cfg: &mut web::ServiceConfig, authenticator: Authenticator) {
    cfg.service(health).service(
        web::scope("/api/palm")
            .wrap(PalmAuth::new(authenticator))
            .route("/{path:.*}", web::to(palm_proxy)),
    );
}

fn init_logging(level: &str) {
    let level = level.parse().unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}

pub async fn startup(proxy_state: ProxyState) -> std::io::Result<()> {
    let config = proxy_state.config.clone();
    init_logging(&config.log_level);

    log::info!("Starting server at {}:{}", config.host, config.port);
    if config.fallback_key().is_some() {
        log::info!("System PaLM api key configured");
    } else {
        log::warn!("PALM_API_KEY is not set, requests without a key are forwarded as-is");
    }

    let authenticator = Authenticator::new(config.clone(), Arc::new(proxy_state.validator()));
    let app_state = web::Data::new(proxy_state);

    HttpServer::new(move || {
        let authenticator = authenticator.clone();
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(|cfg| configure(cfg, authenticator))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
