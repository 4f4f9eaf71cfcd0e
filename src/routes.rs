use std::path::Path;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{
    delete,
    dev::{fn_service, ServiceRequest, ServiceResponse},
    get,
    http::{header, Method},
    patch, post,
    web::{self, Data},
    HttpResponse,
};
use serde_json::json;

use crate::{
    auth::{self, AuthenticatedAdmin},
    db,
    errors::AppError,
    structs::{
        AddItemRequest, ButtonClickRequest, ButtonClickResponse, CreateTenantRequest,
        LoginRequest, MessageResponse,
    },
    AppState,
};

/// Registers the JSON API under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::InvalidInput(format!("Invalid JSON payload: {}", err)).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::InvalidInput(format!("Invalid path parameter: {}", err)).into()
            }))
            .service(health_handler)
            .service(login_handler)
            .service(list_tenants_handler)
            .service(create_tenant_handler)
            .service(delete_tenant_handler)
            .service(tenant_handler)
            .service(list_items_handler)
            .service(add_item_handler)
            .service(delete_item_handler)
            .service(button_clicked_handler)
            .default_service(web::to(default_handler)),
    );
}

/// Builds the CORS middleware. A `*` entry allows any origin; otherwise only the
/// listed origins get CORS headers. Other origins are still served, without them.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .block_on_origin_mismatch(false)
        .max_age(3600);
    if allowed_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Serves the built frontend, answering unknown GETs with `index.html` so the
/// client-side router can take over.
pub fn configure_static(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    let index = static_dir.join("index.html");
    cfg.service(
        Files::new("/", static_dir)
            .index_file("index.html")
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index = index.clone();
                async move {
                    let (req, _) = req.into_parts();
                    let file = NamedFile::open_async(index).await?;
                    let res = file.into_response(&req);
                    Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
                }
            })),
    );
}

pub async fn default_handler(req_method: Method) -> Result<HttpResponse, AppError> {
    match req_method {
        Method::GET => Err(AppError::NotFound),
        _ => Ok(HttpResponse::MethodNotAllowed().finish()),
    }
}

#[get("/health")]
pub async fn health_handler(state: Data<AppState>) -> HttpResponse {
    match db::ping(&state.db_pool).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "ok": true })),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "ok": false, "error": "Database unavailable" }))
        }
    }
}

#[post("/admin/login")]
pub async fn login_handler(
    state: Data<AppState>,
    web::Json(form): web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let (username, password) = match (form.username.as_deref(), form.password.as_deref()) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Username and password are required".into(),
            ))
        }
    };
    let response = auth::login(&state, username, password).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/admin/tenants")]
pub async fn list_tenants_handler(
    _admin: AuthenticatedAdmin,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tenants = db::list_tenants(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(tenants))
}

#[post("/admin/tenants")]
pub async fn create_tenant_handler(
    admin: AuthenticatedAdmin,
    state: Data<AppState>,
    web::Json(form): web::Json<CreateTenantRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = form.into_draft()?;
    let tenant = db::create_tenant(&state.db_pool, &draft).await?;
    log::info!("Admin {} created tenant {}", admin.id, tenant.slug);
    Ok(HttpResponse::Created().json(tenant))
}

// Unknown ids are reported as deleted too.
#[delete("/admin/tenants/{id}")]
pub async fn delete_tenant_handler(
    admin: AuthenticatedAdmin,
    state: Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    db::delete_tenant(&state.db_pool, id).await?;
    log::info!("Admin {} deleted tenant {}", admin.id, id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Tenant deleted successfully")))
}

#[get("/tenant/{slug}")]
pub async fn tenant_handler(
    state: Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tenant = db::resolve_tenant(&state.db_pool, &slug).await?;
    Ok(HttpResponse::Ok().json(tenant))
}

#[get("/tenant/{slug}/items")]
pub async fn list_items_handler(
    state: Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tenant = db::resolve_tenant(&state.db_pool, &slug).await?;
    let items = db::list_items(&state.db_pool, tenant.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/tenant/{slug}/items")]
pub async fn add_item_handler(
    state: Data<AppState>,
    slug: web::Path<String>,
    web::Json(form): web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let tenant = db::resolve_tenant(&state.db_pool, &slug).await?;
    let draft = form.into_draft()?;
    let item = db::add_item(&state.db_pool, tenant.id, &draft).await?;
    Ok(HttpResponse::Created().json(item))
}

#[delete("/tenant/{slug}/items/{item_id}")]
pub async fn delete_item_handler(
    state: Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    let (slug, item_id) = path.into_inner();
    let tenant = db::resolve_tenant(&state.db_pool, &slug).await?;
    db::delete_item(&state.db_pool, tenant.id, item_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Item deleted successfully")))
}

#[patch("/tenant/{slug}/items/{item_id}/button")]
pub async fn button_clicked_handler(
    state: Data<AppState>,
    path: web::Path<(String, i64)>,
    web::Json(form): web::Json<ButtonClickRequest>,
) -> Result<HttpResponse, AppError> {
    let (slug, item_id) = path.into_inner();
    let button = form.button()?;
    let tenant = db::resolve_tenant(&state.db_pool, &slug).await?;
    let last_button_clicked =
        db::set_last_button_clicked(&state.db_pool, tenant.id, item_id, button).await?;
    Ok(HttpResponse::Ok().json(ButtonClickResponse {
        message: "Button click recorded".into(),
        last_button_clicked,
    }))
}
