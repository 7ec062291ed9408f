use std::{env, io, path::PathBuf, sync::Arc};

use actix_web::{delete, get, put, web, App, HttpResponse, HttpServer, Scope};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::value::RawValue;

use jotdb::{
  errors::Errors,
  option::{ListOptions, Options},
  store::Store,
};

#[derive(Deserialize)]
struct PutRequest {
  key: String,
  value: Box<RawValue>,
}

#[derive(Deserialize)]
struct CollectionQuery {
  collection: Option<String>,
}

#[derive(Deserialize)]
struct ListQuery {
  collection: Option<String>,
  prefix: Option<String>,
  limit: Option<usize>,
  offset: Option<usize>,
  #[serde(rename = "includeCollection")]
  include_collection: Option<bool>,
}

/// Keys travel in URL paths, so a path separator inside one is rejected
/// before it reaches the store.
fn valid_key(key: &str) -> bool {
  !key.is_empty() && !key.contains('/')
}

// PUT /objects?collection=NAME  body: {"key":"...","value":<json>}
#[put("")]
async fn put_handler(
  store: web::Data<Arc<Store>>,
  query: web::Query<CollectionQuery>,
  body: web::Json<PutRequest>,
) -> HttpResponse {
  let req = body.into_inner();
  let key = req.key.trim();
  if !valid_key(key) {
    return HttpResponse::BadRequest().body("invalid key");
  }

  let collection = query.collection.as_deref().unwrap_or("");
  let value = Bytes::copy_from_slice(req.value.get().as_bytes());
  match store.put(collection, key, value) {
    Ok(()) => HttpResponse::Ok()
      .content_type("application/json")
      .body(r#"{"status":"ok"}"#),
    Err(e @ (Errors::KeyIsEmpty | Errors::InvalidJsonValue)) => {
      HttpResponse::BadRequest().body(e.to_string())
    }
    Err(e) => HttpResponse::InternalServerError().body(format!("store error: {}", e)),
  }
}

// GET /objects/{key}?collection=NAME
#[get("/{key}")]
async fn get_handler(
  store: web::Data<Arc<Store>>,
  path: web::Path<String>,
  query: web::Query<CollectionQuery>,
) -> HttpResponse {
  let key = path.into_inner();
  if !valid_key(&key) {
    return HttpResponse::BadRequest().body("bad key");
  }

  let collection = query.collection.as_deref().unwrap_or("");
  match store.get(collection, &key) {
    Some(value) => HttpResponse::Ok()
      .content_type("application/json")
      .body(value),
    None => HttpResponse::NotFound().body("not found"),
  }
}

// DELETE /objects/{key}?collection=NAME
#[delete("/{key}")]
async fn delete_handler(
  store: web::Data<Arc<Store>>,
  path: web::Path<String>,
  query: web::Query<CollectionQuery>,
) -> HttpResponse {
  let key = path.into_inner();
  if !valid_key(&key) {
    return HttpResponse::BadRequest().body("bad key");
  }

  let collection = query.collection.as_deref().unwrap_or("");
  match store.delete(collection, &key) {
    Ok(()) => HttpResponse::Ok()
      .content_type("application/json")
      .body(r#"{"status":"ok"}"#),
    Err(e) => HttpResponse::InternalServerError().body(format!("store error: {}", e)),
  }
}

// GET /objects?collection=NAME&prefix=&limit=&offset=&includeCollection=true
#[get("")]
async fn list_handler(store: web::Data<Arc<Store>>, query: web::Query<ListQuery>) -> HttpResponse {
  let query = query.into_inner();
  let opts = ListOptions {
    collection: query
      .collection
      .map(|c| c.trim().to_string())
      .filter(|c| !c.is_empty()),
    prefix: query.prefix.unwrap_or_default(),
    limit: query.limit.unwrap_or(0),
    offset: query.offset.unwrap_or(0),
    include_collection: query.include_collection.unwrap_or(false),
  };

  let mut buf = Vec::new();
  match store.list_to(&opts, &mut buf) {
    Ok(()) => HttpResponse::Ok()
      .content_type("application/json")
      .body(buf),
    Err(e) => HttpResponse::InternalServerError().body(format!("list error: {}", e)),
  }
}

// GET /stat
#[get("/stat")]
async fn stat_handler(store: web::Data<Arc<Store>>) -> HttpResponse {
  match store.stat() {
    Ok(stat) => HttpResponse::Ok().json(stat),
    Err(e) => HttpResponse::InternalServerError().body(format!("stat error: {}", e)),
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  env_logger::init();

  let addr = env::var("APP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
  let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

  let mut opts = Options::default();
  opts.dir_path = PathBuf::from(&data_dir);
  let store = Arc::new(
    Store::open(opts).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
  );

  log::info!("listening on {} (data: {})", addr, data_dir);
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(store.clone()))
      .service(
        Scope::new("/objects")
          .service(put_handler)
          .service(list_handler)
          .service(get_handler)
          .service(delete_handler),
      )
      .service(stat_handler)
  })
  .bind(&addr)?
  .run()
  .await
}
