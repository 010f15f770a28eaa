//! REST surface for the upload-and-map workflow.
//!
//! Uploads land as raw bytes with the original filename in the query
//! string; multipart decoding belongs to the reverse proxy in front.
//! The update endpoint mirrors the mapping UI's contract: the column
//! mapping arrives as a JSON-object string and the response is always
//! a list of outcome records, a single synthetic one when a
//! precondition fails.

use std::collections::HashMap;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::application::use_cases::column_filter::filter_columns;
use crate::application::use_cases::tabular::sheet_records;
use crate::application::{AttributeSelector, CatalogService, UpdateEngine, UpdateSpec};
use crate::domain::outcome::UpdateOutcome;
use crate::domain::record::RowRecord;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::db::YearRegistry;
use crate::infrastructure::decode::{decode_workbook, DelimitedDecoder};
use crate::infrastructure::storage::{FileStore, StoredFile};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct AppState {
    pub store: FileStore,
    pub catalog: CatalogService,
    pub registry: YearRegistry,
}

#[derive(Deserialize)]
struct UploadQuery {
    /// Original filename; its extension selects the decoder.
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
    parsed_data: Vec<RowRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet_names: Option<Vec<String>>,
}

#[post("/upload")]
async fn upload(
    data: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let name = query.name.to_lowercase();

    let file = if name.ends_with(".csv") {
        match DelimitedDecoder::decode_auto(&body) {
            Ok(rows) => StoredFile::Table(rows),
            Err(e) => {
                error!("Failed to decode '{}': {}", query.name, e);
                return HttpResponse::BadRequest().body(e.to_string());
            }
        }
    } else if name.ends_with(".xls") || name.ends_with(".xlsx") {
        match decode_sheets(&query.name, &body) {
            Ok(sheets) => StoredFile::Workbook(sheets),
            Err(response) => return response,
        }
    } else {
        return HttpResponse::BadRequest()
            .body("Unsupported file format. Only CSV and Excel are accepted.");
    };

    let sheet_names = file.sheet_names();
    let parsed_data = file.default_rows().unwrap_or(&[]).to_vec();
    let file_id = data.store.insert(file).await;

    info!(
        "Stored upload '{}' as {} ({} preview row(s))",
        query.name,
        file_id,
        parsed_data.len()
    );

    HttpResponse::Ok().json(UploadResponse {
        file_id,
        parsed_data,
        sheet_names,
    })
}

/// Run every sheet through header detection and extraction. Sheets
/// with no detectable header are dropped from the selectable set; a
/// workbook where that leaves nothing is rejected.
fn decode_sheets(
    filename: &str,
    bytes: &[u8],
) -> Result<Vec<(String, Vec<RowRecord>)>, HttpResponse> {
    let decoded = decode_workbook(bytes).map_err(|e| {
        error!("Failed to decode '{}': {}", filename, e);
        HttpResponse::BadRequest().body(e.to_string())
    })?;

    let mut sheets = Vec::new();
    for sheet in decoded {
        match sheet_records(&sheet.grid) {
            Some(rows) => sheets.push((sheet.name, rows)),
            None => warn!(
                "No header row found in sheet '{}' of '{}', skipping it",
                sheet.name, filename
            ),
        }
    }

    if sheets.is_empty() {
        return Err(HttpResponse::BadRequest()
            .body(format!("No tabular sheet found in '{}'", filename)));
    }
    Ok(sheets)
}

#[derive(Deserialize)]
struct SheetQuery {
    sheet: String,
}

#[get("/{file_id}/sheet")]
async fn sheet_preview(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SheetQuery>,
) -> impl Responder {
    let file_id = path.into_inner();
    let Some(file) = data.store.get(&file_id).await else {
        return HttpResponse::NotFound().finish();
    };
    match file.sheet(&query.sheet) {
        Some(rows) => HttpResponse::Ok().json(rows),
        None => HttpResponse::NotFound().finish(),
    }
}

#[get("/{file_id}")]
async fn file_preview(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let file_id = path.into_inner();
    let Some(file) = data.store.get(&file_id).await else {
        return HttpResponse::NotFound().finish();
    };
    preview_response(file_id, &file)
}

/// Preview shape follows the source: a bare row list for a
/// single-table file, the object with sheet names for a workbook.
fn preview_response(file_id: String, file: &StoredFile) -> HttpResponse {
    match file {
        StoredFile::Table(rows) => HttpResponse::Ok().json(rows),
        StoredFile::Workbook(_) => HttpResponse::Ok().json(UploadResponse {
            sheet_names: file.sheet_names(),
            parsed_data: file.default_rows().unwrap_or(&[]).to_vec(),
            file_id,
        }),
    }
}

#[get("/processes")]
async fn list_processes(data: web::Data<AppState>) -> impl Responder {
    match data.catalog.list_processes().await {
        Ok(processes) => HttpResponse::Ok().json(processes),
        Err(e) => {
            error!("Failed to list processes: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/processes/{process_id}/indicators")]
async fn list_indicators(data: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    match data.catalog.list_indicators(path.into_inner()).await {
        Ok(indicators) => HttpResponse::Ok().json(indicators),
        Err(e) => {
            error!("Failed to list indicators: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/attributes")]
async fn list_attributes(data: web::Data<AppState>) -> impl Responder {
    match data.catalog.list_attributes().await {
        Ok(attributes) => HttpResponse::Ok().json(attributes),
        Err(e) => {
            error!("Failed to list attributes: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/attributes/{attribute_id}/values")]
async fn list_possible_values(data: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    match data.catalog.list_possible_values(path.into_inner()).await {
        Ok(values) => HttpResponse::Ok().json(values),
        Err(e) => {
            error!("Failed to list possible values: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    file_id: String,
    #[serde(default)]
    sheet: Option<String>,
    /// JSON object string: source column -> indicator name.
    column_mapping: String,
    process: i32,
    date: NaiveDate,
    #[serde(default)]
    attribute: Option<i32>,
    #[serde(default)]
    attribute_value_column: Option<String>,
    academic_year_column: String,
}

#[post("/update")]
async fn update_indicators(
    data: web::Data<AppState>,
    req: web::Json<UpdateRequest>,
) -> impl Responder {
    info!(
        "Update request: file={} sheet={:?} process={} year_column='{}'",
        req.file_id, req.sheet, req.process, req.academic_year_column
    );

    let mapping: HashMap<String, String> = match serde_json::from_str(&req.column_mapping) {
        Ok(mapping) => mapping,
        Err(e) => {
            return precondition_failure(format!("Unreadable column mapping: {}", e));
        }
    };

    let Some(file) = data.store.get(&req.file_id).await else {
        return precondition_failure(format!("No data found for file id: {}", req.file_id));
    };

    let rows = match &file {
        StoredFile::Table(rows) => Some(rows.as_slice()),
        StoredFile::Workbook(_) => match &req.sheet {
            Some(name) if !name.trim().is_empty() => file.sheet(name),
            _ => file.default_rows(),
        },
    };
    let Some(rows) = rows else {
        return precondition_failure(format!(
            "No data found for sheet {:?} of file id: {}",
            req.sheet, req.file_id
        ));
    };

    let attribute = match resolve_attribute(&data.catalog, &req).await {
        Ok(attribute) => attribute,
        Err(reason) => return precondition_failure(reason),
    };

    let filtered = filter_columns(rows, &mapping, &req.academic_year_column);

    let spec = UpdateSpec {
        process_id: req.process,
        column_mapping: mapping,
        modified_date: req.date,
        year_column: req.academic_year_column.clone(),
        attribute,
    };

    let outcomes = UpdateEngine::new(&data.registry).apply(&spec, &filtered).await;
    HttpResponse::Ok().json(outcomes)
}

/// The attribute dimension applies only when both an attribute id and
/// a value column were supplied. Its coding is resolved once here; it
/// cannot change mid-request.
async fn resolve_attribute(
    catalog: &CatalogService,
    req: &UpdateRequest,
) -> Result<Option<AttributeSelector>, String> {
    let (attribute_id, value_column) = match (req.attribute, req.attribute_value_column.as_deref())
    {
        (Some(id), Some(column)) if !column.trim().is_empty() => (id, column),
        _ => return Ok(None),
    };

    match catalog.attribute_coding(attribute_id).await {
        Ok(Some(coding)) => Ok(Some(AttributeSelector {
            coding,
            value_column: value_column.to_string(),
        })),
        Ok(None) => Err(format!("Attribute not found: {}", attribute_id)),
        Err(e) => Err(e.to_string()),
    }
}

fn precondition_failure(reason: String) -> HttpResponse {
    warn!("Update request rejected: {}", reason);
    HttpResponse::BadRequest().json(vec![UpdateOutcome::precondition(reason)])
}

pub fn start_server(state: Arc<AppState>, config: &ServerConfig) -> std::io::Result<Server> {
    let data = web::Data::from(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(data.clone())
            // Workbook uploads arrive as a raw body; the default 256KB
            // payload cap is far too small for them.
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .service(
                web::scope("/file")
                    .service(upload)
                    .service(update_indicators)
                    .service(list_processes)
                    .service(list_indicators)
                    .service(list_attributes)
                    .service(list_possible_values)
                    .service(sheet_preview)
                    .service(file_preview),
            )
    })
    .bind((config.bind.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    fn row(value: &str) -> RowRecord {
        RowRecord::from([("Nota".to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn test_preview_is_a_bare_row_list_for_tables() {
        let file = StoredFile::Table(vec![row("8.5")]);
        let response = preview_response("f1".to_string(), &file);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["Nota"], "8.5");
    }

    #[tokio::test]
    async fn test_preview_is_an_object_with_sheet_names_for_workbooks() {
        let file = StoredFile::Workbook(vec![
            ("Hoja1".to_string(), vec![row("a")]),
            ("Hoja2".to_string(), vec![]),
        ]);
        let response = preview_response("f2".to_string(), &file);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["fileId"], "f2");
        assert_eq!(json["sheetNames"][1], "Hoja2");
        assert_eq!(json["parsedData"][0]["Nota"], "a");
    }
}
