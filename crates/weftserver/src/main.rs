mod config;

use actix_cors::Cors;
use actix_web::{delete, get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult};
use actix_ws::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use weftcore::{ChatParameters, DocumentRecord, EngineError, StoreError, WorkflowDefinition};
use weftnodes::Services;
use weftruntime::{ComponentRegistry, Scheduler, WeftRuntime};

use crate::config::ServerConfig;

/// Application state shared across handlers
struct AppState {
    runtime: Arc<WeftRuntime>,
    services: Services,
}

/// Response for workflow creation
#[derive(Debug, Serialize)]
struct WorkflowResponse {
    id: Uuid,
    message: String,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CreateDocumentRequest {
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    prompt: String,
    #[serde(default)]
    parameters: ChatParameters,
}

fn error_response(e: &EngineError) -> HttpResponse {
    match e {
        EngineError::Validation(validation) => HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "error": "workflow is invalid",
            "violations": validation.violations,
        })),
        EngineError::Store(StoreError::NotFound(what)) => HttpResponse::NotFound().json(ErrorResponse {
            error: format!("{} not found", what),
        }),
        EngineError::Store(StoreError::StoreUnavailable(reason)) => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse { error: reason.clone() })
        }
        other => HttpResponse::InternalServerError().json(ErrorResponse {
            error: other.to_string(),
        }),
    }
}

/// Health check endpoint
#[get("/health")]
async fn health_check(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "weft",
        "components": data.runtime.registry().len(),
    }))
}

/// List all workflows
#[get("/api/workflows")]
async fn list_workflows(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let workflows = match data.runtime.store().list_workflows().await {
        Ok(workflows) => workflows,
        Err(e) => return Ok(error_response(&e.into())),
    };
    let workflow_list: Vec<_> = workflows
        .iter()
        .map(|w| {
            serde_json::json!({
                "id": w.id,
                "name": w.name,
                "description": w.description,
                "nodes": w.nodes.len(),
                "edges": w.edges().len(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(workflow_list))
}

/// Create a new workflow
#[post("/api/workflows")]
async fn create_workflow(
    data: web::Data<AppState>,
    workflow: web::Json<WorkflowDefinition>,
) -> ActixResult<impl Responder> {
    let workflow = workflow.into_inner();
    let workflow_id = workflow.id;

    match data.runtime.save_workflow(workflow).await {
        Ok(()) => Ok(HttpResponse::Created().json(WorkflowResponse {
            id: workflow_id,
            message: "Workflow created successfully".to_string(),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Validate a workflow without storing or running it
#[post("/api/workflows/validate")]
async fn validate_workflow(
    data: web::Data<AppState>,
    workflow: web::Json<WorkflowDefinition>,
) -> ActixResult<impl Responder> {
    match data.runtime.validate(&workflow) {
        Ok(plan) => {
            let scheduler = Scheduler::new(&plan);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "valid": true,
                "execution_order": scheduler.topological_order(),
                "batches": scheduler.batches(),
            })))
        }
        Err(validation) => Ok(HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "valid": false,
            "violations": validation.violations,
        }))),
    }
}

/// Get a specific workflow
#[get("/api/workflows/{id}")]
async fn get_workflow(data: web::Data<AppState>, path: web::Path<Uuid>) -> ActixResult<impl Responder> {
    match data.runtime.store().load_workflow(path.into_inner()).await {
        Ok(workflow) => Ok(HttpResponse::Ok().json(workflow)),
        Err(e) => Ok(error_response(&e.into())),
    }
}

/// Delete a workflow
#[delete("/api/workflows/{id}")]
async fn delete_workflow(data: web::Data<AppState>, path: web::Path<Uuid>) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();

    match data.runtime.store().delete_workflow(workflow_id).await {
        Ok(true) => {
            info!("Deleted workflow: {}", workflow_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Workflow deleted successfully"
            })))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Workflow {} not found", workflow_id),
        })),
        Err(e) => Ok(error_response(&e.into())),
    }
}

/// Execute a stored workflow
#[post("/api/workflows/{id}/run")]
async fn run_workflow(data: web::Data<AppState>, path: web::Path<Uuid>) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    info!("Running workflow: {}", workflow_id);

    match data.runtime.execute_workflow(workflow_id).await {
        Ok(result) => {
            info!(
                "Workflow {} finished with status {} (run {})",
                workflow_id, result.status, result.run_id
            );
            Ok(HttpResponse::Ok().json(result))
        }
        Err(e) => {
            error!("Workflow {} run failed: {}", workflow_id, e);
            Ok(error_response(&e))
        }
    }
}

#[get("/api/runs/{id}")]
async fn get_run(data: web::Data<AppState>, path: web::Path<Uuid>) -> ActixResult<impl Responder> {
    match data.runtime.run_result(path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Component catalog
#[get("/api/components")]
async fn list_components(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let registry: &ComponentRegistry = data.runtime.registry();
    let descriptors: Vec<_> = registry.descriptors().iter().map(|d| d.as_ref().clone()).collect();
    Ok(HttpResponse::Ok().json(descriptors))
}

#[post("/api/documents")]
async fn create_document(
    data: web::Data<AppState>,
    req: web::Json<CreateDocumentRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    let document = DocumentRecord::new(Uuid::new_v4().to_string(), req.title, req.content);

    match data.services.records.save_document(document.clone()).await {
        Ok(()) => {
            info!("Stored document {} ({})", document.id, document.title);
            Ok(HttpResponse::Created().json(document))
        }
        Err(e) => Ok(error_response(&e.into())),
    }
}

#[get("/api/documents/{id}")]
async fn get_document(data: web::Data<AppState>, path: web::Path<String>) -> ActixResult<impl Responder> {
    match data.services.records.load_document_metadata(&path.into_inner()).await {
        Ok(document) => Ok(HttpResponse::Ok().json(document)),
        Err(e) => Ok(error_response(&e.into())),
    }
}

/// Direct chat completion, outside any workflow
#[post("/api/chat")]
async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> ActixResult<impl Responder> {
    match data.services.chat.complete(&req.prompt, &req.parameters).await {
        Ok(response) => Ok(HttpResponse::Ok().json(serde_json::json!({ "response": response }))),
        Err(e) => {
            error!("Chat completion failed: {}", e);
            Ok(HttpResponse::BadGateway().json(ErrorResponse { error: e.to_string() }))
        }
    }
}

/// WebSocket endpoint for real-time events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!("Starting Weft server");

    let services = Services::in_memory().with_chat(config.chat_service());

    let mut registry = ComponentRegistry::new();
    weftnodes::register_all(&mut registry, &services)?;

    let runtime = WeftRuntime::with_registry(Arc::new(registry), config.runtime.clone())
        .with_store(services.records.clone());

    info!("Runtime initialized with {} components", runtime.registry().len());

    let app_state = web::Data::new(AppState {
        runtime: Arc::new(runtime),
        services,
    });

    info!("Server starting on http://{}", config.bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(list_workflows)
            .service(create_workflow)
            .service(validate_workflow)
            .service(get_workflow)
            .service(delete_workflow)
            .service(run_workflow)
            .service(get_run)
            .service(list_components)
            .service(create_document)
            .service(get_document)
            .service(chat)
            .service(websocket_events)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
