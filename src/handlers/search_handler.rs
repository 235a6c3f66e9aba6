//! handlers/search_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::handlers::auth::optional_user;
use crate::models::paper_model::{
    DomainQuery, PaperSearchItem, SearchQuery, SearchResponse, SortOrder,
};
use crate::services::api_key_service::ApiKeyService;
use crate::services::arxiv_service::PaperSource;

const DEFAULT_RESULTS: u32 = 10;
/// Tope de resultados en la API pública
const PUBLIC_MAX_RESULTS: u32 = 20;

/// GET /search/arxiv?query=...&max_results=...
pub async fn search_arxiv_endpoint(
    source: web::Data<dyn PaperSource>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let max_results = query.max_results.unwrap_or(DEFAULT_RESULTS);
    match source
        .search(&query.query, max_results, SortOrder::Relevance)
        .await
    {
        Ok(papers) => HttpResponse::Ok().json(json!({
            "papers": papers.iter().map(PaperSearchItem::from).collect::<Vec<_>>(),
            "count": papers.len(),
            "query": query.query,
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Search failed",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /search/domain?domain=...&max_results=...&category=...
pub async fn search_domain_endpoint(
    source: web::Data<dyn PaperSource>,
    query: web::Query<DomainQuery>,
) -> HttpResponse {
    let max_results = query.max_results.unwrap_or(DEFAULT_RESULTS);
    match source
        .search_by_domain(&query.domain, max_results, query.category.as_deref())
        .await
    {
        Ok(papers) => HttpResponse::Ok().json(json!({
            "papers": papers.iter().map(PaperSearchItem::from).collect::<Vec<_>>(),
            "count": papers.len(),
            "domain": query.domain,
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Domain search failed",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/search (auth opcional, máximo 20 resultados)
pub async fn api_search_endpoint(
    req: HttpRequest,
    keys: web::Data<ApiKeyService>,
    source: web::Data<dyn PaperSource>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let user = optional_user(&req, &keys).await;
    let max_results = query.max_results.unwrap_or(5).clamp(1, PUBLIC_MAX_RESULTS);
    log::info!(
        "(api_search) '{}' ({})",
        query.query,
        user.as_ref().map(|u| u.name.as_str()).unwrap_or("anonymous")
    );

    match source
        .search(&query.query, max_results, SortOrder::Relevance)
        .await
    {
        Ok(papers) => {
            let papers: Vec<PaperSearchItem> = papers.iter().map(PaperSearchItem::from).collect();
            HttpResponse::Ok().json(SearchResponse {
                count: papers.len(),
                papers,
            })
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Search failed",
            "details": format!("{:?}", e)
        })),
    }
}
